use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use chrono::Utc;
use reqwest::Client;
use serde_json::Map;
use tokio::task::JoinHandle;

use crate::{
    error::StoreError,
    management::{KeyValueStore, store::KEY_FLOW_SCORES},
    types::{FlowSample, MetricsResponse},
    warning,
};

/// Samples the flow metrics endpoint while a focus session runs.
///
/// A session of `n` minutes is sampled once at start and then every `n / 10`
/// minutes. Samples are persisted under `flowScores` so any process can
/// report the average. Without a metrics URL the tracker only reports what
/// is stored.
pub struct FlowTracker {
    client: Client,
    metrics_url: Option<String>,
    store: Arc<dyn KeyValueStore>,
    samples: Arc<tokio::sync::Mutex<Vec<FlowSample>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl FlowTracker {
    /// Creates a tracker holding the samples found in the store.
    pub async fn restore(metrics_url: Option<String>, store: Arc<dyn KeyValueStore>) -> Self {
        let samples = match load(store.as_ref()).await {
            Ok(samples) => samples,
            Err(e) => {
                warning!("Failed to load flow scores: {}", e);
                Vec::new()
            }
        };

        Self {
            client: Client::new(),
            metrics_url,
            store,
            samples: Arc::new(tokio::sync::Mutex::new(samples)),
            task: Mutex::new(None),
        }
    }

    /// Drops the previous session's samples and starts sampling.
    pub async fn start(&self, minutes: u64) {
        self.stop();
        let cleared = {
            let mut samples = self.samples.lock().await;
            samples.clear();
            samples.clone()
        };
        if let Err(e) = save(self.store.as_ref(), &cleared).await {
            warning!("Failed to save flow scores: {}", e);
        }
        self.resume(minutes);
    }

    /// Continues sampling without touching the collected samples.
    pub fn resume(&self, minutes: u64) {
        let Some(url) = self.metrics_url.clone() else {
            return;
        };

        let client = self.client.clone();
        let store = Arc::clone(&self.store);
        let samples = Arc::clone(&self.samples);
        let period = sample_period(minutes);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                let score = match fetch_flow_score(&client, &url).await {
                    Ok(score) => score,
                    Err(e) => {
                        warning!("Failed to fetch flow score: {}", e);
                        continue;
                    }
                };

                let current = {
                    let mut samples = samples.lock().await;
                    samples.push(FlowSample {
                        score,
                        timestamp: Utc::now().timestamp_millis(),
                    });
                    samples.clone()
                };
                if let Err(e) = save(store.as_ref(), &current).await {
                    warning!("Failed to save flow scores: {}", e);
                }
            }
        });

        let mut slot = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }

    pub fn stop(&self) {
        let mut slot = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    pub async fn samples(&self) -> Vec<FlowSample> {
        self.samples.lock().await.clone()
    }

    pub async fn average_score(&self) -> f64 {
        average_score(&self.samples.lock().await)
    }
}

impl Drop for FlowTracker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Mean score as a percentage, rounded to one decimal; 0 without samples.
pub fn average_score(samples: &[FlowSample]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|s| s.score).sum();
    let average = sum / samples.len() as f64 * 100.0;
    (average * 10.0).round() / 10.0
}

/// A tenth of the session length, at least one second.
pub fn sample_period(minutes: u64) -> Duration {
    Duration::from_secs((minutes.saturating_mul(60) / 10).max(1))
}

pub async fn fetch_flow_score(client: &Client, url: &str) -> Result<f64, reqwest::Error> {
    let metrics: MetricsResponse = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(metrics.flow_score)
}

async fn load(store: &dyn KeyValueStore) -> Result<Vec<FlowSample>, StoreError> {
    let stored = store.get(&[KEY_FLOW_SCORES]).await?;
    Ok(stored
        .get(KEY_FLOW_SCORES)
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default())
}

async fn save(store: &dyn KeyValueStore, samples: &[FlowSample]) -> Result<(), StoreError> {
    let mut item = Map::new();
    item.insert(KEY_FLOW_SCORES.to_string(), serde_json::to_value(samples)?);
    store.set(item).await
}
