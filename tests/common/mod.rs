#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use moodcli::{
    config::{AuthConfig, SCOPES},
    error::AuthError,
    management::{AuthSession, KeyValueStore, MemoryStore, WebAuthFlow},
};
use reqwest::Url;
use serde_json::{Map, Value, json};
use tokio::sync::Notify;

pub const CLIENT_ID: &str = "test-client";
pub const REDIRECT_URI: &str = "http://127.0.0.1:8888/callback";

pub fn test_config(server_url: &str) -> AuthConfig {
    AuthConfig {
        client_id: Some(CLIENT_ID.to_string()),
        redirect_uri: REDIRECT_URI.to_string(),
        auth_url: "https://accounts.example.com/authorize".to_string(),
        token_url: format!("{}/api/token", server_url),
        scopes: SCOPES.iter().map(|s| s.to_string()).collect(),
    }
}

/// What the fake authorization window does once opened.
pub enum Behavior {
    /// Redirects back with `code` and the state taken from the URL.
    Approve { code: String },
    /// Redirects back with `code` and the URL's state with its last
    /// character changed.
    TamperState { code: String },
    /// Redirects back with exactly this query string.
    Redirect(String),
    /// User closes the window.
    Cancel,
    /// Stays open until `release` is notified, then reports a cancel.
    WaitFor(Arc<Notify>),
    /// Never returns.
    Hang,
}

pub struct ScriptedFlow {
    behavior: Behavior,
    launched: Mutex<Vec<Url>>,
}

impl ScriptedFlow {
    pub fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            launched: Mutex::new(Vec::new()),
        })
    }

    pub fn approve(code: &str) -> Arc<Self> {
        Self::new(Behavior::Approve {
            code: code.to_string(),
        })
    }

    pub fn launched(&self) -> Vec<Url> {
        self.launched.lock().unwrap().clone()
    }

    pub fn last_url(&self) -> Url {
        self.launched().pop().expect("auth flow was not launched")
    }
}

pub fn query_param(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

#[async_trait]
impl WebAuthFlow for ScriptedFlow {
    async fn launch(&self, url: &Url) -> Result<Option<String>, AuthError> {
        self.launched.lock().unwrap().push(url.clone());

        match &self.behavior {
            Behavior::Approve { code } => {
                let state = query_param(url, "state").unwrap_or_default();
                Ok(Some(format!("{}?code={}&state={}", REDIRECT_URI, code, state)))
            }
            Behavior::TamperState { code } => {
                let mut state = query_param(url, "state").unwrap_or_default();
                let last = if state.pop() == Some('a') { 'b' } else { 'a' };
                state.push(last);
                Ok(Some(format!("{}?code={}&state={}", REDIRECT_URI, code, state)))
            }
            Behavior::Redirect(query) => Ok(Some(format!("{}?{}", REDIRECT_URI, query))),
            Behavior::Cancel => Ok(None),
            Behavior::WaitFor(release) => {
                release.notified().await;
                Ok(None)
            }
            Behavior::Hang => {
                std::future::pending::<()>().await;
                Ok(None)
            }
        }
    }
}

pub async fn store_with(entries: Value) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    if let Value::Object(map) = entries {
        store.set(map).await.unwrap();
    }
    store
}

pub async fn session_with(
    config: AuthConfig,
    store: &Arc<MemoryStore>,
    flow: &Arc<ScriptedFlow>,
) -> AuthSession {
    let store: Arc<dyn KeyValueStore> = store.clone();
    let flow: Arc<dyn WebAuthFlow> = flow.clone();
    AuthSession::restore(config, store, flow).await.unwrap()
}

pub fn tokens(access: &str, refresh: &str) -> Map<String, Value> {
    match json!({ "accessToken": access, "refreshToken": refresh }) {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}
