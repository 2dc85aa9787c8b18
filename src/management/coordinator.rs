use std::{
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use serde_json::Value;
use tokio::task::JoinHandle;

use crate::{
    error::{CoordinatorError, PlayerError},
    info,
    management::{AuthSession, FlowTracker, KeyValueStore, timer, timer::FocusTimer},
    spotify::player::Player,
    success,
    types::{Mood, Payload, PlaybackState, Request, Response, StateSnapshot, TimerState},
    warning,
};

/// The process-wide owner of the session, player, focus timer and flow
/// tracker.
///
/// Built once at startup and shared (behind an `Arc`) with whatever receives
/// UI requests.
pub struct Coordinator {
    session: AuthSession,
    player: Player,
    store: Arc<dyn KeyValueStore>,
    timer: Arc<tokio::sync::Mutex<FocusTimer>>,
    flow: Arc<FlowTracker>,
    ticker: Mutex<Option<JoinHandle<()>>>,
    current_playlist: Mutex<Option<String>>,
}

impl Coordinator {
    /// Wires the parts together and restores the persisted timer.
    ///
    /// The timer is not ticking yet; call [`Coordinator::resume_ticking`]
    /// in long-running processes.
    pub async fn new(
        session: AuthSession,
        player: Player,
        flow: FlowTracker,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let restored = match timer::load(store.as_ref()).await {
            Ok(t) => t,
            Err(e) => {
                warning!("Failed to load timer state: {}", e);
                FocusTimer::default()
            }
        };

        Self {
            session,
            player,
            store,
            timer: Arc::new(tokio::sync::Mutex::new(restored)),
            flow: Arc::new(flow),
            ticker: Mutex::new(None),
            current_playlist: Mutex::new(None),
        }
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    /// Picks a restored running timer back up.
    pub async fn resume_ticking(&self) {
        let state = self.timer_state().await;
        if state.running {
            self.flow.resume(state.duration / 60);
            self.spawn_ticker();
        }
    }

    pub fn flow(&self) -> &FlowTracker {
        &self.flow
    }

    pub async fn timer_state(&self) -> TimerState {
        self.timer.lock().await.state()
    }

    /// Handles a raw JSON message, reporting unknown types in the envelope.
    pub async fn handle_value(&self, message: Value) -> Response {
        let kind = message
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        match parse_request(message) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                warning!("Error handling message {}: {}", kind, e);
                Response::failure(kind, e.to_string())
            }
        }
    }

    pub async fn handle(&self, request: Request) -> Response {
        let kind = request.kind();
        info!("Received message: {}", kind);

        match self.dispatch(request).await {
            Ok(payload) => Response::ok(payload),
            Err(e) => {
                warning!("Error handling message {}: {}", kind, e);
                Response::failure(kind, e.to_string())
            }
        }
    }

    async fn dispatch(&self, request: Request) -> Result<Payload, CoordinatorError> {
        match request {
            Request::GetState => Ok(Payload::State(self.state_snapshot().await)),
            Request::PlayMood { mood } => {
                let parsed = Mood::parse(&mood).ok_or(PlayerError::UnknownMood(mood.clone()))?;
                let player = &self.player;
                self.authorized(move |token| async move { player.play_mood(&token, parsed).await })
                    .await?;

                *self.current_playlist() = Some(parsed.playlist_id().to_string());
                success!("Started {} music with shuffle enabled", parsed.name());
                Ok(Payload::Mood { mood })
            }
            Request::TogglePlayback => {
                let player = &self.player;
                let playing = self
                    .authorized(move |token| async move { player.toggle_playback(&token).await })
                    .await?;
                info!("Playback {}", if playing { "resumed" } else { "paused" });
                Ok(Payload::Empty {})
            }
            Request::NextTrack => {
                let player = &self.player;
                self.authorized(move |token| async move { player.next_track(&token).await })
                    .await?;
                Ok(Payload::Empty {})
            }
            Request::PreviousTrack => {
                let player = &self.player;
                self.authorized(move |token| async move { player.previous_track(&token).await })
                    .await?;
                Ok(Payload::Empty {})
            }
            Request::StartTimer { duration } => {
                let minutes = duration
                    .filter(|m| *m > 0)
                    .unwrap_or(timer::DEFAULT_MINUTES);
                self.start_timer(minutes).await?;
                Ok(Payload::Timer { duration: minutes })
            }
            Request::PauseTimer => {
                self.pause_timer().await?;
                Ok(Payload::Empty {})
            }
            Request::ResumeTimer => {
                self.resume_timer().await?;
                Ok(Payload::Empty {})
            }
            Request::StopTimer => {
                self.stop_timer().await?;
                Ok(Payload::Empty {})
            }
            Request::Authenticate => {
                self.session.authenticate().await?;
                Ok(Payload::Authenticated {
                    is_authenticated: self.session.is_authenticated(),
                })
            }
        }
    }

    /// Runs `op` with the access token, refreshing once on a 401.
    async fn authorized<T, F, Fut>(&self, op: F) -> Result<T, CoordinatorError>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T, PlayerError>>,
    {
        let token = self
            .session
            .access_token()
            .ok_or(PlayerError::NotAuthenticated)?;

        match op(token).await {
            Err(PlayerError::Unauthorized) => {
                info!("Access token rejected, refreshing...");
                self.session.refresh().await?;
                let token = self
                    .session
                    .access_token()
                    .ok_or(PlayerError::NotAuthenticated)?;
                Ok(op(token).await?)
            }
            other => Ok(other?),
        }
    }

    async fn state_snapshot(&self) -> StateSnapshot {
        let playback = if self.session.is_authenticated() {
            let player = &self.player;
            self.authorized(move |token| async move { player.current_playback(&token).await })
                .await
                .unwrap_or_else(|e| {
                    warning!("Error reading playback state: {}", e);
                    PlaybackState::default()
                })
        } else {
            PlaybackState::default()
        };

        let timer = self.timer_state().await;
        let flow_score = self.flow.average_score().await;
        let current_playlist = self.current_playlist().clone();

        StateSnapshot {
            is_playing: playback.is_playing,
            current_track: playback.item,
            current_playlist,
            is_authenticated: self.session.is_authenticated(),
            timer,
            flow_score,
        }
    }

    pub async fn start_timer(&self, minutes: u64) -> Result<(), CoordinatorError> {
        if minutes == 0 || minutes > timer::MAX_MINUTES {
            return Err(CoordinatorError::InvalidDuration(minutes));
        }

        self.abort_ticker();
        let current = {
            let mut t = self.timer.lock().await;
            t.start(minutes);
            *t
        };
        timer::save(self.store.as_ref(), &current).await?;
        self.flow.start(minutes).await;
        self.spawn_ticker();
        info!("Timer started for {} minutes", minutes);
        Ok(())
    }

    pub async fn pause_timer(&self) -> Result<(), CoordinatorError> {
        let current = {
            let mut t = self.timer.lock().await;
            if !t.pause() {
                return Ok(());
            }
            *t
        };
        self.abort_ticker();
        self.flow.stop();
        timer::save(self.store.as_ref(), &current).await?;
        info!("Timer paused");
        Ok(())
    }

    pub async fn resume_timer(&self) -> Result<(), CoordinatorError> {
        let current = {
            let mut t = self.timer.lock().await;
            if !t.resume() {
                return Ok(());
            }
            *t
        };
        timer::save(self.store.as_ref(), &current).await?;
        self.flow.resume(current.state().duration / 60);
        self.spawn_ticker();
        info!("Timer resumed");
        Ok(())
    }

    pub async fn stop_timer(&self) -> Result<(), CoordinatorError> {
        self.abort_ticker();
        self.flow.stop();
        let current = {
            let mut t = self.timer.lock().await;
            t.stop();
            *t
        };
        timer::save(self.store.as_ref(), &current).await?;
        info!("Timer stopped");
        Ok(())
    }

    fn spawn_ticker(&self) {
        let timer = Arc::clone(&self.timer);
        let store = Arc::clone(&self.store);
        let flow = Arc::clone(&self.flow);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            // the first tick completes immediately
            interval.tick().await;

            loop {
                interval.tick().await;
                let (current, finished) = {
                    let mut t = timer.lock().await;
                    if !t.is_running() {
                        break;
                    }
                    let finished = t.tick();
                    (*t, finished)
                };

                if let Err(e) = timer::save(store.as_ref(), &current).await {
                    warning!("Failed to save timer state: {}", e);
                }
                if finished {
                    flow.stop();
                    success!("Focus session complete");
                    break;
                }
            }
        });

        let mut slot = self.ticker.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }

    fn abort_ticker(&self) {
        let mut slot = self.ticker.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }

    fn current_playlist(&self) -> MutexGuard<'_, Option<String>> {
        self.current_playlist
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Decodes a UI message, distinguishing unknown types from malformed ones.
pub fn parse_request(message: Value) -> Result<Request, CoordinatorError> {
    let kind = message
        .get("type")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default();

    if !Request::KINDS.contains(&kind.as_str()) {
        return Err(CoordinatorError::UnknownMessage(kind));
    }

    serde_json::from_value(message)
        .map_err(|e| CoordinatorError::InvalidMessage(format!("{}: {}", kind, e)))
}
