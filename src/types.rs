use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabled::Tabled;

use crate::error::AuthError;

/// An authenticated session's tokens.
///
/// The access token is never empty; use [`Credential::new`] to build one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    access_token: String,
    refresh_token: Option<String>,
}

impl Credential {
    pub fn new(access_token: String, refresh_token: Option<String>) -> Result<Self, AuthError> {
        if access_token.is_empty() {
            return Err(AuthError::InvalidProviderResponse(
                "No access token received from Spotify".to_string(),
            ));
        }

        Ok(Self {
            access_token,
            refresh_token: refresh_token.filter(|t| !t.is_empty()),
        })
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }
}

/// Ephemeral per-attempt PKCE values.
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    pub code_verifier: String,
    pub code_challenge: String,
    pub state: String,
}

/// Body of a token endpoint response; only the consumed fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl TokenResponse {
    /// `error_description`, falling back to `error`.
    pub fn error_message(&self) -> Option<String> {
        self.error_description
            .clone()
            .filter(|d| !d.is_empty())
            .or_else(|| self.error.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Energetic,
    Sleep,
    Ambient,
    Chill,
}

impl Mood {
    pub const ALL: [Mood; 4] = [Mood::Energetic, Mood::Sleep, Mood::Ambient, Mood::Chill];

    /// Curated Spotify playlist for this mood.
    pub fn playlist_id(self) -> &'static str {
        match self {
            Mood::Energetic => "37i9dQZF1DX76Wlfdnj7AP",
            Mood::Sleep => "37i9dQZF1DX8NTLI2TtZa6",
            Mood::Ambient => "37i9dQZF1DX5Vy6DFOcx00",
            Mood::Chill => "37i9dQZF1DX3Ogo9pFvBkY",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Mood::Energetic => "energetic",
            Mood::Sleep => "sleep",
            Mood::Ambient => "ambient",
            Mood::Chill => "chill",
        }
    }

    /// Case-insensitive lookup by name.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|m| m.name() == name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DevicesResponse {
    #[serde(default)]
    pub devices: Vec<Device>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartPlaybackRequest {
    pub context_uri: String,
    pub position_ms: u64,
}

/// Current playback as reported by `GET /me/player`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    #[serde(default)]
    pub is_playing: bool,
    #[serde(default)]
    pub item: Option<Value>,
}

/// Persisted focus timer, stored under `timerState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub running: bool,
    pub duration: u64,
    pub remaining: u64,
}

/// Display view of the focus timer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimerState {
    pub minutes: u64,
    pub seconds: u64,
    pub progress: f64,
    pub running: bool,
    pub remaining: u64,
    pub duration: u64,
}

/// One reading from the flow metrics endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowSample {
    /// Raw score in `0.0..=1.0`.
    pub score: f64,
    /// Unix time in milliseconds.
    pub timestamp: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsResponse {
    pub flow_score: f64,
}

/// State pushed to UI clients in response to `GET_STATE`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    pub is_playing: bool,
    pub current_track: Option<Value>,
    pub current_playlist: Option<String>,
    pub is_authenticated: bool,
    pub timer: TimerState,
    /// Average flow score of the current session as a percentage.
    pub flow_score: f64,
}

/// Requests accepted from UI clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    GetState,
    PlayMood {
        mood: String,
    },
    TogglePlayback,
    NextTrack,
    PreviousTrack,
    StartTimer {
        /// Minutes; 25 when omitted.
        #[serde(default)]
        duration: Option<u64>,
    },
    PauseTimer,
    ResumeTimer,
    StopTimer,
    Authenticate,
}

impl Request {
    pub const KINDS: [&'static str; 10] = [
        "GET_STATE",
        "PLAY_MOOD",
        "TOGGLE_PLAYBACK",
        "NEXT_TRACK",
        "PREVIOUS_TRACK",
        "START_TIMER",
        "PAUSE_TIMER",
        "RESUME_TIMER",
        "STOP_TIMER",
        "AUTHENTICATE",
    ];

    /// Wire name of the `type` discriminator.
    pub fn kind(&self) -> &'static str {
        match self {
            Request::GetState => "GET_STATE",
            Request::PlayMood { .. } => "PLAY_MOOD",
            Request::TogglePlayback => "TOGGLE_PLAYBACK",
            Request::NextTrack => "NEXT_TRACK",
            Request::PreviousTrack => "PREVIOUS_TRACK",
            Request::StartTimer { .. } => "START_TIMER",
            Request::PauseTimer => "PAUSE_TIMER",
            Request::ResumeTimer => "RESUME_TIMER",
            Request::StopTimer => "STOP_TIMER",
            Request::Authenticate => "AUTHENTICATE",
        }
    }
}

/// Successful response payloads, flattened next to `success`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Payload {
    State(StateSnapshot),
    Authenticated {
        #[serde(rename = "isAuthenticated")]
        is_authenticated: bool,
    },
    Mood {
        mood: String,
    },
    Timer {
        duration: u64,
    },
    Empty {},
    Error {
        error: String,
        #[serde(rename = "type")]
        kind: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct Response {
    pub success: bool,
    #[serde(flatten)]
    pub payload: Payload,
}

impl Response {
    pub fn ok(payload: Payload) -> Self {
        Self {
            success: true,
            payload,
        }
    }

    pub fn failure(kind: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            payload: Payload::Error {
                error: error.into(),
                kind: kind.into(),
            },
        }
    }
}

#[derive(Tabled)]
pub struct StatusTableRow {
    pub field: String,
    pub value: String,
}
