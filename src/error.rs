//! Error types shared across the session, storage, player and coordinator layers.

use std::io;

/// Failures of the durable key-value storage.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("storage serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("storage file does not contain a JSON object")]
    NotAnObject,
}

/// Failures of the OAuth PKCE flow and the token lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Spotify client ID is not configured")]
    Configuration,

    #[error("Authentication was cancelled by user")]
    UserCancelled,

    #[error("Spotify authorization failed: {0}")]
    ProviderDenied(String),

    #[error("State mismatch - possible security issue")]
    SecurityViolation,

    #[error("No authorization code received from Spotify")]
    MissingAuthorizationCode,

    #[error("{0}")]
    TokenExchangeFailed(String),

    #[error("Invalid response from Spotify: {0}")]
    InvalidProviderResponse(String),

    #[error("No refresh token available")]
    NoRefreshToken,

    #[error("Token refresh rejected: {0}")]
    RefreshRejected(String),

    #[error("An authentication attempt is already in progress")]
    AuthenticationInProgress,

    #[error("A token refresh is already in progress")]
    RefreshInProgress,

    #[error("Authorization window failed: {0}")]
    AuthFlow(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Failures of the playback glue built on top of the access token.
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    #[error("No access token available")]
    NotAuthenticated,

    #[error("Access token rejected by Spotify")]
    Unauthorized,

    #[error("No playlist found for mood: {0}")]
    UnknownMood(String),

    #[error("No active Spotify device found. Please open Spotify on your computer or phone.")]
    NoActiveDevice,

    #[error("{0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Everything a UI request can fail with.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Player(#[from] PlayerError),

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error("Unknown message type: {0}")]
    UnknownMessage(String),

    #[error("Invalid message {0}")]
    InvalidMessage(String),

    #[error("Timer duration must be between 1 and {max} minutes, got {0}", max = crate::management::timer::MAX_MINUTES)]
    InvalidDuration(u64),
}
