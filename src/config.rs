//! Configuration management for moodcli.
//!
//! Configuration values come from environment variables, optionally seeded
//! from a `.env` file in the local data directory. Every value except the
//! client ID has a default pointing at the public Spotify endpoints, so a
//! user only has to register an application and provide its client ID.
//!
//! The lookup order is:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults

use std::{env, path::PathBuf};

/// Scopes requested during authorization: profile read, playback read and
/// modify, streaming, and private plus collaborative playlist read.
pub const SCOPES: [&str; 8] = [
    "user-read-private",
    "user-read-email",
    "user-modify-playback-state",
    "user-read-playback-state",
    "user-read-currently-playing",
    "streaming",
    "playlist-read-private",
    "playlist-read-collaborative",
];

const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8888/callback";
const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8787";
const DEFAULT_AUTH_TIMEOUT_SECS: u64 = 300;

/// Loads environment variables from a `.env` file in the local data directory.
///
/// The file lives at:
/// - Linux: `~/.local/share/moodcli/.env`
/// - macOS: `~/Library/Application Support/moodcli/.env`
/// - Windows: `%LOCALAPPDATA%/moodcli/.env`
///
/// A missing file is not an error, since plain environment variables are
/// enough to run. A file that exists but cannot be parsed is reported.
///
/// # Errors
///
/// Fails when the data directory cannot be created or the `.env` file is
/// malformed.
pub async fn load_env() -> Result<(), String> {
    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    match dotenv::from_path(&path) {
        Ok(()) => Ok(()),
        Err(dotenv::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(format!("{}: {}", path.display(), e)),
    }
}

/// Platform-specific directory holding `.env` and `storage.json`.
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("moodcli");
    path
}

/// Returns the bind address of the local message server.
///
/// Reads `MOODCLI_SERVER_ADDRESS`, defaulting to `127.0.0.1:8787`.
pub fn server_addr() -> String {
    env_or("MOODCLI_SERVER_ADDRESS", DEFAULT_SERVER_ADDRESS)
}

/// Returns the Spotify application client ID, if configured.
///
/// Reads `MOODCLI_CLIENT_ID`. An empty value counts as unset.
pub fn spotify_client_id() -> Option<String> {
    env::var("MOODCLI_CLIENT_ID")
        .ok()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
}

/// Returns the OAuth redirect URI.
///
/// Reads `MOODCLI_REDIRECT_URI`. It must match a redirect URI registered in
/// the Spotify application settings; the callback listener binds to its host
/// and port.
pub fn spotify_redirect_uri() -> String {
    env_or("MOODCLI_REDIRECT_URI", DEFAULT_REDIRECT_URI)
}

/// Returns the Spotify authorization endpoint.
pub fn spotify_apiauth_url() -> String {
    env_or("MOODCLI_AUTH_URL", DEFAULT_AUTH_URL)
}

/// Returns the Spotify token endpoint used for code exchange and refresh.
pub fn spotify_apitoken_url() -> String {
    env_or("MOODCLI_TOKEN_URL", DEFAULT_TOKEN_URL)
}

/// Returns the Spotify Web API base URL.
pub fn spotify_apiurl() -> String {
    env_or("MOODCLI_API_URL", DEFAULT_API_URL)
}

/// Returns the flow metrics endpoint polled during focus sessions.
///
/// Reads `MOODCLI_METRICS_URL`. There is no default; without it, flow
/// scores are not tracked.
pub fn metrics_url() -> Option<String> {
    env::var("MOODCLI_METRICS_URL")
        .ok()
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
}

/// Returns how long a `serve` process waits for an authorization redirect.
///
/// Reads `MOODCLI_AUTH_TIMEOUT_SECS`, defaulting to 300 seconds.
pub fn auth_timeout() -> std::time::Duration {
    let secs = env::var("MOODCLI_AUTH_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_AUTH_TIMEOUT_SECS);
    std::time::Duration::from_secs(secs)
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Everything the authentication session needs to talk to the provider.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// `None` when no client ID is configured; the session reports this as a
    /// configuration error when a flow is attempted.
    pub client_id: Option<String>,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
    pub scopes: Vec<String>,
}

impl AuthConfig {
    /// Builds the configuration from the environment.
    pub fn from_env() -> Self {
        Self {
            client_id: spotify_client_id(),
            redirect_uri: spotify_redirect_uri(),
            auth_url: spotify_apiauth_url(),
            token_url: spotify_apitoken_url(),
            scopes: SCOPES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Space-separated scope list as sent in the authorization URL.
    pub fn scope(&self) -> String {
        self.scopes.join(" ")
    }
}
