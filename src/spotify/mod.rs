//! # Spotify Integration Module
//!
//! HTTP calls against the two Spotify services moodcli talks to:
//!
//! - [`auth`] - the accounts service: authorization URL construction and the
//!   token endpoint (`authorization_code` and `refresh_token` grants). These
//!   functions only perform the requests; the state machine deciding when to
//!   call them, what to persist and what to wipe lives in
//!   [`crate::management::AuthSession`].
//! - [`player`] - the Web API playback transport: device lookup, starting a
//!   mood playlist, play/pause, next and previous track, and reading the
//!   current playback.
//!
//! ## Endpoints
//!
//! ```text
//! GET  {auth_url}?client_id&response_type=code&redirect_uri&state
//!                &code_challenge_method=S256&code_challenge&scope
//! POST {token_url}                      (form-urlencoded)
//! GET  {api_url}/me/player/devices
//! PUT  {api_url}/me/player/play?device_id=
//! PUT  {api_url}/me/player/shuffle?state=true&device_id=
//! GET  {api_url}/me/player
//! PUT  {api_url}/me/player/{play|pause}
//! POST {api_url}/me/player/{next|previous}
//! ```
//!
//! ## Errors
//!
//! Token endpoint calls surface transport errors as [`reqwest::Error`] and
//! leave HTTP status interpretation to the session. Player calls map a
//! `401 Unauthorized` to [`crate::error::PlayerError::Unauthorized`] so that
//! callers can refresh the access token and retry once.

pub mod auth;
pub mod player;
