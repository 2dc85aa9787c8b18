use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::{
    error::PlayerError,
    info,
    types::{DevicesResponse, Mood, PlaybackState, StartPlaybackRequest},
};

/// Playback transport calls against the Spotify Web API.
///
/// Stateless apart from the base URL; every call takes the bearer token so
/// the caller can retry with a refreshed one.
pub struct Player {
    client: Client,
    api_url: String,
}

impl Player {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Starts the mood's playlist on the active (or first) device with
    /// shuffle enabled.
    pub async fn play_mood(&self, token: &str, mood: Mood) -> Result<(), PlayerError> {
        let playlist_id = mood.playlist_id();
        info!("Playing {} music: {}", mood.name(), playlist_id);

        let res = self
            .client
            .get(format!("{}/me/player/devices", self.api_url))
            .bearer_auth(token)
            .send()
            .await?;
        let devices: DevicesResponse = parse_lenient(check(res, "Failed to get devices")?).await;

        let device = devices
            .devices
            .iter()
            .filter(|d| d.id.is_some())
            .find(|d| d.is_active)
            .or_else(|| devices.devices.iter().find(|d| d.id.is_some()))
            .ok_or(PlayerError::NoActiveDevice)?;
        let device_id = device.id.clone().unwrap_or_default();
        info!("Using device: {}", device.name);

        let res = self
            .client
            .put(format!("{}/me/player/play", self.api_url))
            .query(&[("device_id", device_id.as_str())])
            .bearer_auth(token)
            .json(&StartPlaybackRequest {
                context_uri: format!("spotify:playlist:{}", playlist_id),
                position_ms: 0,
            })
            .send()
            .await?;
        check(res, "Failed to start playback")?;

        // shuffle is best effort
        let _ = self
            .client
            .put(format!("{}/me/player/shuffle", self.api_url))
            .query(&[("state", "true"), ("device_id", device_id.as_str())])
            .bearer_auth(token)
            .send()
            .await;

        Ok(())
    }

    /// Pauses when playing, plays otherwise. Returns the new `is_playing`.
    pub async fn toggle_playback(&self, token: &str) -> Result<bool, PlayerError> {
        let res = self
            .client
            .get(format!("{}/me/player", self.api_url))
            .bearer_auth(token)
            .send()
            .await?;

        let play = if res.status() == StatusCode::NO_CONTENT {
            true
        } else {
            let state: PlaybackState =
                parse_lenient(check(res, "Failed to get playback state")?).await;
            !state.is_playing
        };
        let action = if play { "play" } else { "pause" };

        let res = self
            .client
            .put(format!("{}/me/player/{}", self.api_url, action))
            .bearer_auth(token)
            .send()
            .await?;
        check(res, &format!("Failed to {} playback", action))?;

        Ok(play)
    }

    pub async fn next_track(&self, token: &str) -> Result<(), PlayerError> {
        self.skip(token, "next", "Failed to skip to next track")
            .await
    }

    pub async fn previous_track(&self, token: &str) -> Result<(), PlayerError> {
        self.skip(token, "previous", "Failed to go to previous track")
            .await
    }

    async fn skip(&self, token: &str, direction: &str, failure: &str) -> Result<(), PlayerError> {
        let res = self
            .client
            .post(format!("{}/me/player/{}", self.api_url, direction))
            .bearer_auth(token)
            .send()
            .await?;
        check(res, failure)?;
        Ok(())
    }

    /// Current playback, or a stopped state when nothing can be read.
    ///
    /// Only a rejected token is reported as an error.
    pub async fn current_playback(&self, token: &str) -> Result<PlaybackState, PlayerError> {
        let res = match self
            .client
            .get(format!("{}/me/player", self.api_url))
            .bearer_auth(token)
            .send()
            .await
        {
            Ok(res) => res,
            Err(_) => return Ok(PlaybackState::default()),
        };

        match res.status() {
            StatusCode::UNAUTHORIZED => Err(PlayerError::Unauthorized),
            StatusCode::NO_CONTENT => Ok(PlaybackState::default()),
            status if !status.is_success() => Ok(PlaybackState::default()),
            _ => Ok(parse_lenient(res).await),
        }
    }
}

fn check(res: Response, failure: &str) -> Result<Response, PlayerError> {
    match res.status() {
        StatusCode::UNAUTHORIZED => Err(PlayerError::Unauthorized),
        status if status.is_success() => Ok(res),
        status => Err(PlayerError::Api(format!("{} ({})", failure, status.as_u16()))),
    }
}

/// Empty or malformed bodies decode to the default value.
async fn parse_lenient<T: DeserializeOwned + Default>(res: Response) -> T {
    match res.text().await {
        Ok(text) if !text.trim().is_empty() => serde_json::from_str(&text).unwrap_or_default(),
        _ => T::default(),
    }
}
