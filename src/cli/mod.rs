//! # CLI Module
//!
//! User-facing commands of moodcli. Every command builds the same
//! [`Coordinator`] a long-running `serve` process uses, so a command line
//! invocation and a UI message take identical paths through the session,
//! player and timer.
//!
//! ## Command Categories
//!
//! ### Authentication
//!
//! - [`auth`] - Runs the interactive OAuth 2.0 PKCE authorization
//! - [`refresh`] - Mints a new access token from the stored refresh token
//!
//! ### Playback
//!
//! - [`play`] - Starts the curated playlist for a mood with shuffle enabled
//! - [`toggle`], [`next`], [`previous`] - Transport controls
//! - [`status`] - Table of session, playback and timer state
//!
//! ### Focus Timer
//!
//! - [`timer_start`], [`timer_resume`] - Run the countdown in the foreground
//! - [`timer_pause`], [`timer_stop`], [`timer_status`]
//!
//! ### Server
//!
//! - [`serve`] - Message server for UI clients
//!
//! ## Error Handling
//!
//! Failures are printed with the `error!` macro, which exits with status 1.
//! Recoverable conditions are reported with `warning!`.

mod auth;
mod player;
mod serve;
mod status;
mod timer;

use std::sync::Arc;

use crate::{
    config::{self, AuthConfig},
    error,
    management::{
        AuthSession, BrowserAuthFlow, Coordinator, FileStore, FlowTracker, KeyValueStore,
    },
    spotify::player::Player,
    types::{Payload, Response},
};

pub use auth::auth;
pub use auth::refresh;
pub use player::next;
pub use player::play;
pub use player::previous;
pub use player::toggle;
pub use serve::serve;
pub use status::status;
pub use timer::pause as timer_pause;
pub use timer::resume as timer_resume;
pub use timer::start as timer_start;
pub use timer::status as timer_status;
pub use timer::stop as timer_stop;

/// Builds the coordinator over the on-disk store and the system browser.
///
/// Pass the browser flow explicitly when the default (Ctrl-C cancels, no
/// timeout) does not fit, as `serve` does.
pub async fn build_coordinator() -> Coordinator {
    let redirect_uri = config::spotify_redirect_uri();
    build_coordinator_with(BrowserAuthFlow::new(redirect_uri)).await
}

pub async fn build_coordinator_with(browser: BrowserAuthFlow) -> Coordinator {
    let auth_config = AuthConfig::from_env();
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::default_location());
    let flow = Arc::new(browser);

    let session = match AuthSession::restore(auth_config, Arc::clone(&store), flow).await {
        Ok(session) => session,
        Err(e) => error!("Failed to restore session: {}", e),
    };

    let tracker = FlowTracker::restore(config::metrics_url(), Arc::clone(&store)).await;
    Coordinator::new(
        session,
        Player::new(config::spotify_apiurl()),
        tracker,
        store,
    )
    .await
}

/// Exits with the envelope's error message on failure.
fn report(response: Response) -> Payload {
    match response.payload {
        Payload::Error { error, kind } if !response.success => {
            error!("{} failed: {}", kind, error)
        }
        payload => payload,
    }
}
