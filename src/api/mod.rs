//! # API Module
//!
//! HTTP endpoints served by moodcli's local listeners.
//!
//! ## Endpoints
//!
//! ### Authentication
//!
//! - [`callback`] - Receives the provider redirect at the end of the
//!   interactive authorization and hands the full redirect URL to the waiting
//!   [`crate::management::BrowserAuthFlow`]. It does not validate anything
//!   itself: state, code and provider errors are checked by the session.
//!
//! ### Messaging
//!
//! - [`message`] - `POST /message` accepts the JSON request envelope used by
//!   UI clients (`{"type": "AUTHENTICATE"}`, `{"type": "PLAY_MOOD", "mood":
//!   "chill"}`, ...) and answers with `{"success": true, ...}` or
//!   `{"success": false, "error": "...", "type": "..."}`.
//!
//! ### Monitoring
//!
//! - [`health`] - Returns status and version information.
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use axum::{Router, routing::{get, post}};
//! use moodcli::api::{health, message};
//!
//! let app = Router::new()
//!     .route("/message", post(message))
//!     .route("/health", get(health));
//! ```

mod callback;
mod health;
mod message;

pub use callback::CallbackState;
pub use callback::callback;
pub use health::health;
pub use message::message;
