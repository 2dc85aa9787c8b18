//! moodcli Library
//!
//! A mood-based Spotify player with a focus (pomodoro) timer. Authentication
//! uses the OAuth 2.0 PKCE flow; the resulting tokens are kept by a single
//! session object that persists them to a local key-value store.
//!
//! # Modules
//!
//! - `api` - HTTP endpoints for the OAuth callback and the message protocol
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `error` - Error types for the session, storage and player layers
//! - `management` - Session state machine, storage, timer and coordinator
//! - `server` - Local HTTP listeners
//! - `spotify` - Spotify accounts and Web API calls
//! - `types` - Data structures and wire types
//! - `utils` - PKCE helpers and formatting
//!
//! # Example
//!
//! ```
//! use moodcli::{config, cli};
//!
//! #[tokio::main]
//! async fn main() -> moodcli::Res<()> {
//!     config::load_env().await?;
//!     cli::auth().await;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod management;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

/// A convenient Result type alias for operations that may fail.
///
/// Used by the CLI glue and the servers, where any error ends up printed
/// to the user. Library layers return their own error enums from [`error`].
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Starting authentication process...");
/// info!("Timer started for {} minutes", minutes);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// # Example
///
/// ```
/// success!("Authentication successful!");
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only for fatal errors in the binary and CLI glue; library code returns
/// errors instead.
///
/// # Example
///
/// ```
/// error!("Cannot load environment. Err: {}", e);
/// // Program exits here - code after this will not execute
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// # Example
///
/// ```
/// warning!("Token refresh failed: {}", e);
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
