mod coordinator;
pub mod flow;
mod session;
pub mod store;
pub mod timer;
mod web_auth;

pub use coordinator::Coordinator;
pub use coordinator::parse_request;
pub use flow::FlowTracker;
pub use session::AuthSession;
pub use session::SessionState;
pub use session::parse_redirect;
pub use store::FileStore;
pub use store::KeyValueStore;
pub use store::MemoryStore;
pub use timer::FocusTimer;
pub use web_auth::BrowserAuthFlow;
pub use web_auth::WebAuthFlow;
