use std::sync::Arc;

use axum::{Extension, extract::RawQuery, response::Html};
use tokio::sync::{Mutex, oneshot};

/// Shared with the callback handler for the lifetime of one authorization.
#[derive(Clone)]
pub struct CallbackState {
    pub redirect_uri: String,
    pub redirect: Arc<Mutex<Option<oneshot::Sender<String>>>>,
}

/// Hands the full redirect URL to the waiting auth flow.
///
/// Only the first callback is forwarded; the query is passed on untouched so
/// that state, code and error are validated in one place.
pub async fn callback(
    RawQuery(query): RawQuery,
    Extension(state): Extension<CallbackState>,
) -> Html<&'static str> {
    let Some(sender) = state.redirect.lock().await.take() else {
        return Html("<h4>Authorization already handled.</h4>");
    };

    let redirect_url = match query {
        Some(q) if !q.is_empty() => format!("{}?{}", state.redirect_uri, q),
        _ => state.redirect_uri.clone(),
    };

    if sender.send(redirect_url).is_err() {
        return Html("<h4>Authorization is no longer awaited.</h4>");
    }

    Html("<h2>Authorization received.</h2><p>You can close this browser window.</p>")
}
