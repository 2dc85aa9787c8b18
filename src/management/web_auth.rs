use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::Url;
use tokio::{
    sync::{Mutex, oneshot},
    task::JoinHandle,
};

use crate::{api::CallbackState, error::AuthError, info, server, warning};

/// Interactive web authentication primitive.
///
/// Opens `url` in a user-facing surface and waits until the provider
/// redirects back to the registered callback. Returns the full redirect URL,
/// or `None` when the user closed the surface.
#[async_trait]
pub trait WebAuthFlow: Send + Sync {
    async fn launch(&self, url: &Url) -> Result<Option<String>, AuthError>;
}

/// Opens the system browser and catches the redirect on a one-shot local
/// listener bound to the redirect URI's host and port.
///
/// Pressing Ctrl-C while waiting counts as closing the auth window. Under
/// `moodcli serve` the same Ctrl-C also shuts the message server down, so
/// there a flow is built [`with_timeout`](BrowserAuthFlow::with_timeout) and
/// an abandoned browser window cancels once the timeout elapses.
pub struct BrowserAuthFlow {
    redirect_uri: String,
    timeout: Option<Duration>,
}

impl BrowserAuthFlow {
    pub fn new(redirect_uri: impl Into<String>) -> Self {
        Self {
            redirect_uri: redirect_uri.into(),
            timeout: None,
        }
    }

    /// Gives up waiting for the redirect after `timeout`, reported as a cancel.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl WebAuthFlow for BrowserAuthFlow {
    async fn launch(&self, url: &Url) -> Result<Option<String>, AuthError> {
        let redirect = Url::parse(&self.redirect_uri)
            .map_err(|e| AuthError::AuthFlow(format!("invalid redirect URI: {}", e)))?;
        let addr = redirect
            .socket_addrs(|| Some(80))
            .map_err(|e| AuthError::AuthFlow(format!("cannot resolve redirect URI: {}", e)))?
            .into_iter()
            .next()
            .ok_or_else(|| AuthError::AuthFlow("redirect URI has no address".to_string()))?;

        let (redirect_tx, redirect_rx) = oneshot::channel::<String>();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let state = CallbackState {
            redirect_uri: self.redirect_uri.clone(),
            redirect: Arc::new(Mutex::new(Some(redirect_tx))),
        };

        let handle = server::start_callback_server(addr, redirect.path(), state, shutdown_rx)
            .await
            .map_err(|e| AuthError::AuthFlow(format!("cannot listen on {}: {}", addr, e)))?;

        if webbrowser::open(url.as_str()).is_err() {
            warning!(
                "Failed to open browser. Please navigate to the following URL manually:\n{}",
                url
            );
        }
        info!("Waiting for authorization (press Ctrl-C to cancel)...");

        let outcome = wait_for_redirect(redirect_rx, self.timeout).await;

        let _ = shutdown_tx.send(());
        join_callback_server(handle).await;
        outcome
    }
}

/// Waits for the callback listener to stop, reporting a panicked task.
async fn join_callback_server(handle: JoinHandle<()>) {
    if let Err(e) = handle.await {
        warning!("Callback server task failed: {}", e);
    }
}

/// Waits for the forwarded redirect URL; Ctrl-C or an elapsed timeout yield
/// `None`.
async fn wait_for_redirect(
    redirect: oneshot::Receiver<String>,
    timeout: Option<Duration>,
) -> Result<Option<String>, AuthError> {
    let expired = async {
        match timeout {
            Some(timeout) => tokio::time::sleep(timeout).await,
            None => std::future::pending::<()>().await,
        }
    };
    let interrupted = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        received = redirect => received
            .map(Some)
            .map_err(|_| AuthError::AuthFlow("callback listener stopped".to_string())),
        _ = interrupted => Ok(None),
        _ = expired => {
            info!("Timed out waiting for authorization");
            Ok(None)
        }
    }
}
