use std::{io, net::SocketAddr, str::FromStr, sync::Arc};

use axum::{
    Extension, Router,
    routing::{get, post},
};
use tokio::{sync::oneshot, task::JoinHandle};

use crate::{
    Res,
    api::{self, CallbackState},
    config, info,
    management::Coordinator,
    warning,
};

/// Serves the message protocol for UI clients until Ctrl-C.
pub async fn start_api_server(coordinator: Arc<Coordinator>) -> Res<()> {
    let app = Router::new()
        .route("/health", get(api::health))
        .route("/message", post(api::message))
        .layer(Extension(coordinator));

    let addr = SocketAddr::from_str(&config::server_addr())
        .map_err(|e| format!("Failed to parse server address: {}", e))?;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening for messages on http://{}/message", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_err() {
                warning!("Cannot listen for Ctrl-C, stop the server manually");
                std::future::pending::<()>().await;
            }
        })
        .await?;
    Ok(())
}

/// Binds the OAuth callback listener and serves it until `shutdown` fires.
///
/// Binding happens before returning so that a busy port is reported before
/// the browser is opened.
pub async fn start_callback_server(
    addr: SocketAddr,
    path: &str,
    state: CallbackState,
    shutdown: oneshot::Receiver<()>,
) -> io::Result<JoinHandle<()>> {
    let app = Router::new()
        .route(path, get(api::callback))
        .route("/health", get(api::health))
        .layer(Extension(state));

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Ok(tokio::spawn(async move {
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown.await;
            })
            .await;
        if let Err(e) = result {
            warning!("Callback server stopped: {}", e);
        }
    }))
}
