use std::sync::Arc;

use crate::{
    cli::build_coordinator_with, config, error, management::BrowserAuthFlow, server,
};

pub async fn serve() {
    let browser =
        BrowserAuthFlow::new(config::spotify_redirect_uri()).with_timeout(config::auth_timeout());
    let coordinator = Arc::new(build_coordinator_with(browser).await);
    coordinator.resume_ticking().await;

    if let Err(e) = server::start_api_server(coordinator).await {
        error!("Server failed: {}", e);
    }
}
