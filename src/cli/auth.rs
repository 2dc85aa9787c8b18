use crate::{cli::build_coordinator, error, info, success};

pub async fn auth() {
    let coordinator = build_coordinator().await;
    if let Err(e) = coordinator.session().authenticate().await {
        error!("{}", e);
    }
}

pub async fn refresh() {
    let coordinator = build_coordinator().await;
    match coordinator.session().refresh().await {
        Ok(()) => success!("Access token refreshed"),
        Err(e) => {
            info!("Run `moodcli auth` to sign in again.");
            error!("{}", e);
        }
    }
}
