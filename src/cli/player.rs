use crate::{
    cli::{build_coordinator, report},
    success,
    types::{Mood, Request},
};

pub async fn play(mood: Mood) {
    let coordinator = build_coordinator().await;
    report(
        coordinator
            .handle(Request::PlayMood {
                mood: mood.name().to_string(),
            })
            .await,
    );
}

pub async fn toggle() {
    let coordinator = build_coordinator().await;
    report(coordinator.handle(Request::TogglePlayback).await);
}

pub async fn next() {
    let coordinator = build_coordinator().await;
    report(coordinator.handle(Request::NextTrack).await);
    success!("Skipped to next track");
}

pub async fn previous() {
    let coordinator = build_coordinator().await;
    report(coordinator.handle(Request::PreviousTrack).await);
    success!("Went to previous track");
}
