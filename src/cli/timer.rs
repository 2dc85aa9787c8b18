use std::time::Duration;

use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    cli::build_coordinator, error, info, management::Coordinator, utils, warning,
};

pub async fn start(minutes: u64) {
    let coordinator = build_coordinator().await;
    if let Err(e) = coordinator.start_timer(minutes).await {
        error!("Failed to start timer: {}", e);
    }
    run_foreground(&coordinator).await;
}

pub async fn resume() {
    let coordinator = build_coordinator().await;
    if let Err(e) = coordinator.resume_timer().await {
        error!("Failed to resume timer: {}", e);
    }
    if !coordinator.timer_state().await.running {
        warning!("No paused timer to resume");
        return;
    }
    run_foreground(&coordinator).await;
}

pub async fn pause() {
    let coordinator = build_coordinator().await;
    if let Err(e) = coordinator.pause_timer().await {
        error!("Failed to pause timer: {}", e);
    }
}

pub async fn stop() {
    let coordinator = build_coordinator().await;
    if let Err(e) = coordinator.stop_timer().await {
        error!("Failed to stop timer: {}", e);
    }
}

pub async fn status() {
    let coordinator = build_coordinator().await;
    let state = coordinator.timer_state().await;

    if state.running {
        let ends_at = Local::now() + chrono::Duration::seconds(state.remaining as i64);
        info!(
            "{} left of {} (ends at {})",
            utils::format_clock(state.remaining),
            utils::format_clock(state.duration),
            ends_at.format("%H:%M")
        );
    } else if state.remaining < state.duration {
        info!(
            "Paused at {} of {}",
            utils::format_clock(state.remaining),
            utils::format_clock(state.duration)
        );
    } else {
        info!("No timer running ({} session)", utils::format_clock(state.duration));
    }

    report_flow_score(&coordinator).await;
}

async fn report_flow_score(coordinator: &Coordinator) {
    let samples = coordinator.flow().samples().await;
    if !samples.is_empty() {
        info!(
            "Average flow score: {:.1} ({} samples)",
            coordinator.flow().average_score().await,
            samples.len()
        );
    }
}

/// Shows the countdown until it finishes; Ctrl-C pauses and keeps the snapshot.
async fn run_foreground(coordinator: &Coordinator) {
    let state = coordinator.timer_state().await;
    let bar = ProgressBar::new(state.duration);
    bar.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );

    loop {
        let state = coordinator.timer_state().await;
        bar.set_position(state.duration - state.remaining);
        bar.set_message(utils::format_clock(state.remaining));

        if !state.running {
            bar.finish_and_clear();
            report_flow_score(coordinator).await;
            return;
        }

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(250)) => {}
            _ = tokio::signal::ctrl_c() => {
                bar.abandon();
                if let Err(e) = coordinator.pause_timer().await {
                    error!("Failed to pause timer: {}", e);
                }
                info!("Resume with `moodcli timer resume`");
                return;
            }
        }
    }
}
