use serde_json::Value;
use tabled::{Table, settings::Style};

use crate::{
    cli::{build_coordinator, report},
    types::{Payload, Request, StateSnapshot, StatusTableRow},
    utils,
};

pub async fn status() {
    let coordinator = build_coordinator().await;
    let response = coordinator.handle(Request::GetState).await;
    let session = coordinator.session().state();

    let Payload::State(state) = report(response) else {
        return;
    };

    let mut rows = vec![row("Session", session.name())];
    rows.extend(state_rows(&state));

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);
}

fn state_rows(state: &StateSnapshot) -> Vec<StatusTableRow> {
    let timer = &state.timer;
    vec![
        row("Authenticated", yes_no(state.is_authenticated)),
        row("Playing", yes_no(state.is_playing)),
        row(
            "Track",
            &state
                .current_track
                .as_ref()
                .map(describe_track)
                .unwrap_or_else(|| "-".to_string()),
        ),
        row(
            "Playlist",
            state.current_playlist.as_deref().unwrap_or("-"),
        ),
        row(
            "Timer",
            &format!(
                "{} / {} ({:.0}%, {})",
                utils::format_clock(timer.remaining),
                utils::format_clock(timer.duration),
                timer.progress,
                if timer.running { "running" } else { "stopped" }
            ),
        ),
        row("Flow score", &format!("{:.1}", state.flow_score)),
    ]
}

fn describe_track(item: &Value) -> String {
    let name = item["name"].as_str().unwrap_or("unknown");
    let artists: Vec<&str> = item["artists"]
        .as_array()
        .map(|a| a.iter().filter_map(|artist| artist["name"].as_str()).collect())
        .unwrap_or_default();

    if artists.is_empty() {
        name.to_string()
    } else {
        format!("{} - {}", artists.join(", "), name)
    }
}

fn row(field: &str, value: &str) -> StatusTableRow {
    StatusTableRow {
        field: field.to_string(),
        value: value.to_string(),
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}
