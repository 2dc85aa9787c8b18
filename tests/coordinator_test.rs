mod common;

use std::{sync::Arc, time::Duration};

use common::*;
use mockito::{Matcher, Server, ServerGuard};
use moodcli::{
    management::{Coordinator, FlowTracker, KeyValueStore, MemoryStore},
    spotify::player::Player,
    types::Request,
};
use serde_json::{Value, json};

async fn coordinator(
    server: &ServerGuard,
    store: &Arc<MemoryStore>,
    flow: &Arc<ScriptedFlow>,
) -> Coordinator {
    coordinator_tracking(server, None, store, flow).await
}

async fn coordinator_tracking(
    server: &ServerGuard,
    metrics_url: Option<String>,
    store: &Arc<MemoryStore>,
    flow: &Arc<ScriptedFlow>,
) -> Coordinator {
    let session = session_with(test_config(&server.url()), store, flow).await;
    let player = Player::new(server.url());
    let store: Arc<dyn KeyValueStore> = store.clone();
    let tracker = FlowTracker::restore(metrics_url, Arc::clone(&store)).await;
    Coordinator::new(session, player, tracker, store).await
}

async fn send(coordinator: &Coordinator, message: Value) -> Value {
    serde_json::to_value(coordinator.handle_value(message).await).unwrap()
}

#[tokio::test]
async fn test_unknown_message_type_is_reported() {
    let server = Server::new_async().await;
    let store = store_with(json!({})).await;
    let c = coordinator(&server, &store, &ScriptedFlow::new(Behavior::Cancel)).await;

    let reply = send(&c, json!({ "type": "FOO" })).await;
    assert_eq!(
        reply,
        json!({ "success": false, "error": "Unknown message type: FOO", "type": "FOO" })
    );
}

#[tokio::test]
async fn test_start_timer_defaults_to_pomodoro() {
    let server = Server::new_async().await;
    let store = store_with(json!({})).await;
    let c = coordinator(&server, &store, &ScriptedFlow::new(Behavior::Cancel)).await;

    let reply = send(&c, json!({ "type": "START_TIMER" })).await;
    assert_eq!(reply, json!({ "success": true, "duration": 25 }));
    assert_eq!(
        store.snapshot().await.get("timerState"),
        Some(&json!({ "running": true, "duration": 1500, "remaining": 1500 }))
    );

    let reply = send(&c, json!({ "type": "PAUSE_TIMER" })).await;
    assert_eq!(reply, json!({ "success": true }));
    assert!(!c.timer_state().await.running);

    send(&c, json!({ "type": "STOP_TIMER" })).await;
    assert_eq!(
        store.snapshot().await.get("timerState"),
        Some(&json!({ "running": false, "duration": 1500, "remaining": 1500 }))
    );
}

#[tokio::test]
async fn test_start_timer_with_duration() {
    let server = Server::new_async().await;
    let store = store_with(json!({})).await;
    let c = coordinator(&server, &store, &ScriptedFlow::new(Behavior::Cancel)).await;

    let reply = send(&c, json!({ "type": "START_TIMER", "duration": 5 })).await;
    assert_eq!(reply, json!({ "success": true, "duration": 5 }));
    assert_eq!(c.timer_state().await.duration, 300);
    c.stop_timer().await.unwrap();
}

#[tokio::test]
async fn test_start_timer_rejects_oversized_duration() {
    let server = Server::new_async().await;
    let store = store_with(json!({})).await;
    let c = coordinator(&server, &store, &ScriptedFlow::new(Behavior::Cancel)).await;

    let reply = serde_json::to_value(
        c.handle(Request::StartTimer {
            duration: Some(u64::MAX / 30),
        })
        .await,
    )
    .unwrap();
    assert_eq!(reply["success"], json!(false));
    assert_eq!(reply["type"], json!("START_TIMER"));
    assert!(!c.timer_state().await.running);
    assert!(!store.snapshot().await.contains_key("timerState"));

    let reply = send(&c, json!({ "type": "START_TIMER", "duration": 1441 })).await;
    assert_eq!(reply["success"], json!(false));

    let reply = send(&c, json!({ "type": "START_TIMER", "duration": 1440 })).await;
    assert_eq!(reply, json!({ "success": true, "duration": 1440 }));
    c.stop_timer().await.unwrap();
}

#[tokio::test]
async fn test_flow_score_is_sampled_while_timer_runs() {
    let mut server = Server::new_async().await;
    let metrics = server
        .mock("GET", "/metrics")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"flow_score":0.75}"#)
        .expect_at_least(1)
        .create_async()
        .await;

    let store = store_with(json!({
        "flowScores": [{ "score": 0.1, "timestamp": 1 }]
    }))
    .await;
    let url = format!("{}/metrics", server.url());
    let c = coordinator_tracking(
        &server,
        Some(url),
        &store,
        &ScriptedFlow::new(Behavior::Cancel),
    )
    .await;
    assert_eq!(c.flow().average_score().await, 10.0);

    send(&c, json!({ "type": "START_TIMER", "duration": 10 })).await;
    assert!(c.flow().is_tracking());

    for _ in 0..100 {
        let stored = store.snapshot().await;
        let saved = stored
            .get("flowScores")
            .and_then(Value::as_array)
            .is_some_and(|samples| !samples.is_empty());
        if saved {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    // the previous session's samples are gone
    let samples = c.flow().samples().await;
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].score, 0.75);

    let reply = send(&c, json!({ "type": "GET_STATE" })).await;
    assert_eq!(reply["flowScore"], json!(75.0));
    assert_eq!(
        store.snapshot().await["flowScores"][0]["score"],
        json!(0.75)
    );

    send(&c, json!({ "type": "STOP_TIMER" })).await;
    assert!(!c.flow().is_tracking());
    metrics.assert_async().await;
}

#[tokio::test]
async fn test_unreachable_metrics_keeps_timer_running() {
    let server = Server::new_async().await;
    let store = store_with(json!({})).await;
    let c = coordinator_tracking(
        &server,
        Some("http://127.0.0.1:9/metrics".to_string()),
        &store,
        &ScriptedFlow::new(Behavior::Cancel),
    )
    .await;

    let reply = send(&c, json!({ "type": "START_TIMER", "duration": 5 })).await;
    assert_eq!(reply, json!({ "success": true, "duration": 5 }));
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(c.timer_state().await.running);
    assert!(c.flow().samples().await.is_empty());
    let reply = send(&c, json!({ "type": "GET_STATE" })).await;
    assert_eq!(reply["flowScore"], json!(0.0));
    c.stop_timer().await.unwrap();
}

#[tokio::test]
async fn test_restores_persisted_timer() {
    let server = Server::new_async().await;
    let store = store_with(json!({
        "timerState": { "running": false, "duration": 600, "remaining": 42 }
    }))
    .await;
    let c = coordinator(&server, &store, &ScriptedFlow::new(Behavior::Cancel)).await;

    let state = c.timer_state().await;
    assert_eq!(state.remaining, 42);
    assert_eq!(state.duration, 600);
}

#[tokio::test]
async fn test_get_state_when_unauthenticated() {
    let mut server = Server::new_async().await;
    let playback = server
        .mock("GET", "/me/player")
        .expect(0)
        .create_async()
        .await;
    let store = store_with(json!({})).await;
    let c = coordinator(&server, &store, &ScriptedFlow::new(Behavior::Cancel)).await;

    let reply = send(&c, json!({ "type": "GET_STATE" })).await;
    assert_eq!(reply["success"], json!(true));
    assert_eq!(reply["isAuthenticated"], json!(false));
    assert_eq!(reply["isPlaying"], json!(false));
    assert_eq!(reply["currentTrack"], Value::Null);
    assert_eq!(reply["timer"]["remaining"], json!(1500));
    playback.assert_async().await;
}

#[tokio::test]
async fn test_get_state_reads_playback() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/me/player")
        .match_header("authorization", "Bearer AT1")
        .with_status(200)
        .with_body(r#"{"is_playing":true,"item":{"name":"Weightless"}}"#)
        .create_async()
        .await;
    let store = store_with(json!({ "accessToken": "AT1", "refreshToken": "RT1" })).await;
    let c = coordinator(&server, &store, &ScriptedFlow::new(Behavior::Cancel)).await;

    let reply = send(&c, json!({ "type": "GET_STATE" })).await;
    assert_eq!(reply["isAuthenticated"], json!(true));
    assert_eq!(reply["isPlaying"], json!(true));
    assert_eq!(reply["currentTrack"]["name"], json!("Weightless"));
}

#[tokio::test]
async fn test_play_mood_requires_token() {
    let server = Server::new_async().await;
    let store = store_with(json!({})).await;
    let c = coordinator(&server, &store, &ScriptedFlow::new(Behavior::Cancel)).await;

    let reply = send(&c, json!({ "type": "PLAY_MOOD", "mood": "chill" })).await;
    assert_eq!(
        reply,
        json!({ "success": false, "error": "No access token available", "type": "PLAY_MOOD" })
    );
}

#[tokio::test]
async fn test_play_mood_rejects_unknown_mood() {
    let server = Server::new_async().await;
    let store = store_with(json!({ "accessToken": "AT1" })).await;
    let c = coordinator(&server, &store, &ScriptedFlow::new(Behavior::Cancel)).await;

    let reply = send(&c, json!({ "type": "PLAY_MOOD", "mood": "jazz" })).await;
    assert_eq!(reply["success"], json!(false));
    assert_eq!(reply["error"], json!("No playlist found for mood: jazz"));
}

#[tokio::test]
async fn test_play_mood_starts_playlist_on_active_device() {
    let mut server = Server::new_async().await;
    let devices = server
        .mock("GET", "/me/player/devices")
        .match_header("authorization", "Bearer AT1")
        .with_status(200)
        .with_body(
            r#"{"devices":[
                {"id":"dev0","name":"Phone","is_active":false},
                {"id":"dev1","name":"Laptop","is_active":true}
            ]}"#,
        )
        .create_async()
        .await;
    let play = server
        .mock("PUT", "/me/player/play")
        .match_query(Matcher::UrlEncoded("device_id".into(), "dev1".into()))
        .match_body(Matcher::PartialJson(json!({
            "context_uri": "spotify:playlist:37i9dQZF1DX3Ogo9pFvBkY",
            "position_ms": 0
        })))
        .with_status(204)
        .create_async()
        .await;
    let shuffle = server
        .mock("PUT", "/me/player/shuffle")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("state".into(), "true".into()),
            Matcher::UrlEncoded("device_id".into(), "dev1".into()),
        ]))
        .with_status(204)
        .create_async()
        .await;

    let store = store_with(json!({ "accessToken": "AT1", "refreshToken": "RT1" })).await;
    let c = coordinator(&server, &store, &ScriptedFlow::new(Behavior::Cancel)).await;

    let reply = send(&c, json!({ "type": "PLAY_MOOD", "mood": "Chill" })).await;
    assert_eq!(reply, json!({ "success": true, "mood": "Chill" }));
    devices.assert_async().await;
    play.assert_async().await;
    shuffle.assert_async().await;
}

#[tokio::test]
async fn test_play_mood_without_devices() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/me/player/devices")
        .with_status(200)
        .with_body(r#"{"devices":[]}"#)
        .create_async()
        .await;

    let store = store_with(json!({ "accessToken": "AT1" })).await;
    let c = coordinator(&server, &store, &ScriptedFlow::new(Behavior::Cancel)).await;

    let reply = send(&c, json!({ "type": "PLAY_MOOD", "mood": "sleep" })).await;
    assert_eq!(reply["success"], json!(false));
    assert_eq!(reply["type"], json!("PLAY_MOOD"));
}

#[tokio::test]
async fn test_rejected_token_is_refreshed_once() {
    let mut server = Server::new_async().await;
    let stale = server
        .mock("POST", "/me/player/next")
        .match_header("authorization", "Bearer AT1")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    let refresh = server
        .mock("POST", "/api/token")
        .match_body(Matcher::UrlEncoded(
            "grant_type".into(),
            "refresh_token".into(),
        ))
        .with_status(200)
        .with_body(r#"{"access_token":"AT2"}"#)
        .create_async()
        .await;
    let fresh = server
        .mock("POST", "/me/player/next")
        .match_header("authorization", "Bearer AT2")
        .with_status(204)
        .create_async()
        .await;

    let store = store_with(json!({ "accessToken": "AT1", "refreshToken": "RT1" })).await;
    let c = coordinator(&server, &store, &ScriptedFlow::new(Behavior::Cancel)).await;

    let reply = send(&c, json!({ "type": "NEXT_TRACK" })).await;
    assert_eq!(reply, json!({ "success": true }));
    stale.assert_async().await;
    refresh.assert_async().await;
    fresh.assert_async().await;
    assert_eq!(store.snapshot().await, tokens("AT2", "RT1"));
}

#[tokio::test]
async fn test_failed_refresh_is_reported_and_keeps_tokens() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/me/player/previous")
        .with_status(401)
        .create_async()
        .await;
    server
        .mock("POST", "/api/token")
        .with_status(400)
        .with_body(r#"{"error":"invalid_grant"}"#)
        .create_async()
        .await;

    let store = store_with(json!({ "accessToken": "AT1", "refreshToken": "RT1" })).await;
    let c = coordinator(&server, &store, &ScriptedFlow::new(Behavior::Cancel)).await;

    let reply = send(&c, json!({ "type": "PREVIOUS_TRACK" })).await;
    assert_eq!(
        reply,
        json!({
            "success": false,
            "error": "Token refresh rejected: invalid_grant",
            "type": "PREVIOUS_TRACK"
        })
    );
    assert_eq!(store.snapshot().await, tokens("AT1", "RT1"));
}

#[tokio::test]
async fn test_toggle_playback_pauses_when_playing() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/me/player")
        .with_status(200)
        .with_body(r#"{"is_playing":true}"#)
        .create_async()
        .await;
    let pause = server
        .mock("PUT", "/me/player/pause")
        .with_status(204)
        .create_async()
        .await;

    let store = store_with(json!({ "accessToken": "AT1" })).await;
    let c = coordinator(&server, &store, &ScriptedFlow::new(Behavior::Cancel)).await;

    let reply = send(&c, json!({ "type": "TOGGLE_PLAYBACK" })).await;
    assert_eq!(reply, json!({ "success": true }));
    pause.assert_async().await;
}

#[tokio::test]
async fn test_authenticate_message() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/token")
        .with_status(200)
        .with_body(r#"{"access_token":"AT1","refresh_token":"RT1"}"#)
        .create_async()
        .await;

    let store = store_with(json!({})).await;
    let c = coordinator(&server, &store, &ScriptedFlow::approve("CODE1")).await;

    let reply = send(&c, json!({ "type": "AUTHENTICATE" })).await;
    assert_eq!(reply, json!({ "success": true, "isAuthenticated": true }));
    assert!(c.session().is_authenticated());
}

#[tokio::test]
async fn test_cancelled_authenticate_message() {
    let server = Server::new_async().await;
    let store = store_with(json!({})).await;
    let c = coordinator(&server, &store, &ScriptedFlow::new(Behavior::Cancel)).await;

    let reply = send(&c, json!({ "type": "AUTHENTICATE" })).await;
    assert_eq!(
        reply,
        json!({
            "success": false,
            "error": "Authentication was cancelled by user",
            "type": "AUTHENTICATE"
        })
    );
}
