//! Transport tests over real HTTP + SSE, against the in-process simulator
//! bound to an ephemeral port.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use openthermal_client::HttpStreamStore;
use openthermal_core::{
    PresentationStore, StreamConfig, StreamCursor, StreamError, StreamStore, WatchStats, run_watch,
};
use openthermal_sim::SimState;

fn frame_body(occupied: bool, temp: f64) -> String {
    format!(r#"{{"occupied":{occupied},"grid":[[{temp}]]}}"#)
}

/// Serve a simulator state on an ephemeral port; returns its endpoint URL.
async fn serve(state: Arc<SimState>) -> String {
    let app = openthermal_sim::build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn client(endpoint: &str, token: Option<&str>) -> HttpStreamStore {
    HttpStreamStore::new(StreamConfig {
        endpoint: endpoint.to_string(),
        stream: "amg8833".to_string(),
        token: token.map(String::from),
    })
    .unwrap()
}

async fn wait_for(what: &str, mut done: impl FnMut() -> bool) {
    for _ in 0..250 {
        if done() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("timed out waiting for {what}");
}

#[tokio::test]
async fn check_tail_reports_the_next_position() {
    let state = SimState::new("amg8833", None, Duration::from_secs(30));
    state.append(frame_body(false, 21.0));
    state.append(frame_body(true, 30.0));
    let endpoint = serve(Arc::clone(&state)).await;

    let store = client(&endpoint, Some("dev"));
    let cursor = store.check_tail("amg8833").await.unwrap();
    assert_eq!(cursor, StreamCursor(2));
}

#[tokio::test]
async fn unknown_stream_is_not_found() {
    let state = SimState::new("amg8833", None, Duration::from_secs(30));
    let endpoint = serve(state).await;

    let store = client(&endpoint, Some("dev"));
    let err = store.check_tail("other").await.unwrap_err();
    assert!(matches!(err, StreamError::NotFound(name) if name == "other"));
}

#[tokio::test]
async fn rejected_credential_surfaces_as_connectivity() {
    let state = SimState::new("amg8833", Some("secret".to_string()), Duration::from_secs(30));
    let endpoint = serve(state).await;

    let err = client(&endpoint, Some("wrong"))
        .check_tail("amg8833")
        .await
        .unwrap_err();
    match err {
        StreamError::Connectivity(msg) => assert!(msg.contains("401"), "got: {msg}"),
        other => panic!("expected Connectivity, got {other}"),
    }

    // The accepted credential works.
    let cursor = client(&endpoint, Some("secret"))
        .check_tail("amg8833")
        .await
        .unwrap();
    assert_eq!(cursor, StreamCursor(0));
}

#[tokio::test]
async fn subscription_replays_backlog_then_goes_live() {
    let state = SimState::new("amg8833", None, Duration::from_secs(30));
    state.append(frame_body(false, 20.0));
    state.append(frame_body(false, 20.5));
    let endpoint = serve(Arc::clone(&state)).await;

    let store = client(&endpoint, Some("dev"));
    let mut subscription = store.subscribe("amg8833", StreamCursor(0)).await.unwrap();

    let backlog = tokio::time::timeout(Duration::from_secs(5), subscription.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(backlog.len(), 2);
    assert_eq!(backlog.records[0].position, 0);
    assert_eq!(backlog.records[1].position, 1);
    assert_eq!(backlog.records[1].body, frame_body(false, 20.5));

    state.append(frame_body(true, 31.0));
    let live = tokio::time::timeout(Duration::from_secs(5), subscription.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live.records[0].position, 2);
    assert_eq!(live.records[0].body, frame_body(true, 31.0));
}

#[tokio::test]
async fn watch_pipeline_end_to_end_over_http() {
    // Fast keepalives double as the "subscription is live" signal.
    let state = SimState::new("amg8833", None, Duration::from_millis(100));
    let endpoint = serve(Arc::clone(&state)).await;

    let store = Arc::new(client(&endpoint, Some("dev")));
    let presentation = Arc::new(PresentationStore::new());
    let stats = Arc::new(WatchStats::new());
    let cancel = CancellationToken::new();

    let task = tokio::spawn({
        let store = Arc::clone(&store);
        let presentation = Arc::clone(&presentation);
        let stats = Arc::clone(&stats);
        let cancel = cancel.clone();
        async move { run_watch(store.as_ref(), "amg8833", &presentation, &stats, cancel).await }
    });

    wait_for("the subscription to go live", || {
        stats.snapshot().empty_batches > 0
    })
    .await;

    state.append(frame_body(true, 29.0));
    state.append("definitely not a frame".to_string());
    state.append(frame_body(false, 19.0));

    wait_for("both decodable frames to apply", || {
        stats.snapshot().frames == 2
    })
    .await;

    let snap = stats.snapshot();
    assert_eq!(snap.decode_errors, 1);
    assert_eq!(snap.last_position, Some(2));

    let current = presentation.current();
    assert!(current.has_data);
    assert!(!current.frame.occupied);
    assert_eq!(current.frame.grid, vec![vec![19.0]]);

    cancel.cancel();
    task.await.unwrap().unwrap();
}
