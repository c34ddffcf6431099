//! # openthermal-sim
//!
//! Local stream-service simulator — develop the viewer without hardware.
//!
//! Exposes the same REST surface the real stream service has:
//!
//! - `GET /v1/streams/{stream}/records/tail` → `{"next_seq_num": N}`
//! - `GET /v1/streams/{stream}/records?start_seq_num=N` → SSE record batches
//!
//! backed by an in-memory append log. A producer task publishes synthetic
//! sensor frames at a fixed cadence, running the same occupancy rule the
//! hardware producer applies. Subscribers get replay from their start
//! position, then live records; idle connections get empty keepalive
//! batches, which downstream must treat as no-op ticks.

pub mod occupancy;
pub mod scene;

use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::Json,
    response::sse::{Event, Sse},
    routing::get,
};
use futures::{Stream, StreamExt};
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::{BroadcastStream, IntervalStream};
use tokio_util::sync::CancellationToken;

pub use occupancy::{HOT_THRESHOLD, MIN_CLUSTER, detect_occupancy};
pub use scene::{GRID_COLS, GRID_ROWS, ThermalScene};

const EMPTY_BATCH: &str = r#"{"records":[]}"#;
const LIVE_CHANNEL_CAPACITY: usize = 1024;

/// Simulator settings.
#[derive(Debug, Clone)]
pub struct SimOptions {
    /// Stream name served (anything else is a 404).
    pub stream: String,
    /// Producer cadence.
    pub interval: Duration,
    /// When set, requests must carry `Authorization: Bearer <token>`.
    pub token: Option<String>,
    /// Cadence of empty keepalive batches on idle subscriptions.
    pub keepalive: Duration,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            stream: "amg8833".to_string(),
            interval: Duration::from_millis(100),
            token: None,
            keepalive: Duration::from_secs(10),
        }
    }
}

// ---------------------------------------------------------------------------
// In-memory stream
// ---------------------------------------------------------------------------

/// One in-memory stream: an append log plus a live fan-out channel.
///
/// The log mutex is never held across an await; handlers snapshot under the
/// lock and stream from the snapshot plus the broadcast receiver.
pub struct SimState {
    stream: String,
    expected_token: Option<String>,
    keepalive: Duration,
    log: Mutex<Vec<String>>,
    live: broadcast::Sender<(u64, String)>,
}

impl SimState {
    pub fn new(stream: impl Into<String>, token: Option<String>, keepalive: Duration) -> Arc<Self> {
        let (live, _) = broadcast::channel(LIVE_CHANNEL_CAPACITY);
        Arc::new(Self {
            stream: stream.into(),
            expected_token: token,
            keepalive,
            log: Mutex::new(Vec::new()),
            live,
        })
    }

    /// Append one record body; returns its assigned position.
    pub fn append(&self, body: String) -> u64 {
        let mut log = self.log.lock().unwrap();
        let position = log.len() as u64;
        log.push(body.clone());
        // No receivers is fine; the log still grows.
        let _ = self.live.send((position, body));
        position
    }

    /// Next position the stream will assign.
    pub fn tail(&self) -> u64 {
        self.log.lock().unwrap().len() as u64
    }

    /// Open a read at `from`: backlog snapshot, first live position, and a
    /// live receiver subscribed before the snapshot so nothing is missed.
    fn open_read(&self, from: u64) -> (Vec<(u64, String)>, u64, broadcast::Receiver<(u64, String)>) {
        let rx = self.live.subscribe();
        let log = self.log.lock().unwrap();
        let backlog: Vec<(u64, String)> = log
            .iter()
            .enumerate()
            .skip(from as usize)
            .map(|(i, body)| (i as u64, body.clone()))
            .collect();
        let next_live = (log.len() as u64).max(from);
        (backlog, next_live, rx)
    }
}

// ---------------------------------------------------------------------------
// HTTP surface
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ReadParams {
    start_seq_num: Option<u64>,
}

fn authorize(state: &SimState, headers: &HeaderMap) -> Result<(), StatusCode> {
    let Some(expected) = &state.expected_token else {
        return Ok(());
    };
    let want = format!("Bearer {expected}");
    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if provided == Some(want.as_str()) {
        Ok(())
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

fn batch_payload(records: &[(u64, String)]) -> String {
    let records: Vec<Value> = records
        .iter()
        .map(|(seq, body)| json!({ "seq_num": seq, "body": body }))
        .collect();
    json!({ "records": records }).to_string()
}

async fn handle_tail(
    State(state): State<Arc<SimState>>,
    Path(stream): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    authorize(&state, &headers)?;
    if stream != state.stream {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(json!({ "next_seq_num": state.tail() })))
}

async fn handle_records(
    State(state): State<Arc<SimState>>,
    Path(stream): Path<String>,
    Query(params): Query<ReadParams>,
    headers: HeaderMap,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, StatusCode> {
    authorize(&state, &headers)?;
    if stream != state.stream {
        return Err(StatusCode::NOT_FOUND);
    }

    let from = params.start_seq_num.unwrap_or_else(|| state.tail());
    let (backlog, next_live, rx) = state.open_read(from);
    debug!(
        "read from {from}: {} backlog records, live from {next_live}",
        backlog.len()
    );

    let replay = futures::stream::iter(if backlog.is_empty() {
        None
    } else {
        Some(Ok(Event::default().data(batch_payload(&backlog))))
    });

    // One event per live record. A lagged receiver skips what it lost and
    // keeps going; the resulting position gap is the subscriber's to detect.
    let live = BroadcastStream::new(rx).filter_map(move |item| {
        futures::future::ready(match item {
            Ok((position, body)) if position >= next_live => Some(Ok(Event::default()
                .data(batch_payload(&[(position, body)])))),
            Ok(_) => None,
            Err(lag) => {
                warn!("slow subscriber: {lag}");
                None
            }
        })
    });

    // First keepalive after one full idle period, not at connect time.
    let keepalive = IntervalStream::new(tokio::time::interval_at(
        tokio::time::Instant::now() + state.keepalive,
        state.keepalive,
    ))
    .map(|_| Ok(Event::default().data(EMPTY_BATCH)));

    Ok(Sse::new(replay.chain(futures::stream::select(live, keepalive))))
}

/// Build the axum router over one simulated stream.
pub fn build_router(state: Arc<SimState>) -> Router {
    Router::new()
        .route("/v1/streams/{stream}/records/tail", get(handle_tail))
        .route("/v1/streams/{stream}/records", get(handle_records))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Producer
// ---------------------------------------------------------------------------

/// Publish synthetic frames at a fixed cadence until cancelled.
pub async fn run_producer(state: Arc<SimState>, interval: Duration, cancel: CancellationToken) {
    let mut scene = ThermalScene::new();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let grid = scene.step();
                let occupied = detect_occupancy(&grid);
                let body = json!({ "occupied": occupied, "grid": grid }).to_string();
                let position = state.append(body);
                debug!("published position {position}, occupied={occupied}");
            }
            _ = cancel.cancelled() => {
                info!("producer shutting down");
                return;
            }
        }
    }
}

/// Run the simulator: producer plus HTTP service. Blocks until the server
/// exits.
pub async fn run_sim(host: &str, port: u16, options: SimOptions) {
    let state = SimState::new(options.stream.clone(), options.token.clone(), options.keepalive);
    tokio::spawn(run_producer(
        Arc::clone(&state),
        options.interval,
        CancellationToken::new(),
    ));

    let app = build_router(state);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    info!("simulator serving stream '{}' on {addr}", options.stream);
    axum::serve(listener, app).await.unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> Arc<SimState> {
        SimState::new("amg8833", None, Duration::from_secs(10))
    }

    #[test]
    fn test_append_assigns_consecutive_positions() {
        let state = state();
        assert_eq!(state.tail(), 0);
        assert_eq!(state.append("a".into()), 0);
        assert_eq!(state.append("b".into()), 1);
        assert_eq!(state.tail(), 2);
    }

    #[test]
    fn test_open_read_replays_from_position() {
        let state = state();
        for body in ["a", "b", "c"] {
            state.append(body.into());
        }
        let (backlog, next_live, _rx) = state.open_read(1);
        assert_eq!(backlog, vec![(1, "b".into()), (2, "c".into())]);
        assert_eq!(next_live, 3);

        // A future start position yields no backlog and filters live.
        let (backlog, next_live, _rx) = state.open_read(10);
        assert!(backlog.is_empty());
        assert_eq!(next_live, 10);
    }

    #[tokio::test]
    async fn test_live_receiver_sees_appends() {
        let state = state();
        let (_, _, mut rx) = state.open_read(0);
        state.append("fresh".into());
        let (position, body) = rx.recv().await.unwrap();
        assert_eq!(position, 0);
        assert_eq!(body, "fresh");
    }

    #[test]
    fn test_batch_payload_shape() {
        let payload = batch_payload(&[(100, r#"{"occupied":true}"#.to_string())]);
        let value: Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value["records"][0]["seq_num"], 100);
        assert_eq!(value["records"][0]["body"], r#"{"occupied":true}"#);
        assert_eq!(batch_payload(&[]), EMPTY_BATCH);
    }

    #[test]
    fn test_authorize_matrix() {
        let open = state();
        let guarded = SimState::new("amg8833", Some("secret".into()), Duration::from_secs(10));

        let mut headers = HeaderMap::new();
        assert!(authorize(&open, &headers).is_ok());
        assert_eq!(
            authorize(&guarded, &headers),
            Err(StatusCode::UNAUTHORIZED)
        );

        headers.insert(header::AUTHORIZATION, "Bearer wrong".parse().unwrap());
        assert_eq!(
            authorize(&guarded, &headers),
            Err(StatusCode::UNAUTHORIZED)
        );

        headers.insert(header::AUTHORIZATION, "Bearer secret".parse().unwrap());
        assert!(authorize(&guarded, &headers).is_ok());
        // Extra token on an open stream is simply ignored.
        assert!(authorize(&open, &headers).is_ok());
    }

    #[test]
    fn test_producer_body_decodes_downstream() {
        use openthermal_core::decode_frame;
        let mut scene = ThermalScene::new();
        let grid = scene.step();
        let occupied = detect_occupancy(&grid);
        let body = json!({ "occupied": occupied, "grid": grid }).to_string();
        let frame = decode_frame(&body).unwrap();
        assert_eq!(frame.occupied, occupied);
        assert_eq!(frame.rows(), GRID_ROWS);
        assert_eq!(frame.cols(), GRID_COLS);
    }
}
