//! The watch pipeline: resolve the tail, subscribe, drain batches.
//!
//! One cooperatively-scheduled task per watched stream:
//! 1. Resolve the stream's current tail position
//! 2. Open a live subscription from that position
//! 3. Await the next batch (the only suspension point)
//! 4. Drain it record-by-record: verify contiguity, decode, apply
//! 5. Suspend again, or stop on cancellation / transport failure
//!
//! Malformed record bodies are logged and skipped; everything else ends the
//! pipeline. There is no reconnect layer: a caller that wants resilience
//! runs the pipeline again.

use std::sync::atomic::{AtomicU64, Ordering};

use futures::StreamExt;
use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use crate::error::StreamError;
use crate::frame::decode_frame;
use crate::store::PresentationStore;
use crate::stream::{RecordBatch, StreamStore};

const NO_POSITION: u64 = u64::MAX;

/// Shared counters updated by the pipeline and read by status displays.
#[derive(Debug)]
pub struct WatchStats {
    frames: AtomicU64,
    decode_errors: AtomicU64,
    empty_batches: AtomicU64,
    last_position: AtomicU64,
}

/// Point-in-time copy of [`WatchStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchSnapshot {
    /// Frames decoded and applied.
    pub frames: u64,
    /// Records skipped because their body failed to decode.
    pub decode_errors: u64,
    /// Keepalive ticks that carried no records.
    pub empty_batches: u64,
    /// Position of the last record processed, decoded or not.
    pub last_position: Option<u64>,
}

impl WatchStats {
    pub fn new() -> Self {
        Self {
            frames: AtomicU64::new(0),
            decode_errors: AtomicU64::new(0),
            empty_batches: AtomicU64::new(0),
            last_position: AtomicU64::new(NO_POSITION),
        }
    }

    fn record_frame(&self, position: u64) {
        self.frames.fetch_add(1, Ordering::Relaxed);
        self.last_position.store(position, Ordering::Relaxed);
    }

    fn record_decode_error(&self, position: u64) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
        self.last_position.store(position, Ordering::Relaxed);
    }

    fn record_empty_batch(&self) {
        self.empty_batches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> WatchSnapshot {
        let last = self.last_position.load(Ordering::Relaxed);
        WatchSnapshot {
            frames: self.frames.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            empty_batches: self.empty_batches.load(Ordering::Relaxed),
            last_position: (last != NO_POSITION).then_some(last),
        }
    }
}

impl Default for WatchStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the pipeline until cancellation, stream end, or a terminal error.
///
/// Cancellation is observed between stream events; a batch that has already
/// arrived is drained to completion first. Returning drops the subscription
/// and with it the underlying connection. On any return, the last applied
/// frame stays in `state` untouched.
pub async fn run_watch(
    store: &dyn StreamStore,
    stream: &str,
    state: &PresentationStore,
    stats: &WatchStats,
    cancel: CancellationToken,
) -> Result<(), StreamError> {
    let cursor = store.check_tail(stream).await?;
    info!("stream {stream}: tail at position {cursor}, subscribing");
    let mut subscription = store.subscribe(stream, cursor).await?;

    let mut expected = cursor.0;
    loop {
        let event = tokio::select! {
            event = subscription.next() => event,
            _ = cancel.cancelled() => {
                info!("stream {stream}: cancelled at position {expected}");
                return Ok(());
            }
        };
        match event {
            Some(Ok(batch)) => {
                expected = drain_batch(&batch, expected, state, stats)?;
            }
            Some(Err(err)) => return Err(err),
            None => {
                info!("stream {stream}: subscription ended at position {expected}");
                return Ok(());
            }
        }
    }
}

/// Process one delivered batch; returns the next expected position.
///
/// Contiguity is checked before decoding, so a malformed body still
/// consumes its sequence slot and never masquerades as a gap.
fn drain_batch(
    batch: &RecordBatch,
    mut expected: u64,
    state: &PresentationStore,
    stats: &WatchStats,
) -> Result<u64, StreamError> {
    if batch.is_empty() {
        stats.record_empty_batch();
        debug!("keepalive tick, next position still {expected}");
        return Ok(expected);
    }
    for record in &batch.records {
        if record.position != expected {
            return Err(StreamError::Protocol {
                expected,
                got: record.position,
            });
        }
        expected += 1;
        match decode_frame(&record.body) {
            Ok(frame) => {
                debug!(
                    "position {}: {}x{} grid, occupied={}",
                    record.position,
                    frame.rows(),
                    frame.cols(),
                    frame.occupied
                );
                // Stats first: change observers may read the snapshot and
                // expect it to cover the frame they are being notified about.
                stats.record_frame(record.position);
                state.apply(frame);
            }
            Err(source) => {
                stats.record_decode_error(record.position);
                warn!(
                    "{}",
                    StreamError::MalformedFrame {
                        position: record.position,
                        source,
                    }
                );
            }
        }
    }
    Ok(expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{RawRecord, StreamCursor, Subscription};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Plays back a scripted sequence of subscription items.
    struct ScriptedStore {
        tail: u64,
        items: Mutex<Option<Vec<Result<RecordBatch, StreamError>>>>,
    }

    impl ScriptedStore {
        fn new(tail: u64, items: Vec<Result<RecordBatch, StreamError>>) -> Self {
            Self {
                tail,
                items: Mutex::new(Some(items)),
            }
        }
    }

    #[async_trait]
    impl StreamStore for ScriptedStore {
        async fn check_tail(&self, _stream: &str) -> Result<StreamCursor, StreamError> {
            Ok(StreamCursor(self.tail))
        }

        async fn subscribe(
            &self,
            _stream: &str,
            _cursor: StreamCursor,
        ) -> Result<Subscription, StreamError> {
            let items = self.items.lock().unwrap().take().unwrap();
            Ok(futures::stream::iter(items).boxed())
        }
    }

    fn record(position: u64, body: &str) -> RawRecord {
        RawRecord {
            position,
            body: body.to_string(),
        }
    }

    fn batch(records: Vec<RawRecord>) -> Result<RecordBatch, StreamError> {
        Ok(RecordBatch { records })
    }

    #[tokio::test]
    async fn test_frames_flow_into_the_store() {
        let store = ScriptedStore::new(
            5,
            vec![
                batch(vec![record(5, r#"{"occupied":true,"grid":[[25.0]]}"#)]),
                batch(vec![record(6, r#"{"occupied":false,"grid":[[20.0]]}"#)]),
            ],
        );
        let state = PresentationStore::new();
        let stats = WatchStats::new();

        run_watch(&store, "amg8833", &state, &stats, CancellationToken::new())
            .await
            .unwrap();

        let current = state.current();
        assert!(!current.frame.occupied);
        assert_eq!(current.frame.grid, vec![vec![20.0]]);
        let snap = stats.snapshot();
        assert_eq!(snap.frames, 2);
        assert_eq!(snap.last_position, Some(6));
    }

    #[tokio::test]
    async fn test_gap_halts_with_protocol_error() {
        let store = ScriptedStore::new(
            10,
            vec![
                batch(vec![record(10, r#"{"occupied":true,"grid":[[25.0]]}"#)]),
                batch(vec![record(12, r#"{"occupied":true,"grid":[[25.0]]}"#)]),
            ],
        );
        let state = PresentationStore::new();
        let stats = WatchStats::new();

        let err = run_watch(&store, "amg8833", &state, &stats, CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            StreamError::Protocol { expected, got } => {
                assert_eq!(expected, 11);
                assert_eq!(got, 12);
            }
            other => panic!("expected Protocol, got {other}"),
        }
        // The frame before the gap was still applied.
        assert!(state.current().frame.occupied);
        assert_eq!(stats.snapshot().frames, 1);
    }

    #[tokio::test]
    async fn test_malformed_record_is_skipped_not_fatal() {
        let store = ScriptedStore::new(
            0,
            vec![batch(vec![
                record(0, r#"{"occupied":true,"grid":[[30.0]]}"#),
                record(1, "garbage"),
                record(2, r#"{"occupied":false,"grid":[[19.0]]}"#),
            ])],
        );
        let state = PresentationStore::new();
        let stats = WatchStats::new();

        run_watch(&store, "amg8833", &state, &stats, CancellationToken::new())
            .await
            .unwrap();

        let current = state.current();
        assert_eq!(current.frame.grid, vec![vec![19.0]]);
        let snap = stats.snapshot();
        assert_eq!(snap.frames, 2);
        assert_eq!(snap.decode_errors, 1);
        assert_eq!(snap.last_position, Some(2));
    }

    #[tokio::test]
    async fn test_malformed_record_leaves_committed_state_alone() {
        let store = ScriptedStore::new(
            0,
            vec![
                batch(vec![record(0, r#"{"occupied":true,"grid":[[28.5]]}"#)]),
                batch(vec![record(1, r#"{"grid":"nope"}"#)]),
            ],
        );
        let state = PresentationStore::new();
        let stats = WatchStats::new();

        run_watch(&store, "amg8833", &state, &stats, CancellationToken::new())
            .await
            .unwrap();

        let current = state.current();
        assert!(current.frame.occupied);
        assert_eq!(current.frame.grid, vec![vec![28.5]]);
    }

    #[tokio::test]
    async fn test_empty_batches_are_counted_noops() {
        let store = ScriptedStore::new(3, vec![batch(vec![]), batch(vec![])]);
        let state = PresentationStore::new();
        let stats = WatchStats::new();

        run_watch(&store, "amg8833", &state, &stats, CancellationToken::new())
            .await
            .unwrap();

        assert!(!state.current().has_data);
        let snap = stats.snapshot();
        assert_eq!(snap.empty_batches, 2);
        assert_eq!(snap.frames, 0);
        assert_eq!(snap.last_position, None);
    }

    #[tokio::test]
    async fn test_transport_error_terminates() {
        let store = ScriptedStore::new(
            0,
            vec![
                batch(vec![record(0, r#"{"occupied":false,"grid":[[21.0]]}"#)]),
                Err(StreamError::connectivity("connection reset")),
            ],
        );
        let state = PresentationStore::new();
        let stats = WatchStats::new();

        let err = run_watch(&store, "amg8833", &state, &stats, CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StreamError::Connectivity(_)));
        // Last good frame survives the failure.
        assert!(state.current().has_data);
    }

    #[tokio::test]
    async fn test_cancellation_stops_a_pending_subscription() {
        struct PendingStore;

        #[async_trait]
        impl StreamStore for PendingStore {
            async fn check_tail(&self, _stream: &str) -> Result<StreamCursor, StreamError> {
                Ok(StreamCursor(0))
            }

            async fn subscribe(
                &self,
                _stream: &str,
                _cursor: StreamCursor,
            ) -> Result<Subscription, StreamError> {
                Ok(futures::stream::pending().boxed())
            }
        }

        let state = PresentationStore::new();
        let stats = WatchStats::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        run_watch(&PendingStore, "amg8833", &state, &stats, cancel)
            .await
            .unwrap();
        assert!(!state.current().has_data);
    }

    #[tokio::test]
    async fn test_missing_stream_propagates_not_found() {
        struct MissingStore;

        #[async_trait]
        impl StreamStore for MissingStore {
            async fn check_tail(&self, stream: &str) -> Result<StreamCursor, StreamError> {
                Err(StreamError::NotFound(stream.to_string()))
            }

            async fn subscribe(
                &self,
                _stream: &str,
                _cursor: StreamCursor,
            ) -> Result<Subscription, StreamError> {
                unreachable!("subscribe must not be called when tail resolution fails")
            }
        }

        let state = PresentationStore::new();
        let stats = WatchStats::new();
        let err = run_watch(
            &MissingStore,
            "missing",
            &state,
            &stats,
            CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StreamError::NotFound(name) if name == "missing"));
    }
}
