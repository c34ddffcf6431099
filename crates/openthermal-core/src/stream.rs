//! Stream service boundary.
//!
//! The pipeline talks to the remote stream-storage service through the
//! [`StreamStore`] trait: resolve the current tail once, then hold one
//! long-lived subscription from that point. Transports (HTTP + SSE in
//! `openthermal-client`, the in-process simulator in `openthermal-sim`)
//! implement this trait; the core never sees wire framing, only ordered
//! batches of raw records.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::StreamError;

/// A sequence position within a stream.
///
/// Resolved once at startup as the stream's current tail (the next position
/// the service will assign) and used as the subscription start point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamCursor(pub u64);

impl std::fmt::Display for StreamCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One record as delivered by the service: an opaque body plus its
/// sequence position. Consumed exactly once by the frame decoder.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub position: u64,
    pub body: String,
}

/// Zero or more records delivered as one stream event.
///
/// An empty batch is a valid keepalive tick and must not perturb any
/// downstream state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordBatch {
    pub records: Vec<RawRecord>,
}

impl RecordBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A live, unbounded, non-restartable sequence of record batches.
///
/// The stream ends only on transport failure (an `Err` item, after which no
/// further items are delivered) or when the subscriber drops it. Dropping
/// the stream releases the underlying connection.
pub type Subscription = BoxStream<'static, Result<RecordBatch, StreamError>>;

/// The stream-storage service as seen by this pipeline.
#[async_trait]
pub trait StreamStore: Send + Sync {
    /// Next unassigned sequence position of the named stream.
    ///
    /// Errors: [`StreamError::Connectivity`] if the service is unreachable,
    /// [`StreamError::NotFound`] if the stream does not exist.
    async fn check_tail(&self, stream: &str) -> Result<StreamCursor, StreamError>;

    /// Open a push-style read beginning at `cursor`.
    ///
    /// Records arrive in strictly increasing position order with no gaps;
    /// the pipeline verifies this and treats a violation as
    /// [`StreamError::Protocol`].
    async fn subscribe(
        &self,
        stream: &str,
        cursor: StreamCursor,
    ) -> Result<Subscription, StreamError>;
}
