//! # openthermal-client
//!
//! HTTP + server-sent-events transport for the openthermal pipeline.
//!
//! [`HttpStreamStore`] implements `openthermal_core::StreamStore` against a
//! stream-storage service with an S2-style REST surface:
//!
//! - `GET /v1/streams/{stream}/records/tail` → `{"next_seq_num": N}`
//! - `GET /v1/streams/{stream}/records?start_seq_num=N` with
//!   `Accept: text/event-stream` → SSE, one JSON record batch per event
//!
//! Both requests carry `Authorization: Bearer <token>`. A store built
//! without a token fails with a connectivity error on first use rather
//! than at construction, so hosts can build their wiring before deciding
//! whether credentials are actually needed.

pub mod sse;

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use log::{debug, info};
use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use serde::Deserialize;

use openthermal_core::{
    RawRecord, RecordBatch, StreamConfig, StreamCursor, StreamError, StreamStore, Subscription,
};
use sse::SseParser;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TailResponse {
    next_seq_num: u64,
}

#[derive(Debug, Deserialize)]
struct ReadBatch {
    records: Vec<ReadRecord>,
}

#[derive(Debug, Deserialize)]
struct ReadRecord {
    seq_num: u64,
    body: String,
}

impl From<ReadBatch> for RecordBatch {
    fn from(batch: ReadBatch) -> Self {
        RecordBatch {
            records: batch
                .records
                .into_iter()
                .map(|r| RawRecord {
                    position: r.seq_num,
                    body: r.body,
                })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Stream store backed by a remote HTTP service.
pub struct HttpStreamStore {
    http: reqwest::Client,
    config: StreamConfig,
}

impl HttpStreamStore {
    /// Build a store for the given connection settings.
    ///
    /// No connection timeout applies to the subscription body itself: SSE
    /// reads are long-lived by design, only the connect phase is bounded.
    pub fn new(config: StreamConfig) -> Result<Self, StreamError> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| StreamError::connectivity(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    /// The settings this store was built with.
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    fn token(&self) -> Result<&str, StreamError> {
        self.config
            .token
            .as_deref()
            .ok_or_else(|| StreamError::connectivity("no bearer credential configured"))
    }

    fn check_status(status: StatusCode, stream: &str, what: &str) -> Result<(), StreamError> {
        if status == StatusCode::NOT_FOUND {
            return Err(StreamError::NotFound(stream.to_string()));
        }
        if !status.is_success() {
            return Err(StreamError::connectivity(format!(
                "{what} request returned {status}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl StreamStore for HttpStreamStore {
    async fn check_tail(&self, stream: &str) -> Result<StreamCursor, StreamError> {
        let token = self.token()?;
        let url = format!("{}/v1/streams/{stream}/records/tail", self.config.endpoint);
        debug!("GET {url}");
        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| StreamError::connectivity(format!("tail request failed: {e}")))?;
        Self::check_status(response.status(), stream, "tail")?;
        let tail: TailResponse = response
            .json()
            .await
            .map_err(|e| StreamError::connectivity(format!("unparseable tail response: {e}")))?;
        Ok(StreamCursor(tail.next_seq_num))
    }

    async fn subscribe(
        &self,
        stream: &str,
        cursor: StreamCursor,
    ) -> Result<Subscription, StreamError> {
        let token = self.token()?;
        let url = format!(
            "{}/v1/streams/{stream}/records?start_seq_num={cursor}",
            self.config.endpoint
        );
        debug!("GET {url} (event stream)");
        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| StreamError::connectivity(format!("subscribe request failed: {e}")))?;
        Self::check_status(response.status(), stream, "subscribe")?;
        info!("subscribed to {stream} from position {cursor}");

        // Each transport chunk may complete any number of SSE events; each
        // event is one JSON batch. After the first transport error the
        // stream is fused shut.
        let batches = response
            .bytes_stream()
            .scan(
                (SseParser::new(), false),
                |(parser, failed), chunk| {
                    if *failed {
                        return futures::future::ready(None);
                    }
                    let out: Vec<Result<RecordBatch, StreamError>> = match chunk {
                        Ok(bytes) => parser.push(&bytes).into_iter().map(decode_batch).collect(),
                        Err(e) => {
                            *failed = true;
                            vec![Err(StreamError::connectivity(format!(
                                "event stream failed: {e}"
                            )))]
                        }
                    };
                    futures::future::ready(Some(out))
                },
            )
            .flat_map(futures::stream::iter);
        Ok(batches.boxed())
    }
}

/// Parse one SSE data payload into a record batch.
///
/// A payload that is not a valid batch is a transport-level decode failure:
/// it terminates the subscription rather than being skipped (only record
/// bodies get per-record tolerance, and those are decoded downstream).
fn decode_batch(payload: String) -> Result<RecordBatch, StreamError> {
    serde_json::from_str::<ReadBatch>(&payload)
        .map(RecordBatch::from)
        .map_err(|e| StreamError::connectivity(format!("unparseable event payload: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(token: Option<&str>) -> StreamConfig {
        StreamConfig {
            endpoint: "http://127.0.0.1:1".to_string(),
            stream: "amg8833".to_string(),
            token: token.map(String::from),
        }
    }

    #[test]
    fn test_wire_batch_maps_seq_num_to_position() {
        let payload = r#"{"records":[{"seq_num":100,"body":"{}"},{"seq_num":101,"body":"x"}]}"#;
        let batch = decode_batch(payload.to_string()).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.records[0].position, 100);
        assert_eq!(batch.records[1].body, "x");
    }

    #[test]
    fn test_empty_wire_batch_is_a_tick() {
        let batch = decode_batch(r#"{"records":[]}"#.to_string()).unwrap();
        assert!(batch.is_empty());
    }

    #[test]
    fn test_unparseable_payload_is_connectivity() {
        let err = decode_batch("not json".to_string()).unwrap_err();
        assert!(matches!(err, StreamError::Connectivity(_)));
        assert!(!err.is_record_local());
    }

    #[tokio::test]
    async fn test_missing_credential_fails_on_first_use() {
        let store = HttpStreamStore::new(config(None)).unwrap();
        // Fails before any network activity.
        let err = store.check_tail("amg8833").await.unwrap_err();
        assert!(matches!(err, StreamError::Connectivity(_)));
        assert!(err.to_string().contains("credential"));

        let err = store.subscribe("amg8833", StreamCursor(0)).await.err().unwrap();
        assert!(matches!(err, StreamError::Connectivity(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_connectivity() {
        // Port 1 refuses connections on any sane host.
        let store = HttpStreamStore::new(config(Some("token"))).unwrap();
        let err = store.check_tail("amg8833").await.unwrap_err();
        assert!(matches!(err, StreamError::Connectivity(_)));
    }
}
