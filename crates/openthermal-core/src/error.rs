//! Error taxonomy for the streaming pipeline.
//!
//! Two layers: [`FrameError`] covers a single record body that cannot be
//! decoded, [`StreamError`] covers everything the pipeline can report to its
//! host. Only `MalformedFrame` is record-local; every other variant ends the
//! subscription.

use thiserror::Error;

/// A record body that could not be decoded into a sensor frame.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Body is not valid JSON, or is missing/mistyping a required field.
    #[error("invalid frame body: {0}")]
    Json(#[from] serde_json::Error),

    /// Grid rows have unequal lengths. The grid must be rectangular.
    #[error("ragged grid: row {row} has {got} columns, expected {expected}")]
    RaggedGrid {
        row: usize,
        expected: usize,
        got: usize,
    },
}

/// Pipeline-level errors surfaced to the host.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The stream service could not be reached, the transport failed
    /// mid-subscription, or a request was attempted without a credential.
    #[error("stream service unreachable: {0}")]
    Connectivity(String),

    /// The named stream does not exist on the service.
    #[error("stream not found: {0}")]
    NotFound(String),

    /// Sequence positions arrived non-contiguously. The service guarantees
    /// gapless delivery, so a gap means corruption somewhere upstream.
    #[error("sequence gap: expected position {expected}, got {got}")]
    Protocol { expected: u64, got: u64 },

    /// A record body failed to decode. Record-local: the pipeline logs it,
    /// skips the record, and keeps going.
    #[error("malformed frame at position {position}: {source}")]
    MalformedFrame {
        position: u64,
        #[source]
        source: FrameError,
    },
}

impl StreamError {
    /// Shorthand for wrapping a transport failure message.
    pub fn connectivity(msg: impl Into<String>) -> Self {
        Self::Connectivity(msg.into())
    }

    /// Whether the pipeline may continue past this error.
    ///
    /// True only for `MalformedFrame`; all other variants terminate the
    /// subscription.
    pub fn is_record_local(&self) -> bool {
        matches!(self, Self::MalformedFrame { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_malformed_frame_is_record_local() {
        let bad_json = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let malformed = StreamError::MalformedFrame {
            position: 7,
            source: FrameError::Json(bad_json),
        };
        assert!(malformed.is_record_local());

        assert!(!StreamError::connectivity("refused").is_record_local());
        assert!(!StreamError::NotFound("amg8833".into()).is_record_local());
        assert!(
            !StreamError::Protocol {
                expected: 5,
                got: 9
            }
            .is_record_local()
        );
    }

    #[test]
    fn test_display_messages_name_the_positions() {
        let err = StreamError::Protocol {
            expected: 100,
            got: 102,
        };
        let msg = err.to_string();
        assert!(msg.contains("100"));
        assert!(msg.contains("102"));
    }
}
