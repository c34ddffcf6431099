//! # openthermal-core
//!
//! **Tail a thermal sensor stream, paint the heat.**
//!
//! `openthermal-core` is the streaming pipeline behind the openthermal
//! viewer: it resolves the current tail of an append-only sensor stream,
//! holds a live subscription from that position, decodes record bodies into
//! typed frames, and keeps a single "latest known state" that renderers
//! snapshot and paint.
//!
//! ## Quick Start
//!
//! ```
//! use openthermal_core::{PresentationStore, decode_frame, paint};
//!
//! let store = PresentationStore::new();
//! store.on_change(|state| {
//!     // Called synchronously, exactly once per applied frame.
//!     println!("repaint: occupied={}", state.frame.occupied);
//! });
//!
//! let frame = decode_frame(r#"{"occupied":true,"grid":[[25.0,30.0]]}"#).unwrap();
//! store.apply(frame);
//! assert!(store.current().frame.occupied);
//! ```
//!
//! ## Architecture
//!
//! Tail resolution → Subscription → Decode → Apply → Notify → Paint
//!
//! The pipeline ([`run_watch`]) is one cooperative task. Awaiting the next
//! record batch is its only suspension point; decoding, state application,
//! and the synchronous observer callbacks all run to completion for each
//! delivered event. Transports live behind the [`StreamStore`] trait and
//! are provided by `openthermal-client` (HTTP + SSE) and `openthermal-sim`
//! (in-process simulator).
//!
//! Failure stance: a malformed record body is skipped and logged, nothing
//! else is retried. Gap in sequence positions, transport failure, missing
//! stream — each ends the pipeline with a typed [`StreamError`], and the
//! last applied frame stays in the store, stale but valid.

pub mod color;
pub mod config;
pub mod error;
pub mod frame;
pub mod pipeline;
pub mod render;
pub mod store;
pub mod stream;

pub use color::{
    CLEAR_COLOR, MAX_TEMP, MIN_TEMP, OCCUPIED_COLOR, Rgb, color_for, hsl_to_rgb, hue_for,
    occupancy_color,
};
pub use config::{DEFAULT_ENDPOINT, DEFAULT_STREAM, StreamConfig};
pub use error::{FrameError, StreamError};
pub use frame::{SensorFrame, decode_frame};
pub use pipeline::{WatchSnapshot, WatchStats, run_watch};
pub use render::{Surface, paint};
pub use store::{PresentationState, PresentationStore};
pub use stream::{RawRecord, RecordBatch, StreamCursor, StreamStore, Subscription};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
