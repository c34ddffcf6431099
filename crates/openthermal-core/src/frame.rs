//! Sensor frame type and strict record-body decoding.
//!
//! A frame is exactly what the producer publishes per sample: an occupancy
//! verdict plus a rectangular grid of temperature readings in degrees
//! Celsius. Decoding performs no normalization and no clamping; out-of-range
//! temperatures are handled at paint time.

use serde::{Deserialize, Serialize};

use crate::error::FrameError;

/// One decoded sensor reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorFrame {
    /// Producer-side occupancy verdict for this sample.
    pub occupied: bool,
    /// Rectangular temperature matrix, row-major. May be empty.
    pub grid: Vec<Vec<f64>>,
}

impl SensorFrame {
    /// The pre-first-frame placeholder: unoccupied, no grid.
    pub fn empty() -> Self {
        Self {
            occupied: false,
            grid: Vec::new(),
        }
    }

    /// Number of grid rows.
    pub fn rows(&self) -> usize {
        self.grid.len()
    }

    /// Number of grid columns (0 when there are no rows).
    pub fn cols(&self) -> usize {
        self.grid.first().map_or(0, Vec::len)
    }

    /// True when the grid has no paintable cells.
    pub fn is_empty(&self) -> bool {
        self.rows() == 0 || self.cols() == 0
    }

    /// Hottest cell in the grid, or `None` when there are no cells.
    pub fn peak(&self) -> Option<f64> {
        self.grid.iter().flatten().copied().reduce(f64::max)
    }
}

impl Default for SensorFrame {
    fn default() -> Self {
        Self::empty()
    }
}

/// Decode one raw record body into a [`SensorFrame`].
///
/// The body must be a JSON object with an `occupied` boolean and a `grid`
/// array of equal-length number arrays. Unknown fields are ignored. Ragged
/// rows are rejected: every consumer downstream assumes a rectangular
/// matrix.
pub fn decode_frame(body: &str) -> Result<SensorFrame, FrameError> {
    let frame: SensorFrame = serde_json::from_str(body)?;
    if let Some(first) = frame.grid.first() {
        let expected = first.len();
        for (row, cells) in frame.grid.iter().enumerate().skip(1) {
            if cells.len() != expected {
                return Err(FrameError::RaggedGrid {
                    row,
                    expected,
                    got: cells.len(),
                });
            }
        }
    }
    Ok(frame)
}
