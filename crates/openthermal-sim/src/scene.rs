//! Synthetic 8×8 thermal scene.
//!
//! Mimics what an AMG8833 pointed at a doorway reports: an ambient floor
//! with sensor noise, and occasionally a warm blob (someone in view) that
//! wanders around and leaves again. Temperatures are quantized to the
//! sensor's 0.25 °C register resolution.

use rand::Rng;

pub const GRID_ROWS: usize = 8;
pub const GRID_COLS: usize = 8;

const AMBIENT: f64 = 21.0;
const BLOB_PEAK: f64 = 33.0;
const BLOB_SIGMA: f64 = 1.8;
const NOISE: f64 = 0.3;

/// Wandering-blob scene state.
///
/// Presence alternates in dwell phases of 40 to 120 steps, so a watcher
/// sees both occupancy states within a couple of minutes at sensor rate.
pub struct ThermalScene {
    present: bool,
    dwell: u32,
    row: f64,
    col: f64,
    v_row: f64,
    v_col: f64,
}

impl ThermalScene {
    pub fn new() -> Self {
        Self {
            present: false,
            dwell: 12,
            row: 3.5,
            col: 3.5,
            v_row: 0.0,
            v_col: 0.0,
        }
    }

    /// Whether a blob is currently in view.
    pub fn is_present(&self) -> bool {
        self.present
    }

    /// Advance one sample using the thread-local generator.
    pub fn step(&mut self) -> Vec<Vec<f64>> {
        self.step_with(&mut rand::rng())
    }

    /// Advance one sample and render the grid.
    pub fn step_with(&mut self, rng: &mut impl Rng) -> Vec<Vec<f64>> {
        if self.dwell == 0 {
            self.present = !self.present;
            self.dwell = rng.random_range(40..120);
            if self.present {
                self.row = rng.random_range(1.0..6.0);
                self.col = rng.random_range(1.0..6.0);
                self.v_row = rng.random_range(-0.15..0.15);
                self.v_col = rng.random_range(-0.15..0.15);
            }
        }
        self.dwell -= 1;

        if self.present {
            self.row += self.v_row + rng.random_range(-0.05..0.05);
            self.col += self.v_col + rng.random_range(-0.05..0.05);
            if self.row < 1.0 || self.row > 6.0 {
                self.v_row = -self.v_row;
                self.row = self.row.clamp(1.0, 6.0);
            }
            if self.col < 1.0 || self.col > 6.0 {
                self.v_col = -self.v_col;
                self.col = self.col.clamp(1.0, 6.0);
            }
        }

        let mut grid = vec![vec![0.0; GRID_COLS]; GRID_ROWS];
        for (r, cells) in grid.iter_mut().enumerate() {
            for (c, cell) in cells.iter_mut().enumerate() {
                let mut temp = AMBIENT + rng.random_range(-NOISE..NOISE);
                if self.present {
                    let d2 = (r as f64 - self.row).powi(2) + (c as f64 - self.col).powi(2);
                    temp += (BLOB_PEAK - AMBIENT) * (-d2 / (2.0 * BLOB_SIGMA * BLOB_SIGMA)).exp();
                }
                *cell = quantize(temp);
            }
        }
        grid
    }
}

impl Default for ThermalScene {
    fn default() -> Self {
        Self::new()
    }
}

/// Snap to the sensor's 0.25 °C register steps.
fn quantize(temp: f64) -> f64 {
    (temp * 4.0).round() / 4.0
}
