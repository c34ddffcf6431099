//! Heat map painting onto an abstract drawing surface.
//!
//! The renderer owns no pixels. Hosts hand it a [`Surface`] (a terminal
//! cell buffer, an image canvas, a test recorder) and it fills one rectangle
//! per grid cell. Every paint is a full repaint: cell geometry is recomputed
//! from the grid dimensions each call and every cell is overdrawn, so there
//! is no differential-redraw state to get out of sync.

use crate::color::{Rgb, color_for};
use crate::frame::SensorFrame;

/// A fixed-size 2D drawing surface accepting filled rectangles.
///
/// Geometry is in abstract surface units, `f64` so that cell edges land
/// exactly and the painted cells tile the surface with no gaps.
pub trait Surface {
    /// Surface width in surface units.
    fn width(&self) -> f64;

    /// Surface height in surface units.
    fn height(&self) -> f64;

    /// Fill the axis-aligned rectangle at (`x`, `y`) with size `w` by `h`.
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgb);
}

/// Paint a frame's grid onto the surface.
///
/// For an R-row by C-column grid each cell is `width/C` by `height/R`
/// units, iterated rows top-to-bottom and columns left-to-right. No-op when
/// the grid has zero rows or zero columns, which also guards the divisions.
pub fn paint(frame: &SensorFrame, surface: &mut dyn Surface) {
    if frame.is_empty() {
        return;
    }
    let cell_w = surface.width() / frame.cols() as f64;
    let cell_h = surface.height() / frame.rows() as f64;
    for (row, cells) in frame.grid.iter().enumerate() {
        for (col, &temp) in cells.iter().enumerate() {
            surface.fill_rect(
                col as f64 * cell_w,
                row as f64 * cell_h,
                cell_w,
                cell_h,
                color_for(temp),
            );
        }
    }
}
