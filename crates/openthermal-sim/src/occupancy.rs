//! Occupancy detection over a temperature grid.
//!
//! Same rule the hardware producer applies before publishing: threshold the
//! grid at 28 °C, label 8-connected components of hot cells, and call the
//! view occupied when any component covers more than 4 cells. Single hot
//! pixels and small reflections stay below the cluster floor; a torso at
//! room distance does not.

/// Cells strictly above this temperature count as hot.
pub const HOT_THRESHOLD: f64 = 28.0;

/// A component must exceed this many cells to count as a body.
pub const MIN_CLUSTER: usize = 4;

/// True when any 8-connected cluster of hot cells has more than
/// [`MIN_CLUSTER`] members.
pub fn detect_occupancy(grid: &[Vec<f64>]) -> bool {
    let rows = grid.len();
    if rows == 0 {
        return false;
    }
    let cols = grid[0].len();
    if cols == 0 {
        return false;
    }

    let mut visited = vec![vec![false; cols]; rows];
    for r in 0..rows {
        for c in 0..cols {
            if visited[r][c] || grid[r][c] <= HOT_THRESHOLD {
                continue;
            }
            if cluster_size(grid, &mut visited, r, c) > MIN_CLUSTER {
                return true;
            }
        }
    }
    false
}

/// Flood-fill one component, marking it visited; returns its cell count.
fn cluster_size(grid: &[Vec<f64>], visited: &mut [Vec<bool>], row: usize, col: usize) -> usize {
    let rows = grid.len();
    let cols = grid[0].len();
    let mut stack = vec![(row, col)];
    visited[row][col] = true;
    let mut size = 0;
    while let Some((r, c)) = stack.pop() {
        size += 1;
        for dr in -1isize..=1 {
            for dc in -1isize..=1 {
                if dr == 0 && dc == 0 {
                    continue;
                }
                let (nr, nc) = (r as isize + dr, c as isize + dc);
                if nr < 0 || nc < 0 || nr as usize >= rows || nc as usize >= cols {
                    continue;
                }
                let (nr, nc) = (nr as usize, nc as usize);
                if !visited[nr][nc] && grid[nr][nc] > HOT_THRESHOLD {
                    visited[nr][nc] = true;
                    stack.push((nr, nc));
                }
            }
        }
    }
    size
}
