//! Elastic distance metrics between normalized sequences.
//!
//! Two strategies behind one [`DistanceMetric`] contract:
//!
//! - [`ExactDtw`] - classical O(n*m) dynamic-programming DTW. Reference
//!   semantics: minimum over all monotonic, boundary-anchored alignments of
//!   the sum of pointwise `|a[i] - b[j]|` costs.
//! - [`FastDtw`] - coarsen/project/refine approximation (Salvador & Chan's
//!   FastDTW): recursively halve resolution, find the coarse warp path,
//!   expand it by `radius` and run a banded DTW inside that window.
//!   Near-linear time, may exceed the exact cost on long inputs.
//!
//! Both are pure computation: no I/O, no shared state, safe to call from
//! concurrent workers.

/// Distance between two numeric sequences. Implementations must be pure and
/// return a non-negative value, `0` for identical inputs.
pub trait DistanceMetric: Send + Sync {
    fn distance(&self, a: &[f64], b: &[f64]) -> f64;
}

// ============================================================
// EXACT DTW
// ============================================================

/// Exact dynamic-time-warping distance. The reference metric.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactDtw;

impl DistanceMetric for ExactDtw {
    fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        dtw_cost(a, b)
    }
}

/// Full DP over rolling rows; O(n*m) time, O(m) space.
fn dtw_cost(a: &[f64], b: &[f64]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return if a.len() == b.len() { 0.0 } else { f64::INFINITY };
    }

    let m = b.len();
    let mut prev = vec![f64::INFINITY; m + 1];
    let mut curr = vec![f64::INFINITY; m + 1];
    prev[0] = 0.0;

    for &av in a {
        curr[0] = f64::INFINITY;
        for (j, &bv) in b.iter().enumerate() {
            let best = prev[j].min(prev[j + 1]).min(curr[j]);
            curr[j + 1] = (av - bv).abs() + best;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[m]
}

// ============================================================
// FAST DTW (coarsen / project / refine)
// ============================================================

/// Approximate DTW with a bounded refinement radius.
///
/// `radius = 1` matches the common default and is accurate enough for the
/// short normalized windows this crate compares; larger radii trade speed
/// for tightness against [`ExactDtw`].
#[derive(Debug, Clone, Copy)]
pub struct FastDtw {
    radius: usize,
}

impl FastDtw {
    pub fn new(radius: usize) -> Self {
        Self { radius }
    }

    pub fn radius(&self) -> usize {
        self.radius
    }
}

impl Default for FastDtw {
    fn default() -> Self {
        Self { radius: 1 }
    }
}

impl DistanceMetric for FastDtw {
    fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        fast_dtw(a, b, self.radius).0
    }
}

type WarpPath = Vec<(usize, usize)>;

fn fast_dtw(a: &[f64], b: &[f64], radius: usize) -> (f64, WarpPath) {
    let min_size = radius + 2;
    if a.len() <= min_size || b.len() <= min_size {
        return dtw_with_path(a, b, None);
    }

    let coarse_a = coarsen(a);
    let coarse_b = coarsen(b);
    let (_, coarse_path) = fast_dtw(&coarse_a, &coarse_b, radius);
    let window = expand_window(&coarse_path, a.len(), b.len(), radius);
    dtw_with_path(a, b, Some(&window))
}

/// Halve resolution by averaging adjacent pairs (odd tail kept as-is).
fn coarsen(x: &[f64]) -> Vec<f64> {
    x.chunks(2)
        .map(|c| c.iter().sum::<f64>() / c.len() as f64)
        .collect()
}

/// Project a coarse warp path onto the fine grid and widen it by `radius`,
/// returning an inclusive column range per row.
fn expand_window(path: &[(usize, usize)], n: usize, m: usize, radius: usize) -> Vec<(usize, usize)> {
    let mut lo = vec![usize::MAX; n];
    let mut hi = vec![0usize; n];

    for &(ci, cj) in path {
        // Coarse cell (ci, cj) covers the fine 2x2 block at (2ci, 2cj).
        let row_start = (ci * 2).saturating_sub(radius);
        let row_end = (ci * 2 + 1 + radius).min(n - 1);
        let col_start = (cj * 2).saturating_sub(radius);
        let col_end = (cj * 2 + 1 + radius).min(m - 1);

        for row in row_start..=row_end {
            lo[row] = lo[row].min(col_start);
            hi[row] = hi[row].max(col_end);
        }
    }

    lo.into_iter()
        .zip(hi)
        .map(|(l, h)| if l == usize::MAX { (0, m - 1) } else { (l, h) })
        .collect()
}

/// Accumulated-cost rows stored only inside the search window.
struct CostGrid {
    lo: Vec<usize>,
    rows: Vec<Vec<f64>>,
}

impl CostGrid {
    fn get(&self, i: usize, j: usize) -> f64 {
        let lo = self.lo[i];
        if j < lo {
            return f64::INFINITY;
        }
        self.rows[i].get(j - lo).copied().unwrap_or(f64::INFINITY)
    }
}

/// Windowed DTW with warp-path reconstruction. `window` gives an inclusive
/// column range per row; `None` means the full grid.
fn dtw_with_path(a: &[f64], b: &[f64], window: Option<&[(usize, usize)]>) -> (f64, WarpPath) {
    let n = a.len();
    let m = b.len();
    if n == 0 || m == 0 {
        let cost = if n == m { 0.0 } else { f64::INFINITY };
        return (cost, Vec::new());
    }

    let full;
    let ranges: &[(usize, usize)] = match window {
        Some(w) => w,
        None => {
            full = vec![(0, m - 1); n];
            &full
        }
    };

    let mut grid = CostGrid {
        lo: Vec::with_capacity(n),
        rows: Vec::with_capacity(n),
    };

    for (i, &av) in a.iter().enumerate() {
        let (lo, hi) = ranges[i];
        let hi = hi.min(m - 1);
        let mut row = Vec::with_capacity(hi - lo + 1);

        for j in lo..=hi {
            let best = if i == 0 && j == 0 {
                0.0
            } else {
                let mut best = f64::INFINITY;
                if j > lo {
                    best = best.min(row[j - lo - 1]); // (i, j-1)
                }
                if i > 0 {
                    best = best.min(grid.get(i - 1, j)); // (i-1, j)
                    if j > 0 {
                        best = best.min(grid.get(i - 1, j - 1)); // (i-1, j-1)
                    }
                }
                best
            };
            row.push((av - b[j]).abs() + best);
        }

        grid.lo.push(lo);
        grid.rows.push(row);
    }

    let total = grid.get(n - 1, m - 1);

    // Walk back from the end-anchor, always taking the cheapest predecessor.
    let mut path = Vec::with_capacity(n + m);
    let (mut i, mut j) = (n - 1, m - 1);
    path.push((i, j));
    while i > 0 || j > 0 {
        let diag = if i > 0 && j > 0 {
            grid.get(i - 1, j - 1)
        } else {
            f64::INFINITY
        };
        let up = if i > 0 { grid.get(i - 1, j) } else { f64::INFINITY };
        let left = if j > 0 { grid.get(i, j - 1) } else { f64::INFINITY };

        if diag <= up && diag <= left {
            i -= 1;
            j -= 1;
        } else if up <= left {
            i -= 1;
        } else {
            j -= 1;
        }
        path.push((i, j));
    }
    path.reverse();

    (total, path)
}
