//! Windowed similarity scan and candidate ranking.
//!
//! The scan is the dominant cost center: one distance computation per
//! admissible window. Every window is independent, so the parallel path
//! partitions the index range across rayon workers with no shared mutable
//! state and concatenates before ranking.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use crate::distance::DistanceMetric;
use crate::pattern;
use crate::{Ohlcv, Result, SearchError};

/// One scored window. Transient: produced by [`scan_windows`], consumed by
/// [`rank`], never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateMatch {
    /// Window start index in the series.
    pub index: usize,
    /// Elastic distance to the target pattern (smaller = more similar).
    pub distance: f64,
    /// Close at the window start.
    pub start_price: f64,
    /// Close at the window end (last bar inside the window).
    pub end_price: f64,
}

/// Cooperative cancellation signal, checked between window evaluations.
///
/// Cloning shares the flag; any clone can cancel. A cancelled scan stops at
/// the next window boundary and returns [`SearchError::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Score every admissible window against the target window.
///
/// Scans every complete window start `0..=len - length`, skipping the
/// exclusion zone `|i - target_start| < min_gap` so the target cannot match
/// its own neighborhood. Returns candidates in no particular order;
/// ordering is [`rank`]'s job.
pub fn scan_windows<T, D>(
    bars: &[T],
    target_start: usize,
    length: usize,
    min_gap: usize,
    metric: &D,
    parallel: bool,
    cancel: Option<&CancelToken>,
) -> Result<Vec<CandidateMatch>>
where
    T: Ohlcv + Sync,
    D: DistanceMetric,
{
    if length == 0 {
        return Err(SearchError::InvalidValue("pattern length must be > 0"));
    }

    let target = pattern::extract(bars, target_start, length).ok_or(SearchError::InvalidTarget {
        start: target_start,
        length,
        available: bars.len(),
    })?;

    let limit = bars.len() - length + 1;

    let evaluate = |i: usize| -> Result<Option<CandidateMatch>> {
        if let Some(token) = cancel {
            if token.is_cancelled() {
                return Err(SearchError::Cancelled);
            }
        }
        if i.abs_diff(target_start) < min_gap {
            return Ok(None);
        }
        let Some(window) = pattern::extract(bars, i, length) else {
            return Ok(None);
        };
        Ok(Some(CandidateMatch {
            index: i,
            distance: metric.distance(target.values(), window.values()),
            start_price: bars[i].close(),
            end_price: bars[i + length - 1].close(),
        }))
    };

    let scored: Vec<Option<CandidateMatch>> = if parallel {
        (0..limit).into_par_iter().map(evaluate).collect::<Result<_>>()?
    } else {
        (0..limit).map(evaluate).collect::<Result<_>>()?
    };

    Ok(scored.into_iter().flatten().collect())
}

/// Order candidates by ascending distance (ties by index for determinism)
/// and greedily drop any candidate within `min_gap` of one already accepted.
/// Stops at `top_n`; fewer results is valid.
pub fn rank(
    mut candidates: Vec<CandidateMatch>,
    min_gap: usize,
    top_n: usize,
) -> Vec<CandidateMatch> {
    candidates.sort_by(|x, y| x.distance.total_cmp(&y.distance).then(x.index.cmp(&y.index)));

    let mut selected: Vec<CandidateMatch> = Vec::with_capacity(top_n.min(candidates.len()));
    for candidate in candidates {
        if selected.len() >= top_n {
            break;
        }
        let too_close = selected
            .iter()
            .any(|s| s.index.abs_diff(candidate.index) < min_gap);
        if !too_close {
            selected.push(candidate);
        }
    }
    selected
}
