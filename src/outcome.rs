//! Forward-return outcomes and their summary statistics.
//!
//! A match whose forward window runs past the end of history has an
//! *unknown* outcome, not a zero one. [`ForwardOutcome`] keeps that
//! distinction explicit; the serialized form still uses the `0` sentinel for
//! downstream-format compatibility, but unknown outcomes never enter the
//! statistics sample.

use serde::{Deserialize, Serialize};

use crate::Ohlcv;

/// Default minimum number of forward bars to observe (one day of hourly
/// data). The effective forward window is `max(floor, pattern_length)`.
pub const FORWARD_OBS_FLOOR: usize = 24;

/// What happened after a matched window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ForwardOutcome {
    /// Percent change from the last close inside the window to the last
    /// observable forward close.
    Observed(f64),
    /// The forward window was not observable within available history.
    Unknown,
}

impl ForwardOutcome {
    #[inline]
    pub fn observed(self) -> Option<f64> {
        match self {
            Self::Observed(change) => Some(change),
            Self::Unknown => None,
        }
    }

    /// Serialized representation: the observed change, or `0` for unknown.
    #[inline]
    pub fn sentinel(self) -> f64 {
        self.observed().unwrap_or(0.0)
    }
}

impl Serialize for ForwardOutcome {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.sentinel().serialize(s)
    }
}

/// Compute the forward outcome for the window `[index, index + length)`.
///
/// Observes up to `max(forward_floor, length)` bars past the window end,
/// clipped to available history. Unknown when not a single forward bar is
/// observable, or when the reference close is zero.
pub fn forward_outcome<T: Ohlcv>(
    bars: &[T],
    index: usize,
    length: usize,
    forward_floor: usize,
) -> ForwardOutcome {
    let match_end = index + length;
    let forward_obs = forward_floor.max(length);
    let forward_end = match_end.saturating_add(forward_obs).min(bars.len());
    if forward_end <= match_end || match_end == 0 {
        return ForwardOutcome::Unknown;
    }

    let base = bars[match_end - 1].close();
    if base <= 0.0 {
        return ForwardOutcome::Unknown;
    }
    let last = bars[forward_end - 1].close();
    ForwardOutcome::Observed((last - base) / base * 100.0)
}

/// Aggregate statistics over the observed forward-return sample.
///
/// All five derived values are `0` when the sample is empty. Values are
/// rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// Number of matches with an observable forward window.
    pub count: usize,
    /// Percentage of observed returns that were positive, in `[0, 100]`.
    pub win_rate: f64,
    pub avg_return: f64,
    /// Lower-median convention: element `count / 2` of the ascending sort.
    pub median_return: f64,
    pub max_up: f64,
    pub max_down: f64,
}

impl Statistics {
    pub fn empty() -> Self {
        Self {
            count: 0,
            win_rate: 0.0,
            avg_return: 0.0,
            median_return: 0.0,
            max_up: 0.0,
            max_down: 0.0,
        }
    }

    pub fn from_sample(sample: &[f64]) -> Self {
        if sample.is_empty() {
            return Self::empty();
        }

        let count = sample.len();
        let wins = sample.iter().filter(|&&x| x > 0.0).count();
        let avg = sample.iter().sum::<f64>() / count as f64;

        let mut sorted = sample.to_vec();
        sorted.sort_by(f64::total_cmp);

        Self {
            count,
            win_rate: round2(wins as f64 / count as f64 * 100.0),
            avg_return: round2(avg),
            median_return: round2(sorted[count / 2]),
            max_up: round2(sorted[count - 1]),
            max_down: round2(sorted[0]),
        }
    }
}

#[inline]
fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
