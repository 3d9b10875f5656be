//! Search queries and target-window resolution.
//!
//! The requested start is a hint, not a contract: when it is absent,
//! unparseable, or lacks `length` hours of trailing data, resolution falls
//! back first to the most recent midnight (UTC) within the series and then
//! to the final `length` hours. Fallbacks are logged, never surfaced as
//! errors.

use chrono::NaiveDateTime;

use crate::{Ohlcv, PatternLength};

/// Accepted format for an explicit start, interpreted as UTC.
pub const START_FORMAT: &str = "%Y-%m-%d %H:%M";

const SECS_PER_DAY: i64 = 86_400;

/// Parameters of one search invocation.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Optional start in [`START_FORMAT`]. `None` selects the most recent
    /// midnight boundary.
    pub start: Option<String>,
    /// Window length in hours.
    pub length: PatternLength,
    /// Maximum number of ranked matches to return.
    pub top_n: usize,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            start: None,
            length: PatternLength::new_const(24),
            top_n: 200,
        }
    }
}

impl SearchQuery {
    pub fn new(length: PatternLength, top_n: usize) -> Self {
        Self {
            start: None,
            length,
            top_n,
        }
    }

    /// Request a specific start time (`YYYY-MM-DD HH:MM`, UTC).
    pub fn starting_at(mut self, start: impl Into<String>) -> Self {
        self.start = Some(start.into());
        self
    }
}

/// Resolve the query start against the series, applying the fallback policy.
/// Returns the target window's start index. Callers must ensure `bars` is
/// non-empty.
pub(crate) fn resolve_target_start<T: Ohlcv>(
    bars: &[T],
    start: Option<&str>,
    length: usize,
) -> usize {
    let n = bars.len();

    if let Some(s) = start {
        match NaiveDateTime::parse_from_str(s, START_FORMAT) {
            Ok(dt) => {
                let ts = dt.and_utc().timestamp();
                if let Some(i) = (0..n).rev().find(|&i| bars[i].time() <= ts) {
                    if i + length <= n {
                        return i;
                    }
                    tracing::warn!(
                        start = s,
                        length,
                        "insufficient data after requested start, using final window"
                    );
                    return n.saturating_sub(length);
                }
                tracing::warn!(start = s, "no data at or before requested start");
            }
            Err(err) => {
                tracing::warn!(start = s, %err, "unparseable start");
            }
        }
    }

    // Most recent midnight (UTC) with a full window of trailing data.
    let last = bars[n - 1].time();
    let midnight = last - last.rem_euclid(SECS_PER_DAY);
    if let Some(i) = (0..n).rev().find(|&i| bars[i].time() <= midnight) {
        if i + length <= n {
            return i;
        }
    }

    n.saturating_sub(length)
}
