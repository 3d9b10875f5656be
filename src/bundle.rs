//! Assembly of the serializable search-result bundle.
//!
//! The bundle is the sole hand-off contract to downstream consumers
//! (persistence, rendering). Each ranked match carries its own OHLC segment
//! spanning the match window plus the forward window, so a renderer needs
//! nothing but this artifact.

use chrono::DateTime;
use serde::Serialize;

use crate::outcome::{self, ForwardOutcome, Statistics};
use crate::search::CandidateMatch;
use crate::series::Candle;
use crate::{Ohlcv, PatternLength};

/// Durable artifact of one search. Serializes to the persisted format:
/// `{target_time, target_date, pattern_length, stats, results}`.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    /// Unix-seconds of the target window start.
    pub target_time: i64,
    /// `YYYY-MM-DD HH:MM` (UTC).
    pub target_date: String,
    /// Start index of the target window. Internal descriptor, not persisted.
    #[serde(skip)]
    pub target_index: usize,
    pub pattern_length: PatternLength,
    pub stats: Statistics,
    /// Ranked matches, ascending by distance.
    pub results: Vec<RankedMatch>,
}

/// One ranked match, enriched for display.
#[derive(Debug, Clone, Serialize)]
pub struct RankedMatch {
    /// Unix-seconds of the match window start.
    pub time: i64,
    /// `YYYY-MM-DD HH:00` (UTC).
    pub date: String,
    /// Raw elastic distance to the target. Consumers wanting a "similarity
    /// percentage" must derive their own normalization.
    pub distance: f64,
    /// Percent change across the match window itself.
    pub change: f64,
    /// Forward outcome; serializes as `future_change` with the `0` sentinel
    /// for unknown outcomes.
    #[serde(rename = "future_change")]
    pub future: ForwardOutcome,
    /// Match window plus forward window.
    pub ohlc: Vec<Candle>,
}

fn format_ts(ts: i64, fmt: &str) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format(fmt).to_string())
        .unwrap_or_default()
}

/// Enrich ranked candidates with forward outcomes and OHLC segments and roll
/// the observed outcomes into [`Statistics`].
pub(crate) fn assemble<T: Ohlcv>(
    bars: &[T],
    target_start: usize,
    length: PatternLength,
    forward_floor: usize,
    ranked: Vec<CandidateMatch>,
) -> SearchResult {
    let len = length.get();
    let mut results = Vec::with_capacity(ranked.len());
    let mut sample = Vec::with_capacity(ranked.len());

    for candidate in ranked {
        let match_end = candidate.index + len;
        let forward_end = match_end
            .saturating_add(forward_floor.max(len))
            .min(bars.len());

        let future = outcome::forward_outcome(bars, candidate.index, len, forward_floor);
        if let Some(change) = future.observed() {
            sample.push(change);
        }

        let change = if candidate.start_price > 0.0 {
            (candidate.end_price - candidate.start_price) / candidate.start_price * 100.0
        } else {
            0.0
        };

        let time = bars[candidate.index].time();
        results.push(RankedMatch {
            time,
            date: format_ts(time, "%Y-%m-%d %H:00"),
            distance: candidate.distance,
            change,
            future,
            ohlc: bars[candidate.index..forward_end]
                .iter()
                .map(Candle::from_bar)
                .collect(),
        });
    }

    let target_time = bars[target_start].time();
    SearchResult {
        target_time,
        target_date: format_ts(target_time, "%Y-%m-%d %H:%M"),
        target_index: target_start,
        pattern_length: length,
        stats: Statistics::from_sample(&sample),
        results,
    }
}
