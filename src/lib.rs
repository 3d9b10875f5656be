//! # analogs - historical analog search for OHLC series
//!
//! Locates the historical windows of an hourly price series that most
//! resemble a chosen target window (elastic DTW matching over normalized
//! close shapes), then summarizes what happened after each match into a
//! forward-looking statistical outlook: win rate, average/median/extreme
//! forward return.
//!
//! The engine is pure computation: the series is handed in already loaded,
//! the [`SearchResult`](bundle::SearchResult) bundle is handed back already
//! built. Ingestion, request handling and rendering live outside this crate.
//!
//! ## Quick Start
//!
//! ```rust
//! use analogs::prelude::*;
//!
//! // Two hundred hourly bars of synthetic price data
//! let candles: Vec<Candle> = (0..200)
//!     .map(|i| {
//!         let close = 100.0 + ((i as f64) * 0.26).sin() * 5.0;
//!         Candle {
//!             time: i as i64 * 3600,
//!             open: close,
//!             high: close + 1.0,
//!             low: close - 1.0,
//!             close,
//!             volume: None,
//!         }
//!     })
//!     .collect();
//! let series = CandleSeries::new(candles)?;
//!
//! let engine = SearchBuilder::new().metric(FastDtw::default()).build()?;
//! let result = engine.search(series.as_slice(), &SearchQuery::default())?;
//!
//! println!("{} analogs, win rate {}%", result.stats.count, result.stats.win_rate);
//! # Ok::<(), analogs::SearchError>(())
//! ```

pub mod bundle;
pub mod distance;
pub mod outcome;
pub mod pattern;
pub mod query;
pub mod search;
pub mod series;

pub mod prelude {
    pub use crate::{
        // Bundle
        bundle::{RankedMatch, SearchResult},
        // Metrics
        distance::{DistanceMetric, ExactDtw, FastDtw},
        // Outcomes
        outcome::{ForwardOutcome, Statistics},
        // Patterns
        pattern::Pattern,
        // Queries
        query::SearchQuery,
        // Scan primitives
        search::{CancelToken, CandidateMatch},
        // Series
        series::{Candle, CandleSeries},
        // Engine
        DefaultEngine,
        Ohlcv,
        PatternLength,
        Result,
        SearchBuilder,
        SearchEngine,
        SearchError,
    };
}

use crate::bundle::SearchResult;
use crate::distance::{DistanceMetric, ExactDtw};
use crate::query::SearchQuery;
use crate::search::CancelToken;

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, SearchError>;

/// Errors that can occur during analog search
#[derive(Debug, Clone, thiserror::Error)]
pub enum SearchError {
    #[error("No data available: {0}")]
    DataUnavailable(&'static str),

    #[error(
        "Target window [{start}, {start}+{length}) extends past available history \
         ({available} bars); shorten the length or choose an earlier start"
    )]
    InvalidTarget {
        start: usize,
        length: usize,
        available: usize,
    },

    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid candle at index {index}: {reason}")]
    InvalidCandle { index: usize, reason: &'static str },

    #[error("Out-of-order timestamp at index {index}")]
    OutOfOrder { index: usize },

    #[error("Search cancelled")]
    Cancelled,
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Pattern window length in hours (must be > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PatternLength(usize);

impl PatternLength {
    /// Create a new PatternLength, validating value is > 0
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(SearchError::InvalidValue("pattern length must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl serde::Serialize for PatternLength {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for PatternLength {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        PatternLength::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// OHLC TRAIT
// ============================================================

/// Core OHLC bar trait. Implement this on your own bar type to search it
/// directly; [`series::Candle`] is the ready-made implementation.
pub trait Ohlcv {
    /// Unix-seconds (UTC) of the bar open.
    fn time(&self) -> i64;
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;

    fn volume(&self) -> Option<f64> {
        None
    }
}

// ============================================================
// SEARCH ENGINE
// ============================================================

/// Matches closer than this to the target (or to each other) are suppressed,
/// regardless of pattern length. `min_gap = max(2 * length, floor)`.
pub const MIN_GAP_FLOOR: usize = 48;

/// The analog search engine. Stateless across invocations: every search is
/// a pure function of `(series, query)`.
///
/// Generic over the distance strategy: [`ExactDtw`] for reference-exact
/// results, [`distance::FastDtw`] for near-linear approximate search over
/// long series.
pub struct SearchEngine<D: DistanceMetric = ExactDtw> {
    metric: D,
    parallel: bool,
    min_gap_floor: usize,
    forward_floor: usize,
}

/// Engine with the exact reference metric
pub type DefaultEngine = SearchEngine<ExactDtw>;

impl Default for SearchEngine<ExactDtw> {
    fn default() -> Self {
        Self {
            metric: ExactDtw,
            parallel: false,
            min_gap_floor: MIN_GAP_FLOOR,
            forward_floor: outcome::FORWARD_OBS_FLOOR,
        }
    }
}

impl SearchEngine<ExactDtw> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<D: DistanceMetric> SearchEngine<D> {
    /// Effective minimum index separation for a given window length.
    #[inline]
    pub fn min_gap(&self, length: usize) -> usize {
        (length * 2).max(self.min_gap_floor)
    }

    /// Run the full pipeline: resolve the target window from the query
    /// (with the fallback policy), scan, rank, aggregate, bundle.
    pub fn search<T: Ohlcv + Sync>(&self, bars: &[T], query: &SearchQuery) -> Result<SearchResult> {
        self.search_inner(bars, query, None)
    }

    /// Like [`search`](Self::search), with a cooperative cancellation signal
    /// checked between window evaluations.
    pub fn search_with_cancel<T: Ohlcv + Sync>(
        &self,
        bars: &[T],
        query: &SearchQuery,
        cancel: &CancelToken,
    ) -> Result<SearchResult> {
        self.search_inner(bars, query, Some(cancel))
    }

    /// Run the pipeline from an explicit target start index, bypassing date
    /// resolution. Surfaces [`SearchError::InvalidTarget`] when the target
    /// window does not fit in the series.
    pub fn search_from<T: Ohlcv + Sync>(
        &self,
        bars: &[T],
        target_start: usize,
        length: PatternLength,
        top_n: usize,
    ) -> Result<SearchResult> {
        self.check_inputs(bars, top_n)?;
        self.run(bars, target_start, length, top_n, None)
    }

    fn search_inner<T: Ohlcv + Sync>(
        &self,
        bars: &[T],
        query: &SearchQuery,
        cancel: Option<&CancelToken>,
    ) -> Result<SearchResult> {
        self.check_inputs(bars, query.top_n)?;
        let target_start =
            query::resolve_target_start(bars, query.start.as_deref(), query.length.get());
        self.run(bars, target_start, query.length, query.top_n, cancel)
    }

    fn check_inputs<T: Ohlcv>(&self, bars: &[T], top_n: usize) -> Result<()> {
        if bars.is_empty() {
            return Err(SearchError::DataUnavailable("series is empty"));
        }
        if top_n == 0 {
            return Err(SearchError::InvalidValue("top_n must be > 0"));
        }
        Ok(())
    }

    fn run<T: Ohlcv + Sync>(
        &self,
        bars: &[T],
        target_start: usize,
        length: PatternLength,
        top_n: usize,
        cancel: Option<&CancelToken>,
    ) -> Result<SearchResult> {
        let len = length.get();
        let min_gap = self.min_gap(len);
        tracing::debug!(
            target_start,
            length = len,
            min_gap,
            bars = bars.len(),
            "scanning for analogs"
        );

        let candidates = search::scan_windows(
            bars,
            target_start,
            len,
            min_gap,
            &self.metric,
            self.parallel,
            cancel,
        )?;
        let ranked = search::rank(candidates, min_gap, top_n);
        tracing::debug!(matches = ranked.len(), "scan complete");

        Ok(bundle::assemble(
            bars,
            target_start,
            length,
            self.forward_floor,
            ranked,
        ))
    }
}

// ============================================================
// BUILDER
// ============================================================

/// Builder for [`SearchEngine`] instances
pub struct SearchBuilder<D: DistanceMetric = ExactDtw> {
    metric: D,
    parallel: bool,
    min_gap_floor: usize,
    forward_floor: usize,
}

impl Default for SearchBuilder<ExactDtw> {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchBuilder<ExactDtw> {
    pub fn new() -> Self {
        Self {
            metric: ExactDtw,
            parallel: false,
            min_gap_floor: MIN_GAP_FLOOR,
            forward_floor: outcome::FORWARD_OBS_FLOOR,
        }
    }
}

impl<D: DistanceMetric> SearchBuilder<D> {
    /// Swap the distance strategy (exact or approximate).
    pub fn metric<D2: DistanceMetric>(self, metric: D2) -> SearchBuilder<D2> {
        SearchBuilder {
            metric,
            parallel: self.parallel,
            min_gap_floor: self.min_gap_floor,
            forward_floor: self.forward_floor,
        }
    }

    /// Partition the scan across the rayon thread pool.
    pub fn parallel(mut self, enable: bool) -> Self {
        self.parallel = enable;
        self
    }

    /// Override the minimum-separation floor (default 48 hours).
    pub fn min_gap_floor(mut self, hours: usize) -> Self {
        self.min_gap_floor = hours;
        self
    }

    /// Override the forward-observation floor (default 24 hours).
    pub fn forward_floor(mut self, hours: usize) -> Self {
        self.forward_floor = hours;
        self
    }

    /// Build the engine
    pub fn build(self) -> Result<SearchEngine<D>> {
        if self.min_gap_floor == 0 {
            return Err(SearchError::InvalidConfig(
                "min_gap_floor must be > 0".to_string(),
            ));
        }
        if self.forward_floor == 0 {
            return Err(SearchError::InvalidConfig(
                "forward_floor must be > 0".to_string(),
            ));
        }
        Ok(SearchEngine {
            metric: self.metric,
            parallel: self.parallel,
            min_gap_floor: self.min_gap_floor,
            forward_floor: self.forward_floor,
        })
    }
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Candle;

    fn hourly_closes(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Candle {
                time: i as i64 * 3600,
                open: c,
                high: c + 1.0,
                low: (c - 1.0).max(0.0),
                close: c,
                volume: None,
            })
            .collect()
    }

    fn sine_series(n: usize, period_bars: f64) -> Vec<Candle> {
        let closes: Vec<f64> = (0..n)
            .map(|i| 100.0 + ((i as f64) * std::f64::consts::TAU / period_bars).sin() * 10.0)
            .collect();
        hourly_closes(&closes)
    }

    #[test]
    fn test_pattern_length_validation() {
        assert!(PatternLength::new(1).is_ok());
        assert!(PatternLength::new(24).is_ok());
        assert!(PatternLength::new(0).is_err());
    }

    #[test]
    fn test_pattern_length_serde() {
        let len: PatternLength = serde_json::from_str("24").unwrap();
        assert_eq!(len.get(), 24);
        assert!(serde_json::from_str::<PatternLength>("0").is_err());
        assert_eq!(serde_json::to_string(&len).unwrap(), "24");
    }

    #[test]
    fn test_builder_validation() {
        assert!(SearchBuilder::new().build().is_ok());
        assert!(SearchBuilder::new().min_gap_floor(0).build().is_err());
        assert!(SearchBuilder::new().forward_floor(0).build().is_err());
    }

    #[test]
    fn test_empty_series_is_data_unavailable() {
        let engine = SearchEngine::new();
        let bars: Vec<Candle> = vec![];
        let err = engine.search(&bars, &SearchQuery::default()).unwrap_err();
        assert!(matches!(err, SearchError::DataUnavailable(_)));
    }

    #[test]
    fn test_zero_top_n_rejected() {
        let engine = SearchEngine::new();
        let bars = sine_series(100, 50.0);
        let query = SearchQuery::new(PatternLength::new_const(10), 0);
        let err = engine.search(&bars, &query).unwrap_err();
        assert!(matches!(err, SearchError::InvalidValue(_)));
    }

    #[test]
    fn test_search_from_invalid_target() {
        let engine = SearchEngine::new();
        let bars = sine_series(50, 25.0);
        let err = engine
            .search_from(&bars, 40, PatternLength::new_const(20), 5)
            .unwrap_err();
        assert!(matches!(
            err,
            SearchError::InvalidTarget {
                start: 40,
                length: 20,
                available: 50
            }
        ));
    }

    #[test]
    fn test_min_gap_rule() {
        let engine = SearchEngine::new();
        assert_eq!(engine.min_gap(10), 48);
        assert_eq!(engine.min_gap(24), 48);
        assert_eq!(engine.min_gap(30), 60);
    }

    #[test]
    fn test_search_is_stateless() {
        let engine = SearchBuilder::new().min_gap_floor(10).build().unwrap();
        let bars = sine_series(300, 60.0);

        let a = engine
            .search_from(&bars, 0, PatternLength::new_const(20), 5)
            .unwrap();
        let b = engine
            .search_from(&bars, 0, PatternLength::new_const(20), 5)
            .unwrap();

        assert_eq!(a.stats, b.stats);
        let ia: Vec<i64> = a.results.iter().map(|m| m.time).collect();
        let ib: Vec<i64> = b.results.iter().map(|m| m.time).collect();
        assert_eq!(ia, ib);
    }

    #[test]
    fn test_results_sorted_and_separated() {
        let engine = SearchBuilder::new().min_gap_floor(30).build().unwrap();
        let bars = sine_series(400, 40.0);

        let result = engine
            .search_from(&bars, 0, PatternLength::new_const(15), 8)
            .unwrap();
        assert!(!result.results.is_empty());
        assert!(result.results.len() <= 8);

        for pair in result.results.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
        let starts: Vec<i64> = result.results.iter().map(|m| m.time / 3600).collect();
        for (i, &a) in starts.iter().enumerate() {
            for &b in &starts[i + 1..] {
                assert!((a - b).unsigned_abs() as usize >= 30);
            }
        }
    }

    #[test]
    fn test_cancel_token_stops_search() {
        let engine = SearchEngine::new();
        let bars = sine_series(200, 50.0);

        let token = CancelToken::new();
        token.cancel();
        let err = engine
            .search_with_cancel(&bars, &SearchQuery::default(), &token)
            .unwrap_err();
        assert!(matches!(err, SearchError::Cancelled));
    }
}
