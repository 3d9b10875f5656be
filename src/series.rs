//! Concrete candle type and validated series container.
//!
//! The engine itself is generic over the [`Ohlcv`](crate::Ohlcv) trait;
//! `Candle`/`CandleSeries` are the ready-made implementation for callers that
//! deserialize hourly bars from an external feed.

use serde::{Deserialize, Serialize};

use crate::{Ohlcv, Result, SearchError};

/// A single OHLC bar at a fixed interval.
///
/// `time` is unix-seconds (UTC). Volume is optional and omitted from the
/// serialized form when absent, matching the upstream feed format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

impl Candle {
    /// Build a `Candle` from any bar type, for bundling OHLC segments.
    pub fn from_bar<T: Ohlcv>(bar: &T) -> Self {
        Self {
            time: bar.time(),
            open: bar.open(),
            high: bar.high(),
            low: bar.low(),
            close: bar.close(),
            volume: bar.volume(),
        }
    }

    fn validate(&self, index: usize) -> Result<()> {
        let fields = [self.open, self.high, self.low, self.close];
        if fields.iter().any(|v| !v.is_finite()) {
            return Err(SearchError::InvalidCandle {
                index,
                reason: "non-finite price",
            });
        }
        if fields.iter().any(|v| *v < 0.0) {
            return Err(SearchError::InvalidCandle {
                index,
                reason: "negative price",
            });
        }
        if self.high < self.low {
            return Err(SearchError::InvalidCandle {
                index,
                reason: "high < low",
            });
        }
        Ok(())
    }
}

impl Ohlcv for Candle {
    fn time(&self) -> i64 {
        self.time
    }

    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }

    fn volume(&self) -> Option<f64> {
        self.volume
    }
}

/// An immutable, validated series of candles ordered by ascending time.
///
/// Construction fails with [`SearchError::DataUnavailable`] when the input is
/// empty and with [`SearchError::InvalidCandle`] / `OutOfOrder` when a record
/// is malformed. Once built the series is read-only; the engine never
/// mutates it and it may be shared freely across concurrent searches.
#[derive(Debug, Clone)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new(candles: Vec<Candle>) -> Result<Self> {
        if candles.is_empty() {
            return Err(SearchError::DataUnavailable("series is empty"));
        }
        for (i, candle) in candles.iter().enumerate() {
            candle.validate(i)?;
            if i > 0 && candles[i - 1].time >= candle.time {
                return Err(SearchError::OutOfOrder { index: i });
            }
        }
        Ok(Self { candles })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.candles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        false // non-empty by construction
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Candle> {
        self.candles.get(index)
    }

    /// The most recent candle.
    #[inline]
    pub fn last(&self) -> &Candle {
        // Invariant: candles is non-empty
        &self.candles[self.candles.len() - 1]
    }

    #[inline]
    pub fn as_slice(&self) -> &[Candle] {
        &self.candles
    }
}

impl std::ops::Index<usize> for CandleSeries {
    type Output = Candle;

    fn index(&self, index: usize) -> &Candle {
        &self.candles[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(time: i64, close: f64) -> Candle {
        Candle {
            time,
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: None,
        }
    }

    #[test]
    fn test_empty_series_rejected() {
        let err = CandleSeries::new(vec![]).unwrap_err();
        assert!(matches!(err, SearchError::DataUnavailable(_)));
    }

    #[test]
    fn test_ascending_time_enforced() {
        let err = CandleSeries::new(vec![candle(100, 1.0), candle(100, 2.0)]).unwrap_err();
        assert!(matches!(err, SearchError::OutOfOrder { index: 1 }));

        let err = CandleSeries::new(vec![candle(200, 1.0), candle(100, 2.0)]).unwrap_err();
        assert!(matches!(err, SearchError::OutOfOrder { index: 1 }));
    }

    #[test]
    fn test_malformed_candle_rejected() {
        let mut bad = candle(100, 10.0);
        bad.low = 20.0; // high < low
        let err = CandleSeries::new(vec![bad]).unwrap_err();
        assert!(matches!(err, SearchError::InvalidCandle { index: 0, .. }));

        let mut nan = candle(100, 10.0);
        nan.close = f64::NAN;
        assert!(CandleSeries::new(vec![nan]).is_err());
    }

    #[test]
    fn test_accessors() {
        let series = CandleSeries::new(vec![candle(100, 1.0), candle(200, 2.0)]).unwrap();
        assert_eq!(series.len(), 2);
        assert!(!series.is_empty());
        assert_eq!(series.get(1).unwrap().time, 200);
        assert!(series.get(2).is_none());
        assert_eq!(series.last().time, 200);
        assert_eq!(series[0].close, 1.0);
    }

    #[test]
    fn test_candle_serde_roundtrip_skips_missing_volume() {
        let c = candle(100, 1.0);
        let json = serde_json::to_string(&c).unwrap();
        assert!(!json.contains("volume"));

        let parsed: Candle = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, c);
    }
}
