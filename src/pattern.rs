//! Pattern extraction: normalized close-price shapes for comparison.
//!
//! A [`Pattern`] is the min-max normalized close sequence of one window.
//! Normalization is purely a shape transform; return math elsewhere always
//! uses the raw closes.

use crate::Ohlcv;

/// Normalized close-price sequence, every element in `[0, 1]`.
///
/// Flat (zero-range) windows normalize to all zeros. Patterns are ephemeral:
/// recomputed per search, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    values: Vec<f64>,
}

impl Pattern {
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// Min-max normalize a sequence into `[0, 1]`; all zeros when flat.
pub fn normalize(values: &[f64]) -> Vec<f64> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in values {
        min = min.min(v);
        max = max.max(v);
    }

    let span = max - min;
    if values.is_empty() || span <= 0.0 {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| (v - min) / span).collect()
}

/// Extract the normalized pattern of the window `[start, start + length)`.
///
/// Returns `None` iff the window runs past the end of the series. A sliding
/// scan hits this at the tail on every pass, so it is a skip condition for
/// the caller, not an error.
pub fn extract<T: Ohlcv>(bars: &[T], start: usize, length: usize) -> Option<Pattern> {
    let end = start.checked_add(length)?;
    if end > bars.len() {
        return None;
    }

    let closes: Vec<f64> = bars[start..end].iter().map(|b| b.close()).collect();
    Some(Pattern {
        values: normalize(&closes),
    })
}
