//! Daily bar representation.

use chrono::NaiveDate;

/// One trading day of a series, with the optional precomputed indicators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// ATR or equivalent volatility measure.
    pub dispersion: Option<f64>,
    /// ADX or equivalent trend-strength measure.
    pub trend: Option<f64>,
}

impl DailyBar {
    /// (close - prev_close) / prev_close, undefined for a zero previous close.
    pub fn return_from(&self, prev_close: f64) -> Option<f64> {
        if prev_close == 0.0 {
            return None;
        }
        Some((self.close - prev_close) / prev_close)
    }
}

/// Return of `bar` against an optional previous close.
pub fn daily_return(prev_close: Option<f64>, bar: &DailyBar) -> Option<f64> {
    prev_close.and_then(|prev| bar.return_from(prev))
}
