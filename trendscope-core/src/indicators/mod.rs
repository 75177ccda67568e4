//! Indicator primitives.
//!
//! Each primitive implements the `Indicator` trait: full bar series in, one
//! numeric series of the same length out, with a `f64::NAN` warm-up prefix of
//! `lookback()` values. Multi-series indicators (ADX strength/bias, Donchian
//! bands) are exposed as separate named instances, keeping the single-series
//! trait unchanged.
//!
//! No indicator value at bar t may depend on data from bar t+1 or later.

pub mod adx;
pub mod donchian;
pub mod ema;
pub mod rsi;
pub mod sma;
pub mod wilder;

pub use adx::Adx;
pub use donchian::Donchian;
pub use ema::Ema;
pub use rsi::Rsi;
pub use sma::Sma;
pub use wilder::{true_range, wilder_smooth};

use crate::domain::Bar;

/// Trait for indicator primitives.
pub trait Indicator: Send + Sync {
    /// Series name (e.g., "sma_20", "adx_14").
    fn name(&self) -> &str;

    /// Number of leading bars for which no valid value can be computed.
    fn lookback(&self) -> usize;

    /// Compute the indicator over the entire bar series.
    ///
    /// Returns a `Vec<f64>` of the same length as `bars`, with the first
    /// `lookback()` values NaN.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Create synthetic bars from close prices for testing.
///
/// Open = previous close (or close for the first bar), high/low bracket the
/// open-close range by 1.0, volume constant.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000,
            }
        })
        .collect()
}

/// Create bars from explicit (open, high, low, close) tuples for testing.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| Bar {
            date: base_date + chrono::Duration::days(i as i64),
            open,
            high,
            low,
            close,
            volume: 1000,
        })
        .collect()
}

/// Assert two f64 values are approximately equal.
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
