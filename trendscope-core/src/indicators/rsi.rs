//! Relative Strength Index, Wilder smoothing of average gains and losses.
//!
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss), in [0, 100].
//! Edge cases: no losses -> 100, no gains -> 0, no movement at all -> 50.
//! Lookback: period.

use crate::domain::Bar;
use crate::indicators::Indicator;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let p = self.period;
        let mut out = vec![f64::NAN; n];

        if n < p + 1 {
            return out;
        }

        let mut changes = vec![f64::NAN; n];
        for i in 1..n {
            changes[i] = bars[i].close - bars[i - 1].close;
        }

        // Seed averages over the first `period` changes
        let mut avg_gain = 0.0;
        let mut avg_loss = 0.0;
        for &ch in &changes[1..=p] {
            if ch.is_nan() {
                return out;
            }
            if ch > 0.0 {
                avg_gain += ch;
            } else {
                avg_loss -= ch;
            }
        }
        avg_gain /= p as f64;
        avg_loss /= p as f64;
        out[p] = rsi_value(avg_gain, avg_loss);

        let alpha = 1.0 / p as f64;
        for i in (p + 1)..n {
            let ch = changes[i];
            if ch.is_nan() {
                break;
            }
            let gain = ch.max(0.0);
            let loss = (-ch).max(0.0);
            avg_gain = alpha * gain + (1.0 - alpha) * avg_gain;
            avg_loss = alpha * loss + (1.0 - alpha) * avg_loss;
            out[i] = rsi_value(avg_gain, avg_loss);
        }

        out
    }
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_gain == 0.0 && avg_loss == 0.0 {
        // Flat series: no momentum either way
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars};

    #[test]
    fn all_gains_is_100() {
        let bars = make_bars(&[100.0, 101.0, 102.0, 103.0, 104.0, 105.0]);
        let result = Rsi::new(3).compute(&bars);
        assert_approx(result[3], 100.0, 1e-9);
        assert_approx(result[5], 100.0, 1e-9);
    }

    #[test]
    fn all_losses_is_0() {
        let bars = make_bars(&[105.0, 104.0, 103.0, 102.0, 101.0]);
        let result = Rsi::new(3).compute(&bars);
        assert_approx(result[3], 0.0, 1e-9);
    }

    #[test]
    fn flat_series_is_50() {
        let bars = make_bars(&[100.0; 8]);
        let result = Rsi::new(3).compute(&bars);
        assert_approx(result[3], 50.0, 1e-9);
        assert_approx(result[7], 50.0, 1e-9);
    }

    #[test]
    fn mixed_changes_land_strictly_inside_bounds() {
        // Changes over the seed window: +0.34, -0.25, -0.48
        let bars = make_bars(&[44.0, 44.34, 44.09, 43.61, 44.33]);
        let result = Rsi::new(3).compute(&bars);

        assert!(result[2].is_nan());
        assert!(result[3] > 0.0 && result[3] < 100.0);
        assert!(result[4] > result[3], "an up move should lift RSI");
    }

    #[test]
    fn always_within_bounds() {
        let bars = make_bars(&[100.0, 105.0, 98.0, 110.0, 95.0, 115.0, 90.0, 120.0]);
        for &v in &Rsi::new(3).compute(&bars) {
            if !v.is_nan() {
                assert!((0.0..=100.0).contains(&v));
            }
        }
    }

    #[test]
    fn nan_close_ends_the_series() {
        let mut bars = make_bars(&[100.0, 101.0, 102.0, 103.0, 104.0, 105.0]);
        bars[4].close = f64::NAN;
        let result = Rsi::new(3).compute(&bars);
        assert!(!result[3].is_nan());
        assert!(result[4].is_nan());
        assert!(result[5].is_nan());
    }

    #[test]
    fn lookback() {
        assert_eq!(Rsi::new(14).lookback(), 14);
    }
}
