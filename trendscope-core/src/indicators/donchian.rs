//! Donchian channel: highest high / lowest low over a rolling window.
//!
//! Exposed as separate upper/lower instances. Lookback: period - 1.

use crate::domain::Bar;
use crate::indicators::Indicator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Band {
    Upper,
    Lower,
}

#[derive(Debug, Clone)]
pub struct Donchian {
    period: usize,
    band: Band,
    name: String,
}

impl Donchian {
    /// Highest high over the window.
    pub fn upper(period: usize) -> Self {
        assert!(period >= 1, "Donchian period must be >= 1");
        Self {
            period,
            band: Band::Upper,
            name: format!("chan_high_{period}"),
        }
    }

    /// Lowest low over the window.
    pub fn lower(period: usize) -> Self {
        assert!(period >= 1, "Donchian period must be >= 1");
        Self {
            period,
            band: Band::Lower,
            name: format!("chan_low_{period}"),
        }
    }
}

impl Indicator for Donchian {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let p = self.period;
        let mut out = vec![f64::NAN; n];

        if n < p {
            return out;
        }

        for i in (p - 1)..n {
            let window = &bars[(i + 1 - p)..=i];
            out[i] = match self.band {
                Band::Upper => window
                    .iter()
                    .map(|b| b.high)
                    .fold(f64::NEG_INFINITY, f64::max),
                Band::Lower => window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min),
            };
            // fold with max/min propagates NaN only via explicit check
            if window.iter().any(|b| match self.band {
                Band::Upper => b.high.is_nan(),
                Band::Lower => b.low.is_nan(),
            }) {
                out[i] = f64::NAN;
            }
        }

        out
    }
}
