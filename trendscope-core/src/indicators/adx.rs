//! Average Directional Index (Wilder).
//!
//! From consecutive bars: +DM and -DM, Wilder-smoothed together with TR to
//! give +DI and -DI, then DX = 100 * |+DI - -DI| / (+DI + -DI), and ADX as
//! Wilder-smoothed DX.
//!
//! Two series are exposed as separate instances:
//! - `strength`: ADX, unsigned in [0, 100]. Lookback: 2 * period.
//! - `bias`: +DI - -DI, signed in [-100, 100], carries the trend direction.
//!   Lookback: period.

use crate::domain::Bar;
use crate::indicators::wilder::{true_range, wilder_smooth};
use crate::indicators::Indicator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AdxSeries {
    Strength,
    Bias,
}

#[derive(Debug, Clone)]
pub struct Adx {
    period: usize,
    series: AdxSeries,
    name: String,
}

impl Adx {
    /// Smoothed directional-movement strength (the ADX proper).
    pub fn strength(period: usize) -> Self {
        assert!(period >= 1, "ADX period must be >= 1");
        Self {
            period,
            series: AdxSeries::Strength,
            name: format!("adx_{period}"),
        }
    }

    /// Signed directional bias: +DI - -DI.
    pub fn bias(period: usize) -> Self {
        assert!(period >= 1, "ADX period must be >= 1");
        Self {
            period,
            series: AdxSeries::Bias,
            name: format!("di_bias_{period}"),
        }
    }

    /// Smoothed +DI and -DI series.
    fn directional_indices(&self, bars: &[Bar]) -> (Vec<f64>, Vec<f64>) {
        let n = bars.len();
        let mut plus_dm = vec![f64::NAN; n];
        let mut minus_dm = vec![f64::NAN; n];

        for i in 1..n {
            let up = bars[i].high - bars[i - 1].high;
            let down = bars[i - 1].low - bars[i].low;

            if up.is_nan() || down.is_nan() {
                continue;
            }

            plus_dm[i] = if up > down && up > 0.0 { up } else { 0.0 };
            minus_dm[i] = if down > up && down > 0.0 { down } else { 0.0 };
        }

        let smooth_tr = wilder_smooth(&true_range(bars), self.period);
        let smooth_plus = wilder_smooth(&plus_dm, self.period);
        let smooth_minus = wilder_smooth(&minus_dm, self.period);

        let mut plus_di = vec![f64::NAN; n];
        let mut minus_di = vec![f64::NAN; n];
        for i in 0..n {
            let tr = smooth_tr[i];
            if tr.is_nan() || tr == 0.0 || smooth_plus[i].is_nan() || smooth_minus[i].is_nan() {
                continue;
            }
            plus_di[i] = 100.0 * smooth_plus[i] / tr;
            minus_di[i] = 100.0 * smooth_minus[i] / tr;
        }

        (plus_di, minus_di)
    }
}

impl Indicator for Adx {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.series {
            AdxSeries::Strength => 2 * self.period,
            AdxSeries::Bias => self.period,
        }
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let (plus_di, minus_di) = self.directional_indices(bars);

        match self.series {
            AdxSeries::Bias => (0..n)
                .map(|i| {
                    if plus_di[i].is_nan() || minus_di[i].is_nan() {
                        f64::NAN
                    } else {
                        plus_di[i] - minus_di[i]
                    }
                })
                .collect(),
            AdxSeries::Strength => {
                let mut dx = vec![f64::NAN; n];
                for i in 0..n {
                    if plus_di[i].is_nan() || minus_di[i].is_nan() {
                        continue;
                    }
                    let di_sum = plus_di[i] + minus_di[i];
                    dx[i] = if di_sum == 0.0 {
                        0.0
                    } else {
                        100.0 * (plus_di[i] - minus_di[i]).abs() / di_sum
                    };
                }
                wilder_smooth(&dx, self.period)
            }
        }
    }
}
