//! Wilder primitives shared by ADX and RSI: true range and Wilder smoothing
//! (recursive mean with alpha = 1/period, seeded by a plain average).

use crate::domain::Bar;

/// True Range series.
///
/// TR[0] is NaN (no previous close to gap against).
/// TR[t] = max(high-low, |high-prev_close|, |low-prev_close|).
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    let n = bars.len();
    let mut tr = vec![f64::NAN; n];

    for i in 1..n {
        let h = bars[i].high;
        let l = bars[i].low;
        let pc = bars[i - 1].close;
        if !(h.is_nan() || l.is_nan() || pc.is_nan()) {
            tr[i] = (h - l).max((h - pc).abs()).max((l - pc).abs());
        }
    }

    tr
}

/// Wilder smoothing of a series.
///
/// Seeds with the mean of the first run of `period` consecutive non-NaN
/// values, then recurses with alpha = 1/period. A NaN after the seed ends the
/// output (the recursion cannot recover).
pub fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];

    if period == 0 || n < period {
        return out;
    }

    // First index starting a run of `period` consecutive non-NaN values
    let mut run = 0usize;
    let mut seed_start = None;
    for (i, v) in values.iter().enumerate() {
        if v.is_nan() {
            run = 0;
        } else {
            run += 1;
            if run == period {
                seed_start = Some(i + 1 - period);
                break;
            }
        }
    }
    let Some(seed_start) = seed_start else {
        return out;
    };
    let seed_end = seed_start + period;

    let seed = values[seed_start..seed_end].iter().sum::<f64>() / period as f64;
    out[seed_end - 1] = seed;

    let alpha = 1.0 / period as f64;
    let mut prev = seed;
    for i in seed_end..n {
        if values[i].is_nan() {
            break;
        }
        prev = alpha * values[i] + (1.0 - alpha) * prev;
        out[i] = prev;
    }

    out
}
