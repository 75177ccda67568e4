//! Indicator-family engine.
//!
//! A run selects one indicator family (`IndicatorKind`) and tenor up front;
//! `build_field` turns that selection into a `TrendField` strategy object
//! which is then applied to every instrument independently. Each family
//! enriches a `PriceSeries` into an `IndicatorTable` (price columns plus the
//! family's derived columns, warm-up rows excluded) and reduces the table's
//! last row to one signed trend score.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Bar, PriceSeries};
use crate::indicators::{Adx, Donchian, Ema, Indicator, Rsi, Sma};

/// The six supported moving-average crossover pairs (short, long).
pub const MA_CROSS_PAIRS: [(u32, u32); 6] =
    [(5, 200), (10, 30), (10, 50), (20, 50), (30, 100), (50, 200)];

/// Supported single-tenor windows for the non-crossover families.
pub const SINGLE_TENORS: [u32; 6] = [10, 20, 30, 50, 100, 200];

/// Indicator family selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    Adx,
    MaCross,
    PriceCross,
    Rsi,
    Breakout,
}

impl IndicatorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorKind::Adx => "adx",
            IndicatorKind::MaCross => "ma_cross",
            IndicatorKind::PriceCross => "price_cross",
            IndicatorKind::Rsi => "rsi",
            IndicatorKind::Breakout => "breakout",
        }
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndicatorKind {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "adx" => Ok(IndicatorKind::Adx),
            "ma_cross" => Ok(IndicatorKind::MaCross),
            "price_cross" => Ok(IndicatorKind::PriceCross),
            "rsi" => Ok(IndicatorKind::Rsi),
            "breakout" => Ok(IndicatorKind::Breakout),
            other => Err(FieldError::UnknownIndicator(other.to_string())),
        }
    }
}

/// Moving-average flavor for the crossover families.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaKind {
    #[default]
    Simple,
    Exponential,
}

#[derive(Debug, Error)]
pub enum FieldError {
    #[error("unknown indicator type '{0}'")]
    UnknownIndicator(String),

    #[error("tenor {0} is not supported; choose from {SINGLE_TENORS:?}")]
    UnsupportedTenor(u32),

    #[error("({0}, {1}) is not a supported moving-average pair; choose from {MA_CROSS_PAIRS:?}")]
    UnsupportedPair(u32, u32),

    #[error("{ticker}: only {rows} rows of history, {needed} needed for {field}")]
    InsufficientHistory {
        ticker: String,
        rows: usize,
        needed: usize,
        field: String,
    },
}

/// Per-instrument table of price bars plus derived indicator columns.
///
/// Rows cover only the span where every derived column has a value; warm-up
/// rows are excluded, not zero-filled.
#[derive(Debug, Clone)]
pub struct IndicatorTable {
    ticker: String,
    bars: Vec<Bar>,
    columns: Vec<(String, Vec<f64>)>,
}

impl IndicatorTable {
    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    /// Last value of a derived column.
    pub fn last(&self, name: &str) -> Option<f64> {
        self.column(name).and_then(|v| v.last().copied())
    }

    /// Last-row snapshot of every derived column, in declaration order.
    pub fn last_row(&self) -> Vec<(String, f64)> {
        self.columns
            .iter()
            .filter_map(|(n, v)| v.last().map(|&x| (n.clone(), x)))
            .collect()
    }
}

/// One indicator family applied at a fixed tenor.
pub trait TrendField: Send + Sync {
    /// Family + tenor label, e.g. "adx_20", "ma_cross_10_50".
    fn name(&self) -> String;

    /// Bars of history consumed before the first complete output row.
    fn lookback(&self) -> usize;

    /// Derived column series, each the same length as `bars`, NaN warm-up.
    fn columns(&self, bars: &[Bar]) -> Vec<(String, Vec<f64>)>;

    /// Reduce a table's most recent row to one signed, price-scale-free
    /// trend score. Positive = up-trend, negative = down-trend, magnitude =
    /// strength. Returns `None` when the table has no rows.
    fn score(&self, table: &IndicatorTable) -> Option<f64>;

    /// Enrich one instrument's prices into an indicator table, excluding
    /// warm-up rows.
    fn enrich(&self, series: &PriceSeries) -> Result<IndicatorTable, FieldError> {
        let bars = series.bars();
        let columns = self.columns(bars);

        // First row where every derived column has a value
        let first_complete = (0..bars.len()).find(|&i| {
            columns.iter().all(|(_, v)| !v[i].is_nan())
        });

        let Some(start) = first_complete else {
            return Err(FieldError::InsufficientHistory {
                ticker: series.ticker().to_string(),
                rows: bars.len(),
                needed: self.lookback() + 1,
                field: self.name(),
            });
        };

        Ok(IndicatorTable {
            ticker: series.ticker().to_string(),
            bars: bars[start..].to_vec(),
            columns: columns
                .into_iter()
                .map(|(name, v)| (name, v[start..].to_vec()))
                .collect(),
        })
    }
}

/// Build the strategy object for a validated family + tenor selection.
pub fn build_field(
    kind: IndicatorKind,
    single_tenor: Option<u32>,
    pair_tenor: Option<(u32, u32)>,
    ma_kind: MaKind,
) -> Result<Box<dyn TrendField>, FieldError> {
    match kind {
        IndicatorKind::MaCross => {
            let (short, long) = pair_tenor.ok_or(FieldError::UnsupportedPair(0, 0))?;
            if !MA_CROSS_PAIRS.contains(&(short, long)) {
                return Err(FieldError::UnsupportedPair(short, long));
            }
            Ok(Box::new(MaCrossField {
                short: short as usize,
                long: long as usize,
                ma_kind,
            }))
        }
        _ => {
            let tenor = single_tenor.ok_or(FieldError::UnsupportedTenor(0))?;
            if !SINGLE_TENORS.contains(&tenor) {
                return Err(FieldError::UnsupportedTenor(tenor));
            }
            let t = tenor as usize;
            Ok(match kind {
                IndicatorKind::Adx => Box::new(AdxField { period: t }),
                IndicatorKind::PriceCross => Box::new(PriceCrossField {
                    period: t,
                    ma_kind,
                }),
                IndicatorKind::Rsi => Box::new(RsiField { period: t }),
                IndicatorKind::Breakout => Box::new(BreakoutField { period: t }),
                IndicatorKind::MaCross => unreachable!("handled above"),
            })
        }
    }
}

/// Apply one field to a whole universe. Per-instrument work is independent;
/// callers may fan it out (the runner does, with rayon) and merge.
pub fn generate_fields(
    field: &dyn TrendField,
    raw: &BTreeMap<String, PriceSeries>,
) -> Result<BTreeMap<String, IndicatorTable>, FieldError> {
    raw.iter()
        .map(|(ticker, series)| Ok((ticker.clone(), field.enrich(series)?)))
        .collect()
}

fn ma_series(bars: &[Bar], period: usize, kind: MaKind) -> Vec<f64> {
    match kind {
        MaKind::Simple => Sma::new(period).compute(bars),
        MaKind::Exponential => Ema::new(period).compute(bars),
    }
}

// ─── adx ─────────────────────────────────────────────────────────────

/// ADX strength plus signed directional bias.
struct AdxField {
    period: usize,
}

impl TrendField for AdxField {
    fn name(&self) -> String {
        format!("adx_{}", self.period)
    }

    fn lookback(&self) -> usize {
        2 * self.period
    }

    fn columns(&self, bars: &[Bar]) -> Vec<(String, Vec<f64>)> {
        vec![
            ("adx".into(), Adx::strength(self.period).compute(bars)),
            ("di_bias".into(), Adx::bias(self.period).compute(bars)),
        ]
    }

    fn score(&self, table: &IndicatorTable) -> Option<f64> {
        let adx = table.last("adx")?;
        let bias = table.last("di_bias")?;
        // Magnitude from ADX, direction from the DI spread
        Some(if bias > 0.0 {
            adx
        } else if bias < 0.0 {
            -adx
        } else {
            0.0
        })
    }
}

// ─── ma_cross ────────────────────────────────────────────────────────

/// Short/long moving-average spread, close-normalized, with a per-bar
/// crossover flag.
struct MaCrossField {
    short: usize,
    long: usize,
    ma_kind: MaKind,
}

impl TrendField for MaCrossField {
    fn name(&self) -> String {
        format!("ma_cross_{}_{}", self.short, self.long)
    }

    fn lookback(&self) -> usize {
        self.long - 1
    }

    fn columns(&self, bars: &[Bar]) -> Vec<(String, Vec<f64>)> {
        let n = bars.len();
        let short = ma_series(bars, self.short, self.ma_kind);
        let long = ma_series(bars, self.long, self.ma_kind);

        let mut spread = vec![f64::NAN; n];
        for i in 0..n {
            let close = bars[i].close;
            if !short[i].is_nan() && !long[i].is_nan() && close != 0.0 {
                spread[i] = (short[i] - long[i]) / close * 100.0;
            }
        }

        // +1 where the spread turned positive on this bar, -1 where it
        // turned negative, 0 otherwise
        let mut crossed = vec![f64::NAN; n];
        for i in 0..n {
            if spread[i].is_nan() {
                continue;
            }
            crossed[i] = if i == 0 || spread[i - 1].is_nan() {
                0.0
            } else if spread[i - 1] <= 0.0 && spread[i] > 0.0 {
                1.0
            } else if spread[i - 1] >= 0.0 && spread[i] < 0.0 {
                -1.0
            } else {
                0.0
            };
        }

        vec![
            ("ma_short".into(), short),
            ("ma_long".into(), long),
            ("ma_spread".into(), spread),
            ("crossed".into(), crossed),
        ]
    }

    fn score(&self, table: &IndicatorTable) -> Option<f64> {
        table.last("ma_spread")
    }
}

// ─── price_cross ─────────────────────────────────────────────────────

/// Close versus its own moving average, as a signed percentage deviation.
struct PriceCrossField {
    period: usize,
    ma_kind: MaKind,
}

impl TrendField for PriceCrossField {
    fn name(&self) -> String {
        format!("price_cross_{}", self.period)
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn columns(&self, bars: &[Bar]) -> Vec<(String, Vec<f64>)> {
        let n = bars.len();
        let ma = ma_series(bars, self.period, self.ma_kind);

        let mut dev = vec![f64::NAN; n];
        for i in 0..n {
            if !ma[i].is_nan() && ma[i] != 0.0 {
                dev[i] = (bars[i].close - ma[i]) / ma[i] * 100.0;
            }
        }

        vec![("price_ma".into(), ma), ("price_dev".into(), dev)]
    }

    fn score(&self, table: &IndicatorTable) -> Option<f64> {
        table.last("price_dev")
    }
}

// ─── rsi ─────────────────────────────────────────────────────────────

struct RsiField {
    period: usize,
}

impl TrendField for RsiField {
    fn name(&self) -> String {
        format!("rsi_{}", self.period)
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn columns(&self, bars: &[Bar]) -> Vec<(String, Vec<f64>)> {
        vec![("rsi".into(), Rsi::new(self.period).compute(bars))]
    }

    fn score(&self, table: &IndicatorTable) -> Option<f64> {
        // Center the oscillator: 50 is trendless, the tails are strong
        table.last("rsi").map(|rsi| (rsi - 50.0) * 2.0)
    }
}

// ─── breakout ────────────────────────────────────────────────────────

/// Position of the close within the rolling high/low channel, as a signed
/// percentage: +100 at the channel high, -100 at the low, 0 mid-channel.
struct BreakoutField {
    period: usize,
}

impl TrendField for BreakoutField {
    fn name(&self) -> String {
        format!("breakout_{}", self.period)
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn columns(&self, bars: &[Bar]) -> Vec<(String, Vec<f64>)> {
        let n = bars.len();
        let high = Donchian::upper(self.period).compute(bars);
        let low = Donchian::lower(self.period).compute(bars);

        let mut pos = vec![f64::NAN; n];
        for i in 0..n {
            if high[i].is_nan() || low[i].is_nan() {
                continue;
            }
            let width = high[i] - low[i];
            pos[i] = if width == 0.0 {
                // Degenerate channel: no range, no trend
                0.0
            } else {
                let mid = (high[i] + low[i]) / 2.0;
                (bars[i].close - mid) / width * 200.0
            };
        }

        vec![
            ("chan_high".into(), high),
            ("chan_low".into(), low),
            ("chan_pos".into(), pos),
        ]
    }

    fn score(&self, table: &IndicatorTable) -> Option<f64> {
        table.last("chan_pos")
    }
}
