//! Cross-sectional trend-strength barometer and top-trend selection.
//!
//! `generate_trend_strength` reduces every instrument's indicator table to
//! one signed score and joins sector metadata. `top_trend_calc` turns the
//! unsorted barometer into an ordered ticker selection per the requested
//! trend direction. Sorting lives here, not in the barometer itself.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::taxonomy::SectorTaxonomy;
use crate::domain::SectorChain;
use crate::fields::{IndicatorTable, TrendField};

/// Direction filter for the top-trend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendFilter {
    Up,
    Down,
    Neutral,
    Strong,
    All,
}

#[derive(Debug, Error)]
#[error("unknown trend filter '{0}'")]
pub struct ParseTrendError(String);

impl FromStr for TrendFilter {
    type Err = ParseTrendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(TrendFilter::Up),
            "down" => Ok(TrendFilter::Down),
            "neutral" => Ok(TrendFilter::Neutral),
            "strong" => Ok(TrendFilter::Strong),
            "all" => Ok(TrendFilter::All),
            other => Err(ParseTrendError(other.to_string())),
        }
    }
}

impl fmt::Display for TrendFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrendFilter::Up => "up",
            TrendFilter::Down => "down",
            TrendFilter::Neutral => "neutral",
            TrendFilter::Strong => "strong",
            TrendFilter::All => "all",
        };
        f.write_str(s)
    }
}

/// One instrument's row in the barometer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarometerRow {
    pub ticker: String,
    pub name: String,
    pub sectors: SectorChain,
    /// Signed score: sign is direction, magnitude is strength. Comparable
    /// across instruments (percentage/ratio based, never price units).
    pub trend_score: f64,
    /// Last-row values of the indicator columns that produced the score.
    pub raw: Vec<(String, f64)>,
}

/// The cross-sectional table, one row per instrument, unsorted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Barometer {
    pub indicator: String,
    pub rows: Vec<BarometerRow>,
}

impl Barometer {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, ticker: &str) -> Option<&BarometerRow> {
        self.rows.iter().find(|r| r.ticker == ticker)
    }
}

/// Reduce indicator tables to the barometer, joining sector metadata.
///
/// Instruments missing from the taxonomy are kept with null sector labels.
/// Rows whose score is non-finite are dropped.
pub fn generate_trend_strength(
    field: &dyn TrendField,
    tables: &BTreeMap<String, IndicatorTable>,
    taxonomy: &SectorTaxonomy,
) -> Barometer {
    let mut rows = Vec::with_capacity(tables.len());

    for (ticker, table) in tables {
        let Some(score) = field.score(table) else {
            log::warn!("{ticker}: empty indicator table, skipping");
            continue;
        };
        if !score.is_finite() {
            log::warn!("{ticker}: non-finite trend score, skipping");
            continue;
        }

        let (name, sectors) = match taxonomy.get(ticker) {
            Some(inst) => (inst.name.clone(), inst.sectors.clone()),
            None => {
                log::debug!("{ticker}: no taxonomy entry, sector labels left null");
                (ticker.clone(), SectorChain::default())
            }
        };

        rows.push(BarometerRow {
            ticker: ticker.clone(),
            name,
            sectors,
            trend_score: score,
            raw: table.last_row(),
        });
    }

    Barometer {
        indicator: field.name(),
        rows,
    }
}

/// Ordered top-trend ticker selection.
///
/// `count` bounds the result; when fewer instruments pass the direction
/// filter, all that qualify are returned. Equal scores break by ticker.
pub fn top_trend_calc(barometer: &Barometer, trend: TrendFilter, count: usize) -> Vec<String> {
    match trend {
        TrendFilter::Up => select_up(barometer, count),
        TrendFilter::Down => select_down(barometer, count),
        TrendFilter::Neutral => select_neutral(barometer, count, &[]),
        TrendFilter::Strong => {
            // Up-trends first, then down-trends; halves rounded so the
            // up half takes the odd slot
            let up_half = count.div_ceil(2);
            let down_half = count / 2;
            let mut picks = select_up(barometer, up_half);
            picks.extend(select_down(barometer, down_half));
            picks
        }
        TrendFilter::All => {
            let third = count.div_ceil(3);
            let mut picks = select_up(barometer, third);
            picks.extend(select_down(barometer, third));
            picks.truncate(count);
            // Neutral fills the remainder, skipping tickers already chosen
            let remaining = count - picks.len();
            picks.extend(select_neutral(barometer, remaining, &picks));
            picks
        }
    }
}

fn select_up(barometer: &Barometer, count: usize) -> Vec<String> {
    let mut rows: Vec<(&str, f64)> = barometer
        .rows
        .iter()
        .filter(|r| r.trend_score > 0.0)
        .map(|r| (r.ticker.as_str(), r.trend_score))
        .collect();
    rows.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });
    rows.into_iter()
        .take(count)
        .map(|(t, _)| t.to_string())
        .collect()
}

fn select_down(barometer: &Barometer, count: usize) -> Vec<String> {
    let mut rows: Vec<(&str, f64)> = barometer
        .rows
        .iter()
        .filter(|r| r.trend_score < 0.0)
        .map(|r| (r.ticker.as_str(), r.trend_score))
        .collect();
    rows.sort_by(|a, b| {
        a.1.partial_cmp(&b.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });
    rows.into_iter()
        .take(count)
        .map(|(t, _)| t.to_string())
        .collect()
}

fn select_neutral(barometer: &Barometer, count: usize, exclude: &[String]) -> Vec<String> {
    let mut rows: Vec<(&str, f64)> = barometer
        .rows
        .iter()
        .filter(|r| !exclude.iter().any(|t| t == &r.ticker))
        .map(|r| (r.ticker.as_str(), r.trend_score))
        .collect();
    rows.sort_by(|a, b| {
        a.1.abs()
            .partial_cmp(&b.1.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });
    rows.into_iter()
        .take(count)
        .map(|(t, _)| t.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_row(ticker: &str, score: f64) -> BarometerRow {
        BarometerRow {
            ticker: ticker.to_string(),
            name: ticker.to_string(),
            sectors: SectorChain::default(),
            trend_score: score,
            raw: vec![],
        }
    }

    fn barometer(scores: &[(&str, f64)]) -> Barometer {
        Barometer {
            indicator: "adx_20".into(),
            rows: scores.iter().map(|&(t, s)| bare_row(t, s)).collect(),
        }
    }

    #[test]
    fn up_is_positive_descending() {
        let b = barometer(&[("A", 8.2), ("B", -6.1), ("C", 0.3), ("D", 4.0)]);
        assert_eq!(top_trend_calc(&b, TrendFilter::Up, 10), vec!["A", "D", "C"]);
        assert_eq!(top_trend_calc(&b, TrendFilter::Up, 2), vec!["A", "D"]);
    }

    #[test]
    fn down_is_most_negative_first() {
        let b = barometer(&[("A", 8.2), ("B", -6.1), ("C", -0.3), ("D", -12.0)]);
        assert_eq!(
            top_trend_calc(&b, TrendFilter::Down, 10),
            vec!["D", "B", "C"]
        );
    }

    #[test]
    fn neutral_is_nearest_zero() {
        let b = barometer(&[("A", 8.2), ("B", -6.1), ("C", 0.3)]);
        assert_eq!(top_trend_calc(&b, TrendFilter::Neutral, 1), vec!["C"]);
        assert_eq!(
            top_trend_calc(&b, TrendFilter::Neutral, 3),
            vec!["C", "B", "A"]
        );
    }

    #[test]
    fn strong_partitions_up_then_down() {
        let b = barometer(&[("A", 8.2), ("B", -6.1), ("C", 0.3)]);
        assert_eq!(top_trend_calc(&b, TrendFilter::Strong, 2), vec!["A", "B"]);
    }

    #[test]
    fn strong_odd_count_gives_extra_slot_to_up() {
        let b = barometer(&[("A", 8.2), ("B", -6.1), ("C", 0.3), ("D", -1.0), ("E", 2.0)]);
        // 3 slots: 2 up, 1 down
        assert_eq!(
            top_trend_calc(&b, TrendFilter::Strong, 3),
            vec!["A", "E", "B"]
        );
    }

    #[test]
    fn under_full_direction_returns_all_that_qualify() {
        let b = barometer(&[("A", 8.2), ("B", 1.0)]);
        assert_eq!(top_trend_calc(&b, TrendFilter::Down, 5), Vec::<String>::new());
        assert_eq!(top_trend_calc(&b, TrendFilter::Up, 5), vec!["A", "B"]);
    }

    #[test]
    fn zero_scores_are_neither_up_nor_down() {
        let b = barometer(&[("A", 0.0), ("B", 1.0), ("C", -1.0)]);
        assert_eq!(top_trend_calc(&b, TrendFilter::Up, 5), vec!["B"]);
        assert_eq!(top_trend_calc(&b, TrendFilter::Down, 5), vec!["C"]);
    }

    #[test]
    fn ties_break_by_ticker() {
        let b = barometer(&[("ZZ", 5.0), ("AA", 5.0), ("MM", 5.0)]);
        assert_eq!(
            top_trend_calc(&b, TrendFilter::Up, 3),
            vec!["AA", "MM", "ZZ"]
        );
    }

    #[test]
    fn all_concatenates_without_duplicates() {
        let b = barometer(&[
            ("A", 8.2),
            ("B", -6.1),
            ("C", 0.3),
            ("D", 4.0),
            ("E", -2.0),
            ("F", 0.1),
        ]);
        let picks = top_trend_calc(&b, TrendFilter::All, 6);
        assert_eq!(picks.len(), 6);
        let mut unique = picks.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 6, "selection must not repeat tickers: {picks:?}");
        // Up pair first, then down pair, then the closest-to-zero leftovers
        assert_eq!(picks[0], "A");
        assert_eq!(picks[2], "B");
    }
}
