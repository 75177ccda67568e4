//! Multi-horizon percentage returns over a close-price panel.
//!
//! Day-count tenors use pure index offsets. Week and month tenors first try
//! the exact calendar-offset date; when that date is absent from the index
//! (holiday, weekend, not enough history) they fall back to the tenor's
//! trading-day count. The fallback is deliberate: a holiday must not discard
//! the instrument's row.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::PriceSeries;

#[derive(Debug, Error)]
pub enum ReturnsError {
    #[error("tenor key {0} has no label")]
    MissingLabel(u32),

    #[error("label '{0}' is mapped to more than one tenor key")]
    DuplicateLabel(String),

    #[error("tenor spec declares no horizons")]
    EmptySpec,

    #[error("close history is empty after forward-fill and trim")]
    EmptyHistory,

    #[error("'{label}': {rows} rows of history cannot cover a {days}-day return")]
    InsufficientHistory {
        label: String,
        rows: usize,
        days: u32,
    },
}

/// Which horizons are measured and how their columns are labelled.
///
/// `weeks` and `months` pair a calendar count with the trading-day key used
/// both for the fallback arithmetic and the label lookup. Labels are emitted
/// in declaration order: days, then weeks, then months.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenorSpec {
    days: Vec<u32>,
    weeks: Vec<(u32, u32)>,
    months: Vec<(u32, u32)>,
    labels: Vec<(u32, String)>,
}

impl TenorSpec {
    pub fn new(
        days: Vec<u32>,
        weeks: Vec<(u32, u32)>,
        months: Vec<(u32, u32)>,
        labels: Vec<(u32, String)>,
    ) -> Result<Self, ReturnsError> {
        let spec = Self {
            days,
            weeks,
            months,
            labels,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Check the label map: at least one horizon, every referenced day key
    /// labelled, no label reused across keys. Deserialized specs must be
    /// revalidated by their consumer.
    pub fn validate(&self) -> Result<(), ReturnsError> {
        if self.days.is_empty() && self.weeks.is_empty() && self.months.is_empty() {
            return Err(ReturnsError::EmptySpec);
        }

        let mut seen = BTreeSet::new();
        for (_, label) in &self.labels {
            if !seen.insert(label.as_str()) {
                return Err(ReturnsError::DuplicateLabel(label.clone()));
            }
        }

        for key in self.referenced_keys() {
            if self.label(key).is_none() {
                return Err(ReturnsError::MissingLabel(key));
            }
        }
        Ok(())
    }

    fn referenced_keys(&self) -> Vec<u32> {
        self.days
            .iter()
            .copied()
            .chain(self.weeks.iter().map(|&(_, d)| d))
            .chain(self.months.iter().map(|&(_, d)| d))
            .collect()
    }

    pub fn label(&self, day_key: u32) -> Option<&str> {
        self.labels
            .iter()
            .find(|(k, _)| *k == day_key)
            .map(|(_, l)| l.as_str())
    }

    /// Column labels in declaration order (days, then weeks, then months).
    /// A label shared between a day count and a calendar tenor appears once,
    /// at its first position.
    pub fn ordered_labels(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for key in self.referenced_keys() {
            if let Some(label) = self.label(key) {
                if !out.contains(&label) {
                    out.push(label);
                }
            }
        }
        out
    }

    /// Largest trading-day count any horizon can fall back to.
    pub fn max_day_key(&self) -> u32 {
        self.referenced_keys().into_iter().max().unwrap_or(0)
    }

    pub fn days(&self) -> &[u32] {
        &self.days
    }

    pub fn weeks(&self) -> &[(u32, u32)] {
        &self.weeks
    }

    pub fn months(&self) -> &[(u32, u32)] {
        &self.months
    }
}

impl Default for TenorSpec {
    /// The standard horizon ladder: 1 day, 1-2 weeks, 1/3/6/12 months.
    fn default() -> Self {
        Self::new(
            vec![1],
            vec![(1, 5), (2, 10)],
            vec![(1, 21), (3, 63), (6, 126), (12, 252)],
            vec![
                (1, "1D".into()),
                (5, "1W".into()),
                (10, "2W".into()),
                (21, "1M".into()),
                (63, "3M".into()),
                (126, "6M".into()),
                (252, "1Y".into()),
            ],
        )
        .expect("default tenor spec is valid")
    }
}

/// Date-indexed close panel: one column per instrument on a shared axis,
/// forward-filled, with incomplete leading rows trimmed.
#[derive(Debug, Clone)]
pub struct CloseHistory {
    dates: Vec<NaiveDate>,
    columns: Vec<(String, Vec<f64>)>,
}

impl CloseHistory {
    /// Build the panel from per-instrument series, keyed by display label.
    pub fn from_series<'a>(
        labelled: impl IntoIterator<Item = (String, &'a PriceSeries)>,
    ) -> Result<Self, ReturnsError> {
        let labelled: Vec<(String, &PriceSeries)> = labelled.into_iter().collect();

        let mut axis = BTreeSet::new();
        for (_, series) in &labelled {
            for bar in series.bars() {
                axis.insert(bar.date);
            }
        }
        let dates: Vec<NaiveDate> = axis.into_iter().collect();

        let mut columns = Vec::with_capacity(labelled.len());
        for (label, series) in labelled {
            let by_date: BTreeMap<NaiveDate, f64> =
                series.bars().iter().map(|b| (b.date, b.close)).collect();

            let mut col = Vec::with_capacity(dates.len());
            let mut last = f64::NAN;
            for date in &dates {
                if let Some(&close) = by_date.get(date) {
                    if !close.is_nan() {
                        last = close;
                    }
                }
                col.push(last);
            }
            columns.push((label, col));
        }

        // Drop leading rows where any column is still unfilled
        let first_complete = (0..dates.len())
            .find(|&i| columns.iter().all(|(_, col)| !col[i].is_nan()))
            .ok_or(ReturnsError::EmptyHistory)?;

        Ok(Self {
            dates: dates[first_complete..].to_vec(),
            columns: columns
                .into_iter()
                .map(|(label, col)| (label, col[first_complete..].to_vec()))
                .collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn labels(&self) -> Vec<&str> {
        self.columns.iter().map(|(l, _)| l.as_str()).collect()
    }

    fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }
}

/// One instrument's returns, aligned to the table's label order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnRecord {
    pub label: String,
    pub values: Vec<f64>,
}

/// Per-instrument returns across every tenor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnsTable {
    pub labels: Vec<String>,
    pub rows: Vec<ReturnRecord>,
}

/// Compute the full returns table for a close panel.
pub fn compute_returns(
    history: &CloseHistory,
    tenor: &TenorSpec,
) -> Result<ReturnsTable, ReturnsError> {
    tenor.validate()?;
    if history.is_empty() {
        return Err(ReturnsError::EmptyHistory);
    }
    let last_idx = history.len() - 1;
    let last_date = history.dates[last_idx];

    let labels: Vec<String> = tenor
        .ordered_labels()
        .into_iter()
        .map(String::from)
        .collect();
    let column_of = |day_key: u32| -> usize {
        let label = tenor.label(day_key).expect("validated at construction");
        labels.iter().position(|l| l == label).expect("label emitted")
    };

    let mut rows = Vec::with_capacity(history.columns.len());
    for (label, closes) in &history.columns {
        let mut values = vec![f64::NAN; labels.len()];

        let index_return = |day_key: u32| -> Result<f64, ReturnsError> {
            let offset = day_key as usize;
            if offset > last_idx {
                return Err(ReturnsError::InsufficientHistory {
                    label: label.clone(),
                    rows: history.len(),
                    days: day_key,
                });
            }
            let then = closes[last_idx - offset];
            Ok((closes[last_idx] - then) / then * 100.0)
        };

        let calendar_return = |target: Option<NaiveDate>, day_key: u32| -> Result<f64, ReturnsError> {
            if let Some(idx) = target.and_then(|d| history.index_of(d)) {
                let then = closes[idx];
                return Ok((closes[last_idx] - then) / then * 100.0);
            }
            log::debug!(
                "{label}: calendar date {target:?} not in index, falling back to {day_key} trading days"
            );
            index_return(day_key)
        };

        // A calendar tenor sharing a day key with a plain day count writes
        // the same column; the calendar value wins, as in a keyed table
        for &d in &tenor.days {
            values[column_of(d)] = index_return(d)?;
        }
        for &(w, day_key) in &tenor.weeks {
            let target = last_date.checked_sub_signed(Duration::weeks(w as i64));
            values[column_of(day_key)] = calendar_return(target, day_key)?;
        }
        for &(m, day_key) in &tenor.months {
            let target = last_date.checked_sub_months(Months::new(m));
            values[column_of(day_key)] = calendar_return(target, day_key)?;
        }

        rows.push(ReturnRecord {
            label: label.clone(),
            values,
        });
    }

    Ok(ReturnsTable { labels, rows })
}
