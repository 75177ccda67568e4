//! PriceSeries — an instrument's ordered daily price history.
//!
//! Invariants enforced at construction: dates strictly increasing, no
//! duplicates. Gap handling is explicit: `prepared()` forward-fills void
//! fields from the previous bar and trims any leading rows that remain
//! incomplete, so downstream consumers only ever see complete bars.

use super::bar::Bar;
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("{ticker}: empty price series")]
    Empty { ticker: String },

    #[error("{ticker}: dates not strictly increasing at {date}")]
    OutOfOrder { ticker: String, date: NaiveDate },
}

/// Ordered-by-date bar history for a single instrument. Read-only after
/// construction; one instance per pipeline run.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    ticker: String,
    bars: Vec<Bar>,
}

impl PriceSeries {
    /// Build a series, validating the date axis.
    pub fn new(ticker: impl Into<String>, bars: Vec<Bar>) -> Result<Self, SeriesError> {
        let ticker = ticker.into();
        if bars.is_empty() {
            return Err(SeriesError::Empty { ticker });
        }
        for pair in bars.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(SeriesError::OutOfOrder {
                    ticker,
                    date: pair[1].date,
                });
            }
        }
        Ok(Self { ticker, bars })
    }

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

    pub fn first_date(&self) -> NaiveDate {
        self.bars[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.bars[self.bars.len() - 1].date
    }

    /// Close prices in date order.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Forward-fill void fields from the previous bar, then drop any leading
    /// bars that are still incomplete. Returns `None` if nothing survives.
    pub fn prepared(mut self) -> Option<Self> {
        for i in 1..self.bars.len() {
            let prev = self.bars[i - 1].clone();
            let bar = &mut self.bars[i];
            if bar.open.is_nan() {
                bar.open = prev.open;
            }
            if bar.high.is_nan() {
                bar.high = prev.high;
            }
            if bar.low.is_nan() {
                bar.low = prev.low;
            }
            if bar.close.is_nan() {
                bar.close = prev.close;
            }
        }

        let first_complete = self.bars.iter().position(|b| !b.is_void())?;
        self.bars.drain(..first_complete);
        Some(self)
    }
}
