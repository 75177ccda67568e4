//! Pipeline orchestration.
//!
//! One `TrendPipeline::run` sequences a whole barometer run: resolve dates,
//! pre-filter the universe, fetch raw prices, clean out instruments with
//! insufficient history, generate indicator fields (in parallel across
//! instruments), reduce to the barometer, and select the top trends. Any
//! stage error aborts the run; there is no partial or resumable state.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rayon::prelude::*;
use thiserror::Error;

use trendscope_core::barometer::{generate_trend_strength, top_trend_calc, Barometer};
use trendscope_core::data::{DataError, PriceProvider, SectorTaxonomy};
use trendscope_core::domain::PriceSeries;
use trendscope_core::fields::{FieldError, IndicatorTable};

use crate::config::{ConfigError, RunParams};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("universe is empty after the ticker_limit pre-filter")]
    EmptyUniverse,

    #[error("no instrument has usable history for {field}")]
    NoUsableHistory { field: String },

    #[error(transparent)]
    Field(#[from] FieldError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Returns(#[from] trendscope_core::returns::ReturnsError),
}

/// Everything a run produces, handed to external chart shaping as plain
/// tables.
#[derive(Debug)]
pub struct PipelineResult {
    pub params_id: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Cross-sectional trend-strength table, unsorted.
    pub barometer: Barometer,
    /// Ordered selection sized for barchart/linegraph contexts (`mkts`).
    pub top_trends: Vec<String>,
    /// Ordered selection sized for the market-chart context (`chart_mkts`).
    pub chart_trends: Vec<String>,
    /// Per-instrument indicator tables behind the barometer.
    pub tables: BTreeMap<String, IndicatorTable>,
    /// Tickers dropped along the way (fetch failure or short history).
    pub dropped: Vec<String>,
}

/// The barometer pipeline: provider and taxonomy in, tables out.
pub struct TrendPipeline<'a> {
    provider: &'a dyn PriceProvider,
    taxonomy: &'a SectorTaxonomy,
}

impl<'a> TrendPipeline<'a> {
    pub fn new(provider: &'a dyn PriceProvider, taxonomy: &'a SectorTaxonomy) -> Self {
        Self { provider, taxonomy }
    }

    /// Run with today's date as the lookback anchor.
    pub fn run(&self, params: &RunParams) -> Result<PipelineResult, PipelineError> {
        self.run_at(params, chrono::Local::now().date_naive())
    }

    /// Run with an explicit "today", for reproducible tests.
    pub fn run_at(
        &self,
        params: &RunParams,
        today: NaiveDate,
    ) -> Result<PipelineResult, PipelineError> {
        params.validate()?;
        let field = params.field()?;
        let (start, end) = params.dates.resolve(today);

        // ticker_limit is a pre-filter: it truncates the universe in
        // canonical taxonomy order before anything is fetched or scored,
        // so it changes which instruments can ever appear in the ranking.
        let tickers = self.taxonomy.limited_tickers(params.ticker_limit);
        if tickers.is_empty() {
            return Err(PipelineError::EmptyUniverse);
        }
        log::info!(
            "run {}: {} {} over {} tickers, {start}..{end}",
            &params.params_id()[..12],
            params.indicator,
            field.name(),
            tickers.len()
        );

        let mut dropped = Vec::new();

        // Acquisition: per-ticker failures drop the ticker, not the run
        let mut raw: BTreeMap<String, PriceSeries> = BTreeMap::new();
        for ticker in tickers {
            match self.provider.fetch(ticker, start, end) {
                Ok(series) => match series.prepared() {
                    Some(prepared) => {
                        raw.insert(ticker.to_string(), prepared);
                    }
                    None => {
                        log::warn!("{ticker}: no complete bars after forward-fill, dropping");
                        dropped.push(ticker.to_string());
                    }
                },
                Err(e) => {
                    log::warn!("{ticker}: fetch failed, dropping: {e}");
                    dropped.push(ticker.to_string());
                }
            }
        }

        // Ticker cleaning: a series shorter than the field's warm-up can
        // never produce a row
        let (clean, short) = ticker_clean(raw, field.lookback() + 1);
        for ticker in &short {
            log::warn!("{ticker}: history shorter than {} bars, dropping", field.lookback() + 1);
        }
        dropped.extend(short);

        if clean.is_empty() {
            return Err(PipelineError::NoUsableHistory { field: field.name() });
        }

        // Field generation: instruments are independent, fan out and merge
        let enriched: Vec<Result<(String, IndicatorTable), FieldError>> = clean
            .par_iter()
            .map(|(ticker, series)| Ok((ticker.clone(), field.enrich(series)?)))
            .collect();

        let mut tables = BTreeMap::new();
        for result in enriched {
            match result {
                Ok((ticker, table)) => {
                    tables.insert(ticker, table);
                }
                Err(FieldError::InsufficientHistory { ticker, .. }) => {
                    log::warn!("{ticker}: insufficient history at enrich time, dropping");
                    dropped.push(ticker);
                }
                Err(e) => return Err(e.into()),
            }
        }
        if tables.is_empty() {
            return Err(PipelineError::NoUsableHistory { field: field.name() });
        }

        let barometer = generate_trend_strength(field.as_ref(), &tables, self.taxonomy);
        log::info!(
            "barometer: {} rows, {} dropped",
            barometer.len(),
            dropped.len()
        );

        let top_trends = top_trend_calc(&barometer, params.trend, params.mkts);
        let chart_trends = top_trend_calc(&barometer, params.trend, params.chart_mkts);

        Ok(PipelineResult {
            params_id: params.params_id(),
            start,
            end,
            barometer,
            top_trends,
            chart_trends,
            tables,
            dropped,
        })
    }
}

/// Split a universe into series long enough for `min_rows` and the tickers
/// that fall short.
pub fn ticker_clean(
    raw: BTreeMap<String, PriceSeries>,
    min_rows: usize,
) -> (BTreeMap<String, PriceSeries>, Vec<String>) {
    let mut clean = BTreeMap::new();
    let mut short = Vec::new();
    for (ticker, series) in raw {
        if series.len() >= min_rows {
            clean.insert(ticker, series);
        } else {
            short.push(ticker);
        }
    }
    (clean, short)
}

#[cfg(test)]
mod tests {
    use super::*;
    use trendscope_core::domain::Bar;

    fn series(ticker: &str, len: usize) -> PriceSeries {
        let base = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let bars = (0..len)
            .map(|i| Bar {
                date: base + chrono::Duration::days(i as i64),
                open: 100.0,
                high: 101.0,
                low: 99.0,
                close: 100.0,
                volume: 1000,
            })
            .collect();
        PriceSeries::new(ticker, bars).unwrap()
    }

    #[test]
    fn ticker_clean_splits_on_length() {
        let mut raw = BTreeMap::new();
        raw.insert("LONG".to_string(), series("LONG", 50));
        raw.insert("SHORT".to_string(), series("SHORT", 5));

        let (clean, short) = ticker_clean(raw, 20);
        assert!(clean.contains_key("LONG"));
        assert_eq!(short, vec!["SHORT".to_string()]);
    }

    #[test]
    fn ticker_clean_keeps_exact_boundary() {
        let mut raw = BTreeMap::new();
        raw.insert("EDGE".to_string(), series("EDGE", 20));
        let (clean, short) = ticker_clean(raw, 20);
        assert!(clean.contains_key("EDGE"));
        assert!(short.is_empty());
    }
}
