//! Returns pipeline — the lateral path.
//!
//! Independent of the barometer: builds one close-price panel for the whole
//! universe and computes the multi-horizon returns table from it. Shares the
//! provider and taxonomy seams with the trend pipeline but none of its
//! tables.

use chrono::NaiveDate;

use trendscope_core::data::{PriceProvider, SectorTaxonomy};
use trendscope_core::domain::PriceSeries;
use trendscope_core::returns::{compute_returns, CloseHistory, ReturnsTable};

use crate::config::RunParams;
use crate::pipeline::PipelineError;

pub struct ReturnsPipeline<'a> {
    provider: &'a dyn PriceProvider,
    taxonomy: &'a SectorTaxonomy,
}

impl<'a> ReturnsPipeline<'a> {
    pub fn new(provider: &'a dyn PriceProvider, taxonomy: &'a SectorTaxonomy) -> Self {
        Self { provider, taxonomy }
    }

    pub fn run(&self, params: &RunParams) -> Result<ReturnsTable, PipelineError> {
        self.run_at(params, chrono::Local::now().date_naive())
    }

    pub fn run_at(
        &self,
        params: &RunParams,
        today: NaiveDate,
    ) -> Result<ReturnsTable, PipelineError> {
        params.validate()?;
        let (start, end) = params.dates.resolve(today);

        let tickers = self.taxonomy.limited_tickers(params.ticker_limit);
        if tickers.is_empty() {
            return Err(PipelineError::EmptyUniverse);
        }
        log::info!("returns run over {} tickers, {start}..{end}", tickers.len());

        // Fetch the whole universe; failures drop the column, not the run
        let mut fetched: Vec<(String, PriceSeries)> = Vec::new();
        for ticker in tickers {
            match self.provider.fetch(ticker, start, end) {
                Ok(series) => {
                    fetched.push((self.taxonomy.display_name(ticker), series));
                }
                Err(e) => {
                    log::warn!("{ticker}: fetch failed, dropping from returns: {e}");
                }
            }
        }

        let history =
            CloseHistory::from_series(fetched.iter().map(|(label, s)| (label.clone(), s)))?;
        log::info!(
            "close panel: {} rows x {} instruments",
            history.len(),
            history.labels().len()
        );

        Ok(compute_returns(&history, &params.tenors)?)
    }
}
