//! Download orchestrator — fetch tickers from a provider and write them into
//! the local store, with progress reporting.

use chrono::NaiveDate;

use super::provider::{DataError, FetchProgress, PriceProvider};
use super::store::NorgateStore;

/// Summary of a multi-ticker download.
#[derive(Debug)]
pub struct DownloadSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub errors: Vec<(String, DataError)>,
}

/// Fetch each ticker and persist it. Already-covered tickers are skipped
/// unless `force` is set.
pub fn download_tickers(
    provider: &dyn PriceProvider,
    store: &NorgateStore,
    tickers: &[&str],
    start: NaiveDate,
    end: NaiveDate,
    force: bool,
    progress: &dyn FetchProgress,
) -> DownloadSummary {
    let total = tickers.len();
    let mut succeeded = 0;
    let mut failed = 0;
    let mut errors: Vec<(String, DataError)> = Vec::new();

    for (i, ticker) in tickers.iter().enumerate() {
        progress.on_start(ticker, i, total);

        if !force && store.covers(ticker, start, end) {
            progress.on_complete(ticker, i, total, &Ok(()));
            succeeded += 1;
            continue;
        }

        let result = provider
            .fetch(ticker, start, end)
            .and_then(|series| store.write(&series, provider.name()));
        progress.on_complete(ticker, i, total, &result);

        match result {
            Ok(()) => succeeded += 1,
            Err(e) => {
                log::warn!("{ticker}: download failed: {e}");
                errors.push((ticker.to_string(), e));
                failed += 1;
            }
        }
    }

    progress.on_batch_complete(succeeded, failed, total);

    DownloadSummary {
        total,
        succeeded,
        failed,
        errors,
    }
}
