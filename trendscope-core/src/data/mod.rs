//! Data acquisition: provider trait, concrete sources, local store,
//! sector taxonomy, download orchestration.

pub mod download;
pub mod provider;
pub mod store;
pub mod synthetic;
pub mod taxonomy;
pub mod yahoo;

pub use download::{download_tickers, DownloadSummary};
pub use provider::{DataError, FetchProgress, PriceProvider, SilentProgress, StdoutProgress};
pub use store::{NorgateStore, StoreMeta};
pub use synthetic::SyntheticProvider;
pub use taxonomy::{SectorTaxonomy, TaxonomyError};
pub use yahoo::YahooProvider;
