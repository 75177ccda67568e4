//! Sector taxonomy — the universe file.
//!
//! A TOML file of ordered `[[instruments]]` entries supplies each ticker's
//! display name, asset class, and sector labels at granularity levels 1-5.
//! The file's entry order is the canonical universe order, which is what a
//! `ticker_limit` pre-filter slices.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::{AssetClass, Instrument, SectorChain};

#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error("read universe file: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse universe TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("duplicate ticker '{0}' in universe")]
    DuplicateTicker(String),

    #[error("'{ticker}': {count} sector levels given, at most 5 allowed")]
    TooManyLevels { ticker: String, count: usize },
}

#[derive(Debug, Deserialize)]
struct TaxonomyFile {
    #[serde(default)]
    instruments: Vec<InstrumentEntry>,
}

#[derive(Debug, Deserialize)]
struct InstrumentEntry {
    ticker: String,
    name: String,
    asset_class: AssetClass,
    #[serde(default)]
    levels: Vec<String>,
}

/// Ticker → instrument metadata mapping with a canonical order.
#[derive(Debug, Clone)]
pub struct SectorTaxonomy {
    instruments: Vec<Instrument>,
    index: HashMap<String, usize>,
}

impl SectorTaxonomy {
    pub fn from_file(path: &Path) -> Result<Self, TaxonomyError> {
        Self::from_toml(&std::fs::read_to_string(path)?)
    }

    pub fn from_toml(content: &str) -> Result<Self, TaxonomyError> {
        let file: TaxonomyFile = toml::from_str(content)?;
        Self::from_entries(file.instruments)
    }

    fn from_entries(entries: Vec<InstrumentEntry>) -> Result<Self, TaxonomyError> {
        let mut instruments = Vec::with_capacity(entries.len());
        let mut index = HashMap::with_capacity(entries.len());

        for entry in entries {
            if entry.levels.len() > 5 {
                return Err(TaxonomyError::TooManyLevels {
                    ticker: entry.ticker,
                    count: entry.levels.len(),
                });
            }
            let mut levels: [Option<String>; 5] = Default::default();
            for (i, label) in entry.levels.into_iter().enumerate() {
                levels[i] = Some(label);
            }

            if index
                .insert(entry.ticker.clone(), instruments.len())
                .is_some()
            {
                return Err(TaxonomyError::DuplicateTicker(entry.ticker));
            }
            instruments.push(Instrument {
                ticker: entry.ticker,
                name: entry.name,
                asset_class: entry.asset_class,
                sectors: SectorChain::new(levels),
            });
        }

        Ok(Self { instruments, index })
    }

    pub fn get(&self, ticker: &str) -> Option<&Instrument> {
        self.index.get(ticker).map(|&i| &self.instruments[i])
    }

    /// Display name for a ticker, falling back to the ticker itself.
    pub fn display_name(&self, ticker: &str) -> String {
        self.get(ticker)
            .map(|i| i.name.clone())
            .unwrap_or_else(|| ticker.to_string())
    }

    /// Tickers in canonical (file) order.
    pub fn tickers(&self) -> Vec<&str> {
        self.instruments.iter().map(|i| i.ticker.as_str()).collect()
    }

    /// The first `limit` tickers in canonical order — the `ticker_limit`
    /// pre-filter. This truncates the universe before any scoring, so it
    /// changes which instruments can ever appear in the ranking.
    pub fn limited_tickers(&self, limit: Option<usize>) -> Vec<&str> {
        let all = self.tickers();
        match limit {
            Some(n) => all.into_iter().take(n).collect(),
            None => all,
        }
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    /// A small built-in futures/ETF universe for demos and offline runs.
    pub fn default_universe() -> Self {
        let toml_str = r#"
[[instruments]]
ticker = "CL"
name = "WTI Crude Oil"
asset_class = "commodity"
levels = ["Commodity", "Energy", "Petroleum", "Crude", "WTI Crude Oil"]

[[instruments]]
ticker = "NG"
name = "Natural Gas"
asset_class = "commodity"
levels = ["Commodity", "Energy", "Gas", "Natural Gas", "Henry Hub"]

[[instruments]]
ticker = "GC"
name = "Gold"
asset_class = "commodity"
levels = ["Commodity", "Metals", "Precious", "Gold", "Comex Gold"]

[[instruments]]
ticker = "SI"
name = "Silver"
asset_class = "commodity"
levels = ["Commodity", "Metals", "Precious", "Silver", "Comex Silver"]

[[instruments]]
ticker = "ZC"
name = "Corn"
asset_class = "commodity"
levels = ["Commodity", "Agriculture", "Grains", "Corn", "CBOT Corn"]

[[instruments]]
ticker = "ZW"
name = "Wheat"
asset_class = "commodity"
levels = ["Commodity", "Agriculture", "Grains", "Wheat", "CBOT Wheat"]

[[instruments]]
ticker = "ES"
name = "S&P 500 E-mini"
asset_class = "equity"
levels = ["Equity", "Index", "US Large Cap", "S&P 500", "E-mini"]

[[instruments]]
ticker = "NQ"
name = "Nasdaq 100 E-mini"
asset_class = "equity"
levels = ["Equity", "Index", "US Tech", "Nasdaq 100", "E-mini"]

[[instruments]]
ticker = "ZN"
name = "10Y T-Note"
asset_class = "rates"
levels = ["Rates", "Government", "US Treasury", "10 Year", "T-Note"]

[[instruments]]
ticker = "6E"
name = "Euro FX"
asset_class = "fx"
levels = ["FX", "Majors", "EURUSD", "Euro", "Euro FX"]

[[instruments]]
ticker = "SPY"
name = "SPDR S&P 500 ETF"
asset_class = "etf"
levels = ["ETF", "Equity", "US Large Cap", "S&P 500", "SPY"]

[[instruments]]
ticker = "QQQ"
name = "Invesco QQQ ETF"
asset_class = "etf"
levels = ["ETF", "Equity", "US Tech", "Nasdaq 100", "QQQ"]
"#;
        Self::from_toml(toml_str).expect("built-in universe is valid")
    }
}
