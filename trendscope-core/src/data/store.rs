//! Local price store — the `norgate` source.
//!
//! A directory of Parquet partitions, one per ticker, standing in for a
//! vendor-local market database:
//!
//! Layout: `{root}/ticker={TICKER}/bars.parquet` + `meta.json` sidecar.
//! Writes are atomic (write to .tmp, rename into place). Reads validate the
//! schema and row count before handing bars to the pipeline.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::provider::{DataError, PriceProvider};
use crate::domain::{Bar, PriceSeries};

/// Metadata sidecar for a stored ticker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreMeta {
    pub ticker: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub bar_count: usize,
    pub source: String,
    pub stored_at: chrono::NaiveDateTime,
}

/// The Parquet-backed price store.
pub struct NorgateStore {
    root: PathBuf,
}

impl NorgateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn ticker_dir(&self, ticker: &str) -> PathBuf {
        self.root.join(format!("ticker={ticker}"))
    }

    fn bars_path(&self, ticker: &str) -> PathBuf {
        self.ticker_dir(ticker).join("bars.parquet")
    }

    fn meta_path(&self, ticker: &str) -> PathBuf {
        self.ticker_dir(ticker).join("meta.json")
    }

    /// Write a ticker's full history, replacing any previous partition.
    pub fn write(&self, series: &PriceSeries, source: &str) -> Result<(), DataError> {
        let bars = series.bars();
        if bars.is_empty() {
            return Err(DataError::Store("no bars to store".into()));
        }

        let dir = self.ticker_dir(series.ticker());
        fs::create_dir_all(&dir).map_err(|e| DataError::Store(format!("create dir: {e}")))?;

        let df = bars_to_dataframe(bars)?;
        let path = self.bars_path(series.ticker());
        let tmp = path.with_extension("parquet.tmp");

        write_parquet(&df, &tmp)?;
        fs::rename(&tmp, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            DataError::Store(format!("atomic rename failed: {e}"))
        })?;

        let meta = StoreMeta {
            ticker: series.ticker().to_string(),
            start_date: series.first_date(),
            end_date: series.last_date(),
            bar_count: bars.len(),
            source: source.to_string(),
            stored_at: chrono::Local::now().naive_local(),
        };
        let meta_json = serde_json::to_string_pretty(&meta)
            .map_err(|e| DataError::Store(format!("meta serialization: {e}")))?;
        fs::write(self.meta_path(series.ticker()), meta_json)
            .map_err(|e| DataError::Store(format!("meta write: {e}")))?;

        Ok(())
    }

    /// Load a ticker's full stored history.
    pub fn load(&self, ticker: &str) -> Result<Vec<Bar>, DataError> {
        let path = self.bars_path(ticker);
        if !path.exists() {
            return Err(DataError::NoStoredData {
                ticker: ticker.to_string(),
            });
        }

        let file =
            fs::File::open(&path).map_err(|e| DataError::Store(format!("open parquet: {e}")))?;
        let df = ParquetReader::new(file)
            .finish()
            .map_err(|e| DataError::Store(format!("read parquet: {e}")))?;

        if df.height() == 0 {
            return Err(DataError::Validation(format!(
                "empty parquet partition for {ticker}"
            )));
        }
        for col in ["date", "open", "high", "low", "close", "volume"] {
            if df.column(col).is_err() {
                return Err(DataError::Validation(format!("missing column '{col}'")));
            }
        }

        let mut bars = dataframe_to_bars(&df)?;
        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    /// Metadata for a stored ticker, if present.
    pub fn meta(&self, ticker: &str) -> Option<StoreMeta> {
        let content = fs::read_to_string(self.meta_path(ticker)).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Whether the stored range fully covers `[start, end]`.
    pub fn covers(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> bool {
        self.meta(ticker)
            .map(|m| m.start_date <= start && m.end_date >= end)
            .unwrap_or(false)
    }

    /// Tickers present in the store, sorted.
    pub fn tickers(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.root) else {
            return Vec::new();
        };
        let mut out: Vec<String> = entries
            .flatten()
            .filter_map(|e| {
                let name = e.file_name().into_string().ok()?;
                name.strip_prefix("ticker=").map(String::from)
            })
            .collect();
        out.sort();
        out
    }
}

impl PriceProvider for NorgateStore {
    fn name(&self) -> &str {
        "norgate"
    }

    fn fetch(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, DataError> {
        let bars: Vec<Bar> = self
            .load(ticker)?
            .into_iter()
            .filter(|b| b.date >= start && b.date <= end)
            .collect();

        if bars.is_empty() {
            return Err(DataError::NoStoredData {
                ticker: ticker.to_string(),
            });
        }
        PriceSeries::new(ticker, bars).map_err(|e| DataError::Validation(e.to_string()))
    }
}

// ── Parquet I/O helpers ─────────────────────────────────────────────

fn bars_to_dataframe(bars: &[Bar]) -> Result<DataFrame, DataError> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    let dates: Vec<i32> = bars
        .iter()
        .map(|b| (b.date - epoch).num_days() as i32)
        .collect();
    let opens: Vec<f64> = bars.iter().map(|b| b.open).collect();
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<u64> = bars.iter().map(|b| b.volume).collect();

    DataFrame::new(vec![
        Column::new("date".into(), dates)
            .cast(&DataType::Date)
            .map_err(|e| DataError::Store(format!("date cast: {e}")))?,
        Column::new("open".into(), opens),
        Column::new("high".into(), highs),
        Column::new("low".into(), lows),
        Column::new("close".into(), closes),
        Column::new("volume".into(), volumes),
    ])
    .map_err(|e| DataError::Store(format!("dataframe creation: {e}")))
}

fn write_parquet(df: &DataFrame, path: &Path) -> Result<(), DataError> {
    let file =
        fs::File::create(path).map_err(|e| DataError::Store(format!("create file: {e}")))?;
    ParquetWriter::new(file)
        .finish(&mut df.clone())
        .map_err(|e| DataError::Store(format!("write parquet: {e}")))?;
    Ok(())
}

fn dataframe_to_bars(df: &DataFrame) -> Result<Vec<Bar>, DataError> {
    let col_err = |e: PolarsError| DataError::Store(format!("column read: {e}"));

    let date_ca = df
        .column("date")
        .map_err(col_err)?
        .date()
        .map_err(|e| DataError::Store(format!("date column type: {e}")))?;
    let open_ca = df
        .column("open")
        .map_err(col_err)?
        .f64()
        .map_err(|e| DataError::Store(format!("open column type: {e}")))?;
    let high_ca = df
        .column("high")
        .map_err(col_err)?
        .f64()
        .map_err(|e| DataError::Store(format!("high column type: {e}")))?;
    let low_ca = df
        .column("low")
        .map_err(col_err)?
        .f64()
        .map_err(|e| DataError::Store(format!("low column type: {e}")))?;
    let close_ca = df
        .column("close")
        .map_err(col_err)?
        .f64()
        .map_err(|e| DataError::Store(format!("close column type: {e}")))?;
    let vol_ca = df
        .column("volume")
        .map_err(col_err)?
        .u64()
        .map_err(|e| DataError::Store(format!("volume column type: {e}")))?;

    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    let n = df.height();
    let mut bars = Vec::with_capacity(n);

    for i in 0..n {
        let date_days = date_ca
            .get(i)
            .ok_or_else(|| DataError::Store(format!("null date at row {i}")))?;
        bars.push(Bar {
            date: epoch + chrono::Duration::days(date_days as i64),
            open: open_ca.get(i).unwrap_or(f64::NAN),
            high: high_ca.get(i).unwrap_or(f64::NAN),
            low: low_ca.get(i).unwrap_or(f64::NAN),
            close: close_ca.get(i).unwrap_or(f64::NAN),
            volume: vol_ca.get(i).unwrap_or(0),
        });
    }

    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_series() -> PriceSeries {
        let bars = vec![
            Bar {
                date: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
                open: 100.0,
                high: 102.0,
                low: 99.0,
                close: 101.0,
                volume: 1000,
            },
            Bar {
                date: NaiveDate::from_ymd_opt(2025, 1, 3).unwrap(),
                open: 101.0,
                high: 103.0,
                low: 100.0,
                close: 102.0,
                volume: 1100,
            },
            Bar {
                date: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
                open: 102.0,
                high: 104.0,
                low: 101.0,
                close: 103.0,
                volume: 1200,
            },
        ];
        PriceSeries::new("CL", bars).unwrap()
    }

    #[test]
    fn write_then_load_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let store = NorgateStore::new(dir.path());
        store.write(&sample_series(), "test").unwrap();

        let bars = store.load("CL").unwrap();
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].close, 101.0);
        assert_eq!(bars[2].date, NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());
    }

    #[test]
    fn meta_sidecar_records_range() {
        let dir = tempfile::tempdir().unwrap();
        let store = NorgateStore::new(dir.path());
        store.write(&sample_series(), "yahoo").unwrap();

        let meta = store.meta("CL").unwrap();
        assert_eq!(meta.bar_count, 3);
        assert_eq!(meta.source, "yahoo");
        assert!(store.covers(
            "CL",
            NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
        ));
        assert!(!store.covers(
            "CL",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
        ));
    }

    #[test]
    fn fetch_filters_the_date_range() {
        let dir = tempfile::tempdir().unwrap();
        let store = NorgateStore::new(dir.path());
        store.write(&sample_series(), "test").unwrap();

        let series = store
            .fetch(
                "CL",
                NaiveDate::from_ymd_opt(2025, 1, 3).unwrap(),
                NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
            )
            .unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.first_date(), NaiveDate::from_ymd_opt(2025, 1, 3).unwrap());
    }

    #[test]
    fn missing_ticker_is_no_stored_data() {
        let dir = tempfile::tempdir().unwrap();
        let store = NorgateStore::new(dir.path());
        assert!(matches!(
            store.load("NOPE"),
            Err(DataError::NoStoredData { .. })
        ));
    }

    #[test]
    fn tickers_lists_partitions() {
        let dir = tempfile::tempdir().unwrap();
        let store = NorgateStore::new(dir.path());
        store.write(&sample_series(), "test").unwrap();
        assert_eq!(store.tickers(), vec!["CL".to_string()]);
    }
}
