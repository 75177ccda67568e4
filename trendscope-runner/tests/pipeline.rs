//! End-to-end pipeline tests against stub and synthetic providers.

use std::collections::HashMap;

use chrono::NaiveDate;

use trendscope_core::data::{DataError, PriceProvider, SectorTaxonomy, SyntheticProvider};
use trendscope_core::domain::{Bar, PriceSeries};
use trendscope_core::fields::IndicatorKind;
use trendscope_core::returns::TenorSpec;
use trendscope_runner::{
    DateRange, PieTenor, ReturnsPipeline, RunParams, Source, TrendPipeline,
};
use trendscope_core::barometer::TrendFilter;

/// Provider serving canned close series, regardless of the requested range.
struct StubProvider {
    series: HashMap<String, Vec<f64>>,
}

impl StubProvider {
    fn new(series: &[(&str, Vec<f64>)]) -> Self {
        Self {
            series: series
                .iter()
                .map(|(t, v)| (t.to_string(), v.clone()))
                .collect(),
        }
    }
}

impl PriceProvider for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    fn fetch(
        &self,
        ticker: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<PriceSeries, DataError> {
        let closes = self
            .series
            .get(ticker)
            .ok_or_else(|| DataError::TickerNotFound {
                ticker: ticker.to_string(),
            })?;

        let base = NaiveDate::from_ymd_opt(2025, 2, 3).unwrap();
        let bars: Vec<Bar> = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                date: base + chrono::Duration::days(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000,
            })
            .collect();
        PriceSeries::new(ticker, bars).map_err(|e| DataError::Validation(e.to_string()))
    }
}

fn taxonomy() -> SectorTaxonomy {
    SectorTaxonomy::from_toml(
        r#"
[[instruments]]
ticker = "ALU"
name = "Aluminium"
asset_class = "commodity"
levels = ["Commodity", "Metals"]

[[instruments]]
ticker = "BRN"
name = "Brent Crude"
asset_class = "commodity"
levels = ["Commodity", "Energy"]

[[instruments]]
ticker = "COP"
name = "Copper"
asset_class = "commodity"
levels = ["Commodity", "Metals"]
"#,
    )
    .unwrap()
}

fn rising(len: usize) -> Vec<f64> {
    (0..len).map(|i| 100.0 + i as f64).collect()
}

fn falling(len: usize) -> Vec<f64> {
    (0..len).map(|i| 200.0 - i as f64).collect()
}

fn flat(len: usize) -> Vec<f64> {
    vec![100.0; len]
}

fn params(trend: TrendFilter, mkts: usize) -> RunParams {
    RunParams {
        indicator: IndicatorKind::PriceCross,
        pie_tenor: PieTenor::Single(10),
        trend,
        mkts,
        chart_mkts: 2,
        source: Source::Norgate,
        dates: DateRange::Explicit {
            start: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
        },
        ..Default::default()
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()
}

#[test]
fn strong_selects_up_trends_then_down_trends() {
    let provider = StubProvider::new(&[
        ("ALU", rising(60)),
        ("BRN", falling(60)),
        ("COP", flat(60)),
    ]);
    let taxonomy = taxonomy();
    let pipeline = TrendPipeline::new(&provider, &taxonomy);

    let result = pipeline
        .run_at(&params(TrendFilter::Strong, 2), today())
        .unwrap();

    assert_eq!(result.top_trends, vec!["ALU", "BRN"]);
    assert!(result.barometer.row("ALU").unwrap().trend_score > 0.0);
    assert!(result.barometer.row("BRN").unwrap().trend_score < 0.0);
}

#[test]
fn neutral_selects_the_flattest_market() {
    let provider = StubProvider::new(&[
        ("ALU", rising(60)),
        ("BRN", falling(60)),
        ("COP", flat(60)),
    ]);
    let taxonomy = taxonomy();
    let pipeline = TrendPipeline::new(&provider, &taxonomy);

    let result = pipeline
        .run_at(&params(TrendFilter::Neutral, 1), today())
        .unwrap();

    assert_eq!(result.top_trends, vec!["COP"]);
    assert_eq!(result.barometer.row("COP").unwrap().trend_score, 0.0);
}

#[test]
fn ticker_limit_truncates_the_universe_before_scoring() {
    // COP is the strongest trender but sits third in canonical order, so a
    // limit of 2 must exclude it no matter how strongly it trends.
    let provider = StubProvider::new(&[
        ("ALU", flat(60)),
        ("BRN", flat(60)),
        ("COP", rising(60)),
    ]);
    let taxonomy = taxonomy();
    let pipeline = TrendPipeline::new(&provider, &taxonomy);

    let mut p = params(TrendFilter::All, 10);
    p.ticker_limit = Some(2);
    let result = pipeline.run_at(&p, today()).unwrap();

    assert_eq!(result.barometer.len(), 2);
    assert!(result.barometer.row("ALU").is_some());
    assert!(result.barometer.row("BRN").is_some());
    assert!(result.barometer.row("COP").is_none());
}

#[test]
fn short_history_drops_the_ticker_not_the_run() {
    let provider = StubProvider::new(&[
        ("ALU", rising(60)),
        ("BRN", rising(5)),
        ("COP", flat(60)),
    ]);
    let taxonomy = taxonomy();
    let pipeline = TrendPipeline::new(&provider, &taxonomy);

    let result = pipeline
        .run_at(&params(TrendFilter::Up, 5), today())
        .unwrap();

    assert!(result.dropped.contains(&"BRN".to_string()));
    assert!(result.barometer.row("ALU").is_some());
    assert!(result.barometer.row("BRN").is_none());
}

#[test]
fn fetch_failure_drops_the_ticker_not_the_run() {
    // COP missing from the stub entirely
    let provider = StubProvider::new(&[("ALU", rising(60)), ("BRN", falling(60))]);
    let taxonomy = taxonomy();
    let pipeline = TrendPipeline::new(&provider, &taxonomy);

    let result = pipeline
        .run_at(&params(TrendFilter::Strong, 4), today())
        .unwrap();

    assert!(result.dropped.contains(&"COP".to_string()));
    assert_eq!(result.barometer.len(), 2);
}

#[test]
fn under_full_selection_returns_what_qualifies() {
    let provider = StubProvider::new(&[
        ("ALU", rising(60)),
        ("BRN", rising(60)),
        ("COP", rising(60)),
    ]);
    let taxonomy = taxonomy();
    let pipeline = TrendPipeline::new(&provider, &taxonomy);

    let result = pipeline
        .run_at(&params(TrendFilter::Down, 5), today())
        .unwrap();
    assert!(result.top_trends.is_empty());
}

#[test]
fn invalid_params_abort_before_any_fetch() {
    let provider = StubProvider::new(&[("ALU", rising(60))]);
    let taxonomy = taxonomy();
    let pipeline = TrendPipeline::new(&provider, &taxonomy);

    let mut p = params(TrendFilter::Up, 5);
    p.pie_tenor = PieTenor::Single(17);
    assert!(pipeline.run_at(&p, today()).is_err());

    let mut p = params(TrendFilter::Up, 5);
    p.sector_level = 9;
    assert!(pipeline.run_at(&p, today()).is_err());
}

#[test]
fn synthetic_universe_end_to_end() {
    let provider = SyntheticProvider::new(2025);
    let taxonomy = SectorTaxonomy::default_universe();
    let pipeline = TrendPipeline::new(&provider, &taxonomy);

    let p = RunParams {
        indicator: IndicatorKind::Adx,
        pie_tenor: PieTenor::Single(20),
        trend: TrendFilter::Strong,
        mkts: 6,
        chart_mkts: 4,
        source: Source::Synthetic,
        dates: DateRange::Lookback { lookback: 400 },
        ..Default::default()
    };
    let result = pipeline.run_at(&p, today()).unwrap();

    assert_eq!(result.barometer.len(), taxonomy.len());
    assert!(result.top_trends.len() <= 6);
    assert!(result.chart_trends.len() <= 4);
    assert_eq!(result.params_id, p.params_id());
    // Raw indicator values ride along with every row
    for row in &result.barometer.rows {
        assert!(row.raw.iter().any(|(name, _)| name == "adx"));
    }
}

#[test]
fn returns_pipeline_labels_rows_by_display_name() {
    let provider = StubProvider::new(&[
        ("ALU", rising(30)),
        ("BRN", falling(30)),
        ("COP", flat(30)),
    ]);
    let taxonomy = taxonomy();
    let pipeline = ReturnsPipeline::new(&provider, &taxonomy);

    let mut p = params(TrendFilter::Strong, 2);
    p.tenors = TenorSpec::new(
        vec![1, 5],
        vec![(1, 5)],
        vec![],
        vec![(1, "1D".into()), (5, "1W".into())],
    )
    .unwrap();
    let table = pipeline.run_at(&p, today()).unwrap();

    assert_eq!(table.labels, vec!["1D", "1W"]);
    let labels: Vec<&str> = table.rows.iter().map(|r| r.label.as_str()).collect();
    assert!(labels.contains(&"Aluminium"));
    assert!(labels.contains(&"Brent Crude"));

    // Rising 1 point per day from 100: 1D return of the last bar
    let alu = table
        .rows
        .iter()
        .find(|r| r.label == "Aluminium")
        .unwrap();
    let expected_1d = (129.0 - 128.0) / 128.0 * 100.0;
    assert!((alu.values[0] - expected_1d).abs() < 1e-9);
}
