//! trendscope CLI — download, rank, and returns commands.
//!
//! Commands:
//! - `download` — fetch daily history from Yahoo Finance into the local store
//! - `rank` — run the barometer pipeline and print the top trending markets
//! - `returns` — compute the multi-horizon returns table for the universe

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use trendscope_core::data::{
    download_tickers, NorgateStore, PriceProvider, SectorTaxonomy, StdoutProgress,
    SyntheticProvider, YahooProvider,
};
use trendscope_runner::{
    returns_to_csv, save_artifacts, DateRange, PieTenor, ReturnsPipeline, RunParams, Source,
    TrendPipeline,
};

#[derive(Parser)]
#[command(
    name = "trendscope",
    about = "trendscope CLI — cross-sectional trend-strength barometer"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download daily history from Yahoo Finance into the local store.
    Download {
        /// Tickers to download (e.g., CL GC SPY). Defaults to the universe.
        tickers: Vec<String>,

        /// Start date (YYYY-MM-DD). Defaults to 3 years ago.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Re-download even when the store already covers the range.
        #[arg(long, default_value_t = false)]
        force: bool,

        /// Store directory.
        #[arg(long, default_value = "data")]
        store_dir: PathBuf,

        /// Universe TOML file. Defaults to the built-in universe.
        #[arg(long)]
        universe: Option<PathBuf>,
    },
    /// Run the barometer pipeline and print the top trending markets.
    Rank {
        /// Run config TOML file; other options are ignored when set.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Indicator family: adx, ma_cross, price_cross, rsi, breakout.
        #[arg(long, default_value = "adx")]
        indicator: String,

        /// Indicator tenor: a window (e.g. 20) or 'short,long' for ma_cross.
        #[arg(long, default_value = "20")]
        tenor: String,

        /// Trend filter: up, down, neutral, strong, all.
        #[arg(long, default_value = "strong")]
        trend: String,

        /// Number of markets to select.
        #[arg(long, default_value_t = 20)]
        mkts: usize,

        /// Number of markets for the market-chart selection.
        #[arg(long, default_value_t = 10)]
        chart_mkts: usize,

        /// Sector granularity for display, 1 (coarsest) to 5 (finest).
        #[arg(long, default_value_t = 2)]
        sector_level: u8,

        /// Only consider the first N tickers of the universe.
        #[arg(long)]
        ticker_limit: Option<usize>,

        /// Data source: norgate, yahoo, synthetic.
        #[arg(long, default_value = "norgate")]
        source: String,

        /// Start date (YYYY-MM-DD); requires --end.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD); requires --start.
        #[arg(long)]
        end: Option<String>,

        /// Days of history when no explicit dates are given.
        #[arg(long)]
        lookback: Option<u32>,

        /// Universe TOML file. Defaults to the built-in universe.
        #[arg(long)]
        universe: Option<PathBuf>,

        /// Store directory (for the norgate source).
        #[arg(long, default_value = "data")]
        store_dir: PathBuf,

        /// Write barometer.csv, top_trends.json, params.json here.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Compute the multi-horizon returns table for the universe.
    Returns {
        /// Data source: norgate, yahoo, synthetic.
        #[arg(long, default_value = "norgate")]
        source: String,

        /// Start date (YYYY-MM-DD); requires --end.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD); requires --start.
        #[arg(long)]
        end: Option<String>,

        /// Days of history when no explicit dates are given.
        #[arg(long)]
        lookback: Option<u32>,

        /// Only consider the first N tickers of the universe.
        #[arg(long)]
        ticker_limit: Option<usize>,

        /// Universe TOML file. Defaults to the built-in universe.
        #[arg(long)]
        universe: Option<PathBuf>,

        /// Store directory (for the norgate source).
        #[arg(long, default_value = "data")]
        store_dir: PathBuf,

        /// Write the returns table as CSV here.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Download {
            tickers,
            start,
            end,
            force,
            store_dir,
            universe,
        } => cmd_download(tickers, start, end, force, &store_dir, universe),
        Commands::Rank {
            config,
            indicator,
            tenor,
            trend,
            mkts,
            chart_mkts,
            sector_level,
            ticker_limit,
            source,
            start,
            end,
            lookback,
            universe,
            store_dir,
            output_dir,
        } => {
            let params = match config {
                Some(path) => {
                    let content = std::fs::read_to_string(&path)
                        .with_context(|| format!("read config {}", path.display()))?;
                    RunParams::from_toml(&content)?
                }
                None => assemble_params(
                    &indicator,
                    &tenor,
                    &trend,
                    mkts,
                    chart_mkts,
                    sector_level,
                    ticker_limit,
                    &source,
                    start,
                    end,
                    lookback,
                )?,
            };
            cmd_rank(&params, universe, &store_dir, output_dir)
        }
        Commands::Returns {
            source,
            start,
            end,
            lookback,
            ticker_limit,
            universe,
            store_dir,
            output,
        } => {
            let params = RunParams {
                source: source.parse()?,
                dates: DateRange::from_options(
                    parse_opt_date(start)?,
                    parse_opt_date(end)?,
                    lookback,
                    500,
                )?,
                ticker_limit,
                ..Default::default()
            };
            params.validate()?;
            cmd_returns(&params, universe, &store_dir, output)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn assemble_params(
    indicator: &str,
    tenor: &str,
    trend: &str,
    mkts: usize,
    chart_mkts: usize,
    sector_level: u8,
    ticker_limit: Option<usize>,
    source: &str,
    start: Option<String>,
    end: Option<String>,
    lookback: Option<u32>,
) -> Result<RunParams> {
    let params = RunParams {
        indicator: indicator.parse()?,
        pie_tenor: PieTenor::parse(tenor)?,
        trend: trend.parse()?,
        mkts,
        chart_mkts,
        sector_level,
        ticker_limit,
        source: source.parse()?,
        dates: DateRange::from_options(
            parse_opt_date(start)?,
            parse_opt_date(end)?,
            lookback,
            500,
        )?,
        ..Default::default()
    };
    params.validate()?;
    Ok(params)
}

fn parse_opt_date(s: Option<String>) -> Result<Option<NaiveDate>> {
    s.map(|s| {
        NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .with_context(|| format!("invalid date '{s}', expected YYYY-MM-DD"))
    })
    .transpose()
}

fn load_taxonomy(universe: Option<PathBuf>) -> Result<SectorTaxonomy> {
    match universe {
        Some(path) => SectorTaxonomy::from_file(&path)
            .with_context(|| format!("load universe {}", path.display())),
        None => Ok(SectorTaxonomy::default_universe()),
    }
}

fn build_provider(source: Source, store_dir: &Path) -> Box<dyn PriceProvider> {
    match source {
        Source::Norgate => Box::new(NorgateStore::new(store_dir)),
        Source::Yahoo => Box::new(YahooProvider::new()),
        Source::Synthetic => Box::new(SyntheticProvider::new(2025)),
    }
}

fn cmd_download(
    tickers: Vec<String>,
    start: Option<String>,
    end: Option<String>,
    force: bool,
    store_dir: &Path,
    universe: Option<PathBuf>,
) -> Result<()> {
    let taxonomy = load_taxonomy(universe)?;
    let tickers: Vec<String> = if tickers.is_empty() {
        taxonomy.tickers().iter().map(|t| t.to_string()).collect()
    } else {
        tickers
    };

    let today = chrono::Local::now().date_naive();
    let end = parse_opt_date(end)?.unwrap_or(today);
    let start = parse_opt_date(start)?.unwrap_or(end - chrono::Duration::days(3 * 365));

    let provider = YahooProvider::new();
    let store = NorgateStore::new(store_dir);
    let ticker_refs: Vec<&str> = tickers.iter().map(|t| t.as_str()).collect();

    let summary = download_tickers(
        &provider,
        &store,
        &ticker_refs,
        start,
        end,
        force,
        &StdoutProgress,
    );

    if summary.failed > 0 {
        bail!("{} of {} downloads failed", summary.failed, summary.total);
    }
    Ok(())
}

fn cmd_rank(
    params: &RunParams,
    universe: Option<PathBuf>,
    store_dir: &Path,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let taxonomy = load_taxonomy(universe)?;
    let provider = build_provider(params.source, store_dir);

    let pipeline = TrendPipeline::new(provider.as_ref(), &taxonomy);
    let result = pipeline.run(params)?;

    println!(
        "Barometer: {} ({} instruments, {} dropped, {} .. {})",
        result.barometer.indicator,
        result.barometer.len(),
        result.dropped.len(),
        result.start,
        result.end
    );
    println!();
    println!(
        "Top {} markets, trend = {}:",
        result.top_trends.len(),
        params.trend
    );
    println!(
        "{:<4} {:<8} {:<28} {:<20} {:>10}",
        "#", "ticker", "name", "sector", "score"
    );
    for (i, ticker) in result.top_trends.iter().enumerate() {
        if let Some(row) = result.barometer.row(ticker) {
            println!(
                "{:<4} {:<8} {:<28} {:<20} {:>10.2}",
                i + 1,
                row.ticker,
                row.name,
                row.sectors.level(params.sector_level).unwrap_or("-"),
                row.trend_score
            );
        }
    }

    if let Some(dir) = output_dir {
        save_artifacts(&result, params, &dir)?;
        println!("\nArtifacts written to {}", dir.display());
    }
    Ok(())
}

fn cmd_returns(
    params: &RunParams,
    universe: Option<PathBuf>,
    store_dir: &Path,
    output: Option<PathBuf>,
) -> Result<()> {
    let taxonomy = load_taxonomy(universe)?;
    let provider = build_provider(params.source, store_dir);

    let pipeline = ReturnsPipeline::new(provider.as_ref(), &taxonomy);
    let table = pipeline.run(params)?;

    print!("{:<28}", "instrument");
    for label in &table.labels {
        print!(" {label:>8}");
    }
    println!();
    for row in &table.rows {
        print!("{:<28}", row.label);
        for value in &row.values {
            print!(" {value:>7.2}%");
        }
        println!();
    }

    if let Some(path) = output {
        returns_to_csv(&table, &path)?;
        println!("\nReturns table written to {}", path.display());
    }
    Ok(())
}
