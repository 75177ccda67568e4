//! trendscope runner — run configuration, pipeline orchestration, export.

pub mod config;
pub mod export;
pub mod pipeline;
pub mod returns_run;

pub use config::{ConfigError, DateRange, PieTenor, RunParams, Source};
pub use export::{barometer_to_csv, returns_to_csv, save_artifacts, ExportError};
pub use pipeline::{ticker_clean, PipelineError, PipelineResult, TrendPipeline};
pub use returns_run::ReturnsPipeline;
