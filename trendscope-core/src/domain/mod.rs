//! Domain types for trendscope.

pub mod bar;
pub mod instrument;
pub mod series;

pub use bar::Bar;
pub use instrument::{AssetClass, Instrument, SectorChain};
pub use series::{PriceSeries, SeriesError};

/// Ticker symbol type alias.
pub type Ticker = String;
