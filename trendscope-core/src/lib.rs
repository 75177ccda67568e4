//! trendscope core — cross-sectional trend-strength analytics.
//!
//! The crate turns raw per-instrument daily price tables into:
//! - per-instrument indicator tables (one indicator family per run),
//! - a single cross-sectional "barometer" of signed trend-strength scores,
//! - ordered top-trend selections filtered by direction,
//! - and, on an independent path, multi-horizon percentage returns.
//!
//! Data flows one direction: raw prices → indicator tables → barometer →
//! selection. Acquisition (Yahoo, the local store, synthetic data) and the
//! sector taxonomy live behind trait seams in [`data`]; rendering is out of
//! scope entirely.

pub mod barometer;
pub mod data;
pub mod domain;
pub mod fields;
pub mod indicators;
pub mod returns;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: the types that cross the runner's rayon fan-out
    /// are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::PriceSeries>();
        require_sync::<domain::PriceSeries>();
        require_send::<domain::Instrument>();
        require_sync::<domain::Instrument>();
        require_send::<fields::IndicatorTable>();
        require_sync::<fields::IndicatorTable>();
        require_send::<barometer::Barometer>();
        require_sync::<barometer::Barometer>();
        require_send::<returns::ReturnsTable>();
        require_sync::<returns::ReturnsTable>();
    }

    /// Architecture contract: `TrendField` is a pure transformation seam.
    ///
    /// `columns` and `score` take only price/table data — no provider, no
    /// taxonomy, no parameters. If the trait grows a side-channel, this
    /// stops compiling and the change becomes a conscious one.
    #[test]
    fn trend_field_trait_is_data_in_data_out() {
        fn _check_trait_object_builds(
            field: &dyn fields::TrendField,
            bars: &[domain::Bar],
            table: &fields::IndicatorTable,
        ) -> Option<f64> {
            let _ = field.columns(bars);
            field.score(table)
        }
    }
}
