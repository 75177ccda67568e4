//! Immutable, validated run configuration.
//!
//! One `RunParams` value is constructed per run — from a TOML file or CLI
//! options — validated up front, and passed by reference into each stage.
//! Nothing mutates it afterwards. A content-addressed `params_id` identifies
//! the run in artifacts and logs.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use trendscope_core::barometer::TrendFilter;
use trendscope_core::fields::{
    build_field, FieldError, IndicatorKind, MaKind, TrendField, MA_CROSS_PAIRS, SINGLE_TENORS,
};
use trendscope_core::returns::{ReturnsError, TenorSpec};

/// Where the price data comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Norgate,
    Yahoo,
    Synthetic,
}

impl FromStr for Source {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "norgate" => Ok(Source::Norgate),
            "yahoo" => Ok(Source::Yahoo),
            "synthetic" => Ok(Source::Synthetic),
            other => Err(ConfigError::UnknownSource(other.to_string())),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Source::Norgate => "norgate",
            Source::Yahoo => "yahoo",
            Source::Synthetic => "synthetic",
        })
    }
}

/// Indicator tenor: a single window, or a (short, long) pair for ma_cross.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PieTenor {
    Single(u32),
    Pair(u32, u32),
}

impl PieTenor {
    /// Parse "20" or "10,50".
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        if let Some((short, long)) = s.split_once(',') {
            let short = short
                .trim()
                .parse()
                .map_err(|_| ConfigError::MalformedPieTenor(s.to_string()))?;
            let long = long
                .trim()
                .parse()
                .map_err(|_| ConfigError::MalformedPieTenor(s.to_string()))?;
            Ok(PieTenor::Pair(short, long))
        } else {
            s.trim()
                .parse()
                .map(PieTenor::Single)
                .map_err(|_| ConfigError::MalformedPieTenor(s.to_string()))
        }
    }
}

/// The run's date window: explicit bounds, or a lookback from today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateRange {
    Explicit {
        #[serde(rename = "start_date")]
        start: NaiveDate,
        #[serde(rename = "end_date")]
        end: NaiveDate,
    },
    Lookback {
        lookback: u32,
    },
}

impl DateRange {
    /// Combine optional CLI/TOML inputs, rejecting conflicting and
    /// incomplete combinations. With nothing supplied, fall back to
    /// `default_lookback` days.
    pub fn from_options(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        lookback: Option<u32>,
        default_lookback: u32,
    ) -> Result<Self, ConfigError> {
        match (start, end, lookback) {
            (None, None, None) => Ok(DateRange::Lookback {
                lookback: default_lookback,
            }),
            (None, None, Some(days)) => Ok(DateRange::Lookback { lookback: days }),
            (Some(start), Some(end), None) => Ok(DateRange::Explicit { start, end }),
            (Some(_), None, None) | (None, Some(_), None) => Err(ConfigError::IncompleteDates),
            _ => Err(ConfigError::ConflictingDates),
        }
    }

    /// Concrete (start, end) bounds for a run happening `today`.
    pub fn resolve(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        match *self {
            DateRange::Explicit { start, end } => (start, end),
            DateRange::Lookback { lookback } => {
                (today - Duration::days(lookback as i64), today)
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown source '{0}'; choose from norgate, yahoo, synthetic")]
    UnknownSource(String),

    #[error("malformed pie_tenor '{0}'; expected an integer or 'short,long'")]
    MalformedPieTenor(String),

    #[error("{indicator} takes a single tenor from {SINGLE_TENORS:?}, got a pair")]
    PairForSingleIndicator { indicator: IndicatorKind },

    #[error("ma_cross takes a (short, long) pair from {MA_CROSS_PAIRS:?}, got a single tenor")]
    SingleForPairIndicator,

    #[error("sector_level must be 1..=5, got {0}")]
    SectorLevelOutOfRange(u8),

    #[error("{0} must be positive")]
    NonPositive(&'static str),

    #[error("start_date/end_date conflict with lookback; supply one or the other")]
    ConflictingDates,

    #[error("explicit dates need both start_date and end_date")]
    IncompleteDates,

    #[error("start_date {start} is not before end_date {end}")]
    StartNotBeforeEnd { start: NaiveDate, end: NaiveDate },

    #[error(transparent)]
    Field(#[from] FieldError),

    #[error(transparent)]
    Tenor(#[from] ReturnsError),

    #[error("parse run config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Everything a single run needs, validated and immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunParams {
    pub indicator: IndicatorKind,
    pub pie_tenor: PieTenor,
    #[serde(default)]
    pub ma_kind: MaKind,
    pub sector_level: u8,
    pub trend: TrendFilter,
    pub mkts: usize,
    pub chart_mkts: usize,
    #[serde(default)]
    pub ticker_limit: Option<usize>,
    pub source: Source,
    #[serde(flatten)]
    pub dates: DateRange,
    #[serde(default)]
    pub tenors: TenorSpec,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            indicator: IndicatorKind::Adx,
            pie_tenor: PieTenor::Single(20),
            ma_kind: MaKind::Simple,
            sector_level: 2,
            trend: TrendFilter::Strong,
            mkts: 20,
            chart_mkts: 10,
            ticker_limit: None,
            source: Source::Norgate,
            dates: DateRange::Lookback { lookback: 500 },
            tenors: TenorSpec::default(),
        }
    }
}

impl RunParams {
    /// Parse and validate a TOML run file.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let params: RunParams = toml::from_str(content)?;
        params.validate()?;
        Ok(params)
    }

    /// Check every option the pipeline relies on. Called before a run
    /// starts; a failure here means the run never starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match (self.indicator, self.pie_tenor) {
            (IndicatorKind::MaCross, PieTenor::Single(_)) => {
                return Err(ConfigError::SingleForPairIndicator);
            }
            (IndicatorKind::MaCross, PieTenor::Pair(short, long)) => {
                if !MA_CROSS_PAIRS.contains(&(short, long)) {
                    return Err(FieldError::UnsupportedPair(short, long).into());
                }
            }
            (indicator, PieTenor::Pair(_, _)) => {
                return Err(ConfigError::PairForSingleIndicator { indicator });
            }
            (_, PieTenor::Single(tenor)) => {
                if !SINGLE_TENORS.contains(&tenor) {
                    return Err(FieldError::UnsupportedTenor(tenor).into());
                }
            }
        }

        if !(1..=5).contains(&self.sector_level) {
            return Err(ConfigError::SectorLevelOutOfRange(self.sector_level));
        }
        if self.mkts == 0 {
            return Err(ConfigError::NonPositive("mkts"));
        }
        if self.chart_mkts == 0 {
            return Err(ConfigError::NonPositive("chart_mkts"));
        }
        if self.ticker_limit == Some(0) {
            return Err(ConfigError::NonPositive("ticker_limit"));
        }
        match self.dates {
            DateRange::Explicit { start, end } if start >= end => {
                return Err(ConfigError::StartNotBeforeEnd { start, end });
            }
            DateRange::Lookback { lookback } if lookback == 0 => {
                return Err(ConfigError::NonPositive("lookback"));
            }
            _ => {}
        }
        self.tenors.validate()?;

        Ok(())
    }

    /// The indicator-family strategy object this run uses.
    pub fn field(&self) -> Result<Box<dyn TrendField>, ConfigError> {
        let (single, pair) = match self.pie_tenor {
            PieTenor::Single(t) => (Some(t), None),
            PieTenor::Pair(s, l) => (None, Some((s, l))),
        };
        Ok(build_field(self.indicator, single, pair, self.ma_kind)?)
    }

    /// Deterministic content hash identifying this configuration.
    pub fn params_id(&self) -> String {
        let json = serde_json::to_string(self).expect("RunParams serialization cannot fail");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}
