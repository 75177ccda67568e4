//! Instrument metadata: ticker, display name, asset class, sector chain.

use serde::{Deserialize, Serialize};

/// Broad asset classification of an instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    Commodity,
    Equity,
    Fx,
    Rates,
    Etf,
}

/// Sector taxonomy labels at granularity levels 1 (coarsest) through 5
/// (finest, usually the security itself). Any level may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorChain {
    pub levels: [Option<String>; 5],
}

impl SectorChain {
    pub fn new(levels: [Option<String>; 5]) -> Self {
        Self { levels }
    }

    /// Label at granularity `level`, 1-based per the taxonomy convention.
    pub fn level(&self, level: u8) -> Option<&str> {
        match level {
            1..=5 => self.levels[(level - 1) as usize].as_deref(),
            _ => None,
        }
    }

    pub fn is_unclassified(&self) -> bool {
        self.levels.iter().all(|l| l.is_none())
    }
}

/// A tradable instrument as the taxonomy describes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instrument {
    pub ticker: String,
    pub name: String,
    pub asset_class: AssetClass,
    pub sectors: SectorChain,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crude() -> Instrument {
        Instrument {
            ticker: "CL".into(),
            name: "WTI Crude Oil".into(),
            asset_class: AssetClass::Commodity,
            sectors: SectorChain::new([
                Some("Commodity".into()),
                Some("Energy".into()),
                Some("Petroleum".into()),
                Some("Crude".into()),
                Some("WTI Crude Oil".into()),
            ]),
        }
    }

    #[test]
    fn level_lookup_is_one_based() {
        let inst = crude();
        assert_eq!(inst.sectors.level(1), Some("Commodity"));
        assert_eq!(inst.sectors.level(5), Some("WTI Crude Oil"));
        assert_eq!(inst.sectors.level(0), None);
        assert_eq!(inst.sectors.level(6), None);
    }

    #[test]
    fn empty_chain_is_unclassified() {
        assert!(SectorChain::default().is_unclassified());
        assert!(!crude().sectors.is_unclassified());
    }

    #[test]
    fn asset_class_serde_uses_snake_case() {
        let json = serde_json::to_string(&AssetClass::Commodity).unwrap();
        assert_eq!(json, "\"commodity\"");
        let back: AssetClass = serde_json::from_str("\"etf\"").unwrap();
        assert_eq!(back, AssetClass::Etf);
    }
}
