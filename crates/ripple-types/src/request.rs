//! Simulation request types supplied by the caller.
//!
//! A request names the origin region, the sector, and the size of the
//! shock. The engine resolves it against the loaded baseline into a
//! validated [`Shock`](crate::Shock).

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::RegionKey;

/// How the origin region of a request is identified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum RegionSelector {
    /// Official region code. This is the steady-state way to refer to a region.
    Key(RegionKey),
    /// Region name, matched exactly after trimming and case folding.
    /// Kept for legacy callers that only have names.
    Name(String),
}

/// Size of the demand shock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum ShockValue {
    /// An absolute monetary value.
    Absolute(f64),
    /// A percentage of the origin region's baseline value-added in the
    /// chosen sector.
    PercentOfBaseline(f64),
}

/// A caller's request to simulate one shock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SimulationRequest {
    /// Origin region.
    pub region: RegionSelector,
    /// Sector name, matched case-insensitively against the sector table.
    pub sector: String,
    /// Size of the shock.
    pub value: ShockValue,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn request_parses_from_json() {
        let json = r#"{
            "region": {"key": 350001},
            "sector": "Industry",
            "value": {"absolute": 100.0}
        }"#;
        let request: SimulationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.region, RegionSelector::Key(RegionKey(350_001)));
        assert_eq!(request.value, ShockValue::Absolute(100.0));
    }

    #[test]
    fn request_accepts_legacy_name() {
        let json = r#"{
            "region": {"name": "Campinas"},
            "sector": "services",
            "value": {"percent_of_baseline": 10.0}
        }"#;
        let request: SimulationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.region, RegionSelector::Name(String::from("Campinas")));
        assert_eq!(request.value, ShockValue::PercentOfBaseline(10.0));
    }
}
