//! Shared type definitions for the Ripple regional impact engine.
//!
//! This crate is the single source of truth for the values that cross the
//! engine boundary: identifiers, sectors, baseline records, requests, and
//! the simulation result table. Types flow to `TypeScript` via `ts-rs` for
//! the external dashboard.
//!
//! # Modules
//!
//! - [`ids`] -- Region codes, sector indices, and simulation identifiers
//! - [`enums`] -- Metrics, binning modes, baseline provenance
//! - [`structs`] -- Sectors, shocks, baseline profiles, and result tables
//! - [`request`] -- Simulation requests as supplied by callers

pub mod enums;
pub mod ids;
pub mod request;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{BaselineSource, BinningMode, Metric};
pub use ids::{RegionKey, SectorId, SimulationId};
pub use request::{RegionSelector, ShockValue, SimulationRequest};
pub use structs::{
    ClassBreaks, EconomicRecord, ImpactRecord, ImpactTotals, MetricClasses, MetricValues,
    RegionImpact, RegionProfile, Sector, SectorBaseline, Shock, SimulationResult, Substitution,
};

#[cfg(test)]
mod tests {
    //! Integration tests for `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // Exporting writes the bindings to the `bindings/` directory
        // relative to the crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::SimulationId::export_all();
        let _ = crate::ids::RegionKey::export_all();
        let _ = crate::ids::SectorId::export_all();

        // Enums
        let _ = crate::enums::Metric::export_all();
        let _ = crate::enums::BinningMode::export_all();
        let _ = crate::enums::BaselineSource::export_all();

        // Structs
        let _ = crate::structs::Sector::export_all();
        let _ = crate::structs::Shock::export_all();
        let _ = crate::structs::EconomicRecord::export_all();
        let _ = crate::structs::SectorBaseline::export_all();
        let _ = crate::structs::RegionProfile::export_all();
        let _ = crate::structs::Substitution::export_all();
        let _ = crate::structs::MetricValues::export_all();
        let _ = crate::structs::MetricClasses::export_all();
        let _ = crate::structs::ImpactRecord::export_all();
        let _ = crate::structs::RegionImpact::export_all();
        let _ = crate::structs::ClassBreaks::export_all();
        let _ = crate::structs::ImpactTotals::export_all();
        let _ = crate::structs::SimulationResult::export_all();

        // Requests
        let _ = crate::request::RegionSelector::export_all();
        let _ = crate::request::ShockValue::export_all();
        let _ = crate::request::SimulationRequest::export_all();
    }
}
