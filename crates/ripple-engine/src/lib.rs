//! Regional investment shock engine.
//!
//! Estimates how a monetary investment injected into one sector of one
//! region ripples through the economy. The national effect comes from a
//! Leontief input-output model; a gravity model then spreads it over
//! regions by economic size and distance, and the result is converted into
//! value-added, tax and employment impact with per-metric legend classes.
//!
//! # Modules
//!
//! - [`coefficients`] -- Technical coefficients and the Leontief inverse.
//! - [`boundary`] -- Region boundaries parsed from GeoJSON.
//! - [`baseline`] -- Per-region, per-sector baseline joined on region key.
//! - [`synthetic`] -- Seeded synthetic baseline for when no statistics exist.
//! - [`propagation`] -- National impact of a demand shock.
//! - [`allocation`] -- Gravity allocation of national impact onto regions.
//! - [`conservation`] -- Post-allocation balance check.
//! - [`indicators`] -- Value-added, tax, employment and percent increase.
//! - [`classify`] -- Adaptive linear/logarithmic class breaks.
//! - [`simulation`] -- The [`Simulator`] pipeline tying it all together.
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//!
//! use ripple_engine::{CoefficientModel, RegionBoundary, RegionalBaseline, SimulationParams, Simulator};
//! use ripple_types::{EconomicRecord, RegionKey, Sector, SectorId, Shock};
//!
//! let model = CoefficientModel::from_rows(&[vec![0.2, 0.1], vec![0.05, 0.3]])?;
//! let boundaries = vec![RegionBoundary::from_point(RegionKey(1), "Capital", 0.0, 0.0)];
//! let records = vec![EconomicRecord {
//!     region: RegionKey(1),
//!     sector: SectorId(0),
//!     value_added: 1_000.0,
//!     employment: 120.0,
//!     businesses: 12,
//! }];
//! let baseline = RegionalBaseline::build(&boundaries, &records, 2)?;
//! let sectors = vec![
//!     Sector { id: SectorId(0), name: "Agriculture".into(), vab_coefficient: 0.75, employment_coefficient: 0.01 },
//!     Sector { id: SectorId(1), name: "Industry".into(), vab_coefficient: 0.6, employment_coefficient: 0.02 },
//! ];
//! let simulator = Simulator::new(
//!     Arc::new(model),
//!     Arc::new(baseline),
//!     sectors,
//!     &SimulationParams::default(),
//! )?;
//!
//! let result = simulator.run(&Shock { region: RegionKey(1), sector: SectorId(0), value: 100.0 })?;
//! assert!((result.sector_production(SectorId(0)) - 126.126).abs() < 1e-3);
//! # Ok::<(), ripple_engine::EngineError>(())
//! ```

pub mod allocation;
pub mod baseline;
pub mod boundary;
pub mod classify;
pub mod coefficients;
pub mod conservation;
pub mod error;
pub mod indicators;
pub mod propagation;
pub mod simulation;
pub mod synthetic;

// Re-export primary types at crate root.
pub use allocation::{Allocation, SpatialAllocator};
pub use baseline::{RegionBaseline, RegionalBaseline};
pub use boundary::{BoundaryFields, RegionBoundary, parse_geojson};
pub use classify::ImpactClassifier;
pub use coefficients::CoefficientModel;
pub use conservation::{AllocationAnomaly, ConservationResult, verify_allocation};
pub use error::EngineError;
pub use indicators::{IndicatorDeriver, employment_coefficients_from_baseline};
pub use propagation::ShockPropagator;
pub use simulation::{SimulationParams, Simulator};
pub use synthetic::{SectorProfile, synthesize};
