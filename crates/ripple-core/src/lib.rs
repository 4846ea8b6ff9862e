//! Configuration, data loading, and orchestration for the Ripple engine.
//!
//! This crate turns a `ripple-config.yaml` file into running simulations:
//!
//! ```text
//! RippleConfig --> loader (GeoJSON + JSON | synthetic) --> RegionalBaseline (memoized)
//!              --> CoefficientModel --> Simulator --> SimulationResult --> ScenarioBook
//! ```
//!
//! # Modules
//!
//! - [`config`] -- Typed YAML configuration with defaults and validation.
//! - [`loader`] -- Boundary and economic data readers.
//! - [`cache`] -- [`Memo`], a compute-once cache safe under concurrency.
//! - [`scenario`] -- [`ScenarioBook`], append-only named results with comparison.
//! - [`workbench`] -- [`Workbench`], which wires the pieces together.

pub mod cache;
pub mod config;
pub mod loader;
pub mod scenario;
pub mod workbench;

pub use cache::Memo;
pub use config::{ConfigError, RippleConfig};
pub use loader::{Dataset, LoadError};
pub use scenario::{ScenarioBook, ScenarioComparison, ScenarioError};
pub use workbench::{Workbench, WorkbenchError};
