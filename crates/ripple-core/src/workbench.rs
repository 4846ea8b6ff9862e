//! Orchestration: configuration in, simulation results out.
//!
//! The [`Workbench`] owns the coefficient model built from configuration
//! and a [`Memo`] of regional baselines keyed by data source, so data files
//! are read and joined once no matter how many simulations run.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use ripple_engine::{
    CoefficientModel, EngineError, RegionalBaseline, Simulator, employment_coefficients_from_baseline,
};
use ripple_types::{RegionKey, RegionProfile, Sector, SectorId, SimulationRequest, SimulationResult};

use crate::cache::Memo;
use crate::config::{ConfigError, RippleConfig};
use crate::loader::{LoadError, load_dataset};
use crate::scenario::{ScenarioBook, ScenarioError};

/// Errors surfaced by the workbench.
#[derive(Debug, thiserror::Error)]
pub enum WorkbenchError {
    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Input data could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The engine rejected the model, data, or request.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// A scenario could not be recorded or found.
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
}

/// Identifies one data configuration for baseline caching.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DataKey {
    /// Resolved boundary file.
    pub boundaries: PathBuf,
    /// Resolved economic data file, if any.
    pub economic_data: Option<PathBuf>,
    /// Region code property.
    pub key_property: String,
    /// Region name property.
    pub name_property: String,
    /// Synthetic data seed.
    pub seed: u64,
    /// Number of sectors.
    pub sector_count: usize,
}

/// Builds simulators from configuration and runs requests.
#[derive(Debug)]
pub struct Workbench {
    config: RippleConfig,
    model: Arc<CoefficientModel>,
    baselines: Memo<DataKey, RegionalBaseline>,
}

impl Workbench {
    /// Build the coefficient model described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkbenchError::Config`] if the configuration is invalid,
    /// or [`WorkbenchError::Engine`] if the matrix is singular or, with
    /// `validate_coefficients`, not productive.
    pub fn new(config: RippleConfig) -> Result<Self, WorkbenchError> {
        config.validate()?;
        let model = CoefficientModel::from_rows(&config.model.coefficients)?;
        if config.model.validate_coefficients {
            model.check_productive()?;
        }
        info!(
            sectors = model.sector_count(),
            validated = config.model.validate_coefficients,
            "Coefficient model ready"
        );
        Ok(Self {
            config,
            model: Arc::new(model),
            baselines: Memo::new(),
        })
    }

    /// The configuration.
    pub const fn config(&self) -> &RippleConfig {
        &self.config
    }

    /// The coefficient model.
    pub const fn model(&self) -> &Arc<CoefficientModel> {
        &self.model
    }

    /// Cache key of the configured data sources.
    pub fn data_key(&self) -> DataKey {
        let data = &self.config.data;
        DataKey {
            boundaries: self.config.resolve_path(&data.boundaries),
            economic_data: data
                .economic_data
                .as_deref()
                .map(|p| self.config.resolve_path(p)),
            key_property: data.key_property.clone(),
            name_property: data.name_property.clone(),
            seed: data.synthetic_seed,
            sector_count: self.model.sector_count(),
        }
    }

    /// The regional baseline, loaded on first use.
    pub fn baseline(&self) -> Result<Arc<RegionalBaseline>, WorkbenchError> {
        let key = self.data_key();
        self.baselines.get_or_try_init(&key, || {
            let dataset = load_dataset(&self.config)?;
            let baseline = RegionalBaseline::build(
                &dataset.boundaries,
                &dataset.records,
                key.sector_count,
            )?;
            Ok(baseline)
        })
    }

    /// The sector table for `baseline`.
    ///
    /// Missing value-added coefficients come from the coefficient matrix;
    /// missing employment coefficients come from baseline employment.
    pub fn sectors(&self, baseline: &RegionalBaseline) -> Vec<Sector> {
        let configured = &self.config.model.sectors;
        let vab: Vec<f64> = self
            .model
            .value_added_coefficients()
            .into_iter()
            .zip(configured)
            .map(|(derived, sector)| sector.vab_coefficient.unwrap_or(derived))
            .collect();
        let employment = employment_coefficients_from_baseline(baseline, &vab);

        configured
            .iter()
            .zip(vab)
            .zip(employment)
            .enumerate()
            .filter_map(|(index, ((sector, vab_coefficient), derived_employment))| {
                Some(Sector {
                    id: SectorId(u16::try_from(index).ok()?),
                    name: sector.name.trim().to_owned(),
                    vab_coefficient,
                    employment_coefficient: sector
                        .employment_coefficient
                        .unwrap_or(derived_employment),
                })
            })
            .collect()
    }

    /// A simulator over the configured model and baseline.
    pub fn simulator(&self) -> Result<Simulator, WorkbenchError> {
        let baseline = self.baseline()?;
        let sectors = self.sectors(&baseline);
        Ok(Simulator::new(
            Arc::clone(&self.model),
            baseline,
            sectors,
            &self.config.engine.params(),
        )?)
    }

    /// Resolve and run one request.
    pub fn simulate(&self, request: &SimulationRequest) -> Result<SimulationResult, WorkbenchError> {
        Ok(self.simulator()?.simulate(request)?)
    }

    /// Baseline profile of a region, for display.
    pub fn profile(&self, region: RegionKey) -> Result<Option<RegionProfile>, WorkbenchError> {
        Ok(self.baseline()?.profile(region))
    }

    /// Run every configured scenario and record it in `book`.
    ///
    /// Returns the number of scenarios run. Stops at the first failure.
    pub fn run_scenarios(&self, book: &mut ScenarioBook) -> Result<usize, WorkbenchError> {
        let simulator = self.simulator()?;
        for scenario in &self.config.scenarios {
            let result = simulator.simulate(&scenario.request())?;
            info!(
                scenario = scenario.name,
                simulation = %result.id,
                multiplier = result.totals.multiplier,
                "Scenario complete"
            );
            book.record(scenario.name.clone(), result)?;
        }
        Ok(self.config.scenarios.len())
    }
}
