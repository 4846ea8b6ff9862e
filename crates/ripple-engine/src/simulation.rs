//! The simulation pipeline.
//!
//! A [`Simulator`] owns shared handles to the immutable
//! [`CoefficientModel`] and [`RegionalBaseline`] plus the per-run
//! components. [`Simulator::run`] is a pure function of the shock and that
//! state:
//!
//! ```text
//! Shock -> ShockPropagator -> SpatialAllocator -> IndicatorDeriver
//!       -> ImpactClassifier -> SimulationResult
//! ```
//!
//! Running the same shock twice yields identical records, aggregates and
//! breaks; only the result id and timestamp differ.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use ripple_types::{
    ImpactRecord, ImpactTotals, Metric, MetricClasses, MetricValues, RegionImpact,
    RegionSelector, Sector, SectorId, Shock, ShockValue, SimulationId, SimulationRequest,
    SimulationResult,
};

use crate::allocation::{DEFAULT_FRICTION, SpatialAllocator};
use crate::baseline::RegionalBaseline;
use crate::classify::{DEFAULT_CLASS_COUNT, DEFAULT_OUTLIER_PERCENTILE, ImpactClassifier};
use crate::coefficients::CoefficientModel;
use crate::conservation::{ConservationResult, verify_allocation};
use crate::error::EngineError;
use crate::indicators::{DEFAULT_TAX_RATE, IndicatorDeriver, percent_increase};
use crate::propagation::ShockPropagator;

/// Tunable parameters of a [`Simulator`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationParams {
    /// Distance-decay friction of the gravity allocation.
    pub friction: f64,
    /// Tax rate applied to value-added impact.
    pub tax_rate: f64,
    /// Number of legend classes per metric.
    pub class_count: u8,
    /// Percentile above which values are left out of break computation.
    pub outlier_percentile: f64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            friction: DEFAULT_FRICTION,
            tax_rate: DEFAULT_TAX_RATE,
            class_count: DEFAULT_CLASS_COUNT,
            outlier_percentile: DEFAULT_OUTLIER_PERCENTILE,
        }
    }
}

/// Runs shocks against a fixed model and baseline.
#[derive(Debug, Clone)]
pub struct Simulator {
    model: Arc<CoefficientModel>,
    baseline: Arc<RegionalBaseline>,
    sectors: Vec<Sector>,
    allocator: SpatialAllocator,
    deriver: IndicatorDeriver,
    classifier: ImpactClassifier,
}

impl Simulator {
    /// Assemble a simulator.
    ///
    /// `sectors` must list every sector of the model in matrix order.
    ///
    /// # Errors
    ///
    /// - [`EngineError::SectorCountMismatch`] if the sector table, the
    ///   model and the baseline disagree on the number of sectors.
    /// - [`EngineError::InvalidParameter`] if a sector id does not match
    ///   its position, or a parameter is out of range.
    pub fn new(
        model: Arc<CoefficientModel>,
        baseline: Arc<RegionalBaseline>,
        sectors: Vec<Sector>,
        params: &SimulationParams,
    ) -> Result<Self, EngineError> {
        let expected = model.sector_count();
        for actual in [sectors.len(), baseline.sector_count()] {
            if actual != expected {
                return Err(EngineError::SectorCountMismatch { expected, actual });
            }
        }
        if let Some((position, sector)) = sectors
            .iter()
            .enumerate()
            .find(|(position, sector)| sector.id.index() != *position)
        {
            return Err(EngineError::InvalidParameter {
                name: "sectors",
                reason: format!("sector {} listed at position {position}", sector.id),
            });
        }

        let deriver = IndicatorDeriver::new(
            sectors.iter().map(|s| s.vab_coefficient).collect(),
            sectors.iter().map(|s| s.employment_coefficient).collect(),
            params.tax_rate,
        )?;
        let allocator = SpatialAllocator::new(params.friction)?;
        let classifier = ImpactClassifier::new(params.class_count)?
            .with_outlier_percentile(params.outlier_percentile)?;

        info!(
            sectors = sectors.len(),
            regions = baseline.len(),
            friction = params.friction,
            tax_rate = params.tax_rate,
            class_count = params.class_count,
            "Simulator ready"
        );

        Ok(Self {
            model,
            baseline,
            sectors,
            allocator,
            deriver,
            classifier,
        })
    }

    /// The coefficient model.
    pub fn model(&self) -> &CoefficientModel {
        &self.model
    }

    /// The regional baseline.
    pub fn baseline(&self) -> &RegionalBaseline {
        &self.baseline
    }

    /// The sector table, in matrix order.
    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    /// Find a sector by name, ignoring surrounding whitespace and case.
    pub fn sector_by_name(&self, name: &str) -> Result<SectorId, EngineError> {
        let wanted = name.trim().to_lowercase();
        self.sectors
            .iter()
            .find(|s| s.name.trim().to_lowercase() == wanted)
            .map(|s| s.id)
            .ok_or_else(|| EngineError::UnknownSectorName(name.to_owned()))
    }

    /// Resolve a caller request into a validated [`Shock`].
    ///
    /// # Errors
    ///
    /// Unknown region or sector, or a shock value that is not finite and
    /// strictly positive once resolved.
    pub fn resolve(&self, request: &SimulationRequest) -> Result<Shock, EngineError> {
        let region = match &request.region {
            RegionSelector::Key(key) => self
                .baseline
                .region(*key)
                .ok_or(EngineError::UnknownRegion(*key))?,
            RegionSelector::Name(name) => self
                .baseline
                .find_by_name(name)
                .ok_or_else(|| EngineError::UnknownRegionName(name.clone()))?,
        };
        let sector = self.sector_by_name(&request.sector)?;
        let value = match request.value {
            ShockValue::Absolute(value) => value,
            ShockValue::PercentOfBaseline(percent) => {
                region.value_added_of(sector.index()) * percent / 100.0
            }
        };
        if !value.is_finite() || value <= 0.0 {
            return Err(EngineError::InvalidShockValue { value });
        }
        Ok(Shock {
            region: region.key,
            sector,
            value,
        })
    }

    /// Resolve and run a request.
    pub fn simulate(&self, request: &SimulationRequest) -> Result<SimulationResult, EngineError> {
        let shock = self.resolve(request)?;
        self.run(&shock)
    }

    /// Run one shock through the whole pipeline.
    ///
    /// # Errors
    ///
    /// Unknown origin region or sector, or an invalid shock value. No
    /// partial result is ever returned.
    pub fn run(&self, shock: &Shock) -> Result<SimulationResult, EngineError> {
        if self.baseline.position(shock.region).is_none() {
            return Err(EngineError::UnknownRegion(shock.region));
        }
        let national = ShockPropagator::new(&self.model).propagate(shock.sector, shock.value)?;
        let allocation = self.allocator.allocate(&self.baseline, shock, &national)?;

        if let ConservationResult::Anomaly(anomaly) = verify_allocation(&national, &allocation) {
            warn!(
                region = %shock.region,
                sector = %shock.sector,
                sectors = anomaly.imbalances.len(),
                anomaly = %anomaly,
                "Conservation anomaly after allocation"
            );
        }

        // ---------------------------------------------------------------
        // Indicators
        // ---------------------------------------------------------------
        let mut records = Vec::with_capacity(self.baseline.len().saturating_mul(self.sectors.len()));
        let mut regions = Vec::with_capacity(self.baseline.len());
        for (position, region) in self.baseline.regions().iter().enumerate() {
            let mut aggregate = MetricValues::default();
            for sector in &self.sectors {
                let s = sector.id.index();
                let production = allocation.production_of(position, s);
                let impacts = self.deriver.derive(s, production);
                aggregate = aggregate.sum_with(&impacts);
                records.push(ImpactRecord {
                    region: region.key,
                    sector: sector.id,
                    impacts,
                    percent_increase: percent_increase(production, region.value_added_of(s)),
                    classes: MetricClasses::default(),
                });
            }
            regions.push(RegionImpact {
                region: region.key,
                name: region.name.clone(),
                impacts: aggregate,
                percent_increase: percent_increase(
                    aggregate.production,
                    region.total_value_added(),
                ),
                distance: allocation.distance.get(position).copied().unwrap_or(0.0),
                proximity: allocation.proximity.get(position).copied().unwrap_or(0.0),
                classes: MetricClasses::default(),
            });
        }

        // ---------------------------------------------------------------
        // Classification
        // ---------------------------------------------------------------
        let mut breaks = Vec::with_capacity(Metric::ALL.len());
        for metric in Metric::ALL {
            let series: Vec<f64> = regions.iter().map(|r| r.impacts.get(metric)).collect();
            let (metric_breaks, classes) = self.classifier.assign(metric, &series);
            for (region, class) in regions.iter_mut().zip(classes) {
                region.classes.set(metric, class);
            }
            breaks.push(metric_breaks);
        }
        let sector_count = self.sectors.len().max(1);
        for (record, region) in records
            .chunks_mut(sector_count)
            .zip(&regions)
            .flat_map(|(chunk, region)| chunk.iter_mut().map(move |r| (r, region)))
        {
            record.classes = region.classes;
        }

        // ---------------------------------------------------------------
        // Totals
        // ---------------------------------------------------------------
        let impacts = regions
            .iter()
            .fold(MetricValues::default(), |acc, r| acc.sum_with(&r.impacts));
        let multiplier = national.iter().sum::<f64>() / shock.value;
        let id = SimulationId::new();

        info!(
            simulation = %id,
            region = %shock.region,
            sector = %shock.sector,
            value = shock.value,
            production = impacts.production,
            multiplier,
            "Simulation complete"
        );

        Ok(SimulationResult {
            id,
            created_at: Utc::now(),
            shock: *shock,
            national_impact: national,
            direct_effect: allocation.direct_effect,
            undistributed: allocation.undistributed,
            records,
            regions,
            breaks,
            totals: ImpactTotals {
                impacts,
                multiplier,
            },
        })
    }
}
