//! Core data structures: sectors, shocks, baseline records, and the
//! simulation result table handed to renderers and exporters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{BaselineSource, BinningMode, Metric};
use crate::ids::{RegionKey, SectorId, SimulationId};

// ---------------------------------------------------------------------------
// Sectors
// ---------------------------------------------------------------------------

/// An economic sector of the input-output model.
///
/// The sector set is fixed at startup. `id` is the sector's row and column
/// in the technical coefficient matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Sector {
    /// Matrix index of the sector.
    pub id: SectorId,
    /// Display name.
    pub name: String,
    /// Fraction of output that becomes value-added.
    pub vab_coefficient: f64,
    /// Jobs created per unit of output.
    pub employment_coefficient: f64,
}

// ---------------------------------------------------------------------------
// Shock
// ---------------------------------------------------------------------------

/// An exogenous injection of final demand into one sector of one region.
///
/// The monetary value must be finite and strictly positive; the engine
/// rejects anything else before running the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Shock {
    /// Region where the investment is made.
    pub region: RegionKey,
    /// Sector receiving the demand.
    pub sector: SectorId,
    /// Monetary value of the investment.
    pub value: f64,
}

// ---------------------------------------------------------------------------
// Economic input
// ---------------------------------------------------------------------------

/// One row of the baseline economic dataset, keyed by (region, sector).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EconomicRecord {
    /// Region the values belong to.
    pub region: RegionKey,
    /// Sector the values belong to.
    pub sector: SectorId,
    /// Baseline value-added.
    pub value_added: f64,
    /// Baseline employment (jobs).
    #[serde(default)]
    pub employment: f64,
    /// Number of businesses (profile display only).
    #[serde(default)]
    pub businesses: u64,
}

// ---------------------------------------------------------------------------
// Regional profile
// ---------------------------------------------------------------------------

/// Baseline figures of one sector within one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SectorBaseline {
    /// The sector.
    pub sector: SectorId,
    /// Baseline value-added.
    pub value_added: f64,
    /// Baseline employment.
    pub employment: f64,
    /// Number of businesses.
    pub businesses: u64,
    /// Region's share of the national value-added of this sector.
    pub national_share: f64,
    /// Whether this sector's figures were imputed from the median.
    pub imputed: bool,
}

/// Baseline profile of a region, for display next to the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RegionProfile {
    /// The region.
    pub region: RegionKey,
    /// Region name from the boundary dataset.
    pub name: String,
    /// Centroid `(x, y)` in the working coordinate system.
    pub centroid: (f64, f64),
    /// Per-sector baseline figures, in sector order.
    pub sectors: Vec<SectorBaseline>,
    /// Provenance of the baseline figures.
    pub source: BaselineSource,
}

impl RegionProfile {
    /// Total baseline value-added across all sectors.
    pub fn total_value_added(&self) -> f64 {
        self.sectors.iter().map(|s| s.value_added).sum()
    }

    /// Total baseline employment across all sectors.
    pub fn total_employment(&self) -> f64 {
        self.sectors.iter().map(|s| s.employment).sum()
    }
}

/// A region whose economic data was partly or wholly substituted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Substitution {
    /// The affected region.
    pub region: RegionKey,
    /// Region name from the boundary dataset.
    pub name: String,
    /// Sectors that received the cross-region median.
    pub sectors: Vec<SectorId>,
}

// ---------------------------------------------------------------------------
// Impact values
// ---------------------------------------------------------------------------

/// One value per impact metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MetricValues {
    /// Production (total output) impact.
    pub production: f64,
    /// Value-added impact.
    pub value_added: f64,
    /// Tax revenue impact.
    pub tax: f64,
    /// Employment impact, in jobs.
    pub employment: f64,
}

impl MetricValues {
    /// Return the value for `metric`.
    pub const fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Production => self.production,
            Metric::ValueAdded => self.value_added,
            Metric::Tax => self.tax,
            Metric::Employment => self.employment,
        }
    }

    /// Component-wise sum.
    #[must_use]
    pub fn sum_with(&self, other: &Self) -> Self {
        Self {
            production: self.production + other.production,
            value_added: self.value_added + other.value_added,
            tax: self.tax + other.tax,
            employment: self.employment + other.employment,
        }
    }
}

/// One class index per impact metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MetricClasses {
    /// Class of the production impact.
    pub production: u8,
    /// Class of the value-added impact.
    pub value_added: u8,
    /// Class of the tax impact.
    pub tax: u8,
    /// Class of the employment impact.
    pub employment: u8,
}

impl MetricClasses {
    /// Return the class for `metric`.
    pub const fn get(&self, metric: Metric) -> u8 {
        match metric {
            Metric::Production => self.production,
            Metric::ValueAdded => self.value_added,
            Metric::Tax => self.tax,
            Metric::Employment => self.employment,
        }
    }

    /// Set the class for `metric`.
    pub const fn set(&mut self, metric: Metric, class: u8) {
        match metric {
            Metric::Production => self.production = class,
            Metric::ValueAdded => self.value_added = class,
            Metric::Tax => self.tax = class,
            Metric::Employment => self.employment = class,
        }
    }
}

// ---------------------------------------------------------------------------
// Result table
// ---------------------------------------------------------------------------

/// Impact on one (region, sector) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ImpactRecord {
    /// The region.
    pub region: RegionKey,
    /// The sector.
    pub sector: SectorId,
    /// Impact values.
    pub impacts: MetricValues,
    /// Production impact as a percentage of baseline value-added.
    /// `None` when the baseline is zero.
    pub percent_increase: Option<f64>,
    /// Classes of the owning region, per metric.
    pub classes: MetricClasses,
}

/// Impact on one region, summed over sectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RegionImpact {
    /// The region.
    pub region: RegionKey,
    /// Region name from the boundary dataset.
    pub name: String,
    /// Impact values summed over sectors.
    pub impacts: MetricValues,
    /// Total production impact as a percentage of total baseline value-added.
    pub percent_increase: Option<f64>,
    /// Planar distance from the shock origin's centroid.
    pub distance: f64,
    /// Distance-decay factor used by the gravity allocation.
    pub proximity: f64,
    /// Class per metric.
    pub classes: MetricClasses,
}

/// Class breaks computed for one metric, for building a legend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ClassBreaks {
    /// The classified metric.
    pub metric: Metric,
    /// How the edges were spaced.
    pub mode: BinningMode,
    /// Requested number of classes.
    pub class_count: u8,
    /// Ascending, deduplicated bin edges starting at zero.
    pub edges: Vec<f64>,
}

impl ClassBreaks {
    /// Number of bins actually produced by the edges.
    pub const fn bin_count(&self) -> usize {
        self.edges.len().saturating_sub(1)
    }
}

/// National totals of a simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ImpactTotals {
    /// Impact values summed over every region and sector.
    pub impacts: MetricValues,
    /// National production impact divided by the shock value, equal to the
    /// Leontief multiplier of the shocked sector. Undistributed ripple is
    /// included here but absent from `impacts`.
    pub multiplier: f64,
}

/// The complete output of one simulation run.
///
/// A result is an immutable value: it is produced once from a single
/// [`Shock`] and never mutated afterwards. Several results may coexist
/// for scenario comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SimulationResult {
    /// Unique identifier of the run.
    pub id: SimulationId,
    /// When the run was computed.
    pub created_at: DateTime<Utc>,
    /// The shock that was simulated.
    pub shock: Shock,
    /// National production impact per sector, in sector order.
    pub national_impact: Vec<f64>,
    /// Portion of the impact assigned directly to the origin region and sector.
    pub direct_effect: f64,
    /// Ripple per sector that could not be distributed (zero allocation weights).
    pub undistributed: Vec<f64>,
    /// Per (region, sector) impacts, region-major in baseline order.
    pub records: Vec<ImpactRecord>,
    /// Per region impacts, in baseline order.
    pub regions: Vec<RegionImpact>,
    /// Class breaks per metric.
    pub breaks: Vec<ClassBreaks>,
    /// National totals.
    pub totals: ImpactTotals,
}

impl SimulationResult {
    /// Look up the aggregated impact of a region.
    pub fn region(&self, key: RegionKey) -> Option<&RegionImpact> {
        self.regions.iter().find(|r| r.region == key)
    }

    /// Look up the impact on one (region, sector) pair.
    pub fn record(&self, key: RegionKey, sector: SectorId) -> Option<&ImpactRecord> {
        self.records
            .iter()
            .find(|r| r.region == key && r.sector == sector)
    }

    /// Class breaks used for `metric`.
    pub fn breaks_for(&self, metric: Metric) -> Option<&ClassBreaks> {
        self.breaks.iter().find(|b| b.metric == metric)
    }

    /// Sum of production impact over all regions for one sector.
    pub fn sector_production(&self, sector: SectorId) -> f64 {
        self.records
            .iter()
            .filter(|r| r.sector == sector)
            .map(|r| r.impacts.production)
            .sum()
    }

    /// The `n` regions with the largest value of `metric`, largest first.
    ///
    /// Ties are broken by region key so the ranking is deterministic.
    pub fn top_regions(&self, metric: Metric, n: usize) -> Vec<&RegionImpact> {
        let mut ranked: Vec<&RegionImpact> = self.regions.iter().collect();
        ranked.sort_by(|a, b| {
            b.impacts
                .get(metric)
                .total_cmp(&a.impacts.get(metric))
                .then_with(|| a.region.cmp(&b.region))
        });
        ranked.truncate(n);
        ranked
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn region(key: u32, production: f64) -> RegionImpact {
        RegionImpact {
            region: RegionKey(key),
            name: format!("R{key}"),
            impacts: MetricValues {
                production,
                ..MetricValues::default()
            },
            percent_increase: None,
            distance: 0.0,
            proximity: 1.0,
            classes: MetricClasses::default(),
        }
    }

    fn result_with(regions: Vec<RegionImpact>) -> SimulationResult {
        SimulationResult {
            id: SimulationId::new(),
            created_at: Utc::now(),
            shock: Shock {
                region: RegionKey(1),
                sector: SectorId(0),
                value: 10.0,
            },
            national_impact: vec![10.0],
            direct_effect: 10.0,
            undistributed: vec![0.0],
            records: Vec::new(),
            regions,
            breaks: Vec::new(),
            totals: ImpactTotals {
                impacts: MetricValues::default(),
                multiplier: 1.0,
            },
        }
    }

    #[test]
    fn top_regions_orders_descending() {
        let result = result_with(vec![region(1, 5.0), region(2, 9.0), region(3, 7.0)]);
        let top = result.top_regions(Metric::Production, 2);
        let keys: Vec<u32> = top.iter().map(|r| r.region.code()).collect();
        assert_eq!(keys, vec![2, 3]);
    }

    #[test]
    fn top_regions_breaks_ties_by_key() {
        let result = result_with(vec![region(7, 1.0), region(3, 1.0)]);
        let top = result.top_regions(Metric::Production, 5);
        let keys: Vec<u32> = top.iter().map(|r| r.region.code()).collect();
        assert_eq!(keys, vec![3, 7]);
    }

    #[test]
    fn metric_classes_get_set() {
        let mut classes = MetricClasses::default();
        classes.set(Metric::Tax, 3);
        assert_eq!(classes.get(Metric::Tax), 3);
        assert_eq!(classes.get(Metric::Production), 0);
    }

    #[test]
    fn metric_values_sum_with() {
        let a = MetricValues {
            production: 1.0,
            value_added: 2.0,
            tax: 3.0,
            employment: 4.0,
        };
        let sum = a.sum_with(&a);
        assert!((sum.employment - 8.0).abs() < f64::EPSILON);
        assert!((sum.get(Metric::ValueAdded) - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn percent_increase_none_serializes_as_null() {
        let record = ImpactRecord {
            region: RegionKey(1),
            sector: SectorId(0),
            impacts: MetricValues::default(),
            percent_increase: None,
            classes: MetricClasses::default(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("percent_increase").unwrap().is_null());
    }
}
