//! Append-only book of simulation results for side-by-side comparison.
//!
//! Results are immutable values; the book only collects them under unique
//! names. Nothing in a stored result is ever modified.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use ripple_types::{Metric, RegionKey, SimulationResult};

/// Errors that can occur when using the scenario book.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// A scenario with this name was already recorded.
    #[error("scenario {0:?} already recorded")]
    Duplicate(String),

    /// No scenario with this name exists.
    #[error("unknown scenario {0:?}")]
    Unknown(String),
}

/// One named result.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    /// Unique scenario name.
    pub name: String,
    /// The simulation result.
    pub result: Arc<SimulationResult>,
}

/// Difference between two scenarios for one region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionDelta {
    /// The region.
    pub region: RegionKey,
    /// Region name.
    pub name: String,
    /// Value in the base scenario.
    pub base: f64,
    /// Value in the other scenario.
    pub other: f64,
    /// `other - base`.
    pub delta: f64,
}

/// Comparison of two scenarios on one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioComparison {
    /// Name of the base scenario.
    pub base: String,
    /// Name of the compared scenario.
    pub other: String,
    /// The compared metric.
    pub metric: Metric,
    /// National total in the base scenario.
    pub base_total: f64,
    /// National total in the compared scenario.
    pub other_total: f64,
    /// Per-region differences, largest absolute change first.
    pub regions: Vec<RegionDelta>,
}

/// Append-only collection of named results.
#[derive(Debug, Clone, Default)]
pub struct ScenarioBook {
    scenarios: Vec<Scenario>,
}

impl ScenarioBook {
    /// Create an empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a result under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Duplicate`] if the name is taken.
    pub fn record(
        &mut self,
        name: impl Into<String>,
        result: SimulationResult,
    ) -> Result<Arc<SimulationResult>, ScenarioError> {
        let name = name.into();
        if self.get(&name).is_some() {
            return Err(ScenarioError::Duplicate(name));
        }
        let result = Arc::new(result);
        self.scenarios.push(Scenario {
            name,
            result: Arc::clone(&result),
        });
        Ok(result)
    }

    /// Look up a result by name.
    pub fn get(&self, name: &str) -> Option<&Arc<SimulationResult>> {
        self.scenarios
            .iter()
            .find(|s| s.name == name)
            .map(|s| &s.result)
    }

    /// Scenarios in recording order.
    pub fn iter(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios.iter()
    }

    /// Number of recorded scenarios.
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    /// Whether the book is empty.
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// Compare `other` against `base` on `metric`.
    ///
    /// Regions present in only one of the two results count as zero in
    /// the other.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Unknown`] if either name is missing.
    pub fn compare(
        &self,
        base: &str,
        other: &str,
        metric: Metric,
    ) -> Result<ScenarioComparison, ScenarioError> {
        let base_result = self
            .get(base)
            .ok_or_else(|| ScenarioError::Unknown(base.to_owned()))?;
        let other_result = self
            .get(other)
            .ok_or_else(|| ScenarioError::Unknown(other.to_owned()))?;

        let mut rows: BTreeMap<RegionKey, RegionDelta> = BTreeMap::new();
        for region in &base_result.regions {
            rows.insert(
                region.region,
                RegionDelta {
                    region: region.region,
                    name: region.name.clone(),
                    base: region.impacts.get(metric),
                    other: 0.0,
                    delta: 0.0,
                },
            );
        }
        for region in &other_result.regions {
            let row = rows.entry(region.region).or_insert_with(|| RegionDelta {
                region: region.region,
                name: region.name.clone(),
                base: 0.0,
                other: 0.0,
                delta: 0.0,
            });
            row.other = region.impacts.get(metric);
        }

        let mut regions: Vec<RegionDelta> = rows
            .into_values()
            .map(|mut row| {
                row.delta = row.other - row.base;
                row
            })
            .collect();
        regions.sort_by(|a, b| {
            b.delta
                .abs()
                .total_cmp(&a.delta.abs())
                .then_with(|| a.region.cmp(&b.region))
        });

        Ok(ScenarioComparison {
            base: base.to_owned(),
            other: other.to_owned(),
            metric,
            base_total: base_result.totals.impacts.get(metric),
            other_total: other_result.totals.impacts.get(metric),
            regions,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use fixtures::result_with;

    /// Minimal results built by hand.
    mod fixtures {
        use ripple_types::{
            ImpactTotals, MetricClasses, MetricValues, RegionImpact, RegionKey, SectorId, Shock,
            SimulationId, SimulationResult,
        };

        fn values(production: f64) -> MetricValues {
            MetricValues {
                production,
                value_added: production / 2.0,
                tax: production / 10.0,
                employment: production / 100.0,
            }
        }

        pub fn result_with(regions: &[(u32, f64)]) -> SimulationResult {
            let total: f64 = regions.iter().map(|(_, p)| p).sum();
            SimulationResult {
                id: SimulationId::new(),
                created_at: chrono::Utc::now(),
                shock: Shock {
                    region: RegionKey(regions.first().map_or(0, |(k, _)| *k)),
                    sector: SectorId(0),
                    value: 1.0,
                },
                national_impact: vec![total],
                direct_effect: 1.0,
                undistributed: vec![0.0],
                records: Vec::new(),
                regions: regions
                    .iter()
                    .map(|(key, production)| RegionImpact {
                        region: RegionKey(*key),
                        name: format!("R{key}"),
                        impacts: values(*production),
                        percent_increase: None,
                        distance: 0.0,
                        proximity: 1.0,
                        classes: MetricClasses::default(),
                    })
                    .collect(),
                breaks: Vec::new(),
                totals: ImpactTotals {
                    impacts: values(total),
                    multiplier: total,
                },
            }
        }
    }

    #[test]
    fn names_are_unique() {
        let mut book = ScenarioBook::new();
        book.record("a", result_with(&[(1, 10.0)])).unwrap();
        assert!(matches!(
            book.record("a", result_with(&[(1, 20.0)])),
            Err(ScenarioError::Duplicate(_))
        ));
        assert_eq!(book.len(), 1);
        let stored = book.get("a").unwrap();
        assert!((stored.totals.impacts.production - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn compare_orders_by_largest_change() {
        let mut book = ScenarioBook::new();
        book.record("base", result_with(&[(1, 10.0), (2, 5.0)])).unwrap();
        book.record("alt", result_with(&[(1, 11.0), (2, 1.0), (3, 2.0)])).unwrap();

        let cmp = book.compare("base", "alt", Metric::Production).unwrap();
        assert_eq!(cmp.regions.len(), 3);
        assert_eq!(cmp.regions[0].region, RegionKey(2));
        assert!((cmp.regions[0].delta + 4.0).abs() < 1e-12);
        assert_eq!(cmp.regions[1].region, RegionKey(3));
        assert!((cmp.regions[1].base).abs() < f64::EPSILON);
        assert!((cmp.base_total - 15.0).abs() < 1e-12);
        assert!((cmp.other_total - 14.0).abs() < 1e-12);
    }

    #[test]
    fn compare_unknown_scenario_fails() {
        let mut book = ScenarioBook::new();
        book.record("base", result_with(&[(1, 1.0)])).unwrap();
        assert!(matches!(
            book.compare("base", "missing", Metric::Tax),
            Err(ScenarioError::Unknown(name)) if name == "missing"
        ));
    }
}
