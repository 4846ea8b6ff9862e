//! JSON report of a batch of scenarios.

use serde::Serialize;

use ripple_core::{ScenarioBook, ScenarioComparison, ScenarioError};
use ripple_types::{Metric, RegionImpact, SimulationResult};

/// Regions listed in each scenario's ranking.
const TOP_REGIONS: usize = 5;

/// One scenario in the report.
#[derive(Debug, Serialize)]
pub struct ScenarioReport<'a> {
    /// Scenario name.
    pub name: &'a str,
    /// Regions with the largest production impact.
    pub top_regions: Vec<&'a RegionImpact>,
    /// The full result.
    pub result: &'a SimulationResult,
}

/// Everything written to stdout.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    /// Every scenario, in run order.
    pub scenarios: Vec<ScenarioReport<'a>>,
    /// Each later scenario compared against the first on production.
    pub comparisons: Vec<ScenarioComparison>,
}

impl<'a> Report<'a> {
    /// Assemble the report from a filled scenario book.
    pub fn build(book: &'a ScenarioBook) -> Result<Self, ScenarioError> {
        let scenarios = book
            .iter()
            .map(|s| ScenarioReport {
                name: &s.name,
                top_regions: s.result.top_regions(Metric::Production, TOP_REGIONS),
                result: &s.result,
            })
            .collect();

        let mut comparisons = Vec::new();
        let mut names = book.iter().map(|s| s.name.as_str());
        if let Some(base) = names.next() {
            for other in names {
                comparisons.push(book.compare(base, other, Metric::Production)?);
            }
        }

        Ok(Self {
            scenarios,
            comparisons,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_book_gives_empty_report() {
        let book = ScenarioBook::new();
        let report = Report::build(&book).unwrap();
        assert!(report.scenarios.is_empty());
        assert!(report.comparisons.is_empty());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["scenarios"], serde_json::json!([]));
    }
}
