//! Enumeration types shared between the engine and its consumers.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Impact metrics
// ---------------------------------------------------------------------------

/// An impact metric that can be aggregated, ranked, and classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Metric {
    /// Total output (production) impact, in monetary units.
    Production,
    /// Value-added (VAB) impact, in monetary units.
    ValueAdded,
    /// Tax revenue impact, in monetary units.
    Tax,
    /// Employment impact, in jobs.
    Employment,
}

impl Metric {
    /// Every metric, in display order.
    pub const ALL: [Self; 4] = [
        Self::Production,
        Self::ValueAdded,
        Self::Tax,
        Self::Employment,
    ];

    /// Short lowercase label, used in logs and legends.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::ValueAdded => "value_added",
            Self::Tax => "tax",
            Self::Employment => "employment",
        }
    }
}

impl core::fmt::Display for Metric {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// How the class breaks for a metric were spaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum BinningMode {
    /// No strictly positive values; every region is in class 0.
    Empty,
    /// Evenly spaced edges between the observed minimum and maximum.
    Linear,
    /// Logarithmically spaced edges between the observed minimum and maximum.
    Logarithmic,
}

// ---------------------------------------------------------------------------
// Baseline provenance
// ---------------------------------------------------------------------------

/// Where a region's baseline economic values came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum BaselineSource {
    /// Every sector was present in the economic dataset.
    Observed,
    /// One or more sectors were missing and replaced by the cross-region median.
    Imputed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_labels_are_distinct() {
        let labels: std::collections::BTreeSet<&str> =
            Metric::ALL.iter().map(|m| m.label()).collect();
        assert_eq!(labels.len(), Metric::ALL.len());
    }

    #[test]
    fn metric_serde_roundtrip() {
        let json = serde_json::to_string(&Metric::ValueAdded).unwrap_or_default();
        assert_eq!(json, "\"ValueAdded\"");
        let back: Result<Metric, _> = serde_json::from_str(&json);
        assert_eq!(back.ok(), Some(Metric::ValueAdded));
    }
}
