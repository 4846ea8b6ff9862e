//! Conversion of production impact into the other impact metrics.
//!
//! ```text
//! value_added = production * vab_coefficient(s)
//! tax         = value_added * tax_rate
//! employment  = production * employment_coefficient(s)
//! percent     = production / baseline_vab * 100    (absent if baseline is 0)
//! ```

use ripple_types::MetricValues;

use crate::baseline::RegionalBaseline;
use crate::error::EngineError;

/// Default tax rate applied to value-added impact.
pub const DEFAULT_TAX_RATE: f64 = 0.18;

/// Derives value-added, tax and employment impact from production impact.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorDeriver {
    vab_coefficients: Vec<f64>,
    employment_coefficients: Vec<f64>,
    tax_rate: f64,
}

impl IndicatorDeriver {
    /// Create a deriver from per-sector coefficients.
    ///
    /// # Errors
    ///
    /// - [`EngineError::SectorCountMismatch`] if the two coefficient
    ///   vectors differ in length.
    /// - [`EngineError::InvalidParameter`] if a coefficient or the tax rate
    ///   is negative or not finite.
    pub fn new(
        vab_coefficients: Vec<f64>,
        employment_coefficients: Vec<f64>,
        tax_rate: f64,
    ) -> Result<Self, EngineError> {
        if vab_coefficients.len() != employment_coefficients.len() {
            return Err(EngineError::SectorCountMismatch {
                expected: vab_coefficients.len(),
                actual: employment_coefficients.len(),
            });
        }
        check_non_negative("tax_rate", tax_rate)?;
        for value in &vab_coefficients {
            check_non_negative("vab_coefficient", *value)?;
        }
        for value in &employment_coefficients {
            check_non_negative("employment_coefficient", *value)?;
        }
        Ok(Self {
            vab_coefficients,
            employment_coefficients,
            tax_rate,
        })
    }

    /// Number of sectors covered.
    pub fn sector_count(&self) -> usize {
        self.vab_coefficients.len()
    }

    /// Tax rate applied to value-added.
    pub const fn tax_rate(&self) -> f64 {
        self.tax_rate
    }

    /// Value-added coefficient per sector.
    pub fn vab_coefficients(&self) -> &[f64] {
        &self.vab_coefficients
    }

    /// Employment coefficient per sector.
    pub fn employment_coefficients(&self) -> &[f64] {
        &self.employment_coefficients
    }

    /// All metrics for a production impact in `sector`.
    ///
    /// Sectors out of range get zero coefficients.
    pub fn derive(&self, sector: usize, production: f64) -> MetricValues {
        let vab_coefficient = self.vab_coefficients.get(sector).copied().unwrap_or(0.0);
        let employment_coefficient = self
            .employment_coefficients
            .get(sector)
            .copied()
            .unwrap_or(0.0);
        let value_added = production * vab_coefficient;
        MetricValues {
            production,
            value_added,
            tax: value_added * self.tax_rate,
            employment: production * employment_coefficient,
        }
    }
}

/// Impact as a percentage of the baseline value-added.
///
/// `None` when the baseline is zero or not finite.
pub const fn percent_increase(production: f64, baseline_value_added: f64) -> Option<f64> {
    if baseline_value_added > 0.0 && baseline_value_added.is_finite() {
        Some(production / baseline_value_added * 100.0)
    } else {
        None
    }
}

/// Jobs per unit of output, derived from the baseline's employment.
///
/// For each sector, national output is estimated as national value-added
/// divided by the value-added coefficient, and the coefficient is national
/// employment over that output. Sectors with no value-added or a zero
/// value-added coefficient get zero.
pub fn employment_coefficients_from_baseline(
    baseline: &RegionalBaseline,
    vab_coefficients: &[f64],
) -> Vec<f64> {
    let national = baseline.national_value_added();
    (0..baseline.sector_count())
        .map(|sector| {
            let value_added = national.get(sector).copied().unwrap_or(0.0);
            let jobs: f64 = baseline
                .regions()
                .iter()
                .filter_map(|r| r.employment.get(sector))
                .sum();
            let vab_coefficient = vab_coefficients.get(sector).copied().unwrap_or(0.0);
            if value_added > 0.0 && vab_coefficient > 0.0 {
                jobs / (value_added / vab_coefficient)
            } else {
                0.0
            }
        })
        .collect()
}

fn check_non_negative(name: &'static str, value: f64) -> Result<(), EngineError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidParameter {
            name,
            reason: format!("must be finite and non-negative, got {value}"),
        })
    }
}
