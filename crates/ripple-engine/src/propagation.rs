//! Shock propagation through the Leontief inverse.
//!
//! A shock of value `v` in sector `k` is the final-demand vector `d` with
//! `d[k] = v` and zero elsewhere. The national output impact is `L * d`,
//! which is column `k` of `L` scaled by `v`. No spatial information is
//! used here.

use nalgebra::DVector;
use tracing::debug;

use ripple_types::SectorId;

use crate::coefficients::CoefficientModel;
use crate::error::EngineError;

/// Applies demand shocks to a [`CoefficientModel`].
#[derive(Debug, Clone, Copy)]
pub struct ShockPropagator<'a> {
    model: &'a CoefficientModel,
}

impl<'a> ShockPropagator<'a> {
    /// Create a propagator over `model`.
    pub const fn new(model: &'a CoefficientModel) -> Self {
        Self { model }
    }

    /// National output impact per sector of a shock of `value` in `sector`.
    ///
    /// For a productive matrix the origin sector's impact is at least
    /// `value`; this is not checked.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownSector`] if `sector` is out of range,
    /// or [`EngineError::InvalidShockValue`] unless `value` is finite and
    /// strictly positive.
    pub fn propagate(&self, sector: SectorId, value: f64) -> Result<Vec<f64>, EngineError> {
        let size = self.model.sector_count();
        let index = sector.index();
        if index >= size {
            return Err(EngineError::UnknownSector(sector));
        }
        if !value.is_finite() || value <= 0.0 {
            return Err(EngineError::InvalidShockValue { value });
        }

        let demand = DVector::from_fn(size, |i, _| if i == index { value } else { 0.0 });
        let impact = self.model.leontief_inverse() * demand;
        let impact: Vec<f64> = impact.iter().copied().collect();

        debug!(
            sector = %sector,
            value,
            total = impact.iter().sum::<f64>(),
            "Shock propagated"
        );
        Ok(impact)
    }
}
