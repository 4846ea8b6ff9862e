//! Technical coefficient matrix and its Leontief inverse.
//!
//! Entry `a[i][j]` of the technical coefficient matrix `A` is the input
//! from sector `i` required per unit of output of sector `j`. The Leontief
//! inverse `L = (I - A)^-1` gives, in entry `(i, j)`, the total output of
//! sector `i` needed to satisfy one unit of final demand for sector `j`.
//!
//! The inverse is computed once at construction. A model is immutable
//! afterwards and is shared by every simulation run.

use nalgebra::DMatrix;
use tracing::{debug, info};

use ripple_types::SectorId;

use crate::error::EngineError;

/// Determinant magnitude below which `I - A` is treated as singular.
const SINGULARITY_TOLERANCE: f64 = 1e-12;

/// Tolerance for negative entries of `L` in the productivity check.
const NEGATIVE_TOLERANCE: f64 = 1e-12;

/// Sector names of the reference four-sector configuration.
pub const REFERENCE_SECTORS: [&str; 4] = ["Agriculture", "Industry", "Construction", "Services"];

/// Reference technical coefficients, row-major, aggregated from the 2017
/// national supply and use tables into four sectors.
pub const REFERENCE_COEFFICIENTS: [[f64; 4]; 4] = [
    [0.201, 0.085, 0.003, 0.012],
    [0.155, 0.351, 0.298, 0.105],
    [0.002, 0.004, 0.001, 0.008],
    [0.117, 0.160, 0.145, 0.245],
];

/// Input-output model: technical coefficients and the derived Leontief inverse.
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientModel {
    /// The technical coefficient matrix `A`.
    technical: DMatrix<f64>,
    /// The Leontief inverse `(I - A)^-1`.
    inverse: DMatrix<f64>,
}

impl CoefficientModel {
    /// Build a model from row-major coefficients.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::EmptyMatrix`], [`EngineError::NonSquareMatrix`]
    /// or [`EngineError::NonFiniteCoefficient`] for malformed input, and
    /// [`EngineError::SingularMatrix`] if `I - A` cannot be inverted.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, EngineError> {
        let size = rows.len();
        if size == 0 {
            return Err(EngineError::EmptyMatrix);
        }
        for (row, values) in rows.iter().enumerate() {
            if values.len() != size {
                return Err(EngineError::NonSquareMatrix {
                    rows: size,
                    cols: values.len(),
                });
            }
            if let Some(col) = values.iter().position(|v| !v.is_finite()) {
                return Err(EngineError::NonFiniteCoefficient { row, col });
            }
        }

        let technical = DMatrix::from_fn(size, size, |r, c| {
            rows.get(r)
                .and_then(|values| values.get(c))
                .copied()
                .unwrap_or(0.0)
        });
        Self::from_matrix(technical)
    }

    /// Build a model from an `nalgebra` matrix.
    ///
    /// # Errors
    ///
    /// Same conditions as [`CoefficientModel::from_rows`].
    pub fn from_matrix(technical: DMatrix<f64>) -> Result<Self, EngineError> {
        let size = technical.nrows();
        if size == 0 {
            return Err(EngineError::EmptyMatrix);
        }
        if technical.ncols() != size {
            return Err(EngineError::NonSquareMatrix {
                rows: size,
                cols: technical.ncols(),
            });
        }
        // Storage is column-major.
        if let Some(position) = technical.iter().position(|v| !v.is_finite()) {
            return Err(EngineError::NonFiniteCoefficient {
                row: position.checked_rem(size).unwrap_or(0),
                col: position.checked_div(size).unwrap_or(0),
            });
        }

        let system = DMatrix::<f64>::identity(size, size) - &technical;
        let determinant = system.determinant();
        debug!(size, determinant, "Inverting I - A");
        if !determinant.is_finite() || determinant.abs() < SINGULARITY_TOLERANCE {
            return Err(EngineError::SingularMatrix { size });
        }

        let inverse = system
            .try_inverse()
            .ok_or(EngineError::SingularMatrix { size })?;
        if inverse.iter().any(|v| !v.is_finite()) {
            return Err(EngineError::SingularMatrix { size });
        }

        info!(sectors = size, "Leontief inverse computed");
        Ok(Self { technical, inverse })
    }

    /// The reference four-sector model.
    ///
    /// # Errors
    ///
    /// Never fails for the shipped coefficients; the `Result` mirrors
    /// [`CoefficientModel::from_rows`].
    pub fn reference() -> Result<Self, EngineError> {
        let rows: Vec<Vec<f64>> = REFERENCE_COEFFICIENTS.iter().map(|r| r.to_vec()).collect();
        Self::from_rows(&rows)
    }

    /// Number of sectors (dimension of the matrices).
    pub fn sector_count(&self) -> usize {
        self.technical.nrows()
    }

    /// The technical coefficient matrix `A`.
    pub const fn technical(&self) -> &DMatrix<f64> {
        &self.technical
    }

    /// The Leontief inverse `L = (I - A)^-1`.
    pub const fn leontief_inverse(&self) -> &DMatrix<f64> {
        &self.inverse
    }

    /// Total output produced system-wide per unit of final demand for
    /// `sector`: the column sum of `L`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownSector`] if the sector is out of range.
    pub fn sector_multiplier(&self, sector: SectorId) -> Result<f64, EngineError> {
        let index = sector.index();
        if index >= self.sector_count() {
            return Err(EngineError::UnknownSector(sector));
        }
        Ok(self.inverse.column(index).sum())
    }

    /// Output multipliers of every sector, in sector order.
    pub fn multipliers(&self) -> Vec<f64> {
        self.inverse.column_iter().map(|c| c.sum()).collect()
    }

    /// Value-added share of output per sector: one minus the column sum of `A`.
    ///
    /// Whatever a sector does not spend on intermediate inputs is treated
    /// as value-added.
    pub fn value_added_coefficients(&self) -> Vec<f64> {
        self.technical
            .column_iter()
            .map(|c| 1.0 - c.sum())
            .collect()
    }

    /// Check that the matrix describes a productive economy.
    ///
    /// Requires every coefficient to be non-negative, every column sum of
    /// `A` to be strictly below one, and every entry of `L` to be
    /// non-negative. The engine does not run this check on its own; it is
    /// enabled through configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnproductiveMatrix`] naming the first failed
    /// condition.
    pub fn check_productive(&self) -> Result<(), EngineError> {
        for (col, column) in self.technical.column_iter().enumerate() {
            if let Some(row) = column.iter().position(|v| *v < 0.0) {
                return Err(EngineError::UnproductiveMatrix {
                    reason: format!("negative coefficient at ({row}, {col})"),
                });
            }
            let sum = column.sum();
            if sum >= 1.0 {
                return Err(EngineError::UnproductiveMatrix {
                    reason: format!("column {col} sums to {sum:.4}, which is not below 1"),
                });
            }
        }
        if self.inverse.iter().any(|v| *v < -NEGATIVE_TOLERANCE) {
            return Err(EngineError::UnproductiveMatrix {
                reason: String::from("Leontief inverse has negative entries"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn two_sector() -> CoefficientModel {
        CoefficientModel::from_rows(&[vec![0.2, 0.1], vec![0.05, 0.3]]).unwrap()
    }

    #[test]
    fn two_sector_inverse_matches_closed_form() {
        let model = two_sector();
        let l = model.leontief_inverse();
        // det(I - A) = 0.8 * 0.7 - 0.1 * 0.05 = 0.555
        assert!((l[(0, 0)] - 0.7 / 0.555).abs() < 1e-9);
        assert!((l[(0, 1)] - 0.1 / 0.555).abs() < 1e-9);
        assert!((l[(1, 0)] - 0.05 / 0.555).abs() < 1e-9);
        assert!((l[(1, 1)] - 0.8 / 0.555).abs() < 1e-9);
    }

    #[test]
    fn inverse_times_system_is_identity() {
        let model = CoefficientModel::reference().unwrap();
        let size = model.sector_count();
        let system = DMatrix::<f64>::identity(size, size) - model.technical();
        let product = system * model.leontief_inverse();
        for r in 0..size {
            for c in 0..size {
                let expected = if r == c { 1.0 } else { 0.0 };
                assert!((product[(r, c)] - expected).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn multiplier_is_column_sum() {
        let model = two_sector();
        let m0 = model.sector_multiplier(SectorId(0)).unwrap();
        assert!((m0 - 0.75 / 0.555).abs() < 1e-9);
        let all = model.multipliers();
        assert_eq!(all.len(), 2);
        assert!((all[0] - m0).abs() < 1e-12);
    }

    #[test]
    fn multiplier_rejects_unknown_sector() {
        let model = two_sector();
        assert!(matches!(
            model.sector_multiplier(SectorId(2)),
            Err(EngineError::UnknownSector(_))
        ));
    }

    #[test]
    fn identity_coefficients_are_singular() {
        let result = CoefficientModel::from_rows(&[vec![1.0, 0.0], vec![0.0, 1.0]]);
        assert!(matches!(result, Err(EngineError::SingularMatrix { size: 2 })));
    }

    #[test]
    fn rank_deficient_system_is_singular() {
        // I - A = [[0.5, -0.5], [-0.5, 0.5]] has rank one.
        let result = CoefficientModel::from_rows(&[vec![0.5, 0.5], vec![0.5, 0.5]]);
        assert!(matches!(result, Err(EngineError::SingularMatrix { .. })));
    }

    #[test]
    fn malformed_input_is_rejected() {
        assert!(matches!(
            CoefficientModel::from_rows(&[]),
            Err(EngineError::EmptyMatrix)
        ));
        assert!(matches!(
            CoefficientModel::from_rows(&[vec![0.1, 0.2], vec![0.3]]),
            Err(EngineError::NonSquareMatrix { rows: 2, cols: 1 })
        ));
        assert!(matches!(
            CoefficientModel::from_rows(&[vec![0.1, f64::NAN], vec![0.3, 0.1]]),
            Err(EngineError::NonFiniteCoefficient { row: 0, col: 1 })
        ));
    }

    #[test]
    fn value_added_coefficients_of_reference_model() {
        let model = CoefficientModel::reference().unwrap();
        let vab = model.value_added_coefficients();
        let expected = [0.525, 0.4, 0.553, 0.63];
        for (got, want) in vab.iter().zip(expected) {
            assert!((got - want).abs() < 1e-9);
        }
    }

    #[test]
    fn reference_model_is_productive() {
        let model = CoefficientModel::reference().unwrap();
        assert!(model.check_productive().is_ok());
        for m in model.multipliers() {
            assert!(m > 1.0);
        }
    }

    #[test]
    fn column_sum_above_one_is_unproductive() {
        let model = CoefficientModel::from_rows(&[vec![0.6, 0.1], vec![0.5, 0.2]]).unwrap();
        assert!(matches!(
            model.check_productive(),
            Err(EngineError::UnproductiveMatrix { .. })
        ));
    }

    #[test]
    fn negative_coefficient_is_unproductive() {
        let model = CoefficientModel::from_rows(&[vec![0.1, -0.1], vec![0.1, 0.2]]).unwrap();
        assert!(matches!(
            model.check_productive(),
            Err(EngineError::UnproductiveMatrix { .. })
        ));
    }
}
