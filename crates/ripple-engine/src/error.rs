//! Error types for the `ripple-engine` crate.
//!
//! Every variant here is fatal for the run that produced it: the caller
//! either receives a complete, internally consistent result or one of
//! these errors, never a partial result. Recoverable data-quality issues
//! (missing economic rows, zero weights, zero baselines) are handled
//! inside the responsible component and never surface as errors.

use ripple_types::{RegionKey, SectorId};

/// Errors that can occur while building the model or running a simulation.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The technical coefficient matrix has no rows.
    #[error("technical coefficient matrix is empty")]
    EmptyMatrix,

    /// The technical coefficient matrix is not square.
    #[error("technical coefficient matrix must be square, got {rows}x{cols}")]
    NonSquareMatrix {
        /// Number of rows.
        rows: usize,
        /// Length of the offending row.
        cols: usize,
    },

    /// A coefficient is NaN or infinite.
    #[error("technical coefficient at ({row}, {col}) is not finite")]
    NonFiniteCoefficient {
        /// Row of the offending entry.
        row: usize,
        /// Column of the offending entry.
        col: usize,
    },

    /// `I - A` is not invertible, so no Leontief inverse exists.
    #[error("I - A is singular for the {size}x{size} coefficient matrix; no Leontief inverse exists")]
    SingularMatrix {
        /// Dimension of the matrix.
        size: usize,
    },

    /// The coefficient matrix failed the opt-in productivity check.
    #[error("coefficient matrix is not productive: {reason}")]
    UnproductiveMatrix {
        /// Which condition failed.
        reason: String,
    },

    /// The sector table and the coefficient matrix disagree on the sector count.
    #[error("sector table has {actual} sectors but the coefficient matrix has {expected}")]
    SectorCountMismatch {
        /// Dimension of the coefficient matrix.
        expected: usize,
        /// Number of sectors supplied.
        actual: usize,
    },

    /// The regional baseline has no regions, or no region has economic data.
    #[error("regional baseline is empty: {0}")]
    EmptyBaseline(&'static str),

    /// Two boundary features carry the same region key.
    #[error("duplicate region key in boundary data: {0}")]
    DuplicateRegion(RegionKey),

    /// A region's geometry has no derivable centroid.
    #[error("region {0} has no derivable centroid")]
    MissingCentroid(RegionKey),

    /// The boundary data could not be parsed.
    #[error("invalid boundary data: {0}")]
    Boundary(String),

    /// The referenced region is not part of the baseline.
    #[error("unknown region: {0}")]
    UnknownRegion(RegionKey),

    /// No region matches the given legacy name.
    #[error("no region named {0:?}")]
    UnknownRegionName(String),

    /// The referenced sector is outside the sector table.
    #[error("unknown sector: {0}")]
    UnknownSector(SectorId),

    /// No sector matches the given name.
    #[error("no sector named {0:?}")]
    UnknownSectorName(String),

    /// The shock value is not finite and strictly positive.
    #[error("shock value must be finite and positive, got {value}")]
    InvalidShockValue {
        /// The rejected value.
        value: f64,
    },

    /// A model parameter is out of its valid range.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}
