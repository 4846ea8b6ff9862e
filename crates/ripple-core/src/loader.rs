//! Reading boundary and economic data from disk.
//!
//! Boundaries always come from a GeoJSON file. Economic records come from
//! a JSON array of [`EconomicRecord`] when one is configured, and are
//! generated synthetically otherwise.

use std::path::{Path, PathBuf};

use tracing::info;

use ripple_engine::{BoundaryFields, EngineError, RegionBoundary, parse_geojson, synthesize};
use ripple_types::EconomicRecord;

use crate::config::RippleConfig;

/// Errors that can occur while loading input data.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A data file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// The file that failed.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The economic data file is not a valid JSON record array.
    #[error("failed to parse economic data {}: {source}", path.display())]
    Json {
        /// The file that failed.
        path: PathBuf,
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// No economic data file is configured and no synthetic profiles are
    /// known for this many sectors.
    #[error("no economic data configured and no synthetic profiles for {sectors} sectors")]
    NoProfiles {
        /// Number of sectors in the model.
        sectors: usize,
    },

    /// The engine rejected the data.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Boundaries and economic records ready to build a baseline from.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// Region boundaries, in file order.
    pub boundaries: Vec<RegionBoundary>,
    /// Economic records.
    pub records: Vec<EconomicRecord>,
    /// Whether `records` was generated rather than read.
    pub synthetic: bool,
}

/// Read region boundaries from a GeoJSON file.
pub fn read_boundaries(path: &Path, fields: &BoundaryFields) -> Result<Vec<RegionBoundary>, LoadError> {
    let text = read(path)?;
    Ok(parse_geojson(&text, fields)?)
}

/// Read economic records from a JSON array file.
pub fn read_economic_records(path: &Path) -> Result<Vec<EconomicRecord>, LoadError> {
    let text = read(path)?;
    serde_json::from_str(&text).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Load everything the configuration points at.
pub fn load_dataset(config: &RippleConfig) -> Result<Dataset, LoadError> {
    let data = &config.data;
    let boundaries_path = config.resolve_path(&data.boundaries);
    let boundaries = read_boundaries(&boundaries_path, &data.boundary_fields())?;

    let sector_count = config.model.sectors.len();
    let (records, synthetic) = match &data.economic_data {
        Some(path) => (read_economic_records(&config.resolve_path(path))?, false),
        None => {
            let profiles = data
                .profiles(sector_count)
                .ok_or(LoadError::NoProfiles {
                    sectors: sector_count,
                })?;
            (synthesize(&boundaries, &profiles, data.synthetic_seed)?, true)
        }
    };

    info!(
        boundaries = %boundaries_path.display(),
        regions = boundaries.len(),
        records = records.len(),
        synthetic,
        "Dataset loaded"
    );

    Ok(Dataset {
        boundaries,
        records,
        synthetic,
    })
}

fn read(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}
