//! Configuration loading and typed config structures for the Ripple engine.
//!
//! The canonical configuration lives in `ripple-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure, and provides a loader that reads and validates the file.
//!
//! Every section is optional; an empty file yields the reference model
//! (four sectors, reference coefficients) with default engine parameters.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use ripple_engine::allocation::DEFAULT_FRICTION;
use ripple_engine::boundary::{DEFAULT_KEY_PROPERTY, DEFAULT_NAME_PROPERTY};
use ripple_engine::classify::{DEFAULT_CLASS_COUNT, DEFAULT_OUTLIER_PERCENTILE};
use ripple_engine::coefficients::{REFERENCE_COEFFICIENTS, REFERENCE_SECTORS};
use ripple_engine::indicators::DEFAULT_TAX_RATE;
use ripple_engine::synthetic::{DEFAULT_SEED, REFERENCE_PROFILES};
use ripple_engine::{BoundaryFields, SectorProfile, SimulationParams};
use ripple_types::{RegionSelector, ShockValue, SimulationRequest};

/// Environment variable overriding `data.boundaries`.
pub const BOUNDARIES_ENV: &str = "RIPPLE_BOUNDARIES";

/// Environment variable overriding `data.economic_data`.
pub const ECONOMIC_DATA_ENV: &str = "RIPPLE_ECONOMIC_DATA";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is out of range or inconsistent.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: String,
        /// What is wrong with it.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

fn invalid(field: impl Into<String>, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field: field.into(),
        reason: reason.into(),
    }
}

fn absolute_path(value: String) -> PathBuf {
    let path = PathBuf::from(value);
    std::path::absolute(&path).unwrap_or(path)
}

/// Top-level configuration.
///
/// Mirrors the structure of `ripple-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RippleConfig {
    /// Sector table and technical coefficients.
    #[serde(default)]
    pub model: ModelConfig,

    /// Boundary and economic data sources.
    #[serde(default)]
    pub data: DataConfig,

    /// Allocation, tax and classification parameters.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Named scenarios run by the command-line tool.
    #[serde(default)]
    pub scenarios: Vec<ScenarioConfig>,

    /// Directory relative data paths are resolved against.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl RippleConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Relative data paths are resolved against the file's directory.
    /// Environment variables override YAML values for data sources:
    /// - `RIPPLE_BOUNDARIES` overrides `data.boundaries`
    /// - `RIPPLE_ECONOMIC_DATA` overrides `data.economic_data`
    ///
    /// Relative override paths are taken from the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.data.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Check every value for range and consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.model.validate()?;
        self.engine.validate()?;
        if let Some(profiles) = &self.data.synthetic_profiles {
            if profiles.len() != self.model.sectors.len() {
                return Err(invalid(
                    "data.synthetic_profiles",
                    format!(
                        "{} profiles for {} sectors",
                        profiles.len(),
                        self.model.sectors.len()
                    ),
                ));
            }
            for (i, profile) in profiles.iter().enumerate() {
                if !profile.mu.is_finite() || !profile.sigma.is_finite() || profile.sigma < 0.0 {
                    return Err(invalid(
                        format!("data.synthetic_profiles[{i}]"),
                        "mu must be finite and sigma finite and non-negative",
                    ));
                }
            }
        }
        let mut names = BTreeSet::new();
        for scenario in &self.scenarios {
            if !names.insert(scenario.name.as_str()) {
                return Err(invalid(
                    "scenarios",
                    format!("duplicate scenario name {:?}", scenario.name),
                ));
            }
        }
        Ok(())
    }

    /// Resolve a configured path against [`RippleConfig::base_dir`].
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// One sector of the model.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SectorConfig {
    /// Display name, unique across sectors.
    pub name: String,

    /// Fraction of output that becomes value-added. Derived from the
    /// coefficient matrix when absent.
    #[serde(default)]
    pub vab_coefficient: Option<f64>,

    /// Jobs per unit of output. Derived from baseline employment when absent.
    #[serde(default)]
    pub employment_coefficient: Option<f64>,
}

/// Sector table and technical coefficients.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelConfig {
    /// Sectors in matrix order.
    #[serde(default = "default_sectors")]
    pub sectors: Vec<SectorConfig>,

    /// Technical coefficients, row-major: `coefficients[i][j]` is the input
    /// from sector `i` per unit of output of sector `j`.
    #[serde(default = "default_coefficients")]
    pub coefficients: Vec<Vec<f64>>,

    /// Run the productivity check on the coefficient matrix at startup.
    #[serde(default)]
    pub validate_coefficients: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            sectors: default_sectors(),
            coefficients: default_coefficients(),
            validate_coefficients: false,
        }
    }
}

impl ModelConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.sectors.is_empty() {
            return Err(invalid("model.sectors", "at least one sector is required"));
        }
        if u16::try_from(self.sectors.len()).is_err() {
            return Err(invalid("model.sectors", "too many sectors"));
        }
        let size = self.sectors.len();
        if self.coefficients.len() != size {
            return Err(invalid(
                "model.coefficients",
                format!("{} rows for {size} sectors", self.coefficients.len()),
            ));
        }
        if let Some(i) = self.coefficients.iter().position(|row| row.len() != size) {
            return Err(invalid(
                format!("model.coefficients[{i}]"),
                format!("expected {size} columns"),
            ));
        }

        let mut names = BTreeSet::new();
        for (i, sector) in self.sectors.iter().enumerate() {
            let name = sector.name.trim().to_lowercase();
            if name.is_empty() {
                return Err(invalid(format!("model.sectors[{i}].name"), "must not be empty"));
            }
            if !names.insert(name) {
                return Err(invalid(
                    format!("model.sectors[{i}].name"),
                    format!("duplicate sector {:?}", sector.name),
                ));
            }
            for (field, value) in [
                ("vab_coefficient", sector.vab_coefficient),
                ("employment_coefficient", sector.employment_coefficient),
            ] {
                if let Some(value) = value {
                    if !value.is_finite() || value < 0.0 {
                        return Err(invalid(
                            format!("model.sectors[{i}].{field}"),
                            format!("must be finite and non-negative, got {value}"),
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Data
// ---------------------------------------------------------------------------

/// Mean and spread of synthetic value-added for one sector.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ProfileConfig {
    /// Mean of the underlying normal distribution.
    pub mu: f64,
    /// Standard deviation of the underlying normal distribution.
    pub sigma: f64,
}

impl From<ProfileConfig> for SectorProfile {
    fn from(profile: ProfileConfig) -> Self {
        Self {
            mu: profile.mu,
            sigma: profile.sigma,
        }
    }
}

/// Boundary and economic data sources.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DataConfig {
    /// GeoJSON file with region boundaries.
    #[serde(default = "default_boundaries")]
    pub boundaries: PathBuf,

    /// JSON file with economic records. Synthetic data is generated when absent.
    #[serde(default)]
    pub economic_data: Option<PathBuf>,

    /// Feature property holding the numeric region code.
    #[serde(default = "default_key_property")]
    pub key_property: String,

    /// Feature property holding the region name.
    #[serde(default = "default_name_property")]
    pub name_property: String,

    /// Seed for synthetic economic data.
    #[serde(default = "default_seed")]
    pub synthetic_seed: u64,

    /// Per-sector synthetic profiles. The reference profiles are used
    /// when absent and the model has four sectors.
    #[serde(default)]
    pub synthetic_profiles: Option<Vec<ProfileConfig>>,
}

impl DataConfig {
    /// Apply environment variable overrides for data sources.
    ///
    /// Relative paths from the environment are taken relative to the
    /// working directory, not the config file's directory.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup(BOUNDARIES_ENV) {
            self.boundaries = absolute_path(val);
        }
        if let Some(val) = lookup(ECONOMIC_DATA_ENV) {
            self.economic_data = Some(absolute_path(val));
        }
    }

    /// Property names used to read boundary features.
    pub fn boundary_fields(&self) -> BoundaryFields {
        BoundaryFields {
            key_property: self.key_property.clone(),
            name_property: self.name_property.clone(),
        }
    }

    /// Synthetic profiles for `sector_count` sectors, if any are known.
    pub fn profiles(&self, sector_count: usize) -> Option<Vec<SectorProfile>> {
        match &self.synthetic_profiles {
            Some(profiles) => Some(profiles.iter().copied().map(SectorProfile::from).collect()),
            None if sector_count == REFERENCE_PROFILES.len() => Some(REFERENCE_PROFILES.to_vec()),
            None => None,
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            boundaries: default_boundaries(),
            economic_data: None,
            key_property: default_key_property(),
            name_property: default_name_property(),
            synthetic_seed: default_seed(),
            synthetic_profiles: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Allocation, tax and classification parameters.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct EngineConfig {
    /// Distance-decay friction of the gravity allocation.
    #[serde(default = "default_friction")]
    pub friction: f64,

    /// Tax rate applied to value-added impact.
    #[serde(default = "default_tax_rate")]
    pub tax_rate: f64,

    /// Number of legend classes per metric.
    #[serde(default = "default_class_count")]
    pub class_count: u8,

    /// Percentile above which values are left out of break computation.
    #[serde(default = "default_outlier_percentile")]
    pub outlier_percentile: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            friction: default_friction(),
            tax_rate: default_tax_rate(),
            class_count: default_class_count(),
            outlier_percentile: default_outlier_percentile(),
        }
    }
}

impl EngineConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.friction.is_finite() || self.friction < 0.0 {
            return Err(invalid(
                "engine.friction",
                format!("must be finite and non-negative, got {}", self.friction),
            ));
        }
        if !self.tax_rate.is_finite() || self.tax_rate < 0.0 {
            return Err(invalid(
                "engine.tax_rate",
                format!("must be finite and non-negative, got {}", self.tax_rate),
            ));
        }
        if self.class_count == 0 {
            return Err(invalid("engine.class_count", "must be at least 1"));
        }
        if !self.outlier_percentile.is_finite()
            || self.outlier_percentile <= 0.0
            || self.outlier_percentile > 100.0
        {
            return Err(invalid(
                "engine.outlier_percentile",
                format!("must be in (0, 100], got {}", self.outlier_percentile),
            ));
        }
        Ok(())
    }

    /// Engine parameters for a simulator.
    pub const fn params(&self) -> SimulationParams {
        SimulationParams {
            friction: self.friction,
            tax_rate: self.tax_rate,
            class_count: self.class_count,
            outlier_percentile: self.outlier_percentile,
        }
    }
}

// ---------------------------------------------------------------------------
// Logging and scenarios
// ---------------------------------------------------------------------------

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error), used when `RUST_LOG`
    /// is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// A named simulation request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScenarioConfig {
    /// Unique scenario name.
    pub name: String,
    /// Origin region.
    pub region: RegionSelector,
    /// Sector name.
    pub sector: String,
    /// Size of the shock.
    pub value: ShockValue,
}

impl ScenarioConfig {
    /// The engine request for this scenario.
    pub fn request(&self) -> SimulationRequest {
        SimulationRequest {
            region: self.region.clone(),
            sector: self.sector.clone(),
            value: self.value,
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_sectors() -> Vec<SectorConfig> {
    REFERENCE_SECTORS
        .iter()
        .map(|name| SectorConfig {
            name: (*name).to_owned(),
            vab_coefficient: None,
            employment_coefficient: None,
        })
        .collect()
}

fn default_coefficients() -> Vec<Vec<f64>> {
    REFERENCE_COEFFICIENTS.iter().map(|row| row.to_vec()).collect()
}

fn default_boundaries() -> PathBuf {
    PathBuf::from("data/regions.geojson")
}

fn default_key_property() -> String {
    DEFAULT_KEY_PROPERTY.to_owned()
}

fn default_name_property() -> String {
    DEFAULT_NAME_PROPERTY.to_owned()
}

const fn default_seed() -> u64 {
    DEFAULT_SEED
}

const fn default_friction() -> f64 {
    DEFAULT_FRICTION
}

const fn default_tax_rate() -> f64 {
    DEFAULT_TAX_RATE
}

const fn default_class_count() -> u8 {
    DEFAULT_CLASS_COUNT
}

const fn default_outlier_percentile() -> f64 {
    DEFAULT_OUTLIER_PERCENTILE
}

fn default_log_level() -> String {
    "info".to_owned()
}
