//! Error types for the command-line runner.

use ripple_core::{ConfigError, ScenarioError, WorkbenchError};

/// Errors that can occur while running configured scenarios.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// The configuration file could not be loaded.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Building the model, loading data, or running a scenario failed.
    #[error("simulation error: {0}")]
    Workbench(#[from] WorkbenchError),

    /// Two scenarios could not be compared.
    #[error("comparison error: {0}")]
    Scenario(#[from] ScenarioError),

    /// The report could not be written.
    #[error("output error: {0}")]
    Output(#[from] serde_json::Error),
}
