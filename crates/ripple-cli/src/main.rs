//! Command-line entry point for the Ripple regional impact engine.
//!
//! Loads `ripple-config.yaml` (or the file named by `RIPPLE_CONFIG`, or the
//! first argument), runs every configured scenario, and writes a JSON
//! report to stdout. Logs go to stderr.
//!
//! ```text
//! config --> Workbench --> scenarios --> ScenarioBook --> JSON report
//! ```

mod error;
mod report;

use std::path::PathBuf;

use tracing::info;
use tracing_subscriber::EnvFilter;

use ripple_core::{RippleConfig, ScenarioBook, Workbench};

use crate::error::CliError;
use crate::report::Report;

/// Environment variable naming the configuration file.
const CONFIG_ENV: &str = "RIPPLE_CONFIG";

/// Configuration file used when nothing else is given.
const DEFAULT_CONFIG: &str = "ripple-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if the configuration, the data, or any scenario fails.
fn main() -> Result<(), CliError> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(CONFIG_ENV).ok())
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG), PathBuf::from);
    let config = RippleConfig::from_file(&path)?;

    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!(
        config = %path.display(),
        sectors = config.model.sectors.len(),
        scenarios = config.scenarios.len(),
        "ripple starting"
    );

    let workbench = Workbench::new(config)?;
    let mut book = ScenarioBook::new();
    let count = workbench.run_scenarios(&mut book)?;

    let report = Report::build(&book)?;
    serde_json::to_writer_pretty(std::io::stdout().lock(), &report)?;

    info!(scenarios = count, "ripple finished");
    Ok(())
}
