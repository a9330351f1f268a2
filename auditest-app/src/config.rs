use anyhow::{Context, Result};
use auditest_core::ExperimentConfig;
use std::fs;
use std::path::Path;
use tracing::info;

/// Reads and validates an experiment configuration file.
pub fn load_config(path: &Path) -> Result<ExperimentConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration {}", path.display()))?;
    let config = ExperimentConfig::from_json(&text)
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;

    info!(
        "Loaded {} conditions in {} groups from {}",
        config.condition_count(),
        config.condition_groups.len(),
        path.display()
    );
    Ok(config)
}
