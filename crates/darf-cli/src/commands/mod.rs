pub mod batch;
pub mod config;
pub mod process;

use std::path::{Path, PathBuf};

use tracing::debug;

use darf_core::models::config::DarfConfig;

/// `<config dir>/darf/config.json`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("darf")
        .join("config.json")
}

/// Explicit config file, else the default location if present, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<DarfConfig> {
    if let Some(path) = config_path {
        return DarfConfig::from_file(Path::new(path))
            .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path, e));
    }

    let default = default_config_path();
    if default.exists() {
        debug!("Using config at {}", default.display());
        return Ok(DarfConfig::from_file(&default)?);
    }

    Ok(DarfConfig::default())
}
