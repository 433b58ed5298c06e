use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use fw_alerts::{AlertConfig, CarouselConfig};
use fw_scenarios::{SeedConfig, SimulatorConfig};

pub const CONFIG_ENV: &str = "FLOORWATCH_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "floorwatch.yaml";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    pub simulator: SimulatorConfig,
    pub alerts: AlertConfig,
    pub carousel: CarouselConfig,
    pub seed: SeedConfig,
}

impl DashboardConfig {
    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).context("parsing dashboard config")
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_yaml(&text)
    }
}

pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Loads the config file if there is one; any problem falls back to defaults.
pub fn load_config() -> DashboardConfig {
    let path = config_path();
    if !path.exists() {
        info!(path = %path.display(), "no config file, using defaults");
        return DashboardConfig::default();
    }
    DashboardConfig::load_from(&path).unwrap_or_else(|err| {
        warn!(path = %path.display(), error = %err, "invalid config, using defaults");
        DashboardConfig::default()
    })
}
