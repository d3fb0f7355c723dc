//! Configuration loading

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub assembly: AssemblyConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub reveal: RevealConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyConfig {
    /// Path to the assembly description
    #[serde(default = "default_assembly_path")]
    pub path: String,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            path: default_assembly_path(),
        }
    }
}

fn default_assembly_path() -> String {
    "./assets/master_cylinder.toml".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Drag samples between a plug's start and its socket
    #[serde(default = "default_approach_steps")]
    pub approach_steps: u32,
    /// Drag samples while sliding a paired plug down the socket axis
    #[serde(default = "default_seat_steps")]
    pub seat_steps: u32,
    /// Enable plugs that the description leaves disabled
    #[serde(default)]
    pub activate_all: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            approach_steps: default_approach_steps(),
            seat_steps: default_seat_steps(),
            activate_all: false,
        }
    }
}

fn default_approach_steps() -> u32 {
    20
}

fn default_seat_steps() -> u32 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealConfig {
    /// Run the cutaway reveal after the last plug is seated
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_true() -> bool {
    true
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}

/// Save default configuration to file
pub fn save_default_config(path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(&Config::default())?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = load_config(&temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.simulation.approach_steps, 20);
        assert_eq!(config.simulation.seat_steps, 10);
        assert!(config.reveal.enabled);
    }

    #[test]
    fn test_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("snapfit.toml");
        std::fs::write(&path, "[simulation]\nseat_steps = 4\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.simulation.seat_steps, 4);
        assert_eq!(config.simulation.approach_steps, 20);
        assert_eq!(config.assembly.path, "./assets/master_cylinder.toml");
    }

    #[test]
    fn test_save_default_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("snapfit.toml");
        save_default_config(&path).unwrap();

        let config = load_config(&path).unwrap();
        assert!(!config.simulation.activate_all);
        assert!(config.reveal.enabled);
    }
}
