//! Loader settings and persistence.

use loader_core::{WriteFailurePolicy, DEFAULT_MAX_INSTANCES};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Loader settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Upper bound for `--num-instances`
    pub max_instances: usize,

    /// Delay between queryability checks for running instances
    pub poll_interval_ms: u64,

    /// What a failed path write does to the run
    pub write_failure_policy: WritePolicySetting,

    /// Libraries injected when none are given on the command line
    pub default_libraries: Vec<PathBuf>,

    /// Knowledge library used when `--knowledge` is absent
    pub knowledge_library: Option<PathBuf>,
}

/// Serializable write-failure policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WritePolicySetting {
    #[default]
    Lenient,
    Strict,
}

impl From<WritePolicySetting> for WriteFailurePolicy {
    fn from(setting: WritePolicySetting) -> Self {
        match setting {
            WritePolicySetting::Lenient => Self::Lenient,
            WritePolicySetting::Strict => Self::Strict,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_instances: DEFAULT_MAX_INSTANCES,
            poll_interval_ms: 100,
            write_failure_policy: WritePolicySetting::Lenient,
            default_libraries: Vec::new(),
            knowledge_library: None,
        }
    }
}

impl Config {
    /// Get config file path.
    ///
    /// Returns: %APPDATA%\GameLoader\config.json
    pub fn config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("GameLoader");
        path.push("config.json");
        path
    }

    /// Load configuration from the default location.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded config from: {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!("Failed to parse config: {}", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("No config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> anyhow::Result<PathBuf> {
        let path = Self::config_path();
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;

        log::info!("Saved config to: {}", path.display());
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
