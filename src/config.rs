//! Configuration management for device-inspector
//!
//! Config file location:
//! - Linux: ~/.config/device-inspector/config.toml
//! - macOS: ~/Library/Application Support/device-inspector/config.toml
//! - Windows: %APPDATA%/device-inspector/config.toml
//!
//! You can override the config location by setting `DEVICE_INSPECTOR_CONFIG_PATH`
//! or passing `--config`.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::detect::cpu::DEFAULT_PROBE_ITERATIONS;
use crate::detect::geolocation::DEFAULT_MAP_BASE_URL;

pub const CONFIG_PATH_ENV: &str = "DEVICE_INSPECTOR_CONFIG_PATH";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// User-agent source for the browser and OS cards
    #[serde(default)]
    pub browser: BrowserConfig,

    /// Position reported by the native geolocation service
    #[serde(default)]
    pub geolocation: GeolocationConfig,

    /// Live clock settings
    #[serde(default)]
    pub clock: ClockConfig,

    /// Performance probe settings
    #[serde(default)]
    pub cpu: CpuConfig,

    /// Locale overrides
    #[serde(default)]
    pub language: LanguageConfig,
}

impl Config {
    /// Load configuration from the default location, or defaults if absent
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path, or defaults if absent
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        Ok(config)
    }

    /// Write to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Ok(PathBuf::from(trimmed));
            }
        }

        let proj_dirs = project_dirs()?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }
}

pub(crate) fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "device-inspector", "device-inspector")
        .context("Could not determine project directories")
}

/// Where the dashboard writes its log file.
pub fn log_path() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().join("device-inspector.log"))
}

/// Browser settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// User-agent string used when neither `--user-agent` nor the
    /// environment provides one
    pub user_agent: Option<String>,
}

/// Geolocation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeolocationConfig {
    /// When false, every position request is denied
    #[serde(default = "default_true")]
    pub enabled: bool,

    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    /// Accuracy radius in meters
    #[serde(default = "default_accuracy_m")]
    pub accuracy_m: f64,

    pub altitude_m: Option<f64>,

    /// Speed in meters per second
    pub speed_mps: Option<f64>,

    /// How often an active watch re-reports the position
    #[serde(default = "default_watch_interval_ms")]
    pub watch_interval_ms: u64,

    /// Map link prefix; `?q=lat,lon` is appended
    #[serde(default = "default_map_base_url")]
    pub map_base_url: String,
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            latitude: None,
            longitude: None,
            accuracy_m: default_accuracy_m(),
            altitude_m: None,
            speed_mps: None,
            watch_interval_ms: default_watch_interval_ms(),
            map_base_url: default_map_base_url(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_accuracy_m() -> f64 {
    50.0
}

fn default_watch_interval_ms() -> u64 {
    5000
}

fn default_map_base_url() -> String {
    DEFAULT_MAP_BASE_URL.to_string()
}

/// Clock settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Refresh period of the live clock
    #[serde(default = "default_refresh_ms")]
    pub refresh_ms: u64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            refresh_ms: default_refresh_ms(),
        }
    }
}

fn default_refresh_ms() -> u64 {
    1000
}

/// CPU probe settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpuConfig {
    /// Iterations of the synthetic workload
    #[serde(default = "default_probe_iterations")]
    pub probe_iterations: u64,
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            probe_iterations: default_probe_iterations(),
        }
    }
}

fn default_probe_iterations() -> u64 {
    DEFAULT_PROBE_ITERATIONS
}

/// Language settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LanguageConfig {
    /// BCP 47 tags, most preferred first. Empty means read the environment.
    #[serde(default)]
    pub preferred: Vec<String>,
}
