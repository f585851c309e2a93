//! Configuration file support for mesoplan.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/mesoplan/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub equipment: EquipmentConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Remote service connection settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Static credential sent as the `api-key` header
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Hard ceiling on pages fetched from any listing endpoint
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            page_size: default_page_size(),
            max_pages: default_max_pages(),
        }
    }
}

impl ApiConfig {
    /// Return the credential or fail with a configuration error
    pub fn require_api_key(&self) -> Result<&str> {
        match self.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(Error::Config(
                "api.api_key must be set to talk to the remote service".into(),
            )),
        }
    }
}

/// Synchronization behaviour
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_folder_title")]
    pub folder_title: String,

    /// Pause after every successful write
    #[serde(default = "default_write_delay_ms")]
    pub write_delay_ms: u64,

    /// Overrides `<data_dir>/routine_hashes.json`
    #[serde(default)]
    pub hash_cache_file: Option<PathBuf>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            folder_title: default_folder_title(),
            write_delay_ms: default_write_delay_ms(),
            hash_cache_file: None,
        }
    }
}

impl SyncConfig {
    pub fn write_delay(&self) -> Duration {
        Duration::from_millis(self.write_delay_ms)
    }
}

/// Rate-limit retry parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Wait applied after a 429 without a Retry-After hint
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: u64,

    #[serde(default = "default_max_jitter_ms")]
    pub max_jitter_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_secs: default_backoff_secs(),
            max_jitter_ms: default_max_jitter_ms(),
        }
    }
}

/// Bar and plate set for a plate-loaded implement
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlateConfig {
    /// Empty bar weight in kg
    pub bar: f64,
    /// Per-side rounding step in kg
    pub step: f64,
    /// Available plate denominations in kg
    pub plates: Vec<f64>,
}

/// Equipment rounding configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EquipmentConfig {
    #[serde(default = "default_smith")]
    pub smith: PlateConfig,

    /// When unset, barbell lifts are reported as unsupported
    #[serde(default)]
    pub barbell: Option<PlateConfig>,
}

impl Default for EquipmentConfig {
    fn default() -> Self {
        Self {
            smith: default_smith(),
            barbell: None,
        }
    }
}

/// Volume analysis parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_secondary_weight")]
    pub secondary_weight: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            secondary_weight: default_secondary_weight(),
        }
    }
}

/// Log output settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Level for this crate's events; RUST_LOG overrides it
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

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("mesoplan")
}

fn default_base_url() -> String {
    "https://api.hevyapp.com".into()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_page_size() -> u32 {
    10
}

fn default_max_pages() -> u32 {
    100
}

fn default_folder_title() -> String {
    "Plan".into()
}

fn default_write_delay_ms() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    5
}

fn default_backoff_secs() -> u64 {
    130
}

fn default_max_jitter_ms() -> u64 {
    500
}

fn default_smith() -> PlateConfig {
    PlateConfig {
        bar: 11.3,
        step: 1.25,
        plates: vec![20.0, 10.0, 5.0, 2.5, 1.25],
    }
}

fn default_secondary_weight() -> f64 {
    0.5
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("mesoplan").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Where the routine hash cache lives
    pub fn hash_cache_path(&self) -> PathBuf {
        self.sync
            .hash_cache_file
            .clone()
            .unwrap_or_else(|| self.data.data_dir.join("routine_hashes.json"))
    }
}
