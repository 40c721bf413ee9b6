// ⚙️ Configuration - defaults → TOML file → MONEY_TRACKER_* environment
//
// The PIN default is fixed at build time from MONEY_TRACKER_PIN, falling
// back to "1234". A config file or the runtime environment can override it.

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::lock::{DEFAULT_PIN, INACTIVITY_TIMEOUT_MS, LOCK_CHECK_INTERVAL, PIN_LENGTH};

const APP_DIR: &str = "money-tracker";

/// PIN baked in at build time
pub fn build_time_pin() -> &'static str {
    option_env!("MONEY_TRACKER_PIN").unwrap_or(DEFAULT_PIN)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Unlock code (4 characters)
    pub pin: String,

    /// SQLite file holding the key-value store
    pub data_path: PathBuf,

    /// Log file; the terminal UI owns stdout
    pub log_path: PathBuf,

    pub inactivity_timeout_secs: u64,
    pub lock_check_interval_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = default_data_dir();

        Self {
            pin: build_time_pin().to_string(),
            data_path: data_dir.join("money_tracker.db"),
            log_path: data_dir.join("money-tracker.log"),
            inactivity_timeout_secs: (INACTIVITY_TIMEOUT_MS / 1000) as u64,
            lock_check_interval_secs: LOCK_CHECK_INTERVAL.as_secs(),
        }
    }
}

impl AppConfig {
    /// Load from the default config file location (if present) and env.
    pub fn load() -> Result<Self> {
        Self::load_from(&default_config_path())
    }

    /// Load from `path` (skipped when missing) layered over defaults,
    /// then `MONEY_TRACKER_*` environment variables.
    pub fn load_from(path: &Path) -> Result<Self> {
        let defaults = AppConfig::default();

        let settings = Config::builder()
            .set_default("pin", defaults.pin.clone())?
            .set_default("data_path", defaults.data_path.to_string_lossy().to_string())?
            .set_default("log_path", defaults.log_path.to_string_lossy().to_string())?
            .set_default("inactivity_timeout_secs", defaults.inactivity_timeout_secs)?
            .set_default("lock_check_interval_secs", defaults.lock_check_interval_secs)?
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(Environment::with_prefix("MONEY_TRACKER"))
            .build()
            .with_context(|| format!("Failed to read config from {:?}", path))?;

        let config: AppConfig = settings
            .try_deserialize()
            .context("Invalid configuration values")?;

        config.validated()
    }

    fn validated(self) -> Result<Self> {
        if self.pin.chars().count() != PIN_LENGTH || !self.pin.chars().all(|c| c.is_ascii_digit()) {
            anyhow::bail!("pin must be exactly {} digits", PIN_LENGTH);
        }
        if self.inactivity_timeout_secs == 0 || self.lock_check_interval_secs == 0 {
            anyhow::bail!("lock timings must be greater than zero");
        }
        Ok(self)
    }

    pub fn inactivity_timeout_ms(&self) -> i64 {
        i64::try_from(self.inactivity_timeout_secs)
            .unwrap_or(i64::MAX)
            .saturating_mul(1000)
    }

    pub fn lock_check_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.lock_check_interval_secs)
    }
}

pub fn default_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join(APP_DIR).join("config.toml")
    } else {
        PathBuf::from("money-tracker.toml")
    }
}

pub fn default_data_dir() -> PathBuf {
    if let Some(data_dir) = dirs::data_dir() {
        data_dir.join(APP_DIR)
    } else {
        PathBuf::from(".")
    }
}
