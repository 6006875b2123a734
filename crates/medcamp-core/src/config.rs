//! Configuration resolution for `MedCamp` tooling.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Global config (~/.config/medcamp/settings.json)
//! 3. Project config (.medcamp/settings.json)
//! 4. Environment variables
//! 5. CLI arguments (highest priority, applied by the binary)
//!
//! Workflow windows and the schedule lead time are constants, not settings.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use tracing::debug;

use crate::deadline::{Clock, FixedClock, SystemClock};
use crate::error::{Error, Result};
use crate::time_point::{RawTimestamp, try_normalize};

/// Complete `MedCamp` configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub reconcile: ReconcileConfig,
    pub clock: ClockConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON log lines.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Reconciliation reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Exit non-zero when drift is found (for cron / CI checks).
    pub fail_on_drift: bool,
    /// Cap on ids listed per drift category in text output.
    pub max_listed_ids: usize,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            fail_on_drift: false,
            max_listed_ids: 50,
        }
    }
}

/// Where "now" comes from.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ClockConfig {
    /// Pin "now", e.g. to replay a historic export.
    pub fixed_now: Option<String>,
}

/// One settings file as written. Every key is optional so that a later
/// layer only replaces the keys it names.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SettingsLayer {
    logging: LoggingLayer,
    reconcile: ReconcileLayer,
    clock: ClockLayer,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LoggingLayer {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ReconcileLayer {
    fail_on_drift: Option<bool>,
    max_listed_ids: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ClockLayer {
    fixed_now: Option<String>,
}

impl SettingsLayer {
    fn apply_to(self, config: &mut Config) {
        if let Some(level) = self.logging.level {
            config.logging.level = level;
        }
        if let Some(json) = self.logging.json {
            config.logging.json = json;
        }
        if let Some(fail) = self.reconcile.fail_on_drift {
            config.reconcile.fail_on_drift = fail;
        }
        if let Some(max) = self.reconcile.max_listed_ids {
            config.reconcile.max_listed_ids = max;
        }
        if let Some(at) = self.clock.fixed_now {
            config.clock.fixed_now = Some(at);
        }
    }
}

impl ClockConfig {
    /// The pinned instant, if any. An unreadable value is an error rather
    /// than a silent fallback to wall-clock time.
    pub fn fixed_instant(&self) -> Result<Option<DateTime<Utc>>> {
        self.fixed_now
            .as_deref()
            .map(|raw| {
                try_normalize(&RawTimestamp::from(raw))
                    .map_err(|e| Error::Config(format!("Invalid clock.fixed_now {raw:?}: {e}")))
            })
            .transpose()
    }

    /// Build the configured clock.
    pub fn clock(&self) -> Result<Box<dyn Clock>> {
        Ok(match self.fixed_instant()? {
            Some(at) => Box::new(FixedClock(at)),
            None => Box::new(SystemClock),
        })
    }
}

/// Load configuration with hierarchical resolution.
pub fn load_config(project_dir: Option<&Path>) -> Result<Config> {
    resolve_config(
        global_config_path().as_deref(),
        project_dir.map(project_config_path).as_deref(),
        |key| std::env::var(key).ok(),
    )
}

/// Settings file for the project rooted at `dir`.
pub fn project_config_path(dir: &Path) -> PathBuf {
    dir.join(".medcamp").join("settings.json")
}

/// Defaults, then each existing settings file in order, then the environment.
fn resolve_config(
    global_path: Option<&Path>,
    project_path: Option<&Path>,
    var: impl Fn(&str) -> Option<String>,
) -> Result<Config> {
    let mut config = Config::default();
    for path in global_path.into_iter().chain(project_path) {
        if path.exists() {
            load_settings_layer(path)?.apply_to(&mut config);
            debug!(path = %path.display(), "Applied settings file");
        }
    }
    apply_env_overrides(&mut config, var);
    Ok(config)
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .ok()
            .map(|h| PathBuf::from(h).join(".medcamp").join("settings.json"))
    }
    #[cfg(target_os = "macos")]
    {
        std::env::var("HOME")
            .ok()
            .map(|h| PathBuf::from(h).join("Library/Application Support/medcamp/settings.json"))
    }
    #[cfg(target_os = "linux")]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| std::env::var("HOME").ok().map(|h| PathBuf::from(h).join(".config")))
            .map(|p| p.join("medcamp").join("settings.json"))
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    {
        None
    }
}

fn load_settings_layer(path: &Path) -> Result<SettingsLayer> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

fn apply_env_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(val) = var("MEDCAMP_LOG_LEVEL") {
        config.logging.level = val;
    }
    if let Some(val) = var("MEDCAMP_LOG_JSON") {
        config.logging.json = parse_flag(&val);
    }
    if let Some(val) = var("MEDCAMP_FAIL_ON_DRIFT") {
        config.reconcile.fail_on_drift = parse_flag(&val);
    }
    if let Some(val) = var("MEDCAMP_NOW") {
        config.clock.fixed_now = Some(val);
    }
}

fn parse_flag(val: &str) -> bool {
    matches!(
        val.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
