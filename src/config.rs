use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::ledger::Identity;

pub const DATA_DIR_ENV: &str = "SHIFTCLOCK_DATA_DIR";
pub const DEBUG_ENV: &str = "SHIFTCLOCK_DEBUG";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub api_token: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080/api".into(),
            api_token: None,
            request_timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerIntervals {
    pub tick_secs: u64,
    pub idle_poll_secs: u64,
    /// Draft auto-save cadence, in elapsed-time ticks.
    pub autosave_every_ticks: u32,
    pub connectivity_poll_secs: u64,
    pub reload_delay_secs: u64,
    pub reconcile_retry_secs: u64,
}

impl Default for TrackerIntervals {
    fn default() -> Self {
        Self {
            tick_secs: 1,
            idle_poll_secs: 1,
            autosave_every_ticks: 10,
            connectivity_poll_secs: 3,
            reload_delay_secs: 10,
            reconcile_retry_secs: 30,
        }
    }
}

impl TrackerIntervals {
    pub fn tick(&self) -> Duration {
        Duration::from_secs(self.tick_secs.max(1))
    }

    pub fn idle_poll(&self) -> Duration {
        Duration::from_secs(self.idle_poll_secs.max(1))
    }

    pub fn connectivity_poll(&self) -> Duration {
        Duration::from_secs(self.connectivity_poll_secs.max(1))
    }

    pub fn reload_delay(&self) -> Duration {
        Duration::from_secs(self.reload_delay_secs)
    }

    pub fn reconcile_retry(&self) -> Duration {
        Duration::from_secs(self.reconcile_retry_secs.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdleConfig {
    /// A probe reading at or above this counts the second as idle.
    pub idle_sample_threshold_secs: u64,
    pub idle_warning_secs: u64,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            idle_sample_threshold_secs: 1,
            idle_warning_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenshotConfig {
    pub block_secs: u64,
    pub shots_per_block: usize,
    pub min_spacing_secs: u64,
    pub max_retries: u32,
    pub evaluation_window_secs: u64,
    pub min_active_secs: u64,
    /// Program (and arguments) that captures, uploads and prints the URL.
    pub capture_command: Option<Vec<String>>,
}

impl Default for ScreenshotConfig {
    fn default() -> Self {
        Self {
            block_secs: 600,
            shots_per_block: 5,
            min_spacing_secs: 30,
            max_retries: 20,
            evaluation_window_secs: 30,
            min_active_secs: 15,
            capture_command: None,
        }
    }
}

impl ScreenshotConfig {
    pub fn block(&self) -> Duration {
        Duration::from_secs(self.block_secs.max(1))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub backend: BackendConfig,
    pub identity: Identity,
    pub intervals: TrackerIntervals,
    pub idle: IdleConfig,
    pub screenshots: ScreenshotConfig,
}

impl TrackerConfig {
    /// Reads the config file; a missing or unreadable file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config = serde_json::from_str(&contents).unwrap_or_else(|err| {
            warn!(
                "Ignoring unparsable config at {}: {err}; using defaults",
                path.display()
            );
            Self::default()
        });
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    /// Applies environment switches on top of the file values.
    pub fn with_env_overrides(mut self) -> Self {
        let debug_mode = std::env::var(DEBUG_ENV)
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        if debug_mode {
            self.intervals.autosave_every_ticks = 1;
        }
        self
    }
}

pub fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("shiftclock")
}
