use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub device: DeviceConfig,
    pub dispatcher: DispatcherConfig,
    pub recording: RecordingConfig,
    pub gps: GpsConfig,
    pub status: StatusConfig,
    pub notifications: NotificationConfig,
    pub downloads: DownloadConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Base URL of the OWL appliance (e.g. "http://owl.local:5000")
    pub base_url: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://owl.local:5000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    pub default_timeout_ms: u64,
    /// Recording finalization runs server side before the video is returned
    pub stop_timeout_ms: u64,
}

impl DispatcherConfig {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: 10_000,
            stop_timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Maximum session length before the controller stops on its own
    pub ceiling_secs: u64,
    /// Bitrate used for the size estimate only
    pub bitrate_bps: u64,
    pub tick_ms: u64,
}

impl RecordingConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            ceiling_secs: 30,
            bitrate_bps: 2_000_000,
            tick_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GpsConfig {
    pub min_degrees_delta: f64,
    pub min_accuracy_delta_m: f64,
}

impl Default for GpsConfig {
    fn default() -> Self {
        Self {
            min_degrees_delta: 0.0001,
            min_accuracy_delta_m: 1.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    pub poll_interval_ms: u64,
    /// Faster cadence used while the appliance reports it is retrying
    pub retry_interval_ms: u64,
}

impl StatusConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 3000,
            retry_interval_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub capacity: usize,
    pub ttl_ms: u64,
}

impl NotificationConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            capacity: 5,
            ttl_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    pub dir: String,
}

impl DownloadConfig {
    /// Download directory with `~` expanded
    pub fn resolved_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.dir).into_owned())
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            dir: "~/Downloads".to_string(),
        }
    }
}

impl Config {
    /// Load from `path` (extension optional), then `OWL_PANEL__SECTION__KEY`
    /// environment overrides. A missing file falls back to defaults.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("OWL_PANEL").separator("__"))
            .build()
            .with_context(|| format!("Failed to read config from {}", path))?;

        settings
            .try_deserialize()
            .context("Invalid panel configuration")
    }
}
