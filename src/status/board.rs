use std::time::Duration;

use chrono::Local;
use serde::Serialize;

use crate::protocol::SystemStats;

const CPU_MAX_PERCENT: f64 = 100.0;
const TEMP_MAX_CELSIUS: f64 = 85.0;

/// Traffic-light colour for a gauge: green at 0, red at `max`
pub fn color_for_value(value: f64, max: f64) -> String {
    let normalized = (value / max).clamp(0.0, 1.0);
    let hue = ((1.0 - normalized) * 120.0).round() as i64;
    format!("hsl({}, 70%, 50%)", hue)
}

/// Connection indicator state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ConnectionState {
    Unknown,
    Connected,
    /// The appliance reports it is retrying its own upstream link
    Retrying { retry: u32, max: u32 },
    Disconnected,
    /// A status label this client does not know
    Other(String),
}

impl ConnectionState {
    fn from_stats(stats: &SystemStats) -> Self {
        match stats.status.as_deref() {
            None | Some("Connected") => ConnectionState::Connected,
            Some("Retrying") => ConnectionState::Retrying {
                retry: stats.retry_count.unwrap_or(0),
                max: stats.max_retries.unwrap_or(0),
            },
            Some("Disconnected") => ConnectionState::Disconnected,
            Some(other) => ConnectionState::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> String {
        match self {
            ConnectionState::Unknown => "Connecting...".to_string(),
            ConnectionState::Connected => "Connected".to_string(),
            ConnectionState::Retrying { retry, max } => format!("Retrying ({}/{})", retry, max),
            ConnectionState::Disconnected => "Disconnected".to_string(),
            ConnectionState::Other(label) => label.clone(),
        }
    }

    pub fn is_retrying(&self) -> bool {
        matches!(self, ConnectionState::Retrying { .. })
    }
}

/// Display targets for telemetry. A view without a target for some field
/// leaves the default no-op in place and that field is skipped.
pub trait StatusView: Send + Sync {
    fn show_cpu(&self, _percent: f64, _color: &str) {}
    fn show_temperature(&self, _celsius: f64, _color: &str) {}
    fn show_memory(&self, _percent: f64) {}
    fn show_disk(&self, _percent: f64) {}
    fn show_detection(&self, _enabled: bool) {}
    fn show_recording(&self, _recording: bool) {}
    fn show_timestamp(&self, _timestamp: &str) {}
    fn show_connection(&self, _connection: &ConnectionState) {}
}

/// Last-known telemetry and connection state
#[derive(Debug, Clone, Serialize)]
pub struct StatusBoard {
    pub stats: Option<SystemStats>,
    pub connection: ConnectionState,
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self {
            stats: None,
            connection: ConnectionState::Unknown,
        }
    }
}

impl StatusBoard {
    /// Project a fresh snapshot; absent fields keep their previous display
    pub fn apply(&mut self, stats: SystemStats, view: &dyn StatusView) {
        if let Some(cpu) = stats.cpu_percent {
            view.show_cpu(cpu, &color_for_value(cpu, CPU_MAX_PERCENT));
        }
        if let Some(temp) = stats.cpu_temp {
            view.show_temperature(temp, &color_for_value(temp, TEMP_MAX_CELSIUS));
        }
        if let Some(memory) = stats.memory_percent {
            view.show_memory(memory);
        }
        if let Some(disk) = stats.disk_percent {
            view.show_disk(disk);
        }
        if let Some(detection) = stats.detection_enabled {
            view.show_detection(detection);
        }
        if let Some(recording) = stats.recording_enabled {
            view.show_recording(recording);
        }

        let timestamp = stats
            .timestamp
            .clone()
            .unwrap_or_else(|| Local::now().format("%Y-%m-%d %H:%M:%S").to_string());
        view.show_timestamp(&timestamp);

        self.connection = ConnectionState::from_stats(&stats);
        view.show_connection(&self.connection);
        self.stats = Some(stats);
    }

    /// Keep last values; downgrade to disconnected unless retrying
    pub fn fetch_failed(&mut self, view: &dyn StatusView) {
        if self.connection.is_retrying() {
            return;
        }
        self.connection = ConnectionState::Disconnected;
        view.show_connection(&self.connection);
    }

    /// Poll faster while the appliance is retrying
    pub fn next_interval(&self, normal: Duration, retry: Duration) -> Duration {
        if self.connection.is_retrying() {
            retry
        } else {
            normal
        }
    }
}
