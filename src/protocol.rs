//! JSON payloads exchanged with the appliance REST API

use serde::{Deserialize, Serialize};

use crate::gps::GpsReport;

/// `{success, message?}` reply from the recording and detection endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandAck {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body for `POST /api/recording/start`
#[derive(Debug, Clone, Serialize)]
pub struct StartRecordingRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps: Option<GpsReport>,
}

/// Telemetry snapshot from `GET /api/system_stats`
///
/// Every field is optional; older firmware omits some and names others
/// differently (`detection_enable` vs `detection_enabled`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemStats {
    pub cpu_percent: Option<f64>,
    pub cpu_temp: Option<f64>,
    pub memory_percent: Option<f64>,
    pub disk_percent: Option<f64>,
    #[serde(alias = "detection_enable")]
    pub detection_enabled: Option<bool>,
    #[serde(alias = "recording_enable")]
    pub recording_enabled: Option<bool>,
    pub timestamp: Option<String>,
    /// Upstream connection state ("Connected", "Retrying", ...)
    pub status: Option<String>,
    pub retry_count: Option<u32>,
    pub max_retries: Option<u32>,
}
