//! GPS position feed
//!
//! This module provides:
//! - `GpsSample` and the accuracy classification shown next to the GPS icon
//! - `PositionSource`: the platform positioning seam
//! - `ReportThrottle`: significant-change filter for upstream reports
//! - `GpsFeed`: the watch task tying them together

mod feed;
mod source;
mod throttle;

pub use feed::GpsFeed;
pub use source::{FixedPositionSource, NoPositionSource, PositionEvent, PositionSource};
pub use throttle::ReportThrottle;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A single position fix
#[derive(Debug, Clone, PartialEq)]
pub struct GpsSample {
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy radius in meters
    pub accuracy_m: f64,
    pub taken_at: DateTime<Utc>,
}

impl GpsSample {
    pub fn new(latitude: f64, longitude: f64, accuracy_m: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_m,
            taken_at: Utc::now(),
        }
    }

    /// Wire form used by `/api/update_gps` and the recording start body
    pub fn to_report(&self) -> GpsReport {
        GpsReport {
            latitude: self.latitude,
            longitude: self.longitude,
            accuracy: self.accuracy_m,
            timestamp: self.taken_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpsReport {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccuracyTier {
    Good,
    Medium,
    Poor,
}

impl AccuracyTier {
    pub fn classify(accuracy_m: f64) -> Self {
        if accuracy_m <= 5.0 {
            AccuracyTier::Good
        } else if accuracy_m <= 10.0 {
            AccuracyTier::Medium
        } else {
            AccuracyTier::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccuracyTier::Good => "good",
            AccuracyTier::Medium => "medium",
            AccuracyTier::Poor => "poor",
        }
    }
}

/// What the GPS indicator shows
#[derive(Debug, Clone, PartialEq)]
pub enum GpsStatus {
    Disabled,
    /// The platform has no positioning capability
    Unavailable,
    /// Watching, no fix yet
    Searching,
    Fix { accuracy_m: f64 },
    Error(String),
}

impl GpsStatus {
    /// Icon tier; `None` while disabled. Errors and "no fix yet" share the
    /// poor tier.
    pub fn tier(&self) -> Option<AccuracyTier> {
        match self {
            GpsStatus::Disabled => None,
            GpsStatus::Fix { accuracy_m } => Some(AccuracyTier::classify(*accuracy_m)),
            GpsStatus::Unavailable | GpsStatus::Searching | GpsStatus::Error(_) => {
                Some(AccuracyTier::Poor)
            }
        }
    }

    pub fn text(&self) -> String {
        match self {
            GpsStatus::Disabled => "GPS disabled".to_string(),
            GpsStatus::Unavailable => "GPS not available".to_string(),
            GpsStatus::Searching => "Searching...".to_string(),
            GpsStatus::Fix { accuracy_m } => format_accuracy(*accuracy_m),
            GpsStatus::Error(message) => message.clone(),
        }
    }
}

/// `±3.2m`
pub fn format_accuracy(accuracy_m: f64) -> String {
    format!("±{:.1}m", accuracy_m)
}
