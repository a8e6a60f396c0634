use std::fmt;

use thiserror::Error;

/// Why an outbound request was aborted before it completed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// The per-request deadline elapsed
    Deadline,
    /// A newer request to the same endpoint replaced this one
    Superseded,
    /// The panel is being torn down
    Shutdown,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::Deadline => write!(f, "deadline elapsed"),
            AbortReason::Superseded => write!(f, "superseded by a newer request"),
            AbortReason::Shutdown => write!(f, "panel shutting down"),
        }
    }
}

/// Errors surfaced by the panel components
///
/// Every variant is recoverable: components fall back to an idle or
/// searching state and report the message through the notification sink.
#[derive(Debug, Error)]
pub enum PanelError {
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("Request to {endpoint} timed out ({reason})")]
    RequestTimedOut {
        endpoint: String,
        reason: AbortReason,
    },

    #[error("Request to {endpoint} failed with status {status}")]
    RequestFailed { endpoint: String, status: u16 },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Device capability unavailable: {0}")]
    DeviceCapabilityUnavailable(String),

    #[error("Failed to save file: {0}")]
    Io(#[from] std::io::Error),
}

impl PanelError {
    /// HTTP status carried by `RequestFailed`, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            PanelError::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the request was aborted, whatever the reason
    pub fn is_timeout(&self) -> bool {
        matches!(self, PanelError::RequestTimedOut { .. })
    }
}

pub type PanelResult<T> = std::result::Result<T, PanelError>;
