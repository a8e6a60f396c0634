//! Recording session management
//!
//! This module provides:
//! - `RecordingSession`: the pure Idle/Starting/Active/Stopping state machine
//! - `RecordingController`: the task that drives it from commands and ticks
//! - `RecordingView`: the display seam (button, status line, saved file)

mod controller;
mod session;
mod view;

pub use controller::{ControllerDeps, RecordingController};
pub use session::{Progress, RecordingSession, SessionState, StopReason};
pub use view::{status_line, RecordingView};
