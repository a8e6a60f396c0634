//! System telemetry display
//!
//! - `StatusBoard`: last-known telemetry plus the connection indicator
//! - `StatusView`: per-field display targets, each optional
//! - `StatusPoller`: the periodic fetch task

mod board;
mod poller;

pub use board::{color_for_value, ConnectionState, StatusBoard, StatusView};
pub use poller::StatusPoller;
