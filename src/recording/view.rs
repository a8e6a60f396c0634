use std::path::Path;

use super::session::{Progress, SessionState};
use crate::gps::GpsSample;

/// Display side of the recording controller (record button, status line,
/// file save prompt). Every method has a no-op default so a view only
/// implements what it can show.
pub trait RecordingView: Send + Sync {
    /// Button label, spinner and enabled state follow the session state
    fn on_state(&self, _state: SessionState) {}

    /// Called once on entering `Active` and on every tick after that
    fn on_progress(&self, _progress: &Progress, _gps: Option<&GpsSample>) {}

    /// The stopped recording was written to `path`
    fn on_saved(&self, _path: &Path) {}
}

/// Status line shown under the record button
pub fn status_line(progress: &Progress, gps: Option<&GpsSample>) -> String {
    match gps {
        Some(sample) => format!(
            "Recording: {} (GPS: {})",
            progress.display(),
            crate::gps::format_accuracy(sample.accuracy_m)
        ),
        None => format!("Recording: {}", progress.display()),
    }
}
