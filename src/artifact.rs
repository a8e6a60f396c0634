//! Saving downloaded frames and recordings to disk

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::info;

use crate::error::PanelResult;

/// Kind of downloaded payload; decides the file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Frame,
    Recording,
}

impl ArtifactKind {
    /// `owl_frame_<ts>.jpg` / `owl_recording_<ts>.mp4`, where `<ts>` is the
    /// UTC RFC 3339 time with `:` and `.` replaced by `-`
    pub fn file_name(&self, at: DateTime<Utc>) -> String {
        let stamp = at
            .to_rfc3339_opts(SecondsFormat::Millis, true)
            .replace([':', '.'], "-");

        match self {
            ArtifactKind::Frame => format!("owl_frame_{}.jpg", stamp),
            ArtifactKind::Recording => format!("owl_recording_{}.mp4", stamp),
        }
    }
}

/// Destination for downloaded payloads
pub trait ArtifactSink: Send + Sync {
    /// Persist `bytes` under `file_name`, returning where it went
    fn save(&self, file_name: &str, bytes: &[u8]) -> PanelResult<PathBuf>;
}

/// Writes artifacts into a directory, creating it on first use
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ArtifactSink for DirectorySink {
    fn save(&self, file_name: &str, bytes: &[u8]) -> PanelResult<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file_name);
        std::fs::write(&path, bytes)?;

        info!("Saved {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_file_names() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 5).unwrap()
            + chrono::Duration::milliseconds(123);

        assert_eq!(
            ArtifactKind::Frame.file_name(at),
            "owl_frame_2024-05-01T12-30-05-123Z.jpg"
        );
        assert_eq!(
            ArtifactKind::Recording.file_name(at),
            "owl_recording_2024-05-01T12-30-05-123Z.mp4"
        );
    }

    #[test]
    fn test_directory_sink_creates_dir() {
        let temp = tempfile::TempDir::new().unwrap();
        let sink = DirectorySink::new(temp.path().join("nested"));

        let path = sink.save("owl_frame_x.jpg", b"\xff\xd8jpeg").unwrap();

        assert!(path.starts_with(sink.dir()));
        assert_eq!(std::fs::read(path).unwrap(), b"\xff\xd8jpeg");
    }
}
