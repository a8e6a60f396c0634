use serde::Serialize;
use tokio::time::Instant;

use crate::config::RecordingConfig;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Lifecycle of a recording session; exactly one at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Idle,
    Starting,
    Active,
    Stopping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    User,
    Ceiling,
}

/// Projection of an active session at one instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub elapsed_secs: u64,
    pub remaining_secs: u64,
    pub estimated_bytes: u64,
    /// Never below 1 while recording
    pub estimated_mb: u64,
    pub ceiling_reached: bool,
}

impl Progress {
    /// `"25s remaining, ~1MB"`
    pub fn display(&self) -> String {
        format!("{}s remaining, ~{}MB", self.remaining_secs, self.estimated_mb)
    }
}

/// Recording state machine, free of I/O
///
/// `Idle -> Starting -> Active -> Stopping -> Idle`; a failed start goes
/// `Starting -> Idle`. Each transition method returns false and leaves the
/// state untouched when called from the wrong state.
#[derive(Debug, Clone)]
pub struct RecordingSession {
    state: SessionState,
    started_at: Option<Instant>,
    ceiling_secs: u64,
    bitrate_bps: u64,
}

impl RecordingSession {
    pub fn new(config: &RecordingConfig) -> Self {
        Self {
            state: SessionState::Idle,
            started_at: None,
            ceiling_secs: config.ceiling_secs,
            bitrate_bps: config.bitrate_bps,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn ceiling_secs(&self) -> u64 {
        self.ceiling_secs
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    pub fn begin_start(&mut self) -> bool {
        self.transition(SessionState::Idle, SessionState::Starting)
    }

    pub fn start_succeeded(&mut self, now: Instant) -> bool {
        if !self.transition(SessionState::Starting, SessionState::Active) {
            return false;
        }
        self.started_at = Some(now);
        true
    }

    pub fn start_failed(&mut self) -> bool {
        self.transition(SessionState::Starting, SessionState::Idle)
    }

    pub fn begin_stop(&mut self) -> bool {
        if !self.transition(SessionState::Active, SessionState::Stopping) {
            return false;
        }
        self.started_at = None;
        true
    }

    /// Leave `Stopping`, whether or not the stop request succeeded
    pub fn finish_stop(&mut self) -> bool {
        self.transition(SessionState::Stopping, SessionState::Idle)
    }

    /// `None` unless active
    pub fn progress(&self, now: Instant) -> Option<Progress> {
        let started_at = match (self.state, self.started_at) {
            (SessionState::Active, Some(started_at)) => started_at,
            _ => return None,
        };

        let elapsed_secs = now.saturating_duration_since(started_at).as_secs();
        let estimated_bytes = elapsed_secs * self.bitrate_bps / 8;
        let estimated_mb = (estimated_bytes / BYTES_PER_MB).max(1);

        Some(Progress {
            elapsed_secs,
            remaining_secs: self.ceiling_secs.saturating_sub(elapsed_secs),
            estimated_bytes,
            estimated_mb,
            ceiling_reached: elapsed_secs >= self.ceiling_secs,
        })
    }

    fn transition(&mut self, from: SessionState, to: SessionState) -> bool {
        if self.state != from {
            return false;
        }
        self.state = to;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn session() -> RecordingSession {
        RecordingSession::new(&RecordingConfig::default())
    }

    fn active_session(started: Instant) -> RecordingSession {
        let mut s = session();
        assert!(s.begin_start());
        assert!(s.start_succeeded(started));
        s
    }

    #[test]
    fn test_full_cycle() {
        let mut s = session();
        let now = Instant::now();

        assert!(s.begin_start());
        assert_eq!(s.state(), SessionState::Starting);
        assert!(s.start_succeeded(now));
        assert_eq!(s.started_at(), Some(now));
        assert!(s.begin_stop());
        assert_eq!(s.state(), SessionState::Stopping);
        assert_eq!(s.started_at(), None);
        assert!(s.finish_stop());
        assert_eq!(s.state(), SessionState::Idle);
    }

    #[test]
    fn test_transitions_rejected_from_wrong_state() {
        let mut s = session();
        let now = Instant::now();

        assert!(!s.begin_stop());
        assert!(!s.start_succeeded(now));
        assert!(!s.finish_stop());
        assert_eq!(s.state(), SessionState::Idle);

        s.begin_start();
        assert!(!s.begin_start());
        assert!(!s.begin_stop());

        s.start_succeeded(now);
        assert!(!s.begin_start());
        assert!(!s.start_failed());
        assert_eq!(s.state(), SessionState::Active);
    }

    #[test]
    fn test_failed_start_returns_to_idle() {
        let mut s = session();
        s.begin_start();

        assert!(s.start_failed());
        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(s.started_at(), None);
    }

    #[test]
    fn test_no_progress_outside_active() {
        let mut s = session();
        let now = Instant::now();
        assert!(s.progress(now).is_none());

        s.begin_start();
        assert!(s.progress(now).is_none());

        s.start_succeeded(now);
        s.begin_stop();
        assert!(s.progress(now + Duration::from_secs(5)).is_none());
    }

    #[test]
    fn test_size_never_zero_and_non_decreasing() {
        let start = Instant::now();
        let s = active_session(start);

        let mut last = 0;
        for secs in 0..=30 {
            let p = s.progress(start + Duration::from_secs(secs)).unwrap();
            assert!(p.estimated_mb >= 1);
            assert!(p.estimated_bytes >= last);
            last = p.estimated_bytes;
        }
    }

    #[test]
    fn test_size_estimate_at_2mbps() {
        let start = Instant::now();
        let s = active_session(start);

        // 10s * 2_000_000 / 8 = 2_500_000 bytes -> 2MB floored
        let p = s.progress(start + Duration::from_secs(10)).unwrap();
        assert_eq!(p.estimated_bytes, 2_500_000);
        assert_eq!(p.estimated_mb, 2);
        assert_eq!(p.remaining_secs, 20);
        assert_eq!(p.display(), "20s remaining, ~2MB");
    }

    #[test]
    fn test_ceiling_is_inclusive() {
        let start = Instant::now();
        let s = active_session(start);

        let before = s.progress(start + Duration::from_millis(29_999)).unwrap();
        assert_eq!(before.elapsed_secs, 29);
        assert!(!before.ceiling_reached);

        let at = s.progress(start + Duration::from_secs(30)).unwrap();
        assert!(at.ceiling_reached);
        assert_eq!(at.remaining_secs, 0);
    }
}
