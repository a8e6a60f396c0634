use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::session::{Progress, RecordingSession, SessionState, StopReason};
use super::view::RecordingView;
use crate::artifact::{ArtifactKind, ArtifactSink};
use crate::config::RecordingConfig;
use crate::dispatch::{endpoints, Dispatcher, RequestOptions};
use crate::error::PanelResult;
use crate::gps::GpsSample;
use crate::notify::NotificationSink;
use crate::protocol::{CommandAck, StartRecordingRequest};

/// Collaborators the controller calls but does not own
pub struct ControllerDeps {
    pub dispatcher: Arc<Dispatcher>,
    pub view: Arc<dyn RecordingView>,
    pub artifacts: Arc<dyn ArtifactSink>,
    pub notifier: NotificationSink,
    /// Latest GPS fix, attached to the start request when present
    pub gps: Option<watch::Receiver<Option<GpsSample>>>,
}

enum Command {
    Start(oneshot::Sender<SessionState>),
    Stop(oneshot::Sender<SessionState>),
}

/// Handle to the recording session task
///
/// The task owns the `RecordingSession` and applies commands and ticks one
/// at a time, so a ceiling stop and a user stop can never both reach the
/// network.
pub struct RecordingController {
    commands: mpsc::Sender<Command>,
    state_rx: watch::Receiver<SessionState>,
    progress_rx: watch::Receiver<Option<Progress>>,
    task: Option<JoinHandle<()>>,
}

impl RecordingController {
    pub fn spawn(config: &RecordingConfig, stop_timeout: Duration, deps: ControllerDeps) -> Self {
        let (commands, command_rx) = mpsc::channel(8);
        let (state_tx, state_rx) = watch::channel(SessionState::Idle);
        let (progress_tx, progress_rx) = watch::channel(None);

        info!(
            "Recording controller ready (ceiling {}s, {} bps estimate)",
            config.ceiling_secs, config.bitrate_bps
        );

        let driver = Driver {
            session: RecordingSession::new(config),
            tick_period: config.tick(),
            stop_timeout,
            deps,
            state_tx,
            progress_tx,
            ticker: None,
        };
        let task = tokio::spawn(driver.run(command_rx));

        Self {
            commands,
            state_rx,
            progress_rx,
            task: Some(task),
        }
    }

    /// Start a session. Does nothing unless idle.
    pub async fn start(&self) -> SessionState {
        if self.state() != SessionState::Idle {
            debug!("Start ignored while {:?}", self.state());
            return self.state();
        }
        self.request(Command::Start).await
    }

    /// Stop the active session. Does nothing unless active.
    pub async fn stop(&self) -> SessionState {
        if self.state() != SessionState::Active {
            debug!("Stop ignored while {:?}", self.state());
            return self.state();
        }
        self.request(Command::Stop).await
    }

    /// Record-button behaviour: start when idle, stop when active. The
    /// button is disabled while a transition is in flight, so a press in
    /// `Starting` or `Stopping` does nothing.
    pub async fn toggle(&self) -> SessionState {
        match self.state() {
            SessionState::Idle => self.request(Command::Start).await,
            SessionState::Active => self.request(Command::Stop).await,
            other => {
                debug!("Toggle ignored while {:?}", other);
                other
            }
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state_rx.borrow()
    }

    /// `None` unless a session is active
    pub fn progress(&self) -> Option<Progress> {
        self.progress_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_rx.clone()
    }

    /// Stop the task. The tick timer and any in-flight request go with it.
    pub async fn shutdown(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
        info!("Recording controller stopped");
    }

    async fn request(&self, make: fn(oneshot::Sender<SessionState>) -> Command) -> SessionState {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.commands.send(make(reply_tx)).await.is_err() {
            warn!("Recording controller is not running");
            return self.state();
        }
        reply_rx.await.unwrap_or_else(|_| self.state())
    }
}

impl Drop for RecordingController {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

struct Driver {
    session: RecordingSession,
    tick_period: Duration,
    stop_timeout: Duration,
    deps: ControllerDeps,
    state_tx: watch::Sender<SessionState>,
    progress_tx: watch::Sender<Option<Progress>>,
    ticker: Option<Interval>,
}

impl Driver {
    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        loop {
            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else { break };
                    self.handle(command).await;
                }
                _ = next_tick(&mut self.ticker) => {
                    self.tick().await;
                }
            }
        }
        debug!("Recording controller task finished");
    }

    async fn handle(&mut self, command: Command) {
        let (reply, state) = match command {
            Command::Start(reply) => (reply, self.start().await),
            Command::Stop(reply) => (reply, self.stop(StopReason::User).await),
        };
        let _ = reply.send(state);
    }

    async fn start(&mut self) -> SessionState {
        if !self.session.begin_start() {
            debug!("Start ignored while {:?}", self.session.state());
            return self.session.state();
        }
        self.publish_state();

        let mut options = RequestOptions::post();
        if let Some(body) = self.start_body() {
            options = options.with_json(body);
        }

        let result = self
            .deps
            .dispatcher
            .send(endpoints::RECORDING_START, options)
            .await
            .and_then(|reply| reply.json::<CommandAck>());

        match result {
            Ok(ack) if ack.success => {
                let now = Instant::now();
                self.session.start_succeeded(now);
                let mut ticker = tokio::time::interval_at(now + self.tick_period, self.tick_period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                self.ticker = Some(ticker);
                info!("Recording started (ceiling {}s)", self.session.ceiling_secs());
                self.publish_state();
                self.publish_progress(now);
            }
            Ok(ack) => {
                self.session.start_failed();
                let message = ack
                    .message
                    .unwrap_or_else(|| "Failed to start recording".to_string());
                self.deps.notifier.error(&message);
                self.publish_state();
            }
            Err(e) => {
                self.session.start_failed();
                self.deps.notifier.error(&e.to_string());
                self.publish_state();
            }
        }

        self.session.state()
    }

    async fn tick(&mut self) {
        let now = Instant::now();
        if let Some(progress) = self.publish_progress(now) {
            if progress.ceiling_reached {
                info!("Recording reached {}s ceiling", self.session.ceiling_secs());
                self.stop(StopReason::Ceiling).await;
            }
        }
    }

    async fn stop(&mut self, reason: StopReason) -> SessionState {
        if !self.session.begin_stop() {
            debug!("Stop ignored while {:?}", self.session.state());
            return self.session.state();
        }
        self.ticker = None;
        self.progress_tx.send_replace(None);
        self.publish_state();
        info!("Stopping recording ({:?})", reason);

        let result = self
            .deps
            .dispatcher
            .send(
                endpoints::RECORDING_STOP,
                RequestOptions::post().with_timeout(self.stop_timeout),
            )
            .await;

        match result.and_then(|reply| self.save_recording(reply.into_bytes())) {
            Ok(()) => {
                self.deps.notifier.success("Recording saved and downloaded");
            }
            Err(e) => {
                error!("Recording stop failed: {}", e);
                self.deps.notifier.error(&e.to_string());
            }
        }

        self.session.finish_stop();
        self.publish_state();
        self.session.state()
    }

    fn save_recording(&self, bytes: Vec<u8>) -> PanelResult<()> {
        let name = ArtifactKind::Recording.file_name(Utc::now());
        let path = self.deps.artifacts.save(&name, &bytes)?;
        self.deps.view.on_saved(&path);
        Ok(())
    }

    fn start_body(&self) -> Option<serde_json::Value> {
        let sample = self.latest_gps()?;
        let request = StartRecordingRequest {
            gps: Some(sample.to_report()),
        };
        serde_json::to_value(request).ok()
    }

    fn latest_gps(&self) -> Option<GpsSample> {
        self.deps.gps.as_ref().and_then(|rx| rx.borrow().clone())
    }

    fn publish_state(&self) {
        let state = self.session.state();
        self.state_tx.send_replace(state);
        self.deps.view.on_state(state);
    }

    fn publish_progress(&self, now: Instant) -> Option<Progress> {
        let progress = self.session.progress(now)?;
        let gps = self.latest_gps();
        self.deps.view.on_progress(&progress, gps.as_ref());
        self.progress_tx.send_replace(Some(progress.clone()));
        Some(progress)
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        // Aborted mid-session: observers must not see a stale Active/Stopping
        if self.session.state() != SessionState::Idle {
            self.state_tx.send_replace(SessionState::Idle);
            self.progress_tx.send_replace(None);
            self.deps.view.on_state(SessionState::Idle);
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) -> Instant {
    match ticker {
        Some(ticker) => ticker.tick().await,
        None => std::future::pending().await,
    }
}
