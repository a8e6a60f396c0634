// Shared fakes for integration tests
//
// ScriptedTransport stands in for the appliance, ChannelPositionSource for
// the platform GPS, ProbeView for the UI.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::channel::mpsc::{unbounded, UnboundedSender};
use futures::stream::{BoxStream, StreamExt};
use owl_panel::dispatch::{OutboundRequest, Reply, Transport};
use owl_panel::gps::{GpsSample, PositionEvent, PositionSource};
use owl_panel::recording::{Progress, RecordingView, SessionState};
use owl_panel::status::{ConnectionState, StatusView};
use owl_panel::{PanelError, PanelResult};

enum Script {
    Reply {
        status: u16,
        body: Vec<u8>,
        delay: Duration,
    },
    NetworkError,
    Hang,
}

/// Per-endpoint queue of canned responses. Unscripted calls get a 404.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<Script>>>,
    requests: Mutex<Vec<OutboundRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_json(&self, endpoint: &str, status: u16, body: serde_json::Value) {
        self.push_delayed(endpoint, Duration::ZERO, status, body.to_string().into_bytes());
    }

    pub fn push_bytes(&self, endpoint: &str, status: u16, body: &[u8]) {
        self.push_delayed(endpoint, Duration::ZERO, status, body.to_vec());
    }

    pub fn push_delayed(&self, endpoint: &str, delay: Duration, status: u16, body: Vec<u8>) {
        self.push(endpoint, Script::Reply { status, body, delay });
    }

    pub fn push_network_error(&self, endpoint: &str) {
        self.push(endpoint, Script::NetworkError);
    }

    pub fn push_hang(&self, endpoint: &str) {
        self.push(endpoint, Script::Hang);
    }

    /// Number of calls made to `endpoint`, including ones still in flight
    pub fn calls(&self, endpoint: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.endpoint == endpoint)
            .count()
    }

    pub fn requests_to(&self, endpoint: &str) -> Vec<OutboundRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.endpoint == endpoint)
            .cloned()
            .collect()
    }

    fn push(&self, endpoint: &str, script: Script) {
        self.scripts
            .lock()
            .unwrap()
            .entry(endpoint.to_string())
            .or_default()
            .push_back(script);
    }
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: OutboundRequest) -> PanelResult<Reply> {
        let endpoint = request.endpoint.clone();
        self.requests.lock().unwrap().push(request);

        let script = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&endpoint)
            .and_then(|queue| queue.pop_front());

        match script {
            Some(Script::Reply { status, body, delay }) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(Reply { status, body })
            }
            Some(Script::NetworkError) => Err(PanelError::NetworkUnavailable(
                "connection refused".to_string(),
            )),
            Some(Script::Hang) => std::future::pending().await,
            None => Ok(Reply {
                status: 404,
                body: Vec::new(),
            }),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Position source driven by the test; every `watch` opens a new channel
#[derive(Default)]
pub struct ChannelPositionSource {
    watchers: Mutex<Vec<UnboundedSender<PositionEvent>>>,
}

impl ChannelPositionSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fix(&self, latitude: f64, longitude: f64, accuracy_m: f64) {
        self.send(PositionEvent::Fix(GpsSample::new(latitude, longitude, accuracy_m)));
    }

    pub fn error(&self, message: &str) {
        self.send(PositionEvent::Error(message.to_string()));
    }

    /// Subscriptions whose stream has not been dropped
    pub fn live_watches(&self) -> usize {
        self.watchers
            .lock()
            .unwrap()
            .iter()
            .filter(|tx| !tx.is_closed())
            .count()
    }

    fn send(&self, event: PositionEvent) {
        let mut watchers = self.watchers.lock().unwrap();
        watchers.retain(|tx| tx.unbounded_send(event.clone()).is_ok());
    }
}

impl PositionSource for ChannelPositionSource {
    fn watch(&self) -> PanelResult<BoxStream<'static, PositionEvent>> {
        let (tx, rx) = unbounded();
        self.watchers.lock().unwrap().push(tx);
        Ok(rx.boxed())
    }

    fn name(&self) -> &str {
        "channel"
    }
}

/// Records everything the controller and poller show
#[derive(Default)]
pub struct ProbeView {
    pub states: Mutex<Vec<SessionState>>,
    pub progress: Mutex<Vec<Progress>>,
    pub saved: Mutex<Vec<PathBuf>>,
    pub cpu: Mutex<Vec<f64>>,
    pub connection: Mutex<Vec<ConnectionState>>,
}

impl ProbeView {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn states(&self) -> Vec<SessionState> {
        self.states.lock().unwrap().clone()
    }

    pub fn last_progress(&self) -> Option<Progress> {
        self.progress.lock().unwrap().last().cloned()
    }

    pub fn saved(&self) -> Vec<PathBuf> {
        self.saved.lock().unwrap().clone()
    }
}

impl RecordingView for ProbeView {
    fn on_state(&self, state: SessionState) {
        self.states.lock().unwrap().push(state);
    }

    fn on_progress(&self, progress: &Progress, _gps: Option<&GpsSample>) {
        self.progress.lock().unwrap().push(progress.clone());
    }

    fn on_saved(&self, path: &Path) {
        self.saved.lock().unwrap().push(path.to_path_buf());
    }
}

impl StatusView for ProbeView {
    fn show_cpu(&self, percent: f64, _color: &str) {
        self.cpu.lock().unwrap().push(percent);
    }

    fn show_connection(&self, connection: &ConnectionState) {
        self.connection.lock().unwrap().push(connection.clone());
    }
}
