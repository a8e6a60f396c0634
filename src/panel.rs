//! Wiring of all panel components from one `Config`

use std::sync::Arc;

use tracing::info;

use crate::artifact::{ArtifactSink, DirectorySink};
use crate::config::Config;
use crate::device::DeviceCommands;
use crate::dispatch::{Dispatcher, HttpTransport, Transport};
use crate::error::PanelResult;
use crate::gps::{GpsFeed, PositionSource};
use crate::notify::NotificationSink;
use crate::recording::{ControllerDeps, RecordingController, RecordingView};
use crate::status::{StatusPoller, StatusView};
use crate::zoom::ZoomState;

/// Display collaborators supplied by the embedding UI
pub struct PanelViews {
    pub recording: Arc<dyn RecordingView>,
    pub status: Arc<dyn StatusView>,
}

/// A running control panel for one appliance
///
/// Several panels can run side by side; none of them share state.
pub struct Panel {
    pub notifications: NotificationSink,
    pub dispatcher: Arc<Dispatcher>,
    pub recording: RecordingController,
    pub gps: GpsFeed,
    pub device: DeviceCommands,
    pub zoom: ZoomState,
    status: Option<StatusPoller>,
}

impl Panel {
    /// Connect to the appliance over HTTP and save downloads to the
    /// configured directory
    pub fn connect(config: &Config, position: Arc<dyn PositionSource>, views: PanelViews) -> PanelResult<Self> {
        let transport = Arc::new(HttpTransport::new(&config.device.base_url)?);
        let artifacts = Arc::new(DirectorySink::new(config.downloads.resolved_dir()));

        info!("Connecting panel to {}", config.device.base_url);
        Ok(Self::with_transport(config, transport, artifacts, position, views))
    }

    pub fn with_transport(
        config: &Config,
        transport: Arc<dyn Transport>,
        artifacts: Arc<dyn ArtifactSink>,
        position: Arc<dyn PositionSource>,
        views: PanelViews,
    ) -> Self {
        let notifications = NotificationSink::new(&config.notifications);
        let dispatcher = Arc::new(Dispatcher::new(transport, config.dispatcher.default_timeout()));
        let gps = GpsFeed::new(position, Arc::clone(&dispatcher), config.gps.clone());

        let recording = RecordingController::spawn(
            &config.recording,
            config.dispatcher.stop_timeout(),
            ControllerDeps {
                dispatcher: Arc::clone(&dispatcher),
                view: views.recording,
                artifacts: Arc::clone(&artifacts),
                notifier: notifications.clone(),
                gps: Some(gps.samples()),
            },
        );
        let device = DeviceCommands::new(Arc::clone(&dispatcher), artifacts, notifications.clone());

        let status = Some(StatusPoller::spawn(
            Arc::clone(&dispatcher),
            &config.status,
            views.status,
        ));

        Self {
            notifications,
            dispatcher,
            recording,
            gps,
            device,
            zoom: ZoomState::default(),
            status,
        }
    }

    pub fn status(&self) -> Option<&StatusPoller> {
        self.status.as_ref()
    }

    /// Release every timer, subscription and in-flight request
    pub async fn shutdown(mut self) {
        info!("Shutting down panel");

        if let Some(mut poller) = self.status.take() {
            poller.stop();
        }
        self.gps.disable();
        self.dispatcher.abort_all();
        self.recording.shutdown().await;
    }
}
