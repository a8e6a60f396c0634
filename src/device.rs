//! One-shot appliance commands: detection toggle and frame download

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::artifact::{ArtifactKind, ArtifactSink};
use crate::dispatch::{endpoints, Dispatcher, RequestOptions};
use crate::error::PanelResult;
use crate::notify::NotificationSink;
use crate::protocol::CommandAck;

pub struct DeviceCommands {
    dispatcher: Arc<Dispatcher>,
    artifacts: Arc<dyn ArtifactSink>,
    notifier: NotificationSink,
}

impl DeviceCommands {
    pub fn new(dispatcher: Arc<Dispatcher>, artifacts: Arc<dyn ArtifactSink>, notifier: NotificationSink) -> Self {
        Self {
            dispatcher,
            artifacts,
            notifier,
        }
    }

    pub async fn start_detection(&self) -> PanelResult<CommandAck> {
        self.detection(endpoints::DETECTION_START, "Detection started").await
    }

    pub async fn stop_detection(&self) -> PanelResult<CommandAck> {
        self.detection(endpoints::DETECTION_STOP, "Detection stopped").await
    }

    /// Fetch the current camera frame and save it as `owl_frame_<ts>.jpg`
    pub async fn download_frame(&self) -> PanelResult<PathBuf> {
        let result = self.fetch_frame().await;

        match &result {
            Ok(path) => {
                info!("Frame saved to {}", path.display());
                self.notifier.success("Frame downloaded successfully");
            }
            Err(e) => {
                self.notifier.error(&e.to_string());
            }
        }
        result
    }

    async fn fetch_frame(&self) -> PanelResult<PathBuf> {
        let reply = self
            .dispatcher
            .send(endpoints::DOWNLOAD_FRAME, RequestOptions::post())
            .await?;

        let name = ArtifactKind::Frame.file_name(Utc::now());
        self.artifacts.save(&name, &reply.into_bytes())
    }

    /// `done` is shown when the appliance acks without a message
    async fn detection(&self, endpoint: &str, done: &str) -> PanelResult<CommandAck> {
        let result = self
            .dispatcher
            .send(endpoint, RequestOptions::post())
            .await
            .and_then(|reply| reply.json::<CommandAck>());

        match &result {
            Ok(ack) if ack.success => {
                self.notifier.success(ack.message.as_deref().unwrap_or(done));
            }
            Ok(ack) => {
                self.notifier
                    .error(ack.message.as_deref().unwrap_or("Detection command failed"));
            }
            Err(e) => {
                self.notifier.error(&e.to_string());
            }
        }
        result
    }
}
