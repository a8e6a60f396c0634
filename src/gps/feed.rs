use std::sync::Arc;

use futures::stream::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::source::{PositionEvent, PositionSource};
use super::throttle::ReportThrottle;
use super::{GpsSample, GpsStatus};
use crate::config::GpsConfig;
use crate::dispatch::{endpoints, Dispatcher, RequestOptions};
use crate::error::PanelResult;

/// Continuous position watch with throttled upstream reporting
///
/// The watch task owns the platform subscription; aborting the task drops
/// the stream, which releases it.
pub struct GpsFeed {
    source: Arc<dyn PositionSource>,
    dispatcher: Arc<Dispatcher>,
    config: GpsConfig,
    status_tx: watch::Sender<GpsStatus>,
    sample_tx: watch::Sender<Option<GpsSample>>,
    watch_task: Option<JoinHandle<()>>,
}

impl GpsFeed {
    pub fn new(source: Arc<dyn PositionSource>, dispatcher: Arc<Dispatcher>, config: GpsConfig) -> Self {
        let (status_tx, _) = watch::channel(GpsStatus::Disabled);
        let (sample_tx, _) = watch::channel(None);

        Self {
            source,
            dispatcher,
            config,
            status_tx,
            sample_tx,
            watch_task: None,
        }
    }

    /// Start watching. Idempotent while already enabled.
    pub fn enable(&mut self) -> PanelResult<()> {
        if self.is_enabled() {
            return Ok(());
        }

        let mut events = match self.source.watch() {
            Ok(events) => events,
            Err(e) => {
                warn!("Cannot start GPS watch on {} source: {}", self.source.name(), e);
                self.status_tx.send_replace(GpsStatus::Unavailable);
                return Err(e);
            }
        };

        info!("GPS watch started ({} source)", self.source.name());
        self.status_tx.send_replace(GpsStatus::Searching);

        let status_tx = self.status_tx.clone();
        let sample_tx = self.sample_tx.clone();
        let dispatcher = Arc::clone(&self.dispatcher);
        let mut throttle = ReportThrottle::new(&self.config);

        let task = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                match event {
                    PositionEvent::Fix(sample) => {
                        status_tx.send_replace(GpsStatus::Fix {
                            accuracy_m: sample.accuracy_m,
                        });

                        if throttle.offer(&sample) {
                            report_upstream(Arc::clone(&dispatcher), &sample);
                        } else {
                            debug!("GPS fix within threshold, not reported");
                        }

                        sample_tx.send_replace(Some(sample));
                    }
                    PositionEvent::Error(message) => {
                        warn!("GPS error: {}", message);
                        status_tx.send_replace(GpsStatus::Error(message));
                    }
                }
            }

            info!("GPS watch ended");
        });

        self.watch_task = Some(task);
        Ok(())
    }

    /// Stop watching and release the subscription
    pub fn disable(&mut self) {
        if let Some(task) = self.watch_task.take() {
            task.abort();
            info!("GPS watch stopped");
        }
        self.sample_tx.send_replace(None);
        self.status_tx.send_replace(GpsStatus::Disabled);
    }

    pub fn set_enabled(&mut self, enabled: bool) -> PanelResult<()> {
        if enabled {
            self.enable()
        } else {
            self.disable();
            Ok(())
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.watch_task.as_ref().is_some_and(|t| !t.is_finished())
    }

    pub fn status(&self) -> GpsStatus {
        self.status_tx.borrow().clone()
    }

    pub fn latest_sample(&self) -> Option<GpsSample> {
        self.sample_tx.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<GpsStatus> {
        self.status_tx.subscribe()
    }

    /// Latest-sample cursor, e.g. for attaching a position to a recording
    pub fn samples(&self) -> watch::Receiver<Option<GpsSample>> {
        self.sample_tx.subscribe()
    }
}

impl Drop for GpsFeed {
    fn drop(&mut self) {
        if let Some(task) = self.watch_task.take() {
            task.abort();
        }
    }
}

/// Best-effort: failures are logged and dropped, and the watch loop never
/// waits on the round-trip
fn report_upstream(dispatcher: Arc<Dispatcher>, sample: &GpsSample) {
    let body = match serde_json::to_value(sample.to_report()) {
        Ok(body) => body,
        Err(e) => {
            warn!("Cannot encode GPS report: {}", e);
            return;
        }
    };

    tokio::spawn(async move {
        match dispatcher
            .send(endpoints::UPDATE_GPS, RequestOptions::post().with_json(body))
            .await
        {
            Ok(_) => debug!("GPS position reported"),
            Err(e) => debug!("GPS report dropped: {}", e),
        }
    });
}
