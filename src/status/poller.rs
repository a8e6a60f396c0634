use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::board::{StatusBoard, StatusView};
use crate::config::StatusConfig;
use crate::dispatch::{endpoints, Dispatcher, RequestOptions};
use crate::protocol::SystemStats;

/// Periodic `GET /api/system_stats`
pub struct StatusPoller {
    board_rx: watch::Receiver<StatusBoard>,
    task: Option<JoinHandle<()>>,
}

impl StatusPoller {
    /// Poll immediately, then every `poll_interval` (or `retry_interval`
    /// while the appliance reports it is retrying)
    pub fn spawn(dispatcher: Arc<Dispatcher>, config: &StatusConfig, view: Arc<dyn StatusView>) -> Self {
        let (board_tx, board_rx) = watch::channel(StatusBoard::default());
        let normal = config.poll_interval();
        let retry = config.retry_interval();

        info!("Polling system stats every {:?}", normal);

        let task = tokio::spawn(async move {
            let mut board = StatusBoard::default();
            let mut period = normal;
            let mut ticker = cadence(Instant::now(), period);

            loop {
                ticker.tick().await;
                Self::poll_once(&dispatcher, &mut board, view.as_ref()).await;
                board_tx.send_replace(board.clone());

                let next = board.next_interval(normal, retry);
                if next != period {
                    debug!("Poll interval now {:?}", next);
                    period = next;
                    ticker = cadence(Instant::now() + period, period);
                }
            }
        });

        Self {
            board_rx,
            task: Some(task),
        }
    }

    /// One fetch-and-project cycle
    pub async fn poll_once(dispatcher: &Dispatcher, board: &mut StatusBoard, view: &dyn StatusView) {
        let result = dispatcher
            .send(endpoints::SYSTEM_STATS, RequestOptions::get())
            .await
            .and_then(|reply| reply.json::<SystemStats>());

        match result {
            Ok(stats) => {
                debug!("System stats: {:?}", stats);
                board.apply(stats, view);
            }
            Err(e) => {
                warn!("Error fetching system stats: {}", e);
                board.fetch_failed(view);
            }
        }
    }

    pub fn board(&self) -> StatusBoard {
        self.board_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<StatusBoard> {
        self.board_rx.clone()
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            info!("Status polling stopped");
        }
    }
}

/// Ticks start at `start` and keep a fixed period regardless of how long
/// each poll takes
fn cadence(start: Instant, period: Duration) -> Interval {
    let mut ticker = tokio::time::interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.stop();
    }
}
