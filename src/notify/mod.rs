//! Transient notification queue
//!
//! Mirrors the appliance UI's toast stack: newest entries are appended, the
//! oldest is evicted once the queue is full, and every entry expires after a
//! fixed time-to-live. Subscribers receive each notification as it is pushed.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::NotificationConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub created_at: Instant,
}

/// Shared handle to the notification queue; clones refer to the same queue
#[derive(Clone)]
pub struct NotificationSink {
    entries: Arc<Mutex<VecDeque<Notification>>>,
    capacity: usize,
    ttl: Duration,
    events: broadcast::Sender<Notification>,
}

impl NotificationSink {
    pub fn new(config: &NotificationConfig) -> Self {
        let (events, _) = broadcast::channel(32);

        Self {
            entries: Arc::new(Mutex::new(VecDeque::new())),
            capacity: config.capacity.max(1),
            ttl: config.ttl(),
            events,
        }
    }

    /// Append a notification, evicting the oldest entry when full
    pub fn push(&self, kind: NotificationKind, title: &str, message: &str) -> Uuid {
        match kind {
            NotificationKind::Error => warn!("{}: {}", title, message),
            _ => info!("{}: {}", title, message),
        }

        let notification = Notification {
            id: Uuid::new_v4(),
            kind,
            title: title.to_string(),
            message: message.to_string(),
            created_at: Instant::now(),
        };
        let id = notification.id;

        {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            Self::prune(&mut entries, self.ttl);
            while entries.len() >= self.capacity {
                entries.pop_front();
            }
            entries.push_back(notification.clone());
        }

        // No subscribers is fine
        let _ = self.events.send(notification);

        id
    }

    pub fn success(&self, message: &str) -> Uuid {
        self.push(NotificationKind::Success, "Success", message)
    }

    pub fn error(&self, message: &str) -> Uuid {
        self.push(NotificationKind::Error, "Error", message)
    }

    pub fn info(&self, message: &str) -> Uuid {
        self.push(NotificationKind::Info, "Info", message)
    }

    /// Remove a notification before it expires. Returns false if it was
    /// already gone.
    pub fn dismiss(&self, id: Uuid) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|n| n.id != id);
        entries.len() != before
    }

    /// Notifications that have not yet expired, oldest first
    pub fn active(&self) -> Vec<Notification> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Self::prune(&mut entries, self.ttl);
        entries.iter().cloned().collect()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.events.subscribe()
    }

    fn prune(entries: &mut VecDeque<Notification>, ttl: Duration) {
        let now = Instant::now();
        entries.retain(|n| now.duration_since(n.created_at) < ttl);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sink(capacity: usize, ttl_ms: u64) -> NotificationSink {
        NotificationSink::new(&NotificationConfig { capacity, ttl_ms })
    }

    #[tokio::test]
    async fn test_capacity_evicts_oldest() {
        let sink = sink(2, 5000);

        sink.info("first");
        sink.info("second");
        sink.error("third");

        let active = sink.active();
        assert_eq!(active.len(), 2);
        assert_eq!(active[0].message, "second");
        assert_eq!(active[1].message, "third");
        assert_eq!(active[1].kind, NotificationKind::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire_after_ttl() {
        let sink = sink(5, 5000);
        sink.success("Frame downloaded successfully");

        tokio::time::advance(Duration::from_millis(4999)).await;
        assert_eq!(sink.active().len(), 1);

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(sink.active().is_empty());
    }

    #[tokio::test]
    async fn test_dismiss() {
        let sink = sink(5, 5000);
        let id = sink.info("close me");

        assert!(sink.dismiss(id));
        assert!(!sink.dismiss(id));
        assert!(sink.active().is_empty());
    }

    #[tokio::test]
    async fn test_subscribers_see_pushes() {
        let sink = sink(5, 5000);
        let mut rx = sink.subscribe();

        sink.error("Recording failed");

        let n = rx.recv().await.unwrap();
        assert_eq!(n.title, "Error");
        assert_eq!(n.message, "Recording failed");
    }
}
