use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::transport::{Method, OutboundRequest, Reply, Transport};
use crate::error::{AbortReason, PanelError, PanelResult};

/// Per-call options for `Dispatcher::send`
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<serde_json::Value>,
    /// Overrides the dispatcher's default deadline
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self {
            method: Method::Get,
            body: None,
            timeout: None,
        }
    }

    pub fn post() -> Self {
        Self {
            method: Method::Post,
            body: None,
            timeout: None,
        }
    }

    pub fn with_json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// An outstanding request; the endpoint is the key, not the request
struct PendingRequest {
    id: u64,
    cancel: oneshot::Sender<AbortReason>,
}

/// Wraps a transport with per-endpoint cancellation and deadlines
///
/// Sending to an endpoint that already has a request in flight aborts the
/// older request first. Every request is removed from the pending table on
/// every exit path, including the caller dropping the future.
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    default_timeout: Duration,
    pending: Mutex<HashMap<String, PendingRequest>>,
    next_id: AtomicU64,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>, default_timeout: Duration) -> Self {
        info!(
            "Request dispatcher using {} transport (timeout {:?})",
            transport.name(),
            default_timeout
        );

        Self {
            transport,
            default_timeout,
            pending: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Send a request, superseding any in-flight request to `endpoint`
    pub async fn send(&self, endpoint: &str, options: RequestOptions) -> PanelResult<Reply> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (cancel_tx, cancel_rx) = oneshot::channel();

        {
            let mut pending = self.lock_pending();
            let previous = pending.insert(
                endpoint.to_string(),
                PendingRequest {
                    id,
                    cancel: cancel_tx,
                },
            );
            if let Some(previous) = previous {
                debug!("Superseding in-flight request to {}", endpoint);
                let _ = previous.cancel.send(AbortReason::Superseded);
            }
        }

        let _entry = PendingEntry {
            dispatcher: self,
            endpoint,
            id,
        };

        let timeout = options.timeout.unwrap_or(self.default_timeout);
        let request = OutboundRequest {
            endpoint: endpoint.to_string(),
            method: options.method,
            body: options.body,
        };

        let outcome = tokio::select! {
            biased;

            reason = cancel_rx => {
                let reason = reason.unwrap_or(AbortReason::Shutdown);
                debug!("Request to {} aborted: {}", endpoint, reason);
                Err(PanelError::RequestTimedOut {
                    endpoint: endpoint.to_string(),
                    reason,
                })
            }

            result = tokio::time::timeout(timeout, self.transport.execute(request)) => {
                match result {
                    Ok(result) => result,
                    Err(_) => {
                        warn!("Request to {} timed out after {:?}", endpoint, timeout);
                        Err(PanelError::RequestTimedOut {
                            endpoint: endpoint.to_string(),
                            reason: AbortReason::Deadline,
                        })
                    }
                }
            }
        };

        let reply = outcome?;
        if !reply.is_success() {
            return Err(PanelError::RequestFailed {
                endpoint: endpoint.to_string(),
                status: reply.status,
            });
        }

        Ok(reply)
    }

    /// Abort every in-flight request
    pub fn abort_all(&self) {
        let drained: Vec<(String, PendingRequest)> = self.lock_pending().drain().collect();

        if !drained.is_empty() {
            info!("Aborting {} in-flight request(s)", drained.len());
        }
        for (_, request) in drained {
            let _ = request.cancel.send(AbortReason::Shutdown);
        }
    }

    pub fn is_pending(&self, endpoint: &str) -> bool {
        self.lock_pending().contains_key(endpoint)
    }

    pub fn pending_count(&self) -> usize {
        self.lock_pending().len()
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, HashMap<String, PendingRequest>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Removes a request's pending entry when the send completes or is dropped.
/// A superseded request leaves its replacement's entry alone.
struct PendingEntry<'a> {
    dispatcher: &'a Dispatcher,
    endpoint: &'a str,
    id: u64,
}

impl Drop for PendingEntry<'_> {
    fn drop(&mut self) {
        let mut pending = self.dispatcher.lock_pending();
        if pending.get(self.endpoint).map(|p| p.id) == Some(self.id) {
            pending.remove(self.endpoint);
        }
    }
}
