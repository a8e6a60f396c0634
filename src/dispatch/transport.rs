use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL, PRAGMA};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{AbortReason, PanelError, PanelResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A request as handed to a transport, after the dispatcher has taken
/// ownership of its cancellation and deadline
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    /// Path relative to the appliance base URL (e.g. "/api/system_stats")
    pub endpoint: String,
    pub method: Method,
    pub body: Option<serde_json::Value>,
}

/// Raw response: status code plus the full body
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> PanelResult<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| PanelError::MalformedResponse(e.to_string()))
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.body
    }
}

/// Network transport used by the dispatcher
///
/// Implementations:
/// - `HttpTransport`: reqwest client against the appliance
/// - in-memory fakes for headless tests
///
/// A transport returns replies for every status code; classifying non-2xx
/// responses is the dispatcher's job.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: OutboundRequest) -> PanelResult<Reply>;

    /// Transport name for logging
    fn name(&self) -> &str;
}

/// HTTP transport backed by `reqwest`
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> PanelResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(5))
            // The appliance sits on the local network
            .no_proxy()
            .build()
            .map_err(|e| PanelError::NetworkUnavailable(format!("Cannot create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url_for(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    fn map_error(endpoint: &str, err: reqwest::Error) -> PanelError {
        if err.is_timeout() {
            PanelError::RequestTimedOut {
                endpoint: endpoint.to_string(),
                reason: AbortReason::Deadline,
            }
        } else if err.is_decode() {
            PanelError::MalformedResponse(err.to_string())
        } else {
            PanelError::NetworkUnavailable(err.to_string())
        }
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: OutboundRequest) -> PanelResult<Reply> {
        let url = self.url_for(&request.endpoint);
        debug!("{:?} {}", request.method, url);

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Self::map_error(&request.endpoint, e))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| Self::map_error(&request.endpoint, e))?;

        Ok(Reply {
            status,
            body: body.to_vec(),
        })
    }

    fn name(&self) -> &str {
        "http"
    }
}
