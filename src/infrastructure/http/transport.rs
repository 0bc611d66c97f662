//! Transport seam between the dispatch engine and the network

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// One POST to the hub.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Path relative to the transport's base URL.
    pub path: String,
    pub content_type: &'static str,
    pub soap_action: Option<&'static str>,
    pub body: String,
    pub timeout: Duration,
}

/// Whatever the hub answered, 2xx or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }
}

/// No response could be obtained.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Request timeout after {0:?}")]
    Timeout(Duration),

    #[error("Request cancelled")]
    Cancelled,

    #[error("HTTP request failed: {0}")]
    Request(String),

    #[error("Reading response body failed: {0}")]
    Body(String),

    #[error("Transport configuration error: {0}")]
    Config(String),
}

pub type TransportResult<T> = Result<T, TransportError>;

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else if e.is_timeout() {
            TransportError::Request(format!("timed out: {}", e))
        } else if e.is_body() || e.is_decode() {
            TransportError::Body(e.to_string())
        } else {
            TransportError::Request(e.to_string())
        }
    }
}

/// HTTP(S) client abstraction used by the dispatch engine.
///
/// Implementations must be safe to call concurrently; responses to
/// interleaved calls are matched by the future that issued them.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn post(&self, request: HttpRequest) -> TransportResult<HttpResponse>;
}
