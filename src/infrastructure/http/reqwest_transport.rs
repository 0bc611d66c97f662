//! reqwest-backed hub transport

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Certificate, Client, Identity};
use tracing::{debug, instrument};

use super::transport::{HttpRequest, HttpResponse, HttpTransport, TransportError, TransportResult};

/// Connection settings for [`ReqwestTransport`].
#[derive(Debug, Clone)]
pub struct ReqwestTransportConfig {
    /// Hub base URL, e.g. `https://service.hubject.com`
    pub base_url: String,
    pub connect_timeout: Duration,
    pub max_idle_connections: usize,
    /// Client certificate and private key, concatenated PEM
    pub identity_pem: Option<Vec<u8>>,
    /// Extra CA trusted for the hub certificate
    pub root_ca_pem: Option<Vec<u8>>,
}

impl ReqwestTransportConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            connect_timeout: Duration::from_secs(10),
            max_idle_connections: 10,
            identity_pem: None,
            root_ca_pem: None,
        }
    }
}

/// Pooled HTTPS client. Cheap to clone; clones share the pool.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(config: ReqwestTransportConfig) -> TransportResult<Self> {
        let mut builder = Client::builder()
            .use_rustls_tls()
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.max_idle_connections);

        if let Some(pem) = &config.identity_pem {
            let identity = Identity::from_pem(pem)
                .map_err(|e| TransportError::Config(format!("client identity: {}", e)))?;
            builder = builder.identity(identity);
        }

        if let Some(pem) = &config.root_ca_pem {
            let certificate = Certificate::from_pem(pem)
                .map_err(|e| TransportError::Config(format!("root certificate: {}", e)))?;
            builder = builder.add_root_certificate(certificate);
        }

        let client = builder
            .build()
            .map_err(|e| TransportError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    #[instrument(skip(self, request), fields(path = %request.path))]
    async fn post(&self, request: HttpRequest) -> TransportResult<HttpResponse> {
        let url = format!("{}{}", self.base_url, request.path);
        debug!(url = %url, bytes = request.body.len(), "Posting to hub");

        let mut builder = self
            .client
            .post(&url)
            .timeout(request.timeout)
            .header(CONTENT_TYPE, HeaderValue::from_static(request.content_type))
            .body(request.body);

        if let Some(action) = request.soap_action {
            builder = builder.header("SOAPAction", format!("\"{}\"", action));
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(request.timeout)
            } else {
                TransportError::from(e)
            }
        })?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(status, bytes = body.len(), "Hub answered");

        Ok(HttpResponse { status, body })
    }
}
