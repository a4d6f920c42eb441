//! HTTP transport seam.

use anyhow::Context as _;
use async_trait::async_trait;
use bytes::Bytes;
use reflexian_core::WireRequest;
use tracing::debug;

use crate::config::ClientConfig;

/// Performs one HTTP exchange for a translated request.
///
/// Implementations are shared across every in-flight call and must be safe
/// to use concurrently without external locking.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Execute `request` and return the raw response body.
    ///
    /// `Ok(None)` means the server answered without a body.
    async fn execute(&self, request: WireRequest) -> anyhow::Result<Option<Bytes>>;
}

/// `reqwest`-backed transport. Built once per client and reused.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
    config: ClientConfig,
}

impl ReqwestTransport {
    /// Build the underlying HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(config: ClientConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .context("building HTTP client")?;
        Ok(Self { http, config })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: WireRequest) -> anyhow::Result<Option<Bytes>> {
        let url = self.config.url_for(&request.path);
        let method = request.method.clone();

        let mut builder = self.http.request(request.method, &url).headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .with_context(|| format!("sending {method} {}", request.path))?;

        // Failures are reported inside the JSON payload, so the body is read
        // whatever the status code.
        let status = response.status();
        debug!(
            operation = request.operation.name(),
            status = status.as_u16(),
            "response received"
        );

        let body = response
            .bytes()
            .await
            .with_context(|| format!("reading response body of {method} {}", request.path))?;

        Ok((!body.is_empty()).then_some(body))
    }
}
