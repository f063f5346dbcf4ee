/*
[INPUT]:  HTTP configuration (base URL, per-call deadlines, connect path)
[OUTPUT]: Configured reqwest client ready for backend calls
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing client behavior
*/

use crate::http::{GatewayError, Result};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Default backend location for local development
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_WS_URL: &str = "ws://localhost:5000";
pub const DEFAULT_CONNECT_PATH: &str = "/wallet/connect";

/// Deadline class of a backend call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    /// Bot status fetches
    Status,
    /// Bot start/stop, wallet connect, order placement
    Control,
    /// Balance, order, strategy and backtest reads
    Data,
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub ws_url: String,
    /// Credential exchange path; deployments differ (`/wallet/connect`, `/binance/connect`)
    pub connect_path: String,
    pub status_timeout: Duration,
    pub control_timeout: Duration,
    pub data_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            ws_url: DEFAULT_WS_URL.to_string(),
            connect_path: DEFAULT_CONNECT_PATH.to_string(),
            status_timeout: Duration::from_secs(5),
            control_timeout: Duration::from_secs(15),
            data_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn timeout_for(&self, deadline: Deadline) -> Duration {
        match deadline {
            Deadline::Status => self.status_timeout,
            Deadline::Control => self.control_timeout,
            Deadline::Data => self.data_timeout,
        }
    }
}

/// Main HTTP client for the trading backend.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http_client: Client,
    base_url: Url,
    config: ClientConfig,
}

impl GatewayClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let http_client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|err| GatewayError::Config(err.to_string()))?;

        // A trailing slash keeps any path prefix (e.g. `/api`) when joining endpoints
        let mut base = config.base_url.trim().to_string();
        if base.is_empty() {
            return Err(GatewayError::Config("base_url must not be empty".to_string()));
        }
        if !base.ends_with('/') {
            base.push('/');
        }

        Ok(Self {
            http_client,
            base_url: Url::parse(&base)?,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build full URL for an endpoint
    pub(crate) fn url(&self, endpoint: &str) -> Result<Url> {
        Ok(self.base_url.join(endpoint.trim_start_matches('/'))?)
    }

    pub(crate) fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let url = self.url(endpoint)?;
        Ok(self.http_client.request(method, url))
    }

    /// Send a request and decode its JSON body.
    ///
    /// Non-2xx replies become `GatewayError::Api` with the backend's message.
    pub(crate) async fn send_json<T>(&self, builder: RequestBuilder, deadline: Deadline) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let body = self.send_raw(builder, deadline).await?;
        decode_body(&body)
    }

    /// Like [`send_json`](Self::send_json), but an empty 2xx body decodes as `T::default()`
    pub(crate) async fn send_json_or_default<T>(
        &self,
        builder: RequestBuilder,
        deadline: Deadline,
    ) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let body = self.send_raw(builder, deadline).await?;
        if body.trim().is_empty() {
            return Ok(T::default());
        }
        decode_body(&body)
    }

    async fn send_raw(&self, builder: RequestBuilder, deadline: Deadline) -> Result<String> {
        let limit = self.config.timeout_for(deadline);
        let exchange = async {
            let response = builder
                .timeout(limit)
                .send()
                .await
                .map_err(|err| GatewayError::from_transport(err, limit))?;
            let status = response.status();
            let url = response.url().path().to_string();
            let body = response
                .text()
                .await
                .map_err(|err| GatewayError::from_transport(err, limit))?;

            debug!(path = %url, status = status.as_u16(), bytes = body.len(), "gateway response");

            if !status.is_success() {
                return Err(GatewayError::from_failure_body(status, &body));
            }
            Ok(body)
        };

        // reqwest's timeout does not cover every await above; bound the whole exchange
        match tokio::time::timeout(limit, exchange).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout { duration: limit }),
        }
    }
}

fn decode_body<T>(body: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    serde_json::from_str(body).map_err(|err| {
        GatewayError::InvalidResponse(format!(
            "{err}; body: {}",
            crate::truncate_for_log(body, 200)
        ))
    })
}
