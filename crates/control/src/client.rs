//! HTTP client for test-running uploaded scripts through the gateway.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use scriptgate_core::scripting::executor::OUTCOME_HEADER;
use scriptgate_core::scripting::{Classification, InvocationResult};
use scriptgate_core::types::PrincipalId;

/// Errors from the gateway client.
#[derive(Debug, thiserror::Error)]
pub enum GatewayClientError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The configured base URL cannot carry a script path.
    #[error("Invalid gateway URL: {0}")]
    InvalidUrl(String),
}

/// Runs a stored script the same way a public caller would.
#[async_trait]
pub trait GatewayClient: Send + Sync {
    async fn invoke(
        &self,
        principal: PrincipalId,
        file_name: &str,
    ) -> Result<InvocationResult, GatewayClientError>;
}

/// Public URL of `principal`'s script `file_name` under `base_url`.
///
/// Each segment is percent-encoded, so the link stays valid for any stored
/// file name.
pub fn script_url(
    base_url: &str,
    principal: PrincipalId,
    file_name: &str,
) -> Result<Url, GatewayClientError> {
    let mut url = Url::parse(base_url)
        .map_err(|e| GatewayClientError::InvalidUrl(format!("{base_url}: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| GatewayClientError::InvalidUrl(format!("{base_url}: cannot be a base")))?
        .pop_if_empty()
        .push("run")
        .push(&principal.to_string())
        .push(file_name);
    Ok(url)
}

/// Best-effort classification when the outcome header is missing.
pub fn classify_status(status: StatusCode) -> Classification {
    match status {
        StatusCode::OK => Classification::Success,
        StatusCode::NOT_FOUND => Classification::NotFound,
        StatusCode::GATEWAY_TIMEOUT => Classification::Timeout,
        StatusCode::INTERNAL_SERVER_ERROR => Classification::ScriptError,
        _ => Classification::ServerError,
    }
}

/// [`GatewayClient`] that issues `GET /run/{principal}/{file}` requests.
pub struct HttpGatewayClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGatewayClient {
    /// * `base_url` - where the gateway listens, e.g. `http://127.0.0.1:8000`.
    /// * `timeout` - overall request timeout; keep it above the script budget.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GatewayClientError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Reuse an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl GatewayClient for HttpGatewayClient {
    async fn invoke(
        &self,
        principal: PrincipalId,
        file_name: &str,
    ) -> Result<InvocationResult, GatewayClientError> {
        let url = script_url(&self.base_url, principal, file_name)?;
        let response = self.client.get(url).send().await?;

        let status = response.status();
        let classification = response
            .headers()
            .get(OUTCOME_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse().ok())
            .unwrap_or_else(|| classify_status(status));
        let body = response.bytes().await?;

        tracing::debug!(
            %principal,
            file = file_name,
            status = status.as_u16(),
            classification = classification.as_str(),
            "Gateway test run finished"
        );
        Ok(InvocationResult::new(classification, body.to_vec()))
    }
}
