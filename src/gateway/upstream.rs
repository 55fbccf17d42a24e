use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{GatewayError, Result};

const LOG_BODY_SNIPPET_CHARS: usize = 512;

/// Source of the raw upstream `/models` listing.
#[async_trait]
pub trait ModelSource: Send + Sync {
    async fn fetch_models(&self, api_key: &str) -> Result<Value>;
}

/// OpenAI-compatible upstream reached over HTTP with bearer auth.
#[derive(Clone)]
pub struct UpstreamClient {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl std::fmt::Debug for UpstreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl UpstreamClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|err| GatewayError::InternalError {
                message: format!("upstream http client error: {err}"),
            })?;
        Ok(Self {
            base_url: base_url.into(),
            client,
            timeout,
        })
    }

    pub fn models_url(&self) -> String {
        join_base_url(&self.base_url, "models")
    }
}

#[async_trait]
impl ModelSource for UpstreamClient {
    async fn fetch_models(&self, api_key: &str) -> Result<Value> {
        let url = self.models_url();
        let response = self
            .client
            .get(&url)
            .bearer_auth(api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| classify_transport_error(&url, err))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| classify_transport_error(&url, err))?;

        if !status.is_success() {
            tracing::error!(
                url = %url,
                status = status.as_u16(),
                body = %body_snippet(&body),
                "upstream model listing failed"
            );
            return Err(GatewayError::UpstreamError { status, body });
        }

        serde_json::from_str(&body).map_err(|err| {
            tracing::error!(
                url = %url,
                error = %err,
                body = %body_snippet(&body),
                "upstream model listing returned invalid json"
            );
            GatewayError::InternalError {
                message: err.to_string(),
            }
        })
    }
}

fn classify_transport_error(url: &str, err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        tracing::error!(url = %url, "upstream model listing timed out");
        return GatewayError::UpstreamTimeout;
    }
    if err.is_connect() || err.is_request() {
        tracing::error!(url = %url, error = %err, "upstream model listing unreachable");
        return GatewayError::UpstreamUnreachable {
            message: err.to_string(),
        };
    }
    tracing::error!(url = %url, error = %err, "upstream model listing failed unexpectedly");
    GatewayError::InternalError {
        message: err.to_string(),
    }
}

fn body_snippet(body: &str) -> String {
    let mut chars = body.chars();
    let snippet: String = chars.by_ref().take(LOG_BODY_SNIPPET_CHARS).collect();
    if chars.next().is_some() {
        format!("{snippet}...")
    } else {
        snippet
    }
}

fn join_base_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}
