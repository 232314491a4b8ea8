//! HTTP plumbing for the inference gateway
//!
//! Both network operations (catalog discovery and chat completions) go
//! through `GatewayClient`, which owns the credential check, the upstream
//! headers, the per-operation timeout and the mapping of HTTP failures onto
//! `GatewayError`.

use crate::config::{Config, Credential};
use crate::error::{GatewayError, GatewayResult, UpstreamFailure, truncate_body};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

pub const MODELS_PATH: &str = "/models";
pub const COMPLETIONS_PATH: &str = "/chat/completions";

const REFERER_HEADER: HeaderName = HeaderName::from_static("http-referer");
const TITLE_HEADER: HeaderName = HeaderName::from_static("x-title");

/// Connection to one gateway endpoint root
///
/// Cheap to clone: `reqwest::Client` is internally reference counted.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<Credential>,
    referer: String,
    app_name: String,
    catalog_timeout: Duration,
    completion_timeout: Duration,
}

impl GatewayClient {
    /// Create a client from configuration
    ///
    /// A missing credential is not an error here; every call checks it.
    pub fn new(config: &Config) -> GatewayResult<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| GatewayError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::with_http_client(config, http))
    }

    /// Create a client that reuses an existing `reqwest::Client`
    pub fn with_http_client(config: &Config, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: config.gateway.base_url().to_string(),
            api_key: config.gateway.api_key().cloned(),
            referer: config.gateway.referer().to_string(),
            app_name: config.gateway.app_name().to_string(),
            catalog_timeout: config.timeouts.catalog(),
            completion_timeout: config.timeouts.completion(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether a usable credential is configured
    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// `GET {base}/models`, returning the raw JSON body
    pub async fn fetch_models(&self) -> GatewayResult<Value> {
        let headers = self.headers()?;
        let request = self.http.get(self.url(MODELS_PATH)).headers(headers);
        self.execute(request, format!("GET {}", MODELS_PATH), self.catalog_timeout)
            .await
    }

    /// `POST {base}/chat/completions` with a JSON body, returning the raw JSON response
    pub async fn create_completion<B>(&self, body: &B) -> GatewayResult<Value>
    where
        B: Serialize + ?Sized,
    {
        let mut headers = self.headers()?;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let request = self
            .http
            .post(self.url(COMPLETIONS_PATH))
            .headers(headers)
            .json(body);
        self.execute(
            request,
            format!("POST {}", COMPLETIONS_PATH),
            self.completion_timeout,
        )
        .await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn credential(&self) -> GatewayResult<&Credential> {
        self.api_key.as_ref().ok_or_else(|| {
            GatewayError::Config(
                "missing credential: set OPENROUTER_API_KEY or gateway.api_key".to_string(),
            )
        })
    }

    fn headers(&self) -> GatewayResult<HeaderMap> {
        let credential = self.credential()?;
        let header_value = |value: String, field: &str| {
            HeaderValue::from_str(&value).map_err(|_| {
                GatewayError::Config(format!("{} is not a valid HTTP header value", field))
            })
        };

        let mut headers = HeaderMap::new();
        let mut authorization =
            header_value(format!("Bearer {}", credential.expose()), "credential")?;
        authorization.set_sensitive(true);
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(REFERER_HEADER, header_value(self.referer.clone(), "referer")?);
        headers.insert(TITLE_HEADER, header_value(self.app_name.clone(), "app_name")?);
        Ok(headers)
    }

    /// Send a request under a timeout and decode the JSON body
    ///
    /// Dropping the returned future drops the in-flight request.
    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
        operation: String,
        timeout: Duration,
    ) -> GatewayResult<Value> {
        let transport = |e: reqwest::Error| {
            GatewayError::Upstream(UpstreamFailure::Transport {
                operation: operation.clone(),
                reason: e.to_string(),
            })
        };

        let exchange = async {
            tracing::debug!(operation = %operation, base_url = %self.base_url, "Sending gateway request");
            let response = request.send().await.map_err(transport)?;
            let status = response.status();
            let text = response.text().await.map_err(transport)?;

            if !status.is_success() {
                tracing::warn!(
                    operation = %operation,
                    status = status.as_u16(),
                    "Gateway returned non-success status"
                );
                return Err(GatewayError::Upstream(UpstreamFailure::Status {
                    status: status.as_u16(),
                    reason: status.canonical_reason().unwrap_or_default().to_string(),
                    body: truncate_body(&text),
                }));
            }

            serde_json::from_str::<Value>(&text).map_err(|e| {
                GatewayError::Protocol(format!("{} returned a non-JSON body: {}", operation, e))
            })
        };

        let outcome = tokio::time::timeout(timeout, exchange).await;
        match outcome {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    operation = %operation,
                    timeout_seconds = timeout.as_secs(),
                    "Gateway request timed out"
                );
                Err(GatewayError::Upstream(UpstreamFailure::Timeout {
                    operation,
                    timeout_seconds: timeout.as_secs(),
                }))
            }
        }
    }
}
