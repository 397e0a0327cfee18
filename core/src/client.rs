//! The shared API client and generic fetch dispatcher.
//!
//! # Design
//! `ApiClient` holds the base URL, the shared configuration handle, default
//! request options and a `Transport`. It is built once and cloned freely;
//! clones share the same transport and configuration.
//!
//! Each call goes through two steps:
//! - `build_request` turns method/url/payload/options into an `HttpRequest`,
//!   stamping the workspace, authorization, accept and content-type headers
//!   from the configuration as it is *now*.
//! - the transport executes it. Any response comes back as a value; only a
//!   round-trip that produced no response becomes `Err`.
//!
//! `api_fetch` then decodes the body into an `ApiResponse` and drops status
//! and headers, so a non-2xx answer reaches the caller as an envelope with
//! `errors` set. When a failure body carries no usable error envelope (plain
//! text, empty, or JSON without `errors`) one is synthesized from the status.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::{ClientConfig, SharedConfig};
use crate::error::ApiError;
use crate::http::{set_header, HttpMethod, HttpRequest, HttpResponse, RequestOptions, Transport};
use crate::types::ApiResponse;

pub const WORKSPACE_HEADER: &str = "Workspace-Id";

/// Cloneable, thread-safe client for the dashboard API.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    config: SharedConfig,
    defaults: RequestOptions,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Build a client. The base URL is fixed from the host configured at this
    /// point; headers keep tracking `config`.
    pub fn new(config: impl Into<SharedConfig>, transport: impl Transport + 'static) -> Self {
        Self::with_transport(config, Arc::new(transport))
    }

    pub fn with_transport(config: impl Into<SharedConfig>, transport: Arc<dyn Transport>) -> Self {
        let config = config.into();
        let base_url = config.snapshot().base_url();
        Self {
            base_url,
            config,
            defaults: RequestOptions::default(),
            transport,
        }
    }

    /// Options applied to every request before per-call options.
    pub fn with_default_options(mut self, defaults: RequestOptions) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Handle to the configuration this client reads on every request.
    pub fn config(&self) -> &SharedConfig {
        &self.config
    }

    /// Absolute URL for an API path such as `/connectors/1`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Describe the request for `method path` without sending it.
    ///
    /// Per-call options are merged over the client defaults, then the four
    /// fixed headers are set on top of whatever the options carried.
    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        payload: Option<&Value>,
        options: Option<&RequestOptions>,
    ) -> Result<HttpRequest, ApiError> {
        let merged = match options {
            Some(options) => self.defaults.merge(options),
            None => self.defaults.clone(),
        };

        let ClientConfig {
            workspace_id,
            token,
            ..
        } = self.config.snapshot();

        let mut headers = merged.headers;
        set_header(&mut headers, WORKSPACE_HEADER.to_string(), workspace_id);
        set_header(&mut headers, "Authorization".to_string(), format!("Bearer {token}"));
        set_header(&mut headers, "Accept".to_string(), "*/*".to_string());
        set_header(&mut headers, "Content-Type".to_string(), "application/json".to_string());

        let body = match payload {
            Some(payload) if method.carries_body() => Some(
                serde_json::to_string(payload).map_err(|e| ApiError::Serialization(e.to_string()))?,
            ),
            _ => None,
        };

        Ok(HttpRequest {
            method,
            path: self.url(path),
            headers,
            body,
            timeout: merged.timeout,
        })
    }

    /// Execute a request and return the full response, whatever its status.
    pub async fn send(
        &self,
        method: HttpMethod,
        path: &str,
        payload: Option<&Value>,
        options: Option<&RequestOptions>,
    ) -> Result<HttpResponse, ApiError> {
        let request = self.build_request(method, path, payload, options)?;
        tracing::debug!(method = %request.method, url = %request.path, "dispatching request");

        let response = self.transport.send(request).await?;
        tracing::debug!(status = response.status, "received response");
        Ok(response)
    }

    /// Execute a request and decode its body as an envelope around `T`.
    ///
    /// An empty 2xx body decodes as `{}`. Non-2xx responses always come back
    /// as `Ok`, see [`decode_response`].
    pub async fn api_fetch<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        payload: Option<&Value>,
        options: Option<&RequestOptions>,
    ) -> Result<ApiResponse<T>, ApiError> {
        let response = self.send(method, path, payload, options).await?;
        decode_response(&response)
    }
}

/// Turn a response into an envelope.
///
/// A 2xx body must decode as `ApiResponse<T>`. A non-2xx body is passed
/// through when it is an error envelope; anything else is replaced by a
/// single-error envelope carrying the status, its reason and the body text.
pub fn decode_response<T: DeserializeOwned>(
    response: &HttpResponse,
) -> Result<ApiResponse<T>, ApiError> {
    if response.is_success() {
        return decode_body(&response.body);
    }
    match decode_body::<ApiResponse<T>>(&response.body) {
        Ok(envelope) if envelope.has_errors() => Ok(envelope),
        _ => Ok(failure_envelope(response)),
    }
}

fn failure_envelope<T>(response: &HttpResponse) -> ApiResponse<T> {
    let reason = reqwest::StatusCode::from_u16(response.status)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or("Request Failed");
    let body = response.body.trim();
    let detail = if body.is_empty() { reason } else { body };
    ApiResponse::error(response.status, reason, detail)
}

/// Decode a response body; blank bodies are read as an empty object.
pub fn decode_body<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    let body = if body.trim().is_empty() { "{}" } else { body };
    serde_json::from_str(body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// Serialize a payload for `api_fetch`.
pub(crate) fn to_payload<P: serde::Serialize>(payload: &P) -> Result<Value, ApiError> {
    serde_json::to_value(payload).map_err(|e| ApiError::Serialization(e.to_string()))
}
