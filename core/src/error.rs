//! Error types for the dashboard API client.
//!
//! # Design
//! A response from the server is never an error here, whatever its status.
//! Non-2xx bodies come back as `ApiResponse` envelopes with `errors` filled
//! in, and the caller decides what to do with them. `ApiError` covers only
//! what happens on this side of the wire: the round-trip produced no
//! response, a payload could not be encoded, or a body could not be decoded.

use thiserror::Error;

/// Errors returned by `ApiClient` and the endpoint functions.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No HTTP response was obtained (connect, DNS, timeout, body read).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

/// Rough classification of a failed round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Connect,
    Timeout,
    Body,
    Other,
}

/// A round-trip that produced no HTTP response.
#[derive(Debug, Clone, Error)]
#[error("transport failure ({kind:?}): {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        let kind = if e.is_timeout() {
            TransportErrorKind::Timeout
        } else if e.is_connect() {
            TransportErrorKind::Connect
        } else if e.is_body() || e.is_decode() {
            TransportErrorKind::Body
        } else {
            TransportErrorKind::Other
        };
        Self {
            kind,
            message: e.to_string(),
        }
    }
}

/// Errors raised while loading `ClientConfig` from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    MissingVar(&'static str),
}
