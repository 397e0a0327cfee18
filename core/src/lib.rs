//! Typed async client for the dashboard REST API.
//!
//! # Overview
//! Wraps the backend's connectors, models, syncs and reports endpoints behind
//! typed functions. One `ApiClient` is built per process and passed to the
//! endpoint functions in [`endpoints`].
//!
//! # Design
//! - `ApiClient` owns a `Transport`; `ReqwestTransport` talks to the network,
//!   tests swap in fakes.
//! - The workspace, bearer token, accept and content-type headers are read
//!   from `SharedConfig` at request time.
//! - Server responses are always values: a 4xx/5xx comes back as an
//!   `ApiResponse` with `errors` set. `ApiError` is reserved for failures on
//!   this side of the wire.
//! - No retries, caching or transparent pagination.

pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod http;
pub mod query;
pub mod resource;
pub mod types;

pub use client::ApiClient;
pub use config::{ClientConfig, SharedConfig};
pub use endpoints::reports::{ReportMetric, ReportOptions, ReportTimePeriod};
pub use error::{ApiError, ConfigError, TransportError, TransportErrorKind};
pub use http::{HttpMethod, HttpRequest, HttpResponse, ReqwestTransport, RequestOptions, Transport};
pub use query::{build_url, QueryParams, QueryScalar, QueryValue};
pub use resource::RestResource;
pub use types::{
    ApiResponse, CatalogResource, Connector, ConnectorKind, ErrorObject, Field, Links, Model,
    ModelQueryType, Report, Resource, SyncJob, SyncRun, SyncRunStatus,
};
