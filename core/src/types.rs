//! Wire shapes for the dashboard API.
//!
//! # Design
//! Every record comes back as `{ "id", "type", "attributes" }`, so entities
//! are `Resource<Attributes>` aliases rather than bespoke structs. Attribute
//! fields the backend may omit are `Option` or `#[serde(default)]`, so an
//! older backend never breaks decoding. Ids are held as strings even when the
//! backend sends numbers.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// One entry of an error envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    #[serde(default, deserialize_with = "de_opt_status")]
    pub status: Option<u16>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

/// Pagination links attached to list responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Links {
    #[serde(default, rename = "self")]
    pub self_link: Option<String>,
    #[serde(default)]
    pub first: Option<String>,
    #[serde(default)]
    pub prev: Option<String>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub last: Option<String>,
}

/// Response envelope shared by every endpoint.
///
/// A successful response fills `data`; a server-reported failure fills
/// `errors`. `status` is only ever set on envelopes built client-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ErrorObject>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl<T> Default for ApiResponse<T> {
    fn default() -> Self {
        Self {
            data: None,
            errors: None,
            links: None,
            status: None,
        }
    }
}

impl<T> ApiResponse<T> {
    /// Envelope carrying a single error, with `status` set on both the
    /// envelope and the error entry.
    pub fn error(status: u16, title: &str, detail: &str) -> Self {
        Self {
            data: None,
            errors: Some(vec![ErrorObject {
                status: Some(status),
                title: Some(title.to_string()),
                detail: Some(detail.to_string()),
            }]),
            links: None,
            status: Some(status),
        }
    }

    pub fn has_errors(&self) -> bool {
        self.errors.as_ref().is_some_and(|e| !e.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A `{ id, type, attributes }` record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource<A> {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub attributes: A,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectorKind {
    Source,
    Destination,
}

impl ConnectorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectorKind::Source => "source",
            ConnectorKind::Destination => "destination",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorAttributes {
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub connector_name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub connector_type: Option<ConnectorKind>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub configuration: Map<String, Value>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

pub type Connector = Resource<ConnectorAttributes>;

/// The connector a model queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConnector {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelAttributes {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub query: String,
    #[serde(default)]
    pub query_type: Option<String>,
    #[serde(default)]
    pub primary_key: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    pub connector: ModelConnector,
}

pub type Model = Resource<ModelAttributes>;

/// Kinds of model query the dashboard lists by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelQueryType {
    RawSql,
    Dbt,
    Soql,
    TableSelector,
}

impl ModelQueryType {
    pub const ALL: [ModelQueryType; 4] = [
        ModelQueryType::RawSql,
        ModelQueryType::Dbt,
        ModelQueryType::Soql,
        ModelQueryType::TableSelector,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ModelQueryType::RawSql => "raw_sql",
            ModelQueryType::Dbt => "dbt",
            ModelQueryType::Soql => "soql",
            ModelQueryType::TableSelector => "table_selector",
        }
    }
}

/// One result row of a query execution: column name to scalar value.
pub type Field = Map<String, Value>;

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Declared type of one stream column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaProperty {
    /// Either a single type name or a list such as `["string", "null"]`.
    #[serde(rename = "type", default)]
    pub kind: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonSchema {
    #[serde(default)]
    pub properties: BTreeMap<String, SchemaProperty>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogStream {
    pub name: String,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub json_schema: JsonSchema,
    #[serde(default)]
    pub supported_sync_modes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub streams: Vec<CatalogStream>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogAttributes {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub connector_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub workspace_id: Option<String>,
    #[serde(default)]
    pub catalog: Catalog,
    #[serde(default)]
    pub catalog_hash: Option<String>,
}

pub type CatalogResource = Resource<CatalogAttributes>;

// ---------------------------------------------------------------------------
// Syncs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncAttributes {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub source_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub destination_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub model_id: Option<String>,
    #[serde(default)]
    pub schedule_type: Option<String>,
    #[serde(default)]
    pub sync_interval: Option<u32>,
    #[serde(default)]
    pub sync_interval_unit: Option<String>,
    #[serde(default)]
    pub stream_name: Option<String>,
    #[serde(default)]
    pub sync_mode: Option<String>,
    #[serde(default)]
    pub cursor_field: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub configuration: Map<String, Value>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

pub type SyncJob = Resource<SyncAttributes>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncRunStatus {
    Pending,
    InProgress,
    Success,
    Failed,
    Canceled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncRunAttributes {
    #[serde(deserialize_with = "de_id")]
    pub sync_id: String,
    pub status: SyncRunStatus,
    #[serde(default)]
    pub total_rows: u64,
    #[serde(default)]
    pub successful_rows: u64,
    #[serde(default)]
    pub failed_rows: u64,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub finished_at: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

pub type SyncRun = Resource<SyncRunAttributes>;

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportTimeSlice {
    pub time_slice: String,
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub failed_count: u64,
    #[serde(default)]
    pub success_count: u64,
}

/// Metric name to its time series.
pub type Report = BTreeMap<String, Vec<ReportTimeSlice>>;

// ---------------------------------------------------------------------------
// Connector definitions
// ---------------------------------------------------------------------------

/// A connector type the backend knows how to instantiate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorDefinition {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub connector_type: Option<ConnectorKind>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub connector_spec: Value,
}

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorInput {
    pub name: String,
    pub connector_type: ConnectorKind,
    pub connector_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub configuration: Map<String, Value>,
}

/// Body of `POST /connectors` and `PUT /connectors/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateConnectorPayload {
    pub connector: ConnectorInput,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub query: String,
    pub query_type: ModelQueryType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,
    pub connector_id: String,
}

/// Body of `POST /models` and `PUT /models/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateModelPayload {
    pub model: ModelInput,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncInput {
    pub source_id: String,
    pub destination_id: String,
    pub model_id: String,
    pub schedule_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_interval: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_interval_unit: Option<String>,
    pub stream_name: String,
    pub sync_mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor_field: Option<String>,
    #[serde(default)]
    pub configuration: Map<String, Value>,
}

/// Body of `POST /syncs` and `PUT /syncs/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSyncPayload {
    pub sync: SyncInput,
}

// ---------------------------------------------------------------------------
// Id helpers
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Str(String),
    Int(i64),
    Uint(u64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Str(s) => s,
            RawId::Int(n) => n.to_string(),
            RawId::Uint(n) => n.to_string(),
        }
    }
}

fn de_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    RawId::deserialize(deserializer).map(String::from)
}

fn de_opt_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<RawId>::deserialize(deserializer)?.map(String::from))
}

/// Error statuses arrive as either `404` or `"404"`.
fn de_opt_status<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u16>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawStatus {
        Num(u16),
        Str(String),
    }

    Ok(match Option::<RawStatus>::deserialize(deserializer)? {
        Some(RawStatus::Num(n)) => Some(n),
        Some(RawStatus::Str(s)) => s.parse().ok(),
        None => None,
    })
}
