use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, Request, State,
    },
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

pub const API_PREFIX: &str = "/api/v1";
pub const DEFAULT_WORKSPACE_ID: &str = "1";
pub const DEFAULT_TOKEN: &str = "test-token";
const DEFAULT_PER_PAGE: usize = 10;
const TIMESTAMP: &str = "2024-05-01T12:00:00Z";

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Connector {
    pub id: u64,
    pub name: String,
    pub connector_type: String,
    pub connector_name: String,
    pub category: String,
    pub icon: String,
    pub description: Option<String>,
    pub configuration: Value,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Model {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub query: String,
    pub query_type: String,
    pub primary_key: Option<String>,
    pub connector_id: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncJob {
    pub id: u64,
    pub source_id: u64,
    pub destination_id: u64,
    pub model_id: u64,
    pub schedule_type: String,
    pub sync_interval: Option<u32>,
    pub sync_interval_unit: Option<String>,
    pub stream_name: String,
    pub sync_mode: String,
    pub cursor_field: Option<String>,
    pub status: String,
    pub configuration: Value,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncRun {
    pub id: u64,
    pub sync_id: u64,
    pub status: String,
    pub total_rows: u64,
    pub successful_rows: u64,
    pub failed_rows: u64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub duration: Option<f64>,
    pub error: Option<String>,
}

/// In-memory backend state.
#[derive(Clone, Debug, Default)]
pub struct Store {
    pub connectors: BTreeMap<u64, Connector>,
    pub models: BTreeMap<u64, Model>,
    pub syncs: BTreeMap<u64, SyncJob>,
    pub sync_runs: BTreeMap<u64, SyncRun>,
    next_id: u64,
}

impl Store {
    /// Two connectors, one model, one sync and two of its runs.
    pub fn seeded() -> Self {
        let mut store = Store::default();
        store.connectors.insert(
            1,
            Connector {
                id: 1,
                name: "Production Postgres".to_string(),
                connector_type: "source".to_string(),
                connector_name: "Postgresql".to_string(),
                category: "Data Warehouse".to_string(),
                icon: "postgresql.svg".to_string(),
                description: None,
                configuration: json!({ "host": "db.internal", "port": 5432 }),
            },
        );
        store.connectors.insert(
            2,
            Connector {
                id: 2,
                name: "Marketing Klaviyo".to_string(),
                connector_type: "destination".to_string(),
                connector_name: "Klaviyo".to_string(),
                category: "Marketing Automation".to_string(),
                icon: "klaviyo.svg".to_string(),
                description: Some("Email audiences".to_string()),
                configuration: json!({ "private_api_key": "redacted" }),
            },
        );
        store.models.insert(
            1,
            Model {
                id: 1,
                name: "Active users".to_string(),
                description: None,
                query: "SELECT * FROM users WHERE active".to_string(),
                query_type: "raw_sql".to_string(),
                primary_key: Some("id".to_string()),
                connector_id: 1,
            },
        );
        store.syncs.insert(
            1,
            SyncJob {
                id: 1,
                source_id: 1,
                destination_id: 2,
                model_id: 1,
                schedule_type: "interval".to_string(),
                sync_interval: Some(1),
                sync_interval_unit: Some("hours".to_string()),
                stream_name: "profile".to_string(),
                sync_mode: "full_refresh".to_string(),
                cursor_field: None,
                status: "active".to_string(),
                configuration: json!({}),
            },
        );
        store.sync_runs.insert(
            1,
            SyncRun {
                id: 1,
                sync_id: 1,
                status: "success".to_string(),
                total_rows: 10,
                successful_rows: 10,
                failed_rows: 0,
                started_at: "2024-04-30T10:00:00Z".to_string(),
                finished_at: Some("2024-04-30T10:00:05Z".to_string()),
                duration: Some(5.0),
                error: None,
            },
        );
        store.sync_runs.insert(
            2,
            SyncRun {
                id: 2,
                sync_id: 1,
                status: "failed".to_string(),
                total_rows: 4,
                successful_rows: 1,
                failed_rows: 3,
                started_at: "2024-05-01T10:00:00Z".to_string(),
                finished_at: Some("2024-05-01T10:00:02Z".to_string()),
                duration: Some(2.0),
                error: Some("destination rejected 3 records".to_string()),
            },
        );
        store.next_id = 100;
        store
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn render_model(&self, model: &Model) -> Value {
        let connector = self.connectors.get(&model.connector_id);
        resource(
            "models",
            model.id,
            json!({
                "name": model.name,
                "description": model.description,
                "query": model.query,
                "query_type": model.query_type,
                "primary_key": model.primary_key,
                "icon": connector.map(|c| c.icon.clone()),
                "created_at": TIMESTAMP,
                "updated_at": TIMESTAMP,
                "connector": {
                    "id": model.connector_id,
                    "name": connector.map(|c| c.name.clone()),
                    "icon": connector.map(|c| c.icon.clone()),
                }
            }),
        )
    }
}

/// Values every request must carry.
#[derive(Clone, Debug)]
pub struct Credentials {
    pub workspace_id: String,
    pub token: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            workspace_id: DEFAULT_WORKSPACE_ID.to_string(),
            token: DEFAULT_TOKEN.to_string(),
        }
    }
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub credentials: Arc<Credentials>,
}

type Failure = (StatusCode, Json<Value>);
type ApiResult = Result<Json<Value>, Failure>;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn app() -> Router {
    app_with(Store::seeded(), Credentials::default())
}

pub fn app_with(store: Store, credentials: Credentials) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(store)),
        credentials: Arc::new(credentials),
    };

    let api = Router::new()
        .route("/connectors", get(list_connectors).post(create_connector))
        .route(
            "/connectors/{id}",
            get(get_connector).put(update_connector).delete(delete_connector),
        )
        .route("/connectors/{id}/query_source", post(query_source))
        .route("/connectors/{id}/discover", get(discover))
        .route("/connector_definitions", get(connector_definitions))
        .route("/models", get(list_models).post(create_model))
        .route(
            "/models/{id}",
            get(get_model).put(update_model).delete(delete_model),
        )
        .route("/syncs", get(list_syncs).post(create_sync))
        .route(
            "/syncs/{id}",
            get(get_sync).put(update_sync).delete(delete_sync),
        )
        .route("/syncs/{id}/enable", patch(enable_sync))
        .route("/syncs/{id}/sync_runs", get(list_sync_runs))
        .route("/syncs/{id}/sync_runs/{run_id}", get(get_sync_run))
        .route("/reports", get(report))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_credentials,
        ))
        .with_state(state);

    Router::new().nest(API_PREFIX, api).fallback(unknown_route)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn require_credentials(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let (authorized, workspace) = {
        let headers = request.headers();
        let bearer = format!("Bearer {}", state.credentials.token);
        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        let workspace = headers
            .get("workspace-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        (authorization == Some(bearer.as_str()), workspace)
    };

    if !authorized {
        tracing::debug!(uri = %request.uri(), "rejecting request with bad bearer token");
        return failure(
            StatusCode::UNAUTHORIZED,
            "Unauthorized",
            "Invalid or missing bearer token",
        )
        .into_response();
    }
    if workspace.as_deref() != Some(state.credentials.workspace_id.as_str()) {
        tracing::debug!(uri = %request.uri(), workspace = ?workspace, "rejecting unknown workspace");
        return failure(StatusCode::FORBIDDEN, "Forbidden", "Unknown workspace").into_response();
    }

    next.run(request).await
}

async fn unknown_route() -> Failure {
    not_found("Route")
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn failure(status: StatusCode, title: &str, detail: &str) -> Failure {
    (
        status,
        Json(json!({
            "errors": [{ "status": status.as_u16(), "title": title, "detail": detail }]
        })),
    )
}

fn not_found(what: &str) -> Failure {
    failure(StatusCode::NOT_FOUND, "Not Found", &format!("{what} not found"))
}

fn unprocessable(detail: &str) -> Failure {
    failure(StatusCode::UNPROCESSABLE_ENTITY, "Unprocessable Entity", detail)
}

fn resource(kind: &str, id: u64, attributes: Value) -> Value {
    json!({ "id": id.to_string(), "type": kind, "attributes": attributes })
}

fn with_timestamps(mut attributes: Value) -> Value {
    if let Some(map) = attributes.as_object_mut() {
        map.remove("id");
        map.insert("created_at".to_string(), json!(TIMESTAMP));
        map.insert("updated_at".to_string(), json!(TIMESTAMP));
    }
    attributes
}

fn record<T: Serialize>(kind: &str, id: u64, value: &T) -> Value {
    let attributes = serde_json::to_value(value).unwrap_or(Value::Null);
    resource(kind, id, with_timestamps(attributes))
}

fn parse_id(raw: &str, field: &str) -> Result<u64, Failure> {
    raw.parse()
        .map_err(|_| unprocessable(&format!("{field} must be a numeric id")))
}

/// Extractor rejections keep their status but answer with an error envelope.
fn rejected(status: StatusCode, detail: &str) -> Failure {
    failure(status, status.canonical_reason().unwrap_or("Bad Request"), detail)
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, Failure> {
    body.map(|Json(value)| value)
        .map_err(|rejection| rejected(rejection.status(), &rejection.body_text()))
}

fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, Failure> {
    query
        .map(|Query(value)| value)
        .map_err(|rejection| rejected(rejection.status(), &rejection.body_text()))
}

/// One page of `items` plus `links` built from `path`.
fn paginate(path: &str, items: Vec<Value>, page: Option<usize>, per_page: Option<usize>) -> Value {
    let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE).max(1);
    let page = page.unwrap_or(1).max(1);
    let last = items.len().div_ceil(per_page).max(1);
    let data: Vec<Value> = items
        .into_iter()
        .skip((page - 1).saturating_mul(per_page))
        .take(per_page)
        .collect();
    let link = |p: usize| format!("{API_PREFIX}{path}?page={p}&per_page={per_page}");

    json!({
        "data": data,
        "links": {
            "self": link(page),
            "first": link(1),
            "prev": (page > 1).then(|| link(page - 1)),
            "next": (page < last).then(|| link(page + 1)),
            "last": link(last),
        }
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
    pub query_type: Option<String>,
}

// ---------------------------------------------------------------------------
// Connectors
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct ConnectorInput {
    pub name: String,
    pub connector_type: String,
    pub connector_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub configuration: Value,
}

#[derive(Deserialize)]
pub struct ConnectorBody {
    pub connector: ConnectorInput,
}

async fn list_connectors(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult {
    let params = query_params(params)?;
    let store = state.db.read().await;
    let items = store
        .connectors
        .values()
        .filter(|c| params.kind.as_deref().map_or(true, |kind| c.connector_type == kind))
        .map(|c| record("connectors", c.id, c))
        .collect();
    Ok(Json(paginate("/connectors", items, params.page, params.per_page)))
}

async fn get_connector(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let id = parse_id(&id, "id")?;
    let store = state.db.read().await;
    let connector = store.connectors.get(&id).ok_or_else(|| not_found("Connector"))?;
    Ok(Json(json!({ "data": record("connectors", id, connector) })))
}

fn connector_from_input(id: u64, input: ConnectorInput) -> Result<Connector, Failure> {
    if input.connector_type != "source" && input.connector_type != "destination" {
        return Err(unprocessable("connector_type must be source or destination"));
    }
    Ok(Connector {
        id,
        name: input.name,
        category: "Custom".to_string(),
        icon: format!("{}.svg", input.connector_name.to_lowercase()),
        connector_type: input.connector_type,
        connector_name: input.connector_name,
        description: input.description,
        configuration: input.configuration,
    })
}

async fn create_connector(
    State(state): State<AppState>,
    body: Result<Json<ConnectorBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), Failure> {
    let body = json_body(body)?;
    let mut store = state.db.write().await;
    let id = store.allocate_id();
    let connector = connector_from_input(id, body.connector)?;
    let rendered = record("connectors", id, &connector);
    store.connectors.insert(id, connector);
    Ok((StatusCode::CREATED, Json(json!({ "data": rendered }))))
}

async fn update_connector(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<ConnectorBody>, JsonRejection>,
) -> ApiResult {
    let id = parse_id(&id, "id")?;
    let body = json_body(body)?;
    let mut store = state.db.write().await;
    if !store.connectors.contains_key(&id) {
        return Err(not_found("Connector"));
    }
    let connector = connector_from_input(id, body.connector)?;
    let rendered = record("connectors", id, &connector);
    store.connectors.insert(id, connector);
    Ok(Json(json!({ "data": rendered })))
}

async fn delete_connector(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let id = parse_id(&id, "id")?;
    let mut store = state.db.write().await;
    let connector = store.connectors.remove(&id).ok_or_else(|| not_found("Connector"))?;
    Ok(Json(json!({ "data": record("connectors", id, &connector) })))
}

#[derive(Deserialize)]
pub struct QueryBody {
    pub query: String,
}

async fn query_source(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<QueryBody>, JsonRejection>,
) -> ApiResult {
    let id = parse_id(&id, "id")?;
    let body = json_body(body)?;
    let store = state.db.read().await;
    if !store.connectors.contains_key(&id) {
        return Err(not_found("Connector"));
    }
    if body.query.trim().is_empty() {
        return Err(unprocessable("query must not be empty"));
    }
    Ok(Json(json!({
        "data": [
            { "id": 1, "email": "ada@example.com", "active": true },
            { "id": 2, "email": "grace@example.com", "active": false }
        ]
    })))
}

#[derive(Deserialize)]
pub struct DiscoverParams {
    #[serde(default)]
    pub refresh: bool,
}

async fn discover(
    State(state): State<AppState>,
    Path(id): Path<String>,
    params: Result<Query<DiscoverParams>, QueryRejection>,
) -> ApiResult {
    let id = parse_id(&id, "id")?;
    let params = query_params(params)?;
    let store = state.db.read().await;
    if !store.connectors.contains_key(&id) {
        return Err(not_found("Connector"));
    }
    let catalog_hash = if params.refresh { "refreshed" } else { "cached" };
    Ok(Json(json!({
        "data": resource("catalogs", id, json!({
            "connector_id": id,
            "workspace_id": state.credentials.workspace_id,
            "catalog_hash": catalog_hash,
            "catalog": {
                "streams": [
                    {
                        "name": "users",
                        "action": "create",
                        "json_schema": { "properties": {
                            "id": { "type": "integer" },
                            "email": { "type": ["string", "null"] },
                            "active": { "type": "boolean" }
                        } },
                        "supported_sync_modes": ["full_refresh", "incremental"]
                    },
                    {
                        "name": "orders",
                        "action": "create",
                        "json_schema": { "properties": {
                            "id": { "type": "integer" },
                            "total": { "type": "number" }
                        } },
                        "supported_sync_modes": ["full_refresh"]
                    }
                ]
            }
        }))
    })))
}

async fn connector_definitions(params: Result<Query<ListParams>, QueryRejection>) -> ApiResult {
    let params = query_params(params)?;
    let definitions = [
        ("Postgresql", "PostgreSQL", "source", "Data Warehouse"),
        ("Snowflake", "Snowflake", "source", "Data Warehouse"),
        ("Klaviyo", "Klaviyo", "destination", "Marketing Automation"),
        ("SalesforceCrm", "Salesforce CRM", "destination", "CRM"),
    ];
    let data: Vec<Value> = definitions
        .iter()
        .filter(|(_, _, kind, _)| params.kind.as_deref().map_or(true, |k| k == *kind))
        .map(|(name, title, kind, category)| {
            json!({
                "name": name,
                "title": title,
                "connector_type": kind,
                "category": category,
                "icon": format!("{}.svg", name.to_lowercase()),
                "connector_spec": { "connection_specification": { "type": "object" } }
            })
        })
        .collect();
    Ok(Json(json!({ "data": data })))
}

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct ModelInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub query: String,
    pub query_type: String,
    #[serde(default)]
    pub primary_key: Option<String>,
    pub connector_id: String,
}

#[derive(Deserialize)]
pub struct ModelBody {
    pub model: ModelInput,
}

fn model_from_input(store: &Store, id: u64, input: ModelInput) -> Result<Model, Failure> {
    let connector_id = parse_id(&input.connector_id, "connector_id")?;
    if !store.connectors.contains_key(&connector_id) {
        return Err(unprocessable("connector_id does not reference a connector"));
    }
    Ok(Model {
        id,
        name: input.name,
        description: input.description,
        query: input.query,
        query_type: input.query_type,
        primary_key: input.primary_key,
        connector_id,
    })
}

async fn list_models(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult {
    let params = query_params(params)?;
    let store = state.db.read().await;
    let wanted: Option<Vec<&str>> = params
        .query_type
        .as_deref()
        .map(|types| types.split(',').collect());
    let items = store
        .models
        .values()
        .filter(|m| {
            wanted
                .as_ref()
                .map_or(true, |types| types.contains(&m.query_type.as_str()))
        })
        .map(|m| store.render_model(m))
        .collect();
    Ok(Json(paginate("/models", items, params.page, params.per_page)))
}

async fn get_model(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let id = parse_id(&id, "id")?;
    let store = state.db.read().await;
    let model = store.models.get(&id).ok_or_else(|| not_found("Model"))?;
    Ok(Json(json!({ "data": store.render_model(model) })))
}

async fn create_model(
    State(state): State<AppState>,
    body: Result<Json<ModelBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), Failure> {
    let body = json_body(body)?;
    let mut store = state.db.write().await;
    let id = store.allocate_id();
    let model = model_from_input(&store, id, body.model)?;
    let rendered = store.render_model(&model);
    store.models.insert(id, model);
    Ok((StatusCode::CREATED, Json(json!({ "data": rendered }))))
}

async fn update_model(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<ModelBody>, JsonRejection>,
) -> ApiResult {
    let id = parse_id(&id, "id")?;
    let body = json_body(body)?;
    let mut store = state.db.write().await;
    if !store.models.contains_key(&id) {
        return Err(not_found("Model"));
    }
    let model = model_from_input(&store, id, body.model)?;
    let rendered = store.render_model(&model);
    store.models.insert(id, model);
    Ok(Json(json!({ "data": rendered })))
}

async fn delete_model(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, Failure> {
    let id = parse_id(&id, "id")?;
    let mut store = state.db.write().await;
    store
        .models
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| not_found("Model"))
}

// ---------------------------------------------------------------------------
// Syncs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct SyncInput {
    pub source_id: String,
    pub destination_id: String,
    pub model_id: String,
    pub schedule_type: String,
    #[serde(default)]
    pub sync_interval: Option<u32>,
    #[serde(default)]
    pub sync_interval_unit: Option<String>,
    pub stream_name: String,
    pub sync_mode: String,
    #[serde(default)]
    pub cursor_field: Option<String>,
    #[serde(default)]
    pub configuration: Value,
}

#[derive(Deserialize)]
pub struct SyncBody {
    pub sync: SyncInput,
}

fn sync_from_input(store: &Store, id: u64, status: String, input: SyncInput) -> Result<SyncJob, Failure> {
    let source_id = parse_id(&input.source_id, "source_id")?;
    let destination_id = parse_id(&input.destination_id, "destination_id")?;
    let model_id = parse_id(&input.model_id, "model_id")?;
    if !store.connectors.contains_key(&source_id) || !store.connectors.contains_key(&destination_id) {
        return Err(unprocessable("source and destination must reference connectors"));
    }
    if !store.models.contains_key(&model_id) {
        return Err(unprocessable("model_id does not reference a model"));
    }
    Ok(SyncJob {
        id,
        source_id,
        destination_id,
        model_id,
        schedule_type: input.schedule_type,
        sync_interval: input.sync_interval,
        sync_interval_unit: input.sync_interval_unit,
        stream_name: input.stream_name,
        sync_mode: input.sync_mode,
        cursor_field: input.cursor_field,
        status,
        configuration: input.configuration,
    })
}

async fn list_syncs(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult {
    let params = query_params(params)?;
    let store = state.db.read().await;
    let items = store.syncs.values().map(|s| record("syncs", s.id, s)).collect();
    Ok(Json(paginate("/syncs", items, params.page, params.per_page)))
}

async fn get_sync(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let id = parse_id(&id, "id")?;
    let store = state.db.read().await;
    let sync = store.syncs.get(&id).ok_or_else(|| not_found("Sync"))?;
    Ok(Json(json!({ "data": record("syncs", id, sync) })))
}

async fn create_sync(
    State(state): State<AppState>,
    body: Result<Json<SyncBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), Failure> {
    let body = json_body(body)?;
    let mut store = state.db.write().await;
    let id = store.allocate_id();
    let sync = sync_from_input(&store, id, "active".to_string(), body.sync)?;
    let rendered = record("syncs", id, &sync);
    store.syncs.insert(id, sync);
    Ok((StatusCode::CREATED, Json(json!({ "data": rendered }))))
}

async fn update_sync(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<SyncBody>, JsonRejection>,
) -> ApiResult {
    let id = parse_id(&id, "id")?;
    let body = json_body(body)?;
    let mut store = state.db.write().await;
    let status = store
        .syncs
        .get(&id)
        .map(|s| s.status.clone())
        .ok_or_else(|| not_found("Sync"))?;
    let sync = sync_from_input(&store, id, status, body.sync)?;
    let rendered = record("syncs", id, &sync);
    store.syncs.insert(id, sync);
    Ok(Json(json!({ "data": rendered })))
}

async fn delete_sync(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, Failure> {
    let id = parse_id(&id, "id")?;
    let mut store = state.db.write().await;
    store.syncs.remove(&id).ok_or_else(|| not_found("Sync"))?;
    store.sync_runs.retain(|_, run| run.sync_id != id);
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct EnableBody {
    pub enable: bool,
}

async fn enable_sync(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<EnableBody>, JsonRejection>,
) -> ApiResult {
    let id = parse_id(&id, "id")?;
    let body = json_body(body)?;
    let mut store = state.db.write().await;
    let sync = store.syncs.get_mut(&id).ok_or_else(|| not_found("Sync"))?;
    sync.status = if body.enable { "active" } else { "disabled" }.to_string();
    Ok(Json(json!({ "data": record("syncs", id, &*sync) })))
}

async fn list_sync_runs(
    State(state): State<AppState>,
    Path(id): Path<String>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult {
    let id = parse_id(&id, "id")?;
    let params = query_params(params)?;
    let store = state.db.read().await;
    if !store.syncs.contains_key(&id) {
        return Err(not_found("Sync"));
    }
    let items = store
        .sync_runs
        .values()
        .filter(|run| run.sync_id == id)
        .map(|run| record("sync_runs", run.id, run))
        .collect();
    let path = format!("/syncs/{id}/sync_runs");
    Ok(Json(paginate(&path, items, params.page, params.per_page)))
}

async fn get_sync_run(
    State(state): State<AppState>,
    Path((id, run_id)): Path<(String, String)>,
) -> ApiResult {
    let id = parse_id(&id, "id")?;
    let run_id = parse_id(&run_id, "run_id")?;
    let store = state.db.read().await;
    let run = store
        .sync_runs
        .get(&run_id)
        .filter(|run| run.sync_id == id)
        .ok_or_else(|| not_found("Sync run"))?;
    Ok(Json(json!({ "data": record("sync_runs", run_id, run) })))
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Counts {
    total: u64,
    failed: u64,
    success: u64,
}

fn series(buckets: &BTreeMap<String, Counts>) -> Value {
    buckets
        .iter()
        .map(|(day, counts)| {
            json!({
                "time_slice": format!("{day}T00:00:00Z"),
                "total_count": counts.total,
                "failed_count": counts.failed,
                "success_count": counts.success,
            })
        })
        .collect()
}

async fn report(
    State(state): State<AppState>,
    pairs: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> ApiResult {
    let pairs = query_params(pairs)?;
    let value = |key: &str| {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    };
    if value("type") != Some("workspace_activity") {
        return Err(unprocessable("type must be workspace_activity"));
    }
    let metric = value("metric").unwrap_or("all");
    if !matches!(metric, "sync_run_triggered" | "total_sync_run_rows" | "all") {
        return Err(unprocessable("unknown metric"));
    }
    if !matches!(
        value("time_period").unwrap_or("one_week"),
        "thirty_days" | "one_week" | "one_day"
    ) {
        return Err(unprocessable("unknown time_period"));
    }
    let connector_ids = pairs
        .iter()
        .filter(|(k, _)| k == "connector_ids[]")
        .map(|(_, v)| parse_id(v, "connector_ids"))
        .collect::<Result<Vec<u64>, Failure>>()?;

    let store = state.db.read().await;
    let mut triggered: BTreeMap<String, Counts> = BTreeMap::new();
    let mut rows: BTreeMap<String, Counts> = BTreeMap::new();

    for run in store.sync_runs.values() {
        let Some(sync) = store.syncs.get(&run.sync_id) else {
            continue;
        };
        if !connector_ids.is_empty()
            && !connector_ids.contains(&sync.source_id)
            && !connector_ids.contains(&sync.destination_id)
        {
            continue;
        }
        let day = run.started_at.get(..10).unwrap_or(&run.started_at).to_string();

        let t = triggered.entry(day.clone()).or_default();
        t.total += 1;
        match run.status.as_str() {
            "success" => t.success += 1,
            "failed" => t.failed += 1,
            _ => {}
        }

        let r = rows.entry(day).or_default();
        r.total += run.total_rows;
        r.failed += run.failed_rows;
        r.success += run.successful_rows;
    }

    let mut data = serde_json::Map::new();
    if metric != "total_sync_run_rows" {
        data.insert("sync_run_triggered".to_string(), series(&triggered));
    }
    if metric != "sync_run_triggered" {
        data.insert("total_sync_run_rows".to_string(), series(&rows));
    }
    Ok(Json(json!({ "data": data })))
}
