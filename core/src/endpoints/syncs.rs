//! `/syncs`, their runs, and catalog discovery.

use serde_json::json;

use crate::client::ApiClient;
use crate::endpoints::connectors::CONNECTORS;
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::query::{build_url, QueryParams};
use crate::resource::RestResource;
use crate::types::{
    ApiResponse, CatalogResource, CreateSyncPayload, SyncAttributes, SyncJob, SyncRun,
};

pub const SYNCS: RestResource<SyncAttributes> = RestResource::new("/syncs");

fn page_params(page: u32, per_page: u32) -> QueryParams {
    QueryParams::new().push("page", page).push("per_page", per_page)
}

/// `GET /connectors/{id}/discover?refresh=`. `refresh` asks the backend to
/// rediscover instead of serving its cached catalog and is always sent.
pub async fn get_catalog(
    client: &ApiClient,
    connector_id: &str,
    refresh: bool,
) -> Result<ApiResponse<CatalogResource>, ApiError> {
    let path = build_url(
        &CONNECTORS.nested_path(connector_id, "discover"),
        &QueryParams::new().push("refresh", refresh),
    );
    client.api_fetch(HttpMethod::Get, &path, None, None).await
}

/// `get_catalog` with `refresh=false`.
pub async fn get_catalog_default(
    client: &ApiClient,
    connector_id: &str,
) -> Result<ApiResponse<CatalogResource>, ApiError> {
    get_catalog(client, connector_id, false).await
}

/// `GET /syncs?page=&per_page=`
pub async fn fetch_syncs(
    client: &ApiClient,
    page: u32,
    per_page: u32,
) -> Result<ApiResponse<Vec<SyncJob>>, ApiError> {
    SYNCS.list(client, &page_params(page, per_page)).await
}

pub async fn get_sync_by_id(client: &ApiClient, id: &str) -> Result<ApiResponse<SyncJob>, ApiError> {
    SYNCS.get(client, id).await
}

/// `GET /syncs/{id}/sync_runs?page=&per_page=`
pub async fn get_sync_runs_by_sync_id(
    client: &ApiClient,
    sync_id: &str,
    page: u32,
    per_page: u32,
) -> Result<ApiResponse<Vec<SyncRun>>, ApiError> {
    let path = build_url(
        &SYNCS.nested_path(sync_id, "sync_runs"),
        &page_params(page, per_page),
    );
    client.api_fetch(HttpMethod::Get, &path, None, None).await
}

/// `GET /syncs/{id}/sync_runs/{run_id}`
pub async fn get_sync_run_by_id(
    client: &ApiClient,
    sync_id: &str,
    run_id: &str,
) -> Result<ApiResponse<SyncRun>, ApiError> {
    let path = format!("{}/{run_id}", SYNCS.nested_path(sync_id, "sync_runs"));
    client.api_fetch(HttpMethod::Get, &path, None, None).await
}

pub async fn create_sync(
    client: &ApiClient,
    payload: &CreateSyncPayload,
) -> Result<ApiResponse<SyncJob>, ApiError> {
    SYNCS.create(client, payload).await
}

pub async fn edit_sync(
    client: &ApiClient,
    id: &str,
    payload: &CreateSyncPayload,
) -> Result<ApiResponse<SyncJob>, ApiError> {
    SYNCS.update(client, id, payload).await
}

pub async fn delete_sync(client: &ApiClient, id: &str) -> Result<ApiResponse<SyncJob>, ApiError> {
    SYNCS.delete(client, id).await
}

/// `PATCH /syncs/{id}/enable` with `{"enable": bool}`.
pub async fn change_sync_status(
    client: &ApiClient,
    id: &str,
    enable: bool,
) -> Result<ApiResponse<SyncJob>, ApiError> {
    let payload = json!({ "enable": enable });
    client
        .api_fetch(
            HttpMethod::Patch,
            &SYNCS.nested_path(id, "enable"),
            Some(&payload),
            None,
        )
        .await
}
