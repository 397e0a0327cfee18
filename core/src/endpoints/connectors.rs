//! `/connectors` and `/connector_definitions`.

use serde_json::json;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::query::{build_url, QueryParams};
use crate::resource::RestResource;
use crate::types::{
    ApiResponse, Connector, ConnectorAttributes, ConnectorDefinition, ConnectorKind,
    CreateConnectorPayload, Field,
};

pub const CONNECTORS: RestResource<ConnectorAttributes> = RestResource::new("/connectors");

/// `GET /connectors?type=&page=&per_page=`; unset filters are left out.
pub async fn get_user_connectors(
    client: &ApiClient,
    connector_type: Option<ConnectorKind>,
    page: Option<u32>,
    per_page: Option<u32>,
) -> Result<ApiResponse<Vec<Connector>>, ApiError> {
    let params = QueryParams::new()
        .push_opt("type", connector_type.map(ConnectorKind::as_str))
        .push_opt("page", page)
        .push_opt("per_page", per_page);
    CONNECTORS.list(client, &params).await
}

/// `GET /connectors` with no filters.
pub async fn get_all_connectors(client: &ApiClient) -> Result<ApiResponse<Vec<Connector>>, ApiError> {
    CONNECTORS.list(client, &QueryParams::new()).await
}

pub async fn get_connector_info(
    client: &ApiClient,
    id: &str,
) -> Result<ApiResponse<Connector>, ApiError> {
    CONNECTORS.get(client, id).await
}

pub async fn delete_connector(
    client: &ApiClient,
    id: &str,
) -> Result<ApiResponse<Connector>, ApiError> {
    CONNECTORS.delete(client, id).await
}

pub async fn create_connector(
    client: &ApiClient,
    payload: &CreateConnectorPayload,
) -> Result<ApiResponse<Connector>, ApiError> {
    CONNECTORS.create(client, payload).await
}

pub async fn update_connector(
    client: &ApiClient,
    id: &str,
    payload: &CreateConnectorPayload,
) -> Result<ApiResponse<Connector>, ApiError> {
    CONNECTORS.update(client, id, payload).await
}

/// Run `query` against connector `id` and return the result rows.
pub async fn query_source(
    client: &ApiClient,
    id: &str,
    query: &str,
) -> Result<ApiResponse<Vec<Field>>, ApiError> {
    let payload = json!({ "query": query });
    client
        .api_fetch(
            HttpMethod::Post,
            &CONNECTORS.nested_path(id, "query_source"),
            Some(&payload),
            None,
        )
        .await
}

/// `GET /connector_definitions?type=`
pub async fn get_connector_definitions(
    client: &ApiClient,
    connector_type: ConnectorKind,
) -> Result<ApiResponse<Vec<ConnectorDefinition>>, ApiError> {
    let path = build_url(
        "/connector_definitions",
        &QueryParams::new().push("type", connector_type.as_str()),
    );
    client.api_fetch(HttpMethod::Get, &path, None, None).await
}
