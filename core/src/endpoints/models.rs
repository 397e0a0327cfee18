//! `/models` and model execution.

use crate::client::ApiClient;
use crate::endpoints::connectors;
use crate::error::ApiError;
use crate::query::QueryParams;
use crate::resource::RestResource;
use crate::types::{ApiResponse, CreateModelPayload, Field, Model, ModelAttributes, ModelQueryType};

pub const MODELS: RestResource<ModelAttributes> = RestResource::new("/models");

/// Comma-joined list of every `ModelQueryType`, sent when the caller does
/// not narrow the listing.
pub fn default_query_types() -> String {
    ModelQueryType::ALL
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

/// `GET /models?page=&per_page=&query_type=`
pub async fn get_all_models(
    client: &ApiClient,
    page: Option<u32>,
    per_page: Option<u32>,
    query_type: Option<&str>,
) -> Result<ApiResponse<Vec<Model>>, ApiError> {
    let query_type = query_type.map_or_else(default_query_types, str::to_string);
    let params = QueryParams::new()
        .push_opt("page", page)
        .push_opt("per_page", per_page)
        .push("query_type", query_type);
    MODELS.list(client, &params).await
}

pub async fn get_model_by_id(client: &ApiClient, id: &str) -> Result<ApiResponse<Model>, ApiError> {
    MODELS.get(client, id).await
}

pub async fn create_model(
    client: &ApiClient,
    payload: &CreateModelPayload,
) -> Result<ApiResponse<Model>, ApiError> {
    MODELS.create(client, payload).await
}

pub async fn update_model(
    client: &ApiClient,
    id: &str,
    payload: &CreateModelPayload,
) -> Result<ApiResponse<Model>, ApiError> {
    MODELS.update(client, id, payload).await
}

pub async fn delete_model(client: &ApiClient, id: &str) -> Result<ApiResponse<Model>, ApiError> {
    MODELS.delete(client, id).await
}

/// Run a saved model's query against the connector it belongs to.
///
/// Looks the model up first. When the lookup yields no `data` the result is
/// a locally built 404 envelope and no query is sent.
pub async fn execute_model(
    client: &ApiClient,
    id: &str,
) -> Result<ApiResponse<Vec<Field>>, ApiError> {
    let lookup = get_model_by_id(client, id).await?;
    let Some(model) = lookup.data else {
        return Ok(ApiResponse::error(404, "Not Found", "Model not found"));
    };

    let attributes = model.attributes;
    connectors::query_source(client, &attributes.connector.id, &attributes.query).await
}
