use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, DEFAULT_TOKEN, DEFAULT_WORKSPACE_ID};
use serde_json::Value;
use tower::{Service, ServiceExt};

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn authed(method: &str, uri: &str) -> http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("workspace-id", DEFAULT_WORKSPACE_ID)
        .header(http::header::AUTHORIZATION, format!("Bearer {DEFAULT_TOKEN}"))
}

fn get_request(uri: &str) -> Request<String> {
    authed("GET", uri).body(String::new()).unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    authed(method, uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

// --- credentials ---

#[tokio::test]
async fn missing_token_returns_401_envelope() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/api/v1/connectors")
                .header("workspace-id", DEFAULT_WORKSPACE_ID)
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(resp).await;
    assert_eq!(body["errors"][0]["status"], 401);
    assert_eq!(body["errors"][0]["title"], "Unauthorized");
}

#[tokio::test]
async fn wrong_workspace_returns_403() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/api/v1/connectors")
                .header("workspace-id", "999")
                .header(http::header::AUTHORIZATION, format!("Bearer {DEFAULT_TOKEN}"))
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body = body_json(resp).await;
    assert_eq!(body["errors"][0]["detail"], "Unknown workspace");
}

// --- connectors ---

#[tokio::test]
async fn list_connectors_filters_by_type() {
    let resp = app()
        .oneshot(get_request("/api/v1/connectors?type=destination"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["id"], "2");
    assert_eq!(data[0]["attributes"]["connector_type"], "destination");
    assert_eq!(
        body["links"]["self"],
        "/api/v1/connectors?page=1&per_page=10"
    );
}

#[tokio::test]
async fn list_connectors_paginates() {
    let resp = app()
        .oneshot(get_request("/api/v1/connectors?page=2&per_page=1"))
        .await
        .unwrap();

    let body = body_json(resp).await;
    assert_eq!(body["data"][0]["id"], "2");
    assert_eq!(body["links"]["prev"], "/api/v1/connectors?page=1&per_page=1");
    assert!(body["links"]["next"].is_null());
}

#[tokio::test]
async fn get_unknown_connector_returns_404_envelope() {
    let resp = app()
        .oneshot(get_request("/api/v1/connectors/42"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = body_json(resp).await;
    assert_eq!(body["errors"][0]["detail"], "Connector not found");
}

#[tokio::test]
async fn non_numeric_path_id_returns_envelope() {
    let resp = app()
        .oneshot(get_request("/api/v1/models/missing-id"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(resp).await;
    assert_eq!(body["errors"][0]["status"], 422);
    assert_eq!(body["errors"][0]["detail"], "id must be a numeric id");
}

#[tokio::test]
async fn non_numeric_run_id_returns_envelope() {
    let resp = app()
        .oneshot(get_request("/api/v1/syncs/1/sync_runs/latest"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(resp).await;
    assert_eq!(body["errors"][0]["detail"], "run_id must be a numeric id");
}

#[tokio::test]
async fn malformed_json_body_returns_envelope() {
    let resp = app()
        .oneshot(json_request("POST", "/api/v1/connectors", "{not json"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["errors"][0]["status"], 400);
    assert_eq!(body["errors"][0]["title"], "Bad Request");
}

#[tokio::test]
async fn bad_query_value_returns_envelope() {
    let resp = app()
        .oneshot(get_request("/api/v1/syncs?page=first"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["errors"][0]["status"], 400);
}

#[tokio::test]
async fn unknown_route_returns_envelope() {
    let resp = app()
        .oneshot(get_request("/api/v1/widgets"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = body_json(resp).await;
    assert_eq!(body["errors"][0]["detail"], "Route not found");
}

#[tokio::test]
async fn huge_page_number_is_an_empty_page() {
    let resp = app()
        .oneshot(get_request(
            "/api/v1/connectors?page=18446744073709551615&per_page=10",
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn create_connector_rejects_unknown_type() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/v1/connectors",
            r#"{"connector":{"name":"x","connector_type":"sideways","connector_name":"Postgresql"}}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn query_source_returns_rows() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/v1/connectors/1/query_source",
            r#"{"query":"SELECT * FROM users"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"][0]["email"], "ada@example.com");
}

#[tokio::test]
async fn discover_reports_refresh_in_hash() {
    let resp = app()
        .oneshot(get_request("/api/v1/connectors/1/discover?refresh=true"))
        .await
        .unwrap();

    let body = body_json(resp).await;
    let attributes = &body["data"]["attributes"];
    assert_eq!(attributes["catalog_hash"], "refreshed");
    assert_eq!(attributes["catalog"]["streams"][0]["name"], "users");
    assert_eq!(
        attributes["catalog"]["streams"][0]["json_schema"]["properties"]["id"]["type"],
        "integer"
    );
}

#[tokio::test]
async fn connector_definitions_filter_by_type() {
    let resp = app()
        .oneshot(get_request("/api/v1/connector_definitions?type=source"))
        .await
        .unwrap();

    let body = body_json(resp).await;
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert!(data.iter().all(|d| d["connector_type"] == "source"));
}

// --- models ---

#[tokio::test]
async fn list_models_filters_by_query_type() {
    let resp = app()
        .oneshot(get_request("/api/v1/models?query_type=dbt,soql"))
        .await
        .unwrap();

    let body = body_json(resp).await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let resp = app()
        .oneshot(get_request("/api/v1/models?query_type=raw_sql,dbt"))
        .await
        .unwrap();

    let body = body_json(resp).await;
    assert_eq!(body["data"][0]["attributes"]["connector"]["id"], 1);
}

#[tokio::test]
async fn create_model_requires_known_connector() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/v1/models",
            r#"{"model":{"name":"m","query":"SELECT 1","query_type":"raw_sql","connector_id":"77"}}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- syncs ---

#[tokio::test]
async fn sync_runs_are_scoped_to_their_sync() {
    let resp = app()
        .oneshot(get_request("/api/v1/syncs/1/sync_runs"))
        .await
        .unwrap();

    let body = body_json(resp).await;
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[1]["attributes"]["status"], "failed");

    let resp = app()
        .oneshot(get_request("/api/v1/syncs/2/sync_runs/1"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn enable_toggles_status() {
    let resp = app()
        .oneshot(json_request(
            "PATCH",
            "/api/v1/syncs/1/enable",
            r#"{"enable":false}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["data"]["attributes"]["status"], "disabled");
}

// --- reports ---

#[tokio::test]
async fn report_returns_both_metrics_by_day() {
    let resp = app()
        .oneshot(get_request(
            "/api/v1/reports?type=workspace_activity&metric=all&time_period=one_week",
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    let triggered = body["data"]["sync_run_triggered"].as_array().unwrap();
    assert_eq!(triggered.len(), 2);
    assert_eq!(triggered[0]["time_slice"], "2024-04-30T00:00:00Z");
    assert_eq!(triggered[1]["failed_count"], 1);
    assert_eq!(body["data"]["total_sync_run_rows"][1]["failed_count"], 3);
}

#[tokio::test]
async fn report_filters_by_connector_ids() {
    let resp = app()
        .oneshot(get_request(
            "/api/v1/reports?type=workspace_activity&metric=sync_run_triggered&time_period=one_day&connector_ids[]=55",
        ))
        .await
        .unwrap();

    let body = body_json(resp).await;
    assert!(body["data"]["sync_run_triggered"]
        .as_array()
        .unwrap()
        .is_empty());
    assert!(body["data"].get("total_sync_run_rows").is_none());
}

#[tokio::test]
async fn report_rejects_unknown_metric() {
    let resp = app()
        .oneshot(get_request(
            "/api/v1/reports?type=workspace_activity&metric=bogus",
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- lifecycle ---

#[tokio::test]
async fn sync_lifecycle() {
    let mut app = app().into_service();

    // create
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/api/v1/syncs",
            r#"{"sync":{"source_id":"1","destination_id":"2","model_id":"1","schedule_type":"manual","stream_name":"profile","sync_mode":"incremental","cursor_field":"updated_at"}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = body_json(resp).await;
    assert_eq!(created["data"]["attributes"]["status"], "active");
    let id = created["data"]["id"].as_str().unwrap().to_string();

    // get
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get_request(&format!("/api/v1/syncs/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched = body_json(resp).await;
    assert_eq!(fetched["data"]["attributes"]["cursor_field"], "updated_at");

    // delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(
            authed("DELETE", &format!("/api/v1/syncs/{id}"))
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    // get after delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get_request(&format!("/api/v1/syncs/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
