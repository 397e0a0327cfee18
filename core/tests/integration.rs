//! End-to-end tests against the live mock backend.
//!
//! # Design
//! Starts the mock server on a random port, then drives the endpoint
//! functions over real HTTP through `ReqwestTransport`. Validates that request
//! building, header injection and response decoding line up with what the
//! backend actually serves.

use std::net::SocketAddr;

use dashboard_core::endpoints::{connectors, models, reports, syncs};
use dashboard_core::types::{
    ConnectorInput, CreateConnectorPayload, CreateModelPayload, ModelInput,
};
use dashboard_core::{
    ApiClient, ApiError, ClientConfig, ConnectorKind, ModelQueryType, ReportMetric,
    ReportOptions, ReportTimePeriod, ReqwestTransport, SyncRunStatus,
};

/// Serve a freshly seeded mock backend on a background thread.
fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

fn client_for(addr: SocketAddr, token: &str) -> ApiClient {
    let config = ClientConfig::new(
        format!("http://{addr}"),
        mock_server::DEFAULT_WORKSPACE_ID,
        token,
    );
    ApiClient::new(config, ReqwestTransport::new().unwrap())
}

#[tokio::test]
async fn read_paths() {
    let addr = start_server();
    let client = client_for(addr, mock_server::DEFAULT_TOKEN);

    // Connectors, filtered and unfiltered.
    let all = connectors::get_all_connectors(&client).await.unwrap();
    assert_eq!(all.data.unwrap().len(), 2);
    assert!(all.links.unwrap().next.is_none());

    let sources = connectors::get_user_connectors(&client, Some(ConnectorKind::Source), None, None)
        .await
        .unwrap();
    let sources = sources.data.unwrap();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].id, "1");
    assert_eq!(sources[0].attributes.name, "Production Postgres");

    let info = connectors::get_connector_info(&client, "2").await.unwrap();
    assert_eq!(
        info.data.unwrap().attributes.connector_type,
        Some(ConnectorKind::Destination)
    );

    let definitions = connectors::get_connector_definitions(&client, ConnectorKind::Destination)
        .await
        .unwrap();
    assert_eq!(definitions.data.unwrap().len(), 2);

    // Catalog discovery.
    let catalog = syncs::get_catalog(&client, "1", true).await.unwrap();
    let catalog = catalog.data.unwrap().attributes;
    assert_eq!(catalog.catalog_hash.as_deref(), Some("refreshed"));
    assert_eq!(catalog.connector_id.as_deref(), Some("1"));
    assert_eq!(catalog.catalog.streams[0].name, "users");
    assert!(catalog.catalog.streams[0].json_schema.properties.contains_key("email"));

    let cached = syncs::get_catalog_default(&client, "1").await.unwrap();
    assert_eq!(
        cached.data.unwrap().attributes.catalog_hash.as_deref(),
        Some("cached")
    );

    // Models and execution.
    let models = models::get_all_models(&client, None, None, None).await.unwrap();
    let models = models.data.unwrap();
    assert_eq!(models.len(), 1);
    assert_eq!(models[0].attributes.connector.id, "1");

    let rows = models::execute_model(&client, "1").await.unwrap();
    let rows = rows.data.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["email"], "ada@example.com");

    let missing = models::execute_model(&client, "404").await.unwrap();
    assert!(missing.data.is_none());
    assert_eq!(missing.status, Some(404));

    let malformed = models::execute_model(&client, "missing-id").await.unwrap();
    assert!(malformed.data.is_none());
    assert_eq!(malformed.status, Some(404));
    assert_eq!(
        malformed.errors.unwrap()[0].detail.as_deref(),
        Some("Model not found")
    );

    let bad_id = connectors::get_connector_info(&client, "abc").await.unwrap();
    assert_eq!(bad_id.errors.unwrap()[0].status, Some(422));

    // Syncs and runs.
    let page = syncs::fetch_syncs(&client, 1, 10).await.unwrap();
    let page = page.data.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].attributes.source_id.as_deref(), Some("1"));

    let runs = syncs::get_sync_runs_by_sync_id(&client, "1", 1, 10).await.unwrap();
    let runs = runs.data.unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].attributes.sync_id, "1");
    assert_eq!(runs[1].attributes.status, SyncRunStatus::Failed);

    let run = syncs::get_sync_run_by_id(&client, "1", "2").await.unwrap();
    assert_eq!(
        run.data.unwrap().attributes.error.as_deref(),
        Some("destination rejected 3 records")
    );

    // Reports.
    let report = reports::get_report(&client, &ReportOptions::default()).await.unwrap();
    let report = report.data.unwrap();
    assert_eq!(report["sync_run_triggered"].len(), 2);
    assert_eq!(report["total_sync_run_rows"][0].success_count, 10);

    let filtered = ReportOptions::new(ReportMetric::SyncRunTriggered, ReportTimePeriod::ThirtyDays)
        .with_connector_ids(["2"]);
    let report = reports::get_report(&client, &filtered).await.unwrap();
    let report = report.data.unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(report["sync_run_triggered"][1].failed_count, 1);
}

#[tokio::test]
async fn write_paths() {
    let addr = start_server();
    let client = client_for(addr, mock_server::DEFAULT_TOKEN);

    // Create a connector, then rename it.
    let payload = CreateConnectorPayload {
        connector: ConnectorInput {
            name: "Analytics Snowflake".to_string(),
            connector_type: ConnectorKind::Source,
            connector_name: "Snowflake".to_string(),
            description: None,
            configuration: Default::default(),
        },
    };
    let created = connectors::create_connector(&client, &payload).await.unwrap();
    let connector_id = created.data.unwrap().id;

    let mut renamed = payload.clone();
    renamed.connector.name = "Snowflake (prod)".to_string();
    let updated = connectors::update_connector(&client, &connector_id, &renamed)
        .await
        .unwrap();
    assert_eq!(updated.data.unwrap().attributes.name, "Snowflake (prod)");

    // A model on the new connector.
    let model = CreateModelPayload {
        model: ModelInput {
            name: "Orders".to_string(),
            description: None,
            query: "SELECT * FROM orders".to_string(),
            query_type: ModelQueryType::RawSql,
            primary_key: Some("id".to_string()),
            connector_id: connector_id.clone(),
        },
    };
    let created = models::create_model(&client, &model).await.unwrap();
    let model_id = created.data.unwrap().id;

    let by_type = models::get_all_models(&client, None, None, Some("raw_sql"))
        .await
        .unwrap();
    assert_eq!(by_type.data.unwrap().len(), 2);

    // 204 No Content decodes to an empty envelope.
    let deleted = models::delete_model(&client, &model_id).await.unwrap();
    assert!(deleted.data.is_none());
    assert!(!deleted.has_errors());

    let gone = models::get_model_by_id(&client, &model_id).await.unwrap();
    assert_eq!(gone.errors.unwrap()[0].status, Some(404));

    // Toggle the seeded sync.
    let disabled = syncs::change_sync_status(&client, "1", false).await.unwrap();
    assert_eq!(
        disabled.data.unwrap().attributes.status.as_deref(),
        Some("disabled")
    );

    let removed = connectors::delete_connector(&client, &connector_id).await.unwrap();
    assert_eq!(removed.data.unwrap().id, connector_id);
}

#[tokio::test]
async fn rejected_credentials_come_back_as_envelope() {
    let addr = start_server();
    let client = client_for(addr, "wrong-token");

    let response = connectors::get_all_connectors(&client).await.unwrap();
    assert!(response.data.is_none());
    let errors = response.errors.unwrap();
    assert_eq!(errors[0].status, Some(401));

    // The fixed token header follows the shared config.
    client.config().set_token(mock_server::DEFAULT_TOKEN);
    let response = connectors::get_all_connectors(&client).await.unwrap();
    assert_eq!(response.data.unwrap().len(), 2);
}

#[tokio::test]
async fn unreachable_host_is_transport_error() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let client = client_for(addr, mock_server::DEFAULT_TOKEN);

    let err = connectors::get_all_connectors(&client).await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}
