use serde::Deserialize;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_config::AppConfig;
use shared_database::{Filter, SupabaseClient};
use shared_models::AppError;

#[derive(Debug, Deserialize, PartialEq)]
struct Row {
    id: u32,
    status: String,
}

fn config_for(server: &MockServer) -> AppConfig {
    AppConfig {
        supabase_url: server.uri(),
        supabase_anon_key: "anon-key".to_string(),
        supabase_service_role_key: "service-key".to_string(),
        ..AppConfig::default()
    }
}

#[tokio::test]
async fn select_sends_eq_filters_and_keys() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "eq.confirmed"))
        .and(header("apikey", "anon-key"))
        .and(header("authorization", "Bearer service-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "status": "confirmed" }
        ])))
        .mount(&server)
        .await;

    let client = SupabaseClient::new(&config_for(&server));
    let rows: Vec<Row> = client
        .select("appointments", &[Filter::eq("status", "confirmed")])
        .await
        .unwrap();

    assert_eq!(rows, vec![Row { id: 1, status: "confirmed".to_string() }]);
}

#[tokio::test]
async fn update_where_returns_empty_when_condition_misses() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", "eq.7"))
        .and(query_param("status", "eq.pending"))
        .and(header("prefer", "return=representation"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = SupabaseClient::new(&config_for(&server));
    let rows: Vec<Row> = client
        .update_where(
            "appointments",
            &[Filter::eq("id", 7), Filter::eq("status", "pending")],
            json!({ "status": "confirmed" }),
        )
        .await
        .unwrap();

    assert!(rows.is_empty());
}

#[tokio::test]
async fn server_errors_map_to_database_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/clinics"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = SupabaseClient::new(&config_for(&server));
    let result: Result<Option<Row>, AppError> = client.select_one("clinics", &[]).await;

    match result {
        Err(AppError::Database(message)) => assert!(message.contains("boom")),
        other => panic!("expected database error, got {:?}", other),
    }
}
