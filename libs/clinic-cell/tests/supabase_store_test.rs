use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use clinic_cell::*;
use shared_database::SupabaseClient;
use shared_utils::test_utils::TestConfig;

fn store_for(server: &MockServer) -> SupabaseClinicStore {
    let config = TestConfig::with_mock_url(&server.uri()).to_app_config();
    SupabaseClinicStore::new(Arc::new(SupabaseClient::new(&config)))
}

fn clinic_row(id: Uuid, admin: Uuid) -> serde_json::Value {
    json!({
        "id": id,
        "name": "Alexandra Health Centre",
        "province": "Gauteng",
        "city": null,
        "address": null,
        "phone": null,
        "email": "info@alexhealth.org.za",
        "registration_code": "CLINIC-1700000000-ABCDEFGHI",
        "code_used": true,
        "admin_user_id": admin,
        "created_at": null,
        "updated_at": null
    })
}

#[tokio::test]
async fn redemption_is_conditional_and_grants_role() {
    let server = MockServer::start().await;
    let clinic_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/clinics"))
        .and(query_param("id", format!("eq.{}", clinic_id)))
        .and(query_param("code_used", "eq.false"))
        .and(query_param("registration_code", "eq.CLINIC-1700000000-ABCDEFGHI"))
        .and(body_partial_json(json!({ "code_used": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([clinic_row(clinic_id, user_id)])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/users"))
        .and(query_param("id", format!("eq.{}", user_id)))
        .and(body_partial_json(json!({ "role": "clinic_admin" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": user_id }])))
        .expect(1)
        .mount(&server)
        .await;

    let clinic = store_for(&server)
        .redeem_if_unused(clinic_id, "CLINIC-1700000000-ABCDEFGHI", user_id)
        .await
        .unwrap()
        .expect("redemption won");

    assert!(clinic.code_used);
    assert_eq!(clinic.admin_user_id, Some(user_id));
}

#[tokio::test]
async fn lost_redemption_skips_role_grant() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/clinics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let result = store_for(&server)
        .redeem_if_unused(Uuid::new_v4(), "CLINIC-1700000000-ABCDEFGHI", Uuid::new_v4())
        .await
        .unwrap();

    assert!(result.is_none());
}

#[tokio::test]
async fn reissue_only_touches_unused_codes() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/clinics"))
        .and(query_param("code_used", "eq.false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let result = store_for(&server)
        .set_registration_code(Uuid::new_v4(), "CLINIC-1-NEW")
        .await
        .unwrap();

    assert!(result.is_none());
}
