//! End-to-end tests of the registry service over HTTP, in-memory mode.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use certreg_api::auth::{ApiKey, AuthConfig};
use certreg_api::bootstrap::genesis_ledger;
use certreg_api::state::AppState;
use certreg_core::Address;

const ADMIN: &str = "Bearer admin-token";
const ADMIN2: &str = "Bearer admin2-token";
const OUTSIDER: &str = "Bearer outsider-token";

const STUDENT1_CERTS: &str = "/v1/students/0xStudent1/certificates";

fn test_app() -> Router {
    let keys: Vec<ApiKey> = [
        "0xA0=admin-token",
        "0xAdmin2=admin2-token",
        "0xB=outsider-token",
    ]
    .iter()
    .map(|entry| entry.parse().unwrap())
    .collect();
    let registry = genesis_ledger(&Address::new("0xA0").unwrap(), &[]).unwrap();
    let state = AppState::new(registry).with_auth(AuthConfig::new(keys).unwrap());
    certreg_api::app(state)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    auth: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, String) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(value) = auth {
        builder = builder.header("Authorization", value);
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    send(app, "GET", uri, None, None).await
}

async fn post(
    app: &Router,
    uri: &str,
    auth: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, String) {
    send(app, "POST", uri, auth, body).await
}

async fn revoke(app: &Router, auth: &str, id: u64) -> StatusCode {
    post(app, &format!("/v1/certificates/{id}/revoke"), Some(auth), None).await.0
}

fn parse(body: &str) -> Value {
    serde_json::from_str(body).unwrap()
}

fn alice() -> Value {
    json!({
        "studentName": "Alice",
        "certificateName": "CS101",
        "year": 2024,
        "score": 95,
        "studentAddress": "0xStudent1",
    })
}

async fn issue(app: &Router, auth: &str, body: Value) -> u64 {
    let (status, body) = post(app, "/v1/certificates", Some(auth), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    parse(&body)["id"].as_u64().unwrap()
}

async fn verify(app: &Router, student: &str, certificate: &str) -> bool {
    let uri =
        format!("/v1/certificates/verify?studentName={student}&certificateName={certificate}");
    let (status, body) = get(app, &uri).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    parse(&body)["valid"].as_bool().unwrap()
}

// -- Probes ------------------------------------------------------------------

#[tokio::test]
async fn health_probes_need_no_credentials() {
    let app = test_app();
    assert_eq!(get(&app, "/health/liveness").await, (StatusCode::OK, "ok".into()));
    assert_eq!(get(&app, "/health/readiness").await, (StatusCode::OK, "ready".into()));
}

#[tokio::test]
async fn metrics_without_recorder_is_not_found() {
    let app = test_app();
    let (status, _) = get(&app, "/metrics").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = test_app();
    let (status, body) = get(&app, "/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert!(parse(&body)["paths"]["/v1/certificates"].is_object());
}

// -- Issuance and queries ----------------------------------------------------

#[tokio::test]
async fn issue_then_list_by_student() {
    let app = test_app();
    let id = issue(&app, ADMIN, alice()).await;
    assert_eq!(id, 0);

    let (status, body) = get(&app, STUDENT1_CERTS).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        parse(&body),
        json!([{
            "id": 0,
            "studentName": "Alice",
            "certificateName": "CS101",
            "year": 2024,
            "score": 95,
            "student": "0xStudent1",
            "issuer": "0xA0",
            "valid": true,
        }])
    );

    let (status, body) = get(&app, "/v1/certificates/0").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body)["studentName"], "Alice");
}

#[tokio::test]
async fn non_admin_issue_is_forbidden_and_consumes_no_id() {
    let app = test_app();
    let (status, body) = post(&app, "/v1/certificates", Some(OUTSIDER), Some(alice())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(parse(&body)["error"]["code"], "FORBIDDEN");

    assert_eq!(issue(&app, ADMIN, alice()).await, 0);
}

#[tokio::test]
async fn mutations_require_a_token() {
    let app = test_app();
    let (status, _) = post(&app, "/v1/certificates", None, Some(alice())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = post(&app, "/v1/certificates", Some("Bearer nope"), Some(alice())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = post(&app, "/v1/certificates/0/revoke", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = post(&app, "/v1/admins", None, Some(json!({"address": "0xB"}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn ids_are_sequential() {
    let app = test_app();
    for expected in 0..3 {
        assert_eq!(issue(&app, ADMIN, alice()).await, expected);
    }
}

#[tokio::test]
async fn invalid_fields_are_rejected() {
    let app = test_app();

    let mut empty_name = alice();
    empty_name["studentName"] = json!("");
    let (status, body) = post(&app, "/v1/certificates", Some(ADMIN), Some(empty_name)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(parse(&body)["error"]["code"], "VALIDATION_ERROR");

    let mut bad_student = alice();
    bad_student["studentAddress"] = json!("not an address");
    let (status, _) = post(&app, "/v1/certificates", Some(ADMIN), Some(bad_student)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // Nothing was issued.
    let (_, body) = get(&app, STUDENT1_CERTS).await;
    assert_eq!(parse(&body), json!([]));
}

#[tokio::test]
async fn out_of_range_numbers_are_validation_errors() {
    let app = test_app();

    let mut huge_year = alice();
    huge_year["year"] = json!(9_007_199_254_740_992u64);
    let (status, body) = post(&app, "/v1/certificates", Some(ADMIN), Some(huge_year)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(parse(&body)["error"]["code"], "VALIDATION_ERROR");

    let mut negative = alice();
    negative["score"] = json!(-5);
    let (status, body) = post(&app, "/v1/certificates", Some(ADMIN), Some(negative)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(parse(&body)["error"]["code"], "VALIDATION_ERROR");

    let mut fractional = alice();
    fractional["year"] = json!(2024.5);
    let (status, body) = post(&app, "/v1/certificates", Some(ADMIN), Some(fractional)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(parse(&body)["error"]["code"], "BAD_REQUEST");

    let (_, body) = get(&app, STUDENT1_CERTS).await;
    assert_eq!(parse(&body), json!([]));
}

#[tokio::test]
async fn negative_number_from_non_admin_is_forbidden() {
    let app = test_app();
    let mut negative = alice();
    negative["year"] = json!(-1);
    let (status, _) = post(&app, "/v1/certificates", Some(OUTSIDER), Some(negative)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn nul_in_names_is_a_validation_error() {
    let app = test_app();
    let mut nul_name = alice();
    nul_name["studentName"] = json!("Al\u{0}ice");
    let (status, body) = post(&app, "/v1/certificates", Some(ADMIN), Some(nul_name)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(parse(&body)["error"]["code"], "VALIDATION_ERROR");

    let (_, body) = get(&app, STUDENT1_CERTS).await;
    assert_eq!(parse(&body), json!([]));
}

#[tokio::test]
async fn zero_year_and_score_are_accepted() {
    let app = test_app();
    let mut zeros = alice();
    zeros["year"] = json!(0);
    zeros["score"] = json!(0);
    assert_eq!(issue(&app, ADMIN, zeros).await, 0);
}

// -- Revocation and verification ---------------------------------------------

#[tokio::test]
async fn revoke_then_verify_is_false() {
    let app = test_app();
    let id = issue(&app, ADMIN, alice()).await;
    assert!(verify(&app, "Alice", "CS101").await);

    assert_eq!(revoke(&app, ADMIN, id).await, StatusCode::NO_CONTENT);
    assert!(!verify(&app, "Alice", "CS101").await);

    // Repeat revocation succeeds and changes nothing.
    assert_eq!(revoke(&app, ADMIN, id).await, StatusCode::NO_CONTENT);

    let (_, body) = get(&app, STUDENT1_CERTS).await;
    assert_eq!(parse(&body)[0]["valid"], false);
}

#[tokio::test]
async fn revoke_unknown_id_is_not_found() {
    let app = test_app();
    let (status, body) = post(&app, "/v1/certificates/999/revoke", Some(ADMIN), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(parse(&body)["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn non_admin_revoke_is_forbidden_even_for_unknown_ids() {
    let app = test_app();
    assert_eq!(revoke(&app, OUTSIDER, 999).await, StatusCode::FORBIDDEN);

    let id = issue(&app, ADMIN, alice()).await;
    assert_eq!(revoke(&app, OUTSIDER, id).await, StatusCode::FORBIDDEN);
    assert!(verify(&app, "Alice", "CS101").await);
}

#[tokio::test]
async fn duplicate_names_stay_verifiable_until_all_revoked() {
    let app = test_app();
    let first = issue(&app, ADMIN, alice()).await;
    let mut other = alice();
    other["studentAddress"] = json!("0xStudent2");
    other["score"] = json!(70);
    let second = issue(&app, ADMIN, other).await;

    revoke(&app, ADMIN, first).await;
    assert!(verify(&app, "Alice", "CS101").await);

    revoke(&app, ADMIN, second).await;
    assert!(!verify(&app, "Alice", "CS101").await);
}

#[tokio::test]
async fn verify_requires_both_parameters() {
    let app = test_app();
    let (status, _) = get(&app, "/v1/certificates/verify?studentName=Alice").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_certificate_lookup_is_not_found() {
    let app = test_app();
    let (status, _) = get(&app, "/v1/certificates/42").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get(&app, "/v1/certificates/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// -- Admins ------------------------------------------------------------------

#[tokio::test]
async fn added_admin_can_issue() {
    let app = test_app();
    let (status, body) = get(&app, "/v1/admins/0xAdmin2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body), json!({"address": "0xAdmin2", "isAdmin": false}));

    let (status, _) = post(&app, "/v1/certificates", Some(ADMIN2), Some(alice())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let grant = json!({"address": "0xAdmin2"});
    let (status, _) = post(&app, "/v1/admins", Some(ADMIN), Some(grant)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = get(&app, "/v1/admins/0xAdmin2").await;
    assert_eq!(parse(&body)["isAdmin"], true);

    let mut bob = alice();
    bob["studentName"] = json!("Bob");
    bob["studentAddress"] = json!("0xStudent2");
    assert_eq!(issue(&app, ADMIN2, bob).await, 0);
}

#[tokio::test]
async fn non_admin_cannot_grant_admin() {
    let app = test_app();
    let grant = json!({"address": "0xB"});
    let (status, _) = post(&app, "/v1/admins", Some(OUTSIDER), Some(grant)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = get(&app, "/v1/admins/0xB").await;
    assert_eq!(parse(&body)["isAdmin"], false);
}

#[tokio::test]
async fn malformed_admin_body_is_bad_request() {
    let app = test_app();
    let wrong_field = json!({"addr": "0xB"});
    let (status, _) = post(&app, "/v1/admins", Some(ADMIN), Some(wrong_field)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let bad_address = json!({"address": "bad address"});
    let (status, _) = post(&app, "/v1/admins", Some(ADMIN), Some(bad_address)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

// -- Journal -----------------------------------------------------------------

#[tokio::test]
async fn journal_records_each_mutation_once() {
    let app = test_app();
    let id = issue(&app, ADMIN, alice()).await;
    revoke(&app, ADMIN, id).await;
    revoke(&app, ADMIN, id).await;
    post(&app, "/v1/admins", Some(ADMIN), Some(json!({"address": "0xA0"}))).await;
    post(&app, "/v1/certificates", Some(OUTSIDER), Some(alice())).await;

    let (status, body) = get(&app, "/v1/journal").await;
    assert_eq!(status, StatusCode::OK);
    let page = parse(&body);
    let kinds: Vec<&str> = page["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["kind"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["bootstrap", "certificate_issued", "certificate_revoked"]);
    assert_eq!(page["nextSeq"], 3);
    assert_eq!(page["entries"][1]["caller"], "0xA0");

    let (status, body) = get(&app, "/v1/journal?from=2&limit=5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body)["entries"].as_array().unwrap().len(), 1);

    let (status, body) = get(&app, "/v1/journal/verify").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        parse(&body),
        json!({"totalEntries": 3, "firstBroken": null, "chainValid": true})
    );
}
