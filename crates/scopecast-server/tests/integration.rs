use axum::http::StatusCode;
use chrono::NaiveDate;
use http_body_util::BodyExt;
use scopecast_ai::EstimatorClient;
use scopecast_core::config::Config;
use scopecast_core::types::fixtures::sample_document;
use scopecast_server::{build_router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

const GENERATE_PATH: &str = "/v1beta/models/gemini-test:generateContent";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn config(endpoint: &str) -> Config {
    let mut cfg = Config::default();
    cfg.ai.endpoint = endpoint.to_string();
    cfg.ai.model = "gemini-test".to_string();
    cfg.ai.api_key_env = "SCOPECAST_SERVER_TEST_KEY_NEVER_SET".to_string();
    cfg.ai.timeout_secs = 5;
    cfg
}

/// App state pointed at `endpoint`, with a key unless `with_key` is false.
fn app_state(endpoint: &str, with_key: bool) -> AppState {
    let cfg = config(endpoint);
    let client = EstimatorClient::from_config(&cfg)
        .unwrap()
        .with_api_key(with_key.then(|| "test-key".to_string()));
    AppState::new(cfg)
        .unwrap()
        .with_client(client)
        .with_today(NaiveDate::from_ymd_opt(2025, 3, 25).unwrap())
}

fn envelope(text: &str) -> String {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
    .to_string()
}

fn analyze_body() -> Value {
    json!({
        "projectName": "Clinic Booking",
        "description": "Patients book, reschedule and cancel dental appointments online with reminders.",
        "roleRates": [{ "role": "Back-end Developer", "hourlyRate": 55 }]
    })
}

async fn send(
    app: axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = axum::http::Request::builder().method(method).uri(uri);
    let req = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(axum::body::Body::from(serde_json::to_vec(&b).unwrap()))
            .unwrap(),
        None => builder.body(axum::body::Body::empty()).unwrap(),
    };
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    send(app, "GET", uri, None).await
}

async fn post_json(app: axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, "POST", uri, Some(body)).await
}

/// Mock server answering every generate call with the sample document.
async fn mock_success() -> (mockito::ServerGuard, mockito::Mock) {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", GENERATE_PATH)
        .with_status(200)
        .with_body(envelope(&serde_json::to_string(&sample_document()).unwrap()))
        .create_async()
        .await;
    (server, mock)
}

async fn loaded_app() -> (axum::Router, (mockito::ServerGuard, mockito::Mock)) {
    let server = mock_success().await;
    let app = build_router(app_state(&server.0.url(), true));
    let (status, _) = post_json(app.clone(), "/api/analyze", analyze_body()).await;
    assert_eq!(status, StatusCode::OK);
    (app, server)
}

// ---------------------------------------------------------------------------
// session / roles
// ---------------------------------------------------------------------------

#[tokio::test]
async fn session_starts_in_input() {
    let app = build_router(app_state("http://127.0.0.1:9", true));
    let (status, body) = get(app, "/api/session").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "input");
    assert_eq!(body["revision"], 0);
    assert!(body["report"].is_null());
}

#[tokio::test]
async fn roles_returns_roster() {
    let app = build_router(app_state("http://127.0.0.1:9", true));
    let (status, body) = get(app, "/api/roles").await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names.len(), 8);
    assert!(names.contains(&"QA Engineer"));
}

// ---------------------------------------------------------------------------
// analyze
// ---------------------------------------------------------------------------

#[tokio::test]
async fn analyze_produces_report() {
    let (app, _server) = loaded_app().await;
    let (status, body) = get(app, "/api/session").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "result");
    let report = &body["report"];
    assert_eq!(report["aggregates"]["total_cost"], 5550.0);
    assert_eq!(report["aggregates"]["total_hours"], 110.0);
    assert_eq!(report["duration"]["resolved_weeks"], 8);
    assert_eq!(report["timeline"]["anchor"], "2025-04-01");
}

#[tokio::test]
async fn analyze_reports_all_field_errors() {
    let app = build_router(app_state("http://127.0.0.1:9", true));
    let (status, body) = post_json(
        app.clone(),
        "/api/analyze",
        json!({ "projectName": "", "description": "short" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["projectName", "description"]);

    // Nothing was started.
    let (_, session) = get(app, "/api/session").await;
    assert_eq!(session["status"], "input");
}

#[tokio::test]
async fn analyze_without_key_is_503_and_records_error() {
    let app = build_router(app_state("http://127.0.0.1:9", false));
    let (status, body) = post_json(app.clone(), "/api/analyze", analyze_body()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("SCOPECAST_SERVER_TEST_KEY_NEVER_SET"));

    let (_, session) = get(app.clone(), "/api/session").await;
    assert_eq!(session["status"], "error");

    let (status, session) = post_json(app, "/api/session/dismiss", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["status"], "input");
}

#[tokio::test]
async fn service_failure_is_502_and_keeps_previous_result() {
    let (app, (mut server, _)) = loaded_app().await;
    server.reset_async().await;
    let _failing = server
        .mock("POST", GENERATE_PATH)
        .with_status(500)
        .with_body("internal")
        .create_async()
        .await;

    let (status, _) = post_json(app.clone(), "/api/analyze", analyze_body()).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let (_, session) = get(app, "/api/session").await;
    assert_eq!(session["status"], "error");
    assert_eq!(session["report"]["aggregates"]["total_cost"], 5550.0);
}

#[tokio::test]
async fn malformed_generation_is_502() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", GENERATE_PATH)
        .with_status(200)
        .with_body(envelope("Sorry, I cannot help with that."))
        .create_async()
        .await;
    let app = build_router(app_state(&server.url(), true));
    let (status, body) = post_json(app, "/api/analyze", analyze_body()).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("parse"));
}

#[tokio::test]
async fn analyze_while_in_flight_is_409() {
    let state = app_state("http://127.0.0.1:9", true);
    state.session.lock().await.begin_analysis().unwrap();
    let app = build_router(state);
    let (status, _) = post_json(app, "/api/analyze", analyze_body()).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

// ---------------------------------------------------------------------------
// rates
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rate_edit_before_result_is_404() {
    let app = build_router(app_state("http://127.0.0.1:9", true));
    let (status, _) = send(
        app,
        "PUT",
        "/api/rates/QA%20Engineer",
        Some(json!({ "rate": "40" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rate_edit_recomputes_totals() {
    let (app, _server) = loaded_app().await;
    let (status, body) = send(
        app.clone(),
        "PUT",
        "/api/rates/Back-end%20Developer",
        Some(json!({ "rate": "70" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["report"]["aggregates"]["total_cost"], 6300.0);

    let (status, body) = send(app, "DELETE", "/api/rates/Back-end%20Developer", None).await;
    assert_eq!(status, StatusCode::OK);
    // Reverting falls back to the tasks' own generated rate.
    assert_eq!(body["report"]["aggregates"]["total_cost"], 5550.0);
}

#[tokio::test]
async fn numeric_and_empty_rates_are_accepted() {
    let (app, _server) = loaded_app().await;
    let (status, body) = send(
        app.clone(),
        "PUT",
        "/api/rates/QA%20Engineer",
        Some(json!({ "rate": 50 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["report"]["aggregates"]["total_cost"], 5670.0);

    let (_, body) = send(
        app,
        "PUT",
        "/api/rates/QA%20Engineer",
        Some(json!({ "rate": "" })),
    )
    .await;
    assert_eq!(body["report"]["aggregates"]["total_cost"], 5070.0);
}

#[tokio::test]
async fn invalid_rate_is_400_and_changes_nothing() {
    let (app, _server) = loaded_app().await;
    let (_, before) = get(app.clone(), "/api/session").await;
    let (status, body) = send(
        app.clone(),
        "PUT",
        "/api/rates/QA%20Engineer",
        Some(json!({ "rate": "1,000" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("invalid rate input"));

    let (_, after) = get(app, "/api/session").await;
    assert_eq!(before["revision"], after["revision"]);
}

#[tokio::test]
async fn oversized_rate_is_400_and_session_still_renders() {
    let (app, _server) = loaded_app().await;
    for rate in [json!("100000000000000000000"), json!(1e20)] {
        let (status, body) = send(
            app.clone(),
            "PUT",
            "/api/rates/Back-end%20Developer",
            Some(json!({ "rate": rate })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("invalid rate input"));
    }

    let (status, body) = get(app, "/api/session").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "result");
    assert_eq!(body["report"]["aggregates"]["total_cost"], 5550.0);
}

// ---------------------------------------------------------------------------
// reset / events
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reset_returns_to_input() {
    let (app, _server) = loaded_app().await;
    let (status, body) = post_json(app.clone(), "/api/reset", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "input");

    let (status, _) = send(app, "DELETE", "/api/rates/QA%20Engineer", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn mutations_publish_snapshots() {
    let (server, _mock) = mock_success().await;
    let state = app_state(&server.url(), true);
    let mut rx = state.event_tx.subscribe();
    let app = build_router(state);

    let (status, _) = post_json(app, "/api/analyze", analyze_body()).await;
    assert_eq!(status, StatusCode::OK);

    let analyzing: Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
    assert_eq!(analyzing["status"], "analyzing");
    let result: Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
    assert_eq!(result["status"], "result");
    assert_eq!(result["report"]["aggregates"]["total_cost"], 5550.0);
}
