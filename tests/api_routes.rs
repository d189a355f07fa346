use std::{sync::Arc, time::Duration};
use axum::{
    body::{self, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use muhurto::{
    create_router,
    services::{AskAiProxy, GeminiClient, UNAVAILABLE_MESSAGE},
    state::{AppState, MemoryStore, SessionPhase, SettingsStore},
};

const GENERATE_PATH: &str = "/v1beta/models/gemini-1.5-flash:generateContent";

fn app_with(proxy: AskAiProxy) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(
        SettingsStore::load(MemoryStore::new()),
        proxy,
        8888,
        "127.0.0.1".to_string(),
    ));
    (create_router(Arc::clone(&state)), state)
}

fn app() -> (Router, Arc<AppState>) {
    app_with(AskAiProxy::unconfigured())
}

fn proxy_for(server: &MockServer) -> AskAiProxy {
    let client = GeminiClient::new("test-key", server.uri(), "gemini-1.5-flash", Duration::from_secs(5))
        .expect("client");
    AskAiProxy::new(client)
}

fn candidate(text: &str) -> Value {
    json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] })
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::post(uri).body(Body::empty()).expect("request")
}

#[tokio::test]
async fn ask_ai_returns_exact_recommendation_shape() {
    let server = MockServer::start().await;
    let text = r#"{"recommendationText":"To calm your mind for sleep, let's try the 4-7-8 breath.","settings":{"inhale":4,"hold":7,"exhale":8,"rest":0,"totalCycles":10},"mood":"tired"}"#;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate(text)))
        .expect(1)
        .mount(&server)
        .await;

    let (app, _state) = app_with(proxy_for(&server));
    let (status, body) = send(&app, post_json("/ask-ai", json!({ "query": "I can't sleep" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "recommendationText": "To calm your mind for sleep, let's try the 4-7-8 breath.",
            "settings": { "inhale": 4, "hold": 7, "exhale": 8, "rest": 0, "totalCycles": 10 }
        })
    );
}

#[tokio::test]
async fn ask_ai_rejects_empty_body() {
    let (app, _state) = app();
    let (status, body) = send(&app, post_empty("/ask-ai")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("query"));
}

#[tokio::test]
async fn ask_ai_rejects_other_methods() {
    let (app, _state) = app();
    let response = app
        .oneshot(Request::get("/ask-ai").body(Body::empty()).expect("request"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers().get(header::ALLOW).unwrap(), "POST");
}

#[tokio::test]
async fn ask_ai_without_credential_is_a_generic_500() {
    let (app, _state) = app();
    let (status, body) = send(&app, post_json("/ask-ai", json!({ "query": "stressed" }))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": UNAVAILABLE_MESSAGE }));
}

#[tokio::test]
async fn ask_ai_hides_upstream_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded, key=secret"))
        .mount(&server)
        .await;

    let (app, _state) = app_with(proxy_for(&server));
    let (status, body) = send(&app, post_json("/ask-ai", json!({ "query": "anxious" }))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": UNAVAILABLE_MESSAGE }));
}

#[tokio::test]
async fn ask_ai_never_forwards_malformed_model_output() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(candidate(r#"{"recommendationText":"Breathe","settings":{"inhale":4}}"#)),
        )
        .mount(&server)
        .await;

    let (app, _state) = app_with(proxy_for(&server));
    let (status, body) = send(&app, post_json("/ask-ai", json!({ "query": "angry" }))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": UNAVAILABLE_MESSAGE }));
}

#[tokio::test]
async fn session_plan_lists_every_transition() {
    let (app, state) = app();
    state
        .with_settings(|store| store.apply_rhythm(muhurto::RhythmConfig::new(4, 7, 8, 0, 1)))
        .unwrap();

    let (status, body) = send(&app, Request::get("/session/plan").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    let offsets: Vec<u64> = body["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["offsetMs"].as_u64().unwrap())
        .collect();
    assert_eq!(offsets, vec![0, 4_000, 11_000, 19_000, 19_000]);
    assert_eq!(body["totalDurationMs"], 19_000);
}

#[tokio::test]
async fn toggle_starts_then_stops() {
    let (app, _state) = app();

    let (status, body) = send(&app, post_empty("/session/toggle")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phase"], "inhale");
    assert_eq!(body["isActive"], true);
    assert_eq!(body["counter"], "1 / 10");

    let (_, body) = send(&app, post_empty("/session/toggle")).await;
    assert_eq!(body["phase"], "idle");
    assert_eq!(body["isActive"], false);
    assert_eq!(body["counter"], "0 / 0");
}

#[tokio::test]
async fn adjust_ignores_out_of_range_steps() {
    let (app, _state) = app();

    let (_, body) = send(&app, post_json("/settings/adjust", json!({ "field": "hold", "delta": -4 }))).await;
    assert_eq!(body["hold"], 0);

    let (status, body) = send(&app, post_json("/settings/adjust", json!({ "field": "hold", "delta": -1 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hold"], 0);

    let (_, body) = send(&app, post_json("/settings/adjust", json!({ "field": "totalCycles", "delta": 5 }))).await;
    assert_eq!(body["totalCycles"], 15);
}

#[tokio::test]
async fn theme_and_toggles_are_saved() {
    let (app, state) = app();

    send(&app, post_json("/settings/theme", json!({ "theme": "light" }))).await;
    send(&app, post_empty("/settings/haptics")).await;
    let (_, body) = send(&app, post_empty("/settings/voice")).await;

    assert_eq!(body["theme"], "light");
    assert_eq!(body["hapticsEnabled"], false);
    assert_eq!(body["voiceEnabled"], true);
    assert!(state.get_settings().unwrap().voice_enabled);
}

#[tokio::test]
async fn applying_a_recommendation_resets_the_running_session() {
    let (app, state) = app();
    send(&app, post_empty("/session/start")).await;
    assert!(state.session.state().is_active());

    let rhythm = json!({ "inhale": 4, "hold": 7, "exhale": 8, "rest": 0, "totalCycles": 10 });
    let (status, body) = send(&app, post_json("/recommendation/apply", rhythm)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["settings"]["hold"], 7);
    assert_eq!(body["settings"]["exhale"], 8);
    assert_eq!(body["session"]["phase"], "idle");
    assert_eq!(state.session.state().phase, SessionPhase::Idle);
}

#[tokio::test]
async fn applying_zero_cycles_is_rejected() {
    let (app, _state) = app();
    let rhythm = json!({ "inhale": 4, "hold": 7, "exhale": 8, "rest": 0, "totalCycles": 0 });
    let (status, _) = send(&app, post_json("/recommendation/apply", rhythm)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn applying_an_out_of_range_rhythm_is_rejected_and_not_stored() {
    let (app, state) = app();
    let rhythm = json!({ "inhale": 0, "hold": 0, "exhale": 0, "rest": 0, "totalCycles": 4_000_000_000u32 });
    let (status, body) = send(&app, post_json("/recommendation/apply", rhythm)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "inhale must be between 1 and 20, got 0");
    let settings = state.get_settings().unwrap();
    assert_eq!(settings.inhale, 4);
    assert_eq!(settings.total_cycles, 10);

    let (status, body) = send(&app, Request::get("/session/plan").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["events"].as_array().map(Vec::len), Some(41));
}

#[tokio::test]
async fn out_of_range_upstream_rhythm_is_a_server_error() {
    let server = MockServer::start().await;
    let text = r#"{"recommendationText":"Breathe forever.","settings":{"inhale":4,"hold":4,"exhale":4,"rest":4,"totalCycles":4000000000}}"#;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate(text)))
        .mount(&server)
        .await;

    let (app, _state) = app_with(proxy_for(&server));
    let (status, body) = send(&app, post_json("/ask-ai", json!({ "query": "tired" }))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], UNAVAILABLE_MESSAGE);
}

#[tokio::test]
async fn health_and_status_report_ok() {
    let (app, _state) = app();

    let (status, body) = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(&app, Request::get("/status").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["aiConfigured"], false);
    assert_eq!(body["session"]["phase"], "idle");
}
