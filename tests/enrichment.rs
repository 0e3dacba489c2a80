//! Gemini enricher against a mock `generateContent` endpoint.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{extract::State, http::HeaderMap, http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};

use inspiration_list::config::EnrichmentConfig;
use inspiration_list::enrich::{fallback_analysis, Enricher, GeminiEnricher};
use inspiration_list::error::UpstreamError;

/// Canned behaviour for the mock endpoint.
#[derive(Clone, Copy)]
enum Mode {
    Fenced,
    ServerError,
    FailOnceThenOk,
    NotJson,
    NoCandidates,
}

#[derive(Clone)]
struct Mock {
    mode: Mode,
    calls: Arc<AtomicUsize>,
    last_auth: Arc<Mutex<Option<String>>>,
    last_body: Arc<Mutex<Option<Value>>>,
}

const MODEL_JSON: &str = r#"{
  "summary": "语音记录应用",
  "details": "做一个随手记录灵感的应用。",
  "suggestions": ["调研竞品", "做原型"],
  "tags": ["应用", "语音"],
  "category": "技术创新"
}"#;

fn envelope(text: &str) -> Value {
    json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] })
}

async fn generate(
    State(mock): State<Mock>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let n = mock.calls.fetch_add(1, Ordering::SeqCst);
    *mock.last_auth.lock().unwrap() = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    *mock.last_body.lock().unwrap() = Some(body);

    let ok = envelope(&format!("```json\n{}\n```", MODEL_JSON));
    match mock.mode {
        Mode::Fenced => (StatusCode::OK, Json(ok)),
        Mode::ServerError => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "boom" })),
        ),
        Mode::FailOnceThenOk if n == 0 => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "busy" })),
        ),
        Mode::FailOnceThenOk => (StatusCode::OK, Json(ok)),
        Mode::NotJson => (
            StatusCode::OK,
            Json(envelope("Sorry, I cannot help with that.")),
        ),
        Mode::NoCandidates => (StatusCode::OK, Json(json!({ "candidates": [] }))),
    }
}

/// Start the mock and return its URL plus the shared state.
async fn start_mock(mode: Mode) -> (String, Mock) {
    let mock = Mock {
        mode,
        calls: Arc::new(AtomicUsize::new(0)),
        last_auth: Arc::new(Mutex::new(None)),
        last_body: Arc::new(Mutex::new(None)),
    };
    let app = Router::new()
        .route("/v1/generate", post(generate))
        .with_state(mock.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/v1/generate", addr), mock)
}

fn config_for(endpoint: &str, max_retries: u32) -> EnrichmentConfig {
    EnrichmentConfig {
        provider: "gemini".to_string(),
        endpoint: Some(endpoint.to_string()),
        timeout_secs: 5,
        max_retries,
        retry_backoff_ms: 10,
        ..EnrichmentConfig::default()
    }
}

const TEXT: &str = "我想做一个语音记录的APP";

#[tokio::test]
async fn test_fenced_reply_is_parsed() {
    let (url, mock) = start_mock(Mode::Fenced).await;
    let enricher = GeminiEnricher::new(&config_for(&url, 0), Some("secret".into())).unwrap();

    let content = enricher.try_enrich(TEXT).await.unwrap();
    assert_eq!(content.summary, "语音记录应用");
    assert_eq!(content.category, "技术创新");
    assert_eq!(content.suggestions, vec!["调研竞品", "做原型"]);
    assert_eq!(content.tags, vec!["应用", "语音"]);

    assert_eq!(
        mock.last_auth.lock().unwrap().as_deref(),
        Some("Bearer secret")
    );
}

#[tokio::test]
async fn test_request_carries_prompt_and_generation_config() {
    let (url, mock) = start_mock(Mode::Fenced).await;
    let enricher = GeminiEnricher::new(&config_for(&url, 0), Some("k".into())).unwrap();
    enricher.try_enrich(TEXT).await.unwrap();

    let body = mock.last_body.lock().unwrap().clone().unwrap();
    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.contains(TEXT));
    assert_eq!(body["generationConfig"]["topK"], 40);
    assert_eq!(body["generationConfig"]["maxOutputTokens"], 1024);
}

#[tokio::test]
async fn test_server_error_falls_back() {
    let (url, mock) = start_mock(Mode::ServerError).await;
    let enricher = GeminiEnricher::new(&config_for(&url, 0), Some("k".into())).unwrap();

    let err = enricher.try_enrich(TEXT).await.unwrap_err();
    assert!(matches!(err, UpstreamError::Status { status: 500, .. }));

    let content = enricher.enrich(TEXT).await;
    assert_eq!(content, fallback_analysis(TEXT));
    assert_eq!(mock.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let (url, mock) = start_mock(Mode::FailOnceThenOk).await;
    let enricher = GeminiEnricher::new(&config_for(&url, 2), Some("k".into())).unwrap();

    let content = enricher.enrich(TEXT).await;
    assert_eq!(content.summary, "语音记录应用");
    assert_eq!(mock.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_non_json_reply_falls_back() {
    let (url, _mock) = start_mock(Mode::NotJson).await;
    let enricher = GeminiEnricher::new(&config_for(&url, 0), Some("k".into())).unwrap();

    let err = enricher.try_enrich(TEXT).await.unwrap_err();
    assert!(matches!(err, UpstreamError::Malformed(_)));
    assert_eq!(enricher.enrich(TEXT).await.category, "技术创新");
}

#[tokio::test]
async fn test_empty_candidates_falls_back() {
    let (url, _mock) = start_mock(Mode::NoCandidates).await;
    let enricher = GeminiEnricher::new(&config_for(&url, 0), Some("k".into())).unwrap();

    let err = enricher.try_enrich(TEXT).await.unwrap_err();
    assert!(matches!(err, UpstreamError::EmptyResponse));
    assert_eq!(enricher.enrich(TEXT).await, fallback_analysis(TEXT));
}

#[tokio::test]
async fn test_missing_key_skips_network() {
    let (url, mock) = start_mock(Mode::Fenced).await;
    let enricher = GeminiEnricher::new(&config_for(&url, 0), None).unwrap();

    let err = enricher.try_enrich(TEXT).await.unwrap_err();
    assert!(matches!(err, UpstreamError::NotConfigured));
    assert_eq!(enricher.enrich(TEXT).await, fallback_analysis(TEXT));
    assert_eq!(mock.calls.load(Ordering::SeqCst), 0);
}
