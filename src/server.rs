//! JSON HTTP API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`    | `/api/health` | Liveness, version, active backends |
//! | `GET`    | `/api/stats` | Index size and per-category counts |
//! | `POST`   | `/api/inspirations` | Create (enrich + store) a record |
//! | `GET`    | `/api/inspirations` | Paginated list (`page`, `limit`, `category`, `search`) |
//! | `GET`    | `/api/inspirations/{id}` | Full record |
//! | `DELETE` | `/api/inspirations/{id}` | Delete a record |
//! | `OPTIONS`| any | CORS preflight, empty 200 |
//!
//! Anything else under `/api` is a JSON 404. Other paths are served from
//! `[server].static_dir` when configured.
//!
//! # Error Contract
//!
//! ```json
//! { "error": "Bad Request", "message": "transcribedText is required" }
//! ```
//!
//! `error` is the HTTP reason phrase. Internal failures carry a fixed
//! message per operation; the cause is only logged. Handler panics become
//! `500` responses.
//!
//! # CORS
//!
//! All origins are allowed so the browser client can be hosted anywhere.

use std::any::Any;
use std::path::Path as FsPath;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, Request, State},
    http::{header, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::enrich::create_enricher;
use crate::error::RecordError;
use crate::kv::open_store;
use crate::models::{InspirationRecord, ListPage, StoreStats};
use crate::records::{ListQuery, RecordStore, DEFAULT_PAGE_SIZE, MAX_TEXT_CHARS};
use crate::validate::{validate, FieldKind, FieldRule, Schema};

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    records: Arc<RecordStore>,
    /// Body schema for `POST /api/inspirations`.
    create_schema: Arc<Schema>,
}

impl AppState {
    pub fn new(records: Arc<RecordStore>) -> anyhow::Result<Self> {
        Ok(Self {
            records,
            create_schema: Arc::new(create_request_schema()?),
        })
    }
}

/// `{ transcribedText: string (1..=5000 chars), audioData?: base64 string }`.
pub fn create_request_schema() -> Result<Schema, regex::Error> {
    Ok(Schema::new(vec![
        FieldRule::new("transcribedText")
            .required()
            .kind(FieldKind::String)
            .min_length(1)
            .max_length(MAX_TEXT_CHARS),
        FieldRule::new("audioData")
            .kind(FieldKind::String)
            .pattern(Regex::new(r"^(data:[\w.+/-]+;base64,)?[A-Za-z0-9+/=\s]*$")?),
    ]))
}

/// Starts the HTTP server.
///
/// Opens the configured store and enricher, binds `[server].bind`, and serves
/// until Ctrl-C.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let kv = open_store(&config.store).await?;
    let enricher = create_enricher(&config.enrichment)?;
    let records = Arc::new(RecordStore::new(kv, enricher));
    let state = AppState::new(records)?;

    let app = build_router(state, config.server.static_dir.as_deref());

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        store = %config.store.backend,
        enrichment = %config.enrichment.provider,
        "inspiration server listening"
    );
    println!("Server listening on http://{}", config.server.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

/// The full application: API routes, static fallback, and middleware.
pub fn build_router(state: AppState, static_dir: Option<&FsPath>) -> Router {
    let api = Router::new()
        .route(
            "/health",
            get(handle_health).fallback(handle_api_not_found),
        )
        .route("/stats", get(handle_stats).fallback(handle_api_not_found))
        .route(
            "/inspirations",
            get(handle_list)
                .post(handle_create)
                .fallback(handle_api_not_found),
        )
        .route(
            "/inspirations/{id}",
            get(handle_get)
                .delete(handle_delete)
                .fallback(handle_api_not_found),
        )
        .fallback(handle_api_not_found);

    let app = Router::new().nest("/api", api);
    let app = match static_dir {
        Some(dir) => app.fallback_service(ServeDir::new(dir)),
        None => app.fallback(handle_static_not_found),
    };

    with_middleware(app.with_state(state))
}

/// Middleware stack, outermost last: panic capture, `OPTIONS` replies,
/// request tracing, CORS.
pub fn with_middleware(router: Router) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(86400));

    router
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn(answer_options))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Empty 200 for every `OPTIONS` request the CORS layer did not treat as a
/// preflight.
async fn answer_options(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    next.run(request).await
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    /// HTTP reason phrase (e.g. `"Not Found"`).
    error: String,
    message: String,
    /// Individual validation failures, when there are several.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    details: Vec<String>,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    details: Vec<String>,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// Map a store error, hiding internal causes behind `internal_message`.
    fn from_record(err: RecordError, internal_message: &str) -> Self {
        match err {
            RecordError::Validation(errors) => {
                let mut e = Self::new(StatusCode::BAD_REQUEST, errors.join("; "));
                if errors.len() > 1 {
                    e.details = errors;
                }
                e
            }
            RecordError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, "Inspiration not found"),
            RecordError::Unavailable(msg) => Self::new(StatusCode::SERVICE_UNAVAILABLE, msg),
            RecordError::Internal(cause) => {
                tracing::error!(error = %cause, "{}", internal_message);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, internal_message)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self
                .status
                .canonical_reason()
                .unwrap_or("Error")
                .to_string(),
            message: self.message,
            details: self.details,
        };
        (self.status, Json(body)).into_response()
    }
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, "request handler panicked");
    ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Unexpected server error").into_response()
}

async fn handle_api_not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "API endpoint not found")
}

async fn handle_static_not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "Static files are not served by this server")
}

// ============ GET /api/health ============

#[derive(Serialize)]
struct HealthResponse {
    /// Always `"ok"` when the server is running.
    status: &'static str,
    timestamp: String,
    version: &'static str,
    store: String,
    enrichment: String,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION"),
        store: state.records.backend_name().to_string(),
        enrichment: state.records.enricher_name().to_string(),
    })
}

// ============ GET /api/stats ============

async fn handle_stats(State(state): State<AppState>) -> Result<Json<StoreStats>, ApiError> {
    let stats = state
        .records
        .stats()
        .await
        .map_err(|e| ApiError::from_record(e, "Failed to compute stats"))?;
    Ok(Json(stats))
}

// ============ POST /api/inspirations ============

async fn handle_create(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<InspirationRecord>), ApiError> {
    let Json(body) = payload.map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e.body_text()))?;

    let check = validate(&body, &state.create_schema);
    if !check.valid {
        return Err(ApiError::from_record(
            RecordError::Validation(check.errors),
            "Failed to create inspiration",
        ));
    }

    let text = body
        .get("transcribedText")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let audio = body.get("audioData").and_then(Value::as_str);

    let record = state
        .records
        .create(text, audio)
        .await
        .map_err(|e| ApiError::from_record(e, "Failed to create inspiration"))?;

    Ok((StatusCode::CREATED, Json(record)))
}

// ============ GET /api/inspirations ============

/// Raw query string values; unparsable numbers fall back to defaults.
#[derive(Debug, Deserialize)]
struct ListParams {
    page: Option<String>,
    limit: Option<String>,
    category: Option<String>,
    search: Option<String>,
}

impl ListParams {
    fn into_query(self) -> ListQuery {
        ListQuery {
            page: parse_or(self.page.as_deref(), 1),
            limit: parse_or(self.limit.as_deref(), DEFAULT_PAGE_SIZE),
            category: self.category,
            search: self.search,
        }
    }
}

fn parse_or(value: Option<&str>, default: usize) -> usize {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

async fn handle_list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListPage>, ApiError> {
    let page = state
        .records
        .list(&params.into_query())
        .await
        .map_err(|e| ApiError::from_record(e, "Failed to fetch inspirations"))?;
    Ok(Json(page))
}

// ============ GET /api/inspirations/{id} ============

async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<InspirationRecord>, ApiError> {
    let record = state
        .records
        .get(&id)
        .await
        .map_err(|e| ApiError::from_record(e, "Failed to fetch inspiration"))?;
    Ok(Json(record))
}

// ============ DELETE /api/inspirations/{id} ============

#[derive(Serialize)]
struct DeleteResponse {
    success: bool,
    message: &'static str,
}

async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    state
        .records
        .delete(&id)
        .await
        .map_err(|e| ApiError::from_record(e, "Failed to delete inspiration"))?;
    Ok(Json(DeleteResponse {
        success: true,
        message: "Inspiration deleted successfully",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or() {
        assert_eq!(parse_or(Some("3"), 1), 3);
        assert_eq!(parse_or(Some(" 7 "), 1), 7);
        assert_eq!(parse_or(Some("abc"), 20), 20);
        assert_eq!(parse_or(Some("-2"), 1), 1);
        assert_eq!(parse_or(None, 20), 20);
    }

    #[test]
    fn test_create_schema() {
        let schema = create_request_schema().unwrap();
        assert!(validate(&serde_json::json!({"transcribedText": "hi"}), &schema).valid);
        assert!(
            validate(
                &serde_json::json!({"transcribedText": "hi", "audioData": "data:audio/webm;base64,aGk="}),
                &schema
            )
            .valid
        );

        let bad = validate(
            &serde_json::json!({"transcribedText": 5, "audioData": "%%%"}),
            &schema,
        );
        assert_eq!(
            bad.errors,
            vec![
                "transcribedText must be of type string",
                "audioData format is invalid"
            ]
        );
    }

    #[test]
    fn test_internal_error_hides_cause() {
        let err = ApiError::from_record(
            RecordError::Internal(anyhow::anyhow!("disk on fire")),
            "Failed to fetch inspiration",
        );
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Failed to fetch inspiration");
    }

    #[test]
    fn test_validation_error_details() {
        let err = ApiError::from_record(
            RecordError::Validation(vec!["a".into(), "b".into()]),
            "unused",
        );
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "a; b");
        assert_eq!(err.details, vec!["a", "b"]);
    }
}
