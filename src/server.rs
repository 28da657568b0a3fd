use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::audit::AuditResult;
use crate::config::Config;
use crate::engine::ReportEngine;
use crate::error::ReportError;
use crate::output::json::ReportResponse;
use crate::snapshot::{ReportStore, SnapshotRef};

#[derive(Clone)]
pub struct ApiState {
    config: Config,
    engine: Arc<ReportEngine>,
}

impl ApiState {
    pub fn new(config: Config, engine: ReportEngine) -> Self {
        Self {
            config,
            engine: Arc::new(engine),
        }
    }

    pub fn from_config(config: Config) -> Self {
        let engine = ReportEngine::new(
            ReportStore::new(config.resolved_reports_dir()),
            config.tracked_metrics(),
        );
        Self::new(config, engine)
    }
}

#[derive(Debug, Serialize)]
struct ApiResponse<T: Serialize> {
    ok: bool,
    data: T,
}

#[derive(Debug, Serialize)]
struct ApiErrorBody {
    ok: bool,
    error: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl From<ReportError> for ApiError {
    fn from(error: ReportError) -> Self {
        let status = match error {
            ReportError::InvalidTimestamp(_) | ReportError::AuditRunner(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            warn!(status = %self.status, error = %self.message, "request failed");
        }
        let body = Json(ApiErrorBody {
            ok: false,
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct SnapshotListResponse {
    snapshots: Vec<SnapshotRef>,
}

#[derive(Debug, Serialize)]
struct StoredReportResponse {
    key: String,
    report: AuditResult,
}

pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/v1/reports", post(ingest_report).get(list_reports))
        .route("/v1/reports/latest", get(latest_report))
        .route("/v1/reports/:key", get(report_by_key))
        .route("/v1/config", get(show_config))
        .layer(cors)
        .with_state(state)
}

pub async fn run_server(config: Config, bind: SocketAddr) -> Result<()> {
    let state = ApiState::from_config(config);
    state.engine.store().ensure_ready()?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("REST API listening on http://{bind}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<ApiResponse<HealthResponse>> {
    ok(HealthResponse { status: "ok" })
}

async fn show_config(State(state): State<ApiState>) -> Json<ApiResponse<Config>> {
    ok(state.config)
}

async fn ingest_report(
    State(state): State<ApiState>,
    body: String,
) -> ApiResult<ReportResponse> {
    let audit = AuditResult::from_json(&body)?;
    let outcome = state.engine.run(audit)?;
    Ok(ok(ReportResponse::from(outcome)))
}

async fn list_reports(State(state): State<ApiState>) -> ApiResult<SnapshotListResponse> {
    let snapshots = state.engine.store().list_all()?;
    Ok(ok(SnapshotListResponse { snapshots }))
}

async fn latest_report(State(state): State<ApiState>) -> ApiResult<StoredReportResponse> {
    let Some((newest, report)) = state.engine.store().latest()? else {
        return Err(ApiError::not_found("no reports stored yet"));
    };
    Ok(ok(StoredReportResponse {
        key: newest.key,
        report,
    }))
}

async fn report_by_key(
    State(state): State<ApiState>,
    Path(key): Path<String>,
) -> ApiResult<StoredReportResponse> {
    if key.contains(|c: char| c == '/' || c == '\\') || key.starts_with('.') {
        return Err(ApiError::not_found(format!("unknown report: {key}")));
    }
    let Some(report) = state.engine.store().load_key(&key)? else {
        return Err(ApiError::not_found(format!("unknown report: {key}")));
    };
    Ok(ok(StoredReportResponse { key, report }))
}

fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse { ok: true, data })
}
