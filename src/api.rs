use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};
use utoipa::{IntoParams, OpenApi, ToSchema};

use crate::analysis::{ColumnStatistics, PeakRate, RateSample};
use crate::analysis_error::AnalysisError;
use crate::series::{ChartData, Record, SeriesColumn};
use crate::services::{AnalysisReport, AnalysisService};

#[derive(Clone)]
pub struct AppState {
    pub analysis_service: AnalysisService,
    pub max_upload_bytes: usize,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine readable error kind, e.g. `malformed_numeric_cell`
    pub error: String,
    pub message: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AnalysisParams {
    /// Number of rows to include in the preview
    pub preview_rows: Option<usize>,
}

#[derive(OpenApi)]
#[openapi(
    paths(health, analyze_upload),
    components(schemas(
        HealthResponse,
        ErrorResponse,
        AnalysisReport,
        ChartData,
        SeriesColumn,
        PeakRate,
        RateSample,
        ColumnStatistics,
        Record
    )),
    tags((name = "analysis", description = "Ground displacement and rainfall CSV analysis"))
)]
pub struct ApiDoc;

pub fn generate_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

pub fn create_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;
    let api_routes = Router::new()
        .route("/health", get(health))
        .route("/analysis", post(analyze_upload))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state);

    Router::new().nest("/api/v1", api_routes)
}

/// HTTP status for an input error
pub fn error_status(err: &AnalysisError) -> StatusCode {
    match err {
        AnalysisError::EmptyFile => StatusCode::BAD_REQUEST,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn error_response(err: &AnalysisError) -> (StatusCode, Json<ErrorResponse>) {
    (
        error_status(err),
        Json(ErrorResponse {
            error: err.kind().to_string(),
            message: err.to_string(),
        }),
    )
}

#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "analysis",
    responses((status = 200, description = "Service is healthy", body = HealthResponse))
)]
#[instrument(skip(_state))]
async fn health(State(_state): State<AppState>) -> impl IntoResponse {
    debug!("Health check requested");
    let response = HealthResponse {
        status: "healthy".to_string(),
    };
    (StatusCode::OK, Json(response))
}

#[utoipa::path(
    post,
    path = "/api/v1/analysis",
    tag = "analysis",
    params(AnalysisParams),
    request_body(
        content = String,
        content_type = "text/csv",
        description = "CSV with a 'fecha' column, optional 'rainfall(mm)' column and one column per control point"
    ),
    responses(
        (status = 200, description = "Analysis of the uploaded series", body = AnalysisReport),
        (status = 400, description = "Empty upload", body = ErrorResponse),
        (status = 422, description = "Malformed upload", body = ErrorResponse)
    )
)]
#[instrument(skip(state, body), fields(body_size = body.len()))]
async fn analyze_upload(
    State(state): State<AppState>,
    Query(params): Query<AnalysisParams>,
    body: Bytes,
) -> Result<Json<AnalysisReport>, (StatusCode, Json<ErrorResponse>)> {
    let preview_rows = params
        .preview_rows
        .unwrap_or_else(|| state.analysis_service.preview_rows());
    debug!("Analyzing upload with preview of {} rows", preview_rows);

    // Parsing is CPU bound; keep it off the async workers
    let service = state.analysis_service.clone();
    let result = tokio::task::spawn_blocking(move || {
        service.analyze_with_preview(&body, preview_rows)
    })
    .await
    .map_err(|e| {
        error!("Analysis task failed: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "internal".to_string(),
                message: "Analysis task failed".to_string(),
            }),
        )
    })?;

    let report = result.map_err(|e| {
        error!("Rejected upload: {}", e);
        error_response(&e)
    })?;

    info!(
        "Returning analysis of {} rows ({} series)",
        report.row_count,
        report.series_ids.len()
    );

    Ok(Json(report))
}
