use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::error::SyncError;
use crate::logic::{DeployExtra, ExtraDescriptor, ExtraRegistry};
use crate::model::{
    BatchContext, ComparisonRow, PreflightReport, Selection, SelectionRow, Snapshot,
    TransferOutcome,
};

pub type AppState = Arc<ExtraRegistry>;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: &str) -> Self {
        Self {
            error: message.to_string(),
        }
    }
}

/// Body of the production-side phases: what staging sent, plus the batch
#[derive(Debug, Deserialize)]
pub struct PhaseRequest<T> {
    pub data: T,
    #[serde(default)]
    pub batch: BatchContext,
}

fn error_response(error: SyncError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &error {
        SyncError::UnknownExtra(_) => StatusCode::NOT_FOUND,
        SyncError::DuplicateExtra(_) | SyncError::Configuration(_) | SyncError::Store(_) => {
            log::error!("Request failed: {:#}", error);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(ErrorResponse::new(&error.to_string())))
}

fn lookup_extra(
    registry: &ExtraRegistry,
    extra_id: &str,
) -> Result<Arc<dyn DeployExtra>, (StatusCode, Json<ErrorResponse>)> {
    registry.get(extra_id).map_err(error_response)
}

fn respond<T>(result: anyhow::Result<T>) -> ApiResult<T> {
    result
        .map(Json)
        .map_err(|e| error_response(SyncError::Store(e)))
}

pub async fn list_extras(State(registry): State<AppState>) -> Json<ListResponse<ExtraDescriptor>> {
    let items = registry.descriptors();
    let total = items.len();
    Json(ListResponse { items, total })
}

pub async fn comparison_send(
    State(registry): State<AppState>,
    Path(extra_id): Path<String>,
    Json(batch): Json<BatchContext>,
) -> ApiResult<Snapshot> {
    let extra = lookup_extra(&registry, &extra_id)?;
    respond(extra.comparison_send(&batch).await)
}

pub async fn comparison_check(
    State(registry): State<AppState>,
    Path(extra_id): Path<String>,
    Json(request): Json<PhaseRequest<Snapshot>>,
) -> ApiResult<Snapshot> {
    let extra = lookup_extra(&registry, &extra_id)?;
    respond(extra.comparison_check(&request.data, &request.batch).await)
}

pub async fn comparison_selection_row(
    State(registry): State<AppState>,
    Path(extra_id): Path<String>,
    Json(row): Json<ComparisonRow>,
) -> ApiResult<Option<SelectionRow>> {
    let extra = lookup_extra(&registry, &extra_id)?;
    Ok(Json(extra.comparison_selection_row(&row)))
}

pub async fn preflight_send(
    State(registry): State<AppState>,
    Path(extra_id): Path<String>,
    Json(batch): Json<BatchContext>,
) -> ApiResult<Option<Selection>> {
    let extra = lookup_extra(&registry, &extra_id)?;
    respond(extra.preflight_send(&batch).await)
}

pub async fn preflight_check(
    State(registry): State<AppState>,
    Path(extra_id): Path<String>,
    Json(request): Json<PhaseRequest<Selection>>,
) -> ApiResult<PreflightReport> {
    let extra = lookup_extra(&registry, &extra_id)?;
    respond(extra.preflight_check(&request.data, &request.batch).await)
}

pub async fn preflight_display(
    State(registry): State<AppState>,
    Path(extra_id): Path<String>,
    Json(messages): Json<Value>,
) -> ApiResult<Value> {
    let extra = lookup_extra(&registry, &extra_id)?;
    Ok(Json(extra.preflight_display(messages)))
}

pub async fn transfer_send(
    State(registry): State<AppState>,
    Path(extra_id): Path<String>,
    Json(batch): Json<BatchContext>,
) -> ApiResult<Option<Selection>> {
    let extra = lookup_extra(&registry, &extra_id)?;
    respond(extra.transfer_send(&batch).await)
}

pub async fn transfer_receive(
    State(registry): State<AppState>,
    Path(extra_id): Path<String>,
    Json(selection): Json<Selection>,
) -> ApiResult<TransferOutcome> {
    let extra = lookup_extra(&registry, &extra_id)?;
    respond(extra.transfer_receive(&selection).await)
}
