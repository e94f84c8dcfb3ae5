use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use contracts::dashboards::d402_inventory_overview::{
    InventoryOverviewResponse, MovementRow, MovementsQuery, RefreshResponse, RefreshStatus,
    RejectedRowDto,
};
use std::sync::Arc;

use crate::dashboards::d402_inventory_overview::service::{
    filter_movements, InventoryOverviewService, RefreshOutcome,
};

/// GET /api/d402/inventory-overview
pub async fn get_overview(
    State(service): State<Arc<InventoryOverviewService>>,
) -> Result<Json<InventoryOverviewResponse>, StatusCode> {
    match service.state().snapshot() {
        Some(snapshot) => Ok(Json(snapshot)),
        None => Err(StatusCode::SERVICE_UNAVAILABLE),
    }
}

/// GET /api/d402/inventory-overview/movements?category=N
pub async fn list_movements(
    State(service): State<Arc<InventoryOverviewService>>,
    Query(query): Query<MovementsQuery>,
) -> Result<Json<Vec<MovementRow>>, StatusCode> {
    match service.state().snapshot() {
        Some(snapshot) => Ok(Json(filter_movements(&snapshot.movements, query.category))),
        None => Err(StatusCode::SERVICE_UNAVAILABLE),
    }
}

/// GET /api/d402/inventory-overview/rejected
pub async fn list_rejected(
    State(service): State<Arc<InventoryOverviewService>>,
) -> Json<Vec<RejectedRowDto>> {
    Json(service.state().rejected_rows())
}

/// POST /api/d402/inventory-overview/refresh
pub async fn refresh(State(service): State<Arc<InventoryOverviewService>>) -> Json<RefreshResponse> {
    let response = match service.refresh().await {
        RefreshOutcome::Completed { generated_at } => RefreshResponse {
            status: RefreshStatus::Completed,
            message: None,
            generated_at: Some(generated_at),
        },
        RefreshOutcome::Skipped => RefreshResponse {
            status: RefreshStatus::Skipped,
            message: Some("refresh already in progress".to_string()),
            generated_at: None,
        },
        RefreshOutcome::Failed { message } => RefreshResponse {
            status: RefreshStatus::Failed,
            message: Some(message),
            generated_at: None,
        },
    };
    Json(response)
}
