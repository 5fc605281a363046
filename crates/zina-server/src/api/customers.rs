use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use zina_db::{CustomerSummaryRow, DashboardStatsRow};

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct CustomerQuery {
    pub limit: Option<i64>,
}

pub(super) async fn list_customers(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<CustomerQuery>,
) -> Result<Json<ApiResponse<Vec<CustomerSummaryRow>>>, ApiError> {
    let customers = state
        .data
        .customers(normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(req_id.0, customers)))
}

pub(super) async fn dashboard_stats(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<DashboardStatsRow>>, ApiError> {
    let stats = state
        .data
        .stats()
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(req_id.0, stats)))
}
