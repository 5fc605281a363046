//! Back-office order management: list, detail, status changes, invoices.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;
use zina_core::OrderStatus;
use zina_db::{OrderListFilters, OrderRow};

use crate::auth::AdminPrincipal;
use crate::data::OrderDetail;
use crate::invoice::{invoice_file_name, render_invoice};
use crate::middleware::RequestId;

use super::{
    map_db_error, normalize_limit, normalize_offset, ApiError, ApiResponse, AppState,
};

#[derive(Debug, Deserialize)]
pub(super) struct OrderQuery {
    pub status: Option<String>,
    pub email: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct StatusUpdateRequest {
    pub status: String,
}

fn parse_status(req_id: &str, raw: &str) -> Result<OrderStatus, ApiError> {
    raw.parse::<OrderStatus>().map_err(|_| {
        let allowed: Vec<&str> = OrderStatus::ALL.iter().map(|s| s.as_str()).collect();
        ApiError::new(
            req_id,
            "validation_error",
            format!(
                "status must be one of {}, got '{raw}'",
                allowed.join(", ")
            ),
        )
    })
}

/// Reads the requested status from a status-update body, reporting a
/// malformed body in the error envelope.
fn requested_status(
    req_id: &str,
    payload: Result<Json<StatusUpdateRequest>, JsonRejection>,
) -> Result<OrderStatus, ApiError> {
    match payload {
        Ok(Json(body)) => parse_status(req_id, body.status.trim()),
        Err(rejection) => Err(ApiError::new(
            req_id,
            "validation_error",
            format!("invalid status body: {}", rejection.body_text()),
        )),
    }
}

async fn load_order(state: &AppState, req_id: &str, id: i64) -> Result<OrderDetail, ApiError> {
    state
        .data
        .order(id)
        .await
        .map_err(|e| map_db_error(req_id.to_string(), &e))?
        .ok_or_else(|| ApiError::new(req_id, "not_found", format!("order {id} not found")))
}

pub(super) async fn list_orders(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<OrderQuery>,
) -> Result<Json<ApiResponse<Vec<OrderRow>>>, ApiError> {
    let status = query
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(|s| parse_status(&req_id.0, s))
        .transpose()?;

    let orders = state
        .data
        .orders(OrderListFilters {
            status,
            customer_email: query.email.as_deref(),
            limit: Some(normalize_limit(query.limit)),
            offset: Some(normalize_offset(query.offset)),
        })
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(req_id.0, orders)))
}

pub(super) async fn get_order(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<OrderDetail>>, ApiError> {
    let detail = load_order(&state, &req_id.0, id).await?;
    Ok(Json(ApiResponse::new(req_id.0, detail)))
}

/// Moves an order to any status. Only `status` and `updated_at` change.
pub(super) async fn update_order_status(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(admin): Extension<AdminPrincipal>,
    Path(id): Path<i64>,
    payload: Result<Json<StatusUpdateRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<OrderRow>>, ApiError> {
    let status = requested_status(&req_id.0, payload)?;

    let order = state
        .data
        .set_order_status(id, status)
        .await
        .map_err(|e| match e {
            zina_db::DbError::NotFound => {
                ApiError::new(req_id.0.clone(), "not_found", format!("order {id} not found"))
            }
            other => map_db_error(req_id.0.clone(), &other),
        })?;

    tracing::info!(
        order_id = id,
        status = %status,
        admin_id = admin.admin_id,
        admin = %admin.full_name,
        "order status updated"
    );

    Ok(Json(ApiResponse::new(req_id.0, order)))
}

/// Returns the printable invoice as an HTML attachment.
pub(super) async fn download_invoice(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let detail = load_order(&state, &req_id.0, id).await?;
    let html = render_invoice(&detail.order, &detail.items);
    let disposition = format!(
        "attachment; filename=\"{}\"",
        invoice_file_name(&detail.order.order_number)
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        html,
    )
        .into_response())
}
