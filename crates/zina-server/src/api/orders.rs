//! Storefront checkout endpoints.
//!
//! These keep the flat `{success, ...}` body the checkout page expects
//! instead of the `{data, meta}` envelope.

use axum::{
    extract::{
        multipart::MultipartRejection, rejection::JsonRejection, Multipart, Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use zina_db::OrderItemRow;

use crate::checkout::{place_order, CheckoutError, CheckoutRequest, ReceiptUpload};
use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutSuccess {
    success: bool,
    order_id: i64,
    order_number: String,
    total: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutFailure {
    success: bool,
    error: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'static str>,
    request_id: String,
}

/// Public view of a placed order, without customer contact details.
#[derive(Debug, Serialize)]
pub(super) struct OrderConfirmation {
    order_number: String,
    status: String,
    status_label: String,
    payment_method: String,
    subtotal: Decimal,
    tax_amount: Decimal,
    discount_amount: Decimal,
    shipping_amount: Decimal,
    total: Decimal,
    created_at: DateTime<Utc>,
    items: Vec<OrderItemRow>,
}

fn failure(request_id: String, err: &CheckoutError) -> Response {
    let status = match err {
        CheckoutError::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
        CheckoutError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
        CheckoutError::PersistenceFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(CheckoutFailure {
            success: false,
            error: err.public_message(),
            code: err.code(),
            field: err.field(),
            request_id,
        }),
    )
        .into_response()
}

fn malformed(request_id: String, field: &'static str, message: String) -> Response {
    tracing::debug!(field, message = %message, "malformed checkout request");
    failure(
        request_id,
        &CheckoutError::ValidationFailed {
            field,
            message: "بيانات الطلب غير صالحة".to_string(),
        },
    )
}

async fn run_checkout(
    state: &AppState,
    request_id: String,
    request: CheckoutRequest,
    receipt: Option<ReceiptUpload>,
) -> Response {
    match place_order(&state.orders, &state.receipts, &state.policy, request, receipt).await {
        Ok(placed) => (
            StatusCode::CREATED,
            Json(CheckoutSuccess {
                success: true,
                order_id: placed.order_id,
                order_number: placed.order_number,
                total: placed.quote.total,
            }),
        )
            .into_response(),
        Err(err) => {
            if matches!(err, CheckoutError::ValidationFailed { .. }) {
                tracing::info!(field = ?err.field(), error = %err, "checkout rejected");
            }
            failure(request_id, &err)
        }
    }
}

pub(super) async fn create_order(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(request)) => run_checkout(&state, req_id.0, request, None).await,
        Err(rejection) => malformed(req_id.0, "body", rejection.body_text()),
    }
}

/// Multipart checkout: an `order` part holding the JSON payload and an
/// optional `receipt` file part.
pub(super) async fn create_order_with_receipt(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let mut multipart = match multipart {
        Ok(m) => m,
        Err(rejection) => return malformed(req_id.0, "body", rejection.body_text()),
    };

    let mut request: Option<CheckoutRequest> = None;
    let mut receipt: Option<ReceiptUpload> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return malformed(req_id.0, "body", e.body_text()),
        };
        let name = field.name().map(ToOwned::to_owned);
        match name.as_deref() {
            Some("order") => {
                let text = match field.text().await {
                    Ok(text) => text,
                    Err(e) => return malformed(req_id.0, "order", e.body_text()),
                };
                match serde_json::from_str::<CheckoutRequest>(&text) {
                    Ok(parsed) => request = Some(parsed),
                    Err(e) => return malformed(req_id.0, "order", e.to_string()),
                }
            }
            Some("receipt") => {
                let file_name = field.file_name().map(ToOwned::to_owned);
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = match field.bytes().await {
                    Ok(bytes) => bytes.to_vec(),
                    Err(e) => return malformed(req_id.0, "paymentReceipt", e.body_text()),
                };
                receipt = Some(ReceiptUpload {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            other => {
                tracing::debug!(field = ?other, "ignoring unknown multipart field");
            }
        }
    }

    let Some(request) = request else {
        return malformed(req_id.0, "order", "missing order part".to_string());
    };
    run_checkout(&state, req_id.0, request, receipt).await
}

pub(super) async fn get_order_confirmation(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(order_number): Path<String>,
) -> Result<Json<ApiResponse<OrderConfirmation>>, ApiError> {
    let detail = state
        .data
        .order_by_number(&order_number)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "order not found"))?;

    let order = detail.order;
    let status_label = order
        .status()
        .map_or_else(|_| order.status_raw.clone(), |s| s.label_ar().to_string());

    Ok(Json(ApiResponse::new(
        req_id.0,
        OrderConfirmation {
            order_number: order.order_number,
            status: order.status_raw,
            status_label,
            payment_method: order.payment_method_raw,
            subtotal: order.subtotal,
            tax_amount: order.tax_amount,
            discount_amount: order.discount_amount,
            shipping_amount: order.shipping_amount,
            total: order.total,
            created_at: order.created_at,
            items: detail.items,
        },
    )))
}
