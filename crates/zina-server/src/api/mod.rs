mod admin_orders;
mod catalog;
mod customers;
mod orders;
mod storefront;

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, services::ServeDir, trace::TraceLayer,
};
use zina_catalog::CatalogError;
use zina_core::{AppConfig, PricingPolicy};

use crate::auth::{require_admin, AuthState};
use crate::checkout::{LocalReceiptStore, PgOrderStore};
use crate::data::{DataAccess, CATALOG_TOKEN_HEADER};
use crate::middleware::{request_id, RequestId, REQUEST_ID_HEADER};

/// Body limit for routes that accept file uploads.
const UPLOAD_BODY_LIMIT: usize = 16 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub data: DataAccess,
    pub config: Arc<AppConfig>,
    pub policy: Arc<PricingPolicy>,
    pub orders: PgOrderStore,
    pub receipts: LocalReceiptStore,
}

impl AppState {
    #[must_use]
    pub fn new(data: DataAccess, config: Arc<AppConfig>) -> Self {
        let policy = Arc::new(config.pricing_policy());
        let orders = PgOrderStore::new(data.pool().clone());
        let receipts = LocalReceiptStore::new(Arc::clone(&config));
        Self {
            data,
            config,
            policy,
            orders,
            receipts,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
    catalog_api: &'static str,
}

impl ResponseMeta {
    pub(crate) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(crate) fn new(request_id: String, data: T) -> Self {
        Self {
            data,
            meta: ResponseMeta::new(request_id),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "forbidden" => StatusCode::FORBIDDEN,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "upstream_unavailable" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(crate) fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(50).clamp(1, 200)
}

pub(crate) fn normalize_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

pub(crate) fn map_db_error(request_id: String, error: &zina_db::DbError) -> ApiError {
    if matches!(error, zina_db::DbError::NotFound) {
        return ApiError::new(request_id, "not_found", "record not found");
    }
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

/// Maps a catalog API failure onto the response envelope. Remote statuses
/// that mean something to the caller pass through; everything else is a 502.
pub(crate) fn map_catalog_error(request_id: String, error: &CatalogError) -> ApiError {
    match error {
        CatalogError::Validation { .. } => {
            ApiError::new(request_id, "validation_error", error.to_string())
        }
        CatalogError::Status { status, message } => {
            let code = match status {
                400 | 422 => "validation_error",
                401 => "unauthorized",
                403 => "forbidden",
                404 => "not_found",
                409 => "conflict",
                _ => {
                    tracing::warn!(status, message = %message, "catalog API request failed");
                    "upstream_unavailable"
                }
            };
            ApiError::new(request_id, code, message.clone())
        }
        CatalogError::NotConfigured => ApiError::new(
            request_id,
            "upstream_unavailable",
            "catalog API is not configured",
        ),
        _ if error.is_transport() => {
            tracing::warn!(error = %error, "catalog API unreachable");
            ApiError::new(request_id, "upstream_unavailable", "catalog API unreachable")
        }
        _ => {
            tracing::error!(error = %error, "catalog API response unusable");
            ApiError::new(
                request_id,
                "upstream_unavailable",
                "catalog API returned an unreadable response",
            )
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(REQUEST_ID_HEADER),
            HeaderName::from_static(CATALOG_TOKEN_HEADER),
        ])
}

fn public_router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/categories", get(storefront::list_categories))
        .route("/api/v1/categories/{slug}", get(storefront::get_category))
        .route("/api/v1/products", get(storefront::list_products))
        .route("/api/v1/products/{slug}", get(storefront::get_product))
        .route("/api/v1/cart/quote", post(storefront::quote_cart))
        .route("/api/v1/orders", post(orders::create_order))
        .route(
            "/api/v1/orders/with-receipt",
            post(orders::create_order_with_receipt).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/api/v1/orders/{order_number}", get(orders::get_order_confirmation))
        .route("/api/v1/catalog/auth/login", post(catalog::login))
        .route("/api/v1/catalog/auth/logout", post(catalog::logout))
        .route("/api/v1/catalog/auth/register", post(catalog::register))
        .route("/api/v1/catalog/auth/me", get(catalog::current_user))
        .route("/api/v1/catalog/favorites", get(catalog::list_favorites))
        .route(
            "/api/v1/catalog/favorites/{product_id}",
            get(catalog::is_favorite).post(catalog::toggle_favorite),
        )
}

fn admin_router(auth: AuthState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/admin/orders", get(admin_orders::list_orders))
        .route("/api/v1/admin/orders/{id}", get(admin_orders::get_order))
        .route(
            "/api/v1/admin/orders/{id}/status",
            patch(admin_orders::update_order_status),
        )
        .route(
            "/api/v1/admin/orders/{id}/invoice",
            get(admin_orders::download_invoice),
        )
        .route("/api/v1/admin/customers", get(customers::list_customers))
        .route("/api/v1/admin/stats", get(customers::dashboard_stats))
        .route(
            "/api/v1/admin/catalog/products",
            get(catalog::list_products).post(catalog::create_product),
        )
        .route(
            "/api/v1/admin/catalog/products/{id}",
            get(catalog::get_product)
                .put(catalog::update_product)
                .delete(catalog::delete_product),
        )
        .route(
            "/api/v1/admin/catalog/categories",
            get(catalog::list_categories).post(catalog::create_category),
        )
        .route(
            "/api/v1/admin/catalog/categories/{id}",
            get(catalog::get_category)
                .put(catalog::update_category)
                .delete(catalog::delete_category),
        )
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
        .route_layer(axum::middleware::from_fn_with_state(auth, require_admin))
}

pub fn build_app(state: AppState, auth: AuthState) -> Router {
    let receipts = ServeDir::new(state.receipts.dir());

    Router::new()
        .merge(public_router())
        .merge(admin_router(auth))
        .nest_service("/receipts", receipts)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(request_id))
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(build_cors()),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);
    let catalog_api = if state.config.catalog_api_url.is_some() {
        "configured"
    } else {
        "sample_data"
    };

    match zina_db::health_check(state.data.pool()).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                    catalog_api,
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                        catalog_api,
                    },
                    meta,
                }),
            )
        }
    }
}

#[cfg(test)]
#[path = "../api_test.rs"]
mod tests;
