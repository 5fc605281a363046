//! Public catalog reads and cart pricing.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use zina_core::{Cart, CartLine, Category, Product, Quote};

use crate::checkout::CheckoutItem;
use crate::middleware::RequestId;

use super::{
    map_db_error, normalize_limit, normalize_offset, ApiError, ApiResponse, AppState,
};

#[derive(Debug, Deserialize)]
pub(super) struct ProductQuery {
    pub category: Option<String>,
    pub featured: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct QuoteRequest {
    #[serde(default)]
    pub items: Vec<CheckoutItem>,
    #[serde(default)]
    pub discount_code: Option<String>,
}

pub(super) async fn list_categories(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<Category>>>, ApiError> {
    let categories = state
        .data
        .categories()
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(req_id.0, categories)))
}

pub(super) async fn get_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<Category>>, ApiError> {
    let category = state
        .data
        .category_by_slug(&slug)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| {
            ApiError::new(
                req_id.0.clone(),
                "not_found",
                format!("category {slug} not found"),
            )
        })?;

    Ok(Json(ApiResponse::new(req_id.0, category)))
}

pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ApiResponse<Vec<Product>>>, ApiError> {
    let products = state
        .data
        .products(zina_db::ProductListFilters {
            category_slug: query.category.as_deref(),
            featured: query.featured,
            limit: Some(normalize_limit(query.limit)),
            offset: Some(normalize_offset(query.offset)),
        })
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(req_id.0, products)))
}

pub(super) async fn get_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<Product>>, ApiError> {
    let product = state
        .data
        .product_by_slug(&slug)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| {
            ApiError::new(
                req_id.0.clone(),
                "not_found",
                format!("product {slug} not found"),
            )
        })?;

    Ok(Json(ApiResponse::new(req_id.0, product)))
}

/// Prices a cart without placing an order. An unknown discount code is
/// reported in `discount_status` rather than rejected.
pub(super) async fn quote_cart(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<QuoteRequest>,
) -> Result<Json<ApiResponse<Quote>>, ApiError> {
    let mut cart = Cart::new();
    for item in body.items {
        if item.price.is_sign_negative() && !item.price.is_zero() {
            return Err(ApiError::new(
                req_id.0,
                "validation_error",
                format!("price for product {} must not be negative", item.id),
            ));
        }
        let line = CartLine::new(item.id, item.name, item.price).with_quantity(item.quantity);
        if !cart.add(line) {
            return Err(ApiError::new(
                req_id.0,
                "validation_error",
                format!("quantity for product {} must be at least 1", item.id),
            ));
        }
    }

    let quote = state
        .policy
        .quote(&cart.price_lines(), body.discount_code.as_deref());

    Ok(Json(ApiResponse::new(req_id.0, quote)))
}
