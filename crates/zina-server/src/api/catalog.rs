//! Proxy onto the external catalog API.
//!
//! Admin routes manage products and categories; account routes let a shopper
//! sign in, register and keep favorites. The caller's catalog token travels
//! in `X-Catalog-Token`. Reads fall back to the sample catalog when the API
//! is unavailable; writes report the failure.

use axum::{
    extract::{FromRequest, Multipart, Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use zina_catalog::{
    CategoryDraft, ImageUpload, ProductDraft, ProductPage, RemoteSession, RemoteUser,
};
use zina_core::{Category, Product};

use crate::auth::AdminPrincipal;
use crate::middleware::RequestId;

use super::{map_catalog_error, ApiError, ApiResponse, AppState};

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct PageQuery {
    pub page: Option<u32>,
    #[serde(default)]
    pub all: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub(super) struct FavoriteState {
    product_id: i64,
    is_favorite: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct LoggedOut {
    logged_out: bool,
}

fn validation_error(req_id: &str, message: impl Into<String>) -> ApiError {
    ApiError::new(req_id, "validation_error", message)
}

fn not_found(req_id: &str, what: &str, id: i64) -> ApiError {
    ApiError::new(req_id, "not_found", format!("{what} {id} not found"))
}

/// Reads a product draft from either a JSON body or a multipart form with a
/// `product` JSON part and any number of `images[]` file parts.
async fn read_product_payload(
    state: &AppState,
    req_id: &str,
    req: Request,
) -> Result<(ProductDraft, Vec<ImageUpload>), ApiError> {
    let is_multipart = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));

    if !is_multipart {
        let Json(draft) = Json::<ProductDraft>::from_request(req, state)
            .await
            .map_err(|e| validation_error(req_id, e.body_text()))?;
        return Ok((draft, Vec::new()));
    }

    let mut multipart = Multipart::from_request(req, state)
        .await
        .map_err(|e| validation_error(req_id, e.body_text()))?;

    let mut draft: Option<ProductDraft> = None;
    let mut images = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| validation_error(req_id, e.body_text()))?
    {
        let name = field.name().map(ToOwned::to_owned);
        match name.as_deref() {
            Some("product") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| validation_error(req_id, e.body_text()))?;
                let parsed = serde_json::from_str(&text)
                    .map_err(|e| validation_error(req_id, format!("product: {e}")))?;
                draft = Some(parsed);
            }
            Some("images[]" | "images") => {
                let file_name = field.file_name().unwrap_or("image").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| validation_error(req_id, e.body_text()))?;
                images.push(ImageUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            other => tracing::debug!(field = ?other, "ignoring unknown multipart field"),
        }
    }

    let draft = draft.ok_or_else(|| validation_error(req_id, "missing product part"))?;
    Ok((draft, images))
}

// ---------------------------------------------------------------------------
// Admin: products
// ---------------------------------------------------------------------------

pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> Json<ApiResponse<ProductPage>> {
    let client = state.data.catalog_for(&headers);
    let page = if query.all {
        let products = client.fetch_all_products().await;
        ProductPage {
            products,
            meta: zina_catalog::PageMeta::single(),
        }
    } else {
        client.list_products(query.page.unwrap_or(1)).await
    };

    Json(ApiResponse::new(req_id.0, page))
}

pub(super) async fn get_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Product>>, ApiError> {
    let product = state
        .data
        .catalog_for(&headers)
        .get_product(id)
        .await
        .ok_or_else(|| not_found(&req_id.0, "product", id))?;

    Ok(Json(ApiResponse::new(req_id.0, product)))
}

pub(super) async fn create_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(admin): Extension<AdminPrincipal>,
    headers: HeaderMap,
    req: Request,
) -> Result<(StatusCode, Json<ApiResponse<Product>>), ApiError> {
    let (draft, images) = read_product_payload(&state, &req_id.0, req).await?;
    let product = state
        .data
        .catalog_for(&headers)
        .create_product(&draft, &images)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    tracing::info!(product_id = product.id, admin_id = admin.admin_id, "product created");
    Ok((StatusCode::CREATED, Json(ApiResponse::new(req_id.0, product))))
}

pub(super) async fn update_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(admin): Extension<AdminPrincipal>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    req: Request,
) -> Result<Json<ApiResponse<Product>>, ApiError> {
    let (draft, images) = read_product_payload(&state, &req_id.0, req).await?;
    let product = state
        .data
        .catalog_for(&headers)
        .update_product(id, &draft, &images)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    tracing::info!(product_id = id, admin_id = admin.admin_id, "product updated");
    Ok(Json(ApiResponse::new(req_id.0, product)))
}

pub(super) async fn delete_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(admin): Extension<AdminPrincipal>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .data
        .catalog_for(&headers)
        .delete_product(id)
        .await
        .map_err(|e| map_catalog_error(req_id.0, &e))?;

    tracing::info!(product_id = id, admin_id = admin.admin_id, "product deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Admin: categories
// ---------------------------------------------------------------------------

pub(super) async fn list_categories(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
) -> Json<ApiResponse<Vec<Category>>> {
    let categories = state.data.catalog_for(&headers).list_categories().await;
    Json(ApiResponse::new(req_id.0, categories))
}

pub(super) async fn get_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Category>>, ApiError> {
    let category = state
        .data
        .catalog_for(&headers)
        .get_category(id)
        .await
        .ok_or_else(|| not_found(&req_id.0, "category", id))?;

    Ok(Json(ApiResponse::new(req_id.0, category)))
}

pub(super) async fn create_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(admin): Extension<AdminPrincipal>,
    headers: HeaderMap,
    Json(draft): Json<CategoryDraft>,
) -> Result<(StatusCode, Json<ApiResponse<Category>>), ApiError> {
    let category = state
        .data
        .catalog_for(&headers)
        .create_category(&draft)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    tracing::info!(category_id = category.id, admin_id = admin.admin_id, "category created");
    Ok((StatusCode::CREATED, Json(ApiResponse::new(req_id.0, category))))
}

pub(super) async fn update_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(admin): Extension<AdminPrincipal>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(draft): Json<CategoryDraft>,
) -> Result<Json<ApiResponse<Category>>, ApiError> {
    let category = state
        .data
        .catalog_for(&headers)
        .update_category(id, &draft)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    tracing::info!(category_id = id, admin_id = admin.admin_id, "category updated");
    Ok(Json(ApiResponse::new(req_id.0, category)))
}

pub(super) async fn delete_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(admin): Extension<AdminPrincipal>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .data
        .catalog_for(&headers)
        .delete_category(id)
        .await
        .map_err(|e| map_catalog_error(req_id.0, &e))?;

    tracing::info!(category_id = id, admin_id = admin.admin_id, "category deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Shopper accounts and favorites
// ---------------------------------------------------------------------------

pub(super) async fn login(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<ApiResponse<RemoteSession>>, ApiError> {
    // A fresh token slot per login; the shared client never holds a token.
    let client = state.data.catalog_for(&HeaderMap::new());
    let session = client
        .login(body.email.trim(), &body.password)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(req_id.0, session)))
}

pub(super) async fn logout(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<LoggedOut>>, ApiError> {
    state
        .data
        .catalog_for(&headers)
        .logout()
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(req_id.0, LoggedOut { logged_out: true })))
}

/// Registers a shopper account. The confirmation email links back to this
/// site.
pub(super) async fn register(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RemoteUser>>), ApiError> {
    if body.name.trim().is_empty() || body.email.trim().is_empty() || body.password.is_empty() {
        return Err(validation_error(
            &req_id.0,
            "name, email and password are required",
        ));
    }

    let redirect = state.config.email_confirmation_redirect();
    let user = state
        .data
        .catalog_for(&HeaderMap::new())
        .register(body.name.trim(), body.email.trim(), &body.password, &redirect)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    Ok((StatusCode::CREATED, Json(ApiResponse::new(req_id.0, user))))
}

pub(super) async fn current_user(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<RemoteUser>>, ApiError> {
    let user = state
        .data
        .catalog_for(&headers)
        .current_user()
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(req_id.0, user)))
}

pub(super) async fn list_favorites(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<Vec<Product>>>, ApiError> {
    let products = state
        .data
        .catalog_for(&headers)
        .list_favorites()
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(req_id.0, products)))
}

pub(super) async fn is_favorite(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
    Path(product_id): Path<i64>,
) -> Result<Json<ApiResponse<FavoriteState>>, ApiError> {
    let is_favorite = state
        .data
        .catalog_for(&headers)
        .is_favorite(product_id)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(
        req_id.0,
        FavoriteState {
            product_id,
            is_favorite,
        },
    )))
}

pub(super) async fn toggle_favorite(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
    Path(product_id): Path<i64>,
) -> Result<Json<ApiResponse<FavoriteState>>, ApiError> {
    let is_favorite = state
        .data
        .catalog_for(&headers)
        .toggle_favorite(product_id)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(
        req_id.0,
        FavoriteState {
            product_id,
            is_favorite,
        },
    )))
}
