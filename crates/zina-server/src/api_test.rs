use super::*;
use axum::body::{to_bytes, Body};
use axum::http::Request;
use rust_decimal::Decimal;
use tower::ServiceExt;
use zina_catalog::CatalogClient;

use crate::test_support::{lazy_pool, session_token, test_config};

fn offline_catalog() -> CatalogClient {
    CatalogClient::new(None, 5, "zina-test").expect("offline catalog client")
}

fn app_with_pool(pool: sqlx::PgPool) -> Router {
    let config = Arc::new(test_config());
    let auth = AuthState::from_app_config(&config, pool.clone());
    let state = AppState::new(DataAccess::new(pool, offline_catalog()), config);
    build_app(state, auth)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&body).expect("json parse")
}

fn json_request(method: Method, uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn decimal_at(value: &serde_json::Value) -> Decimal {
    match value {
        serde_json::Value::String(s) => s.parse().expect("decimal string"),
        other => other.to_string().parse().expect("decimal number"),
    }
}

fn checkout_body() -> serde_json::Value {
    serde_json::json!({
        "items": [{ "id": 7, "name": "سوار فضي", "quantity": 2, "price": "50.00" }],
        "customerName": "ليلى",
        "customerPhone": "+201000000000",
        "deliveryAddress": "القاهرة، مصر الجديدة",
        "paymentMethod": "cash",
        "discountCode": "SAVE18"
    })
}

#[test]
fn normalize_limit_applies_defaults_and_bounds() {
    assert_eq!(normalize_limit(None), 50);
    assert_eq!(normalize_limit(Some(0)), 1);
    assert_eq!(normalize_limit(Some(1_000)), 200);
    assert_eq!(normalize_limit(Some(25)), 25);
}

#[test]
fn normalize_offset_never_goes_negative() {
    assert_eq!(normalize_offset(None), 0);
    assert_eq!(normalize_offset(Some(-5)), 0);
    assert_eq!(normalize_offset(Some(40)), 40);
}

#[test]
fn api_error_codes_map_to_statuses() {
    let cases = [
        ("validation_error", StatusCode::BAD_REQUEST),
        ("unauthorized", StatusCode::UNAUTHORIZED),
        ("forbidden", StatusCode::FORBIDDEN),
        ("not_found", StatusCode::NOT_FOUND),
        ("conflict", StatusCode::CONFLICT),
        ("upstream_unavailable", StatusCode::BAD_GATEWAY),
        ("internal_error", StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (code, expected) in cases {
        let response = ApiError::new("req-1", code, "message").into_response();
        assert_eq!(response.status(), expected, "code {code}");
    }
}

#[test]
fn catalog_errors_keep_meaningful_remote_statuses() {
    let status = |error: CatalogError| map_catalog_error("req".to_string(), &error).error.code;

    assert_eq!(
        status(CatalogError::Status {
            status: 422,
            message: "name is required".to_string()
        }),
        "validation_error"
    );
    assert_eq!(
        status(CatalogError::Status {
            status: 401,
            message: "expired".to_string()
        }),
        "unauthorized"
    );
    assert_eq!(
        status(CatalogError::Status {
            status: 404,
            message: "gone".to_string()
        }),
        "not_found"
    );
    assert_eq!(
        status(CatalogError::Status {
            status: 503,
            message: "maintenance".to_string()
        }),
        "upstream_unavailable"
    );
    assert_eq!(status(CatalogError::NotConfigured), "upstream_unavailable");
    assert_eq!(
        status(CatalogError::Validation {
            field: "name".to_string(),
            message: "required".to_string()
        }),
        "validation_error"
    );
}

#[test]
fn unreadable_catalog_bodies_are_reported_apart_from_outages() {
    let source = serde_json::from_str::<i64>("not json").expect_err("invalid json");
    let error = map_catalog_error(
        "req".to_string(),
        &CatalogError::Deserialize {
            context: "products".to_string(),
            source,
        },
    );
    assert_eq!(error.error.code, "upstream_unavailable");
    assert_eq!(
        error.error.message,
        "catalog API returned an unreadable response"
    );
}

#[tokio::test]
async fn responses_are_gzipped_when_the_client_accepts_it() {
    let app = app_with_pool(lazy_pool());
    let body = serde_json::json!({
        "items": [{ "id": 1, "name": "قلادة", "quantity": 2, "price": "50.00" }]
    });
    let mut request = json_request(Method::POST, "/api/v1/cart/quote", &body);
    request
        .headers_mut()
        .insert(header::ACCEPT_ENCODING, "gzip".parse().expect("header value"));

    let response = app.oneshot(request).await.expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok()),
        Some("gzip")
    );
}

#[tokio::test]
async fn admin_routes_require_a_bearer_token() {
    let app = app_with_pool(lazy_pool());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/admin/orders")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "unauthorized");
}

#[tokio::test]
async fn admin_routes_reject_tokens_signed_with_another_secret() {
    let claims = serde_json::json!({
        "sub": uuid::Uuid::new_v4().to_string(),
        "exp": Utc::now().timestamp() + 3600,
        "aud": "authenticated",
    });
    let forged = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(b"someone-else"),
    )
    .expect("encode");

    let app = app_with_pool(lazy_pool());
    let response = app
        .oneshot(
            Request::builder()
                .method(Method::PATCH)
                .uri("/api/v1/admin/orders/1/status")
                .header(header::AUTHORIZATION, format!("Bearer {forged}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"status":"shipping"}"#))
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_paths_are_not_found_rather_than_unauthorized() {
    let app = app_with_pool(lazy_pool());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/nowhere")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn quote_applies_tax_then_discount() {
    let app = app_with_pool(lazy_pool());
    let body = serde_json::json!({
        "items": [{ "id": 1, "name": "قلادة", "quantity": 2, "price": "50.00" }],
        "discountCode": "SAVE18"
    });
    let response = app
        .oneshot(json_request(Method::POST, "/api/v1/cart/quote", &body))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(decimal_at(&data["subtotal"]), Decimal::new(100, 0));
    assert_eq!(decimal_at(&data["tax"]), Decimal::new(14, 0));
    assert_eq!(decimal_at(&data["discount"]), Decimal::new(18, 0));
    assert_eq!(decimal_at(&data["total"]), Decimal::new(96, 0));
    assert_eq!(data["discount_status"]["state"], "applied");
}

#[tokio::test]
async fn quote_reports_unknown_codes_without_failing() {
    let app = app_with_pool(lazy_pool());
    let body = serde_json::json!({
        "items": [{ "id": 1, "name": "قلادة", "quantity": 1, "price": "50.00" }],
        "discountCode": "NOPE"
    });
    let response = app
        .oneshot(json_request(Method::POST, "/api/v1/cart/quote", &body))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["discount_status"]["state"], "invalid");
    assert_eq!(decimal_at(&json["data"]["discount"]), Decimal::ZERO);
}

#[tokio::test]
async fn quote_rejects_zero_quantity() {
    let app = app_with_pool(lazy_pool());
    let body = serde_json::json!({
        "items": [{ "id": 1, "name": "قلادة", "quantity": 0, "price": "50.00" }]
    });
    let response = app
        .oneshot(json_request(Method::POST, "/api/v1/cart/quote", &body))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn checkout_reports_the_first_missing_field() {
    let mut body = checkout_body();
    body["customerName"] = serde_json::json!("   ");

    let app = app_with_pool(lazy_pool());
    let response = app
        .oneshot(json_request(Method::POST, "/api/v1/orders", &body))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "validation_error");
    assert_eq!(json["field"], "customerName");
    assert!(json["requestId"].is_string());
}

#[tokio::test]
async fn checkout_rejects_malformed_json() {
    let app = app_with_pool(lazy_pool());
    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/v1/orders")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{ not json"))
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["field"], "body");
}

#[tokio::test]
async fn health_reports_degraded_when_database_is_unreachable() {
    let app = app_with_pool(lazy_pool());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .header(REQUEST_ID_HEADER, "req-health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok()),
        Some("req-health")
    );
    let json = body_json(response).await;
    assert_eq!(json["data"]["database"], "unavailable");
    assert_eq!(json["data"]["catalog_api"], "sample_data");
    assert_eq!(json["meta"]["request_id"], "req-health");
}

#[tokio::test]
async fn favorites_need_a_configured_catalog_api() {
    let app = app_with_pool(lazy_pool());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/catalog/favorites/3")
                .header(CATALOG_TOKEN_HEADER, "token")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

// -------------------------------------------------------------------------
// Live database
// -------------------------------------------------------------------------

async fn place_checkout(app: Router) -> serde_json::Value {
    let response = app
        .oneshot(json_request(Method::POST, "/api/v1/orders", &checkout_body()))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

fn status_patch(order_id: i64, token: &str, status: &str) -> Request<Body> {
    Request::builder()
        .method(Method::PATCH)
        .uri(format!("/api/v1/admin/orders/{order_id}/status"))
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::json!({ "status": status }).to_string()))
        .expect("request")
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a live Postgres via DATABASE_URL"]
async fn checkout_persists_order_and_items(pool: sqlx::PgPool) {
    let placed = place_checkout(app_with_pool(pool.clone())).await;
    assert_eq!(placed["success"], true);
    assert_eq!(decimal_at(&placed["total"]), Decimal::new(96, 0));

    let order_id = placed["orderId"].as_i64().expect("order id");
    let order = zina_db::get_order(&pool, order_id)
        .await
        .expect("get order")
        .expect("order exists");
    assert_eq!(order.status_raw, "new");
    assert_eq!(order.discount_code.as_deref(), Some("SAVE18"));
    assert_eq!(placed["orderNumber"], order.order_number.as_str());

    let items = zina_db::list_order_items(&pool, order_id)
        .await
        .expect("items");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 2);
    assert_eq!(items[0].line_total, Decimal::new(100, 0));
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a live Postgres via DATABASE_URL"]
async fn non_admin_cannot_change_order_status(pool: sqlx::PgPool) {
    let placed = place_checkout(app_with_pool(pool.clone())).await;
    let order_id = placed["orderId"].as_i64().expect("order id");

    let token = session_token(uuid::Uuid::new_v4());
    let response = app_with_pool(pool.clone())
        .oneshot(status_patch(order_id, &token, "shipping"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let order = zina_db::get_order(&pool, order_id)
        .await
        .expect("get order")
        .expect("order exists");
    assert_eq!(order.status_raw, "new");
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a live Postgres via DATABASE_URL"]
async fn admin_changes_status_and_downloads_invoice(pool: sqlx::PgPool) {
    let placed = place_checkout(app_with_pool(pool.clone())).await;
    let order_id = placed["orderId"].as_i64().expect("order id");

    let user_id = uuid::Uuid::new_v4();
    zina_db::grant_admin(&pool, user_id, "admin@zina.test", "مدير المتجر")
        .await
        .expect("grant admin");
    let token = session_token(user_id);

    let response = app_with_pool(pool.clone())
        .oneshot(status_patch(order_id, &token, "shipping"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "shipping");

    let response = app_with_pool(pool.clone())
        .oneshot(status_patch(order_id, &token, "lost"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app_with_pool(pool)
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/admin/orders/{order_id}/invoice"))
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .expect("content disposition")
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"invoice-"));
    let html = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let html = String::from_utf8(html.to_vec()).expect("utf-8");
    assert!(html.contains("dir=\"rtl\""));
}
