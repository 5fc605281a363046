//! Offline tests for zina-db pool configuration and row types.
//! These tests do not require a live database connection.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use chrono::Utc;
use rust_decimal::Decimal;
use zina_core::{AppConfig, Environment, OrderStatus, PaymentMethod, PricingPolicy};
use zina_db::{DbError, OrderRow, PoolConfig, ProductRow};

fn app_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        catalog_api_url: None,
        catalog_timeout_secs: 15,
        catalog_user_agent: "ua".to_string(),
        site_url: "http://localhost:3000".to_string(),
        auth_jwt_secret: None,
        auth_jwt_audience: "authenticated".to_string(),
        tax_rate: Decimal::new(14, 2),
        shipping_amount: Decimal::ZERO,
        discount_codes: PricingPolicy::default()
            .lookup_discount("SAVE18")
            .cloned()
            .into_iter()
            .collect(),
        receipts_dir: PathBuf::from("./uploads/receipts"),
        receipt_max_bytes: 1024,
    }
}

fn order_row(status: &str, payment_method: &str) -> OrderRow {
    OrderRow {
        id: 1,
        order_number: "ORD-1-ABCDEF".to_string(),
        customer_name: "سارة".to_string(),
        customer_email: None,
        customer_phone: "0100".to_string(),
        customer_whatsapp: None,
        delivery_address: "القاهرة".to_string(),
        payment_method_raw: payment_method.to_string(),
        receipt_url: None,
        subtotal: Decimal::new(100, 0),
        tax_rate: Decimal::new(14, 2),
        tax_amount: Decimal::new(14, 0),
        discount_code: None,
        discount_amount: Decimal::ZERO,
        shipping_amount: Decimal::ZERO,
        total: Decimal::new(114, 0),
        status_raw: status.to_string(),
        notes: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let pool_config = PoolConfig::from_app_config(&app_config());
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn order_row_exposes_typed_status_and_payment_method() {
    let row = order_row("refund_pending", "transfer");
    assert_eq!(row.status().expect("status"), OrderStatus::RefundPending);
    assert_eq!(
        row.payment_method().expect("payment method"),
        PaymentMethod::Transfer
    );
}

#[test]
fn order_row_with_unknown_status_reports_invalid_value() {
    let row = order_row("lost", "cash");
    assert!(matches!(row.status(), Err(DbError::InvalidValue(_))));
}

#[test]
fn order_row_serializes_raw_columns_under_column_names() {
    let json = serde_json::to_value(order_row("new", "cash")).expect("serialize");
    assert_eq!(json["status"], "new");
    assert_eq!(json["payment_method"], "cash");
    assert!(json.get("status_raw").is_none());
}

#[test]
fn product_row_converts_into_core_product() {
    let row = ProductRow {
        id: 5,
        category_id: Some(2),
        name_ar: "قلادة".to_string(),
        name_en: "Necklace".to_string(),
        slug: "necklace".to_string(),
        description: None,
        price: Decimal::new(25000, 2),
        stock_quantity: 4,
        is_available: true,
        is_featured: false,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let product = row.into_product(Vec::new(), Vec::new());
    assert_eq!(product.id, 5);
    assert_eq!(product.category_id, Some(2));
    assert!(product.in_stock());
    assert!(product.primary_image().is_none());
}
