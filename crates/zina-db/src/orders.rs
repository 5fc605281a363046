//! Database operations for `orders` and `order_items`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use zina_core::{NewOrder, NewOrderItem, OrderStatus, PaymentMethod};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `orders` table.
///
/// `status` and `payment_method` are stored as constrained `TEXT`; use
/// [`OrderRow::status`] and [`OrderRow::payment_method`] for the typed values.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct OrderRow {
    pub id: i64,
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: String,
    pub customer_whatsapp: Option<String>,
    pub delivery_address: String,
    #[sqlx(rename = "payment_method")]
    #[serde(rename = "payment_method")]
    pub payment_method_raw: String,
    pub receipt_url: Option<String>,
    pub subtotal: Decimal,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub discount_code: Option<String>,
    pub discount_amount: Decimal,
    pub shipping_amount: Decimal,
    pub total: Decimal,
    #[sqlx(rename = "status")]
    #[serde(rename = "status")]
    pub status_raw: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderRow {
    /// # Errors
    ///
    /// Returns [`DbError::InvalidValue`] if the stored status is not a known
    /// variant (the table `CHECK` constraint prevents this in practice).
    pub fn status(&self) -> Result<OrderStatus, DbError> {
        self.status_raw
            .parse()
            .map_err(|e: zina_core::CoreError| DbError::InvalidValue(e.to_string()))
    }

    /// # Errors
    ///
    /// Returns [`DbError::InvalidValue`] if the stored method is unknown.
    pub fn payment_method(&self) -> Result<PaymentMethod, DbError> {
        self.payment_method_raw
            .parse()
            .map_err(|e: zina_core::CoreError| DbError::InvalidValue(e.to_string()))
    }
}

/// A row from the `order_items` table.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct OrderItemRow {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub product_image: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// Filters for the back-office order list.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderListFilters<'a> {
    pub status: Option<OrderStatus>,
    pub customer_email: Option<&'a str>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

const ORDER_COLUMNS: &str = "id, order_number, customer_name, customer_email, customer_phone, \
     customer_whatsapp, delivery_address, payment_method, receipt_url, subtotal, tax_rate, \
     tax_amount, discount_code, discount_amount, shipping_amount, total, status, notes, \
     created_at, updated_at";

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Inserts an order in `new` status together with all of its items.
///
/// Both inserts run in one transaction: if any item insert fails the order
/// row is rolled back with it, so an order never exists without items.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either insert or the commit fails. A
/// duplicate `order_number` surfaces as a unique violation
/// (see [`DbError::is_unique_violation`]).
pub async fn create_order_with_items(
    pool: &PgPool,
    order: &NewOrder,
    items: &[NewOrderItem],
) -> Result<OrderRow, DbError> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "INSERT INTO orders \
             (order_number, customer_name, customer_email, customer_phone, customer_whatsapp, \
              delivery_address, payment_method, receipt_url, subtotal, tax_rate, tax_amount, \
              discount_code, discount_amount, shipping_amount, total, status, notes) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, 'new', $16) \
         RETURNING {ORDER_COLUMNS}"
    ))
    .bind(&order.order_number)
    .bind(&order.customer_name)
    .bind(&order.customer_email)
    .bind(&order.customer_phone)
    .bind(&order.customer_whatsapp)
    .bind(&order.delivery_address)
    .bind(order.payment_method.as_str())
    .bind(&order.receipt_url)
    .bind(order.subtotal)
    .bind(order.tax_rate)
    .bind(order.tax_amount)
    .bind(&order.discount_code)
    .bind(order.discount_amount)
    .bind(order.shipping_amount)
    .bind(order.total)
    .bind(&order.notes)
    .fetch_one(&mut *tx)
    .await?;

    let product_ids: Vec<i64> = items.iter().map(|i| i.product_id).collect();
    let names: Vec<String> = items.iter().map(|i| i.product_name.clone()).collect();
    let images: Vec<Option<String>> = items.iter().map(|i| i.product_image.clone()).collect();
    let quantities: Vec<i64> = items.iter().map(|i| i64::from(i.quantity)).collect();
    let unit_prices: Vec<Decimal> = items.iter().map(|i| i.unit_price).collect();
    let line_totals: Vec<Decimal> = items.iter().map(NewOrderItem::line_total).collect();

    // Single batch insert via UNNEST; quantities travel as BIGINT and are cast
    // so an out-of-range value fails the statement instead of wrapping.
    sqlx::query(
        "INSERT INTO order_items \
             (order_id, product_id, product_name, product_image, quantity, unit_price, line_total) \
         SELECT $1, t.product_id, t.product_name, t.product_image, t.quantity::integer, \
                t.unit_price, t.line_total \
         FROM UNNEST($2::bigint[], $3::text[], $4::text[], $5::bigint[], $6::numeric[], $7::numeric[]) \
              AS t(product_id, product_name, product_image, quantity, unit_price, line_total)",
    )
    .bind(row.id)
    .bind(&product_ids)
    .bind(&names)
    .bind(&images)
    .bind(&quantities)
    .bind(&unit_prices)
    .bind(&line_totals)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::debug!(
        order_id = row.id,
        order_number = %row.order_number,
        items = items.len(),
        "order inserted"
    );

    Ok(row)
}

/// Sets an order's status and bumps `updated_at`. No other column changes.
///
/// Concurrent updates to the same order are last-write-wins.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no order has `id`, or [`DbError::Sqlx`]
/// if the update fails.
pub async fn update_order_status(
    pool: &PgPool,
    id: i64,
    status: OrderStatus,
) -> Result<OrderRow, DbError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "UPDATE orders SET status = $1, updated_at = NOW() \
         WHERE id = $2 \
         RETURNING {ORDER_COLUMNS}"
    ))
    .bind(status.as_str())
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.ok_or(DbError::NotFound)
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_order(pool: &PgPool, id: i64) -> Result<Option<OrderRow>, DbError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_order_by_number(
    pool: &PgPool,
    order_number: &str,
) -> Result<Option<OrderRow>, DbError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE order_number = $1"
    ))
    .bind(order_number)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns the items of an order in insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_order_items(pool: &PgPool, order_id: i64) -> Result<Vec<OrderItemRow>, DbError> {
    let rows = sqlx::query_as::<_, OrderItemRow>(
        "SELECT id, order_id, product_id, product_name, product_image, quantity, \
                unit_price, line_total \
         FROM order_items \
         WHERE order_id = $1 \
         ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Lists orders newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_orders(
    pool: &PgPool,
    filters: OrderListFilters<'_>,
) -> Result<Vec<OrderRow>, DbError> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders \
         WHERE ($1::text IS NULL OR status = $1) \
           AND ($2::text IS NULL OR customer_email = $2) \
         ORDER BY created_at DESC, id DESC \
         LIMIT $3 OFFSET $4"
    ))
    .bind(filters.status.map(OrderStatus::as_str))
    .bind(filters.customer_email)
    .bind(filters.limit.unwrap_or(50))
    .bind(filters.offset.unwrap_or(0))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
