//! Customer summaries derived from order history.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// One customer as seen by the back-office, keyed by the email used at
/// checkout. `registered` is `true` when a `customers` row shares the email.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct CustomerSummaryRow {
    pub email: String,
    pub name: String,
    pub phone: String,
    pub order_count: i64,
    pub total_spent: Decimal,
    pub last_order_at: DateTime<Utc>,
    pub registered: bool,
}

/// Aggregates orders by customer email, most recent buyer first. Orders
/// placed without an email are not attributed to anyone.
///
/// `total_spent` excludes cancelled and refunded orders.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_customer_summaries(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<CustomerSummaryRow>, DbError> {
    let rows = sqlx::query_as::<_, CustomerSummaryRow>(
        "SELECT o.customer_email AS email, \
                (ARRAY_AGG(o.customer_name ORDER BY o.created_at DESC))[1] AS name, \
                (ARRAY_AGG(o.customer_phone ORDER BY o.created_at DESC))[1] AS phone, \
                COUNT(*) AS order_count, \
                COALESCE(SUM(o.total) FILTER (WHERE o.status NOT IN ('cancelled', 'refunded')), 0) \
                    AS total_spent, \
                MAX(o.created_at) AS last_order_at, \
                BOOL_OR(c.id IS NOT NULL) AS registered \
         FROM orders o \
         LEFT JOIN customers c ON c.email = o.customer_email \
         WHERE o.customer_email IS NOT NULL \
         GROUP BY o.customer_email \
         ORDER BY MAX(o.created_at) DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
