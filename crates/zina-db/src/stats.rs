//! Back-office dashboard counters.

use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct DashboardStatsRow {
    pub total_orders: i64,
    pub new_orders: i64,
    pub open_orders: i64,
    pub completed_orders: i64,
    /// Sum of `total` over completed orders.
    pub revenue: Decimal,
    pub product_count: i64,
    pub category_count: i64,
    pub customer_count: i64,
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn dashboard_stats(pool: &PgPool) -> Result<DashboardStatsRow, DbError> {
    let row = sqlx::query_as::<_, DashboardStatsRow>(
        "SELECT \
             (SELECT COUNT(*) FROM orders) AS total_orders, \
             (SELECT COUNT(*) FROM orders WHERE status = 'new') AS new_orders, \
             (SELECT COUNT(*) FROM orders \
                 WHERE status IN ('processing', 'ready', 'shipping', 'refund_pending')) \
                 AS open_orders, \
             (SELECT COUNT(*) FROM orders WHERE status = 'completed') AS completed_orders, \
             (SELECT COALESCE(SUM(total), 0) FROM orders WHERE status = 'completed') AS revenue, \
             (SELECT COUNT(*) FROM products) AS product_count, \
             (SELECT COUNT(*) FROM categories) AS category_count, \
             (SELECT COUNT(DISTINCT customer_email) FROM orders \
                 WHERE customer_email IS NOT NULL) AS customer_count",
    )
    .fetch_one(pool)
    .await?;

    Ok(row)
}
