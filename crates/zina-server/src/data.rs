//! Uniform data access for the HTTP layer.
//!
//! Storefront reads, orders, customers and stats come from Postgres. Catalog
//! administration, shopper accounts and favorites go through the external
//! catalog API, which serves sample data for reads when it is unavailable.

use axum::http::HeaderMap;
use serde::Serialize;
use sqlx::PgPool;
use zina_catalog::CatalogClient;
use zina_core::{Category, OrderStatus, Product};
use zina_db::{
    CustomerSummaryRow, DashboardStatsRow, DbError, OrderItemRow, OrderListFilters, OrderRow,
    ProductListFilters,
};

/// Header carrying the caller's catalog API token.
pub const CATALOG_TOKEN_HEADER: &str = "x-catalog-token";

/// An order with its line items.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: OrderRow,
    pub items: Vec<OrderItemRow>,
}

#[derive(Debug, Clone)]
pub struct DataAccess {
    pool: PgPool,
    catalog: CatalogClient,
}

impl DataAccess {
    #[must_use]
    pub fn new(pool: PgPool, catalog: CatalogClient) -> Self {
        Self { pool, catalog }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Catalog client acting with the token from `X-Catalog-Token`, or
    /// anonymously when the header is absent.
    #[must_use]
    pub fn catalog_for(&self, headers: &HeaderMap) -> CatalogClient {
        let token = headers
            .get(CATALOG_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(ToOwned::to_owned);
        self.catalog.scoped(token)
    }

    // -----------------------------------------------------------------------
    // Storefront
    // -----------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub async fn categories(&self) -> Result<Vec<Category>, DbError> {
        let rows = zina_db::list_active_categories(&self.pool).await?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub async fn category_by_slug(&self, slug: &str) -> Result<Option<Category>, DbError> {
        let row = zina_db::get_category_by_slug(&self.pool, slug).await?;
        Ok(row.map(Category::from))
    }

    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub async fn products(&self, filters: ProductListFilters<'_>) -> Result<Vec<Product>, DbError> {
        zina_db::list_products(&self.pool, filters).await
    }

    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub async fn product_by_slug(&self, slug: &str) -> Result<Option<Product>, DbError> {
        zina_db::get_product_by_slug(&self.pool, slug).await
    }

    // -----------------------------------------------------------------------
    // Orders
    // -----------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns [`DbError`] if either query fails.
    pub async fn order(&self, id: i64) -> Result<Option<OrderDetail>, DbError> {
        match zina_db::get_order(&self.pool, id).await? {
            Some(order) => self.with_items(order).await.map(Some),
            None => Ok(None),
        }
    }

    /// # Errors
    ///
    /// Returns [`DbError`] if either query fails.
    pub async fn order_by_number(&self, order_number: &str) -> Result<Option<OrderDetail>, DbError> {
        match zina_db::get_order_by_number(&self.pool, order_number).await? {
            Some(order) => self.with_items(order).await.map(Some),
            None => Ok(None),
        }
    }

    async fn with_items(&self, order: OrderRow) -> Result<OrderDetail, DbError> {
        let items = zina_db::list_order_items(&self.pool, order.id).await?;
        Ok(OrderDetail { order, items })
    }

    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub async fn orders(&self, filters: OrderListFilters<'_>) -> Result<Vec<OrderRow>, DbError> {
        zina_db::list_orders(&self.pool, filters).await
    }

    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] for an unknown order.
    pub async fn set_order_status(&self, id: i64, status: OrderStatus) -> Result<OrderRow, DbError> {
        zina_db::update_order_status(&self.pool, id, status).await
    }

    // -----------------------------------------------------------------------
    // Back-office reporting
    // -----------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub async fn customers(&self, limit: i64) -> Result<Vec<CustomerSummaryRow>, DbError> {
        zina_db::list_customer_summaries(&self.pool, limit).await
    }

    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    pub async fn stats(&self) -> Result<DashboardStatsRow, DbError> {
        zina_db::dashboard_stats(&self.pool).await
    }
}
