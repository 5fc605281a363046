//! Database operations for `products`, `product_images` and `product_colors`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use zina_core::{Product, ProductColor, ProductImage};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `products` table, without its images and colors.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub category_id: Option<i64>,
    pub name_ar: String,
    pub name_en: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub is_available: bool,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductRow {
    #[must_use]
    pub fn into_product(self, images: Vec<ProductImage>, colors: Vec<ProductColor>) -> Product {
        Product {
            id: self.id,
            name_ar: self.name_ar,
            name_en: self.name_en,
            slug: self.slug,
            description: self.description,
            price: self.price,
            stock_quantity: self.stock_quantity,
            category_id: self.category_id,
            is_available: self.is_available,
            is_featured: self.is_featured,
            images,
            colors,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ImageRow {
    product_id: i64,
    url: String,
    is_primary: bool,
    sort_order: i32,
}

#[derive(Debug, sqlx::FromRow)]
struct ColorRow {
    product_id: i64,
    name: Option<String>,
    hex: String,
}

/// Filters for the storefront product list. Only available products are
/// ever returned.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductListFilters<'a> {
    pub category_slug: Option<&'a str>,
    pub featured: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

const PRODUCT_COLUMNS: &str = "p.id, p.category_id, p.name_ar, p.name_en, p.slug, p.description, \
     p.price, p.stock_quantity, p.is_available, p.is_featured, p.created_at, p.updated_at";

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Lists available products newest first, each with its images (by
/// `sort_order`) and colors.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any query fails.
pub async fn list_products(
    pool: &PgPool,
    filters: ProductListFilters<'_>,
) -> Result<Vec<Product>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} \
         FROM products p \
         LEFT JOIN categories c ON c.id = p.category_id \
         WHERE p.is_available = true \
           AND ($1::text IS NULL OR c.slug = $1) \
           AND ($2::boolean IS NULL OR p.is_featured = $2) \
         ORDER BY p.created_at DESC, p.id DESC \
         LIMIT $3 OFFSET $4"
    ))
    .bind(filters.category_slug)
    .bind(filters.featured)
    .bind(filters.limit.unwrap_or(50))
    .bind(filters.offset.unwrap_or(0))
    .fetch_all(pool)
    .await?;

    attach_media(pool, rows).await
}

/// Looks up an available product by slug, with images and colors.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any query fails.
pub async fn get_product_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Product>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products p \
         WHERE p.slug = $1 AND p.is_available = true"
    ))
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };
    let mut products = attach_media(pool, vec![row]).await?;
    Ok(products.pop())
}

async fn attach_media(pool: &PgPool, rows: Vec<ProductRow>) -> Result<Vec<Product>, DbError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();

    let images = sqlx::query_as::<_, ImageRow>(
        "SELECT product_id, url, is_primary, sort_order \
         FROM product_images \
         WHERE product_id = ANY($1) \
         ORDER BY product_id, sort_order, id",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let colors = sqlx::query_as::<_, ColorRow>(
        "SELECT product_id, name, hex \
         FROM product_colors \
         WHERE product_id = ANY($1) \
         ORDER BY product_id, id",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let mut images_by_product: HashMap<i64, Vec<ProductImage>> = HashMap::new();
    for img in images {
        images_by_product
            .entry(img.product_id)
            .or_default()
            .push(ProductImage {
                url: img.url,
                is_primary: img.is_primary,
                sort_order: img.sort_order,
            });
    }

    let mut colors_by_product: HashMap<i64, Vec<ProductColor>> = HashMap::new();
    for color in colors {
        colors_by_product
            .entry(color.product_id)
            .or_default()
            .push(ProductColor {
                name: color.name,
                hex: color.hex,
            });
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let images = images_by_product.remove(&row.id).unwrap_or_default();
            let colors = colors_by_product.remove(&row.id).unwrap_or_default();
            row.into_product(images, colors)
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Inserts or updates a product keyed by slug and replaces its images and
/// colors, all in one transaction. `product.id` is ignored. Returns the row id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; nothing is written in
/// that case.
pub async fn upsert_product(
    pool: &PgPool,
    product: &Product,
    category_id: Option<i64>,
) -> Result<i64, DbError> {
    let mut tx = pool.begin().await?;
    let id = upsert_product_in(&mut *tx, product, category_id).await?;
    tx.commit().await?;
    Ok(id)
}

pub(crate) async fn upsert_product_in(
    conn: &mut PgConnection,
    product: &Product,
    category_id: Option<i64>,
) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO products \
             (category_id, name_ar, name_en, slug, description, price, stock_quantity, \
              is_available, is_featured) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         ON CONFLICT (slug) DO UPDATE SET \
             category_id    = EXCLUDED.category_id, \
             name_ar        = EXCLUDED.name_ar, \
             name_en        = EXCLUDED.name_en, \
             description    = EXCLUDED.description, \
             price          = EXCLUDED.price, \
             stock_quantity = EXCLUDED.stock_quantity, \
             is_available   = EXCLUDED.is_available, \
             is_featured    = EXCLUDED.is_featured, \
             updated_at     = NOW() \
         RETURNING id",
    )
    .bind(category_id)
    .bind(&product.name_ar)
    .bind(&product.name_en)
    .bind(&product.slug)
    .bind(&product.description)
    .bind(product.price)
    .bind(product.stock_quantity)
    .bind(product.is_available)
    .bind(product.is_featured)
    .fetch_one(&mut *conn)
    .await?;

    sqlx::query("DELETE FROM product_images WHERE product_id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    for image in &product.images {
        sqlx::query(
            "INSERT INTO product_images (product_id, url, is_primary, sort_order) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(&image.url)
        .bind(image.is_primary)
        .bind(image.sort_order)
        .execute(&mut *conn)
        .await?;
    }

    sqlx::query("DELETE FROM product_colors WHERE product_id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    for color in &product.colors {
        sqlx::query("INSERT INTO product_colors (product_id, name, hex) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(&color.name)
            .bind(&color.hex)
            .execute(&mut *conn)
            .await?;
    }

    Ok(id)
}
