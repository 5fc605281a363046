//! Database operations for the `categories` table.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use zina_core::Category;

use crate::DbError;

/// A row from the `categories` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryRow {
    pub id: i64,
    pub name_ar: String,
    pub name_en: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            name_ar: row.name_ar,
            name_en: row.name_en,
            slug: row.slug,
            description: row.description,
            image_url: row.image_url,
            is_active: row.is_active,
        }
    }
}

/// Returns all active categories ordered by Arabic name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_categories(pool: &PgPool) -> Result<Vec<CategoryRow>, DbError> {
    let rows = sqlx::query_as::<_, CategoryRow>(
        "SELECT id, name_ar, name_en, slug, description, image_url, is_active, \
                created_at, updated_at \
         FROM categories \
         WHERE is_active = true \
         ORDER BY name_ar",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Looks up an active category by slug.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_category_by_slug(
    pool: &PgPool,
    slug: &str,
) -> Result<Option<CategoryRow>, DbError> {
    let row = sqlx::query_as::<_, CategoryRow>(
        "SELECT id, name_ar, name_en, slug, description, image_url, is_active, \
                created_at, updated_at \
         FROM categories \
         WHERE slug = $1 AND is_active = true",
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Inserts or updates a category keyed by slug. Returns the row id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_category(pool: &PgPool, category: &Category) -> Result<i64, DbError> {
    let mut conn = pool.acquire().await?;
    upsert_category_in(&mut *conn, category).await
}

pub(crate) async fn upsert_category_in(
    conn: &mut PgConnection,
    category: &Category,
) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO categories (name_ar, name_en, slug, description, image_url, is_active) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (slug) DO UPDATE SET \
             name_ar     = EXCLUDED.name_ar, \
             name_en     = EXCLUDED.name_en, \
             description = EXCLUDED.description, \
             image_url   = EXCLUDED.image_url, \
             is_active   = EXCLUDED.is_active, \
             updated_at  = NOW() \
         RETURNING id",
    )
    .bind(&category.name_ar)
    .bind(&category.name_en)
    .bind(&category.slug)
    .bind(&category.description)
    .bind(&category.image_url)
    .bind(category.is_active)
    .fetch_one(&mut *conn)
    .await?;

    Ok(id)
}
