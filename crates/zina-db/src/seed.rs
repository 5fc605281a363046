use std::collections::HashMap;

use sqlx::PgPool;
use zina_core::{Category, Product};

use crate::categories::upsert_category_in;
use crate::products::upsert_product_in;
use crate::DbError;

/// Counts returned by [`seed_catalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeedSummary {
    pub categories: usize,
    pub products: usize,
}

/// Upserts categories and products (keyed by slug) into the database.
///
/// `Product::category_id` refers to `Category::id` within the given slice and
/// is remapped to the database id; products pointing at an unknown category
/// are stored uncategorized. All upserts run inside a single transaction; if
/// any operation fails the entire batch is rolled back.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_catalog(
    pool: &PgPool,
    categories: &[Category],
    products: &[Product],
) -> Result<SeedSummary, DbError> {
    let mut tx = pool.begin().await?;
    let mut ids: HashMap<i64, i64> = HashMap::with_capacity(categories.len());

    for category in categories {
        let db_id = upsert_category_in(&mut *tx, category).await?;
        ids.insert(category.id, db_id);
    }

    for product in products {
        let category_id = product.category_id.and_then(|id| ids.get(&id).copied());
        if product.category_id.is_some() && category_id.is_none() {
            tracing::warn!(slug = %product.slug, "product references unknown category; storing uncategorized");
        }
        upsert_product_in(&mut *tx, product, category_id).await?;
    }

    tx.commit().await?;

    Ok(SeedSummary {
        categories: categories.len(),
        products: products.len(),
    })
}
