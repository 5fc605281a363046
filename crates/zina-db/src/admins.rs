//! Back-office principals: accounts with a row in `admins`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AdminRow {
    pub id: i64,
    pub user_id: Uuid,
    pub full_name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Returns the admin record for `user_id` only when it is active.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_active_admin(pool: &PgPool, user_id: Uuid) -> Result<Option<AdminRow>, DbError> {
    let row = sqlx::query_as::<_, AdminRow>(
        "SELECT id, user_id, full_name, is_active, created_at, updated_at \
         FROM admins \
         WHERE user_id = $1 AND is_active = true",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Creates (or reactivates) an admin for an account, creating the `users`
/// row when it does not exist yet. Returns the admin row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either statement fails.
pub async fn grant_admin(
    pool: &PgPool,
    user_id: Uuid,
    email: &str,
    full_name: &str,
) -> Result<AdminRow, DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query("INSERT INTO users (id, email) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING")
        .bind(user_id)
        .bind(email)
        .execute(&mut *tx)
        .await?;

    let row = sqlx::query_as::<_, AdminRow>(
        "INSERT INTO admins (user_id, full_name, is_active) \
         VALUES ($1, $2, true) \
         ON CONFLICT (user_id) DO UPDATE SET \
             full_name  = EXCLUDED.full_name, \
             is_active  = true, \
             updated_at = NOW() \
         RETURNING id, user_id, full_name, is_active, created_at, updated_at",
    )
    .bind(user_id)
    .bind(full_name)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(row)
}

/// Marks an admin inactive. Returns `false` when the account has no admin row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn deactivate_admin(pool: &PgPool, user_id: Uuid) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE admins SET is_active = false, updated_at = NOW() WHERE user_id = $1",
    )
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
