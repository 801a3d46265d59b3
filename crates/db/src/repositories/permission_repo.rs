//! Repository for the global `permissions` catalog.
//!
//! The catalog is seeded by migration and read-only at runtime.

use sqlx::PgPool;

use crate::models::permission::Permission;

/// Provides read operations for the permission catalog.
pub struct PermissionRepo;

impl PermissionRepo {
    /// List the full catalog, grouped by category then name.
    pub async fn list(pool: &PgPool) -> Result<Vec<Permission>, sqlx::Error> {
        sqlx::query_as::<_, Permission>(
            "SELECT id, name, description, category, created_at
             FROM permissions ORDER BY category, name",
        )
        .fetch_all(pool)
        .await
    }

    /// Find a catalog permission by id.
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Permission>, sqlx::Error> {
        sqlx::query_as::<_, Permission>(
            "SELECT id, name, description, category, created_at
             FROM permissions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}
