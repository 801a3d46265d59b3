//! Repository for the append-only `project_history` table.
//!
//! Rows are only ever inserted, and only through [`HistoryRepo::insert_tx`]
//! from inside the transaction of the mutation being documented. There is no
//! update or delete.

use sqlx::PgPool;

use cascade_core::types::{DbId, UserId};

use crate::models::history::{HistoryEntry, HistoryQuery};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, project_id, user_id, action, entity_type, entity_id, changes, created_at";

/// Provides insert and query operations for project history.
pub struct HistoryRepo;

impl HistoryRepo {
    /// Append one history row inside an existing transaction.
    ///
    /// Callers must pass the transaction of the mutation the row documents,
    /// so the no-mutation-without-audit invariant holds on rollback.
    pub async fn insert_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        project_id: DbId,
        user_id: UserId,
        action: &str,
        entity_type: &str,
        entity_id: Option<DbId>,
        changes: Option<serde_json::Value>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO project_history (project_id, user_id, action, entity_type, entity_id, changes)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(project_id)
        .bind(user_id)
        .bind(action)
        .bind(entity_type)
        .bind(entity_id)
        .bind(changes)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Query a project's history with optional entity-type filter and
    /// pagination.
    ///
    /// Ordered newest first; ties on `created_at` break by id ascending so
    /// pagination is deterministic.
    pub async fn list(
        pool: &PgPool,
        project_id: DbId,
        params: &HistoryQuery,
    ) -> Result<Vec<HistoryEntry>, sqlx::Error> {
        let limit = params.limit.unwrap_or(50).clamp(1, 500);
        let offset = params.offset.unwrap_or(0).max(0);

        let query = format!(
            "SELECT {COLUMNS} FROM project_history
             WHERE project_id = $1 AND ($2::TEXT IS NULL OR entity_type = $2)
             ORDER BY created_at DESC, id ASC
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, HistoryEntry>(&query)
            .bind(project_id)
            .bind(&params.entity_type)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count history rows matching the given filter (for pagination metadata).
    pub async fn count(
        pool: &PgPool,
        project_id: DbId,
        params: &HistoryQuery,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)::BIGINT FROM project_history
             WHERE project_id = $1 AND ($2::TEXT IS NULL OR entity_type = $2)",
        )
        .bind(project_id)
        .bind(&params.entity_type)
        .fetch_one(pool)
        .await
    }
}
