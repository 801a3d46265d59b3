//! Repository for the `deliverables` table.
//!
//! Deliverables mirror milestones: opaque WBS inputs with plain CRUD, soft
//! delete, and restore. Reachable by direct id even after the parent project
//! is soft-deleted.

use serde_json::json;
use sqlx::{PgPool, Postgres, Transaction};

use cascade_core::error::CoreError;
use cascade_core::history::{actions, entity_types, ChangeSet};
use cascade_core::types::{DbId, UserId};

use crate::models::deliverable::{CreateDeliverable, Deliverable, UpdateDeliverable};
use crate::repositories::HistoryRepo;
use crate::DbError;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, project_id, name, description, kind, status, planned_date, \
     actual_date, created_at, updated_at, removed_at";

/// Provides CRUD operations for deliverables.
pub struct DeliverableRepo;

impl DeliverableRepo {
    /// List a project's live deliverables.
    pub async fn list(pool: &PgPool, project_id: DbId) -> Result<Vec<Deliverable>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM deliverables
             WHERE project_id = $1 AND removed_at IS NULL
             ORDER BY planned_date ASC NULLS LAST, id ASC"
        );
        sqlx::query_as::<_, Deliverable>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Find a live deliverable within a project.
    pub async fn find(
        pool: &PgPool,
        project_id: DbId,
        deliverable_id: DbId,
    ) -> Result<Option<Deliverable>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM deliverables
             WHERE id = $1 AND project_id = $2 AND removed_at IS NULL"
        );
        sqlx::query_as::<_, Deliverable>(&query)
            .bind(deliverable_id)
            .bind(project_id)
            .fetch_optional(pool)
            .await
    }

    /// Find a deliverable by direct id, including soft-deleted rows.
    pub async fn find_by_id_include_removed(
        pool: &PgPool,
        deliverable_id: DbId,
    ) -> Result<Option<Deliverable>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM deliverables WHERE id = $1");
        sqlx::query_as::<_, Deliverable>(&query)
            .bind(deliverable_id)
            .fetch_optional(pool)
            .await
    }

    /// Create a deliverable.
    pub async fn create(
        pool: &PgPool,
        project_id: DbId,
        actor: UserId,
        input: &CreateDeliverable,
    ) -> Result<Deliverable, DbError> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO deliverables (project_id, name, description, kind, status, planned_date, actual_date)
             VALUES ($1, $2, $3, $4, COALESCE($5, 'planned'), $6, $7)
             RETURNING {COLUMNS}"
        );
        let deliverable = sqlx::query_as::<_, Deliverable>(&query)
            .bind(project_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.kind)
            .bind(&input.status)
            .bind(input.planned_date)
            .bind(input.actual_date)
            .fetch_one(&mut *tx)
            .await?;

        let changes = ChangeSet::new()
            .note("name", json!(deliverable.name))
            .note("kind", json!(deliverable.kind))
            .into_value();
        HistoryRepo::insert_tx(
            &mut tx,
            project_id,
            actor,
            actions::CREATED,
            entity_types::DELIVERABLE,
            Some(deliverable.id),
            Some(changes),
        )
        .await?;

        tx.commit().await?;
        Ok(deliverable)
    }

    /// Update a deliverable. Only non-`None` fields are applied.
    pub async fn update(
        pool: &PgPool,
        project_id: DbId,
        actor: UserId,
        deliverable_id: DbId,
        input: &UpdateDeliverable,
    ) -> Result<Deliverable, DbError> {
        let mut tx = pool.begin().await?;

        let old = Self::fetch_live(&mut tx, project_id, deliverable_id).await?;

        let query = format!(
            "UPDATE deliverables SET
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                kind = COALESCE($5, kind),
                status = COALESCE($6, status),
                planned_date = COALESCE($7, planned_date),
                actual_date = COALESCE($8, actual_date),
                updated_at = NOW()
             WHERE id = $1 AND project_id = $2 AND removed_at IS NULL
             RETURNING {COLUMNS}"
        );
        let deliverable = sqlx::query_as::<_, Deliverable>(&query)
            .bind(deliverable_id)
            .bind(project_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.kind)
            .bind(&input.status)
            .bind(input.planned_date)
            .bind(input.actual_date)
            .fetch_one(&mut *tx)
            .await?;

        let changes = ChangeSet::new()
            .field("name", json!(old.name), json!(deliverable.name))
            .field(
                "description",
                json!(old.description),
                json!(deliverable.description),
            )
            .field("kind", json!(old.kind), json!(deliverable.kind))
            .field("status", json!(old.status), json!(deliverable.status))
            .field(
                "planned_date",
                json!(old.planned_date),
                json!(deliverable.planned_date),
            )
            .field(
                "actual_date",
                json!(old.actual_date),
                json!(deliverable.actual_date),
            );
        if !changes.is_empty() {
            HistoryRepo::insert_tx(
                &mut tx,
                project_id,
                actor,
                actions::UPDATED,
                entity_types::DELIVERABLE,
                Some(deliverable_id),
                Some(changes.into_value()),
            )
            .await?;
        }

        tx.commit().await?;
        Ok(deliverable)
    }

    /// Soft-delete a deliverable. Association rows are left intact.
    pub async fn soft_delete(
        pool: &PgPool,
        project_id: DbId,
        actor: UserId,
        deliverable_id: DbId,
    ) -> Result<(), DbError> {
        let mut tx = pool.begin().await?;

        Self::fetch_live(&mut tx, project_id, deliverable_id).await?;

        sqlx::query(
            "UPDATE deliverables SET removed_at = NOW(), updated_at = NOW()
             WHERE id = $1 AND project_id = $2 AND removed_at IS NULL",
        )
        .bind(deliverable_id)
        .bind(project_id)
        .execute(&mut *tx)
        .await?;

        HistoryRepo::insert_tx(
            &mut tx,
            project_id,
            actor,
            actions::DELETED,
            entity_types::DELIVERABLE,
            Some(deliverable_id),
            None,
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Restore a soft-deleted deliverable.
    pub async fn restore(
        pool: &PgPool,
        project_id: DbId,
        actor: UserId,
        deliverable_id: DbId,
    ) -> Result<Deliverable, DbError> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE deliverables SET removed_at = NULL, updated_at = NOW()
             WHERE id = $1 AND project_id = $2 AND removed_at IS NOT NULL
             RETURNING {COLUMNS}"
        );
        let deliverable = sqlx::query_as::<_, Deliverable>(&query)
            .bind(deliverable_id)
            .bind(project_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(DbError::Domain(CoreError::NotFound {
                entity: "Deliverable",
                id: deliverable_id,
            }))?;

        HistoryRepo::insert_tx(
            &mut tx,
            project_id,
            actor,
            actions::RESTORED,
            entity_types::DELIVERABLE,
            Some(deliverable_id),
            None,
        )
        .await?;

        tx.commit().await?;
        Ok(deliverable)
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    async fn fetch_live(
        tx: &mut Transaction<'_, Postgres>,
        project_id: DbId,
        deliverable_id: DbId,
    ) -> Result<Deliverable, DbError> {
        let query = format!(
            "SELECT {COLUMNS} FROM deliverables
             WHERE id = $1 AND project_id = $2 AND removed_at IS NULL"
        );
        sqlx::query_as::<_, Deliverable>(&query)
            .bind(deliverable_id)
            .bind(project_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(DbError::Domain(CoreError::NotFound {
                entity: "Deliverable",
                id: deliverable_id,
            }))
    }
}
