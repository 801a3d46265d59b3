//! Repository for the `milestones` table and milestone-deliverable links.
//!
//! Milestones are opaque WBS inputs: plain CRUD plus soft delete and restore.
//! Associating a deliverable requires both sides to belong to the same
//! project; delete/restore cycles never touch association rows.

use serde_json::json;
use sqlx::{PgPool, Postgres, Transaction};

use cascade_core::error::CoreError;
use cascade_core::history::{actions, entity_types, ChangeSet};
use cascade_core::types::{DbId, UserId};

use crate::models::deliverable::Deliverable;
use crate::models::milestone::{CreateMilestone, Milestone, UpdateMilestone};
use crate::repositories::HistoryRepo;
use crate::DbError;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, project_id, name, description, status, planned_date, \
     actual_date, created_at, updated_at, removed_at";

/// Provides CRUD and association operations for milestones.
pub struct MilestoneRepo;

impl MilestoneRepo {
    /// List a project's live milestones, earliest planned first.
    pub async fn list(pool: &PgPool, project_id: DbId) -> Result<Vec<Milestone>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM milestones
             WHERE project_id = $1 AND removed_at IS NULL
             ORDER BY planned_date ASC NULLS LAST, id ASC"
        );
        sqlx::query_as::<_, Milestone>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Find a live milestone within a project.
    pub async fn find(
        pool: &PgPool,
        project_id: DbId,
        milestone_id: DbId,
    ) -> Result<Option<Milestone>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM milestones
             WHERE id = $1 AND project_id = $2 AND removed_at IS NULL"
        );
        sqlx::query_as::<_, Milestone>(&query)
            .bind(milestone_id)
            .bind(project_id)
            .fetch_optional(pool)
            .await
    }

    /// Find a milestone by direct id, including soft-deleted rows and rows
    /// whose parent project is soft-deleted.
    pub async fn find_by_id_include_removed(
        pool: &PgPool,
        milestone_id: DbId,
    ) -> Result<Option<Milestone>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM milestones WHERE id = $1");
        sqlx::query_as::<_, Milestone>(&query)
            .bind(milestone_id)
            .fetch_optional(pool)
            .await
    }

    /// Create a milestone.
    pub async fn create(
        pool: &PgPool,
        project_id: DbId,
        actor: UserId,
        input: &CreateMilestone,
    ) -> Result<Milestone, DbError> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO milestones (project_id, name, description, status, planned_date, actual_date)
             VALUES ($1, $2, $3, COALESCE($4, 'planned'), $5, $6)
             RETURNING {COLUMNS}"
        );
        let milestone = sqlx::query_as::<_, Milestone>(&query)
            .bind(project_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.status)
            .bind(input.planned_date)
            .bind(input.actual_date)
            .fetch_one(&mut *tx)
            .await?;

        let changes = ChangeSet::new()
            .note("name", json!(milestone.name))
            .into_value();
        HistoryRepo::insert_tx(
            &mut tx,
            project_id,
            actor,
            actions::CREATED,
            entity_types::MILESTONE,
            Some(milestone.id),
            Some(changes),
        )
        .await?;

        tx.commit().await?;
        Ok(milestone)
    }

    /// Update a milestone. Only non-`None` fields are applied.
    pub async fn update(
        pool: &PgPool,
        project_id: DbId,
        actor: UserId,
        milestone_id: DbId,
        input: &UpdateMilestone,
    ) -> Result<Milestone, DbError> {
        let mut tx = pool.begin().await?;

        let old = Self::fetch_live(&mut tx, project_id, milestone_id).await?;

        let query = format!(
            "UPDATE milestones SET
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                status = COALESCE($5, status),
                planned_date = COALESCE($6, planned_date),
                actual_date = COALESCE($7, actual_date),
                updated_at = NOW()
             WHERE id = $1 AND project_id = $2 AND removed_at IS NULL
             RETURNING {COLUMNS}"
        );
        let milestone = sqlx::query_as::<_, Milestone>(&query)
            .bind(milestone_id)
            .bind(project_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.status)
            .bind(input.planned_date)
            .bind(input.actual_date)
            .fetch_one(&mut *tx)
            .await?;

        let changes = ChangeSet::new()
            .field("name", json!(old.name), json!(milestone.name))
            .field(
                "description",
                json!(old.description),
                json!(milestone.description),
            )
            .field("status", json!(old.status), json!(milestone.status))
            .field(
                "planned_date",
                json!(old.planned_date),
                json!(milestone.planned_date),
            )
            .field(
                "actual_date",
                json!(old.actual_date),
                json!(milestone.actual_date),
            );
        if !changes.is_empty() {
            HistoryRepo::insert_tx(
                &mut tx,
                project_id,
                actor,
                actions::UPDATED,
                entity_types::MILESTONE,
                Some(milestone_id),
                Some(changes.into_value()),
            )
            .await?;
        }

        tx.commit().await?;
        Ok(milestone)
    }

    /// Soft-delete a milestone. Association rows are left intact.
    pub async fn soft_delete(
        pool: &PgPool,
        project_id: DbId,
        actor: UserId,
        milestone_id: DbId,
    ) -> Result<(), DbError> {
        let mut tx = pool.begin().await?;

        Self::fetch_live(&mut tx, project_id, milestone_id).await?;

        sqlx::query(
            "UPDATE milestones SET removed_at = NOW(), updated_at = NOW()
             WHERE id = $1 AND project_id = $2 AND removed_at IS NULL",
        )
        .bind(milestone_id)
        .bind(project_id)
        .execute(&mut *tx)
        .await?;

        HistoryRepo::insert_tx(
            &mut tx,
            project_id,
            actor,
            actions::DELETED,
            entity_types::MILESTONE,
            Some(milestone_id),
            None,
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Restore a soft-deleted milestone. Prior associations reappear with it.
    pub async fn restore(
        pool: &PgPool,
        project_id: DbId,
        actor: UserId,
        milestone_id: DbId,
    ) -> Result<Milestone, DbError> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE milestones SET removed_at = NULL, updated_at = NOW()
             WHERE id = $1 AND project_id = $2 AND removed_at IS NOT NULL
             RETURNING {COLUMNS}"
        );
        let milestone = sqlx::query_as::<_, Milestone>(&query)
            .bind(milestone_id)
            .bind(project_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(DbError::Domain(CoreError::NotFound {
                entity: "Milestone",
                id: milestone_id,
            }))?;

        HistoryRepo::insert_tx(
            &mut tx,
            project_id,
            actor,
            actions::RESTORED,
            entity_types::MILESTONE,
            Some(milestone_id),
            None,
        )
        .await?;

        tx.commit().await?;
        Ok(milestone)
    }

    /// Associate a deliverable with a milestone.
    ///
    /// Both must be live rows of the same project; a duplicate association is
    /// a conflict.
    pub async fn associate_deliverable(
        pool: &PgPool,
        project_id: DbId,
        actor: UserId,
        milestone_id: DbId,
        deliverable_id: DbId,
    ) -> Result<(), DbError> {
        let mut tx = pool.begin().await?;

        Self::fetch_live(&mut tx, project_id, milestone_id).await?;

        let deliverable_project: Option<DbId> = sqlx::query_scalar(
            "SELECT project_id FROM deliverables WHERE id = $1 AND removed_at IS NULL",
        )
        .bind(deliverable_id)
        .fetch_optional(&mut *tx)
        .await?;
        match deliverable_project {
            None => {
                return Err(DbError::Domain(CoreError::NotFound {
                    entity: "Deliverable",
                    id: deliverable_id,
                }));
            }
            Some(owner) if owner != project_id => {
                return Err(DbError::Domain(CoreError::Conflict(
                    "Milestone and deliverable must belong to the same project".to_string(),
                )));
            }
            Some(_) => {}
        }

        let result = sqlx::query(
            "INSERT INTO milestone_deliverables (milestone_id, deliverable_id) VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(milestone_id)
        .bind(deliverable_id)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::Domain(CoreError::Conflict(
                "Deliverable is already associated with this milestone".to_string(),
            )));
        }

        let changes = ChangeSet::new()
            .note("milestone_id", json!(milestone_id))
            .note("deliverable_id", json!(deliverable_id))
            .into_value();
        HistoryRepo::insert_tx(
            &mut tx,
            project_id,
            actor,
            actions::ASSOCIATION_ADDED,
            entity_types::MILESTONE_DELIVERABLE,
            Some(milestone_id),
            Some(changes),
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Remove a milestone-deliverable association. Neither entity is deleted.
    pub async fn dissociate_deliverable(
        pool: &PgPool,
        project_id: DbId,
        actor: UserId,
        milestone_id: DbId,
        deliverable_id: DbId,
    ) -> Result<(), DbError> {
        let mut tx = pool.begin().await?;

        Self::fetch_live(&mut tx, project_id, milestone_id).await?;

        let result = sqlx::query(
            "DELETE FROM milestone_deliverables WHERE milestone_id = $1 AND deliverable_id = $2",
        )
        .bind(milestone_id)
        .bind(deliverable_id)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::Domain(CoreError::NotFound {
                entity: "Association",
                id: deliverable_id,
            }));
        }

        let changes = ChangeSet::new()
            .note("milestone_id", json!(milestone_id))
            .note("deliverable_id", json!(deliverable_id))
            .into_value();
        HistoryRepo::insert_tx(
            &mut tx,
            project_id,
            actor,
            actions::ASSOCIATION_REMOVED,
            entity_types::MILESTONE_DELIVERABLE,
            Some(milestone_id),
            Some(changes),
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// List the live deliverables associated with a milestone.
    pub async fn list_deliverables(
        pool: &PgPool,
        milestone_id: DbId,
    ) -> Result<Vec<Deliverable>, sqlx::Error> {
        sqlx::query_as::<_, Deliverable>(
            "SELECT d.id, d.project_id, d.name, d.description, d.kind, d.status,
                    d.planned_date, d.actual_date, d.created_at, d.updated_at, d.removed_at
             FROM deliverables d
             JOIN milestone_deliverables md ON md.deliverable_id = d.id
             WHERE md.milestone_id = $1 AND d.removed_at IS NULL
             ORDER BY d.id ASC",
        )
        .bind(milestone_id)
        .fetch_all(pool)
        .await
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    async fn fetch_live(
        tx: &mut Transaction<'_, Postgres>,
        project_id: DbId,
        milestone_id: DbId,
    ) -> Result<Milestone, DbError> {
        let query = format!(
            "SELECT {COLUMNS} FROM milestones
             WHERE id = $1 AND project_id = $2 AND removed_at IS NULL"
        );
        sqlx::query_as::<_, Milestone>(&query)
            .bind(milestone_id)
            .bind(project_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(DbError::Domain(CoreError::NotFound {
                entity: "Milestone",
                id: milestone_id,
            }))
    }
}
