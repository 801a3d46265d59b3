//! Repository for the `project_members` table.
//!
//! Membership mutations run inside one transaction with their history entry
//! and enforce two invariants: a user has at most one active membership per
//! project (re-adding a removed member restores the row), and a project never
//! loses its last active member holding full project management.

use serde_json::json;
use sqlx::{PgPool, Postgres, Transaction};

use cascade_core::error::CoreError;
use cascade_core::history::{actions, entity_types, ChangeSet};
use cascade_core::permissions::MANAGEMENT_PERMISSIONS;
use cascade_core::types::{DbId, UserId};

use crate::models::member::ProjectMember;
use crate::repositories::HistoryRepo;
use crate::DbError;

/// Column list for membership queries (joined with the role name).
const COLUMNS: &str = "m.project_id, m.user_id, m.role_id, r.name AS role_name, \
     m.added_by, m.added_at, m.removed_at";

/// Provides membership operations for projects.
pub struct MemberRepo;

impl MemberRepo {
    /// List a project's active members with their role names.
    pub async fn list(pool: &PgPool, project_id: DbId) -> Result<Vec<ProjectMember>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM project_members m
             JOIN project_roles r ON r.id = m.role_id
             WHERE m.project_id = $1 AND m.removed_at IS NULL
             ORDER BY m.added_at ASC"
        );
        sqlx::query_as::<_, ProjectMember>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Find an active membership.
    pub async fn find(
        pool: &PgPool,
        project_id: DbId,
        user_id: UserId,
    ) -> Result<Option<ProjectMember>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM project_members m
             JOIN project_roles r ON r.id = m.role_id
             WHERE m.project_id = $1 AND m.user_id = $2 AND m.removed_at IS NULL"
        );
        sqlx::query_as::<_, ProjectMember>(&query)
            .bind(project_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Add a member, or restore a previously removed membership.
    ///
    /// The role must be a live role of the same project. An already-active
    /// membership is a conflict.
    pub async fn add(
        pool: &PgPool,
        project_id: DbId,
        actor: UserId,
        user_id: UserId,
        role_id: DbId,
    ) -> Result<ProjectMember, DbError> {
        let mut tx = pool.begin().await?;

        Self::ensure_role_in_project(&mut tx, project_id, role_id).await?;

        let existing: Option<(Option<cascade_core::types::Timestamp>,)> = sqlx::query_as(
            "SELECT removed_at FROM project_members WHERE project_id = $1 AND user_id = $2",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        match existing {
            Some((None,)) => {
                return Err(DbError::Domain(CoreError::Conflict(
                    "Member already exists in this project".to_string(),
                )));
            }
            Some((Some(_),)) => {
                // Restore the removed membership in place.
                sqlx::query(
                    "UPDATE project_members
                     SET removed_at = NULL, role_id = $3, added_by = $4, added_at = NOW()
                     WHERE project_id = $1 AND user_id = $2",
                )
                .bind(project_id)
                .bind(user_id)
                .bind(role_id)
                .bind(actor)
                .execute(&mut *tx)
                .await?;
            }
            None => {
                sqlx::query(
                    "INSERT INTO project_members (project_id, user_id, role_id, added_by)
                     VALUES ($1, $2, $3, $4)",
                )
                .bind(project_id)
                .bind(user_id)
                .bind(role_id)
                .bind(actor)
                .execute(&mut *tx)
                .await?;
            }
        }

        let changes = ChangeSet::new()
            .note("user_id", json!(user_id))
            .note("role_id", json!(role_id))
            .into_value();
        HistoryRepo::insert_tx(
            &mut tx,
            project_id,
            actor,
            actions::MEMBER_ADDED,
            entity_types::MEMBER,
            None,
            Some(changes),
        )
        .await?;

        tx.commit().await?;
        tracing::info!(project_id, user_id = %user_id, role_id, "Member added");

        Self::find(pool, project_id, user_id)
            .await?
            .ok_or(DbError::Domain(CoreError::Internal(
                "Member vanished after insert".to_string(),
            )))
    }

    /// Change a member's role.
    ///
    /// Rejects a change that would leave the project without any active
    /// member holding full project management.
    pub async fn update_role(
        pool: &PgPool,
        project_id: DbId,
        actor: UserId,
        user_id: UserId,
        role_id: DbId,
    ) -> Result<ProjectMember, DbError> {
        let mut tx = pool.begin().await?;

        let old_role_id: DbId = sqlx::query_scalar(
            "SELECT role_id FROM project_members
             WHERE project_id = $1 AND user_id = $2 AND removed_at IS NULL",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(DbError::Domain(CoreError::NotFound {
            entity: "Member",
            id: project_id,
        }))?;

        Self::ensure_role_in_project(&mut tx, project_id, role_id).await?;

        // If the new role lacks full management, the member no longer counts
        // as a manager; some other active member must still hold it.
        if !Self::role_grants_management(&mut tx, role_id).await?
            && Self::count_other_managers(&mut tx, project_id, user_id).await? == 0
        {
            return Err(DbError::Domain(CoreError::Conflict(
                "Cannot remove the last member with full project management".to_string(),
            )));
        }

        sqlx::query(
            "UPDATE project_members SET role_id = $3
             WHERE project_id = $1 AND user_id = $2 AND removed_at IS NULL",
        )
        .bind(project_id)
        .bind(user_id)
        .bind(role_id)
        .execute(&mut *tx)
        .await?;

        let role_change = ChangeSet::new().field("role_id", json!(old_role_id), json!(role_id));
        if !role_change.is_empty() {
            let changes = role_change.note("user_id", json!(user_id));
            HistoryRepo::insert_tx(
                &mut tx,
                project_id,
                actor,
                actions::MEMBER_UPDATED,
                entity_types::MEMBER,
                None,
                Some(changes.into_value()),
            )
            .await?;
        }

        tx.commit().await?;

        Self::find(pool, project_id, user_id)
            .await?
            .ok_or(DbError::Domain(CoreError::Internal(
                "Member vanished after update".to_string(),
            )))
    }

    /// Remove (soft-delete) a membership.
    ///
    /// Rejects removal of the last active member holding full project
    /// management; the membership stays active on rejection.
    pub async fn remove(
        pool: &PgPool,
        project_id: DbId,
        actor: UserId,
        user_id: UserId,
    ) -> Result<(), DbError> {
        let mut tx = pool.begin().await?;

        let exists: Option<DbId> = sqlx::query_scalar(
            "SELECT role_id FROM project_members
             WHERE project_id = $1 AND user_id = $2 AND removed_at IS NULL",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
        if exists.is_none() {
            return Err(DbError::Domain(CoreError::NotFound {
                entity: "Member",
                id: project_id,
            }));
        }

        if Self::count_other_managers(&mut tx, project_id, user_id).await? == 0 {
            return Err(DbError::Domain(CoreError::Conflict(
                "Cannot remove the last member with full project management".to_string(),
            )));
        }

        sqlx::query(
            "UPDATE project_members SET removed_at = NOW()
             WHERE project_id = $1 AND user_id = $2 AND removed_at IS NULL",
        )
        .bind(project_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let changes = ChangeSet::new().note("user_id", json!(user_id)).into_value();
        HistoryRepo::insert_tx(
            &mut tx,
            project_id,
            actor,
            actions::MEMBER_REMOVED,
            entity_types::MEMBER,
            None,
            Some(changes),
        )
        .await?;

        tx.commit().await?;
        tracing::info!(project_id, user_id = %user_id, "Member removed");
        Ok(())
    }

    /// Count active members whose role references the given role id.
    pub async fn count_active_with_role(
        pool: &PgPool,
        role_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)::BIGINT FROM project_members
             WHERE role_id = $1 AND removed_at IS NULL",
        )
        .bind(role_id)
        .fetch_one(pool)
        .await
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    /// Verify a live role exists and belongs to the project.
    async fn ensure_role_in_project(
        tx: &mut Transaction<'_, Postgres>,
        project_id: DbId,
        role_id: DbId,
    ) -> Result<(), DbError> {
        let found: Option<DbId> = sqlx::query_scalar(
            "SELECT id FROM project_roles
             WHERE id = $1 AND project_id = $2 AND removed_at IS NULL",
        )
        .bind(role_id)
        .bind(project_id)
        .fetch_optional(&mut **tx)
        .await?;
        if found.is_none() {
            return Err(DbError::Domain(CoreError::NotFound {
                entity: "Role",
                id: role_id,
            }));
        }
        Ok(())
    }

    /// Returns `true` if the role's resolved permission set contains every
    /// management permission.
    async fn role_grants_management(
        tx: &mut Transaction<'_, Postgres>,
        role_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let perms: Vec<String> = MANAGEMENT_PERMISSIONS.iter().map(|p| p.to_string()).collect();
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT p.name)::BIGINT
             FROM role_policies rp
             JOIN project_policies pol ON pol.id = rp.policy_id AND pol.removed_at IS NULL
             JOIN policy_permissions pp ON pp.policy_id = pol.id
             JOIN permissions p ON p.id = pp.permission_id
             WHERE rp.role_id = $1 AND p.name = ANY($2)",
        )
        .bind(role_id)
        .bind(&perms)
        .fetch_one(&mut **tx)
        .await?;
        Ok(count == MANAGEMENT_PERMISSIONS.len() as i64)
    }

    /// Count active members other than `user_id` whose role grants full
    /// project management.
    async fn count_other_managers(
        tx: &mut Transaction<'_, Postgres>,
        project_id: DbId,
        user_id: UserId,
    ) -> Result<i64, sqlx::Error> {
        let perms: Vec<String> = MANAGEMENT_PERMISSIONS.iter().map(|p| p.to_string()).collect();
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)::BIGINT FROM project_members m
             WHERE m.project_id = $1 AND m.removed_at IS NULL AND m.user_id <> $2
               AND m.role_id IN (
                   SELECT r.id FROM project_roles r
                   JOIN role_policies rp ON rp.role_id = r.id
                   JOIN project_policies pol ON pol.id = rp.policy_id AND pol.removed_at IS NULL
                   JOIN policy_permissions pp ON pp.policy_id = pol.id
                   JOIN permissions p ON p.id = pp.permission_id
                   WHERE r.project_id = $1 AND r.removed_at IS NULL AND p.name = ANY($3)
                   GROUP BY r.id
                   HAVING COUNT(DISTINCT p.name) = CARDINALITY($3)
               )",
        )
        .bind(project_id)
        .bind(user_id)
        .bind(&perms)
        .fetch_one(&mut **tx)
        .await
    }
}
