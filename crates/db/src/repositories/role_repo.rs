//! Repository for the `project_roles` table and role-policy links.
//!
//! Default roles are immutable: edits, deletes, and policy link changes are
//! rejected with `Forbidden` regardless of the caller's own permissions.

use serde_json::json;
use sqlx::{PgPool, Postgres, Transaction};

use cascade_core::error::CoreError;
use cascade_core::history::{actions, entity_types, ChangeSet};
use cascade_core::types::{DbId, UserId};

use crate::models::role::{CreateRole, ProjectRole, UpdateRole};
use crate::repositories::HistoryRepo;
use crate::DbError;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, project_id, name, description, is_default, created_at, updated_at, removed_at";

/// Provides CRUD and link operations for project roles.
pub struct RoleRepo;

impl RoleRepo {
    /// List a project's live roles, defaults first.
    pub async fn list(pool: &PgPool, project_id: DbId) -> Result<Vec<ProjectRole>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM project_roles
             WHERE project_id = $1 AND removed_at IS NULL
             ORDER BY is_default DESC, name ASC"
        );
        sqlx::query_as::<_, ProjectRole>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Find a live role within a project.
    pub async fn find(
        pool: &PgPool,
        project_id: DbId,
        role_id: DbId,
    ) -> Result<Option<ProjectRole>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM project_roles
             WHERE id = $1 AND project_id = $2 AND removed_at IS NULL"
        );
        sqlx::query_as::<_, ProjectRole>(&query)
            .bind(role_id)
            .bind(project_id)
            .fetch_optional(pool)
            .await
    }

    /// Create a custom role. Role names are unique among a project's live
    /// roles.
    pub async fn create(
        pool: &PgPool,
        project_id: DbId,
        actor: UserId,
        input: &CreateRole,
    ) -> Result<ProjectRole, DbError> {
        let mut tx = pool.begin().await?;

        Self::ensure_name_free(&mut tx, project_id, &input.name, None).await?;

        let query = format!(
            "INSERT INTO project_roles (project_id, name, description, is_default)
             VALUES ($1, $2, $3, FALSE)
             RETURNING {COLUMNS}"
        );
        let role = sqlx::query_as::<_, ProjectRole>(&query)
            .bind(project_id)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_one(&mut *tx)
            .await?;

        let changes = ChangeSet::new().note("name", json!(role.name)).into_value();
        HistoryRepo::insert_tx(
            &mut tx,
            project_id,
            actor,
            actions::CREATED,
            entity_types::ROLE,
            Some(role.id),
            Some(changes),
        )
        .await?;

        tx.commit().await?;
        Ok(role)
    }

    /// Update a custom role. Only non-`None` fields are applied.
    pub async fn update(
        pool: &PgPool,
        project_id: DbId,
        actor: UserId,
        role_id: DbId,
        input: &UpdateRole,
    ) -> Result<ProjectRole, DbError> {
        let mut tx = pool.begin().await?;

        let old = Self::fetch_mutable(&mut tx, project_id, role_id).await?;

        if let Some(new_name) = &input.name {
            if *new_name != old.name {
                Self::ensure_name_free(&mut tx, project_id, new_name, Some(role_id)).await?;
            }
        }

        let query = format!(
            "UPDATE project_roles SET
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                updated_at = NOW()
             WHERE id = $1 AND project_id = $2 AND removed_at IS NULL
             RETURNING {COLUMNS}"
        );
        let role = sqlx::query_as::<_, ProjectRole>(&query)
            .bind(role_id)
            .bind(project_id)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_one(&mut *tx)
            .await?;

        let changes = ChangeSet::new()
            .field("name", json!(old.name), json!(role.name))
            .field(
                "description",
                json!(old.description),
                json!(role.description),
            );
        if !changes.is_empty() {
            HistoryRepo::insert_tx(
                &mut tx,
                project_id,
                actor,
                actions::UPDATED,
                entity_types::ROLE,
                Some(role_id),
                Some(changes.into_value()),
            )
            .await?;
        }

        tx.commit().await?;
        Ok(role)
    }

    /// Soft-delete a custom role with no active members referencing it.
    pub async fn delete(
        pool: &PgPool,
        project_id: DbId,
        actor: UserId,
        role_id: DbId,
    ) -> Result<(), DbError> {
        let mut tx = pool.begin().await?;

        let role = Self::fetch_mutable(&mut tx, project_id, role_id).await?;

        let members: i64 = sqlx::query_scalar(
            "SELECT COUNT(*)::BIGINT FROM project_members
             WHERE role_id = $1 AND removed_at IS NULL",
        )
        .bind(role_id)
        .fetch_one(&mut *tx)
        .await?;
        if members > 0 {
            return Err(DbError::Domain(CoreError::Conflict(format!(
                "Role is assigned to {members} active member(s)"
            ))));
        }

        sqlx::query(
            "UPDATE project_roles SET removed_at = NOW(), updated_at = NOW()
             WHERE id = $1 AND project_id = $2 AND removed_at IS NULL",
        )
        .bind(role_id)
        .bind(project_id)
        .execute(&mut *tx)
        .await?;

        let changes = ChangeSet::new().note("name", json!(role.name)).into_value();
        HistoryRepo::insert_tx(
            &mut tx,
            project_id,
            actor,
            actions::DELETED,
            entity_types::ROLE,
            Some(role_id),
            Some(changes),
        )
        .await?;

        tx.commit().await?;
        tracing::info!(project_id, role_id, "Role deleted");
        Ok(())
    }

    /// Attach a policy to a custom role.
    pub async fn attach_policy(
        pool: &PgPool,
        project_id: DbId,
        actor: UserId,
        role_id: DbId,
        policy_id: DbId,
    ) -> Result<(), DbError> {
        let mut tx = pool.begin().await?;

        Self::fetch_mutable(&mut tx, project_id, role_id).await?;
        Self::ensure_policy_in_project(&mut tx, project_id, policy_id).await?;

        let result = sqlx::query(
            "INSERT INTO role_policies (role_id, policy_id) VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(role_id)
        .bind(policy_id)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::Domain(CoreError::Conflict(
                "Policy is already attached to this role".to_string(),
            )));
        }

        let changes = ChangeSet::new()
            .note("policy_id", json!(policy_id))
            .into_value();
        HistoryRepo::insert_tx(
            &mut tx,
            project_id,
            actor,
            actions::POLICY_ATTACHED,
            entity_types::ROLE,
            Some(role_id),
            Some(changes),
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Detach a policy from a custom role. Removes only the link row.
    pub async fn detach_policy(
        pool: &PgPool,
        project_id: DbId,
        actor: UserId,
        role_id: DbId,
        policy_id: DbId,
    ) -> Result<(), DbError> {
        let mut tx = pool.begin().await?;

        Self::fetch_mutable(&mut tx, project_id, role_id).await?;

        let result = sqlx::query("DELETE FROM role_policies WHERE role_id = $1 AND policy_id = $2")
            .bind(role_id)
            .bind(policy_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::Domain(CoreError::NotFound {
                entity: "RolePolicy",
                id: policy_id,
            }));
        }

        let changes = ChangeSet::new()
            .note("policy_id", json!(policy_id))
            .into_value();
        HistoryRepo::insert_tx(
            &mut tx,
            project_id,
            actor,
            actions::POLICY_DETACHED,
            entity_types::ROLE,
            Some(role_id),
            Some(changes),
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// List the live policies attached to a role.
    pub async fn list_policies(
        pool: &PgPool,
        role_id: DbId,
    ) -> Result<Vec<crate::models::policy::ProjectPolicy>, sqlx::Error> {
        sqlx::query_as::<_, crate::models::policy::ProjectPolicy>(
            "SELECT p.id, p.project_id, p.name, p.description, p.created_at, p.updated_at, p.removed_at
             FROM project_policies p
             JOIN role_policies rp ON rp.policy_id = p.id
             WHERE rp.role_id = $1 AND p.removed_at IS NULL
             ORDER BY p.name ASC",
        )
        .bind(role_id)
        .fetch_all(pool)
        .await
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    /// Fetch a live role, rejecting default roles with `Forbidden`.
    async fn fetch_mutable(
        tx: &mut Transaction<'_, Postgres>,
        project_id: DbId,
        role_id: DbId,
    ) -> Result<ProjectRole, DbError> {
        let query = format!(
            "SELECT {COLUMNS} FROM project_roles
             WHERE id = $1 AND project_id = $2 AND removed_at IS NULL"
        );
        let role = sqlx::query_as::<_, ProjectRole>(&query)
            .bind(role_id)
            .bind(project_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(DbError::Domain(CoreError::NotFound {
                entity: "Role",
                id: role_id,
            }))?;

        if role.is_default {
            return Err(DbError::Domain(CoreError::Forbidden(
                "Default roles (owner, validator, contributor, viewer) cannot be modified or deleted"
                    .to_string(),
            )));
        }
        Ok(role)
    }

    /// Reject a duplicate live role name within the project.
    async fn ensure_name_free(
        tx: &mut Transaction<'_, Postgres>,
        project_id: DbId,
        name: &str,
        exclude_id: Option<DbId>,
    ) -> Result<(), DbError> {
        let existing: Option<DbId> = sqlx::query_scalar(
            "SELECT id FROM project_roles
             WHERE project_id = $1 AND name = $2 AND removed_at IS NULL
               AND ($3::BIGINT IS NULL OR id <> $3)",
        )
        .bind(project_id)
        .bind(name)
        .bind(exclude_id)
        .fetch_optional(&mut **tx)
        .await?;
        if existing.is_some() {
            return Err(DbError::Domain(CoreError::Conflict(format!(
                "Role '{name}' already exists in this project"
            ))));
        }
        Ok(())
    }

    /// Verify a live policy exists and belongs to the project.
    async fn ensure_policy_in_project(
        tx: &mut Transaction<'_, Postgres>,
        project_id: DbId,
        policy_id: DbId,
    ) -> Result<(), DbError> {
        let found: Option<DbId> = sqlx::query_scalar(
            "SELECT id FROM project_policies
             WHERE id = $1 AND project_id = $2 AND removed_at IS NULL",
        )
        .bind(policy_id)
        .bind(project_id)
        .fetch_optional(&mut **tx)
        .await?;
        if found.is_none() {
            return Err(DbError::Domain(CoreError::NotFound {
                entity: "Policy",
                id: policy_id,
            }));
        }
        Ok(())
    }
}
