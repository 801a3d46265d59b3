//! Repository for the `project_policies` table and policy-permission links.
//!
//! A policy can only be deleted when no live role references it; removing a
//! permission link never touches the catalog row.

use serde_json::json;
use sqlx::{PgPool, Postgres, Transaction};

use cascade_core::error::CoreError;
use cascade_core::history::{actions, entity_types, ChangeSet};
use cascade_core::types::{DbId, UserId};

use crate::models::permission::Permission;
use crate::models::policy::{CreatePolicy, ProjectPolicy, UpdatePolicy};
use crate::repositories::HistoryRepo;
use crate::DbError;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, project_id, name, description, created_at, updated_at, removed_at";

/// Provides CRUD and link operations for project policies.
pub struct PolicyRepo;

impl PolicyRepo {
    /// List a project's live policies.
    pub async fn list(pool: &PgPool, project_id: DbId) -> Result<Vec<ProjectPolicy>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM project_policies
             WHERE project_id = $1 AND removed_at IS NULL
             ORDER BY name ASC"
        );
        sqlx::query_as::<_, ProjectPolicy>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Find a live policy within a project.
    pub async fn find(
        pool: &PgPool,
        project_id: DbId,
        policy_id: DbId,
    ) -> Result<Option<ProjectPolicy>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM project_policies
             WHERE id = $1 AND project_id = $2 AND removed_at IS NULL"
        );
        sqlx::query_as::<_, ProjectPolicy>(&query)
            .bind(policy_id)
            .bind(project_id)
            .fetch_optional(pool)
            .await
    }

    /// Create a policy. Policy names are unique among a project's live
    /// policies.
    pub async fn create(
        pool: &PgPool,
        project_id: DbId,
        actor: UserId,
        input: &CreatePolicy,
    ) -> Result<ProjectPolicy, DbError> {
        let mut tx = pool.begin().await?;

        Self::ensure_name_free(&mut tx, project_id, &input.name, None).await?;

        let query = format!(
            "INSERT INTO project_policies (project_id, name, description)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        let policy = sqlx::query_as::<_, ProjectPolicy>(&query)
            .bind(project_id)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_one(&mut *tx)
            .await?;

        let changes = ChangeSet::new().note("name", json!(policy.name)).into_value();
        HistoryRepo::insert_tx(
            &mut tx,
            project_id,
            actor,
            actions::CREATED,
            entity_types::POLICY,
            Some(policy.id),
            Some(changes),
        )
        .await?;

        tx.commit().await?;
        Ok(policy)
    }

    /// Update a policy. Only non-`None` fields are applied.
    pub async fn update(
        pool: &PgPool,
        project_id: DbId,
        actor: UserId,
        policy_id: DbId,
        input: &UpdatePolicy,
    ) -> Result<ProjectPolicy, DbError> {
        let mut tx = pool.begin().await?;

        let old = Self::fetch_live(&mut tx, project_id, policy_id).await?;

        if let Some(new_name) = &input.name {
            if *new_name != old.name {
                Self::ensure_name_free(&mut tx, project_id, new_name, Some(policy_id)).await?;
            }
        }

        let query = format!(
            "UPDATE project_policies SET
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                updated_at = NOW()
             WHERE id = $1 AND project_id = $2 AND removed_at IS NULL
             RETURNING {COLUMNS}"
        );
        let policy = sqlx::query_as::<_, ProjectPolicy>(&query)
            .bind(policy_id)
            .bind(project_id)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_one(&mut *tx)
            .await?;

        let changes = ChangeSet::new()
            .field("name", json!(old.name), json!(policy.name))
            .field(
                "description",
                json!(old.description),
                json!(policy.description),
            );
        if !changes.is_empty() {
            HistoryRepo::insert_tx(
                &mut tx,
                project_id,
                actor,
                actions::UPDATED,
                entity_types::POLICY,
                Some(policy_id),
                Some(changes.into_value()),
            )
            .await?;
        }

        tx.commit().await?;
        Ok(policy)
    }

    /// Soft-delete a policy with no live role referencing it.
    pub async fn delete(
        pool: &PgPool,
        project_id: DbId,
        actor: UserId,
        policy_id: DbId,
    ) -> Result<(), DbError> {
        let mut tx = pool.begin().await?;

        let policy = Self::fetch_live(&mut tx, project_id, policy_id).await?;

        let roles: i64 = sqlx::query_scalar(
            "SELECT COUNT(*)::BIGINT FROM role_policies rp
             JOIN project_roles r ON r.id = rp.role_id AND r.removed_at IS NULL
             WHERE rp.policy_id = $1",
        )
        .bind(policy_id)
        .fetch_one(&mut *tx)
        .await?;
        if roles > 0 {
            return Err(DbError::Domain(CoreError::Conflict(format!(
                "Policy is referenced by {roles} role(s)"
            ))));
        }

        sqlx::query(
            "UPDATE project_policies SET removed_at = NOW(), updated_at = NOW()
             WHERE id = $1 AND project_id = $2 AND removed_at IS NULL",
        )
        .bind(policy_id)
        .bind(project_id)
        .execute(&mut *tx)
        .await?;

        let changes = ChangeSet::new().note("name", json!(policy.name)).into_value();
        HistoryRepo::insert_tx(
            &mut tx,
            project_id,
            actor,
            actions::DELETED,
            entity_types::POLICY,
            Some(policy_id),
            Some(changes),
        )
        .await?;

        tx.commit().await?;
        tracing::info!(project_id, policy_id, "Policy deleted");
        Ok(())
    }

    /// Attach a catalog permission to a policy.
    pub async fn attach_permission(
        pool: &PgPool,
        project_id: DbId,
        actor: UserId,
        policy_id: DbId,
        permission_id: DbId,
    ) -> Result<(), DbError> {
        let mut tx = pool.begin().await?;

        Self::fetch_live(&mut tx, project_id, policy_id).await?;

        let exists: Option<DbId> =
            sqlx::query_scalar("SELECT id FROM permissions WHERE id = $1")
                .bind(permission_id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Err(DbError::Domain(CoreError::NotFound {
                entity: "Permission",
                id: permission_id,
            }));
        }

        let result = sqlx::query(
            "INSERT INTO policy_permissions (policy_id, permission_id) VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(policy_id)
        .bind(permission_id)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::Domain(CoreError::Conflict(
                "Permission is already attached to this policy".to_string(),
            )));
        }

        let changes = ChangeSet::new()
            .note("permission_id", json!(permission_id))
            .into_value();
        HistoryRepo::insert_tx(
            &mut tx,
            project_id,
            actor,
            actions::PERMISSION_ATTACHED,
            entity_types::POLICY,
            Some(policy_id),
            Some(changes),
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Detach a permission from a policy. Removes only the link row; the
    /// catalog permission is untouched.
    pub async fn detach_permission(
        pool: &PgPool,
        project_id: DbId,
        actor: UserId,
        policy_id: DbId,
        permission_id: DbId,
    ) -> Result<(), DbError> {
        let mut tx = pool.begin().await?;

        Self::fetch_live(&mut tx, project_id, policy_id).await?;

        let result = sqlx::query(
            "DELETE FROM policy_permissions WHERE policy_id = $1 AND permission_id = $2",
        )
        .bind(policy_id)
        .bind(permission_id)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::Domain(CoreError::NotFound {
                entity: "PolicyPermission",
                id: permission_id,
            }));
        }

        let changes = ChangeSet::new()
            .note("permission_id", json!(permission_id))
            .into_value();
        HistoryRepo::insert_tx(
            &mut tx,
            project_id,
            actor,
            actions::PERMISSION_DETACHED,
            entity_types::POLICY,
            Some(policy_id),
            Some(changes),
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// List the permissions attached to a policy.
    pub async fn list_permissions(
        pool: &PgPool,
        policy_id: DbId,
    ) -> Result<Vec<Permission>, sqlx::Error> {
        sqlx::query_as::<_, Permission>(
            "SELECT p.id, p.name, p.description, p.category, p.created_at
             FROM permissions p
             JOIN policy_permissions pp ON pp.permission_id = p.id
             WHERE pp.policy_id = $1
             ORDER BY p.category, p.name",
        )
        .bind(policy_id)
        .fetch_all(pool)
        .await
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    /// Fetch a live policy within a project.
    async fn fetch_live(
        tx: &mut Transaction<'_, Postgres>,
        project_id: DbId,
        policy_id: DbId,
    ) -> Result<ProjectPolicy, DbError> {
        let query = format!(
            "SELECT {COLUMNS} FROM project_policies
             WHERE id = $1 AND project_id = $2 AND removed_at IS NULL"
        );
        sqlx::query_as::<_, ProjectPolicy>(&query)
            .bind(policy_id)
            .bind(project_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(DbError::Domain(CoreError::NotFound {
                entity: "Policy",
                id: policy_id,
            }))
    }

    /// Reject a duplicate live policy name within the project.
    async fn ensure_name_free(
        tx: &mut Transaction<'_, Postgres>,
        project_id: DbId,
        name: &str,
        exclude_id: Option<DbId>,
    ) -> Result<(), DbError> {
        let existing: Option<DbId> = sqlx::query_scalar(
            "SELECT id FROM project_policies
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
                "Policy '{name}' already exists in this project"
            ))));
        }
        Ok(())
    }
}
