//! Repository for the `projects` table and the project lifecycle.
//!
//! All lookups are scoped by `company_id`; a project belonging to another
//! tenant is indistinguishable from a missing one. Creation seeds the default
//! role/policy graph and the owner membership in one transaction, and every
//! mutation writes its history row inside the same transaction.

use std::collections::HashMap;

use serde_json::json;
use sqlx::{PgPool, Postgres, Transaction};

use cascade_core::error::CoreError;
use cascade_core::history::{actions, entity_types, ChangeSet};
use cascade_core::lifecycle::{
    validate_archive, validate_restore, validate_transition, ProjectStatus, RESTORE_TARGET,
};
use cascade_core::roles::{DEFAULT_POLICIES, DEFAULT_ROLES, ROLE_OWNER};
use cascade_core::types::{CompanyId, DbId, UserId};

use crate::models::project::{CreateProject, Project, UpdateProject};
use crate::repositories::HistoryRepo;
use crate::DbError;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, description, company_id, created_by, status, \
     suspended_at, completed_at, archived_at, created_at, updated_at, removed_at";

/// Provides CRUD and lifecycle operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Create a project with its default authorization graph.
    ///
    /// One atomic unit: the project row, the six default policies, the four
    /// default roles with their policy links, an active owner membership for
    /// the creator, and the `created` history entry. Any failure rolls back
    /// the whole unit.
    pub async fn create(
        pool: &PgPool,
        company_id: CompanyId,
        created_by: UserId,
        input: &CreateProject,
    ) -> Result<Project, DbError> {
        let mut tx = pool.begin().await?;
        let project = Self::create_in_tx(&mut tx, company_id, created_by, input).await?;
        tx.commit().await?;

        tracing::info!(
            project_id = project.id,
            company_id = %company_id,
            created_by = %created_by,
            "Project created"
        );
        Ok(project)
    }

    /// Insert the full creation unit inside an existing transaction.
    pub async fn create_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        company_id: CompanyId,
        created_by: UserId,
        input: &CreateProject,
    ) -> Result<Project, DbError> {
        let query = format!(
            "INSERT INTO projects (name, description, company_id, created_by)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        let project = sqlx::query_as::<_, Project>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(company_id)
            .bind(created_by)
            .fetch_one(&mut **tx)
            .await?;

        let policy_ids = Self::seed_default_policies(tx, project.id).await?;
        let owner_role_id = Self::seed_default_roles(tx, project.id, &policy_ids).await?;

        // The creator becomes the project's first (and initially only) owner.
        sqlx::query(
            "INSERT INTO project_members (project_id, user_id, role_id, added_by)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(project.id)
        .bind(created_by)
        .bind(owner_role_id)
        .bind(created_by)
        .execute(&mut **tx)
        .await?;

        let changes = ChangeSet::new()
            .note("name", json!(project.name))
            .note("status", json!(project.status))
            .into_value();
        HistoryRepo::insert_tx(
            tx,
            project.id,
            created_by,
            actions::CREATED,
            entity_types::PROJECT,
            Some(project.id),
            Some(changes),
        )
        .await?;

        Ok(project)
    }

    /// Insert the six default policies with their permission links.
    ///
    /// Returns a map of policy name to id for role linking.
    async fn seed_default_policies(
        tx: &mut Transaction<'_, Postgres>,
        project_id: DbId,
    ) -> Result<HashMap<&'static str, DbId>, sqlx::Error> {
        // Resolve catalog permission names to ids once.
        let rows: Vec<(DbId, String)> =
            sqlx::query_as("SELECT id, name FROM permissions")
                .fetch_all(&mut **tx)
                .await?;
        let permission_ids: HashMap<String, DbId> =
            rows.into_iter().map(|(id, name)| (name, id)).collect();

        let mut policy_ids = HashMap::new();
        for policy in DEFAULT_POLICIES {
            let policy_id: DbId = sqlx::query_scalar(
                "INSERT INTO project_policies (project_id, name, description)
                 VALUES ($1, $2, $3)
                 RETURNING id",
            )
            .bind(project_id)
            .bind(policy.name)
            .bind(policy.description)
            .fetch_one(&mut **tx)
            .await?;

            for perm in policy.permissions {
                let Some(permission_id) = permission_ids.get(*perm) else {
                    // The catalog seed and the core constants have diverged.
                    return Err(sqlx::Error::RowNotFound);
                };
                sqlx::query(
                    "INSERT INTO policy_permissions (policy_id, permission_id) VALUES ($1, $2)",
                )
                .bind(policy_id)
                .bind(permission_id)
                .execute(&mut **tx)
                .await?;
            }

            policy_ids.insert(policy.name, policy_id);
        }
        Ok(policy_ids)
    }

    /// Insert the four default roles with their policy links.
    ///
    /// Returns the owner role id for the creator's membership.
    async fn seed_default_roles(
        tx: &mut Transaction<'_, Postgres>,
        project_id: DbId,
        policy_ids: &HashMap<&'static str, DbId>,
    ) -> Result<DbId, sqlx::Error> {
        let mut owner_role_id = None;
        for role in DEFAULT_ROLES {
            let role_id: DbId = sqlx::query_scalar(
                "INSERT INTO project_roles (project_id, name, description, is_default)
                 VALUES ($1, $2, $3, TRUE)
                 RETURNING id",
            )
            .bind(project_id)
            .bind(role.name)
            .bind(role.description)
            .fetch_one(&mut **tx)
            .await?;

            for policy in role.policies {
                let Some(policy_id) = policy_ids.get(policy) else {
                    return Err(sqlx::Error::RowNotFound);
                };
                sqlx::query("INSERT INTO role_policies (role_id, policy_id) VALUES ($1, $2)")
                    .bind(role_id)
                    .bind(policy_id)
                    .execute(&mut **tx)
                    .await?;
            }

            if role.name == ROLE_OWNER {
                owner_role_id = Some(role_id);
            }
        }
        // DEFAULT_ROLES always contains the owner role.
        owner_role_id.ok_or(sqlx::Error::RowNotFound)
    }

    /// Find a live project within the caller's tenant.
    pub async fn find_scoped(
        pool: &PgPool,
        company_id: CompanyId,
        id: DbId,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects
             WHERE id = $1 AND company_id = $2 AND removed_at IS NULL"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(company_id)
            .fetch_optional(pool)
            .await
    }

    /// Find a project within the caller's tenant, including soft-deleted
    /// rows. Used by recover and by history reads.
    pub async fn find_scoped_include_removed(
        pool: &PgPool,
        company_id: CompanyId,
        id: DbId,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1 AND company_id = $2");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(company_id)
            .fetch_optional(pool)
            .await
    }

    /// List the tenant's live projects, most recently created first.
    pub async fn list(pool: &PgPool, company_id: CompanyId) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects
             WHERE company_id = $1 AND removed_at IS NULL
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(company_id)
            .fetch_all(pool)
            .await
    }

    /// Replace a project's updatable fields (whole-row overwrite, last write
    /// wins) and record the field-level diff in one history entry.
    pub async fn update(
        pool: &PgPool,
        company_id: CompanyId,
        id: DbId,
        actor: UserId,
        input: &UpdateProject,
    ) -> Result<Project, DbError> {
        let mut tx = pool.begin().await?;

        let old = Self::fetch_scoped_tx(&mut tx, company_id, id).await?;

        let query = format!(
            "UPDATE projects SET name = $3, description = $4, updated_at = NOW()
             WHERE id = $1 AND company_id = $2 AND removed_at IS NULL
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(company_id)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_one(&mut *tx)
            .await?;

        let changes = ChangeSet::new()
            .field("name", json!(old.name), json!(updated.name))
            .field(
                "description",
                json!(old.description),
                json!(updated.description),
            );
        if !changes.is_empty() {
            HistoryRepo::insert_tx(
                &mut tx,
                id,
                actor,
                actions::UPDATED,
                entity_types::PROJECT,
                Some(id),
                Some(changes.into_value()),
            )
            .await?;
        }

        tx.commit().await?;
        Ok(updated)
    }

    /// Apply a lifecycle transition, stamping entry timestamps and writing
    /// the `status_changed` history entry atomically.
    pub async fn change_status(
        pool: &PgPool,
        company_id: CompanyId,
        id: DbId,
        actor: UserId,
        target: ProjectStatus,
    ) -> Result<Project, DbError> {
        let mut tx = pool.begin().await?;

        let project = Self::fetch_scoped_tx(&mut tx, company_id, id).await?;
        let current: ProjectStatus = project.status.parse().map_err(DbError::Domain)?;
        validate_transition(current, target).map_err(DbError::Domain)?;

        let updated =
            Self::write_status_tx(&mut tx, company_id, id, current, target).await?;

        let changes = ChangeSet::new()
            .note("old_status", json!(current.as_str()))
            .note("new_status", json!(target.as_str()))
            .into_value();
        HistoryRepo::insert_tx(
            &mut tx,
            id,
            actor,
            actions::STATUS_CHANGED,
            entity_types::PROJECT,
            Some(id),
            Some(changes),
        )
        .await?;

        tx.commit().await?;
        tracing::info!(
            project_id = id,
            from = %current,
            to = %target,
            "Project status changed"
        );
        Ok(updated)
    }

    /// Archive a completed project.
    pub async fn archive(
        pool: &PgPool,
        company_id: CompanyId,
        id: DbId,
        actor: UserId,
    ) -> Result<Project, DbError> {
        let mut tx = pool.begin().await?;

        let project = Self::fetch_scoped_tx(&mut tx, company_id, id).await?;
        let current: ProjectStatus = project.status.parse().map_err(DbError::Domain)?;
        validate_archive(current).map_err(DbError::Domain)?;

        let updated =
            Self::write_status_tx(&mut tx, company_id, id, current, ProjectStatus::Archived)
                .await?;

        let changes = ChangeSet::new()
            .note("old_status", json!(current.as_str()))
            .note("new_status", json!(ProjectStatus::Archived.as_str()))
            .into_value();
        HistoryRepo::insert_tx(
            &mut tx,
            id,
            actor,
            actions::ARCHIVED,
            entity_types::PROJECT,
            Some(id),
            Some(changes),
        )
        .await?;

        tx.commit().await?;
        tracing::info!(project_id = id, "Project archived");
        Ok(updated)
    }

    /// Restore an archived project to active, clearing `archived_at`.
    pub async fn restore(
        pool: &PgPool,
        company_id: CompanyId,
        id: DbId,
        actor: UserId,
    ) -> Result<Project, DbError> {
        let mut tx = pool.begin().await?;

        let project = Self::fetch_scoped_tx(&mut tx, company_id, id).await?;
        let current: ProjectStatus = project.status.parse().map_err(DbError::Domain)?;
        validate_restore(current).map_err(DbError::Domain)?;

        let query = format!(
            "UPDATE projects SET status = $3, archived_at = NULL, updated_at = NOW()
             WHERE id = $1 AND company_id = $2 AND removed_at IS NULL
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(company_id)
            .bind(RESTORE_TARGET.as_str())
            .fetch_one(&mut *tx)
            .await?;

        let changes = ChangeSet::new()
            .note("old_status", json!(current.as_str()))
            .note("new_status", json!(RESTORE_TARGET.as_str()))
            .into_value();
        HistoryRepo::insert_tx(
            &mut tx,
            id,
            actor,
            actions::RESTORED,
            entity_types::PROJECT,
            Some(id),
            Some(changes),
        )
        .await?;

        tx.commit().await?;
        tracing::info!(project_id = id, "Project restored from archive");
        Ok(updated)
    }

    /// Soft-delete a project.
    pub async fn soft_delete(
        pool: &PgPool,
        company_id: CompanyId,
        id: DbId,
        actor: UserId,
    ) -> Result<(), DbError> {
        let mut tx = pool.begin().await?;

        Self::fetch_scoped_tx(&mut tx, company_id, id).await?;

        let removed_at: cascade_core::types::Timestamp = sqlx::query_scalar(
            "UPDATE projects SET removed_at = NOW(), updated_at = NOW()
             WHERE id = $1 AND company_id = $2 AND removed_at IS NULL
             RETURNING removed_at",
        )
        .bind(id)
        .bind(company_id)
        .fetch_one(&mut *tx)
        .await?;

        let changes = ChangeSet::new()
            .note("removed_at", json!(removed_at))
            .into_value();
        HistoryRepo::insert_tx(
            &mut tx,
            id,
            actor,
            actions::DELETED,
            entity_types::PROJECT,
            Some(id),
            Some(changes),
        )
        .await?;

        tx.commit().await?;
        tracing::info!(project_id = id, "Project soft-deleted");
        Ok(())
    }

    /// Recover a soft-deleted project.
    pub async fn recover(
        pool: &PgPool,
        company_id: CompanyId,
        id: DbId,
        actor: UserId,
    ) -> Result<Project, DbError> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE projects SET removed_at = NULL, updated_at = NOW()
             WHERE id = $1 AND company_id = $2 AND removed_at IS NOT NULL
             RETURNING {COLUMNS}"
        );
        let project = sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(company_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(DbError::Domain(CoreError::NotFound {
                entity: "Project",
                id,
            }))?;

        HistoryRepo::insert_tx(
            &mut tx,
            id,
            actor,
            actions::RECOVERED,
            entity_types::PROJECT,
            Some(id),
            None,
        )
        .await?;

        tx.commit().await?;
        tracing::info!(project_id = id, "Project recovered");
        Ok(project)
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    /// Fetch a live, tenant-scoped project inside a transaction, mapping
    /// absence (or another tenant's project) to `NotFound`.
    async fn fetch_scoped_tx(
        tx: &mut Transaction<'_, Postgres>,
        company_id: CompanyId,
        id: DbId,
    ) -> Result<Project, DbError> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects
             WHERE id = $1 AND company_id = $2 AND removed_at IS NULL"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(company_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(DbError::Domain(CoreError::NotFound {
                entity: "Project",
                id,
            }))
    }

    /// Write a status change with its entry-timestamp side effects.
    async fn write_status_tx(
        tx: &mut Transaction<'_, Postgres>,
        company_id: CompanyId,
        id: DbId,
        from: ProjectStatus,
        to: ProjectStatus,
    ) -> Result<Project, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET status = $3,
                suspended_at = CASE
                    WHEN $3 = 'suspended' THEN NOW()
                    WHEN $4 = 'suspended' THEN NULL
                    ELSE suspended_at END,
                completed_at = CASE WHEN $3 = 'completed' THEN NOW() ELSE completed_at END,
                archived_at  = CASE WHEN $3 = 'archived'  THEN NOW() ELSE archived_at  END,
                updated_at = NOW()
             WHERE id = $1 AND company_id = $2 AND removed_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(company_id)
            .bind(to.as_str())
            .bind(from.as_str())
            .fetch_one(&mut **tx)
            .await
    }
}
