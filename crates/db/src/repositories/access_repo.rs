//! Permission graph resolution for access checks.
//!
//! Walks Member -> Role -> Policy -> Permission for a user across one or
//! many projects. `resolve_many` is the batch entry point: it issues a fixed
//! number of grouped queries regardless of how many checks share the same
//! user, so a 100-item batch costs the same round trips as a single check.

use std::collections::{HashMap, HashSet};

use sqlx::PgPool;

use cascade_core::access::MemberGrant;
use cascade_core::types::{CompanyId, DbId, UserId};

/// The resolver's view of a batch of projects for one user.
#[derive(Debug, Default)]
pub struct Resolution {
    /// Project ids that exist, live, in the caller's tenant.
    pub found: HashSet<DbId>,
    /// Grants for the projects where the user has an active membership.
    pub grants: HashMap<DbId, MemberGrant>,
}

impl Resolution {
    /// The grant for a project, or `None` if the user is not an active
    /// member there.
    pub fn grant(&self, project_id: DbId) -> Option<&MemberGrant> {
        self.grants.get(&project_id)
    }

    /// Whether the project resolved inside the caller's tenant.
    pub fn project_found(&self, project_id: DbId) -> bool {
        self.found.contains(&project_id)
    }
}

/// Resolves effective permission sets. Read-only; never mutates state.
pub struct AccessRepo;

impl AccessRepo {
    /// Resolve one `(project, user)` pair.
    pub async fn resolve(
        pool: &PgPool,
        company_id: CompanyId,
        user_id: UserId,
        project_id: DbId,
    ) -> Result<Resolution, sqlx::Error> {
        Self::resolve_many(pool, company_id, user_id, &[project_id]).await
    }

    /// Resolve a user's grants across a set of projects with three grouped
    /// queries: live tenant projects, active memberships with their roles,
    /// and the permission union per role.
    pub async fn resolve_many(
        pool: &PgPool,
        company_id: CompanyId,
        user_id: UserId,
        project_ids: &[DbId],
    ) -> Result<Resolution, sqlx::Error> {
        if project_ids.is_empty() {
            return Ok(Resolution::default());
        }

        let found: HashSet<DbId> = sqlx::query_scalar::<_, DbId>(
            "SELECT id FROM projects
             WHERE company_id = $1 AND id = ANY($2) AND removed_at IS NULL",
        )
        .bind(company_id)
        .bind(project_ids)
        .fetch_all(pool)
        .await?
        .into_iter()
        .collect();

        if found.is_empty() {
            return Ok(Resolution {
                found,
                grants: HashMap::new(),
            });
        }

        // Active memberships joined with their live role. One role per
        // member, so this is one row per resolved project.
        let memberships: Vec<(DbId, DbId, String)> = sqlx::query_as(
            "SELECT m.project_id, m.role_id, r.name
             FROM project_members m
             JOIN project_roles r ON r.id = m.role_id AND r.removed_at IS NULL
             WHERE m.user_id = $1 AND m.project_id = ANY($2) AND m.removed_at IS NULL",
        )
        .bind(user_id)
        .bind(project_ids)
        .fetch_all(pool)
        .await?;

        if memberships.is_empty() {
            return Ok(Resolution {
                found,
                grants: HashMap::new(),
            });
        }

        let role_ids: Vec<DbId> = memberships.iter().map(|(_, role_id, _)| *role_id).collect();

        // The permission union per role: live policies only, deduplicated by
        // collecting into a set.
        let permission_rows: Vec<(DbId, String)> = sqlx::query_as(
            "SELECT rp.role_id, perm.name
             FROM role_policies rp
             JOIN project_policies pol ON pol.id = rp.policy_id AND pol.removed_at IS NULL
             JOIN policy_permissions pp ON pp.policy_id = pol.id
             JOIN permissions perm ON perm.id = pp.permission_id
             WHERE rp.role_id = ANY($1)",
        )
        .bind(&role_ids)
        .fetch_all(pool)
        .await?;

        let mut permissions_by_role: HashMap<DbId, std::collections::BTreeSet<String>> =
            HashMap::new();
        for (role_id, name) in permission_rows {
            permissions_by_role.entry(role_id).or_default().insert(name);
        }

        let grants = memberships
            .into_iter()
            .map(|(project_id, role_id, role_name)| {
                let permissions = permissions_by_role.remove(&role_id).unwrap_or_default();
                (
                    project_id,
                    MemberGrant {
                        role_name,
                        permissions,
                    },
                )
            })
            .collect();

        Ok(Resolution { found, grants })
    }
}
