//! Project policy entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cascade_core::types::{DbId, Timestamp};

/// A policy row from the `project_policies` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProjectPolicy {
    pub id: DbId,
    pub project_id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub removed_at: Option<Timestamp>,
}

/// DTO for creating a policy.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePolicy {
    pub name: String,
    pub description: Option<String>,
}

/// DTO for updating a policy. Only non-`None` fields are applied.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePolicy {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// DTO for attaching a policy to a role.
#[derive(Debug, Clone, Deserialize)]
pub struct AttachPolicy {
    pub policy_id: DbId,
}

/// DTO for attaching a permission to a policy.
#[derive(Debug, Clone, Deserialize)]
pub struct AttachPermission {
    pub permission_id: DbId,
}
