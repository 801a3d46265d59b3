//! Project role entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cascade_core::types::{DbId, Timestamp};

/// A role row from the `project_roles` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProjectRole {
    pub id: DbId,
    pub project_id: DbId,
    pub name: String,
    pub description: Option<String>,
    /// `true` for the four seeded roles, which cannot be edited or deleted.
    pub is_default: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub removed_at: Option<Timestamp>,
}

/// DTO for creating a custom role. Custom roles are never default.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRole {
    pub name: String,
    pub description: Option<String>,
}

/// DTO for updating a custom role. Only non-`None` fields are applied.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRole {
    pub name: Option<String>,
    pub description: Option<String>,
}
