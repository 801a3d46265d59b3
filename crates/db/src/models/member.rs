//! Project member entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cascade_core::types::{DbId, Timestamp, UserId};

/// A membership row joined with its role name.
///
/// A user has at most one active membership per project; the
/// `(project_id, user_id)` pair is the primary key and removed members are
/// restored in place on re-add.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProjectMember {
    pub project_id: DbId,
    pub user_id: UserId,
    pub role_id: DbId,
    pub role_name: String,
    pub added_by: UserId,
    pub added_at: Timestamp,
    pub removed_at: Option<Timestamp>,
}

/// DTO for adding a member to a project.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMember {
    pub user_id: UserId,
    pub role_id: DbId,
}

/// DTO for changing a member's role.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateMember {
    pub role_id: DbId,
}
