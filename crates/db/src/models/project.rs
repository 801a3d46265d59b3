//! Project entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cascade_core::types::{CompanyId, DbId, Timestamp, UserId};

/// A project row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub company_id: CompanyId,
    pub created_by: UserId,
    pub status: String,
    pub suspended_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub archived_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub removed_at: Option<Timestamp>,
}

/// DTO for creating a new project.
///
/// `company_id` and `created_by` are accepted only so override attempts can
/// be detected and logged; the authoritative values always come from the
/// identity context.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
    pub company_id: Option<CompanyId>,
    pub created_by: Option<UserId>,
}

/// DTO for replacing a project's updatable fields (PUT semantics).
///
/// The whole updatable row is overwritten: an omitted `description` clears
/// the column. Concurrent updates resolve as last write wins.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProject {
    pub name: String,
    pub description: Option<String>,
}

/// DTO for requesting a lifecycle status change.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeStatus {
    pub status: String,
}
