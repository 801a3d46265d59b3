//! Milestone entity model and DTOs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cascade_core::types::{DbId, Timestamp};

/// A milestone row from the `milestones` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Milestone {
    pub id: DbId,
    pub project_id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub planned_date: Option<NaiveDate>,
    pub actual_date: Option<NaiveDate>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub removed_at: Option<Timestamp>,
}

/// DTO for creating a milestone.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMilestone {
    pub name: String,
    pub description: Option<String>,
    /// Defaults to `planned` if omitted.
    pub status: Option<String>,
    pub planned_date: Option<NaiveDate>,
    pub actual_date: Option<NaiveDate>,
}

/// DTO for updating a milestone. Only non-`None` fields are applied.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateMilestone {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub planned_date: Option<NaiveDate>,
    pub actual_date: Option<NaiveDate>,
}

/// DTO for associating a deliverable with a milestone.
#[derive(Debug, Clone, Deserialize)]
pub struct AssociateDeliverable {
    pub deliverable_id: DbId,
}
