//! Deliverable entity model and DTOs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cascade_core::types::{DbId, Timestamp};

/// A deliverable row from the `deliverables` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Deliverable {
    pub id: DbId,
    pub project_id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub kind: String,
    pub status: String,
    pub planned_date: Option<NaiveDate>,
    pub actual_date: Option<NaiveDate>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub removed_at: Option<Timestamp>,
}

/// DTO for creating a deliverable.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDeliverable {
    pub name: String,
    pub description: Option<String>,
    pub kind: String,
    /// Defaults to `planned` if omitted.
    pub status: Option<String>,
    pub planned_date: Option<NaiveDate>,
    pub actual_date: Option<NaiveDate>,
}

/// DTO for updating a deliverable. Only non-`None` fields are applied.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateDeliverable {
    pub name: Option<String>,
    pub description: Option<String>,
    pub kind: Option<String>,
    pub status: Option<String>,
    pub planned_date: Option<NaiveDate>,
    pub actual_date: Option<NaiveDate>,
}
