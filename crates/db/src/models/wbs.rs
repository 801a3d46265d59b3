//! Work breakdown structure aggregate, consumed by the task service.

use serde::Serialize;
use sqlx::FromRow;

use cascade_core::types::{CompanyId, DbId};

use crate::models::deliverable::Deliverable;
use crate::models::milestone::Milestone;

/// Project metadata included in the WBS aggregate.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WbsProject {
    pub id: DbId,
    pub name: String,
    pub status: String,
    pub company_id: CompanyId,
}

/// A live milestone-deliverable association.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WbsAssociation {
    pub milestone_id: DbId,
    pub deliverable_id: DbId,
}

/// The full WBS aggregate: project metadata plus live milestones,
/// deliverables, and associations. Soft-deleted rows are excluded.
#[derive(Debug, Clone, Serialize)]
pub struct WbsStructure {
    pub project: WbsProject,
    pub milestones: Vec<Milestone>,
    pub deliverables: Vec<Deliverable>,
    pub associations: Vec<WbsAssociation>,
}
