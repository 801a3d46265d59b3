//! Repository for the work breakdown structure aggregate.

use sqlx::PgPool;

use cascade_core::types::{CompanyId, DbId};

use crate::models::wbs::{WbsAssociation, WbsProject, WbsStructure};
use crate::repositories::{DeliverableRepo, MilestoneRepo};

/// Provides the WBS aggregation read consumed by the task service.
pub struct WbsRepo;

impl WbsRepo {
    /// Aggregate a project's WBS: metadata, live milestones, live
    /// deliverables, and the associations whose both endpoints are live.
    ///
    /// Returns `None` if the project does not exist in the caller's tenant.
    pub async fn aggregate(
        pool: &PgPool,
        company_id: CompanyId,
        project_id: DbId,
    ) -> Result<Option<WbsStructure>, sqlx::Error> {
        let project = sqlx::query_as::<_, WbsProject>(
            "SELECT id, name, status, company_id FROM projects
             WHERE id = $1 AND company_id = $2 AND removed_at IS NULL",
        )
        .bind(project_id)
        .bind(company_id)
        .fetch_optional(pool)
        .await?;

        let Some(project) = project else {
            return Ok(None);
        };

        let milestones = MilestoneRepo::list(pool, project_id).await?;
        let deliverables = DeliverableRepo::list(pool, project_id).await?;

        let associations = sqlx::query_as::<_, WbsAssociation>(
            "SELECT md.milestone_id, md.deliverable_id
             FROM milestone_deliverables md
             JOIN milestones m ON m.id = md.milestone_id AND m.removed_at IS NULL
             JOIN deliverables d ON d.id = md.deliverable_id AND d.removed_at IS NULL
             WHERE m.project_id = $1
             ORDER BY md.milestone_id, md.deliverable_id",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(Some(WbsStructure {
            project,
            milestones,
            deliverables,
            associations,
        }))
    }
}
