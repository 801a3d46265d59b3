//! Integration tests for milestones, deliverables, their associations, and
//! the WBS aggregate: same-project rule, soft-delete visibility, and the
//! delete/restore round trip with associations intact.

use assert_matches::assert_matches;
use sqlx::PgPool;
use uuid::Uuid;

use cascade_core::error::CoreError;
use cascade_db::models::deliverable::CreateDeliverable;
use cascade_db::models::milestone::CreateMilestone;
use cascade_db::models::project::CreateProject;
use cascade_db::repositories::{
    DeliverableRepo, MilestoneRepo, ProjectRepo, WbsRepo,
};
use cascade_db::DbError;

fn new_project(name: &str) -> CreateProject {
    CreateProject {
        name: name.to_string(),
        description: None,
        company_id: None,
        created_by: None,
    }
}

fn new_milestone(name: &str) -> CreateMilestone {
    CreateMilestone {
        name: name.to_string(),
        description: None,
        status: None,
        planned_date: None,
        actual_date: None,
    }
}

fn new_deliverable(name: &str) -> CreateDeliverable {
    CreateDeliverable {
        name: name.to_string(),
        description: None,
        kind: "document".to_string(),
        status: None,
        planned_date: None,
        actual_date: None,
    }
}

// ---------------------------------------------------------------------------
// Test: cross-project association always conflicts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_cross_project_association_conflicts(pool: PgPool) {
    let company = Uuid::new_v4();
    let actor = Uuid::new_v4();

    let project_a = ProjectRepo::create(&pool, company, actor, &new_project("A"))
        .await
        .unwrap();
    let project_b = ProjectRepo::create(&pool, company, actor, &new_project("B"))
        .await
        .unwrap();

    let milestone = MilestoneRepo::create(&pool, project_a.id, actor, &new_milestone("M"))
        .await
        .unwrap();
    let foreign = DeliverableRepo::create(&pool, project_b.id, actor, &new_deliverable("D"))
        .await
        .unwrap();

    // Both entities exist and are valid, yet the pair is rejected.
    let err = MilestoneRepo::associate_deliverable(
        &pool,
        project_a.id,
        actor,
        milestone.id,
        foreign.id,
    )
    .await
    .unwrap_err();
    assert_matches!(err, DbError::Domain(CoreError::Conflict(msg)) => {
        assert!(msg.contains("same project"));
    });
}

// ---------------------------------------------------------------------------
// Test: duplicate association conflicts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_association_conflicts(pool: PgPool) {
    let company = Uuid::new_v4();
    let actor = Uuid::new_v4();

    let project = ProjectRepo::create(&pool, company, actor, &new_project("Dup"))
        .await
        .unwrap();
    let milestone = MilestoneRepo::create(&pool, project.id, actor, &new_milestone("M"))
        .await
        .unwrap();
    let deliverable = DeliverableRepo::create(&pool, project.id, actor, &new_deliverable("D"))
        .await
        .unwrap();

    MilestoneRepo::associate_deliverable(&pool, project.id, actor, milestone.id, deliverable.id)
        .await
        .unwrap();
    let err = MilestoneRepo::associate_deliverable(
        &pool,
        project.id,
        actor,
        milestone.id,
        deliverable.id,
    )
    .await
    .unwrap_err();
    assert_matches!(err, DbError::Domain(CoreError::Conflict(_)));
}

// ---------------------------------------------------------------------------
// Test: WBS excludes soft-deleted rows; restore brings associations back
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_wbs_soft_delete_restore_round_trip(pool: PgPool) {
    let company = Uuid::new_v4();
    let actor = Uuid::new_v4();

    let project = ProjectRepo::create(&pool, company, actor, &new_project("WBS"))
        .await
        .unwrap();
    let milestone = MilestoneRepo::create(&pool, project.id, actor, &new_milestone("Design"))
        .await
        .unwrap();
    let deliverable =
        DeliverableRepo::create(&pool, project.id, actor, &new_deliverable("Blueprint"))
            .await
            .unwrap();
    MilestoneRepo::associate_deliverable(&pool, project.id, actor, milestone.id, deliverable.id)
        .await
        .unwrap();

    let wbs = WbsRepo::aggregate(&pool, company, project.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(wbs.milestones.len(), 1);
    assert_eq!(wbs.deliverables.len(), 1);
    assert_eq!(wbs.associations.len(), 1);

    // Soft-delete the milestone: it and its association vanish from the WBS.
    MilestoneRepo::soft_delete(&pool, project.id, actor, milestone.id)
        .await
        .unwrap();
    let wbs = WbsRepo::aggregate(&pool, company, project.id)
        .await
        .unwrap()
        .unwrap();
    assert!(wbs.milestones.is_empty());
    assert_eq!(wbs.deliverables.len(), 1);
    assert!(wbs.associations.is_empty());

    // Restore: the association reappears untouched.
    MilestoneRepo::restore(&pool, project.id, actor, milestone.id)
        .await
        .unwrap();
    let wbs = WbsRepo::aggregate(&pool, company, project.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(wbs.milestones.len(), 1);
    assert_eq!(wbs.associations.len(), 1);
    assert_eq!(wbs.associations[0].milestone_id, milestone.id);
    assert_eq!(wbs.associations[0].deliverable_id, deliverable.id);
}

// ---------------------------------------------------------------------------
// Test: WBS is tenant-scoped
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_wbs_is_tenant_scoped(pool: PgPool) {
    let company_a = Uuid::new_v4();
    let company_b = Uuid::new_v4();
    let actor = Uuid::new_v4();

    let project = ProjectRepo::create(&pool, company_a, actor, &new_project("Scoped"))
        .await
        .unwrap();

    let wbs = WbsRepo::aggregate(&pool, company_b, project.id).await.unwrap();
    assert!(wbs.is_none());
}

// ---------------------------------------------------------------------------
// Test: milestones and deliverables stay reachable by direct id after the
// parent project is soft-deleted
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_children_reachable_after_project_delete(pool: PgPool) {
    let company = Uuid::new_v4();
    let actor = Uuid::new_v4();

    let project = ProjectRepo::create(&pool, company, actor, &new_project("Orphaning"))
        .await
        .unwrap();
    let milestone = MilestoneRepo::create(&pool, project.id, actor, &new_milestone("M"))
        .await
        .unwrap();
    let deliverable = DeliverableRepo::create(&pool, project.id, actor, &new_deliverable("D"))
        .await
        .unwrap();

    ProjectRepo::soft_delete(&pool, company, project.id, actor)
        .await
        .unwrap();

    assert!(
        MilestoneRepo::find_by_id_include_removed(&pool, milestone.id)
            .await
            .unwrap()
            .is_some()
    );
    assert!(
        DeliverableRepo::find_by_id_include_removed(&pool, deliverable.id)
            .await
            .unwrap()
            .is_some()
    );
}
