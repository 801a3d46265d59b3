//! Integration tests for the audit trail: append-only coupling, filtering,
//! ordering, and pagination.

use sqlx::PgPool;
use uuid::Uuid;

use cascade_core::lifecycle::ProjectStatus;
use cascade_db::models::history::HistoryQuery;
use cascade_db::models::milestone::CreateMilestone;
use cascade_db::models::project::CreateProject;
use cascade_db::models::role::CreateRole;
use cascade_db::repositories::{HistoryRepo, MilestoneRepo, ProjectRepo, RoleRepo};

fn new_project(name: &str) -> CreateProject {
    CreateProject {
        name: name.to_string(),
        description: None,
        company_id: None,
        created_by: None,
    }
}

// ---------------------------------------------------------------------------
// Test: every mutation writes exactly one history row
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_one_row_per_mutation(pool: PgPool) {
    let company = Uuid::new_v4();
    let actor = Uuid::new_v4();

    let project = ProjectRepo::create(&pool, company, actor, &new_project("Ledger"))
        .await
        .unwrap();
    ProjectRepo::change_status(&pool, company, project.id, actor, ProjectStatus::Initialized)
        .await
        .unwrap();
    RoleRepo::create(
        &pool,
        project.id,
        actor,
        &CreateRole {
            name: "auditor".to_string(),
            description: None,
        },
    )
    .await
    .unwrap();
    MilestoneRepo::create(
        &pool,
        project.id,
        actor,
        &CreateMilestone {
            name: "Kickoff".to_string(),
            description: None,
            status: None,
            planned_date: None,
            actual_date: None,
        },
    )
    .await
    .unwrap();

    let total = HistoryRepo::count(&pool, project.id, &HistoryQuery::default())
        .await
        .unwrap();
    assert_eq!(total, 4, "created + status_changed + role + milestone");
}

// ---------------------------------------------------------------------------
// Test: entity_type filtering
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_entity_type_filter(pool: PgPool) {
    let company = Uuid::new_v4();
    let actor = Uuid::new_v4();

    let project = ProjectRepo::create(&pool, company, actor, &new_project("Filtered"))
        .await
        .unwrap();
    RoleRepo::create(
        &pool,
        project.id,
        actor,
        &CreateRole {
            name: "clerk".to_string(),
            description: None,
        },
    )
    .await
    .unwrap();

    let roles_only = HistoryRepo::list(
        &pool,
        project.id,
        &HistoryQuery {
            entity_type: Some("role".to_string()),
            limit: None,
            offset: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(roles_only.len(), 1);
    assert_eq!(roles_only[0].entity_type, "role");

    let projects_only = HistoryRepo::count(
        &pool,
        project.id,
        &HistoryQuery {
            entity_type: Some("project".to_string()),
            limit: None,
            offset: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(projects_only, 1);
}

// ---------------------------------------------------------------------------
// Test: reverse-chronological order with pagination
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_ordering_and_pagination(pool: PgPool) {
    let company = Uuid::new_v4();
    let actor = Uuid::new_v4();

    let project = ProjectRepo::create(&pool, company, actor, &new_project("Paged"))
        .await
        .unwrap();
    for status in [
        ProjectStatus::Initialized,
        ProjectStatus::Consultation,
        ProjectStatus::Active,
    ] {
        ProjectRepo::change_status(&pool, company, project.id, actor, status)
            .await
            .unwrap();
    }

    let all = HistoryRepo::list(&pool, project.id, &HistoryQuery::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 4);
    // Newest first.
    for pair in all.windows(2) {
        assert!(pair[0].created_at >= pair[1].created_at);
    }
    assert_eq!(all.last().unwrap().action, "created");

    // Pagination walks the same order without gaps.
    let page1 = HistoryRepo::list(
        &pool,
        project.id,
        &HistoryQuery {
            entity_type: None,
            limit: Some(2),
            offset: Some(0),
        },
    )
    .await
    .unwrap();
    let page2 = HistoryRepo::list(
        &pool,
        project.id,
        &HistoryQuery {
            entity_type: None,
            limit: Some(2),
            offset: Some(2),
        },
    )
    .await
    .unwrap();
    assert_eq!(page1.len(), 2);
    assert_eq!(page2.len(), 2);
    let paged_ids: Vec<i64> = page1.iter().chain(page2.iter()).map(|e| e.id).collect();
    let all_ids: Vec<i64> = all.iter().map(|e| e.id).collect();
    assert_eq!(paged_ids, all_ids);
}
