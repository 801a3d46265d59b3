//! Integration tests for the project lifecycle state machine against the
//! database: transitions, entry timestamps, archive/restore preconditions,
//! soft delete/recover, and the coupled history entries.

use assert_matches::assert_matches;
use sqlx::PgPool;
use uuid::Uuid;

use cascade_core::error::CoreError;
use cascade_core::lifecycle::ProjectStatus;
use cascade_db::models::history::HistoryQuery;
use cascade_db::models::project::CreateProject;
use cascade_db::repositories::{HistoryRepo, ProjectRepo};
use cascade_db::DbError;

fn new_project(name: &str) -> CreateProject {
    CreateProject {
        name: name.to_string(),
        description: None,
        company_id: None,
        created_by: None,
    }
}

/// Walk a project along the happy path to the given status.
async fn drive_to(
    pool: &PgPool,
    company: Uuid,
    id: i64,
    actor: Uuid,
    target: ProjectStatus,
) {
    let path = [
        ProjectStatus::Initialized,
        ProjectStatus::Consultation,
        ProjectStatus::Active,
        ProjectStatus::Completed,
    ];
    for status in path {
        ProjectRepo::change_status(pool, company, id, actor, status)
            .await
            .unwrap();
        if status == target {
            return;
        }
    }
    panic!("target {target} is not on the happy path");
}

// ---------------------------------------------------------------------------
// Test: valid transitions succeed and stamp entry timestamps
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_happy_path_stamps_timestamps(pool: PgPool) {
    let company = Uuid::new_v4();
    let actor = Uuid::new_v4();
    let project = ProjectRepo::create(&pool, company, actor, &new_project("Walk"))
        .await
        .unwrap();

    drive_to(&pool, company, project.id, actor, ProjectStatus::Active).await;

    let suspended =
        ProjectRepo::change_status(&pool, company, project.id, actor, ProjectStatus::Suspended)
            .await
            .unwrap();
    assert_eq!(suspended.status, "suspended");
    assert!(suspended.suspended_at.is_some());

    let resumed =
        ProjectRepo::change_status(&pool, company, project.id, actor, ProjectStatus::Active)
            .await
            .unwrap();
    assert_eq!(resumed.status, "active");
    assert!(resumed.suspended_at.is_none(), "leaving suspended clears the stamp");

    let completed =
        ProjectRepo::change_status(&pool, company, project.id, actor, ProjectStatus::Completed)
            .await
            .unwrap();
    assert!(completed.completed_at.is_some());
}

// ---------------------------------------------------------------------------
// Test: an invalid edge fails with InvalidTransition naming both endpoints
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_invalid_transition_rejected(pool: PgPool) {
    let company = Uuid::new_v4();
    let actor = Uuid::new_v4();
    let project = ProjectRepo::create(&pool, company, actor, &new_project("Stuck"))
        .await
        .unwrap();

    let err =
        ProjectRepo::change_status(&pool, company, project.id, actor, ProjectStatus::Completed)
            .await
            .unwrap_err();
    assert_matches!(
        err,
        DbError::Domain(CoreError::InvalidTransition {
            from: ProjectStatus::Created,
            to: ProjectStatus::Completed
        })
    );

    // No status change and no history row beyond the creation entry.
    let unchanged = ProjectRepo::find_scoped(&pool, company, project.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged.status, "created");
    let total = HistoryRepo::count(&pool, project.id, &HistoryQuery::default())
        .await
        .unwrap();
    assert_eq!(total, 1);
}

// ---------------------------------------------------------------------------
// Test: archive requires completed
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_archive_requires_completed(pool: PgPool) {
    let company = Uuid::new_v4();
    let actor = Uuid::new_v4();
    let project = ProjectRepo::create(&pool, company, actor, &new_project("Early"))
        .await
        .unwrap();

    let err = ProjectRepo::archive(&pool, company, project.id, actor)
        .await
        .unwrap_err();
    assert_matches!(err, DbError::Domain(CoreError::PreconditionFailed(_)));

    drive_to(&pool, company, project.id, actor, ProjectStatus::Completed).await;

    let archived = ProjectRepo::archive(&pool, company, project.id, actor)
        .await
        .unwrap();
    assert_eq!(archived.status, "archived");
    assert!(archived.archived_at.is_some());
}

// ---------------------------------------------------------------------------
// Test: restore requires archived and returns the project to active
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_restore_requires_archived(pool: PgPool) {
    let company = Uuid::new_v4();
    let actor = Uuid::new_v4();
    let project = ProjectRepo::create(&pool, company, actor, &new_project("Comeback"))
        .await
        .unwrap();

    let err = ProjectRepo::restore(&pool, company, project.id, actor)
        .await
        .unwrap_err();
    assert_matches!(err, DbError::Domain(CoreError::PreconditionFailed(_)));

    drive_to(&pool, company, project.id, actor, ProjectStatus::Completed).await;
    ProjectRepo::archive(&pool, company, project.id, actor)
        .await
        .unwrap();

    let restored = ProjectRepo::restore(&pool, company, project.id, actor)
        .await
        .unwrap();
    assert_eq!(restored.status, "active");
    assert!(restored.archived_at.is_none());
}

// ---------------------------------------------------------------------------
// Test: each transition writes exactly one history row with old/new status
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_transitions_write_status_history(pool: PgPool) {
    let company = Uuid::new_v4();
    let actor = Uuid::new_v4();
    let project = ProjectRepo::create(&pool, company, actor, &new_project("Audited"))
        .await
        .unwrap();

    ProjectRepo::change_status(&pool, company, project.id, actor, ProjectStatus::Initialized)
        .await
        .unwrap();

    let entries = HistoryRepo::list(&pool, project.id, &HistoryQuery::default())
        .await
        .unwrap();
    // Newest first: status_changed then created.
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].action, "status_changed");
    let changes = entries[0].changes.as_ref().unwrap();
    assert_eq!(changes["old_status"], "created");
    assert_eq!(changes["new_status"], "initialized");
}

// ---------------------------------------------------------------------------
// Test: whole-row update records a field-level diff, once
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_writes_single_diff_entry(pool: PgPool) {
    let company = Uuid::new_v4();
    let actor = Uuid::new_v4();
    let project = ProjectRepo::create(&pool, company, actor, &new_project("Before"))
        .await
        .unwrap();

    let updated = ProjectRepo::update(
        &pool,
        company,
        project.id,
        actor,
        &cascade_db::models::project::UpdateProject {
            name: "After".to_string(),
            description: Some("now described".to_string()),
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.name, "After");

    let entries = HistoryRepo::list(&pool, project.id, &HistoryQuery::default())
        .await
        .unwrap();
    assert_eq!(entries.len(), 2, "one created + one updated entry");
    assert_eq!(entries[0].action, "updated");
    let changes = entries[0].changes.as_ref().unwrap();
    assert_eq!(changes["name"]["old"], "Before");
    assert_eq!(changes["name"]["new"], "After");
    assert_eq!(changes["description"]["new"], "now described");
}

// ---------------------------------------------------------------------------
// Test: soft delete hides, recover brings back, both audited
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_soft_delete_and_recover(pool: PgPool) {
    let company = Uuid::new_v4();
    let actor = Uuid::new_v4();
    let project = ProjectRepo::create(&pool, company, actor, &new_project("Phoenix"))
        .await
        .unwrap();

    ProjectRepo::soft_delete(&pool, company, project.id, actor)
        .await
        .unwrap();
    assert!(ProjectRepo::find_scoped(&pool, company, project.id)
        .await
        .unwrap()
        .is_none());

    // Still reachable when removed rows are included (audit reads).
    assert!(
        ProjectRepo::find_scoped_include_removed(&pool, company, project.id)
            .await
            .unwrap()
            .is_some()
    );

    let recovered = ProjectRepo::recover(&pool, company, project.id, actor)
        .await
        .unwrap();
    assert!(recovered.removed_at.is_none());

    let entries = HistoryRepo::list(&pool, project.id, &HistoryQuery::default())
        .await
        .unwrap();
    let actions: Vec<&str> = entries.iter().map(|e| e.action.as_str()).collect();
    assert_eq!(actions, vec!["recovered", "deleted", "created"]);
}

// ---------------------------------------------------------------------------
// Test: lost is terminal
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_lost_is_terminal(pool: PgPool) {
    let company = Uuid::new_v4();
    let actor = Uuid::new_v4();
    let project = ProjectRepo::create(&pool, company, actor, &new_project("No Bid"))
        .await
        .unwrap();

    ProjectRepo::change_status(&pool, company, project.id, actor, ProjectStatus::Initialized)
        .await
        .unwrap();
    ProjectRepo::change_status(&pool, company, project.id, actor, ProjectStatus::Consultation)
        .await
        .unwrap();
    ProjectRepo::change_status(&pool, company, project.id, actor, ProjectStatus::Lost)
        .await
        .unwrap();

    let err =
        ProjectRepo::change_status(&pool, company, project.id, actor, ProjectStatus::Active)
            .await
            .unwrap_err();
    assert_matches!(err, DbError::Domain(CoreError::InvalidTransition { .. }));
}
