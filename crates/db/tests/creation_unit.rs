//! Integration tests for the atomic project creation unit.
//!
//! Creation must seed the project, the four default roles, the six default
//! policies with their permission links, the creator's owner membership, and
//! one `created` history row -- all in one transaction that leaves nothing
//! behind on rollback.

use sqlx::PgPool;
use uuid::Uuid;

use cascade_core::roles::{ROLE_CONTRIBUTOR, ROLE_OWNER, ROLE_VALIDATOR, ROLE_VIEWER};
use cascade_db::models::project::CreateProject;
use cascade_db::repositories::{HistoryRepo, MemberRepo, PolicyRepo, ProjectRepo, RoleRepo};

fn new_project(name: &str) -> CreateProject {
    CreateProject {
        name: name.to_string(),
        description: Some("creation unit test".to_string()),
        company_id: None,
        created_by: None,
    }
}

// ---------------------------------------------------------------------------
// Test: creation seeds the full default graph
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_seeds_default_graph(pool: PgPool) {
    let company = Uuid::new_v4();
    let creator = Uuid::new_v4();

    let project = ProjectRepo::create(&pool, company, creator, &new_project("Seeded"))
        .await
        .unwrap();

    assert_eq!(project.status, "created");
    assert_eq!(project.company_id, company);
    assert_eq!(project.created_by, creator);

    let roles = RoleRepo::list(&pool, project.id).await.unwrap();
    let role_names: Vec<&str> = roles.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(roles.len(), 4);
    for expected in [ROLE_OWNER, ROLE_VALIDATOR, ROLE_CONTRIBUTOR, ROLE_VIEWER] {
        assert!(role_names.contains(&expected), "missing role {expected}");
    }
    assert!(roles.iter().all(|r| r.is_default));

    let policies = PolicyRepo::list(&pool, project.id).await.unwrap();
    assert_eq!(policies.len(), 6);

    // The creator holds the owner role.
    let members = MemberRepo::list(&pool, project.id).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].user_id, creator);
    assert_eq!(members[0].role_name, ROLE_OWNER);
    assert_eq!(members[0].added_by, creator);

    // Exactly one history row, action `created`.
    let history = HistoryRepo::list(&pool, project.id, &Default::default())
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].action, "created");
    assert_eq!(history[0].entity_type, "project");
    assert_eq!(history[0].user_id, creator);
}

// ---------------------------------------------------------------------------
// Test: the owner role resolves the full permission catalog
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_owner_role_grants_full_catalog(pool: PgPool) {
    let company = Uuid::new_v4();
    let creator = Uuid::new_v4();

    let project = ProjectRepo::create(&pool, company, creator, &new_project("Owner Grants"))
        .await
        .unwrap();

    let resolution =
        cascade_db::repositories::AccessRepo::resolve(&pool, company, creator, project.id)
            .await
            .unwrap();
    let grant = resolution.grant(project.id).expect("creator must resolve");
    assert_eq!(grant.role_name, ROLE_OWNER);
    assert_eq!(grant.permissions.len(), 10);
}

// ---------------------------------------------------------------------------
// Test: an uncommitted creation unit leaves zero rows behind
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_uncommitted_creation_rolls_back_everything(pool: PgPool) {
    let company = Uuid::new_v4();
    let creator = Uuid::new_v4();

    {
        let mut tx = pool.begin().await.unwrap();
        let project =
            ProjectRepo::create_in_tx(&mut tx, company, creator, &new_project("Phantom"))
                .await
                .unwrap();
        assert!(project.id > 0);
        // Dropped without commit: the whole unit must vanish.
    }

    let projects = ProjectRepo::list(&pool, company).await.unwrap();
    assert!(projects.is_empty(), "no project may survive the rollback");

    let orphan_roles: i64 =
        sqlx::query_scalar("SELECT COUNT(*)::BIGINT FROM project_roles")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(orphan_roles, 0, "no roles may survive the rollback");

    let orphan_policies: i64 =
        sqlx::query_scalar("SELECT COUNT(*)::BIGINT FROM project_policies")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(orphan_policies, 0, "no policies may survive the rollback");

    let orphan_history: i64 =
        sqlx::query_scalar("SELECT COUNT(*)::BIGINT FROM project_history")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(orphan_history, 0, "no history rows may survive the rollback");
}

// ---------------------------------------------------------------------------
// Test: tenant scoping -- another company's project is invisible
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_project_invisible_across_tenants(pool: PgPool) {
    let company_a = Uuid::new_v4();
    let company_b = Uuid::new_v4();
    let creator = Uuid::new_v4();

    let project = ProjectRepo::create(&pool, company_a, creator, &new_project("Tenant A"))
        .await
        .unwrap();

    let found = ProjectRepo::find_scoped(&pool, company_b, project.id)
        .await
        .unwrap();
    assert!(found.is_none(), "cross-tenant lookup must see nothing");

    let listed = ProjectRepo::list(&pool, company_b).await.unwrap();
    assert!(listed.is_empty());
}
