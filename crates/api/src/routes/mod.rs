pub mod access;
pub mod health;
pub mod project;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /access/check                                        single access check (POST)
/// /access/check-batch                                  batched access checks (POST)
///
/// /permissions                                         global catalog (GET)
///
/// /projects                                            list, create
/// /projects/{id}                                       get, update, delete
/// /projects/{id}/recover                               undo soft delete (POST)
/// /projects/{id}/status                                lifecycle transition (POST)
/// /projects/{id}/archive                               archive completed (POST)
/// /projects/{id}/restore                               restore archived (POST)
/// /projects/{id}/history                               audit trail (GET)
/// /projects/{id}/wbs                                   WBS aggregate (GET)
///
/// /projects/{project_id}/members                       list, add
/// /projects/{project_id}/members/{user_id}             get, update role, remove
///
/// /projects/{project_id}/roles                         list, create
/// /projects/{project_id}/roles/{role_id}               get, update, delete
/// /projects/{project_id}/roles/{role_id}/policies      list, attach
/// /projects/{project_id}/roles/{role_id}/policies/{policy_id}  detach
///
/// /projects/{project_id}/policies                      list, create
/// /projects/{project_id}/policies/{policy_id}          get, update, delete
/// /projects/{project_id}/policies/{policy_id}/permissions      list, attach
/// /projects/{project_id}/policies/{policy_id}/permissions/{permission_id}  detach
///
/// /projects/{project_id}/milestones                    list, create
/// /projects/{project_id}/milestones/{id}               get, update, delete
/// /projects/{project_id}/milestones/{id}/restore       restore (POST)
/// /projects/{project_id}/milestones/{id}/deliverables  list, associate
/// /projects/{project_id}/milestones/{id}/deliverables/{deliverable_id}  dissociate
///
/// /projects/{project_id}/deliverables                  list, create
/// /projects/{project_id}/deliverables/{id}             get, update, delete
/// /projects/{project_id}/deliverables/{id}/restore     restore (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/access", access::router())
        .route("/permissions", get(handlers::permission::list))
        .nest("/projects", project::router())
}
