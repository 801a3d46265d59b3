//! Route definitions for the `/projects` resource.
//!
//! Also nests members, roles, policies, milestones, and deliverables under
//! `/projects/{project_id}/...`. Every nested handler re-resolves the parent
//! project within the caller's tenant first.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{
    deliverable, history, member, milestone, policy, project, role, wbs,
};
use crate::state::AppState;

/// Routes mounted at `/projects`. See [`crate::routes::api_routes`] for the
/// full route table.
pub fn router() -> Router<AppState> {
    let member_routes = Router::new()
        .route("/", get(member::list).post(member::add))
        .route(
            "/{user_id}",
            get(member::get_by_id)
                .put(member::update)
                .delete(member::remove),
        );

    let role_routes = Router::new()
        .route("/", get(role::list).post(role::create))
        .route(
            "/{role_id}",
            get(role::get_by_id)
                .patch(role::update)
                .delete(role::delete),
        )
        .route(
            "/{role_id}/policies",
            get(role::list_policies).post(role::attach_policy),
        )
        .route(
            "/{role_id}/policies/{policy_id}",
            axum::routing::delete(role::detach_policy),
        );

    let policy_routes = Router::new()
        .route("/", get(policy::list).post(policy::create))
        .route(
            "/{policy_id}",
            get(policy::get_by_id)
                .patch(policy::update)
                .delete(policy::delete),
        )
        .route(
            "/{policy_id}/permissions",
            get(policy::list_permissions).post(policy::attach_permission),
        )
        .route(
            "/{policy_id}/permissions/{permission_id}",
            axum::routing::delete(policy::detach_permission),
        );

    let milestone_routes = Router::new()
        .route("/", get(milestone::list).post(milestone::create))
        .route(
            "/{id}",
            get(milestone::get_by_id)
                .patch(milestone::update)
                .delete(milestone::delete),
        )
        .route("/{id}/restore", post(milestone::restore))
        .route(
            "/{id}/deliverables",
            get(milestone::list_deliverables).post(milestone::associate_deliverable),
        )
        .route(
            "/{id}/deliverables/{deliverable_id}",
            axum::routing::delete(milestone::dissociate_deliverable),
        );

    let deliverable_routes = Router::new()
        .route("/", get(deliverable::list).post(deliverable::create))
        .route(
            "/{id}",
            get(deliverable::get_by_id)
                .patch(deliverable::update)
                .delete(deliverable::delete),
        )
        .route("/{id}/restore", post(deliverable::restore));

    Router::new()
        .route("/", get(project::list).post(project::create))
        .route(
            "/{id}",
            get(project::get_by_id)
                .put(project::update)
                .delete(project::delete),
        )
        .route("/{id}/recover", post(project::recover))
        .route("/{id}/status", post(project::change_status))
        .route("/{id}/archive", post(project::archive))
        .route("/{id}/restore", post(project::restore))
        .route("/{id}/history", get(history::list))
        .route("/{id}/wbs", get(wbs::get))
        .nest("/{project_id}/members", member_routes)
        .nest("/{project_id}/roles", role_routes)
        .nest("/{project_id}/policies", policy_routes)
        .nest("/{project_id}/milestones", milestone_routes)
        .nest("/{project_id}/deliverables", deliverable_routes)
}
