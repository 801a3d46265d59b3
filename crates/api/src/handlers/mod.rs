//! Request handlers.
//!
//! Each submodule provides async handler functions for a single resource.
//! Handlers derive identity exclusively from the [`AuthUser`] extractor,
//! delegate to the corresponding repository in `cascade_db`, and map errors
//! via [`AppError`].

use cascade_core::error::CoreError;
use cascade_core::types::DbId;
use cascade_db::models::project::Project;
use cascade_db::repositories::ProjectRepo;

use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

pub mod access;
pub mod deliverable;
pub mod history;
pub mod member;
pub mod milestone;
pub mod permission;
pub mod policy;
pub mod project;
pub mod role;
pub mod wbs;

/// Fetch a live project in the caller's tenant, or 404.
///
/// Every nested route goes through this first, which is what makes another
/// tenant's project indistinguishable from a missing one.
pub(crate) async fn ensure_project(
    state: &AppState,
    auth: &AuthUser,
    project_id: DbId,
) -> Result<Project, AppError> {
    ProjectRepo::find_scoped(&state.pool, auth.company_id, project_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id: project_id,
        }))
}
