//! Handler for the work breakdown structure read, consumed by the task
//! service.

use axum::extract::{Path, State};
use axum::Json;

use cascade_core::error::CoreError;
use cascade_core::types::DbId;
use cascade_db::models::wbs::WbsStructure;
use cascade_db::repositories::WbsRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/projects/{id}/wbs
///
/// Project metadata plus live milestones, deliverables, and associations.
pub async fn get(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<WbsStructure>>> {
    let wbs = WbsRepo::aggregate(&state.pool, auth.company_id, project_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id: project_id,
        }))?;
    Ok(Json(DataResponse { data: wbs }))
}
