//! Handler for the project history (audit trail) read endpoint.

use axum::extract::{Path, Query, State};
use axum::Json;

use cascade_core::error::CoreError;
use cascade_core::history::is_valid_entity_type;
use cascade_core::types::DbId;
use cascade_db::models::history::{HistoryPage, HistoryQuery};
use cascade_db::repositories::{HistoryRepo, ProjectRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/projects/{id}/history?entity_type=&limit=&offset=
///
/// Newest first, with deterministic tie-breaking. The audit trail outlives a
/// soft delete, so this endpoint resolves the project including removed
/// rows -- tenant scoping still applies.
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Query(params): Query<HistoryQuery>,
) -> AppResult<Json<DataResponse<HistoryPage>>> {
    ProjectRepo::find_scoped_include_removed(&state.pool, auth.company_id, project_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id: project_id,
        }))?;

    if let Some(entity_type) = &params.entity_type {
        if !is_valid_entity_type(entity_type) {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Unknown entity_type '{entity_type}'"
            ))));
        }
    }

    let items = HistoryRepo::list(&state.pool, project_id, &params).await?;
    let total = HistoryRepo::count(&state.pool, project_id, &params).await?;

    Ok(Json(DataResponse {
        data: HistoryPage { items, total },
    }))
}
