//! Handlers for milestones and milestone-deliverable associations.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use cascade_core::error::CoreError;
use cascade_core::types::DbId;
use cascade_core::validate::{
    validate_description, validate_entity_name, validate_one_of, MAX_DESCRIPTION_LEN,
    PROGRESS_STATUSES,
};
use cascade_db::models::deliverable::Deliverable;
use cascade_db::models::milestone::{
    AssociateDeliverable, CreateMilestone, Milestone, UpdateMilestone,
};
use cascade_db::repositories::MilestoneRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::ensure_project;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/projects/{project_id}/milestones
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Milestone>>>> {
    ensure_project(&state, &auth, project_id).await?;
    let milestones = MilestoneRepo::list(&state.pool, project_id).await?;
    Ok(Json(DataResponse { data: milestones }))
}

/// POST /api/v1/projects/{project_id}/milestones
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Json(input): Json<CreateMilestone>,
) -> AppResult<(StatusCode, Json<DataResponse<Milestone>>)> {
    validate_entity_name(&input.name, "milestone").map_err(AppError::BadRequest)?;
    validate_description(input.description.as_deref(), MAX_DESCRIPTION_LEN)
        .map_err(AppError::BadRequest)?;
    if let Some(status) = &input.status {
        validate_one_of(status, PROGRESS_STATUSES, "status").map_err(AppError::BadRequest)?;
    }

    ensure_project(&state, &auth, project_id).await?;
    let milestone = MilestoneRepo::create(&state.pool, project_id, auth.user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: milestone })))
}

/// GET /api/v1/projects/{project_id}/milestones/{id}
pub async fn get_by_id(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((project_id, id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<Milestone>>> {
    ensure_project(&state, &auth, project_id).await?;
    let milestone = MilestoneRepo::find(&state.pool, project_id, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Milestone",
            id,
        }))?;
    Ok(Json(DataResponse { data: milestone }))
}

/// PATCH /api/v1/projects/{project_id}/milestones/{id}
pub async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((project_id, id)): Path<(DbId, DbId)>,
    Json(input): Json<UpdateMilestone>,
) -> AppResult<Json<DataResponse<Milestone>>> {
    if let Some(name) = &input.name {
        validate_entity_name(name, "milestone").map_err(AppError::BadRequest)?;
    }
    validate_description(input.description.as_deref(), MAX_DESCRIPTION_LEN)
        .map_err(AppError::BadRequest)?;
    if let Some(status) = &input.status {
        validate_one_of(status, PROGRESS_STATUSES, "status").map_err(AppError::BadRequest)?;
    }

    ensure_project(&state, &auth, project_id).await?;
    let milestone =
        MilestoneRepo::update(&state.pool, project_id, auth.user_id, id, &input).await?;
    Ok(Json(DataResponse { data: milestone }))
}

/// DELETE /api/v1/projects/{project_id}/milestones/{id} -- soft delete.
pub async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((project_id, id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    ensure_project(&state, &auth, project_id).await?;
    MilestoneRepo::soft_delete(&state.pool, project_id, auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/projects/{project_id}/milestones/{id}/restore
///
/// Prior deliverable associations come back with the milestone.
pub async fn restore(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((project_id, id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<Milestone>>> {
    ensure_project(&state, &auth, project_id).await?;
    let milestone = MilestoneRepo::restore(&state.pool, project_id, auth.user_id, id).await?;
    Ok(Json(DataResponse { data: milestone }))
}

/// GET /api/v1/projects/{project_id}/milestones/{id}/deliverables
pub async fn list_deliverables(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((project_id, id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<Vec<Deliverable>>>> {
    ensure_project(&state, &auth, project_id).await?;
    MilestoneRepo::find(&state.pool, project_id, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Milestone",
            id,
        }))?;
    let deliverables = MilestoneRepo::list_deliverables(&state.pool, id).await?;
    Ok(Json(DataResponse { data: deliverables }))
}

/// POST /api/v1/projects/{project_id}/milestones/{id}/deliverables
///
/// Associates a deliverable of the same project; cross-project pairs are a
/// 409.
pub async fn associate_deliverable(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((project_id, id)): Path<(DbId, DbId)>,
    Json(input): Json<AssociateDeliverable>,
) -> AppResult<StatusCode> {
    ensure_project(&state, &auth, project_id).await?;
    MilestoneRepo::associate_deliverable(
        &state.pool,
        project_id,
        auth.user_id,
        id,
        input.deliverable_id,
    )
    .await?;
    Ok(StatusCode::CREATED)
}

/// DELETE /api/v1/projects/{project_id}/milestones/{id}/deliverables/{deliverable_id}
///
/// Removes only the association row; both entities survive.
pub async fn dissociate_deliverable(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((project_id, id, deliverable_id)): Path<(DbId, DbId, DbId)>,
) -> AppResult<StatusCode> {
    ensure_project(&state, &auth, project_id).await?;
    MilestoneRepo::dissociate_deliverable(
        &state.pool,
        project_id,
        auth.user_id,
        id,
        deliverable_id,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
