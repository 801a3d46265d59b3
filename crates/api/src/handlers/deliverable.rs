//! Handlers for deliverables.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use cascade_core::error::CoreError;
use cascade_core::types::DbId;
use cascade_core::validate::{
    validate_description, validate_entity_name, validate_one_of, DELIVERABLE_KINDS,
    MAX_DESCRIPTION_LEN, PROGRESS_STATUSES,
};
use cascade_db::models::deliverable::{CreateDeliverable, Deliverable, UpdateDeliverable};
use cascade_db::repositories::DeliverableRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::ensure_project;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

fn validate_fields(
    name: Option<&str>,
    description: Option<&str>,
    kind: Option<&str>,
    status: Option<&str>,
) -> Result<(), AppError> {
    if let Some(name) = name {
        validate_entity_name(name, "deliverable").map_err(AppError::BadRequest)?;
    }
    validate_description(description, MAX_DESCRIPTION_LEN).map_err(AppError::BadRequest)?;
    if let Some(kind) = kind {
        validate_one_of(kind, DELIVERABLE_KINDS, "kind").map_err(AppError::BadRequest)?;
    }
    if let Some(status) = status {
        validate_one_of(status, PROGRESS_STATUSES, "status").map_err(AppError::BadRequest)?;
    }
    Ok(())
}

/// GET /api/v1/projects/{project_id}/deliverables
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Deliverable>>>> {
    ensure_project(&state, &auth, project_id).await?;
    let deliverables = DeliverableRepo::list(&state.pool, project_id).await?;
    Ok(Json(DataResponse { data: deliverables }))
}

/// POST /api/v1/projects/{project_id}/deliverables
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Json(input): Json<CreateDeliverable>,
) -> AppResult<(StatusCode, Json<DataResponse<Deliverable>>)> {
    validate_fields(
        Some(&input.name),
        input.description.as_deref(),
        Some(&input.kind),
        input.status.as_deref(),
    )?;

    ensure_project(&state, &auth, project_id).await?;
    let deliverable =
        DeliverableRepo::create(&state.pool, project_id, auth.user_id, &input).await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse { data: deliverable }),
    ))
}

/// GET /api/v1/projects/{project_id}/deliverables/{id}
pub async fn get_by_id(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((project_id, id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<Deliverable>>> {
    ensure_project(&state, &auth, project_id).await?;
    let deliverable = DeliverableRepo::find(&state.pool, project_id, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Deliverable",
            id,
        }))?;
    Ok(Json(DataResponse { data: deliverable }))
}

/// PATCH /api/v1/projects/{project_id}/deliverables/{id}
pub async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((project_id, id)): Path<(DbId, DbId)>,
    Json(input): Json<UpdateDeliverable>,
) -> AppResult<Json<DataResponse<Deliverable>>> {
    validate_fields(
        input.name.as_deref(),
        input.description.as_deref(),
        input.kind.as_deref(),
        input.status.as_deref(),
    )?;

    ensure_project(&state, &auth, project_id).await?;
    let deliverable =
        DeliverableRepo::update(&state.pool, project_id, auth.user_id, id, &input).await?;
    Ok(Json(DataResponse { data: deliverable }))
}

/// DELETE /api/v1/projects/{project_id}/deliverables/{id} -- soft delete.
pub async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((project_id, id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    ensure_project(&state, &auth, project_id).await?;
    DeliverableRepo::soft_delete(&state.pool, project_id, auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/projects/{project_id}/deliverables/{id}/restore
pub async fn restore(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((project_id, id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<Deliverable>>> {
    ensure_project(&state, &auth, project_id).await?;
    let deliverable = DeliverableRepo::restore(&state.pool, project_id, auth.user_id, id).await?;
    Ok(Json(DataResponse { data: deliverable }))
}
