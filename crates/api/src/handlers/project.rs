//! Handlers for the `/projects` resource and its lifecycle operations.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use cascade_core::lifecycle::ProjectStatus;
use cascade_core::types::DbId;
use cascade_core::validate::{
    validate_description, validate_entity_name, MAX_DESCRIPTION_LEN,
};
use cascade_db::models::project::{ChangeStatus, CreateProject, Project, UpdateProject};
use cascade_db::repositories::ProjectRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::ensure_project;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/projects
///
/// Creates the project plus its default roles, policies, and the creator's
/// owner membership in one atomic unit. `company_id` and `created_by` come
/// from the verified token; payload values are ignored.
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateProject>,
) -> AppResult<(StatusCode, Json<DataResponse<Project>>)> {
    validate_entity_name(&input.name, "project").map_err(AppError::BadRequest)?;
    validate_description(input.description.as_deref(), MAX_DESCRIPTION_LEN)
        .map_err(AppError::BadRequest)?;

    // Identity fields are argument-shadowed by the token; an override attempt
    // is a security-relevant event worth flagging.
    if let Some(claimed) = input.company_id {
        if claimed != auth.company_id {
            tracing::warn!(
                user_id = %auth.user_id,
                token_company_id = %auth.company_id,
                payload_company_id = %claimed,
                "Client attempted to override company_id"
            );
        }
    }
    if let Some(claimed) = input.created_by {
        if claimed != auth.user_id {
            tracing::warn!(
                user_id = %auth.user_id,
                payload_created_by = %claimed,
                "Client attempted to override created_by"
            );
        }
    }

    let project =
        ProjectRepo::create(&state.pool, auth.company_id, auth.user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: project })))
}

/// GET /api/v1/projects
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Project>>>> {
    let projects = ProjectRepo::list(&state.pool, auth.company_id).await?;
    Ok(Json(DataResponse { data: projects }))
}

/// GET /api/v1/projects/{id}
pub async fn get_by_id(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = ensure_project(&state, &auth, id).await?;
    Ok(Json(DataResponse { data: project }))
}

/// PUT /api/v1/projects/{id}
///
/// Whole-row overwrite of the updatable fields; concurrent writers resolve
/// as last write wins, each with its own history entry.
pub async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProject>,
) -> AppResult<Json<DataResponse<Project>>> {
    validate_entity_name(&input.name, "project").map_err(AppError::BadRequest)?;
    validate_description(input.description.as_deref(), MAX_DESCRIPTION_LEN)
        .map_err(AppError::BadRequest)?;

    let project =
        ProjectRepo::update(&state.pool, auth.company_id, id, auth.user_id, &input).await?;
    Ok(Json(DataResponse { data: project }))
}

/// DELETE /api/v1/projects/{id} -- soft delete.
pub async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    ProjectRepo::soft_delete(&state.pool, auth.company_id, id, auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/projects/{id}/recover -- undo a soft delete.
pub async fn recover(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = ProjectRepo::recover(&state.pool, auth.company_id, id, auth.user_id).await?;
    Ok(Json(DataResponse { data: project }))
}

/// POST /api/v1/projects/{id}/status
///
/// Requests a lifecycle transition; invalid edges are rejected with a 409
/// naming both endpoints.
pub async fn change_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ChangeStatus>,
) -> AppResult<Json<DataResponse<Project>>> {
    let target: ProjectStatus = input.status.parse().map_err(AppError::Core)?;
    let project =
        ProjectRepo::change_status(&state.pool, auth.company_id, id, auth.user_id, target)
            .await?;
    Ok(Json(DataResponse { data: project }))
}

/// POST /api/v1/projects/{id}/archive
///
/// Requires the project to be completed.
pub async fn archive(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = ProjectRepo::archive(&state.pool, auth.company_id, id, auth.user_id).await?;
    Ok(Json(DataResponse { data: project }))
}

/// POST /api/v1/projects/{id}/restore
///
/// Returns an archived project to active.
pub async fn restore(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = ProjectRepo::restore(&state.pool, auth.company_id, id, auth.user_id).await?;
    Ok(Json(DataResponse { data: project }))
}
