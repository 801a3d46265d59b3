//! Handlers for project policies and policy-permission links.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use cascade_core::error::CoreError;
use cascade_core::types::DbId;
use cascade_core::validate::{
    validate_description, validate_short_name, MAX_SHORT_DESCRIPTION_LEN,
};
use cascade_db::models::permission::Permission;
use cascade_db::models::policy::{AttachPermission, CreatePolicy, ProjectPolicy, UpdatePolicy};
use cascade_db::repositories::PolicyRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::ensure_project;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/projects/{project_id}/policies
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<ProjectPolicy>>>> {
    ensure_project(&state, &auth, project_id).await?;
    let policies = PolicyRepo::list(&state.pool, project_id).await?;
    Ok(Json(DataResponse { data: policies }))
}

/// POST /api/v1/projects/{project_id}/policies
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Json(input): Json<CreatePolicy>,
) -> AppResult<(StatusCode, Json<DataResponse<ProjectPolicy>>)> {
    validate_short_name(&input.name, "policy").map_err(AppError::BadRequest)?;
    validate_description(input.description.as_deref(), MAX_SHORT_DESCRIPTION_LEN)
        .map_err(AppError::BadRequest)?;

    ensure_project(&state, &auth, project_id).await?;
    let policy = PolicyRepo::create(&state.pool, project_id, auth.user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: policy })))
}

/// GET /api/v1/projects/{project_id}/policies/{policy_id}
pub async fn get_by_id(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((project_id, policy_id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<ProjectPolicy>>> {
    ensure_project(&state, &auth, project_id).await?;
    let policy = PolicyRepo::find(&state.pool, project_id, policy_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Policy",
            id: policy_id,
        }))?;
    Ok(Json(DataResponse { data: policy }))
}

/// PATCH /api/v1/projects/{project_id}/policies/{policy_id}
pub async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((project_id, policy_id)): Path<(DbId, DbId)>,
    Json(input): Json<UpdatePolicy>,
) -> AppResult<Json<DataResponse<ProjectPolicy>>> {
    if let Some(name) = &input.name {
        validate_short_name(name, "policy").map_err(AppError::BadRequest)?;
    }
    validate_description(input.description.as_deref(), MAX_SHORT_DESCRIPTION_LEN)
        .map_err(AppError::BadRequest)?;

    ensure_project(&state, &auth, project_id).await?;
    let policy =
        PolicyRepo::update(&state.pool, project_id, auth.user_id, policy_id, &input).await?;
    Ok(Json(DataResponse { data: policy }))
}

/// DELETE /api/v1/projects/{project_id}/policies/{policy_id}
///
/// Only policies no live role references can be deleted.
pub async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((project_id, policy_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    ensure_project(&state, &auth, project_id).await?;
    PolicyRepo::delete(&state.pool, project_id, auth.user_id, policy_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/projects/{project_id}/policies/{policy_id}/permissions
pub async fn list_permissions(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((project_id, policy_id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<Vec<Permission>>>> {
    ensure_project(&state, &auth, project_id).await?;
    PolicyRepo::find(&state.pool, project_id, policy_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Policy",
            id: policy_id,
        }))?;
    let permissions = PolicyRepo::list_permissions(&state.pool, policy_id).await?;
    Ok(Json(DataResponse { data: permissions }))
}

/// POST /api/v1/projects/{project_id}/policies/{policy_id}/permissions
pub async fn attach_permission(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((project_id, policy_id)): Path<(DbId, DbId)>,
    Json(input): Json<AttachPermission>,
) -> AppResult<StatusCode> {
    ensure_project(&state, &auth, project_id).await?;
    PolicyRepo::attach_permission(
        &state.pool,
        project_id,
        auth.user_id,
        policy_id,
        input.permission_id,
    )
    .await?;
    Ok(StatusCode::CREATED)
}

/// DELETE /api/v1/projects/{project_id}/policies/{policy_id}/permissions/{permission_id}
///
/// Removes only the link row; the catalog permission is untouched.
pub async fn detach_permission(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((project_id, policy_id, permission_id)): Path<(DbId, DbId, DbId)>,
) -> AppResult<StatusCode> {
    ensure_project(&state, &auth, project_id).await?;
    PolicyRepo::detach_permission(
        &state.pool,
        project_id,
        auth.user_id,
        policy_id,
        permission_id,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
