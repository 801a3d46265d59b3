//! Handlers for project roles and role-policy links.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use cascade_core::error::CoreError;
use cascade_core::types::DbId;
use cascade_core::validate::{
    validate_description, validate_short_name, MAX_SHORT_DESCRIPTION_LEN,
};
use cascade_db::models::policy::{AttachPolicy, ProjectPolicy};
use cascade_db::models::role::{CreateRole, ProjectRole, UpdateRole};
use cascade_db::repositories::RoleRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::ensure_project;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/projects/{project_id}/roles
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<ProjectRole>>>> {
    ensure_project(&state, &auth, project_id).await?;
    let roles = RoleRepo::list(&state.pool, project_id).await?;
    Ok(Json(DataResponse { data: roles }))
}

/// POST /api/v1/projects/{project_id}/roles -- create a custom role.
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Json(input): Json<CreateRole>,
) -> AppResult<(StatusCode, Json<DataResponse<ProjectRole>>)> {
    validate_short_name(&input.name, "role").map_err(AppError::BadRequest)?;
    validate_description(input.description.as_deref(), MAX_SHORT_DESCRIPTION_LEN)
        .map_err(AppError::BadRequest)?;

    ensure_project(&state, &auth, project_id).await?;
    let role = RoleRepo::create(&state.pool, project_id, auth.user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: role })))
}

/// GET /api/v1/projects/{project_id}/roles/{role_id}
pub async fn get_by_id(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((project_id, role_id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<ProjectRole>>> {
    ensure_project(&state, &auth, project_id).await?;
    let role = RoleRepo::find(&state.pool, project_id, role_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Role",
            id: role_id,
        }))?;
    Ok(Json(DataResponse { data: role }))
}

/// PATCH /api/v1/projects/{project_id}/roles/{role_id}
///
/// Default roles are rejected with 403 regardless of the caller.
pub async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((project_id, role_id)): Path<(DbId, DbId)>,
    Json(input): Json<UpdateRole>,
) -> AppResult<Json<DataResponse<ProjectRole>>> {
    if let Some(name) = &input.name {
        validate_short_name(name, "role").map_err(AppError::BadRequest)?;
    }
    validate_description(input.description.as_deref(), MAX_SHORT_DESCRIPTION_LEN)
        .map_err(AppError::BadRequest)?;

    ensure_project(&state, &auth, project_id).await?;
    let role = RoleRepo::update(&state.pool, project_id, auth.user_id, role_id, &input).await?;
    Ok(Json(DataResponse { data: role }))
}

/// DELETE /api/v1/projects/{project_id}/roles/{role_id}
///
/// Custom roles only, and only while no active member references them.
pub async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((project_id, role_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    ensure_project(&state, &auth, project_id).await?;
    RoleRepo::delete(&state.pool, project_id, auth.user_id, role_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/projects/{project_id}/roles/{role_id}/policies
pub async fn list_policies(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((project_id, role_id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<Vec<ProjectPolicy>>>> {
    ensure_project(&state, &auth, project_id).await?;
    RoleRepo::find(&state.pool, project_id, role_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Role",
            id: role_id,
        }))?;
    let policies = RoleRepo::list_policies(&state.pool, role_id).await?;
    Ok(Json(DataResponse { data: policies }))
}

/// POST /api/v1/projects/{project_id}/roles/{role_id}/policies
pub async fn attach_policy(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((project_id, role_id)): Path<(DbId, DbId)>,
    Json(input): Json<AttachPolicy>,
) -> AppResult<StatusCode> {
    ensure_project(&state, &auth, project_id).await?;
    RoleRepo::attach_policy(
        &state.pool,
        project_id,
        auth.user_id,
        role_id,
        input.policy_id,
    )
    .await?;
    Ok(StatusCode::CREATED)
}

/// DELETE /api/v1/projects/{project_id}/roles/{role_id}/policies/{policy_id}
///
/// Removes only the link row; the policy itself is untouched.
pub async fn detach_policy(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((project_id, role_id, policy_id)): Path<(DbId, DbId, DbId)>,
) -> AppResult<StatusCode> {
    ensure_project(&state, &auth, project_id).await?;
    RoleRepo::detach_policy(&state.pool, project_id, auth.user_id, role_id, policy_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
