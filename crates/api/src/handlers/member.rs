//! Handlers for project membership.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use cascade_core::error::CoreError;
use cascade_core::types::{DbId, UserId};
use cascade_db::models::member::{CreateMember, ProjectMember, UpdateMember};
use cascade_db::repositories::MemberRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::ensure_project;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/projects/{project_id}/members
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<ProjectMember>>>> {
    ensure_project(&state, &auth, project_id).await?;
    let members = MemberRepo::list(&state.pool, project_id).await?;
    Ok(Json(DataResponse { data: members }))
}

/// POST /api/v1/projects/{project_id}/members
///
/// Adds a member (or restores a previously removed one). The role must be a
/// live role of this project.
pub async fn add(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Json(input): Json<CreateMember>,
) -> AppResult<(StatusCode, Json<DataResponse<ProjectMember>>)> {
    ensure_project(&state, &auth, project_id).await?;
    let member = MemberRepo::add(
        &state.pool,
        project_id,
        auth.user_id,
        input.user_id,
        input.role_id,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: member })))
}

/// GET /api/v1/projects/{project_id}/members/{user_id}
pub async fn get_by_id(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((project_id, user_id)): Path<(DbId, UserId)>,
) -> AppResult<Json<DataResponse<ProjectMember>>> {
    ensure_project(&state, &auth, project_id).await?;
    let member = MemberRepo::find(&state.pool, project_id, user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Member",
            id: project_id,
        }))?;
    Ok(Json(DataResponse { data: member }))
}

/// PUT /api/v1/projects/{project_id}/members/{user_id}
///
/// Changes the member's role. Rejected if it would strip the project of its
/// last fully-managing member.
pub async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((project_id, user_id)): Path<(DbId, UserId)>,
    Json(input): Json<UpdateMember>,
) -> AppResult<Json<DataResponse<ProjectMember>>> {
    ensure_project(&state, &auth, project_id).await?;
    let member = MemberRepo::update_role(
        &state.pool,
        project_id,
        auth.user_id,
        user_id,
        input.role_id,
    )
    .await?;
    Ok(Json(DataResponse { data: member }))
}

/// DELETE /api/v1/projects/{project_id}/members/{user_id}
///
/// Soft-removes the membership. Removing the last member with full project
/// management is a 409 and leaves the membership active.
pub async fn remove(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((project_id, user_id)): Path<(DbId, UserId)>,
) -> AppResult<StatusCode> {
    ensure_project(&state, &auth, project_id).await?;
    MemberRepo::remove(&state.pool, project_id, auth.user_id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
