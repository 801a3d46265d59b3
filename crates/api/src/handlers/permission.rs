//! Handler for the global permission catalog (read-only).

use axum::extract::State;
use axum::Json;

use cascade_db::models::permission::Permission;
use cascade_db::repositories::PermissionRepo;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/permissions
///
/// The catalog is global and immutable; there are no write endpoints.
pub async fn list(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Permission>>>> {
    let permissions = PermissionRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: permissions }))
}
