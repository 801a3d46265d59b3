//! Access check endpoints, consumed by the file-storage and task services.
//!
//! Both endpoints are read-only and produce structured [`Decision`]s. Deny is
//! a normal result; only a structurally invalid payload is an error. The
//! batch endpoint resolves each distinct project once, so its round trips to
//! the database stay constant as the check count grows.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use cascade_core::access::{evaluate, Decision};
use cascade_core::error::CoreError;
use cascade_core::permissions::AccessDomain;
use cascade_core::types::DbId;
use cascade_core::validate::{validate_id, MAX_BATCH_CHECKS};
use cascade_db::repositories::AccessRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// One access check: which project, which domain, which action.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessCheck {
    pub project_id: DbId,
    pub domain: AccessDomain,
    pub action: String,
}

/// Batch request body.
#[derive(Debug, Deserialize)]
pub struct BatchAccessRequest {
    pub checks: Vec<AccessCheck>,
}

/// A decision echoing the check it answers, for positional-free matching.
#[derive(Debug, Serialize)]
pub struct AccessCheckResult {
    pub project_id: DbId,
    pub domain: AccessDomain,
    pub action: String,
    #[serde(flatten)]
    pub decision: Decision,
}

/// POST /api/v1/access/check
///
/// Single check. A project missing from the caller's tenant maps to 404
/// rather than a deny decision, so existence never leaks across tenants.
pub async fn check(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<AccessCheck>,
) -> AppResult<Json<DataResponse<AccessCheckResult>>> {
    validate_id(input.project_id, "project_id")
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let resolution =
        AccessRepo::resolve(&state.pool, auth.company_id, auth.user_id, input.project_id)
            .await?;

    if !resolution.project_found(input.project_id) {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id: input.project_id,
        }));
    }

    let decision = evaluate(
        resolution.grant(input.project_id),
        input.domain,
        &input.action,
    );
    tracing::debug!(
        user_id = %auth.user_id,
        project_id = input.project_id,
        domain = %input.domain,
        action = %input.action,
        allowed = decision.allowed,
        "Access check"
    );

    Ok(Json(DataResponse {
        data: AccessCheckResult {
            project_id: input.project_id,
            domain: input.domain,
            action: input.action,
            decision,
        },
    }))
}

/// POST /api/v1/access/check-batch
///
/// One decision per input check, in input order. The resolver runs once over
/// the distinct project ids; items that cannot be resolved degrade to deny
/// decisions instead of failing the batch.
pub async fn check_batch(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<BatchAccessRequest>,
) -> AppResult<Json<DataResponse<Vec<AccessCheckResult>>>> {
    if input.checks.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "checks must not be empty".to_string(),
        )));
    }
    if input.checks.len() > MAX_BATCH_CHECKS {
        return Err(AppError::Core(CoreError::Validation(format!(
            "checks must contain at most {MAX_BATCH_CHECKS} items"
        ))));
    }

    // Distinct project ids; the resolver is invoked once for the whole batch.
    let mut project_ids: Vec<DbId> = input.checks.iter().map(|c| c.project_id).collect();
    project_ids.sort_unstable();
    project_ids.dedup();

    let resolution =
        AccessRepo::resolve_many(&state.pool, auth.company_id, auth.user_id, &project_ids)
            .await?;

    let results = input
        .checks
        .into_iter()
        .map(|check| {
            let decision = if !resolution.project_found(check.project_id) {
                Decision::project_not_found()
            } else {
                evaluate(resolution.grant(check.project_id), check.domain, &check.action)
            };
            AccessCheckResult {
                project_id: check.project_id,
                domain: check.domain,
                action: check.action,
                decision,
            }
        })
        .collect();

    Ok(Json(DataResponse { data: results }))
}
