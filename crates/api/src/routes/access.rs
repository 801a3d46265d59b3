//! Route definitions for the access check endpoints.

use axum::routing::post;
use axum::Router;

use crate::handlers::access;
use crate::state::AppState;

/// Routes mounted at `/access`.
///
/// ```text
/// POST /check        -> single decision (404 for unresolvable projects)
/// POST /check-batch  -> one decision per check, input order preserved
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/check", post(access::check))
        .route("/check-batch", post(access::check_batch))
}
