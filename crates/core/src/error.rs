use crate::lifecycle::ProjectStatus;
use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A lifecycle operation was attempted from a disallowed source state
    /// (e.g. archiving a project that is not completed).
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    /// A requested status is not reachable from the current status.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: ProjectStatus,
        to: ProjectStatus,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience alias for domain-level results.
pub type CoreResult<T> = Result<T, CoreError>;
