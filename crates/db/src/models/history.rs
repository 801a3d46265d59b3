//! Project history entity model and query types.
//!
//! History rows are append-only and have no update DTO by design.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cascade_core::types::{DbId, Timestamp, UserId};

/// A history row from the `project_history` table. Immutable once created.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct HistoryEntry {
    pub id: DbId,
    pub project_id: DbId,
    pub user_id: UserId,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<DbId>,
    pub changes: Option<serde_json::Value>,
    pub created_at: Timestamp,
}

/// Filter parameters for querying a project's history.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    pub entity_type: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Paginated history response.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryPage {
    pub items: Vec<HistoryEntry>,
    pub total: i64,
}
