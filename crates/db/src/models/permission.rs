//! Permission catalog entity model.
//!
//! Permissions are global, seeded by migration, and read-only at runtime.

use serde::Serialize;
use sqlx::FromRow;

use cascade_core::types::{DbId, Timestamp};

/// A permission row from the global `permissions` catalog.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Permission {
    pub id: DbId,
    pub name: String,
    pub description: String,
    pub category: String,
    pub created_at: Timestamp,
}
