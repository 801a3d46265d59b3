//! History action and entity-type vocabulary, plus the changes-map builder.
//!
//! Every mutating operation writes exactly one history row; the constants
//! here keep the action strings consistent between repositories and tests.

use serde_json::{json, Map, Value};

/// Known history actions.
pub mod actions {
    pub const CREATED: &str = "created";
    pub const UPDATED: &str = "updated";
    pub const STATUS_CHANGED: &str = "status_changed";
    pub const ARCHIVED: &str = "archived";
    pub const RESTORED: &str = "restored";
    pub const DELETED: &str = "deleted";
    pub const RECOVERED: &str = "recovered";
    pub const MEMBER_ADDED: &str = "member_added";
    pub const MEMBER_UPDATED: &str = "member_updated";
    pub const MEMBER_REMOVED: &str = "member_removed";
    pub const POLICY_ATTACHED: &str = "policy_attached";
    pub const POLICY_DETACHED: &str = "policy_detached";
    pub const PERMISSION_ATTACHED: &str = "permission_attached";
    pub const PERMISSION_DETACHED: &str = "permission_detached";
    pub const ASSOCIATION_ADDED: &str = "association_added";
    pub const ASSOCIATION_REMOVED: &str = "association_removed";
}

/// Known history entity types.
pub mod entity_types {
    pub const PROJECT: &str = "project";
    pub const MEMBER: &str = "member";
    pub const ROLE: &str = "role";
    pub const POLICY: &str = "policy";
    pub const MILESTONE: &str = "milestone";
    pub const DELIVERABLE: &str = "deliverable";
    pub const MILESTONE_DELIVERABLE: &str = "milestone_deliverable";
}

/// The set of all valid history entity types, for filter validation.
pub const VALID_ENTITY_TYPES: &[&str] = &[
    entity_types::PROJECT,
    entity_types::MEMBER,
    entity_types::ROLE,
    entity_types::POLICY,
    entity_types::MILESTONE,
    entity_types::DELIVERABLE,
    entity_types::MILESTONE_DELIVERABLE,
];

/// Returns `true` if `entity_type` is a known history entity type.
pub fn is_valid_entity_type(entity_type: &str) -> bool {
    VALID_ENTITY_TYPES.contains(&entity_type)
}

/// Builder for the `changes` JSON map of a history row.
///
/// One logical state change produces one row, even when several fields change
/// together, so the map carries `{"field": {"old": ..., "new": ...}}` entries
/// side by side.
#[derive(Debug, Default)]
pub struct ChangeSet {
    fields: Map<String, Value>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a field change. Equal old/new values are skipped.
    pub fn field(mut self, name: &str, old: Value, new: Value) -> Self {
        if old != new {
            self.fields
                .insert(name.to_string(), json!({ "old": old, "new": new }));
        }
        self
    }

    /// Record a bare key/value entry (for context that is not an old/new
    /// pair, e.g. the affected user id of a membership event).
    pub fn note(mut self, name: &str, value: Value) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
