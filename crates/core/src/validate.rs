//! Input validation helpers.
//!
//! Field-shape validation lives here so handlers share one set of limits.
//! Each helper returns `Ok(())` or a human-readable message the API layer
//! maps to a 400.

/// Maximum length for project/milestone/deliverable names.
pub const MAX_NAME_LEN: usize = 100;

/// Maximum length for role/policy names.
pub const MAX_SHORT_NAME_LEN: usize = 50;

/// Maximum length for descriptions.
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Maximum length for role/policy descriptions.
pub const MAX_SHORT_DESCRIPTION_LEN: usize = 200;

/// Maximum number of items in a batch access check.
pub const MAX_BATCH_CHECKS: usize = 500;

fn validate_name(name: &str, what: &str, max: usize) -> Result<(), String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(format!("{what} name must not be empty"));
    }
    if name.chars().count() > max {
        return Err(format!("{what} name must be at most {max} characters"));
    }
    Ok(())
}

/// Validate an entity name (projects, milestones, deliverables).
pub fn validate_entity_name(name: &str, what: &str) -> Result<(), String> {
    validate_name(name, what, MAX_NAME_LEN)
}

/// Validate a role or policy name.
pub fn validate_short_name(name: &str, what: &str) -> Result<(), String> {
    validate_name(name, what, MAX_SHORT_NAME_LEN)
}

/// Validate an optional description against a length limit.
pub fn validate_description(description: Option<&str>, max: usize) -> Result<(), String> {
    match description {
        Some(d) if d.chars().count() > max => {
            Err(format!("description must be at most {max} characters"))
        }
        _ => Ok(()),
    }
}

/// Validate that an id is a plausible database id.
pub fn validate_id(id: i64, what: &str) -> Result<(), String> {
    if id <= 0 {
        return Err(format!("{what} must be positive, got {id}"));
    }
    Ok(())
}

/// Progress statuses shared by milestones and deliverables.
pub const PROGRESS_STATUSES: &[&str] =
    &["planned", "in_progress", "completed", "delayed", "cancelled"];

/// Deliverable kinds.
pub const DELIVERABLE_KINDS: &[&str] = &["document", "software", "hardware", "service", "other"];

/// Validate an enumerated field against its allowed values.
pub fn validate_one_of(value: &str, allowed: &[&str], what: &str) -> Result<(), String> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(format!(
            "Invalid {what} '{value}'. Must be one of: {}",
            allowed.join(", ")
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
