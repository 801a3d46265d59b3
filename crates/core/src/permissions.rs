//! The global permission catalog and the action-to-permission table.
//!
//! Permissions are predefined and immutable; the names here must match the
//! seed rows in `20260301000002_create_rbac_tables.sql`. Access checks map a
//! `(domain, action)` pair to a requirement through a fixed table rather than
//! any runtime dispatch, so the mapping can be tested exhaustively.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Permission names
// ---------------------------------------------------------------------------

pub const PERM_READ_FILES: &str = "read_files";
pub const PERM_WRITE_FILES: &str = "write_files";
pub const PERM_DELETE_FILES: &str = "delete_files";
pub const PERM_LOCK_FILES: &str = "lock_files";
pub const PERM_VALIDATE_FILES: &str = "validate_files";
pub const PERM_UPDATE_PROJECT: &str = "update_project";
pub const PERM_DELETE_PROJECT: &str = "delete_project";
pub const PERM_MANAGE_MEMBERS: &str = "manage_members";
pub const PERM_MANAGE_ROLES: &str = "manage_roles";
pub const PERM_MANAGE_POLICIES: &str = "manage_policies";

/// Every permission in the catalog.
pub const ALL_PERMISSIONS: &[&str] = &[
    PERM_READ_FILES,
    PERM_WRITE_FILES,
    PERM_DELETE_FILES,
    PERM_LOCK_FILES,
    PERM_VALIDATE_FILES,
    PERM_UPDATE_PROJECT,
    PERM_DELETE_PROJECT,
    PERM_MANAGE_MEMBERS,
    PERM_MANAGE_ROLES,
    PERM_MANAGE_POLICIES,
];

/// The management permissions. A member whose resolved permission set
/// contains all of these can fully administer a project; every project must
/// keep at least one active member with this capability.
pub const MANAGEMENT_PERMISSIONS: &[&str] = &[
    PERM_MANAGE_MEMBERS,
    PERM_MANAGE_ROLES,
    PERM_MANAGE_POLICIES,
];

/// Returns `true` if `name` is one of the ten catalog permissions.
pub fn is_valid_permission(name: &str) -> bool {
    ALL_PERMISSIONS.contains(&name)
}

// ---------------------------------------------------------------------------
// Access domains and the requirement table
// ---------------------------------------------------------------------------

/// The two domains other services check access against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessDomain {
    File,
    Project,
}

impl fmt::Display for AccessDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessDomain::File => f.write_str("file"),
            AccessDomain::Project => f.write_str("project"),
        }
    }
}

/// What a `(domain, action)` pair requires of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Any active membership suffices.
    Membership,
    /// The resolved permission set must contain this permission.
    Permission(&'static str),
    /// The resolved permission set must contain at least one of these.
    AnyOf(&'static [&'static str]),
}

/// Map a `(domain, action)` pair to its requirement.
///
/// Returns `None` for an unknown action, which access checks surface as a
/// per-item deny rather than an error.
pub fn required_access(domain: AccessDomain, action: &str) -> Option<Requirement> {
    match (domain, action) {
        (AccessDomain::File, "read") => Some(Requirement::Permission(PERM_READ_FILES)),
        (AccessDomain::File, "write") => Some(Requirement::Permission(PERM_WRITE_FILES)),
        (AccessDomain::File, "delete") => Some(Requirement::Permission(PERM_DELETE_FILES)),
        (AccessDomain::File, "lock") => Some(Requirement::Permission(PERM_LOCK_FILES)),
        (AccessDomain::File, "validate") => Some(Requirement::Permission(PERM_VALIDATE_FILES)),
        (AccessDomain::Project, "read") => Some(Requirement::Membership),
        (AccessDomain::Project, "write") => Some(Requirement::Permission(PERM_UPDATE_PROJECT)),
        (AccessDomain::Project, "manage") => Some(Requirement::AnyOf(MANAGEMENT_PERMISSIONS)),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
