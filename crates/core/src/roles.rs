//! Default role and policy seed definitions.
//!
//! Every project is created with four default roles and six default policies,
//! linked so the owner role grants the full catalog. The names here must
//! match what `ProjectRepo::create` seeds.

use crate::permissions::{
    PERM_DELETE_FILES, PERM_DELETE_PROJECT, PERM_LOCK_FILES, PERM_MANAGE_MEMBERS,
    PERM_MANAGE_POLICIES, PERM_MANAGE_ROLES, PERM_READ_FILES, PERM_UPDATE_PROJECT,
    PERM_VALIDATE_FILES, PERM_WRITE_FILES,
};

pub const ROLE_OWNER: &str = "owner";
pub const ROLE_VALIDATOR: &str = "validator";
pub const ROLE_CONTRIBUTOR: &str = "contributor";
pub const ROLE_VIEWER: &str = "viewer";

/// A default role with its description and the default policies it links to.
pub struct DefaultRole {
    pub name: &'static str,
    pub description: &'static str,
    pub policies: &'static [&'static str],
}

/// A default policy with its description and permission bundle.
pub struct DefaultPolicy {
    pub name: &'static str,
    pub description: &'static str,
    pub permissions: &'static [&'static str],
}

pub const POLICY_FILE_VIEWING: &str = "file_viewing";
pub const POLICY_FILE_AUTHORING: &str = "file_authoring";
pub const POLICY_FILE_VALIDATION: &str = "file_validation";
pub const POLICY_FILE_ADMINISTRATION: &str = "file_administration";
pub const POLICY_PROJECT_ADMINISTRATION: &str = "project_administration";
pub const POLICY_TEAM_ADMINISTRATION: &str = "team_administration";

/// The six policies seeded into every new project.
pub const DEFAULT_POLICIES: &[DefaultPolicy] = &[
    DefaultPolicy {
        name: POLICY_FILE_VIEWING,
        description: "Read project files",
        permissions: &[PERM_READ_FILES],
    },
    DefaultPolicy {
        name: POLICY_FILE_AUTHORING,
        description: "Write and lock project files",
        permissions: &[PERM_WRITE_FILES, PERM_LOCK_FILES],
    },
    DefaultPolicy {
        name: POLICY_FILE_VALIDATION,
        description: "Validate project files",
        permissions: &[PERM_VALIDATE_FILES],
    },
    DefaultPolicy {
        name: POLICY_FILE_ADMINISTRATION,
        description: "Delete project files",
        permissions: &[PERM_DELETE_FILES],
    },
    DefaultPolicy {
        name: POLICY_PROJECT_ADMINISTRATION,
        description: "Update and delete the project",
        permissions: &[PERM_UPDATE_PROJECT, PERM_DELETE_PROJECT],
    },
    DefaultPolicy {
        name: POLICY_TEAM_ADMINISTRATION,
        description: "Manage members, roles, and policies",
        permissions: &[PERM_MANAGE_MEMBERS, PERM_MANAGE_ROLES, PERM_MANAGE_POLICIES],
    },
];

/// The four roles seeded into every new project, with their policy links.
pub const DEFAULT_ROLES: &[DefaultRole] = &[
    DefaultRole {
        name: ROLE_OWNER,
        description: "Full access to the project",
        policies: &[
            POLICY_FILE_VIEWING,
            POLICY_FILE_AUTHORING,
            POLICY_FILE_VALIDATION,
            POLICY_FILE_ADMINISTRATION,
            POLICY_PROJECT_ADMINISTRATION,
            POLICY_TEAM_ADMINISTRATION,
        ],
    },
    DefaultRole {
        name: ROLE_VALIDATOR,
        description: "Read and validate project files",
        policies: &[POLICY_FILE_VIEWING, POLICY_FILE_VALIDATION],
    },
    DefaultRole {
        name: ROLE_CONTRIBUTOR,
        description: "Read, write, and lock project files",
        policies: &[POLICY_FILE_VIEWING, POLICY_FILE_AUTHORING],
    },
    DefaultRole {
        name: ROLE_VIEWER,
        description: "Read-only access to project files",
        policies: &[POLICY_FILE_VIEWING],
    },
];

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
