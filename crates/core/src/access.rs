//! Access decision logic.
//!
//! The repository layer resolves a member's grant (role plus the union of
//! permissions reachable through the role's policies); this module turns a
//! grant and a `(domain, action)` pair into a [`Decision`]. Deny is a normal
//! outcome here, never an error — only structurally invalid check requests
//! fail.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::permissions::{required_access, AccessDomain, Requirement};

/// The resolved grant for an active member: role name and permission union.
///
/// Resolution is a plain set union over the role's policies; there is no
/// ordering and no deny-override. A member whose role has no policies gets an
/// empty set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberGrant {
    pub role_name: String,
    pub permissions: BTreeSet<String>,
}

/// The structured result of an access check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub allowed: bool,
    /// The member's role name, or `None` when the caller is not a member (or
    /// the project could not be resolved).
    pub role: Option<String>,
    pub reason: String,
}

impl Decision {
    fn allow(role: &str, reason: String) -> Self {
        Decision {
            allowed: true,
            role: Some(role.to_string()),
            reason,
        }
    }

    fn deny(role: Option<&str>, reason: String) -> Self {
        Decision {
            allowed: false,
            role: role.map(str::to_string),
            reason,
        }
    }

    /// Deny for a project that does not exist in the caller's tenant.
    ///
    /// Cross-tenant projects produce exactly this decision so existence never
    /// leaks across tenants.
    pub fn project_not_found() -> Self {
        Decision::deny(None, "Project not found".to_string())
    }
}

/// Decide whether `grant` permits `action` in `domain`.
///
/// `grant` is `None` when the user has no active membership in the project.
pub fn evaluate(grant: Option<&MemberGrant>, domain: AccessDomain, action: &str) -> Decision {
    let Some(requirement) = required_access(domain, action) else {
        return Decision::deny(
            grant.map(|g| g.role_name.as_str()),
            format!("Unknown action '{action}' for domain {domain}"),
        );
    };

    let Some(grant) = grant else {
        return Decision::deny(None, "User is not a member of this project".to_string());
    };

    match requirement {
        Requirement::Membership => Decision::allow(
            &grant.role_name,
            format!("Member of project via role {}", grant.role_name),
        ),
        Requirement::Permission(perm) => {
            if grant.permissions.contains(perm) {
                Decision::allow(
                    &grant.role_name,
                    format!("Has permission {perm} via role {}", grant.role_name),
                )
            } else {
                Decision::deny(
                    Some(&grant.role_name),
                    format!("Missing permission {perm}"),
                )
            }
        }
        Requirement::AnyOf(perms) => match perms.iter().find(|p| grant.permissions.contains(**p)) {
            Some(perm) => Decision::allow(
                &grant.role_name,
                format!("Has permission {perm} via role {}", grant.role_name),
            ),
            None => Decision::deny(
                Some(&grant.role_name),
                format!("Missing management permission (any of {})", perms.join(", ")),
            ),
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::{PERM_MANAGE_MEMBERS, PERM_READ_FILES, PERM_WRITE_FILES};

    fn grant(role: &str, perms: &[&str]) -> MemberGrant {
        MemberGrant {
            role_name: role.to_string(),
            permissions: perms.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn test_non_member_is_denied_with_null_role() {
        let decision = evaluate(None, AccessDomain::File, "read");
        assert!(!decision.allowed);
        assert_eq!(decision.role, None);
        assert_eq!(decision.reason, "User is not a member of this project");
    }

    #[test]
    fn test_member_with_permission_is_allowed() {
        let g = grant("contributor", &[PERM_READ_FILES, PERM_WRITE_FILES]);
        let decision = evaluate(Some(&g), AccessDomain::File, "write");
        assert!(decision.allowed);
        assert_eq!(decision.role.as_deref(), Some("contributor"));
        assert_eq!(
            decision.reason,
            "Has permission write_files via role contributor"
        );
    }

    #[test]
    fn test_member_without_permission_is_denied_with_role() {
        let g = grant("viewer", &[PERM_READ_FILES]);
        let decision = evaluate(Some(&g), AccessDomain::File, "delete");
        assert!(!decision.allowed);
        assert_eq!(decision.role.as_deref(), Some("viewer"));
        assert_eq!(decision.reason, "Missing permission delete_files");
    }

    #[test]
    fn test_project_read_only_needs_membership() {
        // Even an empty permission set passes the membership requirement.
        let g = grant("viewer", &[]);
        let decision = evaluate(Some(&g), AccessDomain::Project, "read");
        assert!(decision.allowed);
        assert_eq!(decision.reason, "Member of project via role viewer");
    }

    #[test]
    fn test_empty_grant_fails_every_permission_check() {
        let g = grant("custom", &[]);
        for action in ["read", "write", "delete", "lock", "validate"] {
            let decision = evaluate(Some(&g), AccessDomain::File, action);
            assert!(!decision.allowed, "action {action} must be denied");
        }
    }

    #[test]
    fn test_manage_accepts_any_management_permission() {
        let g = grant("team_lead", &[PERM_MANAGE_MEMBERS]);
        let decision = evaluate(Some(&g), AccessDomain::Project, "manage");
        assert!(decision.allowed);
        assert_eq!(
            decision.reason,
            "Has permission manage_members via role team_lead"
        );
    }

    #[test]
    fn test_manage_denied_cites_management_permissions() {
        let g = grant("contributor", &[PERM_READ_FILES, PERM_WRITE_FILES]);
        let decision = evaluate(Some(&g), AccessDomain::Project, "manage");
        assert!(!decision.allowed);
        assert_eq!(decision.role.as_deref(), Some("contributor"));
        assert!(decision.reason.contains("manage_members"));
    }

    #[test]
    fn test_unknown_action_is_a_deny_not_a_panic() {
        let g = grant("owner", &[PERM_READ_FILES]);
        let decision = evaluate(Some(&g), AccessDomain::File, "frobnicate");
        assert!(!decision.allowed);
        assert!(decision.reason.contains("Unknown action 'frobnicate'"));
    }

    #[test]
    fn test_project_not_found_decision_shape() {
        let decision = Decision::project_not_found();
        assert!(!decision.allowed);
        assert_eq!(decision.role, None);
        assert_eq!(decision.reason, "Project not found");
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let g = grant("owner", &[PERM_READ_FILES, PERM_MANAGE_MEMBERS]);
        let first = evaluate(Some(&g), AccessDomain::Project, "manage");
        let second = evaluate(Some(&g), AccessDomain::Project, "manage");
        assert_eq!(first, second);
    }
}
