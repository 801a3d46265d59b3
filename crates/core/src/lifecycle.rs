//! Project lifecycle state machine.
//!
//! Statuses and the transition table live here so the repository layer, the
//! HTTP handlers, and tests all validate against the same rules. Archive and
//! restore are not ordinary transitions: `archived` is terminal in the table
//! below, and the explicit restore operation is the only way out of it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Project lifecycle status, stored as lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Created,
    Initialized,
    Consultation,
    Lost,
    Active,
    Suspended,
    Completed,
    Archived,
}

impl ProjectStatus {
    /// The database/text representation of this status.
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectStatus::Created => "created",
            ProjectStatus::Initialized => "initialized",
            ProjectStatus::Consultation => "consultation",
            ProjectStatus::Lost => "lost",
            ProjectStatus::Active => "active",
            ProjectStatus::Suspended => "suspended",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Archived => "archived",
        }
    }

    /// Statuses reachable from `self` via an ordinary transition.
    ///
    /// `lost` and `archived` are terminal here; restore handles the
    /// `archived -> active` edge separately.
    pub fn allowed_targets(self) -> &'static [ProjectStatus] {
        match self {
            ProjectStatus::Created => &[ProjectStatus::Initialized],
            ProjectStatus::Initialized => &[ProjectStatus::Consultation],
            ProjectStatus::Consultation => &[ProjectStatus::Active, ProjectStatus::Lost],
            ProjectStatus::Lost => &[],
            ProjectStatus::Active => &[ProjectStatus::Suspended, ProjectStatus::Completed],
            ProjectStatus::Suspended => &[ProjectStatus::Active],
            ProjectStatus::Completed => &[ProjectStatus::Archived],
            ProjectStatus::Archived => &[],
        }
    }

    /// Returns `true` if `self -> target` is a valid transition.
    pub fn can_transition_to(self, target: ProjectStatus) -> bool {
        self.allowed_targets().contains(&target)
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(ProjectStatus::Created),
            "initialized" => Ok(ProjectStatus::Initialized),
            "consultation" => Ok(ProjectStatus::Consultation),
            "lost" => Ok(ProjectStatus::Lost),
            "active" => Ok(ProjectStatus::Active),
            "suspended" => Ok(ProjectStatus::Suspended),
            "completed" => Ok(ProjectStatus::Completed),
            "archived" => Ok(ProjectStatus::Archived),
            other => Err(CoreError::Validation(format!(
                "Unknown project status '{other}'"
            ))),
        }
    }
}

/// Validate a requested transition, returning [`CoreError::InvalidTransition`]
/// on a bad edge.
pub fn validate_transition(from: ProjectStatus, to: ProjectStatus) -> CoreResult<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition { from, to })
    }
}

/// Validate the archive precondition: only completed projects can be archived.
pub fn validate_archive(current: ProjectStatus) -> CoreResult<()> {
    if current == ProjectStatus::Completed {
        Ok(())
    } else {
        Err(CoreError::PreconditionFailed(format!(
            "Only completed projects can be archived (status is {current})"
        )))
    }
}

/// Validate the restore precondition: only archived projects can be restored.
pub fn validate_restore(current: ProjectStatus) -> CoreResult<()> {
    if current == ProjectStatus::Archived {
        Ok(())
    } else {
        Err(CoreError::PreconditionFailed(format!(
            "Only archived projects can be restored (status is {current})"
        )))
    }
}

/// The status an archived project returns to on restore.
///
/// The pre-archive status is not tracked; the only path into `archived` is
/// from `completed`, and restored projects resume as `active`.
pub const RESTORE_TARGET: ProjectStatus = ProjectStatus::Active;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const ALL: [ProjectStatus; 8] = [
        ProjectStatus::Created,
        ProjectStatus::Initialized,
        ProjectStatus::Consultation,
        ProjectStatus::Lost,
        ProjectStatus::Active,
        ProjectStatus::Suspended,
        ProjectStatus::Completed,
        ProjectStatus::Archived,
    ];

    #[test]
    fn test_happy_path_transitions() {
        assert!(ProjectStatus::Created.can_transition_to(ProjectStatus::Initialized));
        assert!(ProjectStatus::Initialized.can_transition_to(ProjectStatus::Consultation));
        assert!(ProjectStatus::Consultation.can_transition_to(ProjectStatus::Active));
        assert!(ProjectStatus::Consultation.can_transition_to(ProjectStatus::Lost));
        assert!(ProjectStatus::Active.can_transition_to(ProjectStatus::Suspended));
        assert!(ProjectStatus::Suspended.can_transition_to(ProjectStatus::Active));
        assert!(ProjectStatus::Active.can_transition_to(ProjectStatus::Completed));
        assert!(ProjectStatus::Completed.can_transition_to(ProjectStatus::Archived));
    }

    #[test]
    fn test_terminal_states_have_no_targets() {
        assert!(ProjectStatus::Lost.allowed_targets().is_empty());
        assert!(ProjectStatus::Archived.allowed_targets().is_empty());
    }

    #[test]
    fn test_no_skipping_forward() {
        assert!(!ProjectStatus::Created.can_transition_to(ProjectStatus::Active));
        assert!(!ProjectStatus::Created.can_transition_to(ProjectStatus::Consultation));
        assert!(!ProjectStatus::Initialized.can_transition_to(ProjectStatus::Completed));
        assert!(!ProjectStatus::Consultation.can_transition_to(ProjectStatus::Completed));
    }

    #[test]
    fn test_no_self_transitions() {
        for status in ALL {
            assert!(
                !status.can_transition_to(status),
                "{status} must not transition to itself"
            );
        }
    }

    #[test]
    fn test_validate_transition_error_names_both_endpoints() {
        let err = validate_transition(ProjectStatus::Lost, ProjectStatus::Active).unwrap_err();
        assert_matches!(
            err,
            CoreError::InvalidTransition {
                from: ProjectStatus::Lost,
                to: ProjectStatus::Active
            }
        );
        assert!(err.to_string().contains("lost"));
        assert!(err.to_string().contains("active"));
    }

    #[test]
    fn test_archive_requires_completed() {
        assert!(validate_archive(ProjectStatus::Completed).is_ok());
        for status in ALL {
            if status != ProjectStatus::Completed {
                assert_matches!(
                    validate_archive(status),
                    Err(CoreError::PreconditionFailed(_)),
                    "archive from {status} must fail"
                );
            }
        }
    }

    #[test]
    fn test_restore_requires_archived() {
        assert!(validate_restore(ProjectStatus::Archived).is_ok());
        for status in ALL {
            if status != ProjectStatus::Archived {
                assert_matches!(
                    validate_restore(status),
                    Err(CoreError::PreconditionFailed(_)),
                    "restore from {status} must fail"
                );
            }
        }
    }

    #[test]
    fn test_round_trip_str_parsing() {
        for status in ALL {
            let parsed: ProjectStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_unknown_status_fails_parse() {
        let result = "deleted".parse::<ProjectStatus>();
        assert_matches!(result, Err(CoreError::Validation(_)));
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&ProjectStatus::Consultation).unwrap();
        assert_eq!(json, "\"consultation\"");
        let back: ProjectStatus = serde_json::from_str("\"suspended\"").unwrap();
        assert_eq!(back, ProjectStatus::Suspended);
    }
}
