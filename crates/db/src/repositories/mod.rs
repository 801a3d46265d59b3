//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that accept
//! `&PgPool` as the first argument. Multi-row units run inside a single
//! transaction together with their history entry; guard-bearing methods
//! return [`crate::DbError`].

pub mod access_repo;
pub mod deliverable_repo;
pub mod history_repo;
pub mod member_repo;
pub mod milestone_repo;
pub mod permission_repo;
pub mod policy_repo;
pub mod project_repo;
pub mod role_repo;
pub mod wbs_repo;

pub use access_repo::AccessRepo;
pub use deliverable_repo::DeliverableRepo;
pub use history_repo::HistoryRepo;
pub use member_repo::MemberRepo;
pub use milestone_repo::MilestoneRepo;
pub use permission_repo::PermissionRepo;
pub use policy_repo::PolicyRepo;
pub use project_repo::ProjectRepo;
pub use role_repo::RoleRepo;
pub use wbs_repo::WbsRepo;
