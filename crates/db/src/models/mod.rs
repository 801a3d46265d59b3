//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO for patches, where the entity is mutable

pub mod deliverable;
pub mod history;
pub mod member;
pub mod milestone;
pub mod permission;
pub mod policy;
pub mod project;
pub mod role;
pub mod wbs;
