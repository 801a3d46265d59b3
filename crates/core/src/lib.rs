//! Domain logic for the Cascade project service.
//!
//! This crate has no internal dependencies and holds everything the API and
//! repository layers share: ID and timestamp types, the error taxonomy, the
//! project lifecycle state machine, the permission catalog and access
//! decision logic, default role/policy seed definitions, history constants,
//! and input validation helpers.

pub mod access;
pub mod error;
pub mod history;
pub mod lifecycle;
pub mod permissions;
pub mod roles;
pub mod types;
pub mod validate;
