//! Task domain model.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//!
//! # Invariants
//! - Every persisted task is identified by a stable `TaskId`.
//! - Deletion is permanent; there are no tombstones.

pub mod task;
