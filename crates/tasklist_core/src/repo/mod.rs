//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the task data access contract.
//! - Isolate SQLite query details from list synchronization.
//!
//! # Invariants
//! - Repository writes must enforce `TaskDraft::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `Decode`) in addition
//!   to storage errors.

pub mod task_repo;
