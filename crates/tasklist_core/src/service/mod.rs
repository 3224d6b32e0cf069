//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into list-level commands.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod selection;
pub mod task_list;
