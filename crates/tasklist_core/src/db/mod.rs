//! SQLite storage bootstrap and schema lifecycle entry points.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the task store.
//! - Create the `tasks` table on first open and rebuild it on version bumps.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - Core code must not read/write task rows before the schema step succeeds.
//! - Upgrades are destructive: every existing row is dropped.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use migrations::{SchemaChange, SCHEMA_VERSION};
pub use open::{
    fold_case, open_db, open_db_in_memory, open_db_with_version, register_fold_case,
    FOLD_CASE_FUNCTION,
};

pub type DbResult<T> = Result<T, DbError>;

/// Storage-level failure. Callers treat every variant as "storage unavailable".
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        requested_version: u32,
    },
    InvalidSchemaVersion(u32),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                requested_version,
            } => write!(
                f,
                "database schema version {db_version} is newer than requested {requested_version}"
            ),
            Self::InvalidSchemaVersion(version) => {
                write!(f, "schema version must be positive, got {version}")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } | Self::InvalidSchemaVersion(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
