//! Task table schema definition and version executor.
//!
//! # Responsibility
//! - Create the `tasks` table and its title index on a fresh store.
//! - Rebuild the table when the requested version is newer than the stored one.
//!
//! # Invariants
//! - Applied version is mirrored to `PRAGMA user_version`.
//! - Rebuild is drop + create in one transaction; existing rows are lost.
//! - A store is never rebuilt to an older version.

use crate::db::{DbError, DbResult};
use log::{info, warn};
use rusqlite::Connection;

/// Current schema version of the `tasks` table.
pub const SCHEMA_VERSION: u32 = 2;

const CREATE_TASKS_SQL: &str = include_str!("create_tasks.sql");
const DROP_TASKS_SQL: &str = include_str!("drop_tasks.sql");

/// Outcome of [`apply_schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaChange {
    /// Store already at the requested version.
    Unchanged,
    /// Fresh store; table created.
    Created { version: u32 },
    /// Older store; table dropped and recreated.
    Rebuilt {
        from_version: u32,
        to_version: u32,
        dropped_rows: u64,
    },
}

/// Returns the latest schema version known by this binary.
pub fn latest_version() -> u32 {
    SCHEMA_VERSION
}

/// Brings the store to `target_version`.
///
/// # Errors
/// - `InvalidSchemaVersion` when `target_version` is zero.
/// - `UnsupportedSchemaVersion` when the store is newer than `target_version`.
pub fn apply_schema(conn: &mut Connection, target_version: u32) -> DbResult<SchemaChange> {
    if target_version == 0 {
        return Err(DbError::InvalidSchemaVersion(target_version));
    }

    let current_version = current_user_version(conn)?;
    if current_version > target_version {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            requested_version: target_version,
        });
    }

    if current_version == target_version {
        return Ok(SchemaChange::Unchanged);
    }

    let tx = conn.transaction()?;
    let change = if current_version == 0 {
        tx.execute_batch(CREATE_TASKS_SQL)?;
        SchemaChange::Created {
            version: target_version,
        }
    } else {
        let dropped_rows = count_existing_rows(&tx)?;
        tx.execute_batch(DROP_TASKS_SQL)?;
        tx.execute_batch(CREATE_TASKS_SQL)?;
        SchemaChange::Rebuilt {
            from_version: current_version,
            to_version: target_version,
            dropped_rows,
        }
    };
    tx.execute_batch(&format!("PRAGMA user_version = {target_version};"))?;
    tx.commit()?;

    match change {
        SchemaChange::Created { version } => {
            info!("event=schema_create module=db status=ok version={version}");
        }
        SchemaChange::Rebuilt {
            from_version,
            to_version,
            dropped_rows,
        } => {
            warn!(
                "event=schema_rebuild module=db status=ok from_version={from_version} to_version={to_version} dropped_rows={dropped_rows}"
            );
        }
        SchemaChange::Unchanged => {}
    }

    Ok(change)
}

pub(crate) fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

fn count_existing_rows(conn: &Connection) -> DbResult<u64> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = 'tasks'
        );",
        [],
        |row| row.get(0),
    )?;
    if exists == 0 {
        return Ok(0);
    }

    let count: i64 = conn.query_row("SELECT COUNT(*) FROM tasks;", [], |row| row.get(0))?;
    Ok(u64::try_from(count).unwrap_or(0))
}
