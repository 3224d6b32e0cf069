//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Register the SQL helpers required by task queries.
//! - Apply the schema step before returning a usable connection.
//!
//! # Invariants
//! - Returned connections have `fold_case()` registered.
//! - Returned connections are at the requested schema version.

use super::migrations::{apply_schema, SCHEMA_VERSION};
use super::DbResult;
use log::{error, info};
use rusqlite::functions::{Context, FunctionFlags};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Name of the scalar SQL function used for case-insensitive title matching.
pub const FOLD_CASE_FUNCTION: &str = "fold_case";

/// Opens a SQLite database file at the current [`SCHEMA_VERSION`].
///
/// # Side effects
/// - Creates the file and the `tasks` table when absent.
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_db_with_version(path, SCHEMA_VERSION)
}

/// Opens a SQLite database file at an explicit schema version.
///
/// A store older than `version` is rebuilt and loses its rows.
pub fn open_db_with_version(path: impl AsRef<Path>, version: u32) -> DbResult<Connection> {
    open_with("file", version, || Connection::open(path))
}

/// Opens an in-memory SQLite database at the current [`SCHEMA_VERSION`].
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_with("memory", SCHEMA_VERSION, Connection::open_in_memory)
}

fn open_with(
    mode: &'static str,
    version: u32,
    connect: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode} version={version}");

    let mut conn = match connect() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_open_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match bootstrap_connection(&mut conn, version) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={} duration_ms={}",
                mode,
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_bootstrap_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(conn: &mut Connection, version: u32) -> DbResult<()> {
    conn.busy_timeout(Duration::from_secs(5))?;
    register_fold_case(conn)?;
    apply_schema(conn, version)?;
    Ok(())
}

/// Registers [`FOLD_CASE_FUNCTION`] on `conn`. Re-registering replaces it.
pub fn register_fold_case(conn: &Connection) -> DbResult<()> {
    conn.create_scalar_function(
        FOLD_CASE_FUNCTION,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx: &Context<'_>| {
            let value = ctx.get::<Option<String>>(0)?;
            Ok(value.map(|text| fold_case(&text)))
        },
    )?;
    Ok(())
}

/// Lowercases one char at a time, ignoring word position.
///
/// `str::to_lowercase` maps a word-final `Σ` to `ς`, which would make a
/// query fold differently from the same letters inside a longer title.
pub fn fold_case(text: &str) -> String {
    text.chars().flat_map(char::to_lowercase).collect()
}
