//! Task repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and title search over the `tasks` table.
//! - Decode rows into typed `Task` records at the storage boundary.
//!
//! # Invariants
//! - Write paths validate the draft before any SQL mutation.
//! - Every list query is ordered by `created_at DESC, id DESC`.
//! - A blank search query returns exactly what `list_all` returns.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::latest_version;
use crate::db::{fold_case, register_fold_case, DbError, FOLD_CASE_FUNCTION};
use crate::model::task::{validate_title, Task, TaskColor, TaskDraft, TaskId, TaskValidationError};
use log::{debug, error, info};
use rusqlite::types::FromSql;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::borrow::Borrow;
use std::error::Error;
use std::fmt::{Display, Formatter};

const TASK_SELECT_SQL: &str = "SELECT
    id,
    title,
    note,
    color,
    created_at,
    done,
    image_path
FROM tasks";

const TASK_ORDER_SQL: &str = "ORDER BY created_at DESC, id DESC";

const REQUIRED_COLUMNS: [&str; 7] = [
    "id",
    "title",
    "note",
    "color",
    "created_at",
    "done",
    "image_path",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for task persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(TaskValidationError),
    StorageUnavailable(DbError),
    NotFound(TaskId),
    Decode(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::StorageUnavailable(err) => write!(f, "storage unavailable: {err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::Decode(message) => write!(f, "invalid persisted task data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::StorageUnavailable(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TaskValidationError> for RepoError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::StorageUnavailable(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::StorageUnavailable(DbError::Sqlite(value))
    }
}

/// Repository interface for task CRUD and search.
pub trait TaskRepository {
    /// Persists a new task and returns its store-assigned id.
    fn insert(&self, draft: &TaskDraft) -> RepoResult<TaskId>;
    /// Overwrites every field of an existing task.
    ///
    /// Fails with `NotFound` when `id` has no row.
    fn update(&self, id: TaskId, draft: &TaskDraft) -> RepoResult<()>;
    fn get(&self, id: TaskId) -> RepoResult<Option<Task>>;
    /// Removes a task. Returns `false` when no row matched.
    fn delete(&self, id: TaskId) -> RepoResult<bool>;
    fn list_all(&self) -> RepoResult<Vec<Task>>;
    /// Case-insensitive title substring search.
    fn search(&self, query: &str) -> RepoResult<Vec<Task>>;

    /// Removes every listed task and returns how many rows were removed.
    fn delete_many(&self, ids: &[TaskId]) -> RepoResult<usize> {
        let mut removed = 0;
        for id in ids {
            if self.delete(*id)? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

impl<R: TaskRepository + ?Sized> TaskRepository for &R {
    fn insert(&self, draft: &TaskDraft) -> RepoResult<TaskId> {
        (**self).insert(draft)
    }

    fn update(&self, id: TaskId, draft: &TaskDraft) -> RepoResult<()> {
        (**self).update(id, draft)
    }

    fn get(&self, id: TaskId) -> RepoResult<Option<Task>> {
        (**self).get(id)
    }

    fn delete(&self, id: TaskId) -> RepoResult<bool> {
        (**self).delete(id)
    }

    fn list_all(&self) -> RepoResult<Vec<Task>> {
        (**self).list_all()
    }

    fn search(&self, query: &str) -> RepoResult<Vec<Task>> {
        (**self).search(query)
    }

    fn delete_many(&self, ids: &[TaskId]) -> RepoResult<usize> {
        (**self).delete_many(ids)
    }
}

/// SQLite-backed task repository.
///
/// `C` is either a borrowed `&Connection` or an owned `Connection`.
pub struct SqliteTaskRepository<C: Borrow<Connection>> {
    conn: C,
}

impl<C: Borrow<Connection>> SqliteTaskRepository<C> {
    /// Constructs a repository from an opened store handle.
    ///
    /// # Errors
    /// - `UninitializedConnection` when the schema step has not run.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` on layout mismatch.
    ///
    /// Registers `fold_case()` on the handle, so connections prepared with
    /// `apply_schema` alone can still search.
    pub fn try_new(conn: C) -> RepoResult<Self> {
        ensure_task_connection_ready(conn.borrow())?;
        register_fold_case(conn.borrow())?;
        Ok(Self { conn })
    }

    /// Underlying store handle.
    pub fn connection(&self) -> &Connection {
        self.conn.borrow()
    }

    /// Releases the repository and returns the store handle.
    pub fn into_inner(self) -> C {
        self.conn
    }

    fn query_tasks(&self, sql: &str, bind: impl rusqlite::Params) -> RepoResult<Vec<Task>> {
        let mut stmt = self.connection().prepare(sql)?;
        let mut rows = stmt.query(bind)?;
        let mut tasks = Vec::new();

        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }

        Ok(tasks)
    }
}

impl<C: Borrow<Connection>> TaskRepository for SqliteTaskRepository<C> {
    fn insert(&self, draft: &TaskDraft) -> RepoResult<TaskId> {
        draft.validate()?;

        let conn = self.connection();
        conn.execute(
            "INSERT INTO tasks (
                title,
                note,
                color,
                created_at,
                done,
                image_path
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                draft.title.as_str(),
                draft.note.as_str(),
                i64::from(draft.color.argb()),
                draft.created_at,
                bool_to_int(draft.done),
                draft.image_path.as_deref(),
            ],
        )?;

        let id = TaskId::new(conn.last_insert_rowid());
        info!("event=task_insert module=repo status=ok task_id={id}");
        Ok(id)
    }

    fn update(&self, id: TaskId, draft: &TaskDraft) -> RepoResult<()> {
        draft.validate()?;

        let changed = self.connection().execute(
            "UPDATE tasks
             SET
                title = ?1,
                note = ?2,
                color = ?3,
                created_at = ?4,
                done = ?5,
                image_path = ?6
             WHERE id = ?7;",
            params![
                draft.title.as_str(),
                draft.note.as_str(),
                i64::from(draft.color.argb()),
                draft.created_at,
                bool_to_int(draft.done),
                draft.image_path.as_deref(),
                id.get(),
            ],
        )?;

        if changed == 0 {
            error!("event=task_update module=repo status=error task_id={id} error_code=not_found");
            return Err(RepoError::NotFound(id));
        }

        info!("event=task_update module=repo status=ok task_id={id}");
        Ok(())
    }

    fn get(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut tasks = self.query_tasks(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"), [id.get()])?;
        Ok(tasks.pop())
    }

    fn delete(&self, id: TaskId) -> RepoResult<bool> {
        let changed = self
            .connection()
            .execute("DELETE FROM tasks WHERE id = ?1;", [id.get()])?;
        debug!("event=task_delete module=repo status=ok task_id={id} removed={changed}");
        Ok(changed > 0)
    }

    fn delete_many(&self, ids: &[TaskId]) -> RepoResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let tx = Transaction::new_unchecked(self.connection(), TransactionBehavior::Immediate)?;
        let mut removed = 0;
        {
            let mut stmt = tx.prepare("DELETE FROM tasks WHERE id = ?1;")?;
            for id in ids {
                removed += stmt.execute([id.get()])?;
            }
        }
        tx.commit()?;

        info!(
            "event=task_delete_many module=repo status=ok requested={} removed={}",
            ids.len(),
            removed
        );
        Ok(removed)
    }

    fn list_all(&self) -> RepoResult<Vec<Task>> {
        self.query_tasks(&format!("{TASK_SELECT_SQL} {TASK_ORDER_SQL};"), [])
    }

    fn search(&self, query: &str) -> RepoResult<Vec<Task>> {
        if query.trim().is_empty() {
            return self.list_all();
        }

        let needle = fold_case(query);
        let tasks = self.query_tasks(
            &format!(
                "{TASK_SELECT_SQL}
                 WHERE instr({FOLD_CASE_FUNCTION}(title), ?1) > 0
                 {TASK_ORDER_SQL};"
            ),
            [needle.as_str()],
        )?;
        debug!(
            "event=task_search module=repo status=ok query_chars={} hits={}",
            query.chars().count(),
            tasks.len()
        );
        Ok(tasks)
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let id = TaskId::new(decode_field(row, "id")?);

    let color_raw: i64 = decode_field(row, "color")?;
    let color = u32::try_from(color_raw).map_err(|_| {
        RepoError::Decode(format!("invalid color value `{color_raw}` in tasks.color"))
    })?;

    let done = match decode_field::<i64>(row, "done")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::Decode(format!(
                "invalid done value `{other}` in tasks.done"
            )));
        }
    };

    let title: String = decode_field(row, "title")?;
    validate_title(&title)
        .map_err(|_| RepoError::Decode(format!("blank title in tasks.title for id {id}")))?;

    Ok(Task {
        id,
        title,
        note: decode_field(row, "note")?,
        created_at: decode_field(row, "created_at")?,
        color: TaskColor(color),
        done,
        image_path: decode_field(row, "image_path")?,
    })
}

/// Reads one column; type mismatches become `Decode`, not storage errors.
fn decode_field<T: FromSql>(row: &Row<'_>, column: &'static str) -> RepoResult<T> {
    row.get(column).map_err(|err| match err {
        rusqlite::Error::FromSqlConversionFailure(..)
        | rusqlite::Error::InvalidColumnType(..)
        | rusqlite::Error::IntegralValueOutOfRange(..) => {
            RepoError::Decode(format!("invalid value in tasks.{column}: {err}"))
        }
        other => other.into(),
    })
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn ensure_task_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version == 0 {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "tasks")? {
        return Err(RepoError::MissingRequiredTable("tasks"));
    }

    for column in REQUIRED_COLUMNS {
        if !table_has_column(conn, "tasks", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "tasks",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
