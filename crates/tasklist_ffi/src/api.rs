//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the task list commands to Dart via FRB.
//! - Own the single process-wide list session (store, selection, filter).
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - The session is only touched while holding `SESSION`'s lock.
//! - Every command response carries the full ordered list.

use log::{debug, error};
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use tasklist_core::db::open_db;
use tasklist_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, truncate_to_day,
    RepoResult, SelectionTracker, SqliteTaskRepository, Task, TaskColor, TaskDraft, TaskId,
    TaskListObserver, TaskListSync,
};

const DB_PATH_ENV: &str = "TASKLIST_DB_PATH";
const DEFAULT_DB_FILE_NAME: &str = "tasklist.sqlite3";

type Session = TaskListSync<SqliteTaskRepository<Connection>, EmitLogger>;

static SESSION: Mutex<Option<Session>> = Mutex::new(None);

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Start of the UTC day containing `epoch_ms`, for date-only pickers.
///
/// Midnight is UTC, not device-local. Callers wanting the local day should add
/// their UTC offset to `epoch_ms` before the call and subtract it after.
#[flutter_rust_bridge::frb(sync)]
pub fn task_day_start(epoch_ms: i64) -> i64 {
    truncate_to_day(epoch_ms)
}

/// Form fields submitted by the add/edit screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraftInput {
    pub title: String,
    pub note: String,
    pub created_at_ms: i64,
    /// Packed ARGB.
    pub color: u32,
    pub image_path: Option<String>,
}

/// One row of the rendered list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub id: i64,
    pub title: String,
    pub note: String,
    pub color: u32,
    pub created_at_ms: i64,
    pub done: bool,
    pub image_path: Option<String>,
    /// Checkbox state for batch deletion.
    pub selected: bool,
}

/// Response envelope returned by every list command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListResponse {
    pub ok: bool,
    /// Human-readable result for diagnostics/UI.
    pub message: String,
    /// Id of the created or edited task, when applicable.
    pub task_id: Option<i64>,
    /// Active search query; `None` when unfiltered.
    pub query: Option<String>,
    /// Full ordered list after the command.
    pub items: Vec<TaskItem>,
}

impl TaskListResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            task_id: None,
            query: None,
            items: Vec::new(),
        }
    }
}

/// Opens (or reopens) the task store and loads the unfiltered list.
///
/// Blank `db_path` falls back to `TASKLIST_DB_PATH`, then to a file in the
/// temp directory. Reopening discards the previous selection and filter.
#[flutter_rust_bridge::frb(sync)]
pub fn task_session_open(db_path: String) -> TaskListResponse {
    let path = resolve_db_path(&db_path);
    let mut guard = match lock_session() {
        Ok(guard) => guard,
        Err(message) => return TaskListResponse::failure(message),
    };

    let conn = match open_db(&path) {
        Ok(conn) => conn,
        Err(err) => {
            *guard = None;
            return TaskListResponse::failure(format!("task_session_open failed: {err}"));
        }
    };
    let repo = match SqliteTaskRepository::try_new(conn) {
        Ok(repo) => repo,
        Err(err) => {
            *guard = None;
            return TaskListResponse::failure(format!("task_session_open failed: {err}"));
        }
    };

    let session = guard.insert(TaskListSync::new(repo, EmitLogger));
    match session.refresh() {
        Ok(_) => success_response(session, "Session opened.", None),
        Err(err) => TaskListResponse::failure(format!("task_session_open failed: {err}")),
    }
}

/// Drops the active session. Selection state does not survive this.
#[flutter_rust_bridge::frb(sync)]
pub fn task_session_close() -> String {
    match lock_session() {
        Ok(mut guard) => {
            *guard = None;
            String::new()
        }
        Err(message) => message,
    }
}

/// Reloads the list for the active filter.
#[flutter_rust_bridge::frb(sync)]
pub fn task_list() -> TaskListResponse {
    run_command("task_list", "Listed.", |session| {
        session.refresh()?;
        Ok(None)
    })
}

/// Creates a task from the add form.
#[flutter_rust_bridge::frb(sync)]
pub fn task_create(draft: TaskDraftInput) -> TaskListResponse {
    let draft = to_core_draft(draft);
    run_command("task_create", "Task created.", |session| {
        session.create(&draft).map(Some)
    })
}

/// Overwrites an existing task from the edit form.
#[flutter_rust_bridge::frb(sync)]
pub fn task_edit(id: i64, draft: TaskDraftInput) -> TaskListResponse {
    let draft = to_core_draft(draft);
    let id = TaskId::new(id);
    run_command("task_edit", "Task updated.", |session| {
        session.edit_existing(id, &draft)?;
        Ok(Some(id))
    })
}

/// Deletes every checked task.
#[flutter_rust_bridge::frb(sync)]
pub fn task_delete_selected() -> TaskListResponse {
    run_command("task_delete_selected", "Selection deleted.", |session| {
        session.delete_selected()?;
        Ok(None)
    })
}

/// Applies a title search; blank text shows every task.
#[flutter_rust_bridge::frb(sync)]
pub fn task_set_query(text: String) -> TaskListResponse {
    run_command("task_set_query", "Query applied.", |session| {
        session.set_query(&text)?;
        Ok(None)
    })
}

/// Checks or unchecks one task for batch deletion.
#[flutter_rust_bridge::frb(sync)]
pub fn task_toggle_selected(id: i64, selected: bool) -> TaskListResponse {
    run_command("task_toggle_selected", "Selection updated.", |session| {
        session.toggle_selected(TaskId::new(id), selected);
        Ok(None)
    })
}

struct EmitLogger;

impl TaskListObserver for EmitLogger {
    fn on_list_changed(&mut self, tasks: &[Task], selection: &SelectionTracker) {
        debug!(
            "event=task_list_emit module=ffi status=ok count={} selected={}",
            tasks.len(),
            selection.len()
        );
    }
}

fn run_command(
    command: &'static str,
    message: &'static str,
    op: impl FnOnce(&mut Session) -> RepoResult<Option<TaskId>>,
) -> TaskListResponse {
    let mut guard = match lock_session() {
        Ok(guard) => guard,
        Err(err) => return TaskListResponse::failure(err),
    };
    let Some(session) = guard.as_mut() else {
        return TaskListResponse::failure(format!("{command} failed: session is not open"));
    };

    match op(&mut *session) {
        Ok(task_id) => success_response(session, message, task_id),
        Err(err) => {
            error!("event={command} module=ffi status=error error={err}");
            let mut response = success_response(session, format!("{command} failed: {err}"), None);
            response.ok = false;
            response
        }
    }
}

fn success_response(
    session: &Session,
    message: impl Into<String>,
    task_id: Option<TaskId>,
) -> TaskListResponse {
    let selection = session.selection();
    TaskListResponse {
        ok: true,
        message: message.into(),
        task_id: task_id.map(TaskId::get),
        query: session.filter().query().map(str::to_string),
        items: session
            .visible()
            .iter()
            .map(|task| to_task_item(task, selection))
            .collect(),
    }
}

fn lock_session() -> Result<MutexGuard<'static, Option<Session>>, String> {
    SESSION
        .lock()
        .map_err(|_| "task session lock poisoned".to_string())
}

fn to_core_draft(input: TaskDraftInput) -> TaskDraft {
    TaskDraft {
        title: input.title.trim().to_string(),
        note: input.note.trim().to_string(),
        created_at: input.created_at_ms,
        color: TaskColor(input.color),
        image_path: input.image_path.filter(|path| !path.trim().is_empty()),
        done: false,
    }
}

fn to_task_item(task: &Task, selection: &SelectionTracker) -> TaskItem {
    TaskItem {
        id: task.id.get(),
        title: task.title.clone(),
        note: task.note.clone(),
        color: task.color.argb(),
        created_at_ms: task.created_at,
        done: task.done,
        image_path: task.image_path.clone(),
        selected: selection.is_selected(task.id),
    }
}

fn resolve_db_path(db_path: &str) -> PathBuf {
    let trimmed = db_path.trim();
    if !trimmed.is_empty() {
        return PathBuf::from(trimmed);
    }
    if let Ok(raw) = std::env::var(DB_PATH_ENV) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, init_logging, resolve_db_path, task_create, task_day_start,
        task_delete_selected, task_edit, task_list, task_session_close, task_session_open,
        task_set_query, task_toggle_selected, to_core_draft, TaskDraftInput,
    };

    fn draft(title: &str, created_at_ms: i64) -> TaskDraftInput {
        TaskDraftInput {
            title: title.to_string(),
            note: String::new(),
            created_at_ms,
            color: 0xFF90_CAF9,
            image_path: None,
        }
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_bad_input() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
        assert!(!init_logging("verbose".to_string(), "/tmp/logs".to_string()).is_empty());
    }

    #[test]
    fn day_start_truncates_time_of_day() {
        assert_eq!(task_day_start(86_400_000 + 3_600_000), 86_400_000);
    }

    #[test]
    fn day_start_with_offset_shift_yields_local_midnight() {
        // 2024-03-05T01:00 at UTC+8 is 2024-03-04T17:00Z.
        let offset_ms = 8 * 3_600_000;
        let epoch_ms = 1_709_571_600_000;
        let local_midnight = task_day_start(epoch_ms + offset_ms) - offset_ms;
        assert_eq!(local_midnight, 1_709_568_000_000);
    }

    #[test]
    fn explicit_db_path_wins() {
        assert_eq!(
            resolve_db_path(" /data/tasks.db "),
            std::path::PathBuf::from("/data/tasks.db")
        );
    }

    #[test]
    fn draft_input_is_trimmed_and_blank_image_dropped() {
        let mut input = draft("  Buy milk  ", 5);
        input.note = " note ".to_string();
        input.image_path = Some("  ".to_string());

        let core = to_core_draft(input);
        assert_eq!(core.title, "Buy milk");
        assert_eq!(core.note, "note");
        assert_eq!(core.image_path, None);
        assert!(!core.done);
    }

    // Single test drives the process-wide session to avoid cross-test races.
    #[test]
    fn session_commands_follow_the_list_protocol() {
        task_session_close();
        let closed = task_list();
        assert!(!closed.ok);
        assert!(closed.message.contains("not open"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ffi.sqlite3");
        let opened = task_session_open(path.to_string_lossy().into_owned());
        assert!(opened.ok, "{}", opened.message);
        assert!(opened.items.is_empty());

        let a = task_create(draft("A", 1_000));
        assert!(a.ok, "{}", a.message);
        let a_id = a.task_id.unwrap();
        let b = task_create(draft("B", 2_000));
        let titles: Vec<_> = b.items.iter().map(|item| item.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "A"]);

        let blank = task_create(draft("   ", 3_000));
        assert!(!blank.ok);
        assert!(blank.message.contains("title cannot be empty"));
        assert_eq!(blank.items.len(), 2);

        let edited = task_edit(a_id, draft("Z", 1_000));
        assert!(edited.ok, "{}", edited.message);
        let titles: Vec<_> = edited.items.iter().map(|item| item.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "Z"]);

        let missing = task_edit(9_999, draft("ghost", 1));
        assert!(!missing.ok);
        assert!(missing.message.contains("not found"));

        let filtered = task_set_query("z".to_string());
        assert_eq!(filtered.query.as_deref(), Some("z"));
        assert_eq!(filtered.items.len(), 1);

        let toggled = task_toggle_selected(a_id, true);
        assert!(toggled.items[0].selected);

        let unfiltered = task_set_query(String::new());
        assert_eq!(unfiltered.query, None);
        assert!(unfiltered
            .items
            .iter()
            .any(|item| item.id == a_id && item.selected));

        let deleted = task_delete_selected();
        assert!(deleted.ok, "{}", deleted.message);
        let titles: Vec<_> = deleted.items.iter().map(|item| item.title.as_str()).collect();
        assert_eq!(titles, vec!["B"]);
        assert!(deleted.items.iter().all(|item| !item.selected));

        let reopened = task_session_open(path.to_string_lossy().into_owned());
        assert_eq!(reopened.items.len(), 1);
        assert!(reopened.items.iter().all(|item| !item.selected));

        assert!(task_session_close().is_empty());
    }
}
