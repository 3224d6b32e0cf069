use rusqlite::Connection;
use tasklist_core::db::migrations::{apply_schema, latest_version};
use tasklist_core::db::{
    open_db, open_db_in_memory, open_db_with_version, DbError, SchemaChange, SCHEMA_VERSION,
};
use tasklist_core::{SqliteTaskRepository, TaskDraft, TaskRepository};

#[test]
fn open_db_in_memory_creates_tasks_table_and_title_index() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_eq!(latest_version(), SCHEMA_VERSION);
    assert_object_exists(&conn, "table", "tasks");
    assert_object_exists(&conn, "index", "idx_tasks_title");
}

#[test]
fn opening_same_database_twice_keeps_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.db");

    {
        let conn = open_db(&path).unwrap();
        let repo = SqliteTaskRepository::try_new(&conn).unwrap();
        repo.insert(&TaskDraft::new("persisted", 1_000)).unwrap();
    }

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    assert_eq!(repo.list_all().unwrap().len(), 1);
}

#[test]
fn version_bump_rebuilds_table_and_drops_existing_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.db");

    {
        let conn = open_db_with_version(&path, 2).unwrap();
        let repo = SqliteTaskRepository::try_new(&conn).unwrap();
        repo.insert(&TaskDraft::new("first", 1_000)).unwrap();
        repo.insert(&TaskDraft::new("second", 2_000)).unwrap();
        assert_eq!(repo.list_all().unwrap().len(), 2);
    }

    let conn = open_db_with_version(&path, 3).unwrap();
    assert_eq!(schema_version(&conn), 3);
    assert_object_exists(&conn, "index", "idx_tasks_title");

    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    assert!(
        repo.list_all().unwrap().is_empty(),
        "schema rebuild must drop every existing row"
    );
}

#[test]
fn apply_schema_reports_created_rebuilt_and_unchanged() {
    let mut conn = Connection::open_in_memory().unwrap();

    assert_eq!(
        apply_schema(&mut conn, 1).unwrap(),
        SchemaChange::Created { version: 1 }
    );
    conn.execute(
        "INSERT INTO tasks (title, color, created_at) VALUES ('a', 0, 0);",
        [],
    )
    .unwrap();

    assert_eq!(apply_schema(&mut conn, 1).unwrap(), SchemaChange::Unchanged);
    assert_eq!(
        apply_schema(&mut conn, 2).unwrap(),
        SchemaChange::Rebuilt {
            from_version: 1,
            to_version: 2,
            dropped_rows: 1,
        }
    );
}

#[test]
fn deleted_ids_are_never_reused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.db");
    let conn = open_db(&path).unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let first = repo.insert(&TaskDraft::new("a", 0)).unwrap();
    repo.delete(first).unwrap();
    let second = repo.insert(&TaskDraft::new("b", 0)).unwrap();
    assert!(second > first);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            requested_version,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(requested_version, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn zero_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let err = open_db_with_version(dir.path().join("zero.db"), 0).unwrap_err();
    assert!(matches!(err, DbError::InvalidSchemaVersion(0)));
}

#[test]
fn unopenable_path_reports_storage_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing-parent").join("tasks.db");

    let err = open_db(&path).unwrap_err();
    assert!(matches!(err, DbError::Sqlite(_)));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_object_exists(conn: &Connection, kind: &str, name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = ?1 AND name = ?2
            );",
            [kind, name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "{kind} {name} does not exist");
}
