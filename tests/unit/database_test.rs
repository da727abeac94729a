//! Unit tests for the Markline database layer (connection + migrations).

use markline::database::migrations::{get_schema_version, CURRENT_SCHEMA_VERSION};
use markline::database::Database;
use tempfile::TempDir;

#[test]
fn test_open_in_memory_succeeds() {
    let db = Database::open_in_memory();
    assert!(db.is_ok(), "open_in_memory should succeed");
}

#[test]
fn test_migrations_create_bookmarks_table_and_index() {
    let db = Database::open_in_memory().expect("open_in_memory failed");
    let conn = db.connection();

    for (kind, name) in [("table", "bookmarks"), ("index", "idx_bookmarks_owner_created")] {
        let exists: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type=?1 AND name=?2",
                [kind, name],
                |row| row.get(0),
            )
            .unwrap_or(false);
        assert!(exists, "{} '{}' should exist after migrations", kind, name);
    }
}

#[test]
fn test_schema_version_recorded() {
    let db = Database::open_in_memory().unwrap();
    assert_eq!(get_schema_version(db.connection()), CURRENT_SCHEMA_VERSION);
}

#[test]
fn test_reopen_file_keeps_data() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("markline.db");

    {
        let db = Database::open(&path).unwrap();
        db.connection()
            .execute(
                "INSERT INTO bookmarks (id, owner_id, title, url, created_at) VALUES ('b1', 'u1', 'T', 'https://x.com', 1)",
                [],
            )
            .unwrap();
    }

    let db = Database::open(&path).unwrap();
    let count: i64 = db
        .connection()
        .query_row("SELECT COUNT(*) FROM bookmarks", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(get_schema_version(db.connection()), CURRENT_SCHEMA_VERSION);
}

#[test]
fn test_blank_title_rejected_by_schema() {
    let db = Database::open_in_memory().unwrap();
    let result = db.connection().execute(
        "INSERT INTO bookmarks (id, owner_id, title, url, created_at) VALUES ('b1', 'u1', '   ', 'https://x.com', 1)",
        [],
    );
    assert!(result.is_err());
}
