use crispr_db_core::db::migrations::latest_version;
use crispr_db_core::db::{open_db, open_db_in_memory, DbError};
use crispr_db_core::{RepoError, Session, Status, StoreConfig};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in [
        "status",
        "target",
        "guide_rna",
        "guide_rna_off_target",
        "plate",
        "primer",
        "primer_pair",
        "amplicon_guide_rna",
        "injection",
        "injection_guide_rna",
        "subplex",
        "sample",
    ] {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn status_vocabulary_is_seeded() {
    let conn = open_db_in_memory().unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM status", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, Status::ALL.len() as i64);

    let session = Session::new(conn);
    let statuses = session.statuses().unwrap();
    assert_eq!(statuses.id_for(Status::Requested).unwrap(), 1);
    assert_eq!(statuses.name_for(14).unwrap(), Status::F1Frozen);
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("crispr.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "primer_pair");
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
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn foreign_keys_are_enforced() {
    let conn = open_db_in_memory().unwrap();
    let err = conn
        .execute(
            "INSERT INTO sample (sample_name, sample_number, injection_id, generation, sample_type, species)
             VALUES ('orphan_1', 1, 42, 'G0', 'embryo', 'zebrafish')",
            [],
        )
        .unwrap_err();
    assert!(err.to_string().contains("FOREIGN KEY"));
}

#[test]
fn session_opens_file_database_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let config: StoreConfig = serde_json::from_value(serde_json::json!({
        "db_path": dir.path().join("store.db"),
        "busy_timeout_ms": 250
    }))
    .unwrap();

    let session = Session::open(&config).unwrap();
    assert_eq!(schema_version(session.connection()), latest_version());
    assert!(dir.path().join("store.db").exists());
}

#[test]
fn session_rejects_relative_log_dir() {
    let config = StoreConfig {
        log_level: Some("info".to_string()),
        log_dir: Some("logs".into()),
        ..StoreConfig::default()
    };

    let err = Session::open(&config).unwrap_err();
    match err {
        RepoError::Config(message) => assert!(message.contains("absolute")),
        other => panic!("unexpected error: {other}"),
    }
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
