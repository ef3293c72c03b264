//! Embedded record schema, applied step by step.
//!
//! # Invariants
//! - Step versions start at 1 and increase by one.
//! - All pending steps run in one transaction; the applied version is
//!   mirrored to `PRAGMA user_version`.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[
    SchemaStep {
        version: 1,
        name: "records",
        sql: include_str!("0001_records.sql"),
    },
    SchemaStep {
        version: 2,
        name: "status_vocabulary",
        sql: include_str!("0002_status_vocabulary.sql"),
    },
];

/// Schema version a fully bootstrapped database reports.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.len() as u32
}

/// Brings the schema up to [`latest_version`], returning the steps applied.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<usize> {
    let db_version: u32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    let latest_supported = latest_version();
    if db_version > latest_supported {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        });
    }

    let pending: Vec<&SchemaStep> = SCHEMA_STEPS
        .iter()
        .filter(|step| step.version > db_version)
        .collect();
    if pending.is_empty() {
        return Ok(0);
    }

    let tx = conn.transaction()?;
    for step in &pending {
        tx.execute_batch(step.sql)
            .and_then(|()| tx.pragma_update(None, "user_version", step.version))
            .map_err(|source| DbError::SchemaStep {
                version: step.version,
                name: step.name,
                source,
            })?;
        info!(
            "event=schema_step module=db status=ok version={} name={}",
            step.version, step.name
        );
    }
    tx.commit()?;
    Ok(pending.len())
}

#[cfg(test)]
mod tests {
    use super::{apply_migrations, latest_version, SCHEMA_STEPS};
    use rusqlite::Connection;

    #[test]
    fn step_versions_are_contiguous() {
        for (index, step) in SCHEMA_STEPS.iter().enumerate() {
            assert_eq!(step.version as usize, index + 1, "step {}", step.name);
        }
        assert_eq!(latest_version(), 2);
    }

    #[test]
    fn pending_steps_run_once() {
        let mut conn = Connection::open_in_memory().unwrap();
        assert_eq!(apply_migrations(&mut conn).unwrap(), SCHEMA_STEPS.len());
        assert_eq!(apply_migrations(&mut conn).unwrap(), 0);

        conn.execute_batch("PRAGMA user_version = 1").unwrap();
        conn.execute_batch("DELETE FROM status").unwrap();
        assert_eq!(apply_migrations(&mut conn).unwrap(), 1);
        let statuses: i64 = conn
            .query_row("SELECT COUNT(*) FROM status", [], |row| row.get(0))
            .unwrap();
        assert_eq!(statuses, 14);
    }
}
