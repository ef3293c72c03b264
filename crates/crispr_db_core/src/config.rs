//! Session bootstrap configuration.
//!
//! # Invariants
//! - A missing `db_path` means an in-memory database.
//! - Logging is initialised only when both `log_level` and `log_dir` are set.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Settings used by [`crate::Session::open`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// SQLite database file. `None` opens an in-memory database.
    pub db_path: Option<PathBuf>,
    /// How long a statement waits on a locked database before failing.
    pub busy_timeout_ms: u64,
    /// Log level passed to [`crate::init_logging`].
    pub log_level: Option<String>,
    /// Absolute directory for rolling log files.
    pub log_dir: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            log_level: None,
            log_dir: None,
        }
    }
}

impl StoreConfig {
    /// Configuration for a file-backed database with default settings.
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Returns `(level, dir)` when logging should be initialised.
    pub fn logging(&self) -> Option<(&str, &std::path::Path)> {
        match (self.log_level.as_deref(), self.log_dir.as_deref()) {
            (Some(level), Some(dir)) => Some((level, dir)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::StoreConfig;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn empty_document_uses_defaults() {
        let config: StoreConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.busy_timeout(), Duration::from_secs(5));
        assert!(config.logging().is_none());
    }

    #[test]
    fn partial_document_overrides_fields() {
        let config: StoreConfig = serde_json::from_str(
            r#"{"db_path": "/var/lib/crispr/records.db", "busy_timeout_ms": 250}"#,
        )
        .unwrap();
        assert_eq!(
            config.db_path,
            Some(PathBuf::from("/var/lib/crispr/records.db"))
        );
        assert_eq!(config.busy_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn logging_requires_level_and_dir() {
        let mut config = StoreConfig {
            log_level: Some("debug".to_string()),
            ..StoreConfig::default()
        };
        assert!(config.logging().is_none());

        config.log_dir = Some(PathBuf::from("/tmp/crispr-logs"));
        let (level, dir) = config.logging().unwrap();
        assert_eq!(level, "debug");
        assert_eq!(dir, PathBuf::from("/tmp/crispr-logs").as_path());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = serde_json::from_str::<StoreConfig>(r#"{"pool_size": 4}"#);
        assert!(result.is_err());
    }
}
