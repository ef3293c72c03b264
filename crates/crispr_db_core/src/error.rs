//! Repository error taxonomy.
//!
//! # Invariants
//! - `Validation` is raised before any statement runs.
//! - `Integrity` and `Execution` are raised inside a store transaction and
//!   always accompany a rollback.
//! - Fetch-by-unique-key misses are `NotFound`; filtered fetches return an
//!   empty list instead.

use crate::db::DbError;
use crate::model::ValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for fetch/store operations on record adaptors.
#[derive(Debug)]
pub enum RepoError {
    /// Input rejected at the API boundary. No I/O happened.
    Validation(ValidationError),
    /// A referenced record could not be found or created.
    Integrity(String),
    /// A statement failed; `statement` is the SQL that was running.
    Execution {
        statement: String,
        source: rusqlite::Error,
    },
    Db(DbError),
    NotFound {
        entity: &'static str,
        key: String,
    },
    UnknownStatus(String),
    /// Persisted row cannot be converted into a valid entity.
    InvalidData(String),
    /// A second instance was offered for an already mapped `(entity, id)`.
    IdentityConflict {
        entity: &'static str,
        id: i64,
    },
    /// Filter placeholders and bound values are out of step.
    MalformedQuery {
        placeholders: usize,
        values: usize,
    },
    Config(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Integrity(message) => write!(f, "integrity error: {message}"),
            Self::Execution { statement, source } => {
                write!(f, "statement failed: {source}; statement: {statement}")
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, key } => write!(f, "{entity} not found: {key}"),
            Self::UnknownStatus(value) => write!(f, "unknown status `{value}`"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::IdentityConflict { entity, id } => {
                write!(f, "{entity} {id} is already mapped to another instance")
            }
            Self::MalformedQuery {
                placeholders,
                values,
            } => write!(
                f,
                "query has {placeholders} placeholders but {values} bound values"
            ),
            Self::Config(message) => write!(f, "invalid configuration: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Execution { source, .. } => Some(source),
            Self::Db(err) => Some(err),
            Self::Integrity(_)
            | Self::NotFound { .. }
            | Self::UnknownStatus(_)
            | Self::InvalidData(_)
            | Self::IdentityConflict { .. }
            | Self::MalformedQuery { .. }
            | Self::Config(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Attaches the running SQL to a driver error.
pub(crate) trait StatementContext<T> {
    fn in_statement(self, statement: &str) -> RepoResult<T>;
}

impl<T> StatementContext<T> for Result<T, rusqlite::Error> {
    fn in_statement(self, statement: &str) -> RepoResult<T> {
        self.map_err(|source| RepoError::Execution {
            statement: statement.to_string(),
            source,
        })
    }
}
