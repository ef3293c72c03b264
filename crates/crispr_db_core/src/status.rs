//! Status vocabulary and its integer codes.
//!
//! # Invariants
//! - Codes come from the `status` table, never from enum discriminants.
//! - Unknown names or codes fail with `RepoError::UnknownStatus`.

use crate::error::{RepoError, RepoResult, StatementContext};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

const STATUS_SELECT_SQL: &str = "SELECT status_id, status FROM status ORDER BY status_id";

/// Lifecycle state of a target or guide RNA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Requested,
    Designed,
    Ordered,
    Made,
    Injected,
    MiseqEmbryoScreening,
    PassedEmbryoScreening,
    FailedEmbryoScreening,
    SpermFrozen,
    Shipped,
    ShippedAndInSystem,
    InSystem,
    Carriers,
    F1Frozen,
}

impl Status {
    pub const ALL: [Status; 14] = [
        Self::Requested,
        Self::Designed,
        Self::Ordered,
        Self::Made,
        Self::Injected,
        Self::MiseqEmbryoScreening,
        Self::PassedEmbryoScreening,
        Self::FailedEmbryoScreening,
        Self::SpermFrozen,
        Self::Shipped,
        Self::ShippedAndInSystem,
        Self::InSystem,
        Self::Carriers,
        Self::F1Frozen,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Requested => "REQUESTED",
            Self::Designed => "DESIGNED",
            Self::Ordered => "ORDERED",
            Self::Made => "MADE",
            Self::Injected => "INJECTED",
            Self::MiseqEmbryoScreening => "MISEQ_EMBRYO_SCREENING",
            Self::PassedEmbryoScreening => "PASSED_EMBRYO_SCREENING",
            Self::FailedEmbryoScreening => "FAILED_EMBRYO_SCREENING",
            Self::SpermFrozen => "SPERM_FROZEN",
            Self::Shipped => "SHIPPED",
            Self::ShippedAndInSystem => "SHIPPED_AND_IN_SYSTEM",
            Self::InSystem => "IN_SYSTEM",
            Self::Carriers => "CARRIERS",
            Self::F1Frozen => "F1_FROZEN",
        }
    }
}

impl FromStr for Status {
    type Err = RepoError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| RepoError::UnknownStatus(value.to_string()))
    }
}

/// Bidirectional `Status` <-> code lookup loaded from the `status` table.
#[derive(Debug, Clone)]
pub struct StatusCodec {
    codes: HashMap<Status, i64>,
    statuses: HashMap<i64, Status>,
}

impl StatusCodec {
    /// Reads the whole vocabulary table.
    pub fn load(conn: &Connection) -> RepoResult<Self> {
        let mut stmt = conn.prepare(STATUS_SELECT_SQL).in_statement(STATUS_SELECT_SQL)?;
        let mut rows = stmt.query([]).in_statement(STATUS_SELECT_SQL)?;
        let mut pairs = Vec::new();
        while let Some(row) = rows.next().in_statement(STATUS_SELECT_SQL)? {
            let code: i64 = row.get("status_id")?;
            let name: String = row.get("status")?;
            let status = name.parse::<Status>().map_err(|_| {
                RepoError::InvalidData(format!("unknown status `{name}` in status.status"))
            })?;
            pairs.push((status, code));
        }
        Ok(Self::from_pairs(pairs))
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (Status, i64)>) -> Self {
        let mut codes = HashMap::new();
        let mut statuses = HashMap::new();
        for (status, code) in pairs {
            codes.insert(status, code);
            statuses.insert(code, status);
        }
        Self { codes, statuses }
    }

    pub fn id_for(&self, status: Status) -> RepoResult<i64> {
        self.codes
            .get(&status)
            .copied()
            .ok_or_else(|| RepoError::UnknownStatus(status.as_str().to_string()))
    }

    pub fn id_for_name(&self, name: &str) -> RepoResult<i64> {
        self.id_for(name.parse()?)
    }

    pub fn name_for(&self, code: i64) -> RepoResult<Status> {
        self.statuses
            .get(&code)
            .copied()
            .ok_or_else(|| RepoError::UnknownStatus(code.to_string()))
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}
