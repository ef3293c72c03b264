//! Target adaptor.
//!
//! # Invariants
//! - `target_name` is the natural key.
//! - Status travels as a `status` table code, never as text.

use super::dependency::StoreScope;
use super::hydrate::{cached_or_build, fetch_all, fetch_one, read_strand};
use super::EntityRepository;
use crate::error::RepoResult;
use crate::model::{Entity, Target};
use crate::query::{Filter, InsertStatement, SelectQuery};
use crate::session::Session;
use crate::status::Status;
use rusqlite::Row;
use std::rc::Rc;

const TARGET_SELECT_SQL: &str = "SELECT
    t.target_id AS target_id,
    t.target_name AS target_name,
    t.assembly AS assembly,
    t.target_chr AS target_chr,
    t.target_start AS target_start,
    t.target_end AS target_end,
    t.target_strand AS target_strand,
    t.species AS species,
    t.gene_id AS gene_id,
    t.gene_name AS gene_name,
    t.requestor AS requestor,
    t.status_id AS status_id
FROM target t";

pub struct TargetRepository<'s> {
    session: &'s Session,
}

impl<'s> TargetRepository<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self { session }
    }

    /// Loads one target by its unique name. No match is `NotFound`.
    pub fn fetch_by_name(&self, name: &str) -> RepoResult<Rc<Target>> {
        let query = SelectQuery::new(Self::SELECT_SQL)
            .filter(Filter::new().and_eq("t.target_name", name.to_string()));
        fetch_one(self, query, || name.to_string())
    }

    pub fn fetch_all_by_gene_id(&self, gene_id: &str) -> RepoResult<Vec<Rc<Target>>> {
        let query = SelectQuery::new(Self::SELECT_SQL)
            .filter(Filter::new().and_eq("t.gene_id", gene_id.to_string()))
            .order_by("t.target_id");
        fetch_all(self, query)
    }

    pub fn fetch_all_by_status(&self, status: Status) -> RepoResult<Vec<Rc<Target>>> {
        let status_id = self.session.statuses()?.id_for(status)?;
        let query = SelectQuery::new(Self::SELECT_SQL)
            .filter(Filter::new().and_eq("t.status_id", status_id))
            .order_by("t.target_id");
        fetch_all(self, query)
    }
}

impl EntityRepository for TargetRepository<'_> {
    type Entity = Target;

    const TABLE: &'static str = "target";
    const ID_COLUMN: &'static str = "target_id";
    const SELECT_SQL: &'static str = TARGET_SELECT_SQL;
    const ID_FILTER: &'static str = "t.target_id";

    fn session(&self) -> &Session {
        self.session
    }

    fn hydrate_row(&self, row: &Row<'_>) -> RepoResult<Rc<Target>> {
        let id: i64 = row.get("target_id")?;
        cached_or_build(self.session, id, |db_id| {
            let status = self.session.statuses()?.name_for(row.get("status_id")?)?;
            let mut target = Target::new(
                row.get::<_, String>("target_name")?,
                row.get("target_start")?,
                row.get("target_end")?,
                read_strand(row, "target_strand")?,
                row.get::<_, String>("requestor")?,
            )
            .with_db_id(db_id);
            target.assembly = row.get("assembly")?;
            target.chr = row.get("target_chr")?;
            target.species = row.get("species")?;
            target.gene_id = row.get("gene_id")?;
            target.gene_name = row.get("gene_name")?;
            target.status = status;
            Ok(target)
        })
    }

    fn natural_key(&self, target: &Target) -> Filter {
        Filter::new().and_eq("target_name", target.name.clone())
    }

    fn insert_row(&self, scope: &StoreScope<'_>, target: &Target) -> RepoResult<i64> {
        let status_id = self.session.statuses()?.id_for(target.status)?;
        InsertStatement::new(Self::TABLE, Self::ID_COLUMN)
            .id(target.id())
            .value("target_name", target.name.clone())
            .value("assembly", target.assembly.clone())
            .value("target_chr", target.chr.clone())
            .value("target_start", target.start)
            .value("target_end", target.end)
            .value("target_strand", target.strand.to_db())
            .value("species", target.species.clone())
            .value("gene_id", target.gene_id.clone())
            .value("gene_name", target.gene_name.clone())
            .value("requestor", target.requestor.clone())
            .value("status_id", status_id)
            .execute_returning_id(scope.conn())
    }
}
