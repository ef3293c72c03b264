//! Subplex adaptor.

use super::dependency::{ensure_stored, StoreScope};
use super::hydrate::{cached_or_build, fetch_all};
use super::EntityRepository;
use crate::error::RepoResult;
use crate::model::{Entity, Subplex};
use crate::query::{Filter, InsertStatement, SelectQuery};
use crate::session::Session;
use rusqlite::Row;
use std::rc::Rc;

const SUBPLEX_SELECT_SQL: &str = "SELECT
    sp.subplex_id AS subplex_id,
    sp.plex_name AS plex_name,
    sp.subplex_number AS subplex_number,
    sp.plate_num AS plate_num,
    sp.primer_pair_id AS primer_pair_id
FROM subplex sp";

pub struct SubplexRepository<'s> {
    session: &'s Session,
}

impl<'s> SubplexRepository<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self { session }
    }

    /// Subplexes of one plex, ordered by subplex number.
    pub fn fetch_all_by_plex_name(&self, plex_name: &str) -> RepoResult<Vec<Rc<Subplex>>> {
        let query = SelectQuery::new(Self::SELECT_SQL)
            .filter(Filter::new().and_eq("sp.plex_name", plex_name.to_string()))
            .order_by("sp.subplex_number");
        fetch_all(self, query)
    }
}

impl EntityRepository for SubplexRepository<'_> {
    type Entity = Subplex;

    const TABLE: &'static str = "subplex";
    const ID_COLUMN: &'static str = "subplex_id";
    const SELECT_SQL: &'static str = SUBPLEX_SELECT_SQL;
    const ID_FILTER: &'static str = "sp.subplex_id";

    fn session(&self) -> &Session {
        self.session
    }

    fn hydrate_row(&self, row: &Row<'_>) -> RepoResult<Rc<Subplex>> {
        let id: i64 = row.get("subplex_id")?;
        cached_or_build(self.session, id, |db_id| {
            let primer_pair = self
                .session
                .primer_pairs()
                .fetch_by_id(row.get("primer_pair_id")?)?;
            Ok(Subplex::new(
                row.get::<_, String>("plex_name")?,
                row.get("subplex_number")?,
                row.get("plate_num")?,
                primer_pair,
            )
            .with_db_id(db_id))
        })
    }

    fn natural_key(&self, subplex: &Subplex) -> Filter {
        Filter::new()
            .and_eq("plex_name", subplex.plex_name.clone())
            .and_eq("subplex_number", subplex.subplex_number)
    }

    fn insert_row(&self, scope: &StoreScope<'_>, subplex: &Subplex) -> RepoResult<i64> {
        let primer_pair_id = ensure_stored(&self.session.primer_pairs(), scope, &subplex.primer_pair)?;

        InsertStatement::new(Self::TABLE, Self::ID_COLUMN)
            .id(subplex.id())
            .value("plex_name", subplex.plex_name.clone())
            .value("subplex_number", subplex.subplex_number)
            .value("plate_num", subplex.plate_num)
            .value("primer_pair_id", primer_pair_id)
            .execute_returning_id(scope.conn())
    }
}
