//! Plate adaptor. Plates are bare named records here; well layout is not
//! tracked.

use super::dependency::StoreScope;
use super::hydrate::{cached_or_build, fetch_one};
use super::EntityRepository;
use crate::error::RepoResult;
use crate::model::{Entity, Plate};
use crate::query::{Filter, InsertStatement, SelectQuery};
use crate::session::Session;
use rusqlite::Row;
use std::rc::Rc;

const PLATE_SELECT_SQL: &str = "SELECT
    pl.plate_id AS plate_id,
    pl.plate_name AS plate_name,
    pl.plate_type AS plate_type
FROM plate pl";

pub struct PlateRepository<'s> {
    session: &'s Session,
}

impl<'s> PlateRepository<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self { session }
    }

    pub fn fetch_by_name(&self, name: &str) -> RepoResult<Rc<Plate>> {
        let query = SelectQuery::new(Self::SELECT_SQL)
            .filter(Filter::new().and_eq("pl.plate_name", name.to_string()));
        fetch_one(self, query, || name.to_string())
    }
}

impl EntityRepository for PlateRepository<'_> {
    type Entity = Plate;

    const TABLE: &'static str = "plate";
    const ID_COLUMN: &'static str = "plate_id";
    const SELECT_SQL: &'static str = PLATE_SELECT_SQL;
    const ID_FILTER: &'static str = "pl.plate_id";

    fn session(&self) -> &Session {
        self.session
    }

    fn hydrate_row(&self, row: &Row<'_>) -> RepoResult<Rc<Plate>> {
        let id: i64 = row.get("plate_id")?;
        cached_or_build(self.session, id, |db_id| {
            Ok(Plate::new(
                row.get::<_, String>("plate_name")?,
                row.get::<_, String>("plate_type")?,
            )
            .with_db_id(db_id))
        })
    }

    fn natural_key(&self, plate: &Plate) -> Filter {
        Filter::new().and_eq("plate_name", plate.name.clone())
    }

    fn insert_row(&self, scope: &StoreScope<'_>, plate: &Plate) -> RepoResult<i64> {
        InsertStatement::new(Self::TABLE, Self::ID_COLUMN)
            .id(plate.id())
            .value("plate_name", plate.name.clone())
            .value("plate_type", plate.plate_type.clone())
            .execute_returning_id(scope.conn())
    }
}
