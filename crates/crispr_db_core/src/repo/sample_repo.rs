//! Sample adaptor.
//!
//! # Invariants
//! - `sample_name` is the natural key.
//! - A sample always belongs to an injection pool; its subplex is optional.

use super::dependency::{ensure_stored, StoreScope};
use super::hydrate::{cached_or_build, fetch_all, fetch_one, optional_reference};
use super::EntityRepository;
use crate::error::{RepoError, RepoResult};
use crate::model::{Entity, Generation, InjectionPool, Sample, Subplex, ValidationError};
use crate::query::{Filter, InsertStatement, SelectQuery};
use crate::session::Session;
use rusqlite::Row;
use std::rc::Rc;

const SAMPLE_SELECT_SQL: &str = "SELECT
    s.sample_id AS sample_id,
    s.sample_name AS sample_name,
    s.sample_number AS sample_number,
    s.injection_id AS injection_id,
    s.subplex_id AS subplex_id,
    s.generation AS generation,
    s.sample_type AS sample_type,
    s.species AS species,
    s.well_id AS well_id,
    s.barcode_id AS barcode_id
FROM sample s";

pub struct SampleRepository<'s> {
    session: &'s Session,
}

impl<'s> SampleRepository<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self { session }
    }

    pub fn fetch_by_name(&self, name: &str) -> RepoResult<Rc<Sample>> {
        let query = SelectQuery::new(Self::SELECT_SQL)
            .filter(Filter::new().and_eq("s.sample_name", name.to_string()));
        fetch_one(self, query, || name.to_string())
    }

    pub fn fetch_all_by_injection_pool(&self, pool: &InjectionPool) -> RepoResult<Vec<Rc<Sample>>> {
        let pool_id = pool
            .id()
            .ok_or(ValidationError::NotStored(InjectionPool::ENTITY))?;
        let query = SelectQuery::new(Self::SELECT_SQL)
            .filter(Filter::new().and_eq("s.injection_id", pool_id))
            .order_by("s.sample_number");
        fetch_all(self, query)
    }

    pub fn fetch_all_by_subplex(&self, subplex: &Subplex) -> RepoResult<Vec<Rc<Sample>>> {
        let subplex_id = subplex
            .id()
            .ok_or(ValidationError::NotStored(Subplex::ENTITY))?;
        let query = SelectQuery::new(Self::SELECT_SQL)
            .filter(Filter::new().and_eq("s.subplex_id", subplex_id))
            .order_by("s.sample_id");
        fetch_all(self, query)
    }
}

impl EntityRepository for SampleRepository<'_> {
    type Entity = Sample;

    const TABLE: &'static str = "sample";
    const ID_COLUMN: &'static str = "sample_id";
    const SELECT_SQL: &'static str = SAMPLE_SELECT_SQL;
    const ID_FILTER: &'static str = "s.sample_id";

    fn session(&self) -> &Session {
        self.session
    }

    fn hydrate_row(&self, row: &Row<'_>) -> RepoResult<Rc<Sample>> {
        let id: i64 = row.get("sample_id")?;
        cached_or_build(self.session, id, |db_id| {
            let pool = self
                .session
                .injection_pools()
                .fetch_by_id(row.get("injection_id")?)?;
            let subplex = optional_reference(&self.session.subplexes(), row.get("subplex_id")?)?;

            let generation: String = row.get("generation")?;
            let generation = Generation::parse(&generation).ok_or_else(|| {
                RepoError::InvalidData(format!("invalid generation `{generation}` in sample.generation"))
            })?;

            let mut sample = Sample::new(
                pool,
                row.get("sample_number")?,
                generation,
                row.get::<_, String>("sample_type")?,
                row.get::<_, String>("species")?,
            )
            .with_db_id(db_id);
            sample.name = row.get("sample_name")?;
            sample.subplex = subplex;
            sample.well_id = row.get("well_id")?;
            sample.barcode_id = row.get("barcode_id")?;
            Ok(sample)
        })
    }

    fn natural_key(&self, sample: &Sample) -> Filter {
        Filter::new().and_eq("sample_name", sample.name.clone())
    }

    fn insert_row(&self, scope: &StoreScope<'_>, sample: &Sample) -> RepoResult<i64> {
        let injection_id = ensure_stored(&self.session.injection_pools(), scope, &sample.injection_pool)?;
        let subplex_id = match &sample.subplex {
            Some(subplex) => Some(ensure_stored(&self.session.subplexes(), scope, subplex)?),
            None => None,
        };

        InsertStatement::new(Self::TABLE, Self::ID_COLUMN)
            .id(sample.id())
            .value("sample_name", sample.name.clone())
            .value("sample_number", sample.sample_number)
            .value("injection_id", injection_id)
            .value("subplex_id", subplex_id)
            .value("generation", sample.generation.as_str().to_string())
            .value("sample_type", sample.sample_type.clone())
            .value("species", sample.species.clone())
            .value("well_id", sample.well_id.clone())
            .value("barcode_id", sample.barcode_id)
            .execute_returning_id(scope.conn())
    }
}
