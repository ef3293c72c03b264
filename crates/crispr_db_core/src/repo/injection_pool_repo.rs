//! Injection pool adaptor.
//!
//! # Invariants
//! - `injection_name` is the natural key.
//! - Pooled guides live in `injection_guide_rna`, one row per guide with its
//!   concentration, written right after the pool row in the same transaction.

use super::dependency::{ensure_stored, StoreScope};
use super::hydrate::{cached_or_build, fetch_all, fetch_one};
use super::EntityRepository;
use crate::error::RepoResult;
use crate::model::{Entity, InjectionPool};
use crate::query::{BoundStatement, Filter, InsertStatement, SelectQuery};
use crate::session::Session;
use rusqlite::Row;
use std::rc::Rc;

const INJECTION_POOL_SELECT_SQL: &str = "SELECT
    i.injection_id AS injection_id,
    i.injection_name AS injection_name,
    i.cas9_type AS cas9_type,
    i.cas9_concentration AS cas9_concentration,
    i.guide_rna_type AS guide_rna_type,
    i.injection_date AS injection_date,
    i.line_injected AS line_injected,
    i.line_raised AS line_raised,
    i.sorted_by AS sorted_by
FROM injection i";

const POOLED_GUIDE_SELECT_SQL: &str = "SELECT guide_rna_id, guide_rna_concentration
FROM injection_guide_rna
WHERE injection_id = ?
ORDER BY guide_rna_id";

const POOLED_GUIDE_INSERT_SQL: &str = "INSERT INTO injection_guide_rna
    (injection_id, guide_rna_id, guide_rna_concentration)
VALUES (?, ?, ?)";

pub struct InjectionPoolRepository<'s> {
    session: &'s Session,
}

impl<'s> InjectionPoolRepository<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self { session }
    }

    pub fn fetch_by_name(&self, name: &str) -> RepoResult<Rc<InjectionPool>> {
        let query = SelectQuery::new(Self::SELECT_SQL)
            .filter(Filter::new().and_eq("i.injection_name", name.to_string()));
        fetch_one(self, query, || name.to_string())
    }

    /// Pools injected on `date` (`YYYY-MM-DD`).
    pub fn fetch_all_by_date(&self, date: &str) -> RepoResult<Vec<Rc<InjectionPool>>> {
        let query = SelectQuery::new(Self::SELECT_SQL)
            .filter(Filter::new().and_eq("i.injection_date", date.to_string()))
            .order_by("i.injection_id");
        fetch_all(self, query)
    }
}

impl EntityRepository for InjectionPoolRepository<'_> {
    type Entity = InjectionPool;

    const TABLE: &'static str = "injection";
    const ID_COLUMN: &'static str = "injection_id";
    const SELECT_SQL: &'static str = INJECTION_POOL_SELECT_SQL;
    const ID_FILTER: &'static str = "i.injection_id";

    fn session(&self) -> &Session {
        self.session
    }

    fn hydrate_row(&self, row: &Row<'_>) -> RepoResult<Rc<InjectionPool>> {
        let id: i64 = row.get("injection_id")?;
        cached_or_build(self.session, id, |db_id| {
            let mut pool = InjectionPool::new(
                row.get::<_, String>("injection_name")?,
                row.get::<_, String>("cas9_type")?,
                row.get::<_, String>("guide_rna_type")?,
                row.get::<_, String>("injection_date")?,
            )
            .with_db_id(db_id);
            pool.cas9_concentration = row.get("cas9_concentration")?;
            pool.line_injected = row.get("line_injected")?;
            pool.line_raised = row.get("line_raised")?;
            pool.sorted_by = row.get("sorted_by")?;

            let pooled = BoundStatement::new(POOLED_GUIDE_SELECT_SQL.to_string(), vec![id.into()])?
                .query_map(self.session.connection(), |row| {
                    Ok((row.get::<_, i64>(0)?, row.get::<_, f64>(1)?))
                })?;
            let guide_rnas = self.session.guide_rnas();
            for (guide_rna_id, concentration) in pooled {
                pool.add_guide_rna(guide_rnas.fetch_by_id(guide_rna_id)?, concentration);
            }
            Ok(pool)
        })
    }

    fn natural_key(&self, pool: &InjectionPool) -> Filter {
        Filter::new().and_eq("injection_name", pool.name.clone())
    }

    /// Inserts the pool row, then one `injection_guide_rna` row per pooled
    /// guide. Runs for pools created as sample dependencies as well.
    fn insert_row(&self, scope: &StoreScope<'_>, pool: &InjectionPool) -> RepoResult<i64> {
        let pool_id = InsertStatement::new(Self::TABLE, Self::ID_COLUMN)
            .id(pool.id())
            .value("injection_name", pool.name.clone())
            .value("cas9_type", pool.cas9_type.clone())
            .value("cas9_concentration", pool.cas9_concentration)
            .value("guide_rna_type", pool.guide_rna_type.clone())
            .value("injection_date", pool.date.clone())
            .value("line_injected", pool.line_injected.clone())
            .value("line_raised", pool.line_raised.clone())
            .value("sorted_by", pool.sorted_by.clone())
            .execute_returning_id(scope.conn())?;

        let guide_repo = self.session.guide_rnas();
        for pooled in &pool.guide_rnas {
            let guide_rna_id = ensure_stored(&guide_repo, scope, &pooled.guide_rna)?;
            BoundStatement::new(
                POOLED_GUIDE_INSERT_SQL.to_string(),
                vec![pool_id.into(), guide_rna_id.into(), pooled.concentration.into()],
            )?
            .execute(scope.conn())?;
        }
        Ok(pool_id)
    }
}
