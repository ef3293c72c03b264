//! Record adaptors and the shared fetch/store engine.
//!
//! # Responsibility
//! - Define the contract every record adaptor implements.
//! - Hydrate rows through the session identity cache.
//! - Store records together with any unstored records they reference.
//!
//! # Invariants
//! - Two fetches of one `(entity, id)` in a session return the same `Rc`.
//! - A store commits the whole dependency graph or leaves no rows behind.
//! - Adaptors reach other record types only through their adaptors.

use crate::error::RepoResult;
use crate::model::Entity;
use crate::query::{select_id, Filter, SelectQuery};
use crate::session::Session;
use rusqlite::Row;
use std::rc::Rc;

pub mod dependency;
pub mod guide_rna_repo;
pub(crate) mod hydrate;
pub mod injection_pool_repo;
pub mod plate_repo;
pub mod primer_pair_repo;
pub mod primer_repo;
pub mod sample_repo;
pub mod subplex_repo;
pub mod target_repo;

pub use dependency::StoreScope;
pub use guide_rna_repo::GuideRnaRepository;
pub use injection_pool_repo::InjectionPoolRepository;
pub use plate_repo::PlateRepository;
pub use primer_pair_repo::PrimerPairRepository;
pub use primer_repo::PrimerRepository;
pub use sample_repo::SampleRepository;
pub use subplex_repo::SubplexRepository;
pub use target_repo::TargetRepository;

/// Contract shared by all record adaptors.
///
/// The associated constants pin the fixed column mapping of one table; the
/// required methods supply row hydration, the natural key used for existence
/// checks, and the transactional row insert.
pub trait EntityRepository {
    type Entity: Entity;

    const TABLE: &'static str;
    const ID_COLUMN: &'static str;
    /// Base select (select list + joins), without `WHERE`.
    const SELECT_SQL: &'static str;
    /// Qualified id column inside `SELECT_SQL`.
    const ID_FILTER: &'static str;

    fn session(&self) -> &Session;

    /// Converts one result row of `SELECT_SQL` into a cached entity.
    fn hydrate_row(&self, row: &Row<'_>) -> RepoResult<Rc<Self::Entity>>;

    /// Filter over `TABLE` matching the entity's natural key.
    fn natural_key(&self, entity: &Self::Entity) -> Filter;

    /// Stores unstored references, then inserts the entity row and returns
    /// the generated id. Runs inside `scope`.
    fn insert_row(&self, scope: &StoreScope<'_>, entity: &Self::Entity) -> RepoResult<i64>;

    /// Loads one entity, consulting the identity cache first.
    fn fetch_by_id(&self, id: i64) -> RepoResult<Rc<Self::Entity>> {
        if let Some(cached) = self.session().identity_cache().lookup::<Self::Entity>(id) {
            return Ok(cached);
        }
        let query = SelectQuery::new(Self::SELECT_SQL).filter(Filter::new().and_eq(Self::ID_FILTER, id));
        hydrate::fetch_one(self, query, || id.to_string())
    }

    /// Whether a row exists for the entity's id, or its natural key when unstored.
    fn exists(&self, entity: &Self::Entity) -> RepoResult<bool> {
        dependency::exists_in(self, self.session().connection(), entity)
    }

    /// Id of the row sharing the entity's natural key, if any.
    fn fetch_id_by_natural_key(&self, entity: &Self::Entity) -> RepoResult<Option<i64>> {
        select_id(
            self.session().connection(),
            Self::TABLE,
            Self::ID_COLUMN,
            self.natural_key(entity),
        )
    }

    /// Stores `entity` and every unstored record it references.
    fn store(&self, entity: &Rc<Self::Entity>) -> RepoResult<Rc<Self::Entity>> {
        dependency::store(self, entity, |_, _| Ok(()))
    }
}
