//! Row hydration through the identity cache.

use super::EntityRepository;
use crate::error::{RepoError, RepoResult};
use crate::model::{DbId, Entity, Strand};
use crate::query::SelectQuery;
use crate::session::Session;
use log::debug;
use rusqlite::Row;
use std::rc::Rc;

/// Returns the cached instance for `id`, or builds, registers and returns a
/// new one. Remaining row fields are not read on a cache hit.
pub(crate) fn cached_or_build<T, F>(session: &Session, id: i64, build: F) -> RepoResult<Rc<T>>
where
    T: Entity,
    F: FnOnce(DbId) -> RepoResult<T>,
{
    let cache = session.identity_cache();
    if let Some(cached) = cache.lookup::<T>(id) {
        return Ok(cached);
    }

    let entity = Rc::new(build(DbId::persisted(id))?);
    cache.insert(id, &entity)?;
    debug!(
        "event=hydrate module=repo entity={} id={} status=miss",
        T::ENTITY,
        id
    );
    Ok(entity)
}

/// Runs `query` and hydrates every row.
pub(crate) fn fetch_all<R>(repo: &R, query: SelectQuery) -> RepoResult<Vec<Rc<R::Entity>>>
where
    R: EntityRepository + ?Sized,
{
    let statement = query.build()?;
    statement.query_map(repo.session().connection(), |row| repo.hydrate_row(row))
}

/// Runs `query` expecting one row; zero rows is `NotFound` keyed by `key()`.
pub(crate) fn fetch_one<R, K>(repo: &R, query: SelectQuery, key: K) -> RepoResult<Rc<R::Entity>>
where
    R: EntityRepository + ?Sized,
    K: FnOnce() -> String,
{
    fetch_all(repo, query)?
        .into_iter()
        .next()
        .ok_or_else(|| RepoError::NotFound {
            entity: R::Entity::ENTITY,
            key: key(),
        })
}

/// Resolves a nullable foreign id through the referenced adaptor.
pub(crate) fn optional_reference<R>(repo: &R, id: Option<i64>) -> RepoResult<Option<Rc<R::Entity>>>
where
    R: EntityRepository,
{
    id.map(|id| repo.fetch_by_id(id)).transpose()
}

/// Reads the id column of the field group starting with `prefix`.
pub(crate) fn group_id(row: &Row<'_>, prefix: &str, id_column: &str) -> RepoResult<i64> {
    Ok(row.get::<_, i64>(column(prefix, id_column).as_str())?)
}

pub(crate) fn column(prefix: &str, name: &str) -> String {
    format!("{prefix}{name}")
}

/// Reads a `1` / `-1` strand column.
pub(crate) fn read_strand(row: &Row<'_>, column: &str) -> RepoResult<Strand> {
    let value: i64 = row.get(column)?;
    Strand::from_db(value)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid strand `{value}` in {column}")))
}
