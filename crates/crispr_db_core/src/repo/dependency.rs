//! Transactional store with recursive dependency resolution.
//!
//! # Invariants
//! - Validation runs before the transaction opens.
//! - Dependency rows are written before the rows that reference them, all
//!   inside one immediate transaction.
//! - On rollback every id assigned inside the scope is cleared again, so
//!   in-memory entities match the database.
//! - Entities stored or resolved in a committed scope join the identity cache.
//! - An id already mapped to another live instance is never handed to a
//!   second one; the store fails with `IdentityConflict` and rolls back.

use super::EntityRepository;
use crate::error::{RepoError, RepoResult, StatementContext};
use crate::identity::CacheKey;
use crate::model::{Entity, ValidationError};
use crate::query::{count_rows, select_id, Filter};
use crate::session::Session;
use log::{debug, error, info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

struct Assignment {
    entity_name: &'static str,
    id: i64,
    key: CacheKey,
    entity: Rc<dyn Any>,
    revert: Box<dyn Fn()>,
}

/// Open store transaction plus the ids assigned under it.
///
/// Dropping the scope without [`StoreScope::commit`] rolls the transaction
/// back and clears those ids.
pub struct StoreScope<'s> {
    session: &'s Session,
    tx: Option<Transaction<'s>>,
    assigned: RefCell<Vec<Assignment>>,
}

impl<'s> StoreScope<'s> {
    pub(crate) fn begin(session: &'s Session) -> RepoResult<Self> {
        let tx = Transaction::new_unchecked(session.connection(), TransactionBehavior::Immediate)
            .in_statement("BEGIN IMMEDIATE")?;
        Ok(Self {
            session,
            tx: Some(tx),
            assigned: RefCell::new(Vec::new()),
        })
    }

    /// Connection the open transaction runs on.
    pub(crate) fn conn(&self) -> &'s Connection {
        self.session.connection()
    }

    /// Assigns `id` to `entity` for the lifetime of this scope.
    ///
    /// Fails with `IdentityConflict` when the session cache or this scope
    /// already maps `id` to another instance.
    pub(crate) fn assign<T: Entity>(&self, entity: &Rc<T>, id: i64) -> RepoResult<()> {
        let key = CacheKey::of::<T>(id);
        let erased = entity.clone() as Rc<dyn Any>;
        let claimed_in_scope = self
            .assigned
            .borrow()
            .iter()
            .any(|assignment| assignment.key == key && !Rc::ptr_eq(&assignment.entity, &erased));
        if claimed_in_scope || self.session.identity_cache().maps_other(&key, &erased) {
            warn!(
                "event=assign_id module=repo entity={} id={} status=conflict",
                T::ENTITY,
                id
            );
            return Err(RepoError::IdentityConflict {
                entity: T::ENTITY,
                id,
            });
        }

        let had_id = entity.id().is_some();
        entity.db_id().assign(id).map_err(|_| RepoError::IdentityConflict {
            entity: T::ENTITY,
            id,
        })?;

        let tracked = entity.clone();
        let revert: Box<dyn Fn()> = if had_id {
            Box::new(|| {})
        } else {
            Box::new(move || tracked.db_id().clear())
        };
        self.assigned.borrow_mut().push(Assignment {
            entity_name: T::ENTITY,
            id,
            key,
            entity: erased,
            revert,
        });
        Ok(())
    }

    /// Commits and registers every assigned entity in the identity cache.
    pub(crate) fn commit(mut self) -> RepoResult<()> {
        let Some(tx) = self.tx.take() else {
            return Ok(());
        };
        if let Err(err) = tx.commit() {
            self.revert();
            return Err(RepoError::Execution {
                statement: "COMMIT".to_string(),
                source: err,
            });
        }

        let cache = self.session.identity_cache();
        for assignment in self.assigned.take() {
            if !cache.insert_if_absent(assignment.key, assignment.entity) {
                warn!(
                    "event=cache_register module=repo entity={} id={} status=skipped reason=instance_exists",
                    assignment.entity_name, assignment.id
                );
            }
        }
        Ok(())
    }

    fn revert(&self) {
        for assignment in self.assigned.borrow().iter().rev() {
            (assignment.revert)();
        }
    }
}

impl Drop for StoreScope<'_> {
    fn drop(&mut self) {
        if self.tx.is_some() {
            self.revert();
        }
    }
}

/// Counts rows matching the entity id, or its natural key when unstored.
pub(crate) fn exists_in<R>(repo: &R, conn: &Connection, entity: &R::Entity) -> RepoResult<bool>
where
    R: EntityRepository + ?Sized,
{
    let filter = match entity.id() {
        Some(id) => Filter::new().and_eq(R::ID_COLUMN, id),
        None => repo.natural_key(entity),
    };
    Ok(count_rows(conn, R::TABLE, filter)? > 0)
}

/// Makes sure a referenced entity has a row and returns its id.
///
/// - stored and present: its id;
/// - unstored but present by natural key: the looked-up id, assigned to it;
/// - absent: inserted (with its own dependencies first). An entity that
///   already carries an id is re-created under that same id.
pub fn ensure_stored<R>(repo: &R, scope: &StoreScope<'_>, entity: &Rc<R::Entity>) -> RepoResult<i64>
where
    R: EntityRepository + ?Sized,
{
    if exists_in(repo, scope.conn(), entity)? {
        if let Some(id) = entity.id() {
            return Ok(id);
        }
        let id = select_id(scope.conn(), R::TABLE, R::ID_COLUMN, repo.natural_key(entity))?
            .ok_or_else(|| {
                RepoError::Integrity(format!(
                    "{} matched by natural key but its id could not be read",
                    R::Entity::ENTITY
                ))
            })?;
        scope.assign(entity, id)?;
        debug!(
            "event=resolve_dependency module=repo entity={} id={} status=existing",
            R::Entity::ENTITY,
            id
        );
        return Ok(id);
    }

    let id = insert_tracked(repo, scope, entity)?;
    debug!(
        "event=resolve_dependency module=repo entity={} id={} status=created",
        R::Entity::ENTITY,
        id
    );
    Ok(id)
}

fn insert_tracked<R>(repo: &R, scope: &StoreScope<'_>, entity: &Rc<R::Entity>) -> RepoResult<i64>
where
    R: EntityRepository + ?Sized,
{
    let id = repo.insert_row(scope, entity)?;
    scope.assign(entity, id)?;
    Ok(id)
}

/// Stores a new entity in one transaction.
///
/// `associations` runs after the entity row exists, inside the same
/// transaction, with the new id; it writes junction rows.
pub(crate) fn store<R, F>(repo: &R, entity: &Rc<R::Entity>, associations: F) -> RepoResult<Rc<R::Entity>>
where
    R: EntityRepository + ?Sized,
    F: FnOnce(&StoreScope<'_>, i64) -> RepoResult<()>,
{
    if let Some(id) = entity.id() {
        return Err(ValidationError::AlreadyStored {
            entity: R::Entity::ENTITY,
            id,
        }
        .into());
    }
    entity.validate()?;

    let started_at = Instant::now();
    info!(
        "event=store module=repo entity={} status=start",
        R::Entity::ENTITY
    );

    match store_in_scope(repo, entity, associations) {
        Ok(id) => {
            info!(
                "event=store module=repo entity={} status=ok id={} duration_ms={}",
                R::Entity::ENTITY,
                id,
                started_at.elapsed().as_millis()
            );
            Ok(entity.clone())
        }
        Err(err) => {
            error!(
                "event=store module=repo entity={} status=error duration_ms={} error={}",
                R::Entity::ENTITY,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn store_in_scope<R, F>(repo: &R, entity: &Rc<R::Entity>, associations: F) -> RepoResult<i64>
where
    R: EntityRepository + ?Sized,
    F: FnOnce(&StoreScope<'_>, i64) -> RepoResult<()>,
{
    let scope = StoreScope::begin(repo.session())?;
    let id = insert_tracked(repo, &scope, entity)?;
    associations(&scope, id)?;
    scope.commit()?;
    Ok(id)
}
