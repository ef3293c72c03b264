//! Identity cache: one live instance per `(entity type, id)`.
//!
//! # Invariants
//! - Entries are never evicted for the lifetime of the owning session.
//! - A lookup shares the cached `Rc`; it never copies the entity.
//! - Offering a different instance for a mapped key is an error.

use crate::error::{RepoError, RepoResult};
use crate::model::Entity;
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct CacheKey {
    type_id: TypeId,
    id: i64,
}

impl CacheKey {
    pub(crate) fn of<T: Entity>(id: i64) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            id,
        }
    }
}

#[derive(Default)]
pub struct IdentityCache {
    entries: RefCell<HashMap<CacheKey, Rc<dyn Any>>>,
}

impl IdentityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup<T: Entity>(&self, id: i64) -> Option<Rc<T>> {
        let entry = self.entries.borrow().get(&CacheKey::of::<T>(id)).cloned()?;
        entry.downcast::<T>().ok()
    }

    /// Registers `entity` under `id`.
    ///
    /// Re-registering the same instance is a no-op.
    pub fn insert<T: Entity>(&self, id: i64, entity: &Rc<T>) -> RepoResult<()> {
        let key = CacheKey::of::<T>(id);
        let mut entries = self.entries.borrow_mut();
        if let Some(existing) = entries.get(&key) {
            let same = existing
                .clone()
                .downcast::<T>()
                .map(|existing| Rc::ptr_eq(&existing, entity))
                .unwrap_or(false);
            if same {
                return Ok(());
            }
            return Err(RepoError::IdentityConflict {
                entity: T::ENTITY,
                id,
            });
        }
        entries.insert(key, entity.clone() as Rc<dyn Any>);
        Ok(())
    }

    /// Registers an already type-erased entry unless the key is taken.
    ///
    /// Returns `false` when another instance already owns the key.
    pub(crate) fn insert_if_absent(&self, key: CacheKey, entity: Rc<dyn Any>) -> bool {
        let mut entries = self.entries.borrow_mut();
        if let Some(existing) = entries.get(&key) {
            return Rc::ptr_eq(existing, &entity);
        }
        entries.insert(key, entity);
        true
    }

    /// Whether `key` is mapped to an instance other than `entity`.
    pub(crate) fn maps_other(&self, key: &CacheKey, entity: &Rc<dyn Any>) -> bool {
        self.entries
            .borrow()
            .get(key)
            .is_some_and(|existing| !Rc::ptr_eq(existing, entity))
    }

    pub fn contains<T: Entity>(&self, id: i64) -> bool {
        self.entries.borrow().contains_key(&CacheKey::of::<T>(id))
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl std::fmt::Debug for IdentityCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityCache")
            .field("len", &self.len())
            .finish()
    }
}
