//! In-memory record types.
//!
//! # Responsibility
//! - Define the entity shapes adaptors hydrate and store.
//! - Validate scalar fields before anything reaches the database.
//!
//! # Invariants
//! - An entity's surrogate id is absent until first store and never changes
//!   once assigned.
//! - Entities are shared as `Rc<T>`; scalar fields are fixed once wrapped.

use std::any::Any;
use std::cell::Cell;
use std::fmt::Debug;

pub mod guide_rna;
pub mod injection_pool;
pub mod plate;
pub mod primer;
pub mod primer_pair;
pub mod sample;
pub mod subplex;
pub mod target;
mod validation;

pub use guide_rna::{GuideRna, OffTargetInfo};
pub use injection_pool::{InjectionPool, PooledGuideRna};
pub use plate::Plate;
pub use primer::Primer;
pub use primer_pair::{PairType, PrimerPair};
pub use sample::{Generation, Sample};
pub use subplex::Subplex;
pub use target::Target;
pub use validation::ValidationError;

/// Database surrogate id slot.
///
/// Starts empty for application-built entities and is filled by the owning
/// adaptor after insert. Only store rollback may clear an id this crate
/// assigned itself.
#[derive(Debug, Default)]
pub struct DbId(Cell<Option<i64>>);

impl DbId {
    pub fn new() -> Self {
        Self(Cell::new(None))
    }

    /// Slot for an entity hydrated from an existing row.
    pub fn persisted(id: i64) -> Self {
        Self(Cell::new(Some(id)))
    }

    pub fn get(&self) -> Option<i64> {
        self.0.get()
    }

    /// Assigns `id`. Returns the current id when a different one is already set.
    pub(crate) fn assign(&self, id: i64) -> Result<(), i64> {
        match self.0.get() {
            Some(current) if current != id => Err(current),
            Some(_) => Ok(()),
            None => {
                self.0.set(Some(id));
                Ok(())
            }
        }
    }

    pub(crate) fn clear(&self) {
        self.0.set(None);
    }
}

/// Common surface of every persisted record type.
pub trait Entity: Any + Debug {
    /// Stable entity name used in errors and log events.
    const ENTITY: &'static str;

    fn db_id(&self) -> &DbId;

    /// Checks scalar fields, plus any referenced entity that is not yet stored.
    fn validate(&self) -> Result<(), ValidationError>;

    fn id(&self) -> Option<i64> {
        self.db_id().get()
    }
}

/// Genomic strand, stored as `1` / `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    pub fn to_db(self) -> i64 {
        match self {
            Self::Forward => 1,
            Self::Reverse => -1,
        }
    }

    pub fn from_db(value: i64) -> Option<Self> {
        match value {
            1 => Some(Self::Forward),
            -1 => Some(Self::Reverse),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Forward => "1",
            Self::Reverse => "-1",
        }
    }
}

/// Validates a reference only when it still needs to be inserted.
pub(crate) fn validate_unstored<T: Entity>(reference: &T) -> Result<(), ValidationError> {
    if reference.id().is_none() {
        reference.validate()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{DbId, Strand};

    #[test]
    fn db_id_assigns_once() {
        let id = DbId::new();
        assert_eq!(id.get(), None);
        id.assign(7).unwrap();
        id.assign(7).unwrap();
        assert_eq!(id.assign(8), Err(7));
        assert_eq!(id.get(), Some(7));
    }

    #[test]
    fn strand_round_trips_db_codes() {
        assert_eq!(Strand::from_db(Strand::Reverse.to_db()), Some(Strand::Reverse));
        assert_eq!(Strand::from_db(0), None);
    }
}
