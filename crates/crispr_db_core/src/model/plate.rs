//! Physical plate a guide RNA or primer may be positioned on.
//!
//! Well bookkeeping stays with the owning record as an opaque `well_id`.

use super::validation::require_non_empty;
use super::{DbId, Entity, ValidationError};

#[derive(Debug)]
pub struct Plate {
    db_id: DbId,
    pub name: String,
    pub plate_type: String,
}

impl Plate {
    pub fn new(name: impl Into<String>, plate_type: impl Into<String>) -> Self {
        Self {
            db_id: DbId::new(),
            name: name.into(),
            plate_type: plate_type.into(),
        }
    }

    pub(crate) fn with_db_id(mut self, db_id: DbId) -> Self {
        self.db_id = db_id;
        self
    }
}

impl Entity for Plate {
    const ENTITY: &'static str = "plate";

    fn db_id(&self) -> &DbId {
        &self.db_id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty(Self::ENTITY, "name", &self.name)?;
        require_non_empty(Self::ENTITY, "plate_type", &self.plate_type)
    }
}
