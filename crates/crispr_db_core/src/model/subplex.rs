//! Subplex: one amplicon within a sequencing plex.

use super::validation::{require_non_empty, require_positive};
use super::{DbId, Entity, PrimerPair, ValidationError};
use std::rc::Rc;

#[derive(Debug)]
pub struct Subplex {
    db_id: DbId,
    pub plex_name: String,
    pub subplex_number: i64,
    pub plate_num: i64,
    pub primer_pair: Rc<PrimerPair>,
}

impl Subplex {
    pub fn new(
        plex_name: impl Into<String>,
        subplex_number: i64,
        plate_num: i64,
        primer_pair: Rc<PrimerPair>,
    ) -> Self {
        Self {
            db_id: DbId::new(),
            plex_name: plex_name.into(),
            subplex_number,
            plate_num,
            primer_pair,
        }
    }

    pub(crate) fn with_db_id(mut self, db_id: DbId) -> Self {
        self.db_id = db_id;
        self
    }
}

impl Entity for Subplex {
    const ENTITY: &'static str = "subplex";

    fn db_id(&self) -> &DbId {
        &self.db_id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty(Self::ENTITY, "plex_name", &self.plex_name)?;
        require_positive(Self::ENTITY, "subplex_number", self.subplex_number as f64)?;
        require_positive(Self::ENTITY, "plate_num", self.plate_num as f64)?;
        // Amplicon rows are only written by the pair's own store.
        if self.primer_pair.id().is_none() {
            return Err(ValidationError::MissingAssociation {
                entity: PrimerPair::ENTITY,
                association: "guide_rna",
            });
        }
        Ok(())
    }
}
