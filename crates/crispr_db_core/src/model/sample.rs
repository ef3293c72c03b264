//! Screened sample (embryo, sperm, fin clip) from an injection.

use super::validation::{require_non_empty, require_positive};
use super::{validate_unstored, DbId, Entity, InjectionPool, Subplex, ValidationError};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generation {
    G0,
    F1,
    F2,
}

impl Generation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::G0 => "G0",
            Self::F1 => "F1",
            Self::F2 => "F2",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "G0" => Some(Self::G0),
            "F1" => Some(Self::F1),
            "F2" => Some(Self::F2),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct Sample {
    db_id: DbId,
    /// Natural key, conventionally `<injection>_<number>`.
    pub name: String,
    pub sample_number: i64,
    pub generation: Generation,
    pub sample_type: String,
    pub species: String,
    pub well_id: Option<String>,
    pub barcode_id: Option<i64>,
    pub injection_pool: Rc<InjectionPool>,
    /// `None` until the sample is assigned to a sequencing subplex.
    pub subplex: Option<Rc<Subplex>>,
}

impl Sample {
    pub fn new(
        injection_pool: Rc<InjectionPool>,
        sample_number: i64,
        generation: Generation,
        sample_type: impl Into<String>,
        species: impl Into<String>,
    ) -> Self {
        Self {
            db_id: DbId::new(),
            name: format!("{}_{}", injection_pool.name, sample_number),
            sample_number,
            generation,
            sample_type: sample_type.into(),
            species: species.into(),
            well_id: None,
            barcode_id: None,
            injection_pool,
            subplex: None,
        }
    }

    pub(crate) fn with_db_id(mut self, db_id: DbId) -> Self {
        self.db_id = db_id;
        self
    }
}

impl Entity for Sample {
    const ENTITY: &'static str = "sample";

    fn db_id(&self) -> &DbId {
        &self.db_id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty(Self::ENTITY, "name", &self.name)?;
        require_non_empty(Self::ENTITY, "sample_type", &self.sample_type)?;
        require_non_empty(Self::ENTITY, "species", &self.species)?;
        require_positive(Self::ENTITY, "sample_number", self.sample_number as f64)?;
        validate_unstored(self.injection_pool.as_ref())?;
        if let Some(subplex) = &self.subplex {
            validate_unstored(subplex.as_ref())?;
        }
        Ok(())
    }
}
