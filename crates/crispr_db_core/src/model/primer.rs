//! Single PCR primer.

use super::validation::{require_dna, require_non_empty, require_range};
use super::{validate_unstored, DbId, Entity, Plate, Strand, ValidationError};
use std::rc::Rc;

#[derive(Debug)]
pub struct Primer {
    db_id: DbId,
    /// Natural key, `chr:start-end:strand`.
    pub name: String,
    /// Full sequence as ordered, including `tail` when present.
    pub sequence: String,
    /// Adaptor tail prefixed onto the gene-specific sequence.
    pub tail: Option<String>,
    pub chr: String,
    pub start: i64,
    pub end: i64,
    pub strand: Strand,
    pub plate: Option<Rc<Plate>>,
    pub well_id: Option<String>,
}

impl Primer {
    pub fn new(
        chr: impl Into<String>,
        start: i64,
        end: i64,
        strand: Strand,
        sequence: impl Into<String>,
    ) -> Self {
        let chr = chr.into();
        Self {
            db_id: DbId::new(),
            name: primer_name(&chr, start, end, strand),
            sequence: sequence.into(),
            tail: None,
            chr,
            start,
            end,
            strand,
            plate: None,
            well_id: None,
        }
    }

    /// Gene-specific part of the sequence, i.e. without the tail.
    pub fn untailed_sequence(&self) -> &str {
        match &self.tail {
            Some(tail) => self.sequence.strip_prefix(tail.as_str()).unwrap_or(&self.sequence),
            None => &self.sequence,
        }
    }

    pub(crate) fn with_db_id(mut self, db_id: DbId) -> Self {
        self.db_id = db_id;
        self
    }
}

impl Entity for Primer {
    const ENTITY: &'static str = "primer";

    fn db_id(&self) -> &DbId {
        &self.db_id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty(Self::ENTITY, "name", &self.name)?;
        require_non_empty(Self::ENTITY, "chr", &self.chr)?;
        require_dna(Self::ENTITY, &self.sequence)?;
        require_range(Self::ENTITY, self.start, self.end)?;
        if let Some(tail) = &self.tail {
            require_dna(Self::ENTITY, tail)?;
            if !self.sequence.starts_with(tail.as_str()) || self.sequence.len() == tail.len() {
                return Err(ValidationError::TailMismatch {
                    sequence: self.sequence.clone(),
                    tail: tail.clone(),
                });
            }
        }
        if let Some(plate) = &self.plate {
            validate_unstored(plate.as_ref())?;
        }
        Ok(())
    }
}

pub(crate) fn primer_name(chr: &str, start: i64, end: i64, strand: Strand) -> String {
    format!("{chr}:{start}-{end}:{}", strand.as_str())
}
