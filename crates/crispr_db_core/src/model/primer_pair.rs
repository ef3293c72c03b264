//! Primer pair defining one amplicon.

use super::validation::{require_positive, require_range};
use super::{validate_unstored, DbId, Entity, Primer, Strand, ValidationError};
use std::rc::Rc;

/// Screening role of a primer pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairType {
    /// Outer pair of a nested PCR.
    Ext,
    /// Inner pair of a nested PCR.
    Int,
    ExtIllumina,
    IntIllumina,
}

impl PairType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ext => "ext",
            Self::Int => "int",
            Self::ExtIllumina => "ext-illumina",
            Self::IntIllumina => "int-illumina",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ext" => Some(Self::Ext),
            "int" => Some(Self::Int),
            "ext-illumina" => Some(Self::ExtIllumina),
            "int-illumina" => Some(Self::IntIllumina),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct PrimerPair {
    db_id: DbId,
    pub pair_type: PairType,
    pub left_primer: Rc<Primer>,
    pub right_primer: Rc<Primer>,
    pub chr: String,
    pub start: i64,
    pub end: i64,
    pub strand: Strand,
    pub product_size: i64,
}

impl PrimerPair {
    /// Builds a pair whose amplicon spans from the left primer start to the
    /// right primer end.
    pub fn new(
        pair_type: PairType,
        left_primer: Rc<Primer>,
        right_primer: Rc<Primer>,
        product_size: i64,
    ) -> Self {
        Self {
            db_id: DbId::new(),
            pair_type,
            chr: left_primer.chr.clone(),
            start: left_primer.start,
            end: right_primer.end,
            strand: Strand::Forward,
            left_primer,
            right_primer,
            product_size,
        }
    }

    /// `left_name_right_name`, used in logs and error keys.
    pub fn pair_name(&self) -> String {
        format!("{}_{}", self.left_primer.name, self.right_primer.name)
    }

    pub(crate) fn from_parts(
        db_id: DbId,
        pair_type: PairType,
        left_primer: Rc<Primer>,
        right_primer: Rc<Primer>,
        location: (String, i64, i64, Strand),
        product_size: i64,
    ) -> Self {
        let (chr, start, end, strand) = location;
        Self {
            db_id,
            pair_type,
            left_primer,
            right_primer,
            chr,
            start,
            end,
            strand,
            product_size,
        }
    }
}

impl Entity for PrimerPair {
    const ENTITY: &'static str = "primer_pair";

    fn db_id(&self) -> &DbId {
        &self.db_id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_range(Self::ENTITY, self.start, self.end)?;
        require_positive(Self::ENTITY, "product_size", self.product_size as f64)?;
        validate_unstored(self.left_primer.as_ref())?;
        validate_unstored(self.right_primer.as_ref())
    }
}
