//! Guide RNA design and its off-target summary.

use super::validation::{require_dna, require_non_empty, require_range};
use super::{validate_unstored, DbId, Entity, Plate, Strand, Target, ValidationError};
use crate::status::Status;
use std::rc::Rc;

#[derive(Debug)]
pub struct GuideRna {
    db_id: DbId,
    /// Natural key.
    pub name: String,
    pub chr: Option<String>,
    pub start: i64,
    pub end: i64,
    pub strand: Strand,
    pub sequence: String,
    /// Number of extra 5' G bases added for transcription.
    pub five_prime_gs: i64,
    pub score: Option<f64>,
    pub off_target_score: Option<f64>,
    pub coding_score: Option<f64>,
    pub target: Rc<Target>,
    /// `None` until the guide is positioned on a plate.
    pub plate: Option<Rc<Plate>>,
    pub well_id: Option<String>,
    pub status: Status,
}

impl GuideRna {
    /// Creates an unstored guide in `DESIGNED` state.
    pub fn new(
        name: impl Into<String>,
        sequence: impl Into<String>,
        start: i64,
        end: i64,
        strand: Strand,
        target: Rc<Target>,
    ) -> Self {
        Self {
            db_id: DbId::new(),
            name: name.into(),
            chr: target.chr.clone(),
            start,
            end,
            strand,
            sequence: sequence.into(),
            five_prime_gs: 0,
            score: None,
            off_target_score: None,
            coding_score: None,
            target,
            plate: None,
            well_id: None,
            status: Status::Designed,
        }
    }

    pub(crate) fn with_db_id(mut self, db_id: DbId) -> Self {
        self.db_id = db_id;
        self
    }
}

impl Entity for GuideRna {
    const ENTITY: &'static str = "guide_rna";

    fn db_id(&self) -> &DbId {
        &self.db_id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty(Self::ENTITY, "name", &self.name)?;
        require_dna(Self::ENTITY, &self.sequence)?;
        require_range(Self::ENTITY, self.start, self.end)?;
        validate_unstored(self.target.as_ref())?;
        if let Some(plate) = &self.plate {
            validate_unstored(plate.as_ref())?;
        }
        Ok(())
    }
}

/// Off-target hit positions grouped by genomic context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffTargetInfo {
    pub exon: Vec<String>,
    pub intron: Vec<String>,
    pub nongenic: Vec<String>,
}

impl OffTargetInfo {
    pub fn is_empty(&self) -> bool {
        self.exon.is_empty() && self.intron.is_empty() && self.nongenic.is_empty()
    }

    pub fn total_hits(&self) -> usize {
        self.exon.len() + self.intron.len() + self.nongenic.len()
    }

    /// Flattens into `(hit_class, position)` rows.
    pub(crate) fn rows(&self) -> impl Iterator<Item = (&'static str, &str)> {
        let exon = self.exon.iter().map(|pos| ("exon", pos.as_str()));
        let intron = self.intron.iter().map(|pos| ("intron", pos.as_str()));
        let nongenic = self.nongenic.iter().map(|pos| ("nongenic", pos.as_str()));
        exon.chain(intron).chain(nongenic)
    }

    pub(crate) fn push(&mut self, hit_class: &str, position: String) -> bool {
        match hit_class {
            "exon" => self.exon.push(position),
            "intron" => self.intron.push(position),
            "nongenic" => self.nongenic.push(position),
            _ => return false,
        }
        true
    }
}
