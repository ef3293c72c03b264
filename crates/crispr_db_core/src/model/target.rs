//! Genomic target a set of guide RNAs is designed against.

use super::validation::{require_non_empty, require_range};
use super::{DbId, Entity, Strand, ValidationError};
use crate::status::Status;

#[derive(Debug)]
pub struct Target {
    db_id: DbId,
    /// Natural key.
    pub name: String,
    pub assembly: Option<String>,
    pub chr: Option<String>,
    pub start: i64,
    pub end: i64,
    pub strand: Strand,
    pub species: Option<String>,
    pub gene_id: Option<String>,
    pub gene_name: Option<String>,
    pub requestor: String,
    pub status: Status,
}

impl Target {
    /// Creates an unstored target in `REQUESTED` state.
    pub fn new(
        name: impl Into<String>,
        start: i64,
        end: i64,
        strand: Strand,
        requestor: impl Into<String>,
    ) -> Self {
        Self {
            db_id: DbId::new(),
            name: name.into(),
            assembly: None,
            chr: None,
            start,
            end,
            strand,
            species: None,
            gene_id: None,
            gene_name: None,
            requestor: requestor.into(),
            status: Status::Requested,
        }
    }

    pub(crate) fn with_db_id(mut self, db_id: DbId) -> Self {
        self.db_id = db_id;
        self
    }
}

impl Entity for Target {
    const ENTITY: &'static str = "target";

    fn db_id(&self) -> &DbId {
        &self.db_id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty(Self::ENTITY, "name", &self.name)?;
        require_non_empty(Self::ENTITY, "requestor", &self.requestor)?;
        require_range(Self::ENTITY, self.start, self.end)
    }
}
