//! Injection pool: a mix of guide RNAs injected into one clutch.

use super::validation::{require_date, require_non_empty, require_positive};
use super::{validate_unstored, DbId, Entity, GuideRna, ValidationError};
use std::collections::BTreeSet;
use std::rc::Rc;

/// One guide RNA in a pool with its injected concentration (ng/ul).
#[derive(Debug, Clone)]
pub struct PooledGuideRna {
    pub guide_rna: Rc<GuideRna>,
    pub concentration: f64,
}

#[derive(Debug)]
pub struct InjectionPool {
    db_id: DbId,
    /// Natural key.
    pub name: String,
    pub cas9_type: String,
    pub cas9_concentration: Option<f64>,
    /// `sgRNA` or `crRNA`.
    pub guide_rna_type: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    pub line_injected: Option<String>,
    pub line_raised: Option<String>,
    pub sorted_by: Option<String>,
    pub guide_rnas: Vec<PooledGuideRna>,
}

impl InjectionPool {
    pub fn new(
        name: impl Into<String>,
        cas9_type: impl Into<String>,
        guide_rna_type: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            db_id: DbId::new(),
            name: name.into(),
            cas9_type: cas9_type.into(),
            cas9_concentration: None,
            guide_rna_type: guide_rna_type.into(),
            date: date.into(),
            line_injected: None,
            line_raised: None,
            sorted_by: None,
            guide_rnas: Vec::new(),
        }
    }

    pub fn add_guide_rna(&mut self, guide_rna: Rc<GuideRna>, concentration: f64) {
        self.guide_rnas.push(PooledGuideRna {
            guide_rna,
            concentration,
        });
    }

    pub(crate) fn with_db_id(mut self, db_id: DbId) -> Self {
        self.db_id = db_id;
        self
    }
}

impl Entity for InjectionPool {
    const ENTITY: &'static str = "injection_pool";

    fn db_id(&self) -> &DbId {
        &self.db_id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty(Self::ENTITY, "name", &self.name)?;
        require_non_empty(Self::ENTITY, "cas9_type", &self.cas9_type)?;
        require_non_empty(Self::ENTITY, "guide_rna_type", &self.guide_rna_type)?;
        require_date(&self.date)?;
        if let Some(concentration) = self.cas9_concentration {
            require_positive(Self::ENTITY, "cas9_concentration", concentration)?;
        }

        if self.guide_rnas.is_empty() {
            return Err(ValidationError::MissingAssociation {
                entity: Self::ENTITY,
                association: "guide_rna",
            });
        }
        let mut seen = BTreeSet::new();
        for pooled in &self.guide_rnas {
            if !seen.insert(pooled.guide_rna.name.as_str()) {
                return Err(ValidationError::DuplicateAssociation {
                    entity: Self::ENTITY,
                    association: "guide_rna",
                    key: pooled.guide_rna.name.clone(),
                });
            }
            require_positive(
                Self::ENTITY,
                "guide_rna_concentration",
                pooled.concentration,
            )?;
            validate_unstored(pooled.guide_rna.as_ref())?;
        }
        Ok(())
    }
}
