//! Primer pair adaptor.
//!
//! # Invariants
//! - A pair and both of its primers hydrate from one joined row.
//! - The natural key is the (left, right) primer combination, matched
//!   through primer names so it resolves for unstored primers too.
//! - A pair is always stored with at least one amplified guide RNA.

use super::dependency::{self, ensure_stored, StoreScope};
use super::hydrate::{cached_or_build, fetch_all, fetch_one, read_strand};
use super::{EntityRepository, PrimerRepository};
use crate::error::{RepoError, RepoResult};
use crate::model::{validate_unstored, Entity, GuideRna, PairType, PrimerPair, ValidationError};
use crate::query::{in_placeholders, BoundStatement, Filter, InsertStatement, SelectQuery};
use crate::session::Session;
use rusqlite::types::Value;
use rusqlite::Row;
use std::collections::BTreeSet;
use std::rc::Rc;

const PRIMER_PAIR_SELECT_SQL: &str = "SELECT
    pp.primer_pair_id AS primer_pair_id,
    pp.pair_type AS pair_type,
    pp.pair_chr AS pair_chr,
    pp.pair_start AS pair_start,
    pp.pair_end AS pair_end,
    pp.pair_strand AS pair_strand,
    pp.product_size AS product_size,
    lp.primer_id AS lp_primer_id,
    lp.primer_name AS lp_primer_name,
    lp.primer_sequence AS lp_primer_sequence,
    lp.primer_tail AS lp_primer_tail,
    lp.primer_chr AS lp_primer_chr,
    lp.primer_start AS lp_primer_start,
    lp.primer_end AS lp_primer_end,
    lp.primer_strand AS lp_primer_strand,
    lp.plate_id AS lp_plate_id,
    lp.well_id AS lp_well_id,
    rp.primer_id AS rp_primer_id,
    rp.primer_name AS rp_primer_name,
    rp.primer_sequence AS rp_primer_sequence,
    rp.primer_tail AS rp_primer_tail,
    rp.primer_chr AS rp_primer_chr,
    rp.primer_start AS rp_primer_start,
    rp.primer_end AS rp_primer_end,
    rp.primer_strand AS rp_primer_strand,
    rp.plate_id AS rp_plate_id,
    rp.well_id AS rp_well_id
FROM primer_pair pp
JOIN primer lp ON lp.primer_id = pp.left_primer_id
JOIN primer rp ON rp.primer_id = pp.right_primer_id";

const AMPLICON_INSERT_SQL: &str =
    "INSERT INTO amplicon_guide_rna (primer_pair_id, guide_rna_id) VALUES (?, ?)";

pub struct PrimerPairRepository<'s> {
    session: &'s Session,
}

impl<'s> PrimerPairRepository<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self { session }
    }

    /// Loads the pair made of the two named primers.
    pub fn fetch_by_primer_names(&self, left_name: &str, right_name: &str) -> RepoResult<Rc<PrimerPair>> {
        let query = SelectQuery::new(Self::SELECT_SQL).filter(
            Filter::new()
                .and_eq("lp.primer_name", left_name.to_string())
                .and_eq("rp.primer_name", right_name.to_string()),
        );
        fetch_one(self, query, || format!("{left_name}_{right_name}"))
    }

    /// Pairs designed to amplify `guide_rna`.
    pub fn fetch_all_by_guide_rna(&self, guide_rna: &GuideRna) -> RepoResult<Vec<Rc<PrimerPair>>> {
        let guide_rna_id = guide_rna
            .id()
            .ok_or(ValidationError::NotStored(GuideRna::ENTITY))?;
        self.fetch_all_by_guide_rna_ids(vec![guide_rna_id.into()])
    }

    /// Pairs amplifying any of `guide_rnas`, each pair once.
    pub fn fetch_all_by_guide_rnas(&self, guide_rnas: &[Rc<GuideRna>]) -> RepoResult<Vec<Rc<PrimerPair>>> {
        if guide_rnas.is_empty() {
            return Ok(Vec::new());
        }
        let ids = guide_rnas
            .iter()
            .map(|guide_rna| {
                guide_rna
                    .id()
                    .map(Value::from)
                    .ok_or(ValidationError::NotStored(GuideRna::ENTITY))
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.fetch_all_by_guide_rna_ids(ids)
    }

    fn fetch_all_by_guide_rna_ids(&self, ids: Vec<Value>) -> RepoResult<Vec<Rc<PrimerPair>>> {
        let fragment = format!(
            "pp.primer_pair_id IN (
                SELECT primer_pair_id FROM amplicon_guide_rna WHERE guide_rna_id IN ({})
            )",
            in_placeholders(ids.len())
        );
        let query = SelectQuery::new(Self::SELECT_SQL)
            .filter(Filter::new().and_raw(fragment, ids))
            .order_by("pp.primer_pair_id");
        fetch_all(self, query)
    }

    /// Stores `primer_pair` with one amplicon row per guide RNA.
    ///
    /// Unstored primers and guides are created in the same transaction.
    pub fn store_with_guide_rnas(
        &self,
        primer_pair: &Rc<PrimerPair>,
        guide_rnas: &[Rc<GuideRna>],
    ) -> RepoResult<Rc<PrimerPair>> {
        validate_guide_rnas(guide_rnas)?;

        let guide_repo = self.session.guide_rnas();
        dependency::store(self, primer_pair, |scope, pair_id| {
            for guide_rna in guide_rnas {
                let guide_rna_id = ensure_stored(&guide_repo, scope, guide_rna)?;
                BoundStatement::new(
                    AMPLICON_INSERT_SQL.to_string(),
                    vec![pair_id.into(), guide_rna_id.into()],
                )?
                .execute(scope.conn())?;
            }
            Ok(())
        })
    }
}

fn validate_guide_rnas(guide_rnas: &[Rc<GuideRna>]) -> Result<(), ValidationError> {
    if guide_rnas.is_empty() {
        return Err(ValidationError::MissingAssociation {
            entity: PrimerPair::ENTITY,
            association: "guide_rna",
        });
    }
    let mut seen = BTreeSet::new();
    for guide_rna in guide_rnas {
        if !seen.insert(guide_rna.name.as_str()) {
            return Err(ValidationError::DuplicateAssociation {
                entity: PrimerPair::ENTITY,
                association: "guide_rna",
                key: guide_rna.name.clone(),
            });
        }
        validate_unstored(guide_rna.as_ref())?;
    }
    Ok(())
}

impl EntityRepository for PrimerPairRepository<'_> {
    type Entity = PrimerPair;

    const TABLE: &'static str = "primer_pair";
    const ID_COLUMN: &'static str = "primer_pair_id";
    const SELECT_SQL: &'static str = PRIMER_PAIR_SELECT_SQL;
    const ID_FILTER: &'static str = "pp.primer_pair_id";

    fn session(&self) -> &Session {
        self.session
    }

    fn hydrate_row(&self, row: &Row<'_>) -> RepoResult<Rc<PrimerPair>> {
        let id: i64 = row.get("primer_pair_id")?;
        cached_or_build(self.session, id, |db_id| {
            let primers = PrimerRepository::new(self.session);
            let left_primer = primers.hydrate_prefixed(row, "lp_")?;
            let right_primer = primers.hydrate_prefixed(row, "rp_")?;

            let pair_type: String = row.get("pair_type")?;
            let pair_type = PairType::parse(&pair_type).ok_or_else(|| {
                RepoError::InvalidData(format!("invalid pair type `{pair_type}` in primer_pair.pair_type"))
            })?;
            let location = (
                row.get::<_, String>("pair_chr")?,
                row.get::<_, i64>("pair_start")?,
                row.get::<_, i64>("pair_end")?,
                read_strand(row, "pair_strand")?,
            );

            Ok(PrimerPair::from_parts(
                db_id,
                pair_type,
                left_primer,
                right_primer,
                location,
                row.get("product_size")?,
            ))
        })
    }

    fn natural_key(&self, primer_pair: &PrimerPair) -> Filter {
        Filter::new().and_raw(
            "left_primer_id = (SELECT primer_id FROM primer WHERE primer_name = ?)
             AND right_primer_id = (SELECT primer_id FROM primer WHERE primer_name = ?)",
            vec![
                primer_pair.left_primer.name.clone().into(),
                primer_pair.right_primer.name.clone().into(),
            ],
        )
    }

    fn insert_row(&self, scope: &StoreScope<'_>, primer_pair: &PrimerPair) -> RepoResult<i64> {
        let primers = self.session.primers();
        let left_primer_id = ensure_stored(&primers, scope, &primer_pair.left_primer)?;
        let right_primer_id = ensure_stored(&primers, scope, &primer_pair.right_primer)?;

        InsertStatement::new(Self::TABLE, Self::ID_COLUMN)
            .id(primer_pair.id())
            .value("pair_type", primer_pair.pair_type.as_str().to_string())
            .value("left_primer_id", left_primer_id)
            .value("right_primer_id", right_primer_id)
            .value("pair_chr", primer_pair.chr.clone())
            .value("pair_start", primer_pair.start)
            .value("pair_end", primer_pair.end)
            .value("pair_strand", primer_pair.strand.to_db())
            .value("product_size", primer_pair.product_size)
            .execute_returning_id(scope.conn())
    }

    /// A pair always needs its guide RNAs; use
    /// [`PrimerPairRepository::store_with_guide_rnas`].
    fn store(&self, primer_pair: &Rc<PrimerPair>) -> RepoResult<Rc<PrimerPair>> {
        self.store_with_guide_rnas(primer_pair, &[])
    }
}
