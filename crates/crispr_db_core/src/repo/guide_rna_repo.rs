//! Guide RNA adaptor, including off-target hit records.
//!
//! # Invariants
//! - `guide_rna_name` is the natural key.
//! - The owning target is resolved through the target adaptor, never by
//!   reading target columns here.

use super::dependency::{ensure_stored, StoreScope};
use super::hydrate::{cached_or_build, fetch_all, fetch_one, optional_reference, read_strand};
use super::EntityRepository;
use crate::error::{RepoError, RepoResult};
use crate::model::{Entity, GuideRna, OffTargetInfo, PrimerPair, Target, ValidationError};
use crate::query::{BoundStatement, Filter, InsertStatement, SelectQuery};
use crate::session::Session;
use crate::status::Status;
use log::info;
use rusqlite::Row;
use std::rc::Rc;

const GUIDE_RNA_SELECT_SQL: &str = "SELECT
    g.guide_rna_id AS guide_rna_id,
    g.guide_rna_name AS guide_rna_name,
    g.guide_rna_chr AS guide_rna_chr,
    g.guide_rna_start AS guide_rna_start,
    g.guide_rna_end AS guide_rna_end,
    g.guide_rna_strand AS guide_rna_strand,
    g.sequence AS sequence,
    g.five_prime_gs AS five_prime_gs,
    g.score AS score,
    g.off_target_score AS off_target_score,
    g.coding_score AS coding_score,
    g.target_id AS target_id,
    g.plate_id AS plate_id,
    g.well_id AS well_id,
    g.status_id AS status_id
FROM guide_rna g";

const OFF_TARGET_SELECT_SQL: &str = "SELECT hit_class, position
FROM guide_rna_off_target
WHERE guide_rna_id = ?
ORDER BY hit_class, position";

pub struct GuideRnaRepository<'s> {
    session: &'s Session,
}

impl<'s> GuideRnaRepository<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self { session }
    }

    pub fn fetch_by_name(&self, name: &str) -> RepoResult<Rc<GuideRna>> {
        let query = SelectQuery::new(Self::SELECT_SQL)
            .filter(Filter::new().and_eq("g.guide_rna_name", name.to_string()));
        fetch_one(self, query, || name.to_string())
    }

    /// Loads every guide whose id is in `ids`, ordered by id. Unknown ids are
    /// skipped.
    pub fn fetch_all_by_ids(&self, ids: &[i64]) -> RepoResult<Vec<Rc<GuideRna>>> {
        let query = SelectQuery::new(Self::SELECT_SQL)
            .filter(Filter::new().and_in("g.guide_rna_id", ids.iter().copied()))
            .order_by("g.guide_rna_id");
        fetch_all(self, query)
    }

    pub fn fetch_all_by_target(&self, target: &Target) -> RepoResult<Vec<Rc<GuideRna>>> {
        let target_id = target
            .id()
            .ok_or(ValidationError::NotStored(Target::ENTITY))?;
        let query = SelectQuery::new(Self::SELECT_SQL)
            .filter(Filter::new().and_eq("g.target_id", target_id))
            .order_by("g.guide_rna_id");
        fetch_all(self, query)
    }

    /// Guides amplified by `primer_pair`, via the amplicon junction table.
    pub fn fetch_all_by_primer_pair(&self, primer_pair: &PrimerPair) -> RepoResult<Vec<Rc<GuideRna>>> {
        let pair_id = primer_pair
            .id()
            .ok_or(ValidationError::NotStored(PrimerPair::ENTITY))?;
        let query = SelectQuery::new(Self::SELECT_SQL)
            .filter(Filter::new().and_raw(
                "g.guide_rna_id IN (
                    SELECT guide_rna_id FROM amplicon_guide_rna WHERE primer_pair_id = ?
                )",
                vec![pair_id.into()],
            ))
            .order_by("g.guide_rna_id");
        fetch_all(self, query)
    }

    pub fn fetch_all_by_status(&self, status: Status) -> RepoResult<Vec<Rc<GuideRna>>> {
        let status_id = self.session.statuses()?.id_for(status)?;
        let query = SelectQuery::new(Self::SELECT_SQL)
            .filter(Filter::new().and_eq("g.status_id", status_id))
            .order_by("g.guide_rna_id");
        fetch_all(self, query)
    }

    /// Writes off-target hits for a stored guide in one transaction.
    ///
    /// Returns the number of rows written. An empty `info` writes nothing and
    /// succeeds.
    pub fn store_off_target_info(&self, guide_rna: &GuideRna, info: &OffTargetInfo) -> RepoResult<usize> {
        let guide_rna_id = guide_rna
            .id()
            .ok_or(ValidationError::NotStored(GuideRna::ENTITY))?;
        if info.is_empty() {
            info!(
                "event=store_off_target module=repo entity=guide_rna id={} status=skipped reason=no_data",
                guide_rna_id
            );
            return Ok(0);
        }

        let scope = StoreScope::begin(self.session)?;
        let mut written = 0;
        for (hit_class, position) in info.rows() {
            let statement = BoundStatement::new(
                "INSERT INTO guide_rna_off_target (guide_rna_id, hit_class, position)
                 VALUES (?, ?, ?)"
                    .to_string(),
                vec![
                    guide_rna_id.into(),
                    hit_class.to_string().into(),
                    position.to_string().into(),
                ],
            )?;
            written += statement.execute(scope.conn())?;
        }
        scope.commit()?;

        info!(
            "event=store_off_target module=repo entity=guide_rna id={} status=ok rows={}",
            guide_rna_id, written
        );
        Ok(written)
    }

    pub fn fetch_off_target_info(&self, guide_rna: &GuideRna) -> RepoResult<OffTargetInfo> {
        let guide_rna_id = guide_rna
            .id()
            .ok_or(ValidationError::NotStored(GuideRna::ENTITY))?;
        let statement =
            BoundStatement::new(OFF_TARGET_SELECT_SQL.to_string(), vec![guide_rna_id.into()])?;
        let hits = statement.query_map(self.session.connection(), |row| {
            Ok((row.get::<_, String>("hit_class")?, row.get::<_, String>("position")?))
        })?;

        let mut info = OffTargetInfo::default();
        for (hit_class, position) in hits {
            if !info.push(&hit_class, position) {
                return Err(RepoError::InvalidData(format!(
                    "invalid hit class `{hit_class}` in guide_rna_off_target.hit_class"
                )));
            }
        }
        Ok(info)
    }
}

impl EntityRepository for GuideRnaRepository<'_> {
    type Entity = GuideRna;

    const TABLE: &'static str = "guide_rna";
    const ID_COLUMN: &'static str = "guide_rna_id";
    const SELECT_SQL: &'static str = GUIDE_RNA_SELECT_SQL;
    const ID_FILTER: &'static str = "g.guide_rna_id";

    fn session(&self) -> &Session {
        self.session
    }

    fn hydrate_row(&self, row: &Row<'_>) -> RepoResult<Rc<GuideRna>> {
        let id: i64 = row.get("guide_rna_id")?;
        cached_or_build(self.session, id, |db_id| {
            let target = self.session.targets().fetch_by_id(row.get("target_id")?)?;
            let plate = optional_reference(&self.session.plates(), row.get("plate_id")?)?;
            let status = self.session.statuses()?.name_for(row.get("status_id")?)?;

            let mut guide_rna = GuideRna::new(
                row.get::<_, String>("guide_rna_name")?,
                row.get::<_, String>("sequence")?,
                row.get("guide_rna_start")?,
                row.get("guide_rna_end")?,
                read_strand(row, "guide_rna_strand")?,
                target,
            )
            .with_db_id(db_id);
            guide_rna.chr = row.get("guide_rna_chr")?;
            guide_rna.five_prime_gs = row.get("five_prime_gs")?;
            guide_rna.score = row.get("score")?;
            guide_rna.off_target_score = row.get("off_target_score")?;
            guide_rna.coding_score = row.get("coding_score")?;
            guide_rna.plate = plate;
            guide_rna.well_id = row.get("well_id")?;
            guide_rna.status = status;
            Ok(guide_rna)
        })
    }

    fn natural_key(&self, guide_rna: &GuideRna) -> Filter {
        Filter::new().and_eq("guide_rna_name", guide_rna.name.clone())
    }

    fn insert_row(&self, scope: &StoreScope<'_>, guide_rna: &GuideRna) -> RepoResult<i64> {
        let target_id = ensure_stored(&self.session.targets(), scope, &guide_rna.target)?;
        let plate_id = match &guide_rna.plate {
            Some(plate) => Some(ensure_stored(&self.session.plates(), scope, plate)?),
            None => None,
        };
        let status_id = self.session.statuses()?.id_for(guide_rna.status)?;

        InsertStatement::new(Self::TABLE, Self::ID_COLUMN)
            .id(guide_rna.id())
            .value("guide_rna_name", guide_rna.name.clone())
            .value("guide_rna_chr", guide_rna.chr.clone())
            .value("guide_rna_start", guide_rna.start)
            .value("guide_rna_end", guide_rna.end)
            .value("guide_rna_strand", guide_rna.strand.to_db())
            .value("sequence", guide_rna.sequence.clone())
            .value("five_prime_gs", guide_rna.five_prime_gs)
            .value("score", guide_rna.score)
            .value("off_target_score", guide_rna.off_target_score)
            .value("coding_score", guide_rna.coding_score)
            .value("target_id", target_id)
            .value("plate_id", plate_id)
            .value("well_id", guide_rna.well_id.clone())
            .value("status_id", status_id)
            .execute_returning_id(scope.conn())
    }
}
