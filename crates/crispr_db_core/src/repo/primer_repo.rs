//! Primer adaptor.
//!
//! Primer columns are aliased with a prefix so the primer pair adaptor can
//! hydrate both primers of a pair from one joined row.
//!
//! # Invariants
//! - `primer_sequence` holds the untailed sequence; the tail lives in
//!   `primer_tail` and is re-joined on hydration.

use super::dependency::{ensure_stored, StoreScope};
use super::hydrate::{cached_or_build, column, fetch_one, group_id, optional_reference, read_strand};
use super::EntityRepository;
use crate::error::RepoResult;
use crate::model::{Entity, Primer};
use crate::query::{Filter, InsertStatement, SelectQuery};
use crate::session::Session;
use rusqlite::Row;
use std::rc::Rc;

const PRIMER_SELECT_SQL: &str = "SELECT
    p.primer_id AS p_primer_id,
    p.primer_name AS p_primer_name,
    p.primer_sequence AS p_primer_sequence,
    p.primer_tail AS p_primer_tail,
    p.primer_chr AS p_primer_chr,
    p.primer_start AS p_primer_start,
    p.primer_end AS p_primer_end,
    p.primer_strand AS p_primer_strand,
    p.plate_id AS p_plate_id,
    p.well_id AS p_well_id
FROM primer p";

const PRIMER_PREFIX: &str = "p_";

pub struct PrimerRepository<'s> {
    session: &'s Session,
}

impl<'s> PrimerRepository<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self { session }
    }

    /// Loads one primer by its `chr:start-end:strand` name.
    pub fn fetch_by_name(&self, name: &str) -> RepoResult<Rc<Primer>> {
        let query = SelectQuery::new(Self::SELECT_SQL)
            .filter(Filter::new().and_eq("p.primer_name", name.to_string()));
        fetch_one(self, query, || name.to_string())
    }

    /// Hydrates the primer field group whose aliases start with `prefix`.
    pub(crate) fn hydrate_prefixed(&self, row: &Row<'_>, prefix: &str) -> RepoResult<Rc<Primer>> {
        let id = group_id(row, prefix, "primer_id")?;
        cached_or_build(self.session, id, |db_id| {
            let get_text = |name: &str| row.get::<_, String>(column(prefix, name).as_str());
            let get_int = |name: &str| row.get::<_, i64>(column(prefix, name).as_str());

            let strand = read_strand(row, &column(prefix, "primer_strand"))?;
            let tail: Option<String> = row.get(column(prefix, "primer_tail").as_str())?;
            let untailed = get_text("primer_sequence")?;
            let sequence = match &tail {
                Some(tail) => format!("{tail}{untailed}"),
                None => untailed,
            };

            let plate_id: Option<i64> = row.get(column(prefix, "plate_id").as_str())?;
            let plate = optional_reference(&self.session.plates(), plate_id)?;

            let mut primer = Primer::new(
                get_text("primer_chr")?,
                get_int("primer_start")?,
                get_int("primer_end")?,
                strand,
                sequence,
            )
            .with_db_id(db_id);
            primer.name = get_text("primer_name")?;
            primer.tail = tail;
            primer.plate = plate;
            primer.well_id = row.get(column(prefix, "well_id").as_str())?;
            Ok(primer)
        })
    }
}

impl EntityRepository for PrimerRepository<'_> {
    type Entity = Primer;

    const TABLE: &'static str = "primer";
    const ID_COLUMN: &'static str = "primer_id";
    const SELECT_SQL: &'static str = PRIMER_SELECT_SQL;
    const ID_FILTER: &'static str = "p.primer_id";

    fn session(&self) -> &Session {
        self.session
    }

    fn hydrate_row(&self, row: &Row<'_>) -> RepoResult<Rc<Primer>> {
        self.hydrate_prefixed(row, PRIMER_PREFIX)
    }

    fn natural_key(&self, primer: &Primer) -> Filter {
        Filter::new().and_eq("primer_name", primer.name.clone())
    }

    fn insert_row(&self, scope: &StoreScope<'_>, primer: &Primer) -> RepoResult<i64> {
        let plate_id = match &primer.plate {
            Some(plate) => Some(ensure_stored(&self.session.plates(), scope, plate)?),
            None => None,
        };

        InsertStatement::new(Self::TABLE, Self::ID_COLUMN)
            .id(primer.id())
            .value("primer_name", primer.name.clone())
            .value("primer_sequence", primer.untailed_sequence().to_string())
            .value("primer_tail", primer.tail.clone())
            .value("primer_chr", primer.chr.clone())
            .value("primer_start", primer.start)
            .value("primer_end", primer.end)
            .value("primer_strand", primer.strand.to_db())
            .value("plate_id", plate_id)
            .value("well_id", primer.well_id.clone())
            .execute_returning_id(scope.conn())
    }
}
