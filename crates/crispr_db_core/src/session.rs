//! Unit-of-work session owning the connection and identity cache.
//!
//! # Responsibility
//! - Own one SQLite connection and the identity cache bound to it.
//! - Hand out record adaptors that share that cache.
//!
//! # Invariants
//! - Every adaptor obtained from one session observes the same cache.
//! - Independent sessions never share instances.
//! - Sessions are single-threaded; concurrent callers open their own.

use crate::config::StoreConfig;
use crate::db::{open_db_in_memory, open_db_with_config};
use crate::error::{RepoError, RepoResult};
use crate::identity::IdentityCache;
use crate::logging::init_logging;
use crate::repo::{
    GuideRnaRepository, InjectionPoolRepository, PlateRepository, PrimerPairRepository,
    PrimerRepository, SampleRepository, SubplexRepository, TargetRepository,
};
use crate::status::StatusCodec;
use once_cell::unsync::OnceCell;
use rusqlite::Connection;

pub struct Session {
    conn: Connection,
    cache: IdentityCache,
    statuses: OnceCell<StatusCodec>,
}

impl Session {
    /// Wraps a connection that already carries the record schema.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            cache: IdentityCache::new(),
            statuses: OnceCell::new(),
        }
    }

    /// Opens the configured database, initialising logging when requested.
    pub fn open(config: &StoreConfig) -> RepoResult<Self> {
        if let Some((level, dir)) = config.logging() {
            init_logging(level, dir).map_err(|err| RepoError::Config(err.to_string()))?;
        }
        Ok(Self::new(open_db_with_config(config)?))
    }

    pub fn open_in_memory() -> RepoResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn identity_cache(&self) -> &IdentityCache {
        &self.cache
    }

    /// Status vocabulary, read from the database on first use.
    pub fn statuses(&self) -> RepoResult<&StatusCodec> {
        self.statuses
            .get_or_try_init(|| StatusCodec::load(&self.conn))
    }

    pub fn targets(&self) -> TargetRepository<'_> {
        TargetRepository::new(self)
    }

    pub fn guide_rnas(&self) -> GuideRnaRepository<'_> {
        GuideRnaRepository::new(self)
    }

    pub fn plates(&self) -> PlateRepository<'_> {
        PlateRepository::new(self)
    }

    pub fn primers(&self) -> PrimerRepository<'_> {
        PrimerRepository::new(self)
    }

    pub fn primer_pairs(&self) -> PrimerPairRepository<'_> {
        PrimerPairRepository::new(self)
    }

    pub fn injection_pools(&self) -> InjectionPoolRepository<'_> {
        InjectionPoolRepository::new(self)
    }

    pub fn subplexes(&self) -> SubplexRepository<'_> {
        SubplexRepository::new(self)
    }

    pub fn samples(&self) -> SampleRepository<'_> {
        SampleRepository::new(self)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("cache", &self.cache)
            .field("statuses_loaded", &self.statuses.get().is_some())
            .finish()
    }
}
