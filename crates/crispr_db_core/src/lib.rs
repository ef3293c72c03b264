//! Persistence core for CRISPR screening records.
//!
//! Maps targets, guide RNAs, primers, primer pairs, injection pools,
//! subplexes and samples onto a SQLite schema, with one shared instance per
//! stored record inside a [`Session`].

pub mod config;
pub mod db;
pub mod error;
pub mod identity;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod session;
pub mod status;

pub use config::StoreConfig;
pub use error::{RepoError, RepoResult};
pub use identity::IdentityCache;
pub use logging::{init_logging, logging_status, LoggingError};
pub use model::{
    DbId, Entity, Generation, GuideRna, InjectionPool, OffTargetInfo, PairType, Plate,
    PooledGuideRna, Primer, PrimerPair, Sample, Strand, Subplex, Target, ValidationError,
};
pub use query::{BoundStatement, Filter, InsertStatement, SelectQuery};
pub use repo::{
    EntityRepository, GuideRnaRepository, InjectionPoolRepository, PlateRepository,
    PrimerPairRepository, PrimerRepository, SampleRepository, StoreScope, SubplexRepository,
    TargetRepository,
};
pub use session::Session;
pub use status::{Status, StatusCodec};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
