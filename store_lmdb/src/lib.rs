//! LMDB storage backend for the points ledger.
//!
//! Implements the storage traits from `points-store` using the `heed` LMDB
//! bindings. Grants, their ordering indexes and metadata live in separate
//! databases within a single environment.

pub mod environment;
pub mod error;
pub mod grant;
pub mod integrity;
mod keys;
pub mod meta;
pub mod migration;
pub mod write_batch;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use grant::LmdbGrantStore;
pub use integrity::{check_data_dir, check_integrity, IntegrityReport};
pub use meta::LmdbMetaStore;
pub use migration::{Migrator, CURRENT_SCHEMA_VERSION};
pub use write_batch::WriteBatch;
