//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use points_store::StoreError;

use crate::grant::LmdbGrantStore;
use crate::meta::LmdbMetaStore;
use crate::migration::Migrator;
use crate::write_batch::WriteBatch;
use crate::LmdbError;

/// Names of every database the environment creates.
pub const DATABASE_NAMES: &[&str] = &["grants", "grant_order", "unspent", "payer_unspent", "meta"];

/// Handles for every database in the environment. Cheap to copy.
#[derive(Clone, Copy)]
pub(crate) struct GrantDatabases {
    pub(crate) grants_db: Database<Bytes, Bytes>,
    pub(crate) order_db: Database<Bytes, Bytes>,
    pub(crate) unspent_db: Database<Bytes, Bytes>,
    pub(crate) payer_unspent_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    dbs: GrantDatabases,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path and bring its
    /// schema up to date.
    pub fn open(path: &Path, max_dbs: u32, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment directory is owned by this process; no other
        // handle to the same path is opened with different flags.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(max_dbs)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let dbs = GrantDatabases {
            grants_db: env.create_database(&mut wtxn, Some(DATABASE_NAMES[0]))?,
            order_db: env.create_database(&mut wtxn, Some(DATABASE_NAMES[1]))?,
            unspent_db: env.create_database(&mut wtxn, Some(DATABASE_NAMES[2]))?,
            payer_unspent_db: env.create_database(&mut wtxn, Some(DATABASE_NAMES[3]))?,
            meta_db: env.create_database(&mut wtxn, Some(DATABASE_NAMES[4]))?,
        };
        wtxn.commit()?;

        let environment = Self {
            env: Arc::new(env),
            dbs,
        };
        Migrator::run(&environment.meta_store())?;
        tracing::debug!(path = %path.display(), map_size, "opened LMDB environment");
        Ok(environment)
    }

    /// The underlying heed environment.
    pub fn env(&self) -> &Arc<Env> {
        &self.env
    }

    pub fn grant_store(&self) -> LmdbGrantStore {
        LmdbGrantStore::new(self.env.clone(), self.dbs)
    }

    pub fn meta_store(&self) -> LmdbMetaStore {
        LmdbMetaStore {
            env: self.env.clone(),
            meta_db: self.dbs.meta_db,
        }
    }

    /// Begin a write batch. Dropping it without committing rolls it back.
    pub fn write_batch(&self) -> Result<WriteBatch<'_>, StoreError> {
        WriteBatch::new(&self.env, self.dbs)
    }
}
