//! LMDB implementation of GrantStore.
//!
//! Ordered scans walk an index database and resolve each id against
//! `grants` within the same read transaction, so a scan always reflects one
//! committed state.

use std::ops::Bound;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, RoTxn};

use points_store::{GrantBatch, GrantStore, StoreError};
use points_types::{Grant, GrantId, PayerId};

use crate::environment::GrantDatabases;
use crate::keys::{grant_key, id_from_index_key, increment_prefix, payer_prefix};
use crate::write_batch::WriteBatch;
use crate::LmdbError;

pub struct LmdbGrantStore {
    env: Arc<Env>,
    dbs: GrantDatabases,
}

impl LmdbGrantStore {
    pub(crate) fn new(env: Arc<Env>, dbs: GrantDatabases) -> Self {
        Self { env, dbs }
    }

    fn load(&self, rtxn: &RoTxn, id: GrantId) -> Result<Option<Grant>, LmdbError> {
        match self.dbs.grants_db.get(rtxn, &grant_key(id))? {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes)?)),
            None => Ok(None),
        }
    }

    /// Resolve every key of an index database, in key order.
    fn scan_index(
        &self,
        index: Database<Bytes, Bytes>,
        prefix: Option<&[u8]>,
    ) -> Result<Vec<Grant>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let upper = prefix.and_then(increment_prefix);
        let bounds: (Bound<&[u8]>, Bound<&[u8]>) = (
            prefix.map_or(Bound::Unbounded, Bound::Included),
            upper.as_deref().map_or(Bound::Unbounded, Bound::Excluded),
        );
        let iter = index.range(&rtxn, &bounds).map_err(LmdbError::from)?;

        let mut results = Vec::new();
        for entry in iter {
            let (key, _) = entry.map_err(LmdbError::from)?;
            let id = id_from_index_key(key)?;
            let grant = self.load(&rtxn, id)?.ok_or_else(|| {
                StoreError::Corruption(format!("index entry for missing grant {}", id))
            })?;
            results.push(grant);
        }
        Ok(results)
    }
}

impl GrantStore for LmdbGrantStore {
    fn commit(&self, batch: &GrantBatch) -> Result<Option<GrantId>, StoreError> {
        let mut write = WriteBatch::new(&self.env, self.dbs)?;
        let appended = write.apply(batch)?;
        write.commit()?;
        Ok(appended)
    }

    fn get_grant(&self, id: GrantId) -> Result<Grant, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let grant = self
            .load(&rtxn, id)?
            .ok_or_else(|| LmdbError::NotFound(format!("grant {}", id)))?;
        Ok(grant)
    }

    fn grant_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let count = self.dbs.grants_db.len(&rtxn).map_err(LmdbError::from)?;
        Ok(count)
    }

    fn iter_grants(&self) -> Result<Vec<Grant>, StoreError> {
        self.scan_index(self.dbs.order_db, None)
    }

    fn unspent_for_payer(&self, payer: &PayerId) -> Result<Vec<Grant>, StoreError> {
        let prefix = payer_prefix(payer);
        self.scan_index(self.dbs.payer_unspent_db, Some(&prefix))
    }

    fn unspent_grants(&self) -> Result<Vec<Grant>, StoreError> {
        self.scan_index(self.dbs.unspent_db, None)
    }
}
