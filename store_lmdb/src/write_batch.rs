//! Write batching: applies a whole [`GrantBatch`] inside a single LMDB write
//! transaction, so a clawback or spend lands completely or not at all.
//!
//! # Usage
//!
//! ```ignore
//! let mut batch = env.write_batch()?;
//! let id = batch.apply(&grant_batch)?;
//! batch.commit()?;
//! ```
//!
//! If the batch is dropped without calling [`WriteBatch::commit`], all
//! operations are rolled back (the underlying LMDB transaction is aborted).

use heed::{Env, RwTxn};

use points_store::{check_new_grant, check_update, GrantBatch, NewGrant, RemainingUpdate, StoreError};
use points_types::{Grant, GrantId};

use crate::environment::GrantDatabases;
use crate::keys::{grant_key, order_key, payer_order_key};
use crate::meta::NEXT_GRANT_ID_KEY;
use crate::LmdbError;

/// A write batch that groups grant mutations into one LMDB write transaction.
pub struct WriteBatch<'a> {
    txn: RwTxn<'a>,
    dbs: GrantDatabases,
}

impl<'a> WriteBatch<'a> {
    /// Begin a new write batch.
    pub(crate) fn new(env: &'a Env, dbs: GrantDatabases) -> Result<Self, StoreError> {
        let txn = env.write_txn().map_err(LmdbError::from)?;
        Ok(Self { txn, dbs })
    }

    /// Read a grant as seen by this transaction, including uncommitted writes.
    pub fn get_grant(&self, id: GrantId) -> Result<Option<Grant>, StoreError> {
        let bytes = self
            .dbs
            .grants_db
            .get(&self.txn, &grant_key(id))
            .map_err(LmdbError::from)?;
        match bytes {
            Some(bytes) => {
                let grant: Grant = bincode::deserialize(bytes).map_err(LmdbError::from)?;
                Ok(Some(grant))
            }
            None => Ok(None),
        }
    }

    // ── Grant operations ────────────────────────────────────────────────

    /// Lower a grant's `remaining`, keeping the unspent indexes in step.
    pub fn set_remaining(&mut self, update: &RemainingUpdate) -> Result<(), StoreError> {
        let mut grant = self
            .get_grant(update.id)?
            .ok_or_else(|| StoreError::NotFound(format!("grant {}", update.id)))?;
        check_update(&grant, update)?;

        grant.remaining = update.remaining;
        self.write_record(&grant)?;
        if !grant.is_unspent() {
            self.dbs
                .unspent_db
                .delete(&mut self.txn, &order_key(grant.occurred_at, grant.id))
                .map_err(LmdbError::from)?;
            self.dbs
                .payer_unspent_db
                .delete(&mut self.txn, &payer_order_key(&grant))
                .map_err(LmdbError::from)?;
        }
        Ok(())
    }

    /// Append a new grant, assigning the next id from the meta counter.
    pub fn append(&mut self, new: &NewGrant) -> Result<GrantId, StoreError> {
        check_new_grant(new)?;
        let id = self.next_grant_id()?;
        let grant = new.clone().into_grant(id);

        self.write_record(&grant)?;
        let chrono = order_key(grant.occurred_at, grant.id);
        self.dbs
            .order_db
            .put(&mut self.txn, &chrono, &[])
            .map_err(LmdbError::from)?;
        if grant.is_unspent() {
            self.dbs
                .unspent_db
                .put(&mut self.txn, &chrono, &[])
                .map_err(LmdbError::from)?;
            self.dbs
                .payer_unspent_db
                .put(&mut self.txn, &payer_order_key(&grant), &[])
                .map_err(LmdbError::from)?;
        }
        Ok(id)
    }

    /// Stage every update and the optional append of `batch`.
    pub fn apply(&mut self, batch: &GrantBatch) -> Result<Option<GrantId>, StoreError> {
        for update in batch.updates() {
            self.set_remaining(update)?;
        }
        batch.appended().map(|new| self.append(new)).transpose()
    }

    fn write_record(&mut self, grant: &Grant) -> Result<(), StoreError> {
        let bytes = bincode::serialize(grant).map_err(LmdbError::from)?;
        self.dbs
            .grants_db
            .put(&mut self.txn, &grant_key(grant.id), &bytes)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    fn next_grant_id(&mut self) -> Result<GrantId, StoreError> {
        let stored = self
            .dbs
            .meta_db
            .get(&self.txn, NEXT_GRANT_ID_KEY)
            .map_err(LmdbError::from)?;
        let next = match stored {
            Some(bytes) => {
                let arr: [u8; 8] = bytes.try_into().map_err(|_| {
                    StoreError::Corruption("next_grant_id has unexpected byte length".into())
                })?;
                u64::from_be_bytes(arr)
            }
            None => 1,
        };
        self.dbs
            .meta_db
            .put(&mut self.txn, NEXT_GRANT_ID_KEY, &(next + 1).to_be_bytes())
            .map_err(LmdbError::from)?;
        Ok(GrantId::new(next))
    }

    // ── Commit / rollback ───────────────────────────────────────────────

    /// Commit all batched operations in a single write transaction.
    pub fn commit(self) -> Result<(), StoreError> {
        self.txn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LmdbEnvironment;
    use points_store::GrantStore;
    use points_types::{PayerId, Timestamp};

    /// Helper: open a temporary LMDB environment.
    fn temp_env() -> (tempfile::TempDir, LmdbEnvironment) {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let env = LmdbEnvironment::open(dir.path(), 8, 10 * 1024 * 1024)
            .expect("failed to open env");
        (dir, env)
    }

    fn issued(payer: &str, points: u64, secs: i64) -> NewGrant {
        NewGrant::issued(PayerId::new(payer), points, Timestamp::new(secs))
    }

    #[test]
    fn batch_append_committed() {
        let (_dir, env) = temp_env();

        let mut batch = env.write_batch().expect("write_batch");
        let first = batch.append(&issued("DANNON", 300, 10)).expect("append");
        let second = batch.append(&issued("UNILEVER", 200, 20)).expect("append");
        batch.commit().expect("commit");

        assert_eq!(first, GrantId::new(1));
        assert_eq!(second, GrantId::new(2));
        let store = env.grant_store();
        assert_eq!(store.get_grant(first).unwrap().remaining, 300);
        assert_eq!(store.unspent_grants().unwrap().len(), 2);
    }

    #[test]
    fn dropped_batch_does_not_persist() {
        let (_dir, env) = temp_env();

        {
            let mut batch = env.write_batch().expect("write_batch");
            batch.append(&issued("DANNON", 100, 1)).expect("append");
            // batch is dropped here, rolling back
        }

        let store = env.grant_store();
        assert_eq!(store.grant_count().unwrap(), 0);

        // The id counter rolled back with the record.
        let mut batch = env.write_batch().expect("write_batch");
        assert_eq!(batch.append(&issued("DANNON", 100, 1)).unwrap(), GrantId::new(1));
    }

    #[test]
    fn uncommitted_writes_are_visible_inside_the_batch() {
        let (_dir, env) = temp_env();

        let mut batch = env.write_batch().expect("write_batch");
        let id = batch.append(&issued("DANNON", 100, 1)).unwrap();
        batch
            .set_remaining(&RemainingUpdate { id, expected: 100, remaining: 40 })
            .unwrap();
        assert_eq!(batch.get_grant(id).unwrap().unwrap().remaining, 40);
    }

    #[test]
    fn exhausted_grant_leaves_unspent_indexes() {
        let (_dir, env) = temp_env();

        let mut batch = env.write_batch().unwrap();
        let id = batch.append(&issued("DANNON", 100, 1)).unwrap();
        batch.commit().unwrap();

        let mut batch = env.write_batch().unwrap();
        batch
            .set_remaining(&RemainingUpdate { id, expected: 100, remaining: 0 })
            .unwrap();
        batch.commit().unwrap();

        let store = env.grant_store();
        assert!(store.unspent_grants().unwrap().is_empty());
        assert!(store
            .unspent_for_payer(&PayerId::new("DANNON"))
            .unwrap()
            .is_empty());
        assert_eq!(store.iter_grants().unwrap().len(), 1);
    }

    #[test]
    fn clawback_record_is_never_indexed_as_unspent() {
        let (_dir, env) = temp_env();

        let mut batch = env.write_batch().unwrap();
        batch
            .append(&NewGrant::clawback(PayerId::new("DANNON"), -50, Timestamp::new(3)))
            .unwrap();
        batch.commit().unwrap();

        let store = env.grant_store();
        assert_eq!(store.grant_count().unwrap(), 1);
        assert!(store.unspent_grants().unwrap().is_empty());
    }

    #[test]
    fn set_remaining_on_unknown_grant_is_not_found() {
        let (_dir, env) = temp_env();
        let mut batch = env.write_batch().unwrap();
        let result = batch.set_remaining(&RemainingUpdate {
            id: GrantId::new(404),
            expected: 1,
            remaining: 0,
        });
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }
}
