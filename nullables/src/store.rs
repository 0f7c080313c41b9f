//! In-memory grant store for tests.

use points_store::{check_new_grant, check_update, GrantBatch, GrantStore, StoreError};
use points_types::{Grant, GrantId, PayerId};
use std::collections::BTreeMap;
use std::sync::Mutex;

struct State {
    grants: BTreeMap<GrantId, Grant>,
    next_id: u64,
    fail_next_commit: bool,
}

/// An in-memory grant store for testing.
///
/// All state sits behind one mutex, so a commit is a single critical section
/// and readers never see half of a batch.
pub struct NullGrantStore {
    state: Mutex<State>,
}

impl NullGrantStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                grants: BTreeMap::new(),
                next_id: 1,
                fail_next_commit: false,
            }),
        }
    }

    /// Make the next `commit` fail with a backend error, writing nothing.
    pub fn fail_next_commit(&self) {
        self.state.lock().unwrap().fail_next_commit = true;
    }

    /// Snapshot of every grant keyed by id, for state comparisons in tests.
    pub fn snapshot(&self) -> BTreeMap<GrantId, Grant> {
        self.state.lock().unwrap().grants.clone()
    }

    fn sorted(mut grants: Vec<Grant>) -> Vec<Grant> {
        grants.sort_by_key(Grant::order_key);
        grants
    }
}

impl Default for NullGrantStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GrantStore for NullGrantStore {
    fn commit(&self, batch: &GrantBatch) -> Result<Option<GrantId>, StoreError> {
        let mut state = self.state.lock().unwrap();
        if std::mem::take(&mut state.fail_next_commit) {
            return Err(StoreError::Backend("injected commit failure".into()));
        }

        for update in batch.updates() {
            let current = state
                .grants
                .get(&update.id)
                .ok_or_else(|| StoreError::NotFound(format!("grant {}", update.id)))?;
            check_update(current, update)?;
        }
        if let Some(new) = batch.appended() {
            check_new_grant(new)?;
        }

        for update in batch.updates() {
            if let Some(grant) = state.grants.get_mut(&update.id) {
                grant.remaining = update.remaining;
            }
        }
        let appended = batch.appended().cloned().map(|new| {
            let id = GrantId::new(state.next_id);
            state.next_id += 1;
            state.grants.insert(id, new.into_grant(id));
            id
        });
        Ok(appended)
    }

    fn get_grant(&self, id: GrantId) -> Result<Grant, StoreError> {
        self.state
            .lock()
            .unwrap()
            .grants
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("grant {}", id)))
    }

    fn grant_count(&self) -> Result<u64, StoreError> {
        Ok(self.state.lock().unwrap().grants.len() as u64)
    }

    fn iter_grants(&self) -> Result<Vec<Grant>, StoreError> {
        let grants = self.state.lock().unwrap().grants.values().cloned().collect();
        Ok(Self::sorted(grants))
    }

    fn unspent_for_payer(&self, payer: &PayerId) -> Result<Vec<Grant>, StoreError> {
        let grants = self
            .state
            .lock()
            .unwrap()
            .grants
            .values()
            .filter(|g| &g.payer == payer && g.is_unspent())
            .cloned()
            .collect();
        Ok(Self::sorted(grants))
    }

    fn unspent_grants(&self) -> Result<Vec<Grant>, StoreError> {
        let grants = self
            .state
            .lock()
            .unwrap()
            .grants
            .values()
            .filter(|g| g.is_unspent())
            .cloned()
            .collect();
        Ok(Self::sorted(grants))
    }
}
