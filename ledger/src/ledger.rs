//! The ledger facade: a store plus the writer lock that serialises mutations.

use std::sync::{Mutex, MutexGuard, PoisonError};

use points_store::{Balances, GrantBatch, GrantStore, StoreError};
use points_types::{Grant, GrantId, PayerId, Timestamp};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::LedgerError;
use crate::grant::{plan_clawback, plan_issue};
use crate::spend::{plan_spend, SpendReceipt};

/// Read-plan-commit rounds tried before a write conflict is reported.
const COMMIT_ATTEMPTS: usize = 8;

/// Headline numbers logged at startup.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LedgerSummary {
    pub grants: u64,
    pub payers: usize,
    pub total_remaining: u64,
}

/// A points ledger over a [`GrantStore`].
///
/// `submit` and `spend` read, plan and commit while holding the writer lock,
/// so two mutators of one ledger never plan against the same snapshot.
/// Other handles on the same store are caught at commit time: every update
/// carries the `remaining` it was planned from, the store refuses it with
/// [`StoreError::Conflict`] when that value changed, and the ledger replans.
/// Reads go straight to the store and observe committed state only.
pub struct PointsLedger<S> {
    store: S,
    writer: Mutex<()>,
}

impl<S: GrantStore> PointsLedger<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            writer: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Record a grant from `payer`.
    ///
    /// Non-negative amounts always succeed. A negative amount claws back the
    /// payer's oldest unspent points and fails without any change when the
    /// payer cannot cover it.
    pub fn submit(
        &self,
        payer: PayerId,
        points: i64,
        occurred_at: Timestamp,
    ) -> Result<GrantId, LedgerError> {
        let _guard = self.lock_writer();

        let (id, decremented) = self.replan_on_conflict(|| {
            let batch = if points >= 0 {
                plan_issue(payer.clone(), points as u64, occurred_at)
            } else {
                let unspent = self.store.unspent_for_payer(&payer)?;
                plan_clawback(payer.clone(), points, occurred_at, &unspent).map_err(|e| {
                    warn!(payer = %payer, points, "clawback rejected: {}", e);
                    e
                })?
            };
            Ok((self.commit_append(&batch)?, batch.updates().len()))
        })?;

        debug!(
            id = %id,
            payer = %payer,
            points,
            at = %occurred_at,
            decremented,
            "grant recorded"
        );
        Ok(id)
    }

    /// Spend `amount` points across all payers, oldest grant first.
    pub fn spend(&self, amount: i64) -> Result<SpendReceipt, LedgerError> {
        let _guard = self.lock_writer();

        let (receipt, grants) = self.replan_on_conflict(|| {
            let unspent = self.store.unspent_grants()?;
            let (batch, receipt) = plan_spend(amount, &unspent).map_err(|e| {
                warn!(amount, "spend rejected: {}", e);
                e
            })?;
            self.store.commit(&batch)?;
            Ok((receipt, batch.updates().len()))
        })?;

        debug!(
            amount,
            payers = receipt.debits().len(),
            grants,
            "spend committed"
        );
        Ok(receipt)
    }

    /// Remaining points per payer, oldest-established payer first.
    pub fn balances(&self) -> Result<Balances, LedgerError> {
        Ok(self.store.remaining_by_payer()?)
    }

    pub fn payer_balance(&self, payer: &PayerId) -> Result<u64, LedgerError> {
        Ok(self.store.payer_remaining(payer)?)
    }

    /// Points available to spend across every payer.
    pub fn available(&self) -> Result<u64, LedgerError> {
        Ok(self.store.total_remaining()?)
    }

    pub fn grant(&self, id: GrantId) -> Result<Grant, LedgerError> {
        Ok(self.store.get_grant(id)?)
    }

    pub fn summary(&self) -> Result<LedgerSummary, LedgerError> {
        let balances = self.store.remaining_by_payer()?;
        Ok(LedgerSummary {
            grants: self.store.grant_count()?,
            payers: balances.len(),
            total_remaining: balances.total(),
        })
    }

    fn commit_append(&self, batch: &GrantBatch) -> Result<GrantId, LedgerError> {
        self.store.commit(batch)?.ok_or_else(|| {
            LedgerError::Storage(StoreError::Corruption(
                "commit of an appending batch returned no grant id".into(),
            ))
        })
    }

    /// Run a read-plan-commit step, starting over from a fresh read when
    /// another handle on the same store committed first.
    fn replan_on_conflict<T>(
        &self,
        mut step: impl FnMut() -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        let mut attempt = 1;
        loop {
            match step() {
                Err(LedgerError::Storage(StoreError::Conflict(msg))) if attempt < COMMIT_ATTEMPTS => {
                    debug!(attempt, "write conflict, replanning: {}", msg);
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    // The guarded data is `()`, so a panic in another writer leaves nothing
    // half-updated behind the lock.
    fn lock_writer(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use points_nullables::NullGrantStore;

    fn ledger() -> PointsLedger<NullGrantStore> {
        PointsLedger::new(NullGrantStore::new())
    }

    fn balances_of(ledger: &PointsLedger<NullGrantStore>) -> Vec<(String, u64)> {
        ledger
            .balances()
            .unwrap()
            .iter()
            .map(|b| (b.payer.to_string(), b.balance))
            .collect()
    }

    fn owned(pairs: &[(&str, u64)]) -> Vec<(String, u64)> {
        pairs.iter().map(|(p, b)| (p.to_string(), *b)).collect()
    }

    #[test]
    fn clawback_drains_own_oldest_grant() {
        let ledger = ledger();
        let first = ledger.submit("DANNON".into(), 300, Timestamp::new(1)).unwrap();
        ledger.submit("UNILEVER".into(), 200, Timestamp::new(2)).unwrap();
        let claw = ledger.submit("DANNON".into(), -200, Timestamp::new(3)).unwrap();

        assert_eq!(ledger.grant(first).unwrap().remaining, 100);
        let record = ledger.grant(claw).unwrap();
        assert_eq!((record.points, record.remaining), (-200, 0));
        assert_eq!(balances_of(&ledger), owned(&[("DANNON", 100), ("UNILEVER", 200)]));
    }

    #[test]
    fn spend_after_clawback_empties_both_payers() {
        let ledger = ledger();
        ledger.submit("DANNON".into(), 300, Timestamp::new(1)).unwrap();
        ledger.submit("UNILEVER".into(), 200, Timestamp::new(2)).unwrap();
        ledger.submit("DANNON".into(), -200, Timestamp::new(3)).unwrap();

        let receipt = ledger.spend(300).unwrap();
        assert_eq!(receipt.get(&"DANNON".into()), Some(-100));
        assert_eq!(receipt.get(&"UNILEVER".into()), Some(-200));
        assert_eq!(balances_of(&ledger), owned(&[("DANNON", 0), ("UNILEVER", 0)]));
    }

    #[test]
    fn clawback_never_touches_other_payers() {
        let ledger = ledger();
        let older = ledger.submit("UNILEVER".into(), 500, Timestamp::new(1)).unwrap();
        ledger.submit("DANNON".into(), 100, Timestamp::new(2)).unwrap();
        ledger.submit("DANNON".into(), -100, Timestamp::new(3)).unwrap();
        assert_eq!(ledger.grant(older).unwrap().remaining, 500);
        assert_eq!(ledger.payer_balance(&"DANNON".into()).unwrap(), 0);
    }

    #[test]
    fn spend_on_empty_ledger_fails_without_change() {
        let ledger = ledger();
        let err = ledger.spend(1).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds { needed: 1, available: 0, .. }));
        assert!(ledger.store().snapshot().is_empty());
    }

    #[test]
    fn clawback_without_history_creates_no_record() {
        let ledger = ledger();
        let err = ledger.submit("DANNON".into(), -50, Timestamp::new(1)).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds { needed: 50, available: 0, .. }));
        assert!(ledger.store().snapshot().is_empty());
        assert!(ledger.balances().unwrap().is_empty());
    }

    #[test]
    fn partial_clawback_rolls_back_entirely() {
        let ledger = ledger();
        ledger.submit("DANNON".into(), 100, Timestamp::new(1)).unwrap();
        ledger.submit("DANNON".into(), 50, Timestamp::new(2)).unwrap();
        let before = ledger.store().snapshot();

        assert!(ledger.submit("DANNON".into(), -200, Timestamp::new(3)).is_err());
        assert_eq!(ledger.store().snapshot(), before);
    }

    #[test]
    fn overspend_leaves_state_unchanged() {
        let ledger = ledger();
        ledger.submit("DANNON".into(), 100, Timestamp::new(1)).unwrap();
        let before = ledger.store().snapshot();
        assert!(ledger.spend(101).is_err());
        assert!(matches!(ledger.spend(0), Err(LedgerError::InvalidAmount(0))));
        assert_eq!(ledger.store().snapshot(), before);
    }

    #[test]
    fn failed_commit_leaves_state_unchanged() {
        let ledger = ledger();
        ledger.submit("DANNON".into(), 100, Timestamp::new(1)).unwrap();
        let before = ledger.store().snapshot();

        ledger.store().fail_next_commit();
        assert!(matches!(ledger.spend(50), Err(LedgerError::Storage(_))));
        assert_eq!(ledger.store().snapshot(), before);
        assert_eq!(ledger.available().unwrap(), 100);
    }

    #[test]
    fn zero_point_grant_is_recorded() {
        let ledger = ledger();
        let id = ledger.submit("DANNON".into(), 0, Timestamp::new(1)).unwrap();
        assert_eq!(ledger.grant(id).unwrap().remaining, 0);
        assert_eq!(balances_of(&ledger), owned(&[("DANNON", 0)]));
    }

    #[test]
    fn fetch_rewards_scenario() {
        let ledger = ledger();
        let ts = |s: i64| Timestamp::new(1_604_000_000 + s);
        ledger.submit("DANNON".into(), 300, ts(0)).unwrap();
        ledger.submit("UNILEVER".into(), 200, ts(100)).unwrap();
        ledger.submit("DANNON".into(), -200, ts(200)).unwrap();
        ledger.submit("MILLER COORS".into(), 10_000, ts(300)).unwrap();
        ledger.submit("DANNON".into(), 1_000, ts(400)).unwrap();

        let receipt = ledger.spend(5_000).unwrap();
        let debits: Vec<_> = receipt
            .debits()
            .iter()
            .map(|d| (d.payer.as_str(), d.points))
            .collect();
        assert_eq!(
            debits,
            [("DANNON", -100), ("UNILEVER", -200), ("MILLER COORS", -4_700)]
        );
        assert_eq!(
            balances_of(&ledger),
            owned(&[("DANNON", 1_000), ("UNILEVER", 0), ("MILLER COORS", 5_300)])
        );
    }

    #[test]
    fn summary_counts_records_and_payers() {
        let ledger = ledger();
        ledger.submit("DANNON".into(), 300, Timestamp::new(1)).unwrap();
        ledger.submit("UNILEVER".into(), 200, Timestamp::new(2)).unwrap();
        ledger.submit("DANNON".into(), -100, Timestamp::new(3)).unwrap();
        assert_eq!(
            ledger.summary().unwrap(),
            LedgerSummary { grants: 3, payers: 2, total_remaining: 400 }
        );
    }
}
