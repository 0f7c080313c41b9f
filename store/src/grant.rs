//! Grant storage trait.

use points_types::{Grant, GrantId, PayerId};

use crate::{aggregate_balances, Balances, GrantBatch, StoreError};

/// Trait for grant storage operations.
///
/// Every ordered scan returns grants by `(occurred_at, id)` ascending.
/// Reads observe committed state only; [`GrantStore::commit`] makes the whole
/// batch visible at once or not at all.
pub trait GrantStore {
    /// Apply a batch atomically. Returns the id of the appended grant, if any.
    ///
    /// Fails with [`StoreError::NotFound`] or [`StoreError::InvalidUpdate`]
    /// without writing anything when any update cannot be applied.
    fn commit(&self, batch: &GrantBatch) -> Result<Option<GrantId>, StoreError>;

    fn get_grant(&self, id: GrantId) -> Result<Grant, StoreError>;

    fn grant_count(&self) -> Result<u64, StoreError>;

    /// All grants, including clawback records and fully spent grants.
    fn iter_grants(&self) -> Result<Vec<Grant>, StoreError>;

    /// A payer's grants with `remaining > 0`, oldest first.
    fn unspent_for_payer(&self, payer: &PayerId) -> Result<Vec<Grant>, StoreError>;

    /// Every grant with `remaining > 0`, oldest first, across all payers.
    fn unspent_grants(&self) -> Result<Vec<Grant>, StoreError>;

    /// Sum of `remaining` over a payer's grants.
    fn payer_remaining(&self, payer: &PayerId) -> Result<u64, StoreError> {
        Ok(self
            .unspent_for_payer(payer)?
            .iter()
            .fold(0u64, |acc, g| acc.saturating_add(g.remaining)))
    }

    /// Sum of `remaining` over all grants.
    fn total_remaining(&self) -> Result<u64, StoreError> {
        Ok(self
            .unspent_grants()?
            .iter()
            .fold(0u64, |acc, g| acc.saturating_add(g.remaining)))
    }

    /// Per-payer remaining totals, oldest-established payer first.
    fn remaining_by_payer(&self) -> Result<Balances, StoreError> {
        Ok(aggregate_balances(&self.iter_grants()?))
    }
}
