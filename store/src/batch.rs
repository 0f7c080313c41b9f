//! Pending change sets applied atomically by [`GrantStore::commit`].
//!
//! Ledger operations plan their work against a snapshot and record every
//! change here first. Nothing reaches the store until the plan is complete,
//! so a failed clawback or spend never leaves partial decrements behind.
//!
//! [`GrantStore::commit`]: crate::GrantStore::commit

use points_types::{Grant, GrantId, PayerId, Timestamp};

use crate::StoreError;

/// New value for an existing grant's `remaining`.
///
/// `expected` is the value the plan was computed from. A store refuses the
/// update with [`StoreError::Conflict`] when the grant no longer holds it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemainingUpdate {
    pub id: GrantId,
    pub expected: u64,
    pub remaining: u64,
}

/// A grant to append. The store assigns its id on commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewGrant {
    pub payer: PayerId,
    pub points: i64,
    pub remaining: u64,
    pub occurred_at: Timestamp,
}

impl NewGrant {
    /// A positive (or zero) grant whose whole amount is unspent.
    pub fn issued(payer: PayerId, points: u64, occurred_at: Timestamp) -> Self {
        Self {
            payer,
            points: points as i64,
            remaining: points,
            occurred_at,
        }
    }

    /// The historical record of a clawback. Holds no consumable balance.
    pub fn clawback(payer: PayerId, points: i64, occurred_at: Timestamp) -> Self {
        Self {
            payer,
            points,
            remaining: 0,
            occurred_at,
        }
    }

    pub fn into_grant(self, id: GrantId) -> Grant {
        Grant {
            id,
            payer: self.payer,
            points: self.points,
            remaining: self.remaining,
            occurred_at: self.occurred_at,
        }
    }
}

/// All-or-nothing set of `remaining` updates plus at most one new grant.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GrantBatch {
    updates: Vec<RemainingUpdate>,
    append: Option<NewGrant>,
}

impl GrantBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new `remaining` for `id`, planned from a read of `expected`.
    ///
    /// A later call for the same id replaces the target value but keeps the
    /// first `expected`, since that is what the store still holds.
    pub fn set_remaining(&mut self, id: GrantId, expected: u64, remaining: u64) {
        match self.updates.iter_mut().find(|u| u.id == id) {
            Some(existing) => existing.remaining = remaining,
            None => self.updates.push(RemainingUpdate {
                id,
                expected,
                remaining,
            }),
        }
    }

    /// Append a new grant when the batch commits. Replaces any earlier append.
    pub fn append(&mut self, grant: NewGrant) {
        self.append = Some(grant);
    }

    pub fn updates(&self) -> &[RemainingUpdate] {
        &self.updates
    }

    pub fn appended(&self) -> Option<&NewGrant> {
        self.append.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.append.is_none()
    }
}

/// Check that `update` may be applied to `current`.
///
/// The grant must still hold the value the update was planned from, and
/// `remaining` only ever moves downward, which also keeps it within
/// `0..=max(points, 0)`.
pub fn check_update(current: &Grant, update: &RemainingUpdate) -> Result<(), StoreError> {
    if current.remaining != update.expected {
        return Err(StoreError::Conflict(format!(
            "grant {} remaining is {}, plan expected {}",
            current.id, current.remaining, update.expected
        )));
    }
    if update.remaining > current.remaining {
        return Err(StoreError::InvalidUpdate(format!(
            "grant {} remaining would rise from {} to {}",
            current.id, current.remaining, update.remaining
        )));
    }
    Ok(())
}

/// Check that a grant about to be appended respects its ceiling.
pub fn check_new_grant(grant: &NewGrant) -> Result<(), StoreError> {
    if grant.remaining > grant.points.max(0) as u64 {
        return Err(StoreError::InvalidUpdate(format!(
            "new grant for {} has remaining {} above points {}",
            grant.payer, grant.remaining, grant.points
        )));
    }
    Ok(())
}
