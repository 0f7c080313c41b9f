//! Grant processing: issuing grants and resolving clawbacks.

use points_store::{GrantBatch, NewGrant};
use points_types::{Grant, PayerId, Timestamp};

use crate::error::{FundsScope, LedgerError};

/// Plan a non-negative grant. Zero-point grants are recorded too.
pub fn plan_issue(payer: PayerId, points: u64, occurred_at: Timestamp) -> GrantBatch {
    let mut batch = GrantBatch::new();
    batch.append(NewGrant::issued(payer, points, occurred_at));
    batch
}

/// Plan a clawback of `points` (negative) against `payer`'s unspent grants.
///
/// `unspent` must be the payer's unspent grants, oldest first. They are
/// drained front to back until the clawback is covered; the plan also
/// appends the clawback record itself with `remaining == 0`. Grants of any
/// other payer are never touched. When the payer's unspent total falls
/// short, no plan is produced at all.
pub fn plan_clawback(
    payer: PayerId,
    points: i64,
    occurred_at: Timestamp,
    unspent: &[Grant],
) -> Result<GrantBatch, LedgerError> {
    debug_assert!(points < 0, "clawback amount must be negative");
    let needed = points.unsigned_abs();
    let mut need = needed;
    let mut available = 0u64;
    let mut batch = GrantBatch::new();

    for grant in unspent.iter().filter(|g| g.payer == payer && g.is_unspent()) {
        available = available.saturating_add(grant.remaining);
        if need == 0 {
            continue;
        }
        let take = need.min(grant.remaining);
        batch.set_remaining(grant.id, grant.remaining, grant.remaining - take);
        need -= take;
    }

    if need > 0 {
        return Err(LedgerError::InsufficientFunds {
            scope: FundsScope::Payer(payer),
            needed,
            available,
        });
    }

    batch.append(NewGrant::clawback(payer, points, occurred_at));
    Ok(batch)
}
