//! Spend engine: consumes unspent grants across all payers, oldest first.

use std::collections::HashMap;

use points_store::GrantBatch;
use points_types::{Grant, PayerId};
use serde::Serialize;

use crate::error::{FundsScope, LedgerError};

/// Points removed from one payer by a spend. `points` is negative.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PayerDebit {
    pub payer: PayerId,
    pub points: i64,
}

/// Per-payer debits of a spend, in the order payers were first consumed.
///
/// Serializes as a JSON array of `{"payer", "points"}` objects.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SpendReceipt {
    debits: Vec<PayerDebit>,
    #[serde(skip)]
    index: HashMap<PayerId, usize>,
}

impl SpendReceipt {
    fn debit(&mut self, payer: &PayerId, points: u64) {
        let points = points as i64;
        match self.index.get(payer) {
            Some(&slot) => self.debits[slot].points -= points,
            None => {
                self.index.insert(payer.clone(), self.debits.len());
                self.debits.push(PayerDebit {
                    payer: payer.clone(),
                    points: -points,
                });
            }
        }
    }

    pub fn debits(&self) -> &[PayerDebit] {
        &self.debits
    }

    pub fn get(&self, payer: &PayerId) -> Option<i64> {
        self.index.get(payer).map(|&slot| self.debits[slot].points)
    }

    /// Total points spent, as a positive number.
    pub fn total(&self) -> u64 {
        self.debits.iter().map(|d| d.points.unsigned_abs()).sum()
    }

    pub fn into_debits(self) -> Vec<PayerDebit> {
        self.debits
    }
}

/// Plan a spend of `amount` points against `unspent`.
///
/// `unspent` must hold every grant with `remaining > 0`, in global
/// `(occurred_at, id)` order. The whole amount must be covered before any
/// consumption is planned; a payer whose grants interleave in time with
/// another's is debited across several non-contiguous grants.
pub fn plan_spend(amount: i64, unspent: &[Grant]) -> Result<(GrantBatch, SpendReceipt), LedgerError> {
    if amount <= 0 {
        return Err(LedgerError::InvalidAmount(amount));
    }
    let amount = amount as u64;

    let available = unspent
        .iter()
        .fold(0u64, |acc, g| acc.saturating_add(g.remaining));
    if amount > available {
        return Err(LedgerError::InsufficientFunds {
            scope: FundsScope::AllPayers,
            needed: amount,
            available,
        });
    }

    let mut left = amount;
    let mut batch = GrantBatch::new();
    let mut receipt = SpendReceipt::default();
    for grant in unspent.iter().filter(|g| g.is_unspent()) {
        if left == 0 {
            break;
        }
        let delta = grant.remaining.min(left);
        batch.set_remaining(grant.id, grant.remaining, grant.remaining - delta);
        receipt.debit(&grant.payer, delta);
        left -= delta;
    }
    Ok((batch, receipt))
}
