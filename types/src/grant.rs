//! The grant record, the only entity in the ledger.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{PayerId, Timestamp};

/// Store-assigned grant identifier. Monotonically increasing from 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GrantId(u64);

impl GrantId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for GrantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One record of points issued (or clawed back) by a payer.
///
/// `points` and `occurred_at` never change after creation. `remaining` only
/// ever moves downward and stays within `0..=max(points, 0)`. A clawback
/// record carries its negative `points` with `remaining == 0`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub id: GrantId,
    pub payer: PayerId,
    pub points: i64,
    pub remaining: u64,
    pub occurred_at: Timestamp,
}

impl Grant {
    /// Largest value `remaining` may ever hold for this record.
    pub fn ceiling(&self) -> u64 {
        self.points.max(0) as u64
    }

    pub fn is_clawback(&self) -> bool {
        self.points < 0
    }

    pub fn is_unspent(&self) -> bool {
        self.remaining > 0
    }

    /// Consumption order key: `(occurred_at, id)`.
    pub fn order_key(&self) -> (Timestamp, GrantId) {
        (self.occurred_at, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant(points: i64, remaining: u64, secs: i64, id: u64) -> Grant {
        Grant {
            id: GrantId::new(id),
            payer: PayerId::new("DANNON"),
            points,
            remaining,
            occurred_at: Timestamp::new(secs),
        }
    }

    #[test]
    fn ceiling_is_zero_for_clawbacks() {
        assert_eq!(grant(-200, 0, 10, 1).ceiling(), 0);
        assert_eq!(grant(300, 300, 10, 1).ceiling(), 300);
        assert_eq!(grant(0, 0, 10, 1).ceiling(), 0);
    }

    #[test]
    fn order_key_breaks_ties_by_id() {
        let a = grant(10, 10, 5, 2);
        let b = grant(10, 10, 5, 1);
        assert!(b.order_key() < a.order_key());
    }
}
