//! Per-payer balance aggregation.
//!
//! A pure two-pass function over grant records: group by payer, then order
//! the groups by each payer's earliest `occurred_at`. Independent of any
//! storage backend.

use std::collections::HashMap;

use points_types::{Grant, GrantId, PayerId, Timestamp};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Outstanding points for one payer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PayerBalance {
    pub payer: PayerId,
    pub balance: u64,
}

/// Ordered payer balances. Serializes as a JSON object in payer order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Balances(Vec<PayerBalance>);

impl Balances {
    pub fn get(&self, payer: &PayerId) -> Option<u64> {
        self.0
            .iter()
            .find(|b| &b.payer == payer)
            .map(|b| b.balance)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PayerBalance> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.0
            .iter()
            .fold(0u64, |acc, b| acc.saturating_add(b.balance))
    }

    pub fn into_vec(self) -> Vec<PayerBalance> {
        self.0
    }
}

impl Serialize for Balances {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for entry in &self.0 {
            map.serialize_entry(entry.payer.as_str(), &entry.balance)?;
        }
        map.end()
    }
}

struct Group {
    first: (Timestamp, GrantId),
    balance: u64,
}

/// Sum `remaining` per payer and order payers by their earliest grant.
///
/// Every payer with at least one record is reported, including payers whose
/// balance is zero. Payers sharing an earliest timestamp are ordered by their
/// oldest grant id.
pub fn aggregate_balances(grants: &[Grant]) -> Balances {
    let mut groups: HashMap<&PayerId, Group> = HashMap::new();
    for grant in grants {
        let key = grant.order_key();
        groups
            .entry(&grant.payer)
            .and_modify(|g| {
                g.first = g.first.min(key);
                g.balance = g.balance.saturating_add(grant.remaining);
            })
            .or_insert(Group {
                first: key,
                balance: grant.remaining,
            });
    }

    let mut ordered: Vec<(&PayerId, Group)> = groups.into_iter().collect();
    ordered.sort_by_key(|(_, g)| g.first);
    Balances(
        ordered
            .into_iter()
            .map(|(payer, g)| PayerBalance {
                payer: payer.clone(),
                balance: g.balance,
            })
            .collect(),
    )
}
