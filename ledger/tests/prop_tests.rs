use proptest::prelude::*;

use points_ledger::PointsLedger;
use points_nullables::NullGrantStore;
use points_types::{PayerId, Timestamp};

const PAYERS: [&str; 3] = ["DANNON", "UNILEVER", "MILLER COORS"];

#[derive(Clone, Debug)]
enum Op {
    Submit { payer: usize, points: i64, at: i64 },
    Spend(i64),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..PAYERS.len(), -400i64..600, -50i64..50)
            .prop_map(|(payer, points, at)| Op::Submit { payer, points, at }),
        1 => (-20i64..800).prop_map(Op::Spend),
    ]
}

fn assert_invariants(ledger: &PointsLedger<NullGrantStore>) -> Result<(), TestCaseError> {
    let grants = ledger.store().snapshot();
    for grant in grants.values() {
        prop_assert!(grant.remaining <= grant.points.max(0) as u64, "{:?}", grant);
    }
    let balances = ledger.balances().map_err(|e| TestCaseError::fail(e.to_string()))?;
    for entry in balances.iter() {
        let expected: u64 = grants
            .values()
            .filter(|g| g.payer == entry.payer)
            .map(|g| g.remaining)
            .sum();
        prop_assert_eq!(entry.balance, expected);
    }
    Ok(())
}

proptest! {
    /// Any sequence of operations keeps remaining within bounds, keeps
    /// balances equal to per-payer sums, and moves the total by exactly
    /// the amount each successful operation implies.
    #[test]
    fn operations_preserve_invariants(ops in prop::collection::vec(op(), 1..40)) {
        let ledger = PointsLedger::new(NullGrantStore::new());
        for op in ops {
            let before = ledger.store().snapshot();
            let total_before = ledger.available().unwrap();
            match op {
                Op::Submit { payer, points, at } => {
                    let result = ledger.submit(PayerId::new(PAYERS[payer]), points, Timestamp::new(at));
                    let total_after = ledger.available().unwrap();
                    match result {
                        Ok(_) if points >= 0 => prop_assert_eq!(total_after, total_before + points as u64),
                        Ok(_) => prop_assert_eq!(total_after, total_before - points.unsigned_abs()),
                        Err(_) => prop_assert_eq!(ledger.store().snapshot(), before),
                    }
                }
                Op::Spend(amount) => {
                    match ledger.spend(amount) {
                        Ok(receipt) => {
                            prop_assert_eq!(receipt.total(), amount as u64);
                            prop_assert_eq!(ledger.available().unwrap(), total_before - amount as u64);
                        }
                        Err(_) => prop_assert_eq!(ledger.store().snapshot(), before),
                    }
                }
            }
            assert_invariants(&ledger)?;
        }
    }

    /// A clawback for one payer never changes another payer's balance.
    #[test]
    fn clawback_is_scoped_to_its_payer(
        grants in prop::collection::vec((0..PAYERS.len(), 1i64..500, -50i64..50), 1..20),
        target in 0..PAYERS.len(),
        claw in 1i64..1000,
    ) {
        let ledger = PointsLedger::new(NullGrantStore::new());
        for (payer, points, at) in grants {
            ledger.submit(PayerId::new(PAYERS[payer]), points, Timestamp::new(at)).unwrap();
        }
        let others = |ledger: &PointsLedger<NullGrantStore>| -> Vec<u64> {
            PAYERS
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != target)
                .map(|(_, p)| ledger.payer_balance(&PayerId::new(*p)).unwrap())
                .collect()
        };
        let before = others(&ledger);
        let _ = ledger.submit(PayerId::new(PAYERS[target]), -claw, Timestamp::new(100));
        prop_assert_eq!(others(&ledger), before);
    }

    /// Spend debits follow global chronological order: every grant older
    /// than the last one touched is fully consumed.
    #[test]
    fn spend_consumes_oldest_first(
        grants in prop::collection::vec((0..PAYERS.len(), 1i64..500, -50i64..50), 1..20),
        fraction in 1u64..=100,
    ) {
        let ledger = PointsLedger::new(NullGrantStore::new());
        for (payer, points, at) in grants {
            ledger.submit(PayerId::new(PAYERS[payer]), points, Timestamp::new(at)).unwrap();
        }
        let available = ledger.available().unwrap();
        let amount = (available * fraction / 100).max(1);
        ledger.spend(amount as i64).unwrap();

        let mut ordered: Vec<_> = ledger.store().snapshot().into_values().collect();
        ordered.sort_by_key(|g| g.order_key());
        let first_untouched = ordered
            .iter()
            .position(|g| g.remaining == g.points as u64)
            .unwrap_or(ordered.len());
        // At most one grant is partially consumed, and it sits right
        // before the untouched tail.
        for grant in &ordered[..first_untouched.saturating_sub(1)] {
            prop_assert_eq!(grant.remaining, 0);
        }
        for grant in &ordered[first_untouched..] {
            prop_assert_eq!(grant.remaining, grant.points as u64);
        }
    }
}
