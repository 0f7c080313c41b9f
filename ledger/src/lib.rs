//! Points ledger core.
//!
//! Payers issue point grants to a single account holder. Grants are consumed
//! oldest first: a clawback offsets the same payer's oldest unspent grants, a
//! spend consumes the oldest unspent grants across all payers. Every
//! mutation is planned against a snapshot and committed to the store as one
//! atomic [`GrantBatch`](points_store::GrantBatch).

pub mod error;
pub mod grant;
pub mod ledger;
pub mod spend;

pub use error::{FundsScope, LedgerError};
pub use grant::{plan_clawback, plan_issue};
pub use ledger::{LedgerSummary, PointsLedger};
pub use spend::{plan_spend, PayerDebit, SpendReceipt};
