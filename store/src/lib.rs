//! Abstract storage traits for the points ledger.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The rest of the codebase depends only on the traits.

pub mod aggregate;
pub mod batch;
pub mod error;
pub mod grant;
pub mod meta;

pub use aggregate::{aggregate_balances, Balances, PayerBalance};
pub use batch::{check_new_grant, check_update, GrantBatch, NewGrant, RemainingUpdate};
pub use error::StoreError;
pub use grant::GrantStore;
pub use meta::MetaStore;
