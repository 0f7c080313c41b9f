use std::fmt;

use points_types::PayerId;
use thiserror::Error;

/// Which balance an insufficient-funds failure was measured against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FundsScope {
    /// A clawback, limited to one payer's unspent grants.
    Payer(PayerId),
    /// A spend, drawing on every payer.
    AllPayers,
}

impl fmt::Display for FundsScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Payer(payer) => write!(f, "payer {}", payer),
            Self::AllPayers => f.write_str("all payers"),
        }
    }
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid amount {0}: points to spend must be positive")]
    InvalidAmount(i64),

    #[error("insufficient points for {scope}: need {needed}, have {available}")]
    InsufficientFunds {
        scope: FundsScope,
        needed: u64,
        available: u64,
    },

    #[error("storage error: {0}")]
    Storage(#[from] points_store::StoreError),
}
