//! Payer identifier.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TypesError;

/// The name of the party that issued a grant (e.g. `"DANNON"`).
///
/// The ledger core accepts any string; request layers call
/// [`PayerId::parse`] to enforce the length bound before reaching it.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PayerId(String);

impl PayerId {
    /// Longest payer name accepted by [`PayerId::parse`].
    pub const MAX_LEN: usize = 75;

    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Validate and wrap a payer name received from outside the process.
    pub fn parse(raw: impl Into<String>) -> Result<Self, TypesError> {
        let s = raw.into();
        let len = s.chars().count();
        if s.trim().is_empty() {
            return Err(TypesError::EmptyPayer);
        }
        if len > Self::MAX_LEN {
            return Err(TypesError::PayerTooLong {
                len,
                max: Self::MAX_LEN,
            });
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PayerId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
