//! Validation errors for the fundamental types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("payer must not be empty")]
    EmptyPayer,

    #[error("payer is {len} characters long, the maximum is {max}")]
    PayerTooLong { len: usize, max: usize },
}
