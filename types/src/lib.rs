//! Fundamental types for the points ledger.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! grant identifiers, payer identifiers, logical timestamps and the grant record.

pub mod error;
pub mod grant;
pub mod payer;
pub mod time;

pub use error::TypesError;
pub use grant::{Grant, GrantId};
pub use payer::PayerId;
pub use time::Timestamp;
