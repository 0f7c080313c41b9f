//! In-memory stand-ins for the storage backends.
//!
//! `NullGrantStore` implements the same `GrantStore` contract as the LMDB
//! backend but keeps everything in a mutex-guarded map. Tests can inspect a
//! snapshot of its state and inject a failing commit to check rollback.

pub mod store;

pub use store::NullGrantStore;
