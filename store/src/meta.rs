//! Metadata storage trait.

use crate::StoreError;

/// Backend bookkeeping: the schema version the stored data was written with.
pub trait MetaStore {
    /// Schema version recorded for the data. A fresh database reports 0.
    fn get_schema_version(&self) -> Result<u32, StoreError>;

    fn set_schema_version(&self, version: u32) -> Result<(), StoreError>;
}
