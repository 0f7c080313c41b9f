//! Binary key layouts.
//!
//! - `grants`: `id_be(8)` → bincode `Grant`.
//! - `grant_order`: `occurred_at_key(8) ++ id_be(8)` → empty, every grant.
//! - `unspent`: same key as `grant_order`, only grants with `remaining > 0`.
//! - `payer_unspent`: `payer_len_be(4) ++ payer ++ occurred_at_key(8) ++ id_be(8)`
//!   → empty, only grants with `remaining > 0`. The length prefix keeps a
//!   scan for `"AB"` from matching `"ABC"`.

use points_types::{Grant, GrantId, PayerId, Timestamp};

use crate::LmdbError;

pub(crate) fn grant_key(id: GrantId) -> [u8; 8] {
    id.as_u64().to_be_bytes()
}

pub(crate) fn order_key(occurred_at: Timestamp, id: GrantId) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&occurred_at.to_key_bytes());
    key[8..].copy_from_slice(&grant_key(id));
    key
}

pub(crate) fn payer_prefix(payer: &PayerId) -> Vec<u8> {
    let name = payer.as_str().as_bytes();
    let mut key = Vec::with_capacity(4 + name.len() + 16);
    key.extend_from_slice(&(name.len() as u32).to_be_bytes());
    key.extend_from_slice(name);
    key
}

pub(crate) fn payer_order_key(grant: &Grant) -> Vec<u8> {
    let mut key = payer_prefix(&grant.payer);
    key.extend_from_slice(&order_key(grant.occurred_at, grant.id));
    key
}

/// Extract the grant id from the trailing 8 bytes of any index key.
pub(crate) fn id_from_index_key(key: &[u8]) -> Result<GrantId, LmdbError> {
    if key.len() < 16 {
        return Err(LmdbError::Serialization(format!(
            "index key too short ({} bytes)",
            key.len()
        )));
    }
    let mut id = [0u8; 8];
    id.copy_from_slice(&key[key.len() - 8..]);
    Ok(GrantId::new(u64::from_be_bytes(id)))
}

/// Smallest key greater than every key starting with `prefix`, if any.
pub(crate) fn increment_prefix(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut upper = prefix.to_vec();
    while let Some(last) = upper.last_mut() {
        if *last == 0xFF {
            upper.pop();
        } else {
            *last += 1;
            return Some(upper);
        }
    }
    None
}
