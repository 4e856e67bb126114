//! QNet account hashes.
//!
//! hash = SHA-256(seed || "qnet-eon-" || decimal(account_index))

use qnet_types::address::encode_eon;
use qnet_types::constants::{KEY_SIZE, QNET_EON_DOMAIN};
use sha2::{Digest, Sha256};

use crate::seed::Seed;

/// Derive the 32-byte QNet account hash for `account_index`.
pub fn derive_qnet_address(seed: &Seed, account_index: u32) -> [u8; KEY_SIZE] {
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    hasher.update(QNET_EON_DOMAIN);
    hasher.update(account_index.to_string().as_bytes());
    log::debug!("derived qnet account {}", account_index);
    hasher.finalize().into()
}

/// Derive and encode the EON address for `account_index`.
pub fn derive_eon_address(seed: &Seed, account_index: u32) -> String {
    encode_eon(&derive_qnet_address(seed, account_index))
}
