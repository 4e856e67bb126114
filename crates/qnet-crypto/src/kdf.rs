//! Password-based vault key derivation.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::CryptoError;

/// Vault key length (AES-256).
pub const VAULT_KEY_SIZE: usize = 32;

/// Lowest accepted PBKDF2 iteration count.
pub const MIN_KDF_ITERATIONS: u32 = 10_000;

/// Default PBKDF2 iteration count for new vaults.
pub const DEFAULT_KDF_ITERATIONS: u32 = 100_000;

/// Derive a 32-byte vault key with PBKDF2-HMAC-SHA256.
pub fn derive_vault_key(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
) -> Result<Zeroizing<[u8; VAULT_KEY_SIZE]>, CryptoError> {
    if iterations < MIN_KDF_ITERATIONS {
        return Err(CryptoError::WeakKdf {
            iterations,
            minimum: MIN_KDF_ITERATIONS,
        });
    }
    let mut key = Zeroizing::new([0u8; VAULT_KEY_SIZE]);
    pbkdf2_hmac::<Sha256>(password, salt, iterations, key.as_mut());
    Ok(key)
}
