//! Solana Ed25519 accounts.
//!
//! The SLIP-0010 child key at `m/44'/501'/0'/{i}'` is the Ed25519 seed. The
//! signing scalar is the RFC 8032 expansion of that seed: low half of
//! SHA-512(seed), clamped. Public key = scalar · B.

use curve25519_dalek::constants::ED25519_BASEPOINT_TABLE;
use curve25519_dalek::scalar::Scalar;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use qnet_types::address::solana_address;
use qnet_types::constants::{solana_path, KEY_SIZE, SIGNATURE_SIZE};
use sha2::{Digest, Sha512};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::CryptoError;
use crate::seed::Seed;
use crate::slip10::{derive_path, HARDENED_OFFSET};

/// Apply Ed25519 clamping to a scalar.
fn clamp(bytes: &mut [u8; 32]) {
    bytes[0] &= 248;
    bytes[31] &= 127;
    bytes[31] |= 64;
}

/// Compute the Ed25519 public key for a 32-byte seed.
pub fn public_key_from_seed(seed: &[u8; KEY_SIZE]) -> [u8; KEY_SIZE] {
    let mut expanded: [u8; 64] = Sha512::digest(seed).into();
    let mut s = [0u8; 32];
    s.copy_from_slice(&expanded[..32]);
    clamp(&mut s);

    let mut scalar = Scalar::from_bytes_mod_order(s);
    let public = (ED25519_BASEPOINT_TABLE * &scalar).compress().to_bytes();

    scalar.zeroize();
    s.zeroize();
    expanded.zeroize();
    public
}

/// An Ed25519 keypair for one Solana account.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SolanaKeypair {
    seed: [u8; KEY_SIZE],
    #[zeroize(skip)]
    public_key: [u8; KEY_SIZE],
}

impl SolanaKeypair {
    pub fn from_seed(seed: [u8; KEY_SIZE]) -> Self {
        let public_key = public_key_from_seed(&seed);
        Self { seed, public_key }
    }

    /// Load a Solana-style 64-byte secret (`seed || public_key`).
    pub fn from_private_key(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != 2 * KEY_SIZE {
            return Err(CryptoError::InvalidKey(format!(
                "expected {} bytes, got {}",
                2 * KEY_SIZE,
                bytes.len()
            )));
        }
        let mut seed = [0u8; KEY_SIZE];
        seed.copy_from_slice(&bytes[..KEY_SIZE]);
        let keypair = Self::from_seed(seed);
        seed.zeroize();
        if keypair.public_key[..] != bytes[KEY_SIZE..] {
            return Err(CryptoError::InvalidKey(
                "public key half does not match seed".into(),
            ));
        }
        Ok(keypair)
    }

    pub fn public_key(&self) -> &[u8; KEY_SIZE] {
        &self.public_key
    }

    /// 64 bytes: `seed || public_key`, the layout Solana tooling expects.
    pub fn private_key(&self) -> Zeroizing<[u8; 2 * KEY_SIZE]> {
        let mut out = Zeroizing::new([0u8; 2 * KEY_SIZE]);
        out[..KEY_SIZE].copy_from_slice(&self.seed);
        out[KEY_SIZE..].copy_from_slice(&self.public_key);
        out
    }

    /// Base58 address.
    pub fn address(&self) -> String {
        solana_address(&self.public_key)
    }

    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_SIZE] {
        SigningKey::from_bytes(&self.seed).sign(message).to_bytes()
    }
}

impl std::fmt::Debug for SolanaKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolanaKeypair")
            .field("public_key", &hex::encode(self.public_key))
            .finish_non_exhaustive()
    }
}

/// Verify an Ed25519 signature.
pub fn verify(
    public_key: &[u8; KEY_SIZE],
    message: &[u8],
    signature: &[u8; SIGNATURE_SIZE],
) -> Result<(), CryptoError> {
    let key = VerifyingKey::from_bytes(public_key)
        .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
    key.verify(message, &Signature::from_bytes(signature))
        .map_err(|_| CryptoError::InvalidSignature)
}

/// Derive the keypair for `account_index` at `m/44'/501'/0'/{index}'`.
pub fn derive_solana_account(seed: &Seed, account_index: u32) -> Result<SolanaKeypair, CryptoError> {
    if account_index >= HARDENED_OFFSET {
        return Err(CryptoError::InvalidIndex(account_index));
    }
    let node = derive_path(seed.as_bytes(), &solana_path(account_index))?;
    let keypair = SolanaKeypair::from_seed(*node.key());
    log::debug!("derived solana account {}", account_index);
    Ok(keypair)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_seed() -> Seed {
        let mut bytes = [0u8; 64];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = i as u8;
        }
        Seed::from_bytes(bytes)
    }

    #[test]
    fn test_slip10_vector1_public_keys() {
        let master = hex::decode("2b4be7f19ee27bbf30c667b642d5f4aa69fd169872f8fc3059c08ebae2eb19e7").unwrap();
        let mut seed = [0u8; 32];
        seed.copy_from_slice(&master);
        assert_eq!(
            hex::encode(public_key_from_seed(&seed)),
            "a4b2856bfec510abab89753fac1ac0e1112364e7d250545963f135f2a33188ed"
        );

        let child = hex::decode("68e0fe46dfb67e368c75379acec591dad19df3cde26e63b93a8e704f1dade7a3").unwrap();
        seed.copy_from_slice(&child);
        assert_eq!(
            hex::encode(public_key_from_seed(&seed)),
            "8c8a13df77a28f3445213a0f432fde644acaa215fc72dcdf300d5efaa85d350c"
        );
    }

    #[test]
    fn test_public_key_matches_dalek() {
        for i in 0..8u8 {
            let seed = [i.wrapping_mul(31).wrapping_add(7); 32];
            let ours = public_key_from_seed(&seed);
            let theirs = SigningKey::from_bytes(&seed).verifying_key().to_bytes();
            assert_eq!(ours, theirs);
        }
    }

    #[test]
    fn test_derivation_deterministic_and_distinct() {
        let seed = test_seed();
        let a = derive_solana_account(&seed, 0).unwrap();
        let b = derive_solana_account(&seed, 0).unwrap();
        let c = derive_solana_account(&seed, 1).unwrap();
        assert_eq!(a.public_key(), b.public_key());
        assert_eq!(a.private_key()[..], b.private_key()[..]);
        assert_ne!(a.public_key(), c.public_key());
    }

    #[test]
    fn test_private_key_layout() {
        let kp = derive_solana_account(&test_seed(), 3).unwrap();
        let sk = kp.private_key();
        assert_eq!(&sk[32..], kp.public_key());
        let reloaded = SolanaKeypair::from_private_key(&sk[..]).unwrap();
        assert_eq!(reloaded.public_key(), kp.public_key());
    }

    #[test]
    fn test_private_key_mismatch_rejected() {
        let kp = derive_solana_account(&test_seed(), 0).unwrap();
        let mut sk = *kp.private_key();
        sk[63] ^= 1;
        assert!(matches!(
            SolanaKeypair::from_private_key(&sk),
            Err(CryptoError::InvalidKey(_))
        ));
        assert!(SolanaKeypair::from_private_key(&sk[..10]).is_err());
    }

    #[test]
    fn test_sign_verify() {
        let kp = derive_solana_account(&test_seed(), 0).unwrap();
        let sig = kp.sign(b"hello qnet");
        assert!(verify(kp.public_key(), b"hello qnet", &sig).is_ok());
        assert_eq!(
            verify(kp.public_key(), b"hello qnef", &sig),
            Err(CryptoError::InvalidSignature)
        );
    }

    #[test]
    fn test_hardened_range_enforced() {
        assert_eq!(
            derive_solana_account(&test_seed(), HARDENED_OFFSET).unwrap_err(),
            CryptoError::InvalidIndex(HARDENED_OFFSET)
        );
        assert!(derive_solana_account(&test_seed(), HARDENED_OFFSET - 1).is_ok());
    }

    #[test]
    fn test_address_is_base58_pubkey() {
        let kp = derive_solana_account(&test_seed(), 0).unwrap();
        let parsed = qnet_types::address::parse_solana_address(&kp.address()).unwrap();
        assert_eq!(&parsed, kp.public_key());
    }

    #[test]
    fn test_debug_hides_seed() {
        let kp = SolanaKeypair::from_seed([9u8; 32]);
        assert!(!format!("{:?}", kp).contains(&hex::encode([9u8; 32])));
    }
}
