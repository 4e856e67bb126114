//! SLIP-0010 hierarchical derivation for Ed25519.
//!
//! Ed25519 only supports hardened children: every path segment must carry
//! the `'` marker, and child data is `0x00 || parent_key || ser32(index)`.

use hmac::{Hmac, Mac};
use sha2::Sha512;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;

type HmacSha512 = Hmac<Sha512>;

/// HMAC key for the master node.
const MASTER_SECRET: &[u8] = b"ed25519 seed";

/// First hardened child index (2^31).
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// A private key and chain code at some node of the tree.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ExtendedKey {
    key: [u8; 32],
    chain_code: [u8; 32],
}

impl ExtendedKey {
    /// Master node: `HMAC-SHA512("ed25519 seed", seed)`.
    pub fn master(seed: &[u8]) -> Result<Self, CryptoError> {
        let mut mac = HmacSha512::new_from_slice(MASTER_SECRET)
            .map_err(|e| CryptoError::Derivation(format!("HMAC init failed: {}", e)))?;
        mac.update(seed);
        Ok(Self::from_hmac(mac))
    }

    /// Hardened child. `index` is the child number without the hardened bit.
    pub fn derive_hardened(&self, index: u32) -> Result<Self, CryptoError> {
        if index >= HARDENED_OFFSET {
            return Err(CryptoError::InvalidIndex(index));
        }
        let mut mac = HmacSha512::new_from_slice(&self.chain_code)
            .map_err(|e| CryptoError::Derivation(format!("HMAC init failed: {}", e)))?;
        mac.update(&[0x00]);
        mac.update(&self.key);
        mac.update(&(index | HARDENED_OFFSET).to_be_bytes());
        Ok(Self::from_hmac(mac))
    }

    fn from_hmac(mac: HmacSha512) -> Self {
        let mut out = [0u8; 64];
        out.copy_from_slice(&mac.finalize().into_bytes());

        let mut key = [0u8; 32];
        let mut chain_code = [0u8; 32];
        key.copy_from_slice(&out[..32]);
        chain_code.copy_from_slice(&out[32..]);
        out.zeroize();

        Self { key, chain_code }
    }

    /// The 32-byte private key (an Ed25519 seed).
    pub fn key(&self) -> &[u8; 32] {
        &self.key
    }

    pub fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }
}

/// Parse `m/44'/501'/0'/0'` into child numbers without the hardened bit.
///
/// Accepts `'` or `h` as the hardened marker; rejects anything else.
pub fn parse_path(path: &str) -> Result<Vec<u32>, CryptoError> {
    let path = path.trim();
    let rest = match path {
        "m" => return Ok(Vec::new()),
        p if p.starts_with("m/") => &p[2..],
        _ => return Err(CryptoError::InvalidPath(format!("{} (must start with m/)", path))),
    };

    rest.split('/')
        .map(|segment| {
            let number = segment
                .strip_suffix('\'')
                .or_else(|| segment.strip_suffix('h'))
                .ok_or_else(|| {
                    CryptoError::InvalidPath(format!("segment '{}' is not hardened", segment))
                })?;
            let index: u32 = number
                .parse()
                .map_err(|_| CryptoError::InvalidPath(format!("bad segment '{}'", segment)))?;
            if index >= HARDENED_OFFSET {
                return Err(CryptoError::InvalidIndex(index));
            }
            Ok(index)
        })
        .collect()
}

/// Derive the node at `path` from a BIP39 seed.
pub fn derive_path(seed: &[u8], path: &str) -> Result<ExtendedKey, CryptoError> {
    let indices = parse_path(path)?;
    let mut node = ExtendedKey::master(seed)?;
    for index in indices {
        node = node.derive_hardened(index)?;
    }
    Ok(node)
}
