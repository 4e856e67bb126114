//! QNet network identifiers, address layouts, and size constants.

use serde::{Deserialize, Serialize};

// =============================================================================
// Network Types
// =============================================================================

/// Network a key or address belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Solana: Ed25519 keypair, Base58 address.
    Solana,
    /// QNet native network: EON address.
    #[serde(rename = "qnet")]
    QNet,
}

impl Network {
    pub const ALL: [Network; 2] = [Network::Solana, Network::QNet];

    pub fn name(self) -> &'static str {
        match self {
            Network::Solana => "solana",
            Network::QNet => "qnet",
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "solana" | "sol" => Ok(Network::Solana),
            "qnet" | "eon" => Ok(Network::QNet),
            _ => Err(format!("unknown network: {} (use solana or qnet)", s)),
        }
    }
}

// =============================================================================
// EON Address Layout
// =============================================================================

/// Versioned EON address layout.
///
/// The version byte is mixed into the checksum, so an address produced under
/// one layout never validates under another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EonFormat {
    /// `[19 body][eon][15 body][4 checksum]`, 41 characters.
    V1,
}

impl EonFormat {
    pub const CURRENT: EonFormat = EonFormat::V1;

    pub fn version_byte(self) -> u8 {
        match self {
            EonFormat::V1 => 1,
        }
    }
}

impl Default for EonFormat {
    fn default() -> Self {
        Self::CURRENT
    }
}

/// EON character alphabet: 32 lowercase alphanumerics (no `i`, `l`, `o`, `u`).
pub const EON_ALPHABET: &[u8; 32] = b"0123456789abcdefghjkmnpqrstvwxyz";

/// Literal separator embedded in every EON address.
pub const EON_MARKER: &str = "eon";

/// Body characters before the marker.
pub const EON_HEAD_LEN: usize = 19;

/// Body characters after the marker.
pub const EON_TAIL_LEN: usize = 15;

/// Trailing checksum characters (20 bits).
pub const EON_CHECKSUM_LEN: usize = 4;

/// Total EON body characters (34 × 5 = 170 bits of the account hash).
pub const EON_BODY_LEN: usize = EON_HEAD_LEN + EON_TAIL_LEN;

/// Total length of an EON v1 address.
pub const EON_ADDRESS_LEN: usize = EON_HEAD_LEN + EON_MARKER.len() + EON_TAIL_LEN + EON_CHECKSUM_LEN;

/// Length of the retired compact layout (8 + "eon" + 8 + 4).
pub const EON_LEGACY_LEN: usize = 23;

/// Offset of the marker in the retired compact layout.
pub const EON_LEGACY_MARKER_OFFSET: usize = 8;

/// Domain separator for QNet account hashing.
pub const QNET_EON_DOMAIN: &[u8] = b"qnet-eon-";

// =============================================================================
// Key and Derivation Sizes
// =============================================================================

/// Size of an Ed25519 public key, seed, or account hash in bytes.
pub const KEY_SIZE: usize = 32;

/// Size of a BIP39 seed in bytes.
pub const SEED_SIZE: usize = 64;

/// Size of an Ed25519 signature in bytes.
pub const SIGNATURE_SIZE: usize = 64;

/// SLIP-0044 coin type for Solana.
pub const SOLANA_COIN_TYPE: u32 = 501;

/// BIP-44 purpose level.
pub const BIP44_PURPOSE: u32 = 44;

/// Solana Base58 address length bounds (32-byte keys).
pub const SOLANA_ADDRESS_MIN_LEN: usize = 32;
pub const SOLANA_ADDRESS_MAX_LEN: usize = 44;

/// Solana derivation path for an account, all levels hardened.
pub fn solana_path(account_index: u32) -> String {
    format!(
        "m/{}'/{}'/0'/{}'",
        BIP44_PURPOSE, SOLANA_COIN_TYPE, account_index
    )
}
