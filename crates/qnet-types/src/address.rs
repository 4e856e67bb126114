//! Solana and EON address creation, parsing, and validation.
//!
//! Solana addresses are the Base58 encoding of a 32-byte Ed25519 public key.
//! EON addresses use a single canonical, versioned layout:
//!
//! ```text
//! [19 body chars]["eon"][15 body chars][4 checksum chars]   (41 chars)
//! ```
//!
//! The 34 body characters carry the first 170 bits of the account hash,
//! five bits per character. The checksum is the first 20 bits of
//! `SHA-256(version || body)`.

use crate::base58;
use crate::constants::{
    EonFormat, Network, EON_ADDRESS_LEN, EON_ALPHABET, EON_BODY_LEN, EON_CHECKSUM_LEN,
    EON_HEAD_LEN, EON_LEGACY_LEN, EON_LEGACY_MARKER_OFFSET, EON_MARKER, KEY_SIZE,
    SOLANA_ADDRESS_MAX_LEN, SOLANA_ADDRESS_MIN_LEN,
};
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("address must be a non-empty string")]
    Empty,

    #[error("invalid address length ({0})")]
    InvalidLength(usize),

    #[error("base58 decode error: {0}")]
    Base58(#[from] base58::Base58Error),

    #[error("invalid character '{0}' at position {1}")]
    InvalidCharacter(char, usize),

    #[error("missing \"eon\" marker at offset {0}")]
    MissingMarker(usize),

    #[error("checksum mismatch")]
    ChecksumMismatch,

    #[error("legacy compact EON layout is not supported; re-derive the address from the wallet")]
    LegacyLayout,

    #[error("unrecognised address format")]
    UnknownFormat,
}

/// Build reverse EON alphabet lookup table at compile time.
const fn build_reverse_eon_alphabet() -> [u8; 128] {
    let mut table = [0xFFu8; 128];
    let mut i = 0;
    while i < 32 {
        table[EON_ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    table
}

static REVERSE_EON_ALPHABET: [u8; 128] = build_reverse_eon_alphabet();

fn eon_digit(ch: u8) -> Option<u8> {
    if ch >= 128 {
        return None;
    }
    match REVERSE_EON_ALPHABET[ch as usize] {
        0xFF => None,
        d => Some(d),
    }
}

/// Read `count` bits starting at bit `offset` (MSB first).
fn read_bits(data: &[u8], offset: usize, count: usize) -> u32 {
    let mut value = 0u32;
    for bit in offset..offset + count {
        let b = (data[bit / 8] >> (7 - (bit % 8))) & 1;
        value = (value << 1) | b as u32;
    }
    value
}

/// Checksum characters over the version byte and the body characters.
fn eon_checksum(format: EonFormat, body: &[u8]) -> [u8; EON_CHECKSUM_LEN] {
    let mut hasher = Sha256::new();
    hasher.update([format.version_byte()]);
    hasher.update(body);
    let hash = hasher.finalize();

    let mut out = [0u8; EON_CHECKSUM_LEN];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = EON_ALPHABET[read_bits(&hash, i * 5, 5) as usize];
    }
    out
}

/// Body characters for a 32-byte account hash.
fn eon_body(hash: &[u8; KEY_SIZE]) -> [u8; EON_BODY_LEN] {
    let mut body = [0u8; EON_BODY_LEN];
    for (i, slot) in body.iter_mut().enumerate() {
        *slot = EON_ALPHABET[read_bits(hash, i * 5, 5) as usize];
    }
    body
}

// =============================================================================
// EON
// =============================================================================

/// A structurally valid, checksum-verified EON address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EonAddress {
    pub format: EonFormat,
    /// The 34 body characters (ASCII, from the EON alphabet).
    body: [u8; EON_BODY_LEN],
}

impl EonAddress {
    /// Build the address for an account hash.
    pub fn from_hash(hash: &[u8; KEY_SIZE]) -> Self {
        Self {
            format: EonFormat::CURRENT,
            body: eon_body(hash),
        }
    }

    /// Whether this address was produced from `hash`.
    pub fn matches_hash(&self, hash: &[u8; KEY_SIZE]) -> bool {
        self.body == eon_body(hash)
    }

    /// Re-encode to the canonical string form.
    pub fn to_address_string(&self) -> String {
        let checksum = eon_checksum(self.format, &self.body);
        let mut out = String::with_capacity(EON_ADDRESS_LEN);
        // Body and checksum bytes come from EON_ALPHABET, so they are ASCII.
        out.extend(self.body[..EON_HEAD_LEN].iter().map(|&b| b as char));
        out.push_str(EON_MARKER);
        out.extend(self.body[EON_HEAD_LEN..].iter().map(|&b| b as char));
        out.extend(checksum.iter().map(|&b| b as char));
        out
    }
}

impl std::fmt::Display for EonAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_address_string())
    }
}

/// Encode a 32-byte account hash as an EON address string.
pub fn encode_eon(hash: &[u8; KEY_SIZE]) -> String {
    EonAddress::from_hash(hash).to_address_string()
}

/// Parse and validate an EON address string.
pub fn parse_eon(address: &str) -> Result<EonAddress, AddressError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(AddressError::Empty);
    }
    let bytes = address.as_bytes();

    if bytes.len() == EON_LEGACY_LEN
        && &bytes[EON_LEGACY_MARKER_OFFSET..EON_LEGACY_MARKER_OFFSET + EON_MARKER.len()]
            == EON_MARKER.as_bytes()
    {
        return Err(AddressError::LegacyLayout);
    }

    if bytes.len() != EON_ADDRESS_LEN {
        return Err(AddressError::InvalidLength(bytes.len()));
    }

    let marker_end = EON_HEAD_LEN + EON_MARKER.len();
    if &bytes[EON_HEAD_LEN..marker_end] != EON_MARKER.as_bytes() {
        return Err(AddressError::MissingMarker(EON_HEAD_LEN));
    }

    let mut body = [0u8; EON_BODY_LEN];
    let body_chars = bytes[..EON_HEAD_LEN]
        .iter()
        .enumerate()
        .chain(bytes[marker_end..marker_end + (EON_BODY_LEN - EON_HEAD_LEN)]
            .iter()
            .enumerate()
            .map(|(i, c)| (i + marker_end, c)));
    for (slot, (pos, &ch)) in body.iter_mut().zip(body_chars) {
        if eon_digit(ch).is_none() {
            return Err(AddressError::InvalidCharacter(ch as char, pos));
        }
        *slot = ch;
    }

    let checksum_start = EON_ADDRESS_LEN - EON_CHECKSUM_LEN;
    for (i, &ch) in bytes[checksum_start..].iter().enumerate() {
        if eon_digit(ch).is_none() {
            return Err(AddressError::InvalidCharacter(ch as char, checksum_start + i));
        }
    }

    let format = EonFormat::CURRENT;
    if eon_checksum(format, &body)[..] != bytes[checksum_start..] {
        return Err(AddressError::ChecksumMismatch);
    }

    Ok(EonAddress { format, body })
}

/// Validate an EON address string.
pub fn is_valid_eon(address: &str) -> bool {
    parse_eon(address).is_ok()
}

// =============================================================================
// Solana
// =============================================================================

/// Base58 address for an Ed25519 public key.
pub fn solana_address(public_key: &[u8; KEY_SIZE]) -> String {
    base58::encode(public_key)
}

/// Parse a Solana address back to its 32-byte public key.
pub fn parse_solana_address(address: &str) -> Result<[u8; KEY_SIZE], AddressError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(AddressError::Empty);
    }
    if address.len() < SOLANA_ADDRESS_MIN_LEN || address.len() > SOLANA_ADDRESS_MAX_LEN {
        return Err(AddressError::InvalidLength(address.len()));
    }
    Ok(base58::decode_array::<KEY_SIZE>(address)?)
}

/// Validate a Solana address string.
pub fn is_valid_solana_address(address: &str) -> bool {
    parse_solana_address(address).is_ok()
}

// =============================================================================
// Any network
// =============================================================================

/// Result of parsing an address of either network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedAddress {
    Solana([u8; KEY_SIZE]),
    Eon(EonAddress),
}

impl ParsedAddress {
    pub fn network(&self) -> Network {
        match self {
            ParsedAddress::Solana(_) => Network::Solana,
            ParsedAddress::Eon(_) => Network::QNet,
        }
    }
}

/// Parse an address, detecting the network from its shape.
pub fn parse_address(address: &str) -> Result<ParsedAddress, AddressError> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(AddressError::Empty);
    }
    let eon_shaped = trimmed.len() == EON_ADDRESS_LEN || trimmed.len() == EON_LEGACY_LEN;
    if eon_shaped && trimmed.contains(EON_MARKER) {
        match parse_eon(trimmed) {
            Ok(eon) => return Ok(ParsedAddress::Eon(eon)),
            // A Base58 key of the same length may contain "eon" by chance.
            Err(e) => {
                return parse_solana_address(trimmed)
                    .map(ParsedAddress::Solana)
                    .map_err(|_| e)
            }
        }
    }
    match parse_solana_address(trimmed) {
        Ok(key) => Ok(ParsedAddress::Solana(key)),
        Err(AddressError::InvalidLength(_)) => Err(AddressError::UnknownFormat),
        Err(e) => Err(e),
    }
}

/// Describe an address in human-readable form.
pub fn describe_address(address: &str) -> String {
    match parse_address(address) {
        Ok(ParsedAddress::Solana(key)) => {
            format!("Solana address (public key {})", hex::encode(key))
        }
        Ok(ParsedAddress::Eon(eon)) => format!("QNet EON address ({:?} layout)", eon.format),
        Err(e) => format!("Invalid address: {}", e),
    }
}
