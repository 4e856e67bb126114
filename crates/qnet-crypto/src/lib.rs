//! Cryptographic primitives for the QNet wallet.
//!
//! - `seed`: BIP39 mnemonic → 64-byte seed (PBKDF2-HMAC-SHA512)
//! - `slip10`: hardened-only Ed25519 HD derivation
//! - `solana`: Ed25519 keypairs, signing and verification
//! - `eon`: QNet account hash derivation
//! - `kdf`: password → vault key (PBKDF2-HMAC-SHA256)

pub mod eon;
pub mod error;
pub mod kdf;
pub mod seed;
pub mod slip10;
pub mod solana;

pub use eon::{derive_eon_address, derive_qnet_address};
pub use error::CryptoError;
pub use seed::{to_seed, Seed};
pub use solana::{derive_solana_account, SolanaKeypair};
