//! Core types and constants for the QNet wallet.
//!
//! This crate provides the foundational types used across all QNet crates:
//! network identifiers, Base58 and EON address encoding/decoding, and BIP39
//! mnemonic phrases.

pub mod address;
pub mod base58;
pub mod constants;
pub mod mnemonic;

pub use address::{EonAddress, ParsedAddress};
pub use constants::{EonFormat, Network};
pub use mnemonic::{Mnemonic, MnemonicError, WordCount};
