//! QNet wallet core.
//!
//! Derives Solana and QNet accounts from one BIP39 mnemonic, seals the
//! mnemonic in a password-encrypted vault, and runs the
//! `Uninitialized → Locked ⇄ Unlocked` lifecycle with inactivity auto-lock.

pub mod account;
pub mod config;
pub mod encryption;
pub mod error;
pub mod keys;
pub mod service;
pub mod storage;
pub mod wallet;

pub use account::{Account, AccountRecord};
pub use config::WalletConfig;
pub use encryption::{EncryptedVault, VaultPayload};
pub use error::WalletError;
pub use keys::WalletKeys;
pub use service::{spawn_wallet_service, WalletHandle, WalletRequest};
pub use storage::{FileVaultStore, MemoryVaultStore, VaultStore};
pub use wallet::{Wallet, WalletStatus};
