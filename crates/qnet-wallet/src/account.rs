//! Derived accounts.
//!
//! An account is one index on both networks: the Solana keypair at
//! `m/44'/501'/0'/{index}'` and the QNet hash for the same index.

use qnet_crypto::SolanaKeypair;
use qnet_types::address::EonAddress;
use qnet_types::constants::{EonFormat, KEY_SIZE, SIGNATURE_SIZE};
use qnet_types::Network;
use serde::{Deserialize, Serialize};

use crate::error::WalletError;
use crate::keys::WalletKeys;

/// Public account data: what the vault records and what callers see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub index: u32,
    pub label: String,
    pub solana_address: String,
    pub eon_address: String,
}

impl AccountRecord {
    pub fn address(&self, network: Network) -> &str {
        match network {
            Network::Solana => &self.solana_address,
            Network::QNet => &self.eon_address,
        }
    }
}

/// A derived account with its signing key.
pub struct Account {
    pub index: u32,
    pub label: String,
    solana: SolanaKeypair,
    eon_hash: [u8; KEY_SIZE],
    solana_address: String,
    eon_address: String,
}

/// Label given to accounts created without one.
pub fn default_label(index: u32) -> String {
    if index == 0 {
        "Primary account".to_string()
    } else {
        format!("Account #{}", index)
    }
}

impl Account {
    pub fn derive(
        keys: &WalletKeys,
        index: u32,
        label: String,
        format: EonFormat,
    ) -> Result<Self, WalletError> {
        let solana = keys.solana_keypair(index)?;
        let eon_hash = keys.qnet_hash(index);
        let solana_address = solana.address();
        let eon_address = match format {
            EonFormat::V1 => EonAddress::from_hash(&eon_hash).to_address_string(),
        };
        Ok(Self {
            index,
            label,
            solana,
            eon_hash,
            solana_address,
            eon_address,
        })
    }

    pub fn address(&self, network: Network) -> &str {
        match network {
            Network::Solana => &self.solana_address,
            Network::QNet => &self.eon_address,
        }
    }

    pub fn solana_public_key(&self) -> &[u8; KEY_SIZE] {
        self.solana.public_key()
    }

    pub fn eon_hash(&self) -> &[u8; KEY_SIZE] {
        &self.eon_hash
    }

    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_SIZE] {
        self.solana.sign(message)
    }

    pub fn record(&self) -> AccountRecord {
        AccountRecord {
            index: self.index,
            label: self.label.clone(),
            solana_address: self.solana_address.clone(),
            eon_address: self.eon_address.clone(),
        }
    }

    /// Whether the stored record agrees with what was just derived.
    pub fn matches(&self, record: &AccountRecord) -> bool {
        self.index == record.index
            && self.solana_address == record.solana_address
            && self.eon_address == record.eon_address
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("index", &self.index)
            .field("label", &self.label)
            .field("solana_address", &self.solana_address)
            .field("eon_address", &self.eon_address)
            .finish_non_exhaustive()
    }
}
