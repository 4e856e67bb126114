//! Wallet key material.
//!
//! `WalletKeys` holds the mnemonic, the optional BIP39 passphrase and the
//! seed derived from them. All three are wiped when the value is dropped.

use qnet_crypto::seed::{to_seed, Seed};
use qnet_crypto::{derive_qnet_address, derive_solana_account, SolanaKeypair};
use qnet_types::constants::KEY_SIZE;
use qnet_types::Mnemonic;
use zeroize::Zeroizing;

use crate::error::WalletError;

pub struct WalletKeys {
    mnemonic: Mnemonic,
    passphrase: Zeroizing<String>,
    seed: Seed,
}

impl WalletKeys {
    pub fn new(mnemonic: Mnemonic, passphrase: &str) -> Self {
        let seed = to_seed(&mnemonic, passphrase);
        Self {
            mnemonic,
            passphrase: Zeroizing::new(passphrase.to_string()),
            seed,
        }
    }

    /// Parse a phrase (checksum enforced) and derive the seed.
    pub fn from_phrase(phrase: &str, passphrase: &str) -> Result<Self, WalletError> {
        let mnemonic = Mnemonic::parse(phrase)?;
        Ok(Self::new(mnemonic, passphrase))
    }

    pub fn mnemonic(&self) -> &Mnemonic {
        &self.mnemonic
    }

    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }

    pub fn seed(&self) -> &Seed {
        &self.seed
    }

    pub fn solana_keypair(&self, index: u32) -> Result<SolanaKeypair, WalletError> {
        Ok(derive_solana_account(&self.seed, index)?)
    }

    pub fn qnet_hash(&self, index: u32) -> [u8; KEY_SIZE] {
        derive_qnet_address(&self.seed, index)
    }
}

impl std::fmt::Debug for WalletKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletKeys")
            .field("mnemonic", &self.mnemonic)
            .finish_non_exhaustive()
    }
}
