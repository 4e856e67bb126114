//! Wallet error types.

use qnet_crypto::CryptoError;
use qnet_types::address::AddressError;
use qnet_types::MnemonicError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WalletError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("secure random source unavailable: {0}")]
    Entropy(String),

    #[error("key derivation failed: {0}")]
    Derivation(String),

    #[error("decryption failed (wrong password or corrupted data)")]
    Authentication,

    #[error("storage error: {0}")]
    Storage(String),

    #[error("wallet is locked")]
    Locked,

    #[error("no wallet found (create or import one first)")]
    NotInitialized,

    #[error("a wallet already exists")]
    AlreadyInitialized,

    #[error("unknown account index {0}")]
    UnknownAccount(u32),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("wallet service has shut down")]
    ServiceClosed,
}

impl From<MnemonicError> for WalletError {
    fn from(e: MnemonicError) -> Self {
        match e {
            MnemonicError::Entropy(msg) => WalletError::Entropy(msg),
            other => WalletError::Validation(format!("invalid mnemonic: {}", other)),
        }
    }
}

impl From<CryptoError> for WalletError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::WeakKdf { .. } => WalletError::Validation(e.to_string()),
            other => WalletError::Derivation(other.to_string()),
        }
    }
}

impl From<AddressError> for WalletError {
    fn from(e: AddressError) -> Self {
        WalletError::Validation(format!("invalid address: {}", e))
    }
}

impl From<serde_json::Error> for WalletError {
    fn from(e: serde_json::Error) -> Self {
        WalletError::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for WalletError {
    fn from(e: std::io::Error) -> Self {
        WalletError::Storage(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mnemonic_errors_map() {
        assert!(matches!(
            WalletError::from(MnemonicError::ChecksumMismatch),
            WalletError::Validation(_)
        ));
        assert_eq!(
            WalletError::from(MnemonicError::Entropy("no rng".into())),
            WalletError::Entropy("no rng".into())
        );
    }

    #[test]
    fn test_crypto_errors_map() {
        assert!(matches!(
            WalletError::from(CryptoError::InvalidIndex(u32::MAX)),
            WalletError::Derivation(_)
        ));
        assert!(matches!(
            WalletError::from(CryptoError::WeakKdf { iterations: 1, minimum: 10_000 }),
            WalletError::Validation(_)
        ));
    }

    #[test]
    fn test_authentication_message_is_generic() {
        assert_eq!(
            WalletError::Authentication.to_string(),
            "decryption failed (wrong password or corrupted data)"
        );
    }
}
