use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("key derivation failed: {0}")]
    Derivation(String),

    #[error("invalid derivation path: {0}")]
    InvalidPath(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("account index {0} is outside the hardened range")]
    InvalidIndex(u32),

    #[error("signature verification failed")]
    InvalidSignature,

    #[error("KDF iteration count {iterations} is below the minimum of {minimum}")]
    WeakKdf { iterations: u32, minimum: u32 },
}
