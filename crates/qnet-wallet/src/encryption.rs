//! Vault encryption.
//!
//! Seals the wallet payload using PBKDF2-HMAC-SHA256 key derivation +
//! AES-256-GCM. A vault carries every parameter needed for decryption
//! except the password.
//!
//! Binary layout (`to_bytes`):
//!
//! | field          | size |
//! |----------------|------|
//! | magic `QNVT`   | 4    |
//! | version        | 1    |
//! | kdf iterations | 4 LE |
//! | salt           | 16   |
//! | nonce          | 12   |
//! | ciphertext+tag | rest |

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use qnet_crypto::kdf::{derive_vault_key, MIN_KDF_ITERATIONS, VAULT_KEY_SIZE};
use qnet_types::EonFormat;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, Zeroizing};

use crate::account::AccountRecord;
use crate::error::WalletError;

/// Magic bytes identifying a QNet vault file.
const MAGIC: &[u8; 4] = b"QNVT";

/// Current vault format version.
pub const VAULT_VERSION: u8 = 1;

pub const SALT_SIZE: usize = 16;
pub const NONCE_SIZE: usize = 12;

/// AES-GCM authentication tag length.
const TAG_SIZE: usize = 16;

/// Header size: 4 (magic) + 1 (version) + 4 (iterations) + 16 (salt) + 12 (nonce) = 37 bytes.
const HEADER_SIZE: usize = 4 + 1 + 4 + SALT_SIZE + NONCE_SIZE;

/// The durable, encrypted form of the wallet secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedVault {
    #[serde(with = "hex_bytes")]
    pub ciphertext: Vec<u8>,
    #[serde(with = "hex_bytes::array")]
    pub salt: [u8; SALT_SIZE],
    #[serde(with = "hex_bytes::array")]
    pub iv: [u8; NONCE_SIZE],
    pub kdf_iterations: u32,
    pub version: u8,
}

impl EncryptedVault {
    /// Structural checks on the public header fields.
    pub fn check_header(&self) -> Result<(), WalletError> {
        if self.version != VAULT_VERSION {
            return Err(WalletError::Storage(format!(
                "unsupported vault version: {}",
                self.version
            )));
        }
        if self.kdf_iterations < MIN_KDF_ITERATIONS {
            return Err(WalletError::Storage(format!(
                "vault KDF iteration count {} is below the minimum of {}",
                self.kdf_iterations, MIN_KDF_ITERATIONS
            )));
        }
        if self.ciphertext.is_empty() {
            return Err(WalletError::Storage("no ciphertext".into()));
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_SIZE + self.ciphertext.len());
        out.extend_from_slice(MAGIC);
        out.push(self.version);
        out.extend_from_slice(&self.kdf_iterations.to_le_bytes());
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(&self.iv);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, WalletError> {
        if data.len() < HEADER_SIZE {
            return Err(WalletError::Storage("vault file too short".into()));
        }
        if &data[0..4] != MAGIC {
            return Err(WalletError::Storage("invalid magic bytes".into()));
        }

        let mut iterations = [0u8; 4];
        iterations.copy_from_slice(&data[5..9]);
        let mut salt = [0u8; SALT_SIZE];
        salt.copy_from_slice(&data[9..9 + SALT_SIZE]);
        let mut iv = [0u8; NONCE_SIZE];
        iv.copy_from_slice(&data[9 + SALT_SIZE..HEADER_SIZE]);

        let vault = Self {
            ciphertext: data[HEADER_SIZE..].to_vec(),
            salt,
            iv,
            kdf_iterations: u32::from_le_bytes(iterations),
            version: data[4],
        };
        vault.check_header()?;
        Ok(vault)
    }

    pub fn to_json(&self) -> Result<String, WalletError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, WalletError> {
        let vault: Self = serde_json::from_str(text)
            .map_err(|e| WalletError::Storage(format!("invalid vault record: {}", e)))?;
        vault.check_header()?;
        Ok(vault)
    }
}

/// Check if data is a binary vault file (has QNVT magic).
pub fn is_vault_file(data: &[u8]) -> bool {
    data.len() >= HEADER_SIZE && &data[0..4] == MAGIC
}

/// Get the version byte from a binary vault file.
pub fn vault_file_version(data: &[u8]) -> Option<u8> {
    if data.len() >= 5 && &data[0..4] == MAGIC {
        Some(data[4])
    } else {
        None
    }
}

// ── Vault key ────────────────────────────────────────────────────────────

/// A derived vault key together with the salt and iteration count it was
/// derived with. Lets an unlocked wallet re-seal without the password.
pub struct VaultKey {
    key: Zeroizing<[u8; VAULT_KEY_SIZE]>,
    salt: [u8; SALT_SIZE],
    iterations: u32,
}

impl VaultKey {
    /// Derive a key under a fresh random salt.
    pub fn generate(password: &[u8], iterations: u32) -> Result<Self, WalletError> {
        let mut salt = [0u8; SALT_SIZE];
        fill_random(&mut salt)?;
        Self::derive(password, salt, iterations)
    }

    pub fn derive(password: &[u8], salt: [u8; SALT_SIZE], iterations: u32) -> Result<Self, WalletError> {
        let key = derive_vault_key(password, &salt, iterations)?;
        Ok(Self { key, salt, iterations })
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Encrypt under this key with a fresh nonce.
    #[allow(deprecated)] // aes-gcm 0.10 uses generic-array 0.x
    pub fn seal(&self, plaintext: &[u8]) -> Result<EncryptedVault, WalletError> {
        let mut iv = [0u8; NONCE_SIZE];
        fill_random(&mut iv)?;

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key[..]));
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&iv), plaintext)
            .map_err(|e| WalletError::Storage(format!("encryption failed: {}", e)))?;

        Ok(EncryptedVault {
            ciphertext,
            salt: self.salt,
            iv,
            kdf_iterations: self.iterations,
            version: VAULT_VERSION,
        })
    }

    /// Decrypt a vault sealed under this key.
    #[allow(deprecated)] // aes-gcm 0.10 uses generic-array 0.x
    pub fn open(&self, vault: &EncryptedVault) -> Result<Zeroizing<Vec<u8>>, WalletError> {
        vault.check_header()?;
        if vault.ciphertext.len() < TAG_SIZE {
            return Err(WalletError::Authentication);
        }
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key[..]));
        let plaintext = cipher
            .decrypt(Nonce::from_slice(&vault.iv), vault.ciphertext.as_slice())
            .map_err(|_| WalletError::Authentication)?;
        Ok(Zeroizing::new(plaintext))
    }

    /// Derive the key for `vault` from `password` and decrypt it.
    pub fn unlock(
        password: &[u8],
        vault: &EncryptedVault,
    ) -> Result<(Zeroizing<Vec<u8>>, Self), WalletError> {
        vault.check_header()?;
        let key = Self::derive(password, vault.salt, vault.kdf_iterations)?;
        let plaintext = key.open(vault)?;
        Ok((plaintext, key))
    }
}

fn fill_random(buf: &mut [u8]) -> Result<(), WalletError> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|e| WalletError::Entropy(e.to_string()))
}

/// Encrypt `plaintext` under a fresh salt and nonce.
pub fn encrypt(plaintext: &[u8], password: &[u8], iterations: u32) -> Result<EncryptedVault, WalletError> {
    VaultKey::generate(password, iterations)?.seal(plaintext)
}

/// Decrypt a vault. Any tag failure is `Authentication`.
pub fn decrypt(vault: &EncryptedVault, password: &[u8]) -> Result<Zeroizing<Vec<u8>>, WalletError> {
    VaultKey::unlock(password, vault).map(|(plaintext, _)| plaintext)
}

/// Re-encrypt a vault with a new password, keeping its iteration count.
pub fn reencrypt(
    vault: &EncryptedVault,
    old_password: &[u8],
    new_password: &[u8],
) -> Result<EncryptedVault, WalletError> {
    let plaintext = decrypt(vault, old_password)?;
    encrypt(&plaintext, new_password, vault.kdf_iterations)
}

// ── Payload ──────────────────────────────────────────────────────────────

/// Plaintext sealed inside the vault.
#[derive(Serialize, Deserialize)]
pub struct VaultPayload {
    pub mnemonic: String,
    #[serde(default)]
    pub passphrase: String,
    pub accounts: Vec<AccountRecord>,
    #[serde(default)]
    pub eon_format: EonFormat,
}

impl VaultPayload {
    pub fn to_json(&self) -> Result<Zeroizing<Vec<u8>>, WalletError> {
        Ok(Zeroizing::new(serde_json::to_vec(self)?))
    }

    pub fn from_json(data: &[u8]) -> Result<Self, WalletError> {
        Ok(serde_json::from_slice(data)?)
    }
}

impl Drop for VaultPayload {
    fn drop(&mut self) {
        self.mnemonic.zeroize();
        self.passphrase.zeroize();
    }
}

impl std::fmt::Debug for VaultPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultPayload")
            .field("accounts", &self.accounts)
            .field("eon_format", &self.eon_format)
            .finish_non_exhaustive()
    }
}

/// Hex (de)serialisation for byte fields in the JSON vault record.
mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(d)?;
        hex::decode(text).map_err(serde::de::Error::custom)
    }

    pub mod array {
        use serde::{Deserializer, Serializer};

        pub fn serialize<S: Serializer, const N: usize>(bytes: &[u8; N], s: S) -> Result<S::Ok, S::Error> {
            super::serialize(bytes, s)
        }

        pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(d: D) -> Result<[u8; N], D::Error> {
            let bytes = super::deserialize(d)?;
            bytes.try_into().map_err(|v: Vec<u8>| {
                serde::de::Error::custom(format!("expected {} bytes, got {}", N, v.len()))
            })
        }
    }
}
