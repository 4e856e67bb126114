//! Vault persistence.
//!
//! The wallet only ever persists an `EncryptedVault`. `FileVaultStore`
//! writes the binary `QNVT` record, or the JSON record when the path ends
//! in `.json`; writes go through a temp file and rename.

use std::fs;
use std::path::{Path, PathBuf};

use crate::encryption::EncryptedVault;
use crate::error::WalletError;

/// Where the sealed vault lives.
pub trait VaultStore: Send {
    /// Load the vault, `None` when nothing has been stored.
    fn load(&self) -> Result<Option<EncryptedVault>, WalletError>;

    /// Replace the stored vault.
    fn save(&mut self, vault: &EncryptedVault) -> Result<(), WalletError>;

    /// Forget the stored vault.
    fn clear(&mut self) -> Result<(), WalletError>;

    fn exists(&self) -> Result<bool, WalletError> {
        Ok(self.load()?.is_some())
    }
}

/// In-memory store for tests and ephemeral wallets.
#[derive(Debug, Default, Clone)]
pub struct MemoryVaultStore {
    vault: Option<EncryptedVault>,
}

impl MemoryVaultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vault(vault: EncryptedVault) -> Self {
        Self { vault: Some(vault) }
    }
}

impl VaultStore for MemoryVaultStore {
    fn load(&self) -> Result<Option<EncryptedVault>, WalletError> {
        Ok(self.vault.clone())
    }

    fn save(&mut self, vault: &EncryptedVault) -> Result<(), WalletError> {
        self.vault = Some(vault.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), WalletError> {
        self.vault = None;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Binary,
    Json,
}

/// Vault stored in a single file.
#[derive(Debug, Clone)]
pub struct FileVaultStore {
    path: PathBuf,
    format: FileFormat,
}

impl FileVaultStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => FileFormat::Json,
            _ => FileFormat::Binary,
        };
        Self { path, format }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn encode(&self, vault: &EncryptedVault) -> Result<Vec<u8>, WalletError> {
        match self.format {
            FileFormat::Binary => Ok(vault.to_bytes()),
            FileFormat::Json => Ok(vault.to_json()?.into_bytes()),
        }
    }

    fn decode(&self, data: &[u8]) -> Result<EncryptedVault, WalletError> {
        match self.format {
            FileFormat::Binary => EncryptedVault::from_bytes(data),
            FileFormat::Json => {
                let text = std::str::from_utf8(data)
                    .map_err(|_| WalletError::Storage("vault record is not UTF-8".into()))?;
                EncryptedVault::from_json(text)
            }
        }
    }
}

impl VaultStore for FileVaultStore {
    fn load(&self) -> Result<Option<EncryptedVault>, WalletError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = fs::read(&self.path).map_err(|e| {
            WalletError::Storage(format!("failed to read {}: {}", self.path.display(), e))
        })?;
        self.decode(&data).map(Some)
    }

    fn save(&mut self, vault: &EncryptedVault) -> Result<(), WalletError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, self.encode(vault)?).map_err(|e| {
            WalletError::Storage(format!("failed to write {}: {}", tmp.display(), e))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600))?;
        }

        fs::rename(&tmp, &self.path).map_err(|e| {
            WalletError::Storage(format!("failed to replace {}: {}", self.path.display(), e))
        })?;
        log::debug!("vault written to {}", self.path.display());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), WalletError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encryption::encrypt;
    use qnet_crypto::kdf::MIN_KDF_ITERATIONS;

    fn sample_vault() -> EncryptedVault {
        encrypt(b"stored", b"password", MIN_KDF_ITERATIONS).unwrap()
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryVaultStore::new();
        assert!(!store.exists().unwrap());
        let vault = sample_vault();
        store.save(&vault).unwrap();
        assert_eq!(store.load().unwrap(), Some(vault));
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_file_store_binary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("wallet.vault");
        let mut store = FileVaultStore::new(&path);
        assert_eq!(store.load().unwrap(), None);

        let vault = sample_vault();
        store.save(&vault).unwrap();
        assert!(crate::encryption::is_vault_file(&fs::read(&path).unwrap()));
        assert_eq!(store.load().unwrap(), Some(vault));
        assert!(!path.with_extension("tmp").exists());

        store.clear().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_file_store_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallet.json");
        let mut store = FileVaultStore::new(&path);
        let vault = sample_vault();
        store.save(&vault).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"kdf_iterations\""));
        assert_eq!(store.load().unwrap(), Some(vault));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallet.vault");
        let mut store = FileVaultStore::new(&path);
        store.save(&sample_vault()).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_corrupt_file_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallet.vault");
        fs::write(&path, b"not a vault").unwrap();
        let store = FileVaultStore::new(&path);
        assert!(matches!(store.load(), Err(WalletError::Storage(_))));
    }
}
