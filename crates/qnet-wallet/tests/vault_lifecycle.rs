//! Integration tests for the wallet lifecycle over a file-backed vault.

use qnet_crypto::kdf::MIN_KDF_ITERATIONS;
use qnet_types::address::{is_valid_eon, is_valid_solana_address};
use qnet_types::{EonFormat, Network};
use qnet_wallet::encryption::{encrypt, VaultKey};
use qnet_wallet::{
    AccountRecord, FileVaultStore, MemoryVaultStore, VaultPayload, VaultStore, Wallet,
    WalletConfig, WalletError, WalletStatus,
};

const PASSWORD: &str = "correcthorse1";
const PHRASE: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

// =============================================================================
// Helpers
// =============================================================================

fn config() -> WalletConfig {
    WalletConfig {
        kdf_iterations: MIN_KDF_ITERATIONS,
        ..Default::default()
    }
}

fn file_wallet(path: &std::path::Path) -> Wallet {
    Wallet::open(config(), Box::new(FileVaultStore::new(path))).unwrap()
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn test_create_lock_unlock_keeps_solana_address() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wallet.vault");

    let mut wallet = file_wallet(&path);
    wallet.create(PASSWORD, None).unwrap();
    let solana = wallet.address(0, Network::Solana).unwrap();
    let eon = wallet.address(0, Network::QNet).unwrap();
    assert!(is_valid_solana_address(&solana));
    assert!(is_valid_eon(&eon));

    wallet.lock();
    wallet.unlock(PASSWORD).unwrap();
    assert_eq!(wallet.address(0, Network::Solana).unwrap(), solana);
    assert_eq!(wallet.address(0, Network::QNet).unwrap(), eon);
}

#[tokio::test]
async fn test_reopen_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wallet.vault");

    let solana = {
        let mut wallet = file_wallet(&path);
        wallet.import(PASSWORD, PHRASE, None).unwrap();
        wallet.add_account(Some("savings")).unwrap();
        wallet.address(0, Network::Solana).unwrap()
    };

    let mut wallet = file_wallet(&path);
    assert_eq!(wallet.status(), WalletStatus::Locked);
    wallet.unlock(PASSWORD).unwrap();
    assert_eq!(wallet.address(0, Network::Solana).unwrap(), solana);
    let accounts = wallet.accounts().unwrap();
    assert_eq!(accounts.len(), 2);
    assert_eq!(accounts[1].label, "savings");
}

#[tokio::test]
async fn test_same_phrase_same_addresses_across_wallets() {
    let mut a = Wallet::open(config(), Box::new(MemoryVaultStore::new())).unwrap();
    let mut b = Wallet::open(config(), Box::new(MemoryVaultStore::new())).unwrap();
    a.import(PASSWORD, PHRASE, None).unwrap();
    b.import("another-password", PHRASE, None).unwrap();
    assert_eq!(a.accounts().unwrap(), b.accounts().unwrap());

    let mut c = Wallet::open(config(), Box::new(MemoryVaultStore::new())).unwrap();
    c.import(PASSWORD, PHRASE, Some("25th word")).unwrap();
    assert_ne!(
        a.address(0, Network::Solana).unwrap(),
        c.address(0, Network::Solana).unwrap()
    );
}

#[tokio::test]
async fn test_tampered_vault_file_fails_authentication() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wallet.vault");
    let mut wallet = file_wallet(&path);
    wallet.create(PASSWORD, None).unwrap();
    wallet.lock();

    let mut bytes = std::fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x01;
    std::fs::write(&path, &bytes).unwrap();

    assert_eq!(wallet.unlock(PASSWORD), Err(WalletError::Authentication));
    assert_eq!(wallet.status(), WalletStatus::Locked);
}

#[tokio::test]
async fn test_tampered_ciphertext_in_store() {
    let mut wallet = Wallet::open(config(), Box::new(MemoryVaultStore::new())).unwrap();
    wallet.import(PASSWORD, PHRASE, None).unwrap();
    wallet.lock();

    let mut vault = wallet.store().load().unwrap().unwrap();
    vault.ciphertext[0] ^= 0x40;
    wallet.store_mut().save(&vault).unwrap();
    assert_eq!(wallet.unlock(PASSWORD), Err(WalletError::Authentication));
}

#[tokio::test]
async fn test_unsupported_version_is_storage_error() {
    let mut wallet = Wallet::open(config(), Box::new(MemoryVaultStore::new())).unwrap();
    wallet.create(PASSWORD, None).unwrap();
    wallet.lock();

    let mut vault = wallet.store().load().unwrap().unwrap();
    vault.version = 9;
    wallet.store_mut().save(&vault).unwrap();
    assert!(matches!(wallet.unlock(PASSWORD), Err(WalletError::Storage(_))));
}

#[tokio::test]
async fn test_derivation_drift_detected() {
    let mut wallet = Wallet::open(config(), Box::new(MemoryVaultStore::new())).unwrap();
    wallet.import(PASSWORD, PHRASE, None).unwrap();
    let mut record: AccountRecord = wallet.accounts().unwrap().remove(0);
    wallet.lock();

    // A vault whose recorded address disagrees with what the phrase derives.
    record.solana_address = "11111111111111111111111111111111".to_string();
    let payload = VaultPayload {
        mnemonic: PHRASE.to_string(),
        passphrase: String::new(),
        accounts: vec![record],
        eon_format: EonFormat::V1,
    };
    let key = VaultKey::generate(PASSWORD.as_bytes(), MIN_KDF_ITERATIONS).unwrap();
    let vault = key.seal(&payload.to_json().unwrap()).unwrap();
    wallet.store_mut().save(&vault).unwrap();

    assert!(matches!(wallet.unlock(PASSWORD), Err(WalletError::Derivation(_))));
    assert_eq!(wallet.status(), WalletStatus::Locked);
}

#[tokio::test]
async fn test_garbage_payload_is_serialization_error() {
    let vault = encrypt(b"not json", PASSWORD.as_bytes(), MIN_KDF_ITERATIONS).unwrap();
    let mut wallet =
        Wallet::open(config(), Box::new(MemoryVaultStore::with_vault(vault))).unwrap();
    assert!(matches!(wallet.unlock(PASSWORD), Err(WalletError::Serialization(_))));
}

#[tokio::test]
async fn test_json_vault_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wallet.json");
    let mut wallet = file_wallet(&path);
    wallet.import(PASSWORD, PHRASE, None).unwrap();

    let record: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(record["version"], 1);
    assert_eq!(record["kdf_iterations"], MIN_KDF_ITERATIONS);

    wallet.lock();
    wallet.unlock(PASSWORD).unwrap();
}

#[tokio::test]
async fn test_vault_never_contains_phrase_in_clear() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wallet.json");
    let mut wallet = file_wallet(&path);
    wallet.import(PASSWORD, PHRASE, None).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(!text.contains("abandon"));
}
