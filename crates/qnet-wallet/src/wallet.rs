//! Wallet lifecycle.
//!
//! `Uninitialized → Locked ⇄ Unlocked`. Only the methods here change the
//! state. Secrets exist only inside `Unlocked` and are wiped when the wallet
//! locks. Every authenticated operation checks the inactivity deadline
//! first, so an expired session is locked before any secret is read.

use std::time::Duration;

use qnet_types::constants::SIGNATURE_SIZE;
use qnet_types::{mnemonic, EonFormat, Mnemonic, Network};
use tokio::time::Instant;
use zeroize::Zeroizing;

use crate::account::{default_label, Account, AccountRecord};
use crate::config::WalletConfig;
use crate::encryption::{EncryptedVault, VaultKey, VaultPayload};
use crate::error::WalletError;
use crate::keys::WalletKeys;
use crate::storage::VaultStore;

/// Shortest accepted vault password, in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Coarse wallet status, safe to show anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletStatus {
    Uninitialized,
    Locked,
    Unlocked { accounts: usize },
}

impl std::fmt::Display for WalletStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WalletStatus::Uninitialized => f.write_str("uninitialized"),
            WalletStatus::Locked => f.write_str("locked"),
            WalletStatus::Unlocked { accounts } => write!(f, "unlocked ({} accounts)", accounts),
        }
    }
}

/// Decrypted session state.
struct UnlockedWallet {
    keys: WalletKeys,
    accounts: Vec<Account>,
    vault_key: VaultKey,
    eon_format: EonFormat,
    last_activity: Instant,
}

impl UnlockedWallet {
    fn payload(&self) -> VaultPayload {
        VaultPayload {
            mnemonic: self.keys.mnemonic().phrase().to_string(),
            passphrase: self.keys.passphrase().to_string(),
            accounts: self.accounts.iter().map(Account::record).collect(),
            eon_format: self.eon_format,
        }
    }

    fn account(&self, index: u32) -> Result<&Account, WalletError> {
        self.accounts
            .iter()
            .find(|a| a.index == index)
            .ok_or(WalletError::UnknownAccount(index))
    }
}

enum WalletState {
    Uninitialized,
    Locked,
    Unlocked(Box<UnlockedWallet>),
}

/// The wallet: configuration, a vault store and the lifecycle state.
pub struct Wallet {
    config: WalletConfig,
    store: Box<dyn VaultStore>,
    state: WalletState,
}

fn validate_password(password: &str) -> Result<(), WalletError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(WalletError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

impl Wallet {
    /// Open a wallet over `store`. Starts `Locked` if a vault is stored,
    /// otherwise `Uninitialized`.
    pub fn open(config: WalletConfig, store: Box<dyn VaultStore>) -> Result<Self, WalletError> {
        config.validate()?;
        let state = if store.exists()? {
            WalletState::Locked
        } else {
            WalletState::Uninitialized
        };
        Ok(Self { config, store, state })
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn VaultStore {
        self.store.as_ref()
    }

    pub fn store_mut(&mut self) -> &mut dyn VaultStore {
        self.store.as_mut()
    }

    pub fn status(&self) -> WalletStatus {
        match &self.state {
            WalletState::Uninitialized => WalletStatus::Uninitialized,
            WalletState::Locked => WalletStatus::Locked,
            WalletState::Unlocked(u) => WalletStatus::Unlocked {
                accounts: u.accounts.len(),
            },
        }
    }

    pub fn is_unlocked(&self) -> bool {
        matches!(self.state, WalletState::Unlocked(_))
    }

    // ── Setup ────────────────────────────────────────────────────────────

    /// Create a new wallet. Generates a mnemonic when none is given and
    /// returns the phrase so the caller can show it once.
    pub fn create(
        &mut self,
        password: &str,
        mnemonic: Option<Mnemonic>,
    ) -> Result<Mnemonic, WalletError> {
        self.ensure_uninitialized()?;
        validate_password(password)?;
        let mnemonic = match mnemonic {
            Some(m) => m,
            None => mnemonic::generate(self.config.default_entropy_bits)?,
        };
        let keys = WalletKeys::new(mnemonic.clone(), "");
        self.initialize(password, keys)?;
        log::info!("created new wallet ({} words)", mnemonic.word_count());
        Ok(mnemonic)
    }

    /// Restore a wallet from an existing phrase.
    pub fn import(
        &mut self,
        password: &str,
        phrase: &str,
        passphrase: Option<&str>,
    ) -> Result<(), WalletError> {
        self.ensure_uninitialized()?;
        validate_password(password)?;
        let keys = WalletKeys::from_phrase(phrase, passphrase.unwrap_or(""))?;
        let words = keys.mnemonic().word_count();
        self.initialize(password, keys)?;
        log::info!("imported wallet ({} words)", words);
        Ok(())
    }

    fn ensure_uninitialized(&self) -> Result<(), WalletError> {
        if !matches!(self.state, WalletState::Uninitialized) || self.store.exists()? {
            return Err(WalletError::AlreadyInitialized);
        }
        Ok(())
    }

    fn initialize(&mut self, password: &str, keys: WalletKeys) -> Result<(), WalletError> {
        let eon_format = EonFormat::CURRENT;
        let primary = Account::derive(&keys, 0, default_label(0), eon_format)?;
        let vault_key = VaultKey::generate(password.as_bytes(), self.config.kdf_iterations)?;
        let unlocked = UnlockedWallet {
            keys,
            accounts: vec![primary],
            vault_key,
            eon_format,
            last_activity: Instant::now(),
        };
        self.persist(&unlocked)?;
        self.state = WalletState::Unlocked(Box::new(unlocked));
        Ok(())
    }

    fn persist(&mut self, unlocked: &UnlockedWallet) -> Result<(), WalletError> {
        let plaintext = unlocked.payload().to_json()?;
        let vault = unlocked.vault_key.seal(&plaintext)?;
        self.store.save(&vault)
    }

    fn load_vault(&self) -> Result<EncryptedVault, WalletError> {
        self.store
            .load()?
            .ok_or_else(|| WalletError::Storage("no vault found".into()))
    }

    // ── Lock / unlock ────────────────────────────────────────────────────

    /// Decrypt the vault and re-derive every recorded account.
    pub fn unlock(&mut self, password: &str) -> Result<(), WalletError> {
        let vault = self.load_vault()?;
        let (plaintext, vault_key) = match VaultKey::unlock(password.as_bytes(), &vault) {
            Ok(opened) => opened,
            Err(e) => {
                log::warn!("unlock failed: {}", e);
                return Err(e);
            }
        };

        let payload = VaultPayload::from_json(&plaintext)?;
        if payload.accounts.is_empty() {
            return Err(WalletError::Storage("vault holds no accounts".into()));
        }
        let mnemonic = Mnemonic::parse(&payload.mnemonic)
            .map_err(|e| WalletError::Storage(format!("vault holds an invalid mnemonic: {}", e)))?;
        let keys = WalletKeys::new(mnemonic, &payload.passphrase);

        let mut accounts = Vec::with_capacity(payload.accounts.len());
        for record in &payload.accounts {
            let account = Account::derive(&keys, record.index, record.label.clone(), payload.eon_format)?;
            if !account.matches(record) {
                return Err(WalletError::Derivation(format!(
                    "account {} does not match its stored addresses",
                    record.index
                )));
            }
            accounts.push(account);
        }

        let count = accounts.len();
        self.state = WalletState::Unlocked(Box::new(UnlockedWallet {
            keys,
            accounts,
            vault_key,
            eon_format: payload.eon_format,
            last_activity: Instant::now(),
        }));
        log::info!("wallet unlocked ({} accounts)", count);
        Ok(())
    }

    /// Drop all decrypted material.
    pub fn lock(&mut self) {
        if let WalletState::Unlocked(_) = self.state {
            self.state = WalletState::Locked;
            log::info!("wallet locked");
        }
    }

    /// When the auto-lock fires, if unlocked.
    pub fn auto_lock_deadline(&self) -> Option<Instant> {
        match &self.state {
            WalletState::Unlocked(u) => u.last_activity.checked_add(self.config.auto_lock_timeout()),
            _ => None,
        }
    }

    /// Lock if `now` is past the inactivity deadline. Returns whether it locked.
    pub fn lock_if_idle(&mut self, now: Instant) -> bool {
        match self.auto_lock_deadline() {
            Some(deadline) if now >= deadline => {
                self.state = WalletState::Locked;
                log::info!("wallet auto-locked after inactivity");
                true
            }
            _ => false,
        }
    }

    /// The unlocked session, after the expiry check. Counts as activity.
    fn active(
        state: &mut WalletState,
        timeout: Duration,
    ) -> Result<&mut UnlockedWallet, WalletError> {
        let now = Instant::now();
        let expired = match state {
            WalletState::Uninitialized => return Err(WalletError::NotInitialized),
            WalletState::Locked => return Err(WalletError::Locked),
            WalletState::Unlocked(u) => u
                .last_activity
                .checked_add(timeout)
                .map_or(false, |deadline| now >= deadline),
        };
        if expired {
            *state = WalletState::Locked;
            log::info!("wallet auto-locked after inactivity");
            return Err(WalletError::Locked);
        }
        match state {
            WalletState::Unlocked(u) => {
                u.last_activity = now;
                Ok(u)
            }
            _ => Err(WalletError::Locked),
        }
    }

    // ── Accounts ─────────────────────────────────────────────────────────

    /// Derive the next account index and re-seal the vault.
    pub fn add_account(&mut self, label: Option<&str>) -> Result<AccountRecord, WalletError> {
        let timeout = self.config.auto_lock_timeout();
        let unlocked = Self::active(&mut self.state, timeout)?;

        let index = unlocked
            .accounts
            .iter()
            .map(|a| a.index)
            .max()
            .map_or(0, |i| i + 1);
        let label = label.map_or_else(|| default_label(index), str::to_string);
        let account = Account::derive(&unlocked.keys, index, label, unlocked.eon_format)?;
        let record = account.record();
        unlocked.accounts.push(account);

        let sealed = unlocked
            .payload()
            .to_json()
            .and_then(|plaintext| unlocked.vault_key.seal(&plaintext))
            .and_then(|vault| self.store.save(&vault));
        if let Err(e) = sealed {
            unlocked.accounts.pop();
            return Err(e);
        }

        log::info!("added account {}", index);
        Ok(record)
    }

    pub fn accounts(&mut self) -> Result<Vec<AccountRecord>, WalletError> {
        let unlocked = Self::active(&mut self.state, self.config.auto_lock_timeout())?;
        Ok(unlocked.accounts.iter().map(Account::record).collect())
    }

    pub fn address(&mut self, index: u32, network: Network) -> Result<String, WalletError> {
        let unlocked = Self::active(&mut self.state, self.config.auto_lock_timeout())?;
        Ok(unlocked.account(index)?.address(network).to_string())
    }

    /// Ed25519 signature over `message` with the account's Solana key.
    pub fn sign(&mut self, index: u32, message: &[u8]) -> Result<[u8; SIGNATURE_SIZE], WalletError> {
        let unlocked = Self::active(&mut self.state, self.config.auto_lock_timeout())?;
        let signature = unlocked.account(index)?.sign(message);
        log::debug!("signed {} bytes with account {}", message.len(), index);
        Ok(signature)
    }

    pub fn public_key(&mut self, index: u32) -> Result<[u8; 32], WalletError> {
        let unlocked = Self::active(&mut self.state, self.config.auto_lock_timeout())?;
        Ok(*unlocked.account(index)?.solana_public_key())
    }

    // ── Password-gated ───────────────────────────────────────────────────

    /// Replace the vault with one sealed under `new_password`.
    pub fn change_password(&mut self, old_password: &str, new_password: &str) -> Result<(), WalletError> {
        validate_password(new_password)?;
        self.lock_if_idle(Instant::now());

        let vault = self.load_vault()?;
        let (plaintext, _) = VaultKey::unlock(old_password.as_bytes(), &vault).map_err(|e| {
            log::warn!("password change rejected: {}", e);
            e
        })?;
        let new_key = VaultKey::generate(new_password.as_bytes(), self.config.kdf_iterations)?;
        let sealed = new_key.seal(&plaintext)?;
        self.store.save(&sealed)?;

        if let WalletState::Unlocked(u) = &mut self.state {
            u.vault_key = new_key;
            u.last_activity = Instant::now();
        }
        log::info!("vault password changed");
        Ok(())
    }

    /// Decrypt the stored mnemonic. Requires the password even when unlocked.
    pub fn reveal_mnemonic(&mut self, password: &str) -> Result<Mnemonic, WalletError> {
        self.lock_if_idle(Instant::now());
        let vault = self.load_vault()?;
        let (plaintext, _) = VaultKey::unlock(password.as_bytes(), &vault).map_err(|e| {
            log::warn!("mnemonic reveal rejected: {}", e);
            e
        })?;
        let payload = VaultPayload::from_json(&plaintext)?;
        if let WalletState::Unlocked(u) = &mut self.state {
            u.last_activity = Instant::now();
        }
        let phrase = Zeroizing::new(payload.mnemonic.clone());
        Mnemonic::parse(&phrase)
            .map_err(|e| WalletError::Storage(format!("vault holds an invalid mnemonic: {}", e)))
    }

    /// Forget the vault entirely. Only allowed from an unlocked session.
    pub fn reset(&mut self) -> Result<(), WalletError> {
        Self::active(&mut self.state, self.config.auto_lock_timeout())?;
        self.store.clear()?;
        self.state = WalletState::Uninitialized;
        log::info!("wallet reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryVaultStore;

    const PASSWORD: &str = "correcthorse1";
    const PHRASE: &str =
        "legal winner thank year wave sausage worth useful legal winner thank yellow";

    fn fast_config() -> WalletConfig {
        WalletConfig {
            kdf_iterations: qnet_crypto::kdf::MIN_KDF_ITERATIONS,
            ..Default::default()
        }
    }

    fn new_wallet() -> Wallet {
        Wallet::open(fast_config(), Box::new(MemoryVaultStore::new())).unwrap()
    }

    #[test]
    fn test_starts_uninitialized() {
        let mut wallet = new_wallet();
        assert_eq!(wallet.status(), WalletStatus::Uninitialized);
        assert_eq!(wallet.accounts().unwrap_err(), WalletError::NotInitialized);
        assert_eq!(wallet.unlock(PASSWORD), Err(WalletError::Storage("no vault found".into())));
    }

    #[tokio::test]
    async fn test_create_unlocks_with_primary_account() {
        let mut wallet = new_wallet();
        let mnemonic = wallet.create(PASSWORD, None).unwrap();
        assert_eq!(mnemonic.word_count(), 12);
        assert_eq!(wallet.status(), WalletStatus::Unlocked { accounts: 1 });

        let accounts = wallet.accounts().unwrap();
        assert_eq!(accounts[0].index, 0);
        assert!(wallet.auto_lock_deadline().is_some());
    }

    #[tokio::test]
    async fn test_create_twice_fails() {
        let mut wallet = new_wallet();
        wallet.create(PASSWORD, None).unwrap();
        assert_eq!(wallet.create(PASSWORD, None).unwrap_err(), WalletError::AlreadyInitialized);
        wallet.lock();
        assert_eq!(
            wallet.import(PASSWORD, PHRASE, None).unwrap_err(),
            WalletError::AlreadyInitialized
        );
    }

    #[tokio::test]
    async fn test_short_password_rejected() {
        let mut wallet = new_wallet();
        assert!(matches!(wallet.create("short", None), Err(WalletError::Validation(_))));
        assert_eq!(wallet.status(), WalletStatus::Uninitialized);
    }

    #[tokio::test]
    async fn test_import_invalid_phrase() {
        let mut wallet = new_wallet();
        let bad = PHRASE.replace("yellow", "legal");
        assert!(matches!(wallet.import(PASSWORD, &bad, None), Err(WalletError::Validation(_))));
        assert!(!wallet.store().exists().unwrap());
    }

    #[tokio::test]
    async fn test_lock_unlock_same_addresses() {
        let mut wallet = new_wallet();
        wallet.import(PASSWORD, PHRASE, None).unwrap();
        let before = wallet.address(0, Network::Solana).unwrap();

        wallet.lock();
        assert_eq!(wallet.status(), WalletStatus::Locked);
        assert_eq!(wallet.address(0, Network::Solana).unwrap_err(), WalletError::Locked);

        wallet.unlock(PASSWORD).unwrap();
        assert_eq!(wallet.address(0, Network::Solana).unwrap(), before);
    }

    #[tokio::test]
    async fn test_wrong_password_unlock() {
        let mut wallet = new_wallet();
        wallet.create(PASSWORD, None).unwrap();
        wallet.lock();
        assert_eq!(wallet.unlock("wrong-password"), Err(WalletError::Authentication));
        assert_eq!(wallet.status(), WalletStatus::Locked);
    }

    #[tokio::test]
    async fn test_add_account_persists() {
        let mut wallet = new_wallet();
        wallet.import(PASSWORD, PHRASE, None).unwrap();
        let added = wallet.add_account(Some("trading")).unwrap();
        assert_eq!(added.index, 1);
        assert_eq!(added.label, "trading");
        let third = wallet.add_account(None).unwrap();
        assert_eq!(third.label, "Account #2");

        wallet.lock();
        wallet.unlock(PASSWORD).unwrap();
        let accounts = wallet.accounts().unwrap();
        assert_eq!(accounts.len(), 3);
        assert_eq!(accounts[1], added);
    }

    #[tokio::test]
    async fn test_unknown_account() {
        let mut wallet = new_wallet();
        wallet.create(PASSWORD, None).unwrap();
        assert_eq!(wallet.address(4, Network::QNet).unwrap_err(), WalletError::UnknownAccount(4));
        assert_eq!(wallet.sign(4, b"x").unwrap_err(), WalletError::UnknownAccount(4));
    }

    #[tokio::test]
    async fn test_sign_verifies() {
        let mut wallet = new_wallet();
        wallet.create(PASSWORD, None).unwrap();
        let sig = wallet.sign(0, b"payload").unwrap();
        let pk = wallet.public_key(0).unwrap();
        assert!(qnet_crypto::solana::verify(&pk, b"payload", &sig).is_ok());
    }

    #[tokio::test]
    async fn test_change_password() {
        let mut wallet = new_wallet();
        wallet.create(PASSWORD, None).unwrap();
        assert_eq!(
            wallet.change_password("not-the-password", "newpassword2"),
            Err(WalletError::Authentication)
        );
        wallet.change_password(PASSWORD, "newpassword2").unwrap();

        // Re-sealing after the change uses the new key.
        wallet.add_account(None).unwrap();
        wallet.lock();
        assert_eq!(wallet.unlock(PASSWORD), Err(WalletError::Authentication));
        wallet.unlock("newpassword2").unwrap();
        assert_eq!(wallet.accounts().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_reveal_mnemonic() {
        let mut wallet = new_wallet();
        wallet.import(PASSWORD, PHRASE, None).unwrap();
        wallet.lock();
        assert_eq!(wallet.reveal_mnemonic(PASSWORD).unwrap().phrase(), PHRASE);
        assert_eq!(wallet.reveal_mnemonic("bad-password").unwrap_err(), WalletError::Authentication);
    }

    #[tokio::test]
    async fn test_reset() {
        let mut wallet = new_wallet();
        wallet.create(PASSWORD, None).unwrap();
        wallet.reset().unwrap();
        assert_eq!(wallet.status(), WalletStatus::Uninitialized);
        wallet.import(PASSWORD, PHRASE, None).unwrap();
    }

    #[tokio::test]
    async fn test_reset_requires_unlocked_session() {
        let mut wallet = new_wallet();
        assert_eq!(wallet.reset().unwrap_err(), WalletError::NotInitialized);

        wallet.create(PASSWORD, None).unwrap();
        wallet.lock();
        assert_eq!(wallet.reset().unwrap_err(), WalletError::Locked);
        assert_eq!(wallet.status(), WalletStatus::Locked);
        assert!(wallet.store().exists().unwrap());
        wallet.unlock(PASSWORD).unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_after_expiry_is_refused() {
        let mut wallet = new_wallet();
        wallet.create(PASSWORD, None).unwrap();
        tokio::time::advance(Duration::from_secs(900)).await;
        assert_eq!(wallet.reset().unwrap_err(), WalletError::Locked);
        assert!(wallet.store().exists().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reveal_mnemonic_counts_as_activity() {
        let mut wallet = new_wallet();
        wallet.import(PASSWORD, PHRASE, None).unwrap();
        tokio::time::advance(Duration::from_secs(600)).await;
        wallet.reveal_mnemonic(PASSWORD).unwrap();
        tokio::time::advance(Duration::from_secs(600)).await;
        assert!(wallet.accounts().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_longest_auto_lock_has_a_deadline() {
        let config = WalletConfig {
            auto_lock_secs: crate::config::MAX_AUTO_LOCK_SECS,
            ..fast_config()
        };
        let mut wallet = Wallet::open(config, Box::new(MemoryVaultStore::new())).unwrap();
        wallet.create(PASSWORD, None).unwrap();
        assert!(wallet.auto_lock_deadline().is_some());
        assert!(wallet.accounts().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_session_locks_before_use() {
        let mut wallet = new_wallet();
        wallet.create(PASSWORD, None).unwrap();
        tokio::time::advance(Duration::from_secs(899)).await;
        assert!(wallet.accounts().is_ok());

        // Activity above reset the deadline.
        tokio::time::advance(Duration::from_secs(899)).await;
        assert!(wallet.accounts().is_ok());

        tokio::time::advance(Duration::from_secs(900)).await;
        assert_eq!(wallet.sign(0, b"late").unwrap_err(), WalletError::Locked);
        assert_eq!(wallet.status(), WalletStatus::Locked);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lock_if_idle() {
        let mut wallet = new_wallet();
        wallet.create(PASSWORD, None).unwrap();
        let deadline = wallet.auto_lock_deadline().unwrap();
        assert!(!wallet.lock_if_idle(deadline - Duration::from_secs(1)));
        assert!(wallet.lock_if_idle(deadline));
        assert!(wallet.auto_lock_deadline().is_none());
    }

    #[test]
    fn test_open_with_existing_vault_is_locked() {
        let vault = crate::encryption::encrypt(b"{}", PASSWORD.as_bytes(), 10_000).unwrap();
        let wallet = Wallet::open(fast_config(), Box::new(MemoryVaultStore::with_vault(vault))).unwrap();
        assert_eq!(wallet.status(), WalletStatus::Locked);
    }

    #[test]
    fn test_open_rejects_bad_config() {
        let config = WalletConfig { auto_lock_secs: 0, ..Default::default() };
        assert!(matches!(
            Wallet::open(config, Box::new(MemoryVaultStore::new())),
            Err(WalletError::Config(_))
        ));
    }
}
