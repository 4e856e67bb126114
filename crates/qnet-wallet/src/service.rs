//! Wallet service: one task owns the `Wallet`.
//!
//! [`WalletRequest`] is the bounded-channel message type that the CLI and
//! tests use to drive the wallet. Each request carries a
//! `tokio::sync::oneshot::Sender` for the reply. Requests are handled one
//! at a time, so no two operations ever touch the decrypted state at once.
//!
//! The loop also sleeps until the auto-lock deadline and locks the wallet
//! when it passes.

use qnet_types::constants::{KEY_SIZE, SIGNATURE_SIZE};
use qnet_types::{Mnemonic, Network};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use zeroize::Zeroizing;

use crate::account::AccountRecord;
use crate::error::WalletError;
use crate::wallet::{Wallet, WalletStatus};

type Reply<T> = oneshot::Sender<Result<T, WalletError>>;

/// Requests accepted by the wallet service.
pub enum WalletRequest {
    Status {
        reply: oneshot::Sender<WalletStatus>,
    },
    Create {
        password: Zeroizing<String>,
        mnemonic: Option<Mnemonic>,
        reply: Reply<Mnemonic>,
    },
    Import {
        password: Zeroizing<String>,
        phrase: Zeroizing<String>,
        passphrase: Option<Zeroizing<String>>,
        reply: Reply<()>,
    },
    Unlock {
        password: Zeroizing<String>,
        reply: Reply<()>,
    },
    Lock {
        reply: oneshot::Sender<()>,
    },
    AddAccount {
        label: Option<String>,
        reply: Reply<AccountRecord>,
    },
    Accounts {
        reply: Reply<Vec<AccountRecord>>,
    },
    Address {
        index: u32,
        network: Network,
        reply: Reply<String>,
    },
    PublicKey {
        index: u32,
        reply: Reply<[u8; KEY_SIZE]>,
    },
    Sign {
        index: u32,
        message: Vec<u8>,
        reply: Reply<[u8; SIGNATURE_SIZE]>,
    },
    ChangePassword {
        old_password: Zeroizing<String>,
        new_password: Zeroizing<String>,
        reply: Reply<()>,
    },
    RevealMnemonic {
        password: Zeroizing<String>,
        reply: Reply<Mnemonic>,
    },
    Reset {
        reply: Reply<()>,
    },
}

/// Start the service on the current tokio runtime.
///
/// The task runs until every `WalletHandle` is dropped and then hands the
/// wallet back through the `JoinHandle`.
pub fn spawn_wallet_service(wallet: Wallet) -> (WalletHandle, JoinHandle<Wallet>) {
    let (tx, rx) = mpsc::channel(wallet.config().channel_capacity);
    let task = tokio::spawn(run_service(wallet, rx));
    (WalletHandle { tx }, task)
}

async fn run_service(mut wallet: Wallet, mut rx: mpsc::Receiver<WalletRequest>) -> Wallet {
    log::debug!("wallet service started");
    loop {
        let deadline = wallet.auto_lock_deadline();
        tokio::select! {
            request = rx.recv() => match request {
                Some(request) => handle_request(&mut wallet, request),
                None => break,
            },

            _ = sleep_until(deadline) => {
                wallet.lock_if_idle(Instant::now());
            }
        }
    }
    wallet.lock();
    log::debug!("wallet service stopped");
    wallet
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

/// Dispatch one request. A dropped reply receiver is not an error.
fn handle_request(wallet: &mut Wallet, request: WalletRequest) {
    match request {
        WalletRequest::Status { reply } => {
            let _ = reply.send(wallet.status());
        }
        WalletRequest::Create { password, mnemonic, reply } => {
            let _ = reply.send(wallet.create(&password, mnemonic));
        }
        WalletRequest::Import { password, phrase, passphrase, reply } => {
            let result = wallet.import(&password, &phrase, passphrase.as_deref().map(String::as_str));
            let _ = reply.send(result);
        }
        WalletRequest::Unlock { password, reply } => {
            let _ = reply.send(wallet.unlock(&password));
        }
        WalletRequest::Lock { reply } => {
            wallet.lock();
            let _ = reply.send(());
        }
        WalletRequest::AddAccount { label, reply } => {
            let _ = reply.send(wallet.add_account(label.as_deref()));
        }
        WalletRequest::Accounts { reply } => {
            let _ = reply.send(wallet.accounts());
        }
        WalletRequest::Address { index, network, reply } => {
            let _ = reply.send(wallet.address(index, network));
        }
        WalletRequest::PublicKey { index, reply } => {
            let _ = reply.send(wallet.public_key(index));
        }
        WalletRequest::Sign { index, message, reply } => {
            let _ = reply.send(wallet.sign(index, &message));
        }
        WalletRequest::ChangePassword { old_password, new_password, reply } => {
            let _ = reply.send(wallet.change_password(&old_password, &new_password));
        }
        WalletRequest::RevealMnemonic { password, reply } => {
            let _ = reply.send(wallet.reveal_mnemonic(&password));
        }
        WalletRequest::Reset { reply } => {
            let _ = reply.send(wallet.reset());
        }
    }
}

/// Cloneable async front door to the wallet service.
#[derive(Clone)]
pub struct WalletHandle {
    tx: mpsc::Sender<WalletRequest>,
}

fn secret(s: &str) -> Zeroizing<String> {
    Zeroizing::new(s.to_string())
}

impl WalletHandle {
    async fn call<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> WalletRequest,
    ) -> Result<T, WalletError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| WalletError::ServiceClosed)?;
        rx.await.map_err(|_| WalletError::ServiceClosed)?
    }

    pub async fn status(&self) -> Result<WalletStatus, WalletError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(WalletRequest::Status { reply })
            .await
            .map_err(|_| WalletError::ServiceClosed)?;
        rx.await.map_err(|_| WalletError::ServiceClosed)
    }

    pub async fn create(&self, password: &str, mnemonic: Option<Mnemonic>) -> Result<Mnemonic, WalletError> {
        let password = secret(password);
        self.call(|reply| WalletRequest::Create { password, mnemonic, reply }).await
    }

    pub async fn import(&self, password: &str, phrase: &str, passphrase: Option<&str>) -> Result<(), WalletError> {
        let password = secret(password);
        let phrase = secret(phrase);
        let passphrase = passphrase.map(secret);
        self.call(|reply| WalletRequest::Import { password, phrase, passphrase, reply }).await
    }

    pub async fn unlock(&self, password: &str) -> Result<(), WalletError> {
        let password = secret(password);
        self.call(|reply| WalletRequest::Unlock { password, reply }).await
    }

    pub async fn lock(&self) -> Result<(), WalletError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(WalletRequest::Lock { reply })
            .await
            .map_err(|_| WalletError::ServiceClosed)?;
        rx.await.map_err(|_| WalletError::ServiceClosed)
    }

    pub async fn add_account(&self, label: Option<&str>) -> Result<AccountRecord, WalletError> {
        let label = label.map(str::to_string);
        self.call(|reply| WalletRequest::AddAccount { label, reply }).await
    }

    pub async fn accounts(&self) -> Result<Vec<AccountRecord>, WalletError> {
        self.call(|reply| WalletRequest::Accounts { reply }).await
    }

    pub async fn address(&self, index: u32, network: Network) -> Result<String, WalletError> {
        self.call(|reply| WalletRequest::Address { index, network, reply }).await
    }

    pub async fn public_key(&self, index: u32) -> Result<[u8; KEY_SIZE], WalletError> {
        self.call(|reply| WalletRequest::PublicKey { index, reply }).await
    }

    pub async fn sign(&self, index: u32, message: &[u8]) -> Result<[u8; SIGNATURE_SIZE], WalletError> {
        let message = message.to_vec();
        self.call(|reply| WalletRequest::Sign { index, message, reply }).await
    }

    pub async fn change_password(&self, old_password: &str, new_password: &str) -> Result<(), WalletError> {
        let old_password = secret(old_password);
        let new_password = secret(new_password);
        self.call(|reply| WalletRequest::ChangePassword { old_password, new_password, reply })
            .await
    }

    pub async fn reveal_mnemonic(&self, password: &str) -> Result<Mnemonic, WalletError> {
        let password = secret(password);
        self.call(|reply| WalletRequest::RevealMnemonic { password, reply }).await
    }

    pub async fn reset(&self) -> Result<(), WalletError> {
        self.call(|reply| WalletRequest::Reset { reply }).await
    }
}
