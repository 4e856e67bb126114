//! CLI command implementations.

use crate::AppContext;
use qnet_types::address::{describe_address, parse_address};
use qnet_types::{mnemonic, Mnemonic, Network, WordCount};
use qnet_wallet::{spawn_wallet_service, FileVaultStore, Wallet, WalletHandle, WalletStatus};
use zeroize::Zeroizing;

type Result = std::result::Result<(), Box<dyn std::error::Error>>;

// ─── Helpers ────────────────────────────────────────────────────────────────

fn prompt_password(prompt: &str) -> std::result::Result<Zeroizing<String>, Box<dyn std::error::Error>> {
    let pass = Zeroizing::new(rpassword::prompt_password(prompt)?);
    if pass.is_empty() {
        return Err("password cannot be empty".into());
    }
    Ok(pass)
}

fn prompt_password_confirm(prompt: &str) -> std::result::Result<Zeroizing<String>, Box<dyn std::error::Error>> {
    let pass = prompt_password(prompt)?;
    let confirm = prompt_password("Confirm password: ")?;
    if *pass != *confirm {
        return Err("passwords do not match".into());
    }
    Ok(pass)
}

/// Start the wallet service over the configured vault file.
fn open_service(ctx: &AppContext) -> std::result::Result<WalletHandle, Box<dyn std::error::Error>> {
    let store = FileVaultStore::new(&ctx.vault_path);
    let wallet = Wallet::open(ctx.config.clone(), Box::new(store))?;
    let (handle, _task) = spawn_wallet_service(wallet);
    Ok(handle)
}

/// Open the wallet and unlock it with a prompted password.
async fn unlock(ctx: &AppContext) -> std::result::Result<WalletHandle, Box<dyn std::error::Error>> {
    let handle = open_service(ctx)?;
    if handle.status().await? == WalletStatus::Uninitialized {
        return Err(format!(
            "vault file not found: {}\nUse 'create' or 'import' first, or specify --vault-file",
            ctx.vault_path.display()
        )
        .into());
    }
    let password = prompt_password("Wallet password: ")?;
    handle.unlock(&password).await?;
    Ok(handle)
}

async fn print_account(handle: &WalletHandle, index: u32, networks: &[Network]) -> Result {
    for &network in networks {
        let address = handle.address(index, network).await?;
        println!("  {:<8} {}", network, address);
    }
    Ok(())
}

fn print_mnemonic(mnemonic: &Mnemonic) {
    println!("Seed phrase ({} words):", mnemonic.word_count());
    println!("  {}", mnemonic.phrase());
    println!();
}

// ─── Setup ──────────────────────────────────────────────────────────────────

pub async fn create_wallet(ctx: &AppContext, words: Option<usize>) -> Result {
    let entropy_bits = match words {
        Some(n) => WordCount::from_words(n)
            .ok_or_else(|| format!("unsupported word count: {} (use 12, 15, 18, 21 or 24)", n))?
            .entropy_bits(),
        None => ctx.config.default_entropy_bits,
    };

    let handle = open_service(ctx)?;
    if handle.status().await? != WalletStatus::Uninitialized {
        return Err(format!("vault file already exists: {}", ctx.vault_path.display()).into());
    }

    let password = prompt_password_confirm("New wallet password: ")?;
    let generated = mnemonic::generate(entropy_bits)?;
    let mnemonic = handle.create(&password, Some(generated)).await?;

    println!("Wallet created: {}", ctx.vault_path.display());
    println!();
    println!("IMPORTANT: Write down your seed phrase and keep it safe!");
    println!("If you lose it, you will lose access to your funds.");
    println!();
    print_mnemonic(&mnemonic);

    println!("Account #0:");
    print_account(&handle, 0, &Network::ALL).await
}

pub async fn import_wallet(ctx: &AppContext, with_passphrase: bool) -> Result {
    let handle = open_service(ctx)?;
    if handle.status().await? != WalletStatus::Uninitialized {
        return Err(format!("vault file already exists: {}", ctx.vault_path.display()).into());
    }

    println!("Enter your mnemonic seed phrase:");
    let mut phrase = Zeroizing::new(String::new());
    std::io::stdin().read_line(&mut phrase)?;

    let passphrase = if with_passphrase {
        Some(Zeroizing::new(rpassword::prompt_password("BIP39 passphrase: ")?))
    } else {
        None
    };

    let password = prompt_password_confirm("New wallet password: ")?;
    handle
        .import(&password, phrase.trim(), passphrase.as_deref().map(String::as_str))
        .await?;

    println!("Wallet restored: {}", ctx.vault_path.display());
    println!();
    println!("Account #0:");
    print_account(&handle, 0, &Network::ALL).await
}

// ─── Accounts ───────────────────────────────────────────────────────────────

pub async fn show_address(ctx: &AppContext, account: u32, networks: &[Network]) -> Result {
    let handle = unlock(ctx).await?;
    println!("Account #{}:", account);
    print_account(&handle, account, networks).await
}

pub async fn list_accounts(ctx: &AppContext, json: bool) -> Result {
    let handle = unlock(ctx).await?;
    let accounts = handle.accounts().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&accounts)?);
        return Ok(());
    }

    println!("{:<6} {:<20} {:<44} {}", "Index", "Label", "Solana", "QNet");
    println!("{}", "-".repeat(114));
    for account in &accounts {
        println!(
            "{:<6} {:<20} {:<44} {}",
            account.index, account.label, account.solana_address, account.eon_address
        );
    }
    Ok(())
}

pub async fn add_account(ctx: &AppContext, label: Option<String>) -> Result {
    let handle = unlock(ctx).await?;
    let record = handle.add_account(label.as_deref()).await?;

    println!("Added account #{} ({})", record.index, record.label);
    print_account(&handle, record.index, &Network::ALL).await
}

pub async fn sign_message(ctx: &AppContext, account: u32, message: &str) -> Result {
    let handle = unlock(ctx).await?;
    let signature = handle.sign(account, message.as_bytes()).await?;
    let public_key = handle.public_key(account).await?;

    println!("Signer:    {}", qnet_types::address::solana_address(&public_key));
    println!("Signature: {}", qnet_types::base58::encode(&signature));
    println!("Hex:       {}", hex::encode(signature));
    Ok(())
}

// ─── Secrets ────────────────────────────────────────────────────────────────

pub async fn show_seed(ctx: &AppContext) -> Result {
    let handle = open_service(ctx)?;
    if handle.status().await? == WalletStatus::Uninitialized {
        return Err("no wallet found (create or import one first)".into());
    }
    let password = prompt_password("Wallet password: ")?;
    let mnemonic = handle.reveal_mnemonic(&password).await?;

    print_mnemonic(&mnemonic);
    println!("WARNING: Never share your seed phrase with anyone!");
    Ok(())
}

pub async fn change_password(ctx: &AppContext) -> Result {
    let handle = open_service(ctx)?;
    let old = prompt_password("Current password: ")?;
    let new = prompt_password_confirm("New password: ")?;
    handle.change_password(&old, &new).await?;
    println!("Password changed.");
    Ok(())
}

pub async fn reset_wallet(ctx: &AppContext) -> Result {
    let handle = unlock(ctx).await?;
    handle.reset().await?;
    println!("Vault deleted: {}", ctx.vault_path.display());
    Ok(())
}

// ─── Offline checks ─────────────────────────────────────────────────────────

pub fn validate_phrase(phrase: &str) -> Result {
    let phrase = Zeroizing::new(phrase.to_string());
    match Mnemonic::parse(&phrase) {
        Ok(m) => {
            println!("Valid {}-word mnemonic ({} bits of entropy).", m.word_count(), m.entropy_bits());
            Ok(())
        }
        Err(e) => Err(format!("invalid mnemonic: {}", e).into()),
    }
}

pub fn check_address(address: &str) -> Result {
    parse_address(address).map_err(|e| format!("invalid address: {}", e))?;
    println!("{}", describe_address(address));
    Ok(())
}
