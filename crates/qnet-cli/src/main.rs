use clap::{Parser, Subcommand};
use qnet_types::Network;
use qnet_wallet::WalletConfig;
use std::path::PathBuf;

mod commands;

/// QNet wallet command-line interface.
#[derive(Parser)]
#[command(name = "qnet-wallet-cli")]
#[command(about = "Offline wallet for QNet (EON) and Solana accounts")]
#[command(version)]
struct Cli {
    /// Vault file path (a .json extension stores the JSON record).
    #[arg(long)]
    vault_file: Option<String>,

    /// Wallet config file (JSON).
    #[arg(long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug)]
enum NetworkArg {
    Solana,
    QNet,
    All,
}

impl std::str::FromStr for NetworkArg {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "all" | "both" => Ok(Self::All),
            other => match other.parse::<Network>()? {
                Network::Solana => Ok(Self::Solana),
                Network::QNet => Ok(Self::QNet),
            },
        }
    }
}

impl NetworkArg {
    fn networks(self) -> &'static [Network] {
        match self {
            Self::Solana => &[Network::Solana],
            Self::QNet => &[Network::QNet],
            Self::All => &Network::ALL,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new wallet with a fresh mnemonic.
    Create {
        /// Mnemonic length (12, 15, 18, 21 or 24).
        #[arg(long)]
        words: Option<usize>,
    },

    /// Restore a wallet from an existing BIP39 mnemonic.
    Import {
        /// Also prompt for a BIP39 passphrase.
        #[arg(long)]
        passphrase: bool,
    },

    /// Show the receive addresses of an account.
    Address {
        /// Account index.
        #[arg(long, default_value = "0")]
        account: u32,

        /// Network to show (solana, qnet or all).
        #[arg(long, default_value = "all")]
        network: NetworkArg,
    },

    /// List all accounts.
    Accounts {
        /// Print the list as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Derive the next account.
    AddAccount {
        /// Account label.
        #[arg(long)]
        label: Option<String>,
    },

    /// Show the mnemonic seed phrase.
    Seed,

    /// Change the vault password.
    ChangePassword,

    /// Check a mnemonic phrase without touching the wallet.
    Validate {
        /// The phrase, as separate words or one quoted string.
        #[arg(required = true, num_args = 1..)]
        phrase: Vec<String>,
    },

    /// Identify a Solana or EON address.
    CheckAddress {
        address: String,
    },

    /// Sign a message with an account's Solana key.
    Sign {
        /// Account index.
        #[arg(long, default_value = "0")]
        account: u32,

        /// Message to sign (UTF-8).
        #[arg(long)]
        message: String,
    },

    /// Delete the vault file.
    Reset,
}

/// Application context shared across commands.
pub struct AppContext {
    vault_path: PathBuf,
    config: WalletConfig,
}

impl AppContext {
    fn from_cli(cli: &Cli) -> Result<Self, Box<dyn std::error::Error>> {
        let vault_path = if let Some(ref path) = cli.vault_file {
            PathBuf::from(path)
        } else {
            default_wallet_dir().join("wallet.vault")
        };

        let config = match cli.config {
            Some(ref path) => WalletConfig::load(std::path::Path::new(path))?,
            None => WalletConfig::default(),
        };
        log::debug!("vault file: {}", vault_path.display());

        Ok(Self { vault_path, config })
    }
}

fn default_wallet_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("qnet")
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let ctx = match AppContext::from_cli(&cli) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Create { words } => commands::create_wallet(&ctx, words).await,
        Commands::Import { passphrase } => commands::import_wallet(&ctx, passphrase).await,
        Commands::Address { account, network } => {
            commands::show_address(&ctx, account, network.networks()).await
        }
        Commands::Accounts { json } => commands::list_accounts(&ctx, json).await,
        Commands::AddAccount { label } => commands::add_account(&ctx, label).await,
        Commands::Seed => commands::show_seed(&ctx).await,
        Commands::ChangePassword => commands::change_password(&ctx).await,
        Commands::Validate { phrase } => commands::validate_phrase(&phrase.join(" ")),
        Commands::CheckAddress { address } => commands::check_address(&address),
        Commands::Sign { account, message } => commands::sign_message(&ctx, account, &message).await,
        Commands::Reset => commands::reset_wallet(&ctx).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
