use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "holder-scout")]
#[command(about = "Discover and track wallets that hold exclusively one SPL token")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file (without extension)
    #[arg(short, long, global = true, default_value = "config/default")]
    pub config: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BalanceSource {
    /// Candidate snapshot from the latest enumeration
    Candidates,
    /// Accumulated exclusive-holder snapshot
    Exclusive,
    /// Persisted holders without an open trade
    Holders,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize database and snapshot directory
    Init,

    /// List every holder of a mint and save the candidate snapshot
    Enumerate {
        /// Token mint address
        mint: String,
    },

    /// Enumerate, verify and save the exclusive holders of a mint
    Discover {
        /// Token mint address
        mint: String,

        /// Verify the saved candidate snapshot instead of enumerating again
        #[arg(long)]
        resume: bool,
    },

    /// Verify specific wallets and merge exclusive ones into the saved list
    Update {
        /// Token mint address
        mint: String,

        /// Wallet addresses to verify
        wallets: Vec<String>,

        /// Verify the saved candidate snapshot
        #[arg(long)]
        from_candidates: bool,
    },

    /// Check a single wallet and record it if it is an exclusive holder
    Check {
        /// Token mint address
        mint: String,

        /// Wallet address
        wallet: String,
    },

    /// Show SOL balances for a wallet set
    Balances {
        /// Where to take wallets from when none are given
        #[arg(short, long, value_enum, default_value = "exclusive")]
        source: BalanceSource,

        /// Explicit wallet addresses
        wallets: Vec<String>,

        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Refresh stored SOL balances of holders without an open trade
    Refresh,

    /// List stored exclusive holders without an open trade
    Holders {
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// List open trades
    Trades {
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Show statistics
    Stats {
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Show the decimals of a mint
    Decimals {
        /// Token mint address
        mint: String,
    },

    /// Show how many tokens of a mint a wallet holds
    TokenBalance {
        /// Wallet address
        wallet: String,

        /// Token mint address
        mint: String,
    },
}
