pub mod client;
pub mod fetcher;
pub mod ledger;
pub mod units;

pub use client::{RpcMethod, RpcTransport, SolanaRpcClient};
pub use fetcher::{FetchError, RateLimitedFetcher, RetryPolicy};
pub use ledger::{ParsedTokenAccount, TokenAccountsPage, TokenLedger};
pub use units::{lamports_to_sol, LAMPORTS_PER_SOL};

use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

use crate::error::{HolderError, Result};

/// Parse a base58 address, rejecting anything that is not a valid public key.
pub fn parse_pubkey(address: &str) -> Result<Pubkey> {
    Pubkey::from_str(address.trim())
        .map_err(|e| HolderError::InvalidAddress(format!("{}: {}", address, e)))
}
