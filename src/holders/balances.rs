use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{error, info, warn};

use crate::{
    error::Result,
    solana::{lamports_to_sol, parse_pubkey, TokenLedger},
    storage::Database,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolBalance {
    pub sol: f64,
}

/// Bulk native-balance lookups over the multiple-accounts call.
pub struct BalanceSnapshotService {
    ledger: TokenLedger,
    batch_size: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshSummary {
    pub requested: usize,
    pub updated: usize,
}

impl BalanceSnapshotService {
    pub fn new(ledger: TokenLedger, batch_size: usize) -> Self {
        Self {
            ledger,
            batch_size: batch_size.max(1),
        }
    }

    /// SOL balance of every wallet. Wallets without an account map to 0.
    ///
    /// All batches are issued at once. Wallets in a batch whose call failed,
    /// and malformed addresses, are left out of the result.
    pub async fn snapshot_balances(&self, wallets: &[String]) -> HashMap<String, SolBalance> {
        let (valid, invalid): (Vec<String>, Vec<String>) = wallets
            .iter()
            .cloned()
            .partition(|wallet| parse_pubkey(wallet).is_ok());
        for wallet in &invalid {
            warn!("Skipping malformed wallet address: {}", wallet);
        }

        let batches: Vec<&[String]> = valid.chunks(self.batch_size).collect();
        info!(
            "Fetching balances for {} wallets in {} batches",
            valid.len(),
            batches.len()
        );

        let results = join_all(
            batches
                .iter()
                .map(|batch| self.ledger.multiple_accounts(batch)),
        )
        .await;

        let mut balances = HashMap::with_capacity(valid.len());
        for (batch, result) in batches.iter().zip(results) {
            match result {
                Ok(accounts) => {
                    if accounts.len() != batch.len() {
                        warn!(
                            "Balance batch returned {} accounts for {} wallets",
                            accounts.len(),
                            batch.len()
                        );
                    }
                    for (wallet, account) in batch.iter().zip(accounts) {
                        let sol = account
                            .map(|account| lamports_to_sol(account.lamports))
                            .unwrap_or(0.0);
                        balances.insert(wallet.clone(), SolBalance { sol });
                    }
                }
                Err(e) => error!("Error fetching SOL balances for {} wallets: {}", batch.len(), e),
            }
        }

        balances
    }

    /// Re-read SOL balances of holders without an open trade and store them.
    pub async fn refresh_holder_balances(&self, db: &Database) -> Result<RefreshSummary> {
        let holders = db.get_available_holders()?;
        let wallets: Vec<String> = holders.into_iter().map(|h| h.wallet_address).collect();

        let balances = self.snapshot_balances(&wallets).await;

        let mut summary = RefreshSummary {
            requested: wallets.len(),
            updated: 0,
        };
        for (wallet, balance) in &balances {
            if db.update_sol_balance(wallet, balance.sol)? {
                summary.updated += 1;
            }
        }

        info!(
            "Refreshed SOL balances of {}/{} holders",
            summary.updated, summary.requested
        );
        Ok(summary)
    }
}
