use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{
    holders::exclusivity::{verify_wallet, Verdict},
    solana::{lamports_to_sol, TokenLedger},
    storage::{CreateOutcome, Database, ExclusiveHolder, HolderSnapshot},
};

/// Single-wallet exclusivity check that also persists the holder.
pub struct HolderRecorder {
    ledger: TokenLedger,
    db: Arc<Database>,
}

impl HolderRecorder {
    pub fn new(ledger: TokenLedger, db: Arc<Database>) -> Self {
        Self { ledger, db }
    }

    /// Returns the captured balances when `wallet` is an exclusive holder of
    /// `mint`, `None` otherwise (including when the lookup failed).
    ///
    /// A holder that is already stored is left as it is; the snapshot is still
    /// returned.
    pub async fn check_and_record(&self, mint: &str, wallet: &str) -> Option<HolderSnapshot> {
        let account = match verify_wallet(&self.ledger, mint, wallet).await {
            Verdict::Exclusive(account) => account,
            Verdict::NotExclusive => return None,
            Verdict::Unverified(e) => {
                error!("Error checking for exclusive holder {}: {}", wallet, e);
                return None;
            }
        };

        info!("Exclusive holder found: {}", wallet);

        let sol_balance = lamports_to_sol(self.ledger.balance_or_zero(wallet).await);
        let token_balance = account.ui_amount;

        let holder = ExclusiveHolder::new(wallet, mint, sol_balance, token_balance);
        match self.db.create_exclusive_holder(&holder) {
            Ok(CreateOutcome::Created) => info!("Exclusive holder added: {}", wallet),
            Ok(CreateOutcome::AlreadyExists) => {
                warn!("Exclusive holder {} already recorded, keeping existing entry", wallet)
            }
            Err(e) => error!("Error adding exclusive holder {}: {}", wallet, e),
        }

        Some(HolderSnapshot {
            wallet_address: wallet.to_string(),
            token_mint_address: mint.to_string(),
            sol_balance,
            token_balance,
        })
    }
}
