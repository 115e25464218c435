//! Read paths used by the trading side: failures are logged and read as empty.

use tracing::{error, info};

use crate::storage::{Database, HolderBalance, OpenTrade, SnapshotKind, SnapshotStore};

/// Holders without an open position (wallet + SOL balance).
pub fn read_exclusive_holders(db: &Database) -> Vec<HolderBalance> {
    match db.get_available_holders() {
        Ok(holders) => {
            if holders.is_empty() {
                info!("No exclusive holder found in the collection");
            }
            holders
        }
        Err(e) => {
            error!("An error occurred while retrieving wallet addresses: {}", e);
            Vec::new()
        }
    }
}

pub fn read_open_trades(db: &Database) -> Vec<OpenTrade> {
    match db.get_open_trades() {
        Ok(trades) => {
            if trades.is_empty() {
                info!("No open trades");
            }
            trades
        }
        Err(e) => {
            error!("An error occurred while retrieving open trades: {}", e);
            Vec::new()
        }
    }
}

/// Candidate wallets from the latest enumeration.
pub fn read_token_holders(snapshots: &dyn SnapshotStore) -> Vec<String> {
    snapshots
        .load_or_empty(SnapshotKind::TokenHolders)
        .unwrap_or_else(|e| {
            error!("Error reading {}: {}", SnapshotKind::TokenHolders, e);
            Vec::new()
        })
}
