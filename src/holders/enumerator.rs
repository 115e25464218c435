use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    config::DiscoveryConfig,
    error::Result,
    solana::{FetchError, TokenLedger},
    storage::{SnapshotKind, SnapshotStore},
};

/// Cooperative stop request checked between pages.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Why the listing loop ended.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumerationEnd {
    /// Empty page or no cursor to continue from.
    Exhausted,
    RemoteFailure(FetchError),
    PageBudget,
    /// The remote handed back the cursor it was just given.
    CursorRepeated,
    Stopped,
}

#[derive(Debug, Clone)]
pub struct EnumerationReport {
    pub owners: BTreeSet<String>,
    pub pages: usize,
    pub end: EnumerationEnd,
    /// Whether the owner set was written to the candidate snapshot.
    pub snapshot_saved: bool,
}

impl EnumerationReport {
    pub fn is_complete(&self) -> bool {
        self.end == EnumerationEnd::Exhausted
    }

    pub fn owners_vec(&self) -> Vec<String> {
        self.owners.iter().cloned().collect()
    }
}

/// Walks the cursor-paginated token-account listing of a mint.
pub struct HolderEnumerator {
    ledger: TokenLedger,
    snapshots: Arc<dyn SnapshotStore>,
    page_limit: usize,
    max_pages: usize,
    stop: StopSignal,
}

impl HolderEnumerator {
    pub fn new(
        ledger: TokenLedger,
        snapshots: Arc<dyn SnapshotStore>,
        config: &DiscoveryConfig,
    ) -> Self {
        Self {
            ledger,
            snapshots,
            page_limit: config.page_limit,
            max_pages: config.max_pages,
            stop: StopSignal::new(),
        }
    }

    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    /// Collect every distinct owner of a `mint` token account and save the
    /// set as the candidate snapshot.
    pub async fn enumerate_holders(&self, mint: &str) -> Result<EnumerationReport> {
        info!("Enumerating token accounts for mint: {}", mint);

        let mut owners = BTreeSet::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0;

        let end = loop {
            if self.stop.is_stopped() {
                break EnumerationEnd::Stopped;
            }
            if pages >= self.max_pages {
                break EnumerationEnd::PageBudget;
            }

            let page = match self
                .ledger
                .token_accounts_page(mint, self.page_limit, cursor.as_deref())
                .await
            {
                Ok(page) => page,
                Err(e) => break EnumerationEnd::RemoteFailure(e),
            };

            if page.token_accounts.is_empty() {
                break EnumerationEnd::Exhausted;
            }

            pages += 1;
            owners.extend(page.token_accounts.into_iter().map(|entry| entry.owner));
            debug!("Page {}: {} distinct owners so far", pages, owners.len());

            match page.cursor {
                None => break EnumerationEnd::Exhausted,
                Some(next) if cursor.as_deref() == Some(next.as_str()) => {
                    break EnumerationEnd::CursorRepeated
                }
                Some(next) => cursor = Some(next),
            }
        };

        if end != EnumerationEnd::Exhausted {
            warn!(
                "Enumeration for {} ended early after {} page(s): {:?}",
                mint, pages, end
            );
        }

        let mut report = EnumerationReport {
            owners,
            pages,
            end,
            snapshot_saved: false,
        };
        report.snapshot_saved = self.save_candidates(&report)?;

        info!(
            "Found {} distinct holders of {} across {} page(s)",
            report.owners.len(),
            mint,
            report.pages
        );
        Ok(report)
    }

    /// A partial run never overwrites a saved candidate list at least as large as itself.
    fn save_candidates(&self, report: &EnumerationReport) -> Result<bool> {
        if !report.is_complete() {
            let saved = self.snapshots.load_or_empty(SnapshotKind::TokenHolders)?;
            if !saved.is_empty() && saved.len() >= report.owners.len() {
                warn!(
                    "Keeping saved candidate snapshot ({} entries) over partial result ({} entries)",
                    saved.len(),
                    report.owners.len()
                );
                return Ok(false);
            }
        }

        self.snapshots
            .replace(SnapshotKind::TokenHolders, &report.owners_vec())?;
        Ok(true)
    }
}
