use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    config::DiscoveryConfig,
    error::Result,
    holders::{
        enumerator::{EnumerationReport, HolderEnumerator, StopSignal},
        reconcile::Reconciler,
        verifier::{BatchVerifier, VerificationReport},
    },
    solana::TokenLedger,
    storage::{SnapshotKind, SnapshotStore},
};

#[derive(Debug, Clone)]
pub struct DiscoveryReport {
    pub candidates: usize,
    /// `None` when candidates came from an existing snapshot.
    pub enumeration: Option<EnumerationReport>,
    pub verification: VerificationReport,
    /// `true` when the exclusive list was written fresh, `false` when the
    /// run was partial and its results were merged into the saved list.
    pub replaced: bool,
}

/// Enumerate → verify → persist, over one shared ledger and snapshot store.
pub struct HolderPipeline {
    enumerator: HolderEnumerator,
    verifier: BatchVerifier,
    reconciler: Reconciler,
    snapshots: Arc<dyn SnapshotStore>,
}

impl HolderPipeline {
    pub fn new(
        ledger: TokenLedger,
        snapshots: Arc<dyn SnapshotStore>,
        config: &DiscoveryConfig,
    ) -> Self {
        Self {
            enumerator: HolderEnumerator::new(ledger.clone(), snapshots.clone(), config),
            verifier: BatchVerifier::new(ledger, config.verify_batch_size),
            reconciler: Reconciler::new(snapshots.clone()),
            snapshots,
        }
    }

    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.enumerator = self.enumerator.with_stop_signal(stop.clone());
        self.verifier = self.verifier.with_stop_signal(stop);
        self
    }

    /// Full discovery run for `mint`. The exclusive list is written fresh.
    ///
    /// With `resume`, a non-empty candidate snapshot from an earlier run is
    /// verified instead of enumerating again. When enumeration or verification
    /// ends early, the exclusive holders found are merged into the saved list
    /// instead of replacing it.
    pub async fn discover(&self, mint: &str, resume: bool) -> Result<DiscoveryReport> {
        let saved = if resume {
            self.snapshots.load_or_empty(SnapshotKind::TokenHolders)?
        } else {
            Vec::new()
        };

        let (candidates, enumeration) = if saved.is_empty() {
            let report = self.enumerator.enumerate_holders(mint).await?;
            (report.owners_vec(), Some(report))
        } else {
            info!("Resuming from {} saved candidates", saved.len());
            (saved, None)
        };

        let verification = self.verifier.verify_exclusive(mint, &candidates).await;

        let complete = !verification.stopped
            && enumeration
                .as_ref()
                .map_or(true, EnumerationReport::is_complete);
        if complete {
            self.reconciler.persist_fresh(mint, &verification.exclusive)?;
        } else {
            warn!("Discovery for {} was partial, merging instead of replacing", mint);
            self.reconciler.merge(&verification.exclusive)?;
        }

        Ok(DiscoveryReport {
            candidates: candidates.len(),
            enumeration,
            verification,
            replaced: complete,
        })
    }

    /// Verify an explicit wallet list and append the exclusive ones to the
    /// accumulated list.
    pub async fn update(&self, mint: &str, wallets: &[String]) -> Result<VerificationReport> {
        let verification = self.verifier.verify_exclusive(mint, wallets).await;
        self.reconciler.merge(&verification.exclusive)?;
        Ok(verification)
    }
}
