use futures::future::join_all;
use tracing::{info, warn};

use crate::{
    holders::{
        enumerator::StopSignal,
        exclusivity::{verify_wallet, Verdict},
    },
    solana::{FetchError, TokenLedger},
};

/// Outcome of verifying a candidate list.
#[derive(Debug, Clone, Default)]
pub struct VerificationReport {
    /// Wallets whose only token account holds the mint.
    pub exclusive: Vec<String>,
    /// Wallets whose lookup failed; neither confirmed nor ruled out.
    pub unverified: Vec<(String, FetchError)>,
    pub checked: usize,
    pub batches: usize,
    /// Set when the stop signal cut the run short; unchecked candidates are skipped.
    pub stopped: bool,
}

impl VerificationReport {
    pub fn rejected(&self) -> usize {
        self.checked - self.exclusive.len() - self.unverified.len()
    }
}

/// Checks candidates in fixed-size batches: concurrent within a batch,
/// sequential across batches.
pub struct BatchVerifier {
    ledger: TokenLedger,
    batch_size: usize,
    stop: StopSignal,
}

impl BatchVerifier {
    pub fn new(ledger: TokenLedger, batch_size: usize) -> Self {
        Self {
            ledger,
            batch_size: batch_size.max(1),
            stop: StopSignal::new(),
        }
    }

    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    pub async fn verify_exclusive(&self, mint: &str, candidates: &[String]) -> VerificationReport {
        let total_batches = candidates.len().div_ceil(self.batch_size);
        info!(
            "Verifying {} candidates for {} in {} batches of {}",
            candidates.len(),
            mint,
            total_batches,
            self.batch_size
        );

        let mut report = VerificationReport::default();

        for (batch_num, chunk) in candidates.chunks(self.batch_size).enumerate() {
            if self.stop.is_stopped() {
                warn!(
                    "Verification stopped after {}/{} batches",
                    batch_num, total_batches
                );
                report.stopped = true;
                break;
            }

            info!("Processing batch {}/{}", batch_num + 1, total_batches);

            let verdicts = join_all(
                chunk
                    .iter()
                    .map(|candidate| verify_wallet(&self.ledger, mint, candidate)),
            )
            .await;

            for (candidate, verdict) in chunk.iter().zip(verdicts) {
                match verdict {
                    Verdict::Exclusive(_) => report.exclusive.push(candidate.clone()),
                    Verdict::NotExclusive => {}
                    Verdict::Unverified(e) => {
                        warn!("Could not verify {}: {}", candidate, e);
                        report.unverified.push((candidate.clone(), e));
                    }
                }
            }

            report.checked += chunk.len();
            report.batches += 1;
        }

        info!(
            "Verification complete: {} exclusive, {} rejected, {} unverified",
            report.exclusive.len(),
            report.rejected(),
            report.unverified.len()
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solana::client::{MockRpcTransport, RpcMethod, RpcTransport};
    use crate::solana::ledger::fixtures::{owner_accounts, token_account};
    use crate::solana::{RateLimitedFetcher, RetryPolicy};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn ledger(transport: impl RpcTransport + 'static) -> TokenLedger {
        TokenLedger::new(RateLimitedFetcher::new(
            Arc::new(transport),
            RetryPolicy::default(),
        ))
    }

    /// Answers owner lookups from a fixed table of wallet -> mints.
    fn table_transport(table: HashMap<String, Vec<&'static str>>) -> MockRpcTransport {
        let mut transport = MockRpcTransport::new();
        transport.expect_send().returning(move |method, params: Value| {
            assert_eq!(method, RpcMethod::TokenAccountsByOwner);
            let owner = params[0].as_str().unwrap().to_string();
            match table.get(&owner) {
                Some(mints) => Ok(owner_accounts(
                    mints
                        .iter()
                        .enumerate()
                        .map(|(i, mint)| token_account(&format!("{}-{}", owner, i), mint, 1.0))
                        .collect(),
                )),
                None => Err(FetchError::Transport("connection reset".to_string())),
            }
        });
        transport
    }

    #[tokio::test]
    async fn test_only_single_matching_account_is_exclusive() {
        let table = HashMap::from([
            ("A".to_string(), vec!["MintM"]),
            ("B".to_string(), vec!["MintM", "MintX"]),
            ("C".to_string(), vec!["MintX"]),
        ]);
        let verifier = BatchVerifier::new(ledger(table_transport(table)), 50);
        let candidates = vec!["A".to_string(), "B".to_string(), "C".to_string()];

        let report = verifier.verify_exclusive("MintM", &candidates).await;

        assert_eq!(report.exclusive, vec!["A".to_string()]);
        assert!(report.unverified.is_empty());
        assert_eq!(report.rejected(), 2);
    }

    #[tokio::test]
    async fn test_classification_ignores_input_order() {
        let table = HashMap::from([
            ("A".to_string(), vec!["mintm"]),
            ("B".to_string(), vec![]),
            ("C".to_string(), vec!["MintM"]),
            ("D".to_string(), vec!["MintM", "MintM"]),
        ]);
        let verifier = BatchVerifier::new(ledger(table_transport(table)), 2);

        let forward: Vec<String> = ["A", "B", "C", "D"].iter().map(|s| s.to_string()).collect();
        let backward: Vec<String> = forward.iter().rev().cloned().collect();

        let mut first = verifier.verify_exclusive("MintM", &forward).await.exclusive;
        let mut second = verifier.verify_exclusive("MintM", &backward).await.exclusive;
        first.sort();
        second.sort();

        assert_eq!(first, vec!["A".to_string(), "C".to_string()]);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_failed_lookup_is_unverified_not_exclusive() {
        let table = HashMap::from([("A".to_string(), vec!["MintM"])]);
        let verifier = BatchVerifier::new(ledger(table_transport(table)), 50);
        let candidates = vec!["A".to_string(), "offline".to_string()];

        let report = verifier.verify_exclusive("MintM", &candidates).await;

        assert_eq!(report.exclusive, vec!["A".to_string()]);
        assert_eq!(report.unverified.len(), 1);
        assert_eq!(report.unverified[0].0, "offline");
    }

    /// Records which batch each candidate was seen in and the peak fan-out.
    struct TrackingTransport {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl RpcTransport for TrackingTransport {
        async fn send(&self, _method: RpcMethod, params: Value) -> Result<Value, FetchError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.seen
                .lock()
                .unwrap()
                .push(params[0].as_str().unwrap().to_string());

            tokio::time::sleep(Duration::from_millis(10)).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(owner_accounts(vec![]))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_batches_cover_every_candidate_once() {
        let transport = Arc::new(TrackingTransport {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        });
        let verifier = BatchVerifier::new(
            TokenLedger::new(RateLimitedFetcher::new(transport.clone(), RetryPolicy::default())),
            50,
        );
        let candidates: Vec<String> = (0..120).map(|i| format!("wallet{:03}", i)).collect();

        let report = verifier.verify_exclusive("MintM", &candidates).await;

        assert_eq!(report.batches, 3);
        assert_eq!(report.checked, 120);
        assert_eq!(transport.peak.load(Ordering::SeqCst), 50);

        let seen = transport.seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 120);
        // Batches run in order: everything in batch n is issued before batch n+1
        for (batch_num, batch) in seen.chunks(50).enumerate() {
            let mut batch = batch.to_vec();
            batch.sort();
            let expected: Vec<String> = candidates[batch_num * 50..]
                .iter()
                .take(50)
                .cloned()
                .collect();
            assert_eq!(batch, expected);
        }
    }

    #[tokio::test]
    async fn test_stop_signal_ends_run_between_batches() {
        let stop = StopSignal::new();
        let trigger = stop.clone();
        let mut transport = MockRpcTransport::new();
        transport.expect_send().times(2).returning(move |_, _| {
            trigger.stop();
            Ok(owner_accounts(vec![token_account("acc", "MintM", 1.0)]))
        });
        let verifier = BatchVerifier::new(ledger(transport), 2).with_stop_signal(stop);
        let candidates: Vec<String> = (0..6).map(|i| format!("w{}", i)).collect();

        let report = verifier.verify_exclusive("MintM", &candidates).await;

        assert!(report.stopped);
        assert_eq!(report.batches, 1);
        assert_eq!(report.checked, 2);
        assert_eq!(report.exclusive, vec!["w0".to_string(), "w1".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_candidate_list() {
        let mut transport = MockRpcTransport::new();
        transport.expect_send().never();
        let verifier = BatchVerifier::new(ledger(transport), 50);

        let report = verifier.verify_exclusive("MintM", &[]).await;

        assert_eq!(report.batches, 0);
        assert!(report.exclusive.is_empty());
    }
}
