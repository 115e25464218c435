pub mod balances;
pub mod enumerator;
pub mod exclusivity;
pub mod pipeline;
pub mod queries;
pub mod recorder;
pub mod reconcile;
pub mod verifier;

pub use balances::{BalanceSnapshotService, RefreshSummary, SolBalance};
pub use enumerator::{EnumerationEnd, EnumerationReport, HolderEnumerator, StopSignal};
pub use exclusivity::{exclusive_account, verify_wallet, Verdict};
pub use pipeline::{DiscoveryReport, HolderPipeline};
pub use recorder::HolderRecorder;
pub use reconcile::Reconciler;
pub use verifier::{BatchVerifier, VerificationReport};
