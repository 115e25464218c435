use std::sync::Arc;
use tracing::info;

use crate::{
    error::Result,
    storage::{SnapshotKind, SnapshotStore},
};

/// Maintains the accumulated exclusive-holder list.
///
/// No de-duplication happens here: the identity-keyed holder table is the
/// place where one wallet maps to one record.
#[derive(Clone)]
pub struct Reconciler {
    snapshots: Arc<dyn SnapshotStore>,
}

impl Reconciler {
    pub fn new(snapshots: Arc<dyn SnapshotStore>) -> Self {
        Self { snapshots }
    }

    /// Append newly verified holders to the existing list (or start it).
    /// Returns the length of the list after the write.
    pub fn merge(&self, new_holders: &[String]) -> Result<usize> {
        let len = self
            .snapshots
            .append(SnapshotKind::ExclusiveHolders, new_holders)?;
        info!(
            "Merged {} new exclusive holders, list now holds {}",
            new_holders.len(),
            len
        );
        Ok(len)
    }

    /// Write `holders` as the initial exclusive list for `token_mint`,
    /// replacing whatever was there.
    pub fn persist_fresh(&self, token_mint: &str, holders: &[String]) -> Result<()> {
        self.snapshots
            .replace(SnapshotKind::ExclusiveHolders, holders)?;
        info!(
            "Saved {} exclusive holders of {} to {}",
            holders.len(),
            token_mint,
            SnapshotKind::ExclusiveHolders
        );
        Ok(())
    }

    pub fn exclusive_holders(&self) -> Result<Vec<String>> {
        self.snapshots.load_or_empty(SnapshotKind::ExclusiveHolders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileSnapshotStore, MemorySnapshotStore};

    fn wallets(prefix: &str, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{}{}", prefix, i)).collect()
    }

    #[test]
    fn test_merge_grows_by_new_entries() {
        let reconciler = Reconciler::new(Arc::new(MemorySnapshotStore::new()));
        reconciler.persist_fresh("MintM", &wallets("old", 7)).unwrap();

        let len = reconciler.merge(&wallets("new", 4)).unwrap();

        assert_eq!(len, 11);
        let list = reconciler.exclusive_holders().unwrap();
        assert_eq!(&list[..7], &wallets("old", 7)[..]);
        assert_eq!(&list[7..], &wallets("new", 4)[..]);
    }

    #[test]
    fn test_merge_keeps_duplicates() {
        let reconciler = Reconciler::new(Arc::new(MemorySnapshotStore::new()));
        reconciler.persist_fresh("MintM", &wallets("w", 3)).unwrap();

        assert_eq!(reconciler.merge(&wallets("w", 2)).unwrap(), 5);
    }

    #[test]
    fn test_merge_without_prior_list() {
        let dir = tempfile::tempdir().unwrap();
        let reconciler = Reconciler::new(Arc::new(FileSnapshotStore::new(dir.path())));

        assert_eq!(reconciler.merge(&wallets("w", 2)).unwrap(), 2);
        assert_eq!(reconciler.exclusive_holders().unwrap(), wallets("w", 2));
    }

    #[test]
    fn test_empty_merge_leaves_list_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let reconciler = Reconciler::new(Arc::new(FileSnapshotStore::new(dir.path())));
        reconciler.persist_fresh("MintM", &wallets("w", 3)).unwrap();

        assert_eq!(reconciler.merge(&[]).unwrap(), 3);
        assert_eq!(reconciler.exclusive_holders().unwrap(), wallets("w", 3));
    }

    #[test]
    fn test_persist_fresh_replaces() {
        let reconciler = Reconciler::new(Arc::new(MemorySnapshotStore::new()));
        reconciler.persist_fresh("MintM", &wallets("a", 5)).unwrap();
        reconciler.persist_fresh("MintM", &wallets("b", 1)).unwrap();

        assert_eq!(reconciler.exclusive_holders().unwrap(), wallets("b", 1));
    }
}
