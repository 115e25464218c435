//! Durable candidate and exclusive-holder lists.
//!
//! Both snapshots are plain JSON arrays of wallet addresses, pretty-printed.
//! Pipelines only see the [`SnapshotStore`] trait, so tests run against
//! [`MemorySnapshotStore`] while the CLI uses [`FileSnapshotStore`].

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::{HolderError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotKind {
    /// Every owner seen in the latest enumeration.
    TokenHolders,
    /// Exclusive holders accumulated across runs.
    ExclusiveHolders,
}

impl SnapshotKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            SnapshotKind::TokenHolders => "tokenHolders.json",
            SnapshotKind::ExclusiveHolders => "exclusiveHolders.json",
        }
    }
}

impl std::fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.file_name())
    }
}

pub trait SnapshotStore: Send + Sync {
    /// `None` when no snapshot has been written yet.
    fn load(&self, kind: SnapshotKind) -> Result<Option<Vec<String>>>;

    /// Replace the snapshot as a whole; readers see either the old or the new list.
    fn replace(&self, kind: SnapshotKind, entries: &[String]) -> Result<()>;

    /// Append to the existing list (or start one) and return the new length.
    fn append(&self, kind: SnapshotKind, entries: &[String]) -> Result<usize>;

    /// Absent snapshots read as empty.
    fn load_or_empty(&self, kind: SnapshotKind) -> Result<Vec<String>> {
        Ok(self.load(kind)?.unwrap_or_default())
    }
}

/// File-backed snapshots under a single directory.
pub struct FileSnapshotStore {
    dir: PathBuf,
    // Serializes read-modify-write appends within this process
    write_lock: Mutex<()>,
}

impl FileSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self, kind: SnapshotKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    fn read(&self, kind: SnapshotKind) -> Result<Option<Vec<String>>> {
        let path = self.path(kind);
        if !path.exists() {
            return Ok(None);
        }

        let data = fs::read(&path)?;
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Some(Vec::new()));
        }

        match serde_json::from_slice::<Vec<String>>(&data) {
            Ok(entries) => Ok(Some(entries)),
            Err(e) => {
                let quarantined = quarantine(&path)?;
                warn!(
                    "Snapshot {} is corrupted ({}); moved to {} and treating as empty",
                    kind,
                    e,
                    quarantined.display()
                );
                Ok(None)
            }
        }
    }

    fn write_atomic(&self, kind: SnapshotKind, entries: &[String]) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let path = self.path(kind);
        let tmp_path = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(entries)?;

        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }

        if let Err(e) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        debug!("Wrote {} entries to {}", entries.len(), path.display());
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| HolderError::Snapshot("snapshot writer lock poisoned".to_string()))
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self, kind: SnapshotKind) -> Result<Option<Vec<String>>> {
        self.read(kind)
    }

    fn replace(&self, kind: SnapshotKind, entries: &[String]) -> Result<()> {
        let _guard = self.lock()?;
        self.write_atomic(kind, entries)
    }

    fn append(&self, kind: SnapshotKind, entries: &[String]) -> Result<usize> {
        let _guard = self.lock()?;

        let mut combined = self.read(kind)?.unwrap_or_default();
        combined.extend_from_slice(entries);
        self.write_atomic(kind, &combined)?;

        info!("{} has been updated ({} entries)", kind, combined.len());
        Ok(combined.len())
    }
}

/// Move an unreadable snapshot aside so it is never silently overwritten.
fn quarantine(path: &Path) -> Result<PathBuf> {
    let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3f");
    let target = path.with_extension(format!("json.corrupt-{}", stamp));
    fs::rename(path, &target)?;
    Ok(target)
}

#[derive(Default)]
pub struct MemorySnapshotStore {
    snapshots: Mutex<HashMap<SnapshotKind, Vec<String>>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, HashMap<SnapshotKind, Vec<String>>>> {
        self.snapshots
            .lock()
            .map_err(|_| HolderError::Snapshot("snapshot lock poisoned".to_string()))
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self, kind: SnapshotKind) -> Result<Option<Vec<String>>> {
        Ok(self.guard()?.get(&kind).cloned())
    }

    fn replace(&self, kind: SnapshotKind, entries: &[String]) -> Result<()> {
        self.guard()?.insert(kind, entries.to_vec());
        Ok(())
    }

    fn append(&self, kind: SnapshotKind, entries: &[String]) -> Result<usize> {
        let mut snapshots = self.guard()?;
        let list = snapshots.entry(kind).or_default();
        list.extend_from_slice(entries);
        Ok(list.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());

        assert_eq!(store.load(SnapshotKind::ExclusiveHolders).unwrap(), None);
        assert!(store.load_or_empty(SnapshotKind::ExclusiveHolders).unwrap().is_empty());
    }

    #[test]
    fn test_blank_file_is_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());
        fs::write(store.path(SnapshotKind::TokenHolders), "  \n").unwrap();

        assert_eq!(store.load(SnapshotKind::TokenHolders).unwrap(), Some(vec![]));
    }

    #[test]
    fn test_replace_writes_pretty_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("files"));

        store
            .replace(SnapshotKind::TokenHolders, &strings(&["a", "b"]))
            .unwrap();

        let raw = fs::read_to_string(store.path(SnapshotKind::TokenHolders)).unwrap();
        assert_eq!(raw, "[\n  \"a\",\n  \"b\"\n]");
        assert!(!store.path(SnapshotKind::TokenHolders).with_extension("json.tmp").exists());
    }

    #[test]
    fn test_append_keeps_prior_entries_and_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());
        store
            .replace(SnapshotKind::ExclusiveHolders, &strings(&["a", "b", "c"]))
            .unwrap();

        let len = store
            .append(SnapshotKind::ExclusiveHolders, &strings(&["c", "d"]))
            .unwrap();

        assert_eq!(len, 5);
        assert_eq!(
            store.load_or_empty(SnapshotKind::ExclusiveHolders).unwrap(),
            strings(&["a", "b", "c", "c", "d"])
        );
    }

    #[test]
    fn test_append_without_prior_snapshot_creates_it() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());

        assert_eq!(store.append(SnapshotKind::ExclusiveHolders, &strings(&["a"])).unwrap(), 1);
        assert!(store.path(SnapshotKind::ExclusiveHolders).exists());
    }

    #[test]
    fn test_corrupt_snapshot_is_quarantined() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());
        let path = store.path(SnapshotKind::ExclusiveHolders);
        fs::write(&path, "{ not json").unwrap();

        assert_eq!(store.load(SnapshotKind::ExclusiveHolders).unwrap(), None);
        assert!(!path.exists());

        let quarantined = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains("corrupt"))
            .count();
        assert_eq!(quarantined, 1);
    }

    #[test]
    fn test_non_utf8_snapshot_is_quarantined_and_append_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());
        let path = store.path(SnapshotKind::ExclusiveHolders);
        fs::write(&path, [0xff, 0xfe, b'[', b']']).unwrap();

        let len = store
            .append(SnapshotKind::ExclusiveHolders, &strings(&["a", "b"]))
            .unwrap();

        assert_eq!(len, 2);
        assert_eq!(
            store.load_or_empty(SnapshotKind::ExclusiveHolders).unwrap(),
            strings(&["a", "b"])
        );
        let quarantined = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains("corrupt"))
            .count();
        assert_eq!(quarantined, 1);
    }

    #[test]
    fn test_memory_store_append() {
        let store = MemorySnapshotStore::new();
        store.replace(SnapshotKind::TokenHolders, &strings(&["a"])).unwrap();

        assert_eq!(store.append(SnapshotKind::TokenHolders, &strings(&["b"])).unwrap(), 2);
        assert_eq!(store.load(SnapshotKind::ExclusiveHolders).unwrap(), None);
    }
}
