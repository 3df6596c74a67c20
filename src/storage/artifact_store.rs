use std::collections::VecDeque;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use log::{debug, error, info, warn};
use uuid::Uuid;

use crate::error_handling::types::StorageError;
use crate::storage::types::{Artifact, DeleteOutcome, QueueKind, QueueSelector};

/// File extension of persisted artifacts.
pub const ARTIFACT_EXTENSION: &str = "png";

/// Two bounded FIFO queues of on-disk screenshots.
///
/// Each queue has its own mutex, held only while the in-memory list is
/// mutated; file writes and deletes happen outside the lock. A path present in
/// a queue refers to a file written by this store, until eviction or an
/// explicit removal takes it out.
pub struct ArtifactStore {
    primary_dir: PathBuf,
    secondary_dir: PathBuf,
    capacity: usize,
    primary: Mutex<VecDeque<Artifact>>,
    secondary: Mutex<VecDeque<Artifact>>,
    next_sequence: AtomicU64,
}

impl ArtifactStore {
    /// Provisions both directories and deletes anything left over from a
    /// previous process, so the store always starts with empty queues.
    pub fn new<P: AsRef<Path>, S: AsRef<Path>>(
        primary_dir: P,
        secondary_dir: S,
        capacity: usize,
    ) -> Result<Self, StorageError> {
        let store = Self {
            primary_dir: primary_dir.as_ref().to_path_buf(),
            secondary_dir: secondary_dir.as_ref().to_path_buf(),
            capacity: capacity.max(1),
            primary: Mutex::new(VecDeque::new()),
            secondary: Mutex::new(VecDeque::new()),
            next_sequence: AtomicU64::new(0),
        };
        ensure_dir(&store.primary_dir)?;
        ensure_dir(&store.secondary_dir)?;
        let purged = store.purge_on_start();
        info!(
            "ArtifactStore initialized (primary: {}, secondary: {}, capacity: {}, purged: {})",
            store.primary_dir.display(),
            store.secondary_dir.display(),
            store.capacity,
            purged
        );
        Ok(store)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn dir_for(&self, kind: QueueKind) -> &Path {
        match kind {
            QueueKind::Primary => &self.primary_dir,
            QueueKind::Secondary => &self.secondary_dir,
        }
    }

    fn queue(&self, kind: QueueKind) -> MutexGuard<'_, VecDeque<Artifact>> {
        let lock = match kind {
            QueueKind::Primary => &self.primary,
            QueueKind::Secondary => &self.secondary,
        };
        // A panic while holding the lock cannot leave the deque half-updated.
        lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Deletes every regular file in both artifact directories. Returns how
    /// many were removed; individual failures are logged.
    pub fn purge_on_start(&self) -> usize {
        let mut removed = 0usize;
        for dir in [&self.primary_dir, &self.secondary_dir] {
            let entries = match fs::read_dir(dir) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Failed to scan {} for stale artifacts: {}", dir.display(), e);
                    continue;
                }
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if !path.is_file() {
                    continue;
                }
                match delete_best_effort(&path) {
                    DeleteOutcome::Deleted => removed += 1,
                    DeleteOutcome::AlreadyAbsent => {}
                    DeleteOutcome::Failed(e) => {
                        warn!("Failed to purge stale artifact {}: {}", path.display(), e)
                    }
                }
            }
        }
        if removed > 0 {
            info!("Purged {} artifact(s) left by a previous run", removed);
        }
        removed
    }

    /// Persists `data` as a new artifact at the back of `kind`'s queue,
    /// evicting (and deleting) the oldest entries beyond capacity.
    pub fn append(&self, kind: QueueKind, data: &[u8]) -> Result<PathBuf, StorageError> {
        let dir = self.dir_for(kind).to_path_buf();
        ensure_dir(&dir)?;

        let path = dir.join(format!("{}.{}", Uuid::new_v4(), ARTIFACT_EXTENSION));
        fs::write(&path, data).map_err(|e| {
            error!("Failed to write artifact {}: {}", path.display(), e);
            StorageError::WriteFailed {
                path: path.clone(),
                source: e,
            }
        })?;

        let artifact = Artifact {
            path: path.clone(),
            queue: kind,
            sequence: self.next_sequence.fetch_add(1, Ordering::Relaxed),
            captured_at: Utc::now(),
        };

        let evicted: Vec<Artifact> = {
            let mut queue = self.queue(kind);
            queue.push_back(artifact);
            let excess = queue.len().saturating_sub(self.capacity);
            let evicted: Vec<Artifact> = queue.drain(..excess).collect();
            evicted
        };

        for old in evicted {
            match delete_best_effort(&old.path) {
                DeleteOutcome::Failed(e) => warn!(
                    "Evicted artifact {} from {:?} queue but could not delete it: {}",
                    old.path.display(),
                    kind,
                    e
                ),
                _ => info!("Evicted artifact {} from {:?} queue", old.path.display(), kind),
            }
        }

        debug!(
            "Stored {} byte(s) as {} in {:?} queue",
            data.len(),
            path.display(),
            kind
        );
        Ok(path)
    }

    /// Deletes the artifact at `path` and drops it from whichever queue holds
    /// it. An already missing file is not an error; only an OS-level deletion
    /// failure is, in which case the queue entry is kept.
    pub fn remove(&self, path: &Path) -> Result<DeleteOutcome, StorageError> {
        let outcome = match fs::remove_file(path) {
            Ok(()) => DeleteOutcome::Deleted,
            Err(e) if e.kind() == ErrorKind::NotFound => DeleteOutcome::AlreadyAbsent,
            Err(e) => {
                error!("Failed to delete artifact {}: {}", path.display(), e);
                return Err(StorageError::DeleteFailed {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        };

        for kind in [QueueKind::Primary, QueueKind::Secondary] {
            let mut queue = self.queue(kind);
            let before = queue.len();
            queue.retain(|a| a.path != path);
            if queue.len() != before {
                debug!("Removed {} from {:?} queue", path.display(), kind);
            }
        }
        Ok(outcome)
    }

    /// Empties the selected queue(s) and best-effort deletes their files.
    /// Returns the number of entries dropped from memory.
    pub fn clear(&self, selector: QueueSelector) -> usize {
        let mut cleared = 0usize;
        for kind in [QueueKind::Primary, QueueKind::Secondary] {
            if !selector.includes(kind) {
                continue;
            }
            let drained: Vec<Artifact> = self.queue(kind).drain(..).collect();
            cleared += drained.len();
            for artifact in drained {
                if let DeleteOutcome::Failed(e) = delete_best_effort(&artifact.path) {
                    warn!(
                        "Failed to delete {} while clearing {:?} queue: {}",
                        artifact.path.display(),
                        kind,
                        e
                    );
                }
            }
        }
        info!("Cleared {} artifact(s) ({:?})", cleared, selector);
        cleared
    }

    /// Snapshot of the paths in `kind`'s queue, oldest first.
    pub fn list(&self, kind: QueueKind) -> Vec<PathBuf> {
        self.queue(kind).iter().map(|a| a.path.clone()).collect()
    }

    pub fn artifacts(&self, kind: QueueKind) -> Vec<Artifact> {
        self.queue(kind).iter().cloned().collect()
    }

    pub fn len(&self, kind: QueueKind) -> usize {
        self.queue(kind).len()
    }

    pub fn is_empty(&self, kind: QueueKind) -> bool {
        self.len(kind) == 0
    }
}

fn ensure_dir(dir: &Path) -> Result<(), StorageError> {
    fs::create_dir_all(dir).map_err(|e| {
        error!("Failed to create artifact dir {}: {}", dir.display(), e);
        StorageError::CreateDirFailed {
            path: dir.to_path_buf(),
            source: e,
        }
    })
}

/// Removes a file without ever failing the caller.
pub fn delete_best_effort(path: &Path) -> DeleteOutcome {
    match fs::remove_file(path) {
        Ok(()) => DeleteOutcome::Deleted,
        Err(e) if e.kind() == ErrorKind::NotFound => DeleteOutcome::AlreadyAbsent,
        Err(e) => DeleteOutcome::Failed(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir, capacity: usize) -> ArtifactStore {
        ArtifactStore::new(
            dir.path().join("screenshots"),
            dir.path().join("extra_screenshots"),
            capacity,
        )
        .unwrap()
    }

    #[test]
    fn test_append_writes_file() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, 5);
        let path = store.append(QueueKind::Primary, b"image-bytes").unwrap();
        assert!(path.starts_with(dir.path().join("screenshots")));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("png"));
        assert_eq!(fs::read(&path).unwrap(), b"image-bytes");
        assert_eq!(store.list(QueueKind::Primary), vec![path]);
        assert!(store.is_empty(QueueKind::Secondary));
    }

    #[test]
    fn test_queue_never_exceeds_capacity() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, 3);
        let mut written = Vec::new();
        for i in 0..10u8 {
            written.push(store.append(QueueKind::Secondary, &[i]).unwrap());
            assert!(store.len(QueueKind::Secondary) <= 3);
            let expected: Vec<PathBuf> =
                written.iter().rev().take(3).rev().cloned().collect();
            assert_eq!(store.list(QueueKind::Secondary), expected);
        }
        for old in &written[..7] {
            assert!(!old.exists());
        }
    }

    #[test]
    fn test_sixth_append_evicts_oldest() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, 5);
        let paths: Vec<PathBuf> = (0..6u8)
            .map(|i| store.append(QueueKind::Primary, &[i]).unwrap())
            .collect();

        let remaining = store.list(QueueKind::Primary);
        assert_eq!(remaining.len(), 5);
        assert!(!remaining.contains(&paths[0]));
        assert!(!paths[0].exists());
        assert_eq!(remaining, paths[1..].to_vec());
    }

    #[test]
    fn test_eviction_drops_entry_even_if_file_already_gone() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, 1);
        let first = store.append(QueueKind::Primary, b"a").unwrap();
        fs::remove_file(&first).unwrap();
        let second = store.append(QueueKind::Primary, b"b").unwrap();
        assert_eq!(store.list(QueueKind::Primary), vec![second]);
    }

    /// Swaps the artifact file for a non-empty directory so `remove_file`
    /// fails with something other than NotFound.
    fn make_undeletable(path: &Path) {
        fs::remove_file(path).unwrap();
        fs::create_dir_all(path).unwrap();
        fs::write(path.join("pinned"), b"x").unwrap();
    }

    #[test]
    fn test_eviction_drops_entry_when_delete_fails() {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = TempDir::new().unwrap();
        let store = store(&dir, 2);
        let oldest = store.append(QueueKind::Primary, b"a").unwrap();
        let middle = store.append(QueueKind::Primary, b"b").unwrap();
        make_undeletable(&oldest);
        assert!(delete_best_effort(&oldest).is_failure());

        let newest = store.append(QueueKind::Primary, b"c").unwrap();
        assert_eq!(store.list(QueueKind::Primary), vec![middle, newest]);
        assert!(oldest.exists());
    }

    #[test]
    fn test_remove_failure_keeps_entry() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, 5);
        let stuck = store.append(QueueKind::Secondary, b"stuck").unwrap();
        let other = store.append(QueueKind::Secondary, b"other").unwrap();
        make_undeletable(&stuck);

        match store.remove(&stuck) {
            Err(StorageError::DeleteFailed { path, .. }) => assert_eq!(path, stuck),
            result => panic!("expected DeleteFailed, got {:?}", result.map_err(|e| e.to_string())),
        }
        assert_eq!(store.list(QueueKind::Secondary), vec![stuck.clone(), other]);
        assert!(stuck.exists());
    }

    #[test]
    fn test_capacity_is_per_queue() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, 2);
        for i in 0..2u8 {
            store.append(QueueKind::Primary, &[i]).unwrap();
            store.append(QueueKind::Secondary, &[i]).unwrap();
        }
        assert_eq!(store.len(QueueKind::Primary), 2);
        assert_eq!(store.len(QueueKind::Secondary), 2);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, 5);
        let keep = store.append(QueueKind::Primary, b"keep").unwrap();
        let gone = store.append(QueueKind::Primary, b"gone").unwrap();

        assert_eq!(store.remove(&gone).unwrap(), DeleteOutcome::Deleted);
        assert_eq!(store.remove(&gone).unwrap(), DeleteOutcome::AlreadyAbsent);
        assert!(!gone.exists());
        assert_eq!(store.list(QueueKind::Primary), vec![keep.clone()]);
        assert!(keep.exists());
    }

    #[test]
    fn test_remove_unknown_path_succeeds() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, 5);
        let outcome = store.remove(&dir.path().join("never-existed.png")).unwrap();
        assert_eq!(outcome, DeleteOutcome::AlreadyAbsent);
    }

    #[test]
    fn test_clear_selected_queue_only() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, 5);
        let p = store.append(QueueKind::Primary, b"p").unwrap();
        let s1 = store.append(QueueKind::Secondary, b"s1").unwrap();
        let s2 = store.append(QueueKind::Secondary, b"s2").unwrap();

        assert_eq!(store.clear(QueueSelector::Secondary), 2);
        assert!(store.is_empty(QueueKind::Secondary));
        assert!(!s1.exists() && !s2.exists());
        assert_eq!(store.list(QueueKind::Primary), vec![p.clone()]);
        assert!(p.exists());

        assert_eq!(store.clear(QueueSelector::All), 1);
        assert!(store.is_empty(QueueKind::Primary));
        assert!(!p.exists());
    }

    #[test]
    fn test_clear_tolerates_missing_files() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, 5);
        let p = store.append(QueueKind::Primary, b"p").unwrap();
        fs::remove_file(&p).unwrap();
        assert_eq!(store.clear(QueueSelector::Primary), 1);
        assert!(store.is_empty(QueueKind::Primary));
    }

    #[test]
    fn test_new_purges_leftovers() {
        let dir = TempDir::new().unwrap();
        let primary = dir.path().join("screenshots");
        let secondary = dir.path().join("extra_screenshots");
        fs::create_dir_all(&primary).unwrap();
        fs::create_dir_all(&secondary).unwrap();
        let stale_a = primary.join("old-a.png");
        let stale_b = secondary.join("old-b.png");
        fs::write(&stale_a, b"a").unwrap();
        fs::write(&stale_b, b"b").unwrap();

        let store = ArtifactStore::new(&primary, &secondary, 5).unwrap();
        assert!(store.is_empty(QueueKind::Primary));
        assert!(store.is_empty(QueueKind::Secondary));
        assert!(!stale_a.exists());
        assert!(!stale_b.exists());
        assert!(primary.is_dir() && secondary.is_dir());
    }

    #[test]
    fn test_append_recreates_missing_dir() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, 5);
        fs::remove_dir_all(dir.path().join("extra_screenshots")).unwrap();
        let path = store.append(QueueKind::Secondary, b"x").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_sequence_is_monotonic() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, 5);
        store.append(QueueKind::Primary, b"1").unwrap();
        store.append(QueueKind::Secondary, b"2").unwrap();
        store.append(QueueKind::Primary, b"3").unwrap();
        let seqs: Vec<u64> = store
            .artifacts(QueueKind::Primary)
            .iter()
            .map(|a| a.sequence)
            .collect();
        assert_eq!(seqs, vec![0, 2]);
        assert!(store
            .artifacts(QueueKind::Secondary)
            .iter()
            .all(|a| a.queue == QueueKind::Secondary));
    }

    #[test]
    fn test_list_is_a_snapshot() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir, 5);
        store.append(QueueKind::Primary, b"1").unwrap();
        let mut snapshot = store.list(QueueKind::Primary);
        snapshot.clear();
        assert_eq!(store.len(QueueKind::Primary), 1);
    }
}
