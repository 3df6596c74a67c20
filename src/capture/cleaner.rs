use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use log::{debug, warn};

/// Outcome of one scratch directory sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: usize,
    pub failed: usize,
}

/// Deletes entries of `dir` whose modification time is older than `max_age`.
///
/// Missing directories are created. Per-entry failures are logged and
/// counted, never raised, so one stuck file cannot block the rest.
pub fn clean_stale(dir: &Path, max_age: Duration) -> std::io::Result<CleanupReport> {
    fs::create_dir_all(dir)?;
    let now = SystemTime::now();
    let mut report = CleanupReport::default();

    for entry in fs::read_dir(dir)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Dir entry error in {}: {}", dir.display(), e);
                report.failed += 1;
                continue;
            }
        };
        let path = entry.path();
        let modified = match entry.metadata().and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                warn!("Cannot stat temp file {}: {}", path.display(), e);
                report.failed += 1;
                continue;
            }
        };
        // Timestamps in the future count as fresh.
        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        if age <= max_age {
            continue;
        }

        let result = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        match result {
            Ok(()) => {
                debug!("Removed stale temp entry {}", path.display());
                report.removed += 1;
            }
            Err(e) => {
                warn!("Failed to remove stale temp entry {}: {}", path.display(), e);
                report.failed += 1;
            }
        }
    }

    if report.removed > 0 || report.failed > 0 {
        debug!(
            "Temp sweep of {}: removed={}, failed={}",
            dir.display(),
            report.removed,
            report.failed
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    fn backdate(path: &Path, by: Duration) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - by).unwrap();
    }

    #[test]
    fn removes_only_old_entries() {
        let dir = TempDir::new().unwrap();
        let old = dir.path().join("old.png");
        let fresh = dir.path().join("fresh.png");
        fs::write(&old, b"old").unwrap();
        fs::write(&fresh, b"fresh").unwrap();
        backdate(&old, Duration::from_secs(600));

        let report = clean_stale(dir.path(), Duration::from_secs(300)).unwrap();
        assert_eq!(report, CleanupReport { removed: 1, failed: 0 });
        assert!(!old.exists());
        assert!(fresh.exists());
    }

    #[test]
    fn creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let scratch = dir.path().join("nested").join("scratch");
        let report = clean_stale(&scratch, Duration::from_secs(300)).unwrap();
        assert_eq!(report, CleanupReport::default());
        assert!(scratch.is_dir());
    }

    #[test]
    fn zero_age_keeps_nothing_old() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.png");
        fs::write(&a, b"a").unwrap();
        backdate(&a, Duration::from_secs(1));
        let report = clean_stale(dir.path(), Duration::ZERO).unwrap();
        assert_eq!(report.removed, 1);
    }
}
