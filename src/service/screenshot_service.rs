use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use log::{debug, info};

use crate::capture::orchestrator::CaptureOrchestrator;
use crate::capture::platform::default_strategies;
use crate::capture::strategy::CaptureStrategy;
use crate::configuration::config::SnapConfig;
use crate::error_handling::types::{CaptureError, StorageError};
use crate::storage::artifact_store::ArtifactStore;
use crate::storage::types::{DeleteOutcome, Mode, QueueKind, QueueSelector};

/// Facade used by the embedding application.
///
/// Combines the retrying orchestrator with the two bounded artifact queues.
/// The mode decides which queue a capture lands in; it is read once when the
/// capture starts, so switching modes mid-capture does not redirect it.
pub struct ScreenshotService {
    orchestrator: CaptureOrchestrator,
    store: ArtifactStore,
    mode: RwLock<Mode>,
}

impl ScreenshotService {
    pub fn new(orchestrator: CaptureOrchestrator, store: ArtifactStore, mode: Mode) -> Self {
        Self {
            orchestrator,
            store,
            mode: RwLock::new(mode),
        }
    }

    /// Builds the service with this platform's default strategies. Leftover
    /// artifacts from a previous run are deleted.
    pub fn from_config(config: &SnapConfig, mode: Mode) -> Result<Self, StorageError> {
        Self::with_strategies(config, mode, default_strategies(config))
    }

    pub fn with_strategies(
        config: &SnapConfig,
        mode: Mode,
        strategies: Vec<Arc<dyn CaptureStrategy>>,
    ) -> Result<Self, StorageError> {
        let store = ArtifactStore::new(
            config.primary_dir(),
            config.secondary_dir(),
            config.queue_capacity,
        )?;
        Ok(Self::new(
            CaptureOrchestrator::with_strategies(config, strategies),
            store,
            mode,
        ))
    }

    pub fn set_mode(&self, mode: Mode) {
        let mut current = self.mode.write().unwrap_or_else(|p| p.into_inner());
        if *current != mode {
            debug!("Mode changed: {} -> {}", *current, mode);
        }
        *current = mode;
    }

    pub fn get_mode(&self) -> Mode {
        *self.mode.read().unwrap_or_else(|p| p.into_inner())
    }

    pub fn queue_capacity(&self) -> usize {
        self.store.capacity()
    }

    /// Takes a screenshot and stores it in the queue for the current mode.
    pub async fn capture(&self) -> Result<PathBuf, CaptureError> {
        let mode = self.get_mode();
        let bytes = self.orchestrator.capture().await?;
        let path = self.store.append(mode.queue(), &bytes)?;
        info!("Saved {} screenshot to {}", mode, path.display());
        Ok(path)
    }

    pub fn list_primary(&self) -> Vec<PathBuf> {
        self.store.list(QueueKind::Primary)
    }

    pub fn list_secondary(&self) -> Vec<PathBuf> {
        self.store.list(QueueKind::Secondary)
    }

    /// Returns the artifact as a `data:image/png;base64,` URI, or `None` when
    /// the file no longer exists.
    pub async fn preview(&self, path: &Path) -> Result<Option<String>, StorageError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(format!(
                "data:image/png;base64,{}",
                BASE64.encode(bytes)
            ))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No preview for missing artifact {}", path.display());
                Ok(None)
            }
            Err(e) => Err(StorageError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }

    pub fn remove(&self, path: &Path) -> Result<DeleteOutcome, StorageError> {
        self.store.remove(path)
    }

    pub fn clear_secondary(&self) -> usize {
        self.store.clear(QueueSelector::Secondary)
    }

    pub fn clear_all(&self) -> usize {
        self.store.clear(QueueSelector::All)
    }
}
