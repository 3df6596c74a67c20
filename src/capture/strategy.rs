//! The capability shared by every acquisition method: produce a raw image
//! buffer, fallibly, within a bounded time.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error_handling::types::StrategyError;

/// Per-capture environment handed to each strategy.
#[derive(Debug, Clone)]
pub struct CaptureContext {
    scratch_dir: PathBuf,
}

impl CaptureContext {
    pub fn new<P: AsRef<Path>>(scratch_dir: P) -> Self {
        Self {
            scratch_dir: scratch_dir.as_ref().to_path_buf(),
        }
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// A fresh, collision-resistant file path inside the scratch directory.
    pub fn temp_file(&self, prefix: &str) -> PathBuf {
        self.scratch_dir
            .join(format!("{}-{}.png", prefix, Uuid::new_v4()))
    }
}

/// One concrete way of grabbing the screen.
///
/// Implementations must validate their own output and report garbage as an
/// error rather than returning it. Any temp file they create is theirs to
/// remove; files orphaned by a timeout are swept by the temp cleaner later.
#[async_trait]
pub trait CaptureStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// Upper bound the orchestrator waits for [`CaptureStrategy::capture`].
    fn timeout(&self) -> Duration;

    async fn capture(&self, ctx: &CaptureContext) -> Result<Vec<u8>, StrategyError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_files_are_unique_and_scoped() {
        let ctx = CaptureContext::new("/tmp/snapq-test");
        let a = ctx.temp_file("screencapture");
        let b = ctx.temp_file("screencapture");
        assert_ne!(a, b);
        assert!(a.starts_with("/tmp/snapq-test"));
        let name = a.file_name().and_then(|n| n.to_str()).unwrap();
        assert!(name.starts_with("screencapture-"));
        assert!(name.ends_with(".png"));
    }
}
