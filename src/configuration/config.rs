use directories::ProjectDirs;
use log::{debug, info};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::capture::platform::has_quote;
use crate::error_handling::types::ConfigError;

/// Environment variable overriding the default data root.
pub const DATA_DIR_ENV: &str = "SNAPQ_DATA_DIR";

const PRIMARY_DIR_NAME: &str = "screenshots";
const SECONDARY_DIR_NAME: &str = "extra_screenshots";

/// Runtime parameters of the screenshot subsystem.
///
/// Every field has a default, so an empty TOML file is a valid configuration.
/// The struct is built once by the embedding application and passed down
/// explicitly; nothing in the crate reads it from global state.
///
/// # Fields Overview
///
/// - `data_root`: application-private directory holding both artifact queues
/// - `temp_dir`: scratch directory for file-mediated capture strategies
/// - `queue_capacity`: bound applied independently to each queue
/// - `max_retries`: number of attempt rounds over the strategy list
/// - `backoff_base_ms`: delay before the second round, doubled for each later round
/// - `stale_temp_age_secs`: scratch files older than this are removed before capturing
/// - `primary_timeout_ms` / `script_timeout_ms`: per-strategy time limits
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SnapConfig {
    pub data_root: PathBuf,
    pub temp_dir: PathBuf,
    pub queue_capacity: usize,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub stale_temp_age_secs: u64,
    pub primary_timeout_ms: u64,
    pub script_timeout_ms: u64,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
            temp_dir: std::env::temp_dir().join("snapq"),
            queue_capacity: 5,
            max_retries: 3,
            backoff_base_ms: 200,
            stale_temp_age_secs: 300,
            primary_timeout_ms: 5_000,
            script_timeout_ms: 10_000,
        }
    }
}

/// Resolves the data root: `SNAPQ_DATA_DIR` if set, otherwise the platform
/// data directory, otherwise the current directory.
pub fn default_data_root() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        debug!("Using data root from {}: {}", DATA_DIR_ENV, dir);
        return PathBuf::from(dir);
    }
    if let Some(dirs) = ProjectDirs::from("", "", "snapq") {
        return dirs.data_dir().to_path_buf();
    }
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

impl SnapConfig {
    /// Reads and validates a TOML configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: SnapConfig =
            toml::from_str(content).map_err(|e| ConfigError::TomlError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::NotInRange(
                "queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.max_retries == 0 {
            return Err(ConfigError::NotInRange(
                "max_retries must be at least 1".to_string(),
            ));
        }
        if self.primary_timeout_ms == 0 || self.script_timeout_ms == 0 {
            return Err(ConfigError::NotInRange(
                "strategy timeouts must be non-zero".to_string(),
            ));
        }
        // Script strategies embed temp paths inside quoted literals.
        if has_quote(&self.temp_dir) {
            return Err(ConfigError::NotInRange(format!(
                "temp_dir must not contain quote characters: {}",
                self.temp_dir.display()
            )));
        }
        Ok(())
    }

    pub fn primary_dir(&self) -> PathBuf {
        self.data_root.join(PRIMARY_DIR_NAME)
    }

    pub fn secondary_dir(&self) -> PathBuf {
        self.data_root.join(SECONDARY_DIR_NAME)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn stale_temp_age(&self) -> Duration {
        Duration::from_secs(self.stale_temp_age_secs)
    }

    pub fn primary_timeout(&self) -> Duration {
        Duration::from_millis(self.primary_timeout_ms)
    }

    pub fn script_timeout(&self) -> Duration {
        Duration::from_millis(self.script_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = SnapConfig::from_toml_str("").unwrap();
        assert_eq!(config.queue_capacity, 5);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.backoff_base(), Duration::from_millis(200));
        assert_eq!(config.stale_temp_age(), Duration::from_secs(300));
        assert_eq!(config.primary_timeout(), Duration::from_secs(5));
        assert_eq!(config.script_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snapq.toml");
        std::fs::write(
            &path,
            "data_root = \"/tmp/snapq-data\"\nqueue_capacity = 2\nmax_retries = 4\n",
        )
        .unwrap();

        let config = SnapConfig::from_file(&path).unwrap();
        assert_eq!(config.data_root, PathBuf::from("/tmp/snapq-data"));
        assert_eq!(config.primary_dir(), PathBuf::from("/tmp/snapq-data/screenshots"));
        assert_eq!(
            config.secondary_dir(),
            PathBuf::from("/tmp/snapq-data/extra_screenshots")
        );
        assert_eq!(config.queue_capacity, 2);
        assert_eq!(config.max_retries, 4);
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let err = SnapConfig::from_toml_str("queue_capacity = 0").unwrap_err();
        assert!(matches!(err, ConfigError::NotInRange(_)));
    }

    #[test]
    fn test_rejects_zero_retries() {
        let err = SnapConfig::from_toml_str("max_retries = 0").unwrap_err();
        assert!(matches!(err, ConfigError::NotInRange(_)));
    }

    #[test]
    fn test_rejects_quoted_temp_dir() {
        let err = SnapConfig::from_toml_str("temp_dir = \"/tmp/it's\"").unwrap_err();
        assert!(matches!(err, ConfigError::NotInRange(_)));
        assert!(SnapConfig::from_toml_str("temp_dir = \"/tmp/plain\"").is_ok());
    }

    #[test]
    fn test_rejects_unknown_keys() {
        let err = SnapConfig::from_toml_str("queue_size = 3").unwrap_err();
        assert!(matches!(err, ConfigError::TomlError(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = SnapConfig::from_file(Path::new("/nonexistent/snapq.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }

    #[test]
    #[serial]
    fn test_data_root_env_override() {
        std::env::set_var(DATA_DIR_ENV, "/tmp/snapq-env-root");
        let root = default_data_root();
        std::env::remove_var(DATA_DIR_ENV);
        assert_eq!(root, PathBuf::from("/tmp/snapq-env-root"));
    }
}
