use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    TomlError(String),
    NotInRange(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::TomlError(e) => write!(f, "TOML parsing error: {}", e),
            ConfigError::NotInRange(e) => write!(f, "Value out of range: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

/// Reason a byte buffer was rejected as an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Shorter than the signature itself.
    TooShort(usize),
    BadSignature,
    /// Signature matched but the payload is implausibly small.
    TooSmall { len: usize, min: usize },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::TooShort(len) => {
                write!(f, "buffer too short for an image signature ({} bytes)", len)
            }
            ValidationError::BadSignature => write!(f, "buffer does not start with a PNG signature"),
            ValidationError::TooSmall { len, min } => {
                write!(f, "image is suspiciously small ({} bytes, minimum {})", len, min)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Failure of a single capture strategy. Always recovered by the orchestrator.
#[derive(Debug)]
pub enum StrategyError {
    /// The helper program or OS facility does not exist on this host.
    Unavailable(String),
    Failed(String),
    Invalid(ValidationError),
    TimedOut(Duration),
    Io(std::io::Error),
}

impl fmt::Display for StrategyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyError::Unavailable(e) => write!(f, "capture facility unavailable: {}", e),
            StrategyError::Failed(e) => write!(f, "capture failed: {}", e),
            StrategyError::Invalid(e) => write!(f, "invalid capture output: {}", e),
            StrategyError::TimedOut(d) => write!(f, "timed out after {} ms", d.as_millis()),
            StrategyError::Io(e) => write!(f, "capture IO error: {}", e),
        }
    }
}

impl std::error::Error for StrategyError {}

impl From<std::io::Error> for StrategyError {
    fn from(err: std::io::Error) -> Self {
        StrategyError::Io(err)
    }
}

impl StrategyError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StrategyError::Unavailable(_))
    }
}

impl From<ValidationError> for StrategyError {
    fn from(err: ValidationError) -> Self {
        StrategyError::Invalid(err)
    }
}

/// One entry of the diagnostic trail returned when every attempt fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptFailure {
    pub strategy: String,
    pub attempt: u32,
    pub message: String,
    /// The strategy's facility was missing rather than failing at runtime.
    pub unavailable: bool,
}

impl AttemptFailure {
    pub fn new(strategy: &str, attempt: u32, error: &StrategyError) -> Self {
        Self {
            strategy: strategy.to_string(),
            attempt,
            message: error.to_string(),
            unavailable: error.is_unavailable(),
        }
    }
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[attempt {}] {}: {}", self.attempt, self.strategy, self.message)
    }
}

#[derive(Debug)]
pub enum StorageError {
    CreateDirFailed { path: PathBuf, source: std::io::Error },
    WriteFailed { path: PathBuf, source: std::io::Error },
    ReadFailed { path: PathBuf, source: std::io::Error },
    DeleteFailed { path: PathBuf, source: std::io::Error },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::CreateDirFailed { path, source } => {
                write!(f, "Failed to create directory {}: {}", path.display(), source)
            }
            StorageError::WriteFailed { path, source } => {
                write!(f, "Storage write failed for {}: {}", path.display(), source)
            }
            StorageError::ReadFailed { path, source } => {
                write!(f, "Storage read failed for {}: {}", path.display(), source)
            }
            StorageError::DeleteFailed { path, source } => {
                write!(f, "Storage delete failed for {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::CreateDirFailed { source, .. }
            | StorageError::WriteFailed { source, .. }
            | StorageError::ReadFailed { source, .. }
            | StorageError::DeleteFailed { source, .. } => Some(source),
        }
    }
}

#[derive(Debug)]
pub enum CaptureError {
    /// Every strategy failed in every attempt round.
    Exhausted {
        attempts: u32,
        failures: Vec<AttemptFailure>,
    },
    Storage(StorageError),
}

impl CaptureError {
    /// True when no strategy ever got past "facility unavailable", as opposed to
    /// transient failures such as timeouts.
    pub fn no_capture_mechanism(&self) -> bool {
        match self {
            CaptureError::Exhausted { failures, .. } => {
                !failures.is_empty() && failures.iter().all(|f| f.unavailable)
            }
            _ => false,
        }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::Exhausted { attempts, failures } => {
                write!(f, "Screen capture failed after {} attempt(s)", attempts)?;
                for failure in failures {
                    write!(f, "; {}", failure)?;
                }
                Ok(())
            }
            CaptureError::Storage(e) => write!(f, "Capture storage error: {}", e),
        }
    }
}

impl std::error::Error for CaptureError {}

impl From<StorageError> for CaptureError {
    fn from(err: StorageError) -> Self {
        CaptureError::Storage(err)
    }
}
