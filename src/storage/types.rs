use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Application phase deciding which queue receives new captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Queue,
    Solutions,
    Debug,
}

impl Mode {
    /// Queue that captures taken in this mode are appended to.
    pub fn queue(self) -> QueueKind {
        match self {
            Mode::Queue => QueueKind::Primary,
            Mode::Solutions | Mode::Debug => QueueKind::Secondary,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Queue => write!(f, "queue"),
            Mode::Solutions => write!(f, "solutions"),
            Mode::Debug => write!(f, "debug"),
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "queue" => Ok(Mode::Queue),
            "solutions" => Ok(Mode::Solutions),
            "debug" => Ok(Mode::Debug),
            other => Err(format!("unknown mode '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueueKind {
    Primary,
    Secondary,
}

/// Which queue(s) a clear operation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueSelector {
    Primary,
    Secondary,
    All,
}

impl QueueSelector {
    pub fn includes(self, kind: QueueKind) -> bool {
        match self {
            QueueSelector::All => true,
            QueueSelector::Primary => kind == QueueKind::Primary,
            QueueSelector::Secondary => kind == QueueKind::Secondary,
        }
    }
}

/// A persisted capture referenced by its on-disk path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub path: PathBuf,
    pub queue: QueueKind,
    /// Store-wide insertion counter.
    pub sequence: u64,
    pub captured_at: DateTime<Utc>,
}

/// Result of a best-effort delete. Never affects control flow; callers may
/// log or count it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    AlreadyAbsent,
    Failed(String),
}

impl DeleteOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, DeleteOutcome::Failed(_))
    }
}
