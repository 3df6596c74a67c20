//! Screen acquisition
//!
//! Components:
//! - `validator`: PNG signature and minimum-size checks.
//! - `cleaner`: sweeps stale files from the scratch directory.
//! - `strategy`: the `CaptureStrategy` trait and its per-capture context.
//! - `platform`: helper-program strategies and the per-OS priority order.
//! - `orchestrator`: timeouts, fallback and backoff across attempt rounds.

pub mod cleaner;
pub mod orchestrator;
pub mod platform;
pub mod strategy;
pub mod validator;

pub use cleaner::{clean_stale, CleanupReport};
pub use orchestrator::CaptureOrchestrator;
pub use platform::{default_strategies, Acquisition, CommandStrategy};
pub use strategy::{CaptureContext, CaptureStrategy};
pub use validator::{is_valid_image, validate_image, MIN_IMAGE_BYTES, PNG_SIGNATURE};
