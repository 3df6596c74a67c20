//! Retrying capture driver.
//!
//! One call to [`CaptureOrchestrator::capture`] sweeps the scratch directory
//! once, then runs up to `max_retries` attempt rounds. A round tries every
//! strategy in priority order, each under its own timeout; the first validated
//! buffer ends the whole call. Between failed rounds the orchestrator sleeps
//! `backoff_base * 2^(round - 1)`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};

use super::cleaner::clean_stale;
use super::platform::default_strategies;
use super::strategy::{CaptureContext, CaptureStrategy};
use super::validator::{validate_image, MIN_IMAGE_BYTES};
use crate::configuration::config::SnapConfig;
use crate::error_handling::types::{AttemptFailure, CaptureError, StrategyError};

pub struct CaptureOrchestrator {
    strategies: Vec<Arc<dyn CaptureStrategy>>,
    temp_dir: PathBuf,
    max_retries: u32,
    backoff_base: Duration,
    stale_temp_age: Duration,
}

impl CaptureOrchestrator {
    /// Orchestrator over the platform's default strategy order.
    pub fn from_config(config: &SnapConfig) -> Self {
        Self::with_strategies(config, default_strategies(config))
    }

    pub fn with_strategies(config: &SnapConfig, strategies: Vec<Arc<dyn CaptureStrategy>>) -> Self {
        Self {
            strategies,
            temp_dir: config.temp_dir.clone(),
            max_retries: config.max_retries.max(1),
            backoff_base: config.backoff_base(),
            stale_temp_age: config.stale_temp_age(),
        }
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Delay slept after failed round `attempt` (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff_base
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }

    pub async fn capture(&self) -> Result<Vec<u8>, CaptureError> {
        match clean_stale(&self.temp_dir, self.stale_temp_age) {
            Ok(report) if report.removed > 0 => {
                debug!("Swept {} stale temp file(s)", report.removed)
            }
            Ok(_) => {}
            // Stdout strategies never touch the scratch dir; file-mediated
            // ones will report their own failure below.
            Err(e) => warn!(
                "Temp sweep of {} failed, continuing: {}",
                self.temp_dir.display(),
                e
            ),
        }

        let ctx = CaptureContext::new(&self.temp_dir);
        let mut failures: Vec<AttemptFailure> = Vec::new();

        for attempt in 1..=self.max_retries {
            for strategy in &self.strategies {
                match run_with_timeout(strategy.as_ref(), &ctx).await {
                    Ok(bytes) => {
                        info!(
                            "Captured screen via {} on attempt {} ({} bytes)",
                            strategy.name(),
                            attempt,
                            bytes.len()
                        );
                        return Ok(bytes);
                    }
                    Err(e) => {
                        debug!("[attempt {}] {} failed: {}", attempt, strategy.name(), e);
                        failures.push(AttemptFailure::new(strategy.name(), attempt, &e));
                    }
                }
            }

            if attempt < self.max_retries {
                let delay = self.backoff_for(attempt);
                warn!(
                    "Capture attempt {}/{} failed, retrying in {} ms",
                    attempt,
                    self.max_retries,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }
        }

        error!(
            "Screen capture exhausted {} attempt(s) with {} failure(s)",
            self.max_retries,
            failures.len()
        );
        Err(CaptureError::Exhausted {
            attempts: self.max_retries,
            failures,
        })
    }
}

/// Runs one strategy under its timeout. The strategy future is dropped when
/// the timer wins, which kills helper processes spawned with `kill_on_drop`.
async fn run_with_timeout(
    strategy: &dyn CaptureStrategy,
    ctx: &CaptureContext,
) -> Result<Vec<u8>, StrategyError> {
    let limit = strategy.timeout();
    let bytes = tokio::time::timeout(limit, strategy.capture(ctx))
        .await
        .map_err(|_| StrategyError::TimedOut(limit))??;
    validate_image(&bytes, MIN_IMAGE_BYTES)?;
    Ok(bytes)
}
