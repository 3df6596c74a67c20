//! Helper-program capture strategies and the per-OS priority order.
//!
//! Every strategy here shells out to a screen grabber that ships with (or is
//! commonly installed on) the host OS:
//! - Linux: `grim` and ImageMagick `import` stream PNG to stdout;
//!   `gnome-screenshot` writes to a temp file.
//! - macOS: `screencapture` writes to a temp file; `osascript` drives the same
//!   tool through the scripting host as a second tier.
//! - Windows: a PowerShell script using `System.Drawing` saves to a temp file.
//!
//! Child processes are spawned with `kill_on_drop`, so when the orchestrator
//! gives up on a strategy the helper is terminated instead of left running.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, trace, warn};
use tokio::process::Command;

use super::strategy::{CaptureContext, CaptureStrategy};
use super::validator::{validate_image, MIN_IMAGE_BYTES};
use crate::configuration::config::SnapConfig;
use crate::error_handling::types::StrategyError;

/// Replaced in command arguments by the temp file path.
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

/// How the image bytes come back from the helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquisition {
    /// PNG streamed on stdout.
    Stdout,
    /// PNG written to a temp file named by [`OUTPUT_PLACEHOLDER`].
    TempFile,
}

#[derive(Debug, Clone)]
pub struct CommandStrategy {
    name: String,
    program: String,
    args: Vec<String>,
    acquisition: Acquisition,
    timeout: Duration,
    min_bytes: usize,
    quoted_output: bool,
}

impl CommandStrategy {
    pub fn new(
        name: &str,
        program: &str,
        args: &[&str],
        acquisition: Acquisition,
        timeout: Duration,
    ) -> Self {
        Self {
            name: name.to_string(),
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            acquisition,
            timeout,
            min_bytes: MIN_IMAGE_BYTES,
            quoted_output: false,
        }
    }

    pub fn stdout(name: &str, program: &str, args: &[&str], timeout: Duration) -> Self {
        Self::new(name, program, args, Acquisition::Stdout, timeout)
    }

    pub fn temp_file(name: &str, program: &str, args: &[&str], timeout: Duration) -> Self {
        Self::new(name, program, args, Acquisition::TempFile, timeout)
    }

    /// Overrides the minimum accepted image size.
    pub fn with_min_bytes(mut self, min_bytes: usize) -> Self {
        self.min_bytes = min_bytes;
        self
    }

    /// Marks the placeholder as sitting inside a quoted script literal. Such
    /// strategies refuse temp paths containing quote characters.
    pub fn with_quoted_output(mut self) -> Self {
        self.quoted_output = true;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn acquisition(&self) -> Acquisition {
        self.acquisition
    }

    fn render_args(&self, output: Option<&Path>) -> Vec<String> {
        match output {
            Some(path) => {
                let path = path.to_string_lossy();
                self.args
                    .iter()
                    .map(|a| a.replace(OUTPUT_PLACEHOLDER, &path))
                    .collect()
            }
            None => self.args.clone(),
        }
    }
}

/// Deletes the temp file when dropped, including when the capture future is
/// abandoned by a timeout.
struct TempFileGuard(PathBuf);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.0) {
            Ok(()) => trace!("Removed temp capture {}", self.0.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove temp capture {}: {}", self.0.display(), e),
        }
    }
}

#[async_trait]
impl CaptureStrategy for CommandStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn capture(&self, ctx: &CaptureContext) -> Result<Vec<u8>, StrategyError> {
        let guard = match self.acquisition {
            Acquisition::TempFile => Some(TempFileGuard(ctx.temp_file(&self.name))),
            Acquisition::Stdout => None,
        };
        if let Some(TempFileGuard(path)) = guard.as_ref().filter(|_| self.quoted_output) {
            if has_quote(path) {
                return Err(StrategyError::Failed(format!(
                    "temp path {} cannot be embedded in a {} script",
                    path.display(),
                    self.program
                )));
            }
        }
        let args = self.render_args(guard.as_ref().map(|g| g.0.as_path()));
        debug!("[{}] running {} {:?}", self.name, self.program, args);

        let stdout = match self.acquisition {
            Acquisition::Stdout => Stdio::piped(),
            Acquisition::TempFile => Stdio::null(),
        };
        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => {
                    StrategyError::Unavailable(format!("{} not found", self.program))
                }
                _ => StrategyError::Io(e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StrategyError::Failed(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let bytes = match &guard {
            None => output.stdout,
            Some(TempFileGuard(path)) => tokio::fs::read(path).await.map_err(|e| match e.kind() {
                ErrorKind::NotFound => StrategyError::Failed(format!(
                    "{} produced no output file at {}",
                    self.program,
                    path.display()
                )),
                _ => StrategyError::Io(e),
            })?,
        };

        validate_image(&bytes, self.min_bytes)?;
        debug!("[{}] captured {} byte(s)", self.name, bytes.len());
        Ok(bytes)
    }
}

/// True when `path` contains a character that would close a quoted script
/// literal.
pub fn has_quote(path: &Path) -> bool {
    path.to_string_lossy().contains(['\'', '"'])
}

pub fn linux_strategies(config: &SnapConfig) -> Vec<Arc<dyn CaptureStrategy>> {
    vec![
        Arc::new(CommandStrategy::stdout(
            "grim",
            "grim",
            &["-t", "png", "-"],
            config.primary_timeout(),
        )),
        Arc::new(CommandStrategy::stdout(
            "import",
            "import",
            &["-window", "root", "png:-"],
            config.primary_timeout(),
        )),
        Arc::new(CommandStrategy::temp_file(
            "gnome-screenshot",
            "gnome-screenshot",
            &["-f", OUTPUT_PLACEHOLDER],
            config.script_timeout(),
        )),
    ]
}

pub fn macos_strategies(config: &SnapConfig) -> Vec<Arc<dyn CaptureStrategy>> {
    let script = format!(
        "do shell script \"screencapture -x -t png '{}'\"",
        OUTPUT_PLACEHOLDER
    );
    vec![
        Arc::new(CommandStrategy::temp_file(
            "screencapture",
            "screencapture",
            &["-x", "-t", "png", OUTPUT_PLACEHOLDER],
            config.primary_timeout(),
        )),
        Arc::new(
            CommandStrategy::temp_file(
                "osascript",
                "osascript",
                &["-e", &script],
                config.script_timeout(),
            )
            .with_quoted_output(),
        ),
    ]
}

pub fn windows_strategies(config: &SnapConfig) -> Vec<Arc<dyn CaptureStrategy>> {
    let script = format!(
        "Add-Type -AssemblyName System.Windows.Forms,System.Drawing; \
         $b = [System.Windows.Forms.SystemInformation]::VirtualScreen; \
         $bmp = New-Object System.Drawing.Bitmap $b.Width, $b.Height; \
         $g = [System.Drawing.Graphics]::FromImage($bmp); \
         $g.CopyFromScreen($b.Left, $b.Top, 0, 0, $bmp.Size); \
         $bmp.Save('{}', [System.Drawing.Imaging.ImageFormat]::Png); \
         $g.Dispose(); $bmp.Dispose()",
        OUTPUT_PLACEHOLDER
    );
    vec![Arc::new(
        CommandStrategy::temp_file(
            "powershell",
            "powershell",
            &["-NoProfile", "-NonInteractive", "-Command", &script],
            config.script_timeout(),
        )
        .with_quoted_output(),
    )]
}

/// The fixed strategy order for the OS this binary was built for.
pub fn default_strategies(config: &SnapConfig) -> Vec<Arc<dyn CaptureStrategy>> {
    if cfg!(target_os = "macos") {
        macos_strategies(config)
    } else if cfg!(target_os = "windows") {
        windows_strategies(config)
    } else {
        linux_strategies(config)
    }
}
