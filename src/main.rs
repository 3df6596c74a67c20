use clap::Parser;
use log::{error, info, warn};
use snapq::configuration::config::SnapConfig;
use snapq::service::ScreenshotService;
use snapq::storage::types::Mode;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Runs a screenshot session driven by commands on stdin, one per line:
/// `capture`, `mode <queue|solutions|debug>`, `list`, `preview <path>`,
/// `remove <path>`, `clear-secondary`, `clear-all`, `quit`.
#[derive(Parser)]
#[command(name = "snapq")]
#[command(version)]
#[command(about = "Screen capture with bounded on-disk screenshot queues")]
struct Args {
    /// TOML configuration file; defaults apply when omitted
    #[arg(long, env = "SNAPQ_CONFIG")]
    config: Option<PathBuf>,

    /// Initial mode: queue, solutions or debug
    #[arg(long, default_value = "queue")]
    mode: Mode,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SnapConfig::from_file(path).unwrap_or_else(|e| {
            error!("Unable to import configuration from {}: {}", path.display(), e);
            std::process::exit(1);
        }),
        None => {
            let config = SnapConfig::default();
            if let Err(e) = config.validate() {
                error!("Default configuration is unusable: {}", e);
                std::process::exit(1);
            }
            config
        }
    };
    info!("Using data root {}", config.data_root.display());

    let service = ScreenshotService::from_config(&config, args.mode).unwrap_or_else(|e| {
        error!("Unable to create the screenshot service: {}", e);
        std::process::exit(1);
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read command: {}", e);
                std::process::exit(1);
            }
        };
        let (command, arg) = match line.trim().split_once(' ') {
            Some((c, a)) => (c, a.trim()),
            None => (line.trim(), ""),
        };
        match command {
            "" => {}
            "quit" | "exit" => break,
            "capture" => match service.capture().await {
                Ok(path) => println!("{}", path.display()),
                Err(e) => {
                    if e.no_capture_mechanism() {
                        error!("No screen capture tool is available on this system");
                    }
                    error!("{}", e);
                }
            },
            "mode" => match arg.parse::<Mode>() {
                Ok(mode) => service.set_mode(mode),
                Err(e) => warn!("{}", e),
            },
            "list" => {
                let listing = serde_json::json!({
                    "mode": service.get_mode(),
                    "primary": service.list_primary(),
                    "secondary": service.list_secondary(),
                });
                match serde_json::to_string_pretty(&listing) {
                    Ok(s) => println!("{}", s),
                    Err(e) => error!("Failed to render listing: {}", e),
                }
            }
            "preview" => match service.preview(Path::new(arg)).await {
                Ok(Some(uri)) => println!("{}", uri),
                Ok(None) => warn!("{} does not exist", arg),
                Err(e) => error!("{}", e),
            },
            "remove" => match service.remove(Path::new(arg)) {
                Ok(outcome) => info!("Remove {}: {:?}", arg, outcome),
                Err(e) => error!("{}", e),
            },
            "clear-secondary" => {
                info!("Cleared {} artifact(s)", service.clear_secondary());
            }
            "clear-all" => {
                info!("Cleared {} artifact(s)", service.clear_all());
            }
            other => warn!("Unknown command '{}'", other),
        }
    }

    info!("Session ended");
}
