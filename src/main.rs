use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use lab_scan_api::config::{detect_scanner_path, ScanConfig, ServerConfig};
use lab_scan_api::server;

/// lab-scan-api — HTTP front end around nmap for lab training environments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "lab-scan-api",
    version,
    about = "HTTP front end around nmap with a fallback scan cascade and simulated exploitation reports.",
    long_about = None
)]
struct Cli {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:5000")]
    bind: String,

    /// Shared secret for the X-API-Key header. Defaults to $SIM_API_KEY;
    /// pass an empty string to disable authentication.
    #[arg(long)]
    api_key: Option<String>,

    /// Path to the nmap binary. Defaults to /usr/bin/nmap when present,
    /// otherwise resolved from PATH.
    #[arg(long)]
    scanner_path: Option<String>,

    /// Directory of static UI assets.
    #[arg(long, default_value = "ui")]
    ui_dir: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let api_key = cli
        .api_key
        .or_else(|| std::env::var("SIM_API_KEY").ok())
        .unwrap_or_default();

    let scan = ScanConfig {
        scanner_path: cli.scanner_path.unwrap_or_else(detect_scanner_path),
        ..ScanConfig::default()
    };
    let cfg = ServerConfig {
        api_key: None,
        ui_dir: cli.ui_dir,
        scan,
    }
    .with_api_key(api_key);

    tracing::info!(
        scanner = %cfg.scan.scanner_path,
        auth = cfg.api_key.is_some(),
        "configuration loaded"
    );

    server::serve(&cli.bind, cfg).await
}
