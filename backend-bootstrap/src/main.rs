use anyhow::Result;
use clap::Parser;

use backend_infrastructure::{AppConfig, CONFIG_ENV};

#[derive(Parser, Debug)]
#[command(name = "beacon-backend")]
#[command(about = "Beacon webhook alert receiver", long_about = None)]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(config) = args.config {
        std::env::set_var(CONFIG_ENV, config);
    }

    let config = AppConfig::load().await?;
    let _log_guard = backend_bootstrap::init_logging(&config.log_dir)?;

    backend_bootstrap::run_standalone(config).await
}
