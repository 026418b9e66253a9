use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use smscd::bootstrap::Server;
use smscd::config::Config;
use smscd::telemetry::{init_tracing, TracingConfig};

#[derive(Parser, Debug)]
#[command(name = "smscd")]
#[command(author, version, about = "SMSC simulator for integration testing")]
struct Args {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,

    /// Validate config and exit
    #[arg(long)]
    validate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(&args.config)?;

    let tracing_config = TracingConfig {
        service_name: "smscd".to_string(),
        log_level: config.settings.log_level.clone(),
        json_logs: config.settings.json_logs,
    };

    init_tracing(&tracing_config)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %args.config.display(),
        "starting smscd"
    );

    info!(
        listeners = config.listeners.len(),
        store = %config.store.path.display(),
        "configuration loaded"
    );

    if args.validate {
        info!("configuration is valid");
        return Ok(());
    }

    let server = Server::new(config);
    server.run().await?;

    Ok(())
}
