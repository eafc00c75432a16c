//! nuslog - multi-device BLE telemetry capture

use clap::Parser;
use tracing::{error, info};

use nuslog_cli::{
    cli::Cli,
    commands::CommandDispatcher,
    config::AppConfig,
    error::Result,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    setup_logging(cli.verbose);

    // Load configuration
    let config = match load_configuration(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    // Execute the command
    if let Err(e) = CommandDispatcher::execute(cli, config).await {
        error!("{}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Setup logging based on verbosity level
fn setup_logging(verbose: bool) {
    let log_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

/// Load configuration from file or defaults, then apply flag overrides
fn load_configuration(cli: &Cli) -> Result<AppConfig> {
    match &cli.config {
        Some(path) => info!("Loading configuration from: {}", path.display()),
        None => info!("Using default configuration lookup"),
    }
    let mut config = AppConfig::load(cli.config.as_deref())?;

    if let Some(output_dir) = &cli.output_dir {
        config.capture.output_dir = output_dir.clone();
    }
    if let Some(secs) = cli.scan_secs {
        config.ble.scan_timeout_secs = secs;
    }
    config.validate()?;
    Ok(config)
}
