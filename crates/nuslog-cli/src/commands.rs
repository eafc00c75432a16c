//! Command handlers for the nuslog CLI

use std::path::{Path, PathBuf};

use nuslog_core::{split_log, CapturePaths, Side, SplitSummary};
use tracing::info;

use crate::app::{print_devices, CaptureApp};
use crate::cli::{Cli, Commands};
use crate::config::AppConfig;
use crate::error::Result;

/// Command dispatcher for handling CLI commands
pub struct CommandDispatcher;

impl CommandDispatcher {
    /// Execute a CLI command
    pub async fn execute(cli: Cli, config: AppConfig) -> Result<()> {
        match cli.command {
            Commands::Capture { select } => Self::handle_capture_command(config, select).await,
            Commands::Scan => Self::handle_scan_command(config).await,
            Commands::Split { input, left, right } => {
                Self::handle_split_command(&config, &input, left, right)
            }
            Commands::Config => {
                Self::handle_config_command();
                Ok(())
            }
        }
    }

    /// Handle the capture command
    async fn handle_capture_command(config: AppConfig, select: bool) -> Result<()> {
        let app = CaptureApp::new(config);
        let outcome = app.run_capture(select).await?;
        info!(
            "Session summary: {} packets written, {} splits",
            outcome.stats.packets_written, outcome.stats.splits
        );
        Ok(())
    }

    /// Handle the scan command
    async fn handle_scan_command(config: AppConfig) -> Result<()> {
        let app = CaptureApp::new(config);
        let (_discovery, devices) = app.discover().await?;
        if devices.is_empty() {
            println!("No matching peripherals found");
        } else {
            print_devices(&devices);
        }
        Ok(())
    }

    /// Handle the split command
    fn handle_split_command(
        config: &AppConfig,
        input: &Path,
        left: Option<PathBuf>,
        right: Option<PathBuf>,
    ) -> Result<()> {
        let paths = split_targets(config, input, left, right);
        let summary = split_log(&paths.active, &paths.left, &paths.right)?;
        print_split_summary(&paths, &summary);
        Ok(())
    }

    /// Handle the config command
    fn handle_config_command() {
        match AppConfig::default_config_path() {
            Some(path) => println!("# Configuration file: {}", path.display()),
            None => println!("# No configuration directory on this platform"),
        }
        println!("{}", AppConfig::example_config());
    }
}

/// Output paths for an offline split, explicit paths taking precedence
pub fn split_targets(
    config: &AppConfig,
    input: &Path,
    left: Option<PathBuf>,
    right: Option<PathBuf>,
) -> CapturePaths {
    let mut paths = CapturePaths::for_existing_log(input, &config.capture.log_prefix);
    if let Some(left) = left {
        paths.left = left;
    }
    if let Some(right) = right {
        paths.right = right;
    }
    paths
}

fn print_split_summary(paths: &CapturePaths, summary: &SplitSummary) {
    for (side, rows) in [(Side::Left, summary.left), (Side::Right, summary.right)] {
        println!(
            "{} {} rows saved to {}",
            rows,
            side.suffix(),
            paths.split_path(side).display()
        );
    }
    if summary.dropped > 0 {
        println!(
            "{} rows without an L/R device name suffix were skipped",
            summary.dropped
        );
    }
}
