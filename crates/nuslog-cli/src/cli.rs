//! Command-line interface definitions and parsing

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Folder for capture files (overrides the configuration)
    #[arg(short, long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Discovery window in seconds (overrides the configuration)
    #[arg(long, global = true)]
    pub scan_secs: Option<u64>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Connect to matching peripherals and capture their telemetry
    Capture {
        /// Choose which discovered peripherals to connect
        #[arg(short, long)]
        select: bool,
    },
    /// List matching peripherals and exit
    Scan,
    /// Split an existing capture log into left and right files
    Split {
        /// Unified capture log
        input: PathBuf,
        /// Output for rows from left-side devices
        #[arg(long)]
        left: Option<PathBuf>,
        /// Output for rows from right-side devices
        #[arg(long)]
        right: Option<PathBuf>,
    },
    /// Print the configuration file location and an example file
    Config,
}
