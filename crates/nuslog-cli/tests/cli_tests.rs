//! Argument parsing and offline command tests

use std::path::PathBuf;

use clap::Parser;
use nuslog_cli::commands::CommandDispatcher;
use nuslog_cli::{AppConfig, Cli, CliError, Commands};
use nuslog_core::{append_rows, CaptureRow};
use tempfile::tempdir;

fn row(name: &str, timestamp: u32) -> CaptureRow {
    CaptureRow {
        device_name: name.to_string(),
        timestamp,
        samples: [1, -2, 3, -4, 5, -6],
    }
}

#[test]
fn test_parse_capture_defaults() {
    let cli = Cli::try_parse_from(["nuslog", "capture"]).unwrap();
    assert_eq!(cli.command, Commands::Capture { select: false });
    assert!(!cli.verbose);
    assert!(cli.config.is_none());
    assert!(cli.output_dir.is_none());
}

#[test]
fn test_parse_global_overrides_after_subcommand() {
    let cli = Cli::try_parse_from([
        "nuslog",
        "capture",
        "--select",
        "-v",
        "--output-dir",
        "runs",
        "--scan-secs",
        "5",
    ])
    .unwrap();
    assert_eq!(cli.command, Commands::Capture { select: true });
    assert!(cli.verbose);
    assert_eq!(cli.output_dir, Some(PathBuf::from("runs")));
    assert_eq!(cli.scan_secs, Some(5));
}

#[test]
fn test_parse_split() {
    let cli = Cli::try_parse_from(["nuslog", "split", "log.csv", "--left", "l.csv"]).unwrap();
    assert_eq!(
        cli.command,
        Commands::Split {
            input: PathBuf::from("log.csv"),
            left: Some(PathBuf::from("l.csv")),
            right: None,
        }
    );
}

#[test]
fn test_missing_subcommand_rejected() {
    assert!(Cli::try_parse_from(["nuslog"]).is_err());
    assert!(Cli::try_parse_from(["nuslog", "split"]).is_err());
}

#[tokio::test]
async fn test_split_command_writes_side_files() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("rxdata_20240718_090503.csv");
    append_rows(&input, &[row("IMU_L", 1), row("IMU_R", 1), row("IMU_L", 2)]).unwrap();

    let cli = Cli::try_parse_from(["nuslog", "split", input.to_str().unwrap()]).unwrap();
    CommandDispatcher::execute(cli, AppConfig::default())
        .await
        .unwrap();

    let left = std::fs::read_to_string(dir.path().join("20240718_090503_L.csv")).unwrap();
    let right = std::fs::read_to_string(dir.path().join("20240718_090503_R.csv")).unwrap();
    assert_eq!(left.lines().count(), 3);
    assert_eq!(right.lines().count(), 2);
    assert!(left.starts_with("Device Name,miliBuffer,"));
}

#[tokio::test]
async fn test_split_command_missing_input_fails() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("absent.csv");

    let cli = Cli::try_parse_from(["nuslog", "split", input.to_str().unwrap()]).unwrap();
    let result = CommandDispatcher::execute(cli, AppConfig::default()).await;
    assert!(matches!(result, Err(CliError::Capture(_))));
    assert!(!dir.path().join("absent_L.csv").exists());
}
