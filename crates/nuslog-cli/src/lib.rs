//! nuslog CLI library
//!
//! Components of the `nuslog` binary: argument parsing, configuration, the
//! console reader and capture orchestration over the BLE transport.

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod console;
pub mod error;
pub mod selection;

pub use app::CaptureApp;
pub use cli::{Cli, Commands};
pub use config::AppConfig;
pub use error::{CliError, Result};
