//! nuslog configuration management
//!
//! Configuration is read from a TOML file. Lookup order:
//! 1. `--config <path>` when given (the file must exist)
//! 2. `<config dir>/nuslog/config.toml` when it exists
//! 3. Built-in defaults
//!
//! Command line flags are applied on top by the caller.

use std::path::{Path, PathBuf};
use std::time::Duration;

use nuslog_ble::{BleConfig, MIN_WRITE_CHUNK, NUS_SERVICE_UUID};
use nuslog_core::CaptureSettings;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ----------------------------------------------------------------------------
// Application Configuration
// ----------------------------------------------------------------------------

/// Complete configuration for the nuslog binary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub ble: BleSection,
    pub capture: CaptureSection,
}

/// Scan and connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BleSection {
    /// Discovery window in seconds
    pub scan_timeout_secs: u64,
    /// Connection and service discovery timeout in seconds
    pub connection_timeout_secs: u64,
    /// Largest single write in bytes
    pub write_chunk_size: usize,
    /// Service peripherals must advertise
    pub service_uuid: Uuid,
}

/// Where captures are written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSection {
    pub output_dir: PathBuf,
    pub log_prefix: String,
}

// ----------------------------------------------------------------------------
// Default Implementations
// ----------------------------------------------------------------------------

impl Default for BleSection {
    fn default() -> Self {
        Self {
            scan_timeout_secs: 10,
            connection_timeout_secs: 10,
            write_chunk_size: MIN_WRITE_CHUNK,
            service_uuid: NUS_SERVICE_UUID,
        }
    }
}

impl Default for CaptureSection {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("captures"),
            log_prefix: "rxdata".to_string(),
        }
    }
}

// ----------------------------------------------------------------------------
// Configuration Loading Logic
// ----------------------------------------------------------------------------

impl AppConfig {
    /// Load from an explicit path, the default location, or defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }
        match Self::default_config_path() {
            Some(path) if path.exists() => Self::load_from_file(path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::FileSystem(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: AppConfig = toml::from_str(&text).map_err(|e| {
            ConfigError::Loading(format!("Failed to load from {}: {}", path.display(), e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Default configuration file location
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("nuslog").join("config.toml"))
    }

    /// Save configuration to a specific file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::FileSystem(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialization(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path.as_ref(), toml_string)
            .map_err(|e| ConfigError::FileSystem(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Validate the configuration for consistency and correctness
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ble.scan_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "Scan timeout must be greater than 0".to_string(),
            ));
        }
        if self.ble.connection_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "Connection timeout must be greater than 0".to_string(),
            ));
        }
        if self.ble.write_chunk_size == 0 {
            return Err(ConfigError::Validation(
                "Write chunk size must be greater than 0".to_string(),
            ));
        }
        if self.capture.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "Output directory must not be empty".to_string(),
            ));
        }
        if self.capture.log_prefix.contains(std::path::is_separator) {
            return Err(ConfigError::Validation(format!(
                "Log prefix must not contain a path separator: {}",
                self.capture.log_prefix
            )));
        }
        Ok(())
    }

    /// Transport settings for `nuslog-ble`
    pub fn ble_config(&self) -> BleConfig {
        BleConfig::new()
            .with_scan_timeout(Duration::from_secs(self.ble.scan_timeout_secs))
            .with_connection_timeout(Duration::from_secs(self.ble.connection_timeout_secs))
            .with_write_chunk_size(self.ble.write_chunk_size)
            .with_service_uuid(self.ble.service_uuid)
    }

    /// Capture settings for the controller
    pub fn capture_settings(&self) -> CaptureSettings {
        CaptureSettings {
            output_dir: self.capture.output_dir.clone(),
            log_prefix: self.capture.log_prefix.clone(),
        }
    }

    /// Create example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| "# Failed to generate example config".to_string())
    }
}

// ----------------------------------------------------------------------------
// Error Types
// ----------------------------------------------------------------------------

/// Configuration-related errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration loading error: {0}")]
    Loading(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("File system error: {0}")]
    FileSystem(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
