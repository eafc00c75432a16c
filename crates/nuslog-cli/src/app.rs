//! Capture session orchestration
//!
//! Startup order: banner, output folder, scan, device list, optional
//! selection, connections, controller. Shutdown stops every session task
//! after the controller returns.

use std::io::Write;

use nuslog_ble::{BleConnector, BleDiscovery, DiscoveredDevice};
use nuslog_core::{
    CaptureSettings, CommandController, ControllerOutcome, ExitReason, SessionRegistry,
    COMMAND_HELP,
};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::console::spawn_console_reader;
use crate::error::{CliError, Result};
use crate::selection::parse_selection;

/// Capacity of the channel from session tasks to the controller
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Farewell printed once every device is gone
pub const GOODBYE: &str = "All devices are disconnected, goodbye.";

/// Ties configuration, transport and controller together
pub struct CaptureApp {
    config: AppConfig,
}

impl CaptureApp {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Open the adapter and scan for matching peripherals
    pub async fn discover(&self) -> Result<(BleDiscovery, Vec<DiscoveredDevice>)> {
        let discovery = BleDiscovery::initialize(self.config.ble_config()).await?;
        let devices = discovery.scan().await?;
        Ok((discovery, devices))
    }

    /// Run one capture session from scan to shutdown
    pub async fn run_capture(&self, select: bool) -> Result<ControllerOutcome> {
        let settings = self.config.capture_settings();
        print_banner(&settings);
        std::fs::create_dir_all(&settings.output_dir)?;

        let (discovery, devices) = self.discover().await?;
        if devices.is_empty() {
            return Err(CliError::NoPeripherals);
        }
        print_devices(&devices);

        let mut lines = spawn_console_reader();
        let chosen: Vec<&DiscoveredDevice> = if select {
            print!("Select devices (comma-separated indices): ");
            std::io::stdout().flush()?;
            let answer = lines.recv().await.unwrap_or_default();
            let picks = parse_selection(&answer, devices.len())?;
            if picks.is_empty() {
                return Err(CliError::Selection("no device selected".to_string()));
            }
            picks.into_iter().map(|i| &devices[i]).collect()
        } else {
            devices.iter().collect()
        };

        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let mut connector =
            BleConnector::new(discovery.adapter(), discovery.config().clone(), events_tx).await?;

        let mut registry = SessionRegistry::new();
        for device in chosen {
            let index = registry.allocate_index();
            match connector.connect(index, device).await {
                Ok(link) => {
                    println!("Connected to device {}: {}", index, device);
                    registry.register(index, device.identity(), link);
                }
                Err(e) => error!("Skipping {}: {}", device, e),
            }
        }

        if registry.is_empty() {
            connector.shutdown().await;
            return Err(CliError::NoSessions);
        }

        info!("Listening to {} devices", registry.len());
        let controller = CommandController::new(registry, settings);
        let outcome = controller.run(lines, events_rx).await;
        connector.shutdown().await;

        match outcome.reason {
            ExitReason::DevicesDisconnected | ExitReason::AllSessionsLost => {
                println!("{}", GOODBYE)
            }
            ExitReason::ControlEnded => println!("Capture ended, devices disconnected."),
        }
        Ok(outcome)
    }
}

/// Command help and output folder, shown before scanning
pub fn banner(settings: &CaptureSettings) -> String {
    let mut text = String::from("Commands:\n");
    for (command, description) in COMMAND_HELP {
        text.push_str(&format!("  {}  {}\n", command.token(), description));
    }
    text.push_str("  (blank line exits without splitting)\n");
    text.push_str(&format!(
        "Capture files are saved in {}",
        settings.output_dir.display()
    ));
    text
}

fn print_banner(settings: &CaptureSettings) {
    println!("{}", banner(settings));
}

/// One line per discovered device: index, name and address
pub fn device_lines(devices: &[DiscoveredDevice]) -> Vec<String> {
    devices
        .iter()
        .enumerate()
        .map(|(i, device)| format!("[{}] {} {}", i, device.name, device.address))
        .collect()
}

pub fn print_devices(devices: &[DiscoveredDevice]) {
    println!("Found {} devices:", devices.len());
    for line in device_lines(devices) {
        println!("  {}", line);
    }
}
