//! Command controller
//!
//! The controller is the only owner of [`CaptureState`], the
//! [`SessionRegistry`] and the capture files. It consumes two inputs in one
//! loop: console lines and [`SessionEvent`]s from the per-session tasks. Since
//! every state change and every file write happens inside this loop, a packet
//! is always written under the state that was current when it was dequeued,
//! and a disconnect can never interrupt a half-written append.

use std::path::PathBuf;

use chrono::{Local, NaiveDateTime};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::capture_log::append_rows;
use crate::command::Command;
use crate::packet::TelemetryPacket;
use crate::paths::{time_sync_message, CapturePaths};
use crate::reconstruct::{split_log, SplitSummary};
use crate::session::{Link, SessionEvent, SessionIndex, SessionRegistry};
use crate::state::CaptureState;

// ----------------------------------------------------------------------------
// Controller Types
// ----------------------------------------------------------------------------

/// Source of local wall-clock time
pub type Clock = fn() -> NaiveDateTime;

/// Current local time without offset
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Where capture files are placed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSettings {
    pub output_dir: PathBuf,
    pub log_prefix: String,
}

/// Why the controller stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// Blank line or end of console input
    ControlEnded,
    /// `dd` disconnected every device
    DevicesDisconnected,
    /// The last session was lost
    AllSessionsLost,
}

/// Whether the controller keeps running after a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit(ExitReason),
}

/// Counters kept over the controller's lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub packets_written: u64,
    pub rows_written: u64,
    pub packets_discarded: u64,
    pub write_failures: u64,
    pub splits: u64,
    /// Captures left un-split by a restart
    pub captures_abandoned: u64,
}

/// Final result of [`CommandController::run`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOutcome {
    pub reason: ExitReason,
    pub stats: CaptureStats,
}

// ----------------------------------------------------------------------------
// Controller
// ----------------------------------------------------------------------------

pub struct CommandController<L> {
    registry: SessionRegistry<L>,
    state: CaptureState,
    settings: CaptureSettings,
    clock: Clock,
    stats: CaptureStats,
}

impl<L: Link> CommandController<L> {
    /// Create a controller over connected sessions, with logging inactive
    pub fn new(registry: SessionRegistry<L>, settings: CaptureSettings) -> Self {
        Self::with_clock(registry, settings, local_now)
    }

    /// Create a controller reading time from `clock`
    pub fn with_clock(
        registry: SessionRegistry<L>,
        settings: CaptureSettings,
        clock: Clock,
    ) -> Self {
        let initial = CapturePaths::at(&settings.output_dir, &settings.log_prefix, clock());
        Self {
            registry,
            state: CaptureState::new(initial),
            settings,
            clock,
            stats: CaptureStats::default(),
        }
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn registry(&self) -> &SessionRegistry<L> {
        &self.registry
    }

    pub fn stats(&self) -> CaptureStats {
        self.stats
    }

    /// Run until a command, the console or the transport ends the capture
    ///
    /// Sessions still connected when the loop ends are disconnected.
    pub async fn run(
        mut self,
        mut lines: mpsc::Receiver<String>,
        mut events: mpsc::Receiver<SessionEvent>,
    ) -> ControllerOutcome {
        info!("Command controller running with {} sessions", self.registry.len());

        let reason = loop {
            let flow = tokio::select! {
                line = lines.recv() => match line {
                    Some(line) => self.handle_line(&line).await,
                    None => {
                        info!("Console input closed");
                        Flow::Exit(ExitReason::ControlEnded)
                    }
                },
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => {
                        info!("All session tasks have ended");
                        Flow::Exit(ExitReason::AllSessionsLost)
                    }
                },
            };

            if let Flow::Exit(reason) = flow {
                break reason;
            }
        };

        if !self.registry.is_empty() {
            self.registry.disconnect_all().await;
        }

        info!(
            "Capture finished: {} packets ({} rows) written, {} discarded, {} write failures",
            self.stats.packets_written,
            self.stats.rows_written,
            self.stats.packets_discarded,
            self.stats.write_failures
        );

        ControllerOutcome {
            reason,
            stats: self.stats,
        }
    }

    /// Interpret one console line; unknown input is ignored
    pub async fn handle_line(&mut self, line: &str) -> Flow {
        match Command::parse(line) {
            Some(command) => self.execute(command).await,
            None => {
                debug!("Ignoring console input {:?}", line);
                Flow::Continue
            }
        }
    }

    pub async fn execute(&mut self, command: Command) -> Flow {
        match command {
            Command::TimeSync => {
                let message = time_sync_message((self.clock)());
                let report = self.registry.broadcast(message.as_bytes()).await;
                info!(
                    "Sent current date and time {} to {} devices",
                    message,
                    report.delivered.len()
                );
                Flow::Continue
            }
            Command::StartLogging => {
                let paths = self.fresh_paths();
                info!("Start logging data to {}", paths.active.display());
                if let Some(abandoned) = self.state.start(paths) {
                    self.stats.captures_abandoned += 1;
                    warn!(
                        "Logging restarted; {} was not split",
                        abandoned.active.display()
                    );
                }
                Flow::Continue
            }
            Command::StopLogging => {
                self.state.stop();
                info!("Stop logging data");
                self.reconstruct().await;
                Flow::Continue
            }
            Command::Disconnect => {
                if self.state.stop() {
                    self.reconstruct().await;
                }
                info!("Disconnecting all devices");
                for session in self.registry.disconnect_all().await {
                    info!("Disconnected device {}: {}", session.index, session.identity);
                }
                Flow::Exit(ExitReason::DevicesDisconnected)
            }
            Command::Quit => Flow::Exit(ExitReason::ControlEnded),
        }
    }

    /// Apply one message from a session task
    pub fn handle_event(&mut self, event: SessionEvent) -> Flow {
        match event {
            SessionEvent::Packet { index, packet } => {
                self.record(index, &packet);
                Flow::Continue
            }
            SessionEvent::Disconnected { index } => {
                self.registry.on_disconnect(index);
                if self.registry.is_empty() {
                    info!("All devices are disconnected");
                    if self.state.is_logging() {
                        warn!(
                            "Capture {} was not split",
                            self.state.paths().active.display()
                        );
                    }
                    Flow::Exit(ExitReason::AllSessionsLost)
                } else {
                    Flow::Continue
                }
            }
        }
    }

    fn record(&mut self, index: SessionIndex, packet: &TelemetryPacket) {
        let Some(path) = self.state.sink().map(|p| p.to_path_buf()) else {
            self.stats.packets_discarded += 1;
            return;
        };

        match append_rows(&path, &packet.rows()) {
            Ok(rows) => {
                self.stats.packets_written += 1;
                self.stats.rows_written += rows as u64;
            }
            Err(e) => {
                error!("Failed to log packet from session {}: {}", index, e);
                self.stats.write_failures += 1;
            }
        }
    }

    /// Split the current capture on the blocking pool and wait for it
    async fn reconstruct(&mut self) -> Option<SplitSummary> {
        let paths = self.state.paths().clone();
        let job = paths.clone();
        let result =
            tokio::task::spawn_blocking(move || split_log(&job.active, &job.left, &job.right))
                .await;
        match result {
            Ok(Ok(summary)) => {
                self.stats.splits += 1;
                info!(
                    "Saved {} left rows to {} and {} right rows to {}",
                    summary.left,
                    paths.left.display(),
                    summary.right,
                    paths.right.display()
                );
                if summary.dropped > 0 {
                    warn!(
                        "{} rows without an L/R device name suffix were not split",
                        summary.dropped
                    );
                }
                Some(summary)
            }
            Ok(Err(e)) => {
                warn!("Could not split {}: {}", paths.active.display(), e);
                None
            }
            Err(e) => {
                error!("Split task for {} failed: {}", paths.active.display(), e);
                None
            }
        }
    }

    fn fresh_paths(&self) -> CapturePaths {
        CapturePaths::at(
            &self.settings.output_dir,
            &self.settings.log_prefix,
            (self.clock)(),
        )
    }
}
