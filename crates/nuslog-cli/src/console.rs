//! Console reader worker
//!
//! Standard input is read on a dedicated OS thread so a blocked read never
//! holds up the async runtime. Lines are forwarded through a bounded channel;
//! end of input drops the sender, which the controller sees as a closed
//! console.

use std::io::BufRead;
use std::thread;

use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Capacity of the console line channel
pub const CONSOLE_CHANNEL_CAPACITY: usize = 16;

/// Start reading lines from standard input
///
/// The thread is detached: it ends on end of input, on a read error, or on
/// the first line after the receiver is gone.
pub fn spawn_console_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(CONSOLE_CHANNEL_CAPACITY);
    let spawned = thread::Builder::new()
        .name("console-reader".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            forward_lines(stdin.lock(), &tx);
        });
    if let Err(e) = spawned {
        warn!("Failed to start console reader: {}", e);
    }
    rx
}

/// Forward every line of `input` until it ends or the receiver is dropped
pub fn forward_lines<R: BufRead>(input: R, tx: &mpsc::Sender<String>) {
    for line in input.lines() {
        match line {
            Ok(line) => {
                if tx.blocking_send(line).is_err() {
                    debug!("Console receiver closed");
                    return;
                }
            }
            Err(e) => {
                warn!("Failed to read console input: {}", e);
                return;
            }
        }
    }
    debug!("Console input ended");
}
