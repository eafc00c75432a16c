//! Command controller tests
//!
//! Drive the controller with console lines and session events against an
//! in-memory link, and check capture state, files on disk and link traffic.

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use nuslog_core::{
    CaptureSettings, CommandController, DeviceIdentity, ExitReason, Flow, Link, LinkError,
    SessionEvent, SessionIndex, SessionRegistry, TelemetryPacket, PACKS_PER_PACKET,
    SAMPLES_PER_PACKET,
};
use tempfile::tempdir;
use tokio::sync::mpsc;

// ----------------------------------------------------------------------------
// Test Utilities
// ----------------------------------------------------------------------------

#[derive(Debug, Default, Clone)]
struct MockLink {
    writes: Arc<Mutex<Vec<Vec<u8>>>>,
    disconnected: Arc<Mutex<bool>>,
}

#[async_trait]
impl Link for MockLink {
    async fn write(&self, data: &[u8]) -> Result<(), LinkError> {
        self.writes.lock().unwrap().push(data.to_vec());
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), LinkError> {
        *self.disconnected.lock().unwrap() = true;
        Ok(())
    }
}

fn fixed_clock() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 7, 18)
        .and_then(|d| d.and_hms_opt(9, 5, 3))
        .unwrap()
}

static TICKS: AtomicU32 = AtomicU32::new(0);

/// Clock advancing one second per reading
fn ticking_clock() -> NaiveDateTime {
    let tick = TICKS.fetch_add(1, Ordering::SeqCst);
    fixed_clock() + chrono::Duration::seconds(i64::from(tick))
}

fn settings(dir: &Path) -> CaptureSettings {
    CaptureSettings {
        output_dir: dir.to_path_buf(),
        log_prefix: "rxdata".to_string(),
    }
}

fn packet(name: &str, base: u32) -> TelemetryPacket {
    let mut packet = TelemetryPacket {
        device_name: name.to_string(),
        timestamps: [0; PACKS_PER_PACKET],
        samples: [0; SAMPLES_PER_PACKET],
    };
    for (i, ts) in packet.timestamps.iter_mut().enumerate() {
        *ts = base + i as u32;
    }
    packet.samples[0] = -1;
    packet
}

fn controller_with_links(
    dir: &Path,
    count: usize,
) -> (CommandController<MockLink>, Vec<MockLink>) {
    let mut registry = SessionRegistry::new();
    let mut links = Vec::new();
    for i in 0..count {
        let link = MockLink::default();
        registry.connect(
            DeviceIdentity::new(format!("IMU{}", i), format!("addr-{}", i)),
            link.clone(),
        );
        links.push(link);
    }
    let controller = CommandController::with_clock(registry, settings(dir), fixed_clock);
    (controller, links)
}

fn line_count(path: &Path) -> usize {
    std::fs::read_to_string(path).unwrap().lines().count()
}

fn packet_event(index: usize, name: &str, base: u32) -> SessionEvent {
    SessionEvent::Packet {
        index: SessionIndex(index),
        packet: packet(name, base),
    }
}

// ----------------------------------------------------------------------------
// Command Tests
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_time_sync_broadcasts_to_every_session() {
    let dir = tempdir().unwrap();
    let (mut controller, links) = controller_with_links(dir.path(), 2);

    assert_eq!(controller.handle_line("TT").await, Flow::Continue);

    for link in &links {
        let writes = link.writes.lock().unwrap();
        assert_eq!(writes.as_slice(), &[b"2024/07/18 09:05:03".to_vec()]);
    }
    assert!(!controller.state().is_logging());
}

#[tokio::test]
async fn test_packets_logged_only_while_active() {
    let dir = tempdir().unwrap();
    let (mut controller, _links) = controller_with_links(dir.path(), 2);

    controller.handle_event(packet_event(0, "IMU0L", 0));
    assert_eq!(controller.stats().packets_discarded, 1);

    controller.handle_line("rr").await;
    let active = controller.state().paths().active.clone();
    assert_eq!(active, dir.path().join("rxdata_20240718_090503.csv"));

    controller.handle_event(packet_event(0, "IMU0L", 100));
    controller.handle_event(packet_event(1, "IMU1R", 200));
    assert_eq!(line_count(&active), 1 + 2 * PACKS_PER_PACKET);

    controller.handle_line("ss").await;
    controller.handle_event(packet_event(0, "IMU0L", 300));
    assert_eq!(line_count(&active), 1 + 2 * PACKS_PER_PACKET);

    let stats = controller.stats();
    assert_eq!(stats.packets_written, 2);
    assert_eq!(stats.rows_written, 2 * PACKS_PER_PACKET as u64);
    assert_eq!(stats.packets_discarded, 2);
    assert_eq!(stats.splits, 1);
}

#[tokio::test]
async fn test_stop_splits_capture() {
    let dir = tempdir().unwrap();
    let (mut controller, _links) = controller_with_links(dir.path(), 3);

    controller.handle_line("rr").await;
    controller.handle_event(packet_event(0, "IMU0L", 0));
    controller.handle_event(packet_event(1, "IMU1R", 0));
    controller.handle_event(packet_event(2, "IMU2X", 0));
    assert_eq!(controller.handle_line("ss").await, Flow::Continue);
    assert!(!controller.state().is_logging());

    let paths = controller.state().paths().clone();
    assert_eq!(paths.left, dir.path().join("20240718_090503_L.csv"));
    assert_eq!(line_count(&paths.left), 1 + PACKS_PER_PACKET);
    assert_eq!(line_count(&paths.right), 1 + PACKS_PER_PACKET);
    let left = std::fs::read_to_string(&paths.left).unwrap();
    assert!(left.lines().skip(1).all(|l| l.starts_with("IMU0L,")));
}

#[tokio::test]
async fn test_stop_without_capture_fails_cleanly() {
    let dir = tempdir().unwrap();
    let (mut controller, _links) = controller_with_links(dir.path(), 1);

    assert_eq!(controller.handle_line("ss").await, Flow::Continue);
    assert_eq!(controller.handle_line("ss").await, Flow::Continue);
    assert_eq!(controller.stats().splits, 0);
    assert!(!controller.state().paths().left.exists());
}

#[tokio::test]
async fn test_restart_rebinds_paths() {
    let dir = tempdir().unwrap();
    let registry: SessionRegistry<MockLink> = SessionRegistry::new();
    let mut controller =
        CommandController::with_clock(registry, settings(dir.path()), ticking_clock);

    controller.handle_line("rr").await;
    let first = controller.state().paths().clone();
    controller.handle_event(packet_event(0, "IMU0L", 0));

    controller.handle_line("rr").await;
    let second = controller.state().paths().clone();
    assert_ne!(first.active, second.active);
    assert!(controller.state().is_logging());

    controller.handle_event(packet_event(0, "IMU0L", 0));
    assert_eq!(line_count(&first.active), 1 + PACKS_PER_PACKET);
    assert_eq!(line_count(&second.active), 1 + PACKS_PER_PACKET);
    // The abandoned capture is never split
    assert!(!first.left.exists());
    assert_eq!(controller.stats().captures_abandoned, 1);
}

#[tokio::test]
async fn test_restart_within_same_second_keeps_file() {
    let dir = tempdir().unwrap();
    let (mut controller, _links) = controller_with_links(dir.path(), 1);

    controller.handle_line("rr").await;
    let first = controller.state().paths().clone();
    controller.handle_event(packet_event(0, "IMU0L", 0));

    controller.handle_line("rr").await;
    assert_eq!(controller.state().paths(), &first);
    assert!(controller.state().is_logging());
    assert_eq!(controller.stats().captures_abandoned, 0);

    controller.handle_event(packet_event(0, "IMU0L", 100));
    assert_eq!(line_count(&first.active), 1 + 2 * PACKS_PER_PACKET);
}

#[tokio::test]
async fn test_disconnect_command_splits_and_disconnects() {
    let dir = tempdir().unwrap();
    let (mut controller, links) = controller_with_links(dir.path(), 2);

    controller.handle_line("rr").await;
    controller.handle_event(packet_event(0, "IMU0L", 0));

    assert_eq!(
        controller.handle_line("dd").await,
        Flow::Exit(ExitReason::DevicesDisconnected)
    );
    assert!(!controller.state().is_logging());
    assert!(controller.registry().is_empty());
    assert!(links.iter().all(|l| *l.disconnected.lock().unwrap()));
    assert!(controller.state().paths().left.exists());
}

#[tokio::test]
async fn test_disconnect_command_while_idle_skips_split() {
    let dir = tempdir().unwrap();
    let (mut controller, _links) = controller_with_links(dir.path(), 1);

    assert_eq!(
        controller.handle_line("dd").await,
        Flow::Exit(ExitReason::DevicesDisconnected)
    );
    assert_eq!(controller.stats().splits, 0);
}

#[tokio::test]
async fn test_blank_line_ends_without_split() {
    let dir = tempdir().unwrap();
    let (mut controller, _links) = controller_with_links(dir.path(), 1);

    controller.handle_line("rr").await;
    controller.handle_event(packet_event(0, "IMU0L", 0));
    assert_eq!(
        controller.handle_line("").await,
        Flow::Exit(ExitReason::ControlEnded)
    );
    assert!(!controller.state().paths().left.exists());
}

#[tokio::test]
async fn test_unknown_input_is_ignored() {
    let dir = tempdir().unwrap();
    let (mut controller, links) = controller_with_links(dir.path(), 1);

    assert_eq!(controller.handle_line("hello").await, Flow::Continue);
    assert!(!controller.state().is_logging());
    assert!(links[0].writes.lock().unwrap().is_empty());
}

// ----------------------------------------------------------------------------
// Session Lifecycle Tests
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_last_disconnect_ends_capture() {
    let dir = tempdir().unwrap();
    let (mut controller, _links) = controller_with_links(dir.path(), 2);

    assert_eq!(
        controller.handle_event(SessionEvent::Disconnected {
            index: SessionIndex(1)
        }),
        Flow::Continue
    );
    assert_eq!(controller.registry().indices(), vec![SessionIndex(0)]);
    // Duplicate reports from the transport change nothing
    assert_eq!(
        controller.handle_event(SessionEvent::Disconnected {
            index: SessionIndex(1)
        }),
        Flow::Continue
    );
    assert_eq!(
        controller.handle_event(SessionEvent::Disconnected {
            index: SessionIndex(0)
        }),
        Flow::Exit(ExitReason::AllSessionsLost)
    );
}

#[tokio::test]
async fn test_run_processes_lines_and_events() {
    let dir = tempdir().unwrap();
    let (controller, links) = controller_with_links(dir.path(), 2);
    let (line_tx, line_rx) = mpsc::channel(8);
    let (event_tx, event_rx) = mpsc::channel(8);

    let handle = tokio::spawn(controller.run(line_rx, event_rx));

    line_tx.send("rr".to_string()).await.unwrap();
    // Give the controller a chance to apply the command before packets arrive
    tokio::task::yield_now().await;
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    event_tx.send(packet_event(0, "IMU0L", 0)).await.unwrap();
    event_tx.send(packet_event(1, "IMU1R", 0)).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    line_tx.send("dd".to_string()).await.unwrap();

    let outcome = handle.await.unwrap();
    assert_eq!(outcome.reason, ExitReason::DevicesDisconnected);
    assert_eq!(outcome.stats.packets_written, 2);
    assert_eq!(outcome.stats.splits, 1);
    assert!(links.iter().all(|l| *l.disconnected.lock().unwrap()));
}

#[tokio::test]
async fn test_run_ends_when_console_closes() {
    let dir = tempdir().unwrap();
    let (controller, links) = controller_with_links(dir.path(), 1);
    let (line_tx, line_rx) = mpsc::channel::<String>(1);
    let (_event_tx, event_rx) = mpsc::channel(1);
    drop(line_tx);

    let outcome = controller.run(line_rx, event_rx).await;
    assert_eq!(outcome.reason, ExitReason::ControlEnded);
    // Remaining sessions are disconnected on the way out
    assert!(*links[0].disconnected.lock().unwrap());
}

#[tokio::test]
async fn test_run_ends_when_all_sessions_lost() {
    let dir = tempdir().unwrap();
    let (controller, _links) = controller_with_links(dir.path(), 1);
    let (_line_tx, line_rx) = mpsc::channel::<String>(1);
    let (event_tx, event_rx) = mpsc::channel(1);

    event_tx
        .send(SessionEvent::Disconnected {
            index: SessionIndex(0),
        })
        .await
        .unwrap();

    let outcome = controller.run(line_rx, event_rx).await;
    assert_eq!(outcome.reason, ExitReason::AllSessionsLost);
}
