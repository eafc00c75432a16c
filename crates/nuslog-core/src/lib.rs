//! nuslog core
//!
//! Transport-agnostic pieces of the multi-device telemetry capture: the binary
//! packet codec, the CSV capture log, the left/right split, the session
//! registry and the command controller that ties them together.
//!
//! ## Data flow
//!
//! ```text
//! notification bytes -> TelemetryPacket::decode -> SessionEvent::Packet
//!     -> CommandController (logging active?) -> append_rows(capture log)
//!
//! console line -> Command::parse -> CommandController
//!     tt: broadcast time | rr: new capture | ss: split | dd: split + disconnect
//! ```
//!
//! Transports implement [`Link`] for the outbound direction and feed
//! [`SessionEvent`]s to the controller for the inbound one.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod capture_log;
pub mod command;
pub mod controller;
pub mod errors;
pub mod packet;
pub mod paths;
pub mod reconstruct;
pub mod session;
pub mod state;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use capture_log::{append_rows, CAPTURE_HEADER};
pub use command::{Command, COMMAND_HELP};
pub use controller::{
    local_now, CaptureSettings, CaptureStats, Clock, CommandController, ControllerOutcome,
    ExitReason, Flow,
};
pub use errors::{CaptureError, DecodeError, LinkError};
pub use packet::{
    frame_len, CaptureRow, Side, TelemetryPacket, PACKS_PER_PACKET, SAMPLES_PER_PACK,
    SAMPLES_PER_PACKET,
};
pub use paths::{time_sync_message, CapturePaths};
pub use reconstruct::{split_log, SplitSummary};
pub use session::{
    BroadcastReport, DeviceIdentity, DeviceSession, Link, SessionEvent, SessionIndex,
    SessionRegistry,
};
pub use state::CaptureState;
