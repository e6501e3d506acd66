//! Host bridge: structured events out, tracking commands in.
//!
//! The bridge is a thin, replaceable I/O shim. Outbound delivery is
//! fire-and-forget with no acknowledgment or backpressure; inbound commands
//! arrive as JSON lines on stdin.

mod command;
mod events;
mod host;

pub use command::{parse_command_line, CommandInput, HostCommand};
pub use events::{CameraDevice, HostEvent};
pub use host::{HostBridge, StdoutBridge};
