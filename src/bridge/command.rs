//! Inbound command listener.
//!
//! Reads JSON lines from stdin on a background thread and forwards parsed
//! commands over a channel to the orchestrator.

use std::io::{self, BufRead};
use std::thread;

use serde::Deserialize;
use tokio::sync::mpsc;

/// Commands the host can issue.
#[derive(Debug, Clone, PartialEq)]
pub enum HostCommand {
    /// Start tracking on the given device, superseding any running loop.
    /// This is the sole external trigger; there is no stop command.
    StartTracking { device_id: String },
}

#[derive(Deserialize)]
struct WireCommand {
    cmd: String,
    #[serde(rename = "deviceId")]
    device_id: Option<String>,
}

/// Parse one line of host input.
///
/// Expected form: `{"cmd":"start","deviceId":"0"}`. Empty lines are
/// ignored; anything unparseable is logged and dropped.
pub fn parse_command_line(input: &str) -> Option<HostCommand> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<WireCommand>(trimmed) {
        Ok(wire) if wire.cmd == "start" => match wire.device_id {
            Some(device_id) if !device_id.is_empty() => {
                Some(HostCommand::StartTracking { device_id })
            }
            _ => {
                log::warn!("start command is missing a deviceId");
                None
            }
        },
        Ok(wire) => {
            log::warn!("Unknown host command: {}", wire.cmd);
            None
        }
        Err(e) => {
            log::warn!("Ignoring unparseable host input: {}", e);
            None
        }
    }
}

/// Handle for feeding commands into the orchestrator's channel.
///
/// Returned alongside the receiver so callers (and tests) can inject
/// commands programmatically next to the stdin stream.
pub struct CommandInput {
    tx: mpsc::UnboundedSender<HostCommand>,
}

impl CommandInput {
    /// Start listening for host commands on stdin.
    ///
    /// Spawns a background thread that reads lines until EOF and sends
    /// parsed commands through the returned channel. The channel closes
    /// when stdin does and the handle is dropped.
    pub fn spawn_listener() -> (Self, mpsc::UnboundedReceiver<HostCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let line_tx = tx.clone();

        thread::spawn(move || {
            let stdin = io::stdin();
            let handle = stdin.lock();

            for line in handle.lines() {
                match line {
                    Ok(input) => {
                        if let Some(cmd) = parse_command_line(&input) {
                            if line_tx.send(cmd).is_err() {
                                break; // Orchestrator went away
                            }
                        }
                    }
                    Err(_) => break, // EOF or read error
                }
            }
        });

        (Self { tx }, rx)
    }

    /// Send a command programmatically.
    pub fn send(
        &self,
        command: HostCommand,
    ) -> Result<(), mpsc::error::SendError<HostCommand>> {
        self.tx.send(command)
    }
}
