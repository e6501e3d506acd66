//! Outbound delivery to the host application.

use std::io::{self, Write};

use super::events::{CameraDevice, HostEvent};

/// Fire-and-forget event sink towards the host.
///
/// Delivery carries no acknowledgment and no backpressure signal; the host
/// is assumed always ready to receive, and a detached host means events are
/// silently dropped, not queued.
pub trait HostBridge: Send + Sync {
    /// Deliver one event. Must not block on the host and must not fail.
    fn notify(&self, event: HostEvent);

    /// Report the enumerable camera options, invoked once per
    /// host-attachment event.
    fn notify_device_list(&self, devices: &[CameraDevice]) {
        self.notify(HostEvent::CameraList(devices.to_vec()));
    }
}

/// Production sink: one JSON object per line on stdout.
pub struct StdoutBridge;

impl HostBridge for StdoutBridge {
    fn notify(&self, event: HostEvent) {
        let line = event.to_wire();
        let mut stdout = io::stdout().lock();
        // Write errors mean the host went away; fire-and-forget drops them.
        let _ = writeln!(stdout, "{}", line);
        let _ = stdout.flush();
    }
}
