//! Telemetry transports
//!
//! Transports receive every snapshot right after the tick that produced it.
//! None of them block: the broadcast channel drops for slow receivers and the
//! log transport only formats a line.

use evsim_core::model::FieldMask;
use evsim_core::{TelemetrySnapshot, TelemetryTransport, TransportError};
use tokio::sync::broadcast;
use tracing::debug;

/// Feeds the broadcast channel behind the SSE stream
pub struct BroadcastTransport {
    tx: broadcast::Sender<TelemetrySnapshot>,
}

impl BroadcastTransport {
    pub fn new(tx: broadcast::Sender<TelemetrySnapshot>) -> Self {
        Self { tx }
    }
}

impl TelemetryTransport for BroadcastTransport {
    fn name(&self) -> &str {
        "broadcast"
    }

    fn publish(&self, snapshot: TelemetrySnapshot) -> Result<(), TransportError> {
        // No receivers is fine; they'll get the next snapshot
        let _ = self.tx.send(snapshot);
        Ok(())
    }
}

/// Logs every Nth snapshot as JSON at debug level
pub struct LogTransport {
    every: u64,
    mask: Option<FieldMask>,
}

impl LogTransport {
    pub fn new(every: u64, fields: Option<&str>) -> Self {
        Self {
            every: every.max(1),
            mask: fields.map(FieldMask::parse),
        }
    }
}

impl TelemetryTransport for LogTransport {
    fn name(&self) -> &str {
        "log"
    }

    fn publish(&self, snapshot: TelemetrySnapshot) -> Result<(), TransportError> {
        if snapshot.sequence % self.every != 0 {
            return Ok(());
        }
        let json = snapshot
            .to_json_filtered(self.mask.as_ref())
            .map_err(|e| TransportError::Failed {
                name: self.name().to_string(),
                reason: e.to_string(),
            })?;
        debug!(target: "evsim::telemetry", "{}", json);
        Ok(())
    }
}
