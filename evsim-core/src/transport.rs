//! Telemetry transport trait definition

use crate::model::TelemetrySnapshot;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport {0} is closed")]
    Closed(String),

    #[error("transport {name} failed: {reason}")]
    Failed { name: String, reason: String },
}

/// Consumer of per-tick snapshots
///
/// The host hands every snapshot to each registered transport right after
/// the tick completes. Implementations must not block: buffer or drop.
pub trait TelemetryTransport: Send + Sync {
    /// Name used in log lines (e.g. "broadcast")
    fn name(&self) -> &str;

    /// Accept one snapshot. Ownership passes to the transport.
    fn publish(&self, snapshot: TelemetrySnapshot) -> Result<(), TransportError>;
}
