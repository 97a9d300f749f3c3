// src/transport/mod.rs - Framed serial transport to one Modbus RTU drive
pub mod adu;
pub mod mock;
pub mod serial;

use async_trait::async_trait;
use thiserror::Error;

pub use adu::{Adu, FrameKind};
pub use mock::MockTransport;
pub use serial::SerialTransport;

/// Transport-level failures. These are always surfaced to the caller;
/// no retry happens at this layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CommError {
    #[error("response timed out")]
    Timeout,
    #[error("response checksum mismatch")]
    ChecksumMismatch,
    #[error("malformed response frame")]
    MalformedResponse,
}

/// Point-to-point request/response link to a single downstream device.
///
/// Implementations own the wire-level concerns (byte buffering, CRC,
/// response timeout); callers only ever see whole [`Adu`]s.
#[async_trait]
pub trait FrameTransport: Send {
    /// Write one frame. Queueing failures are not distinguishable from
    /// a dead link, so they surface as [`CommError::Timeout`] on the
    /// following receive.
    async fn send(&mut self, adu: &Adu);

    /// Wait for the next complete frame, up to the configured response
    /// timeout (~500 ms).
    async fn receive(&mut self) -> Result<Adu, CommError>;

    /// Drop any buffered inbound bytes. Run after every command batch so
    /// a late reply cannot be mistaken for the answer to the next request.
    async fn purge(&mut self);
}
