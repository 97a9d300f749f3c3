// src/host/mod.rs - Host-facing serial channel (ASCII lines + RTU frames)
mod buffer;
pub mod mock;
pub mod serial;

use async_trait::async_trait;

use crate::transport::Adu;

pub use mock::MockHostPort;
pub use serial::SerialHostPort;

/// The upstream serial channel to the host machine.
///
/// The same physical port carries newline-terminated ASCII commands and,
/// in gateway mode, raw Modbus RTU frames; which poll the controller runs
/// each cycle depends on the active operating mode. Both polls are
/// non-blocking: `None` means no complete unit has arrived yet.
#[async_trait]
pub trait HostPort: Send {
    /// Next complete `\n`-terminated line, if one is buffered.
    async fn poll_line(&mut self) -> Option<String>;

    /// Next complete CRC-valid RTU request frame, if one is buffered.
    async fn poll_frame(&mut self) -> Option<Adu>;

    /// Write one reply line (newline appended).
    async fn write_line(&mut self, line: &str);

    /// Write one RTU frame back to the host.
    async fn send_frame(&mut self, adu: &Adu);
}
