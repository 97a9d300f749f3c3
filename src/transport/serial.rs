// src/transport/serial.rs - tokio-serial implementation of FrameTransport
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_serial::{SerialPortBuilderExt, SerialStream};

use super::adu::{extract_frame, Adu, FrameKind};
use super::{CommError, FrameTransport};

/// One physical RS-485 link to a motor drive.
///
/// A background task drains the port into a byte channel; frame assembly
/// happens in [`receive`](FrameTransport::receive) so the response timeout
/// covers the whole frame, not just the first byte.
pub struct SerialTransport {
    writer: WriteHalf<SerialStream>,
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
    buffer: Vec<u8>,
    response_timeout: Duration,
}

impl SerialTransport {
    pub fn open(
        port_name: &str,
        baud: u32,
        response_timeout: Duration,
    ) -> Result<Self, tokio_serial::Error> {
        let port = tokio_serial::new(port_name, baud).open_native_async()?;
        let (reader, writer) = tokio::io::split(port);
        let rx = spawn_reader(reader, port_name.to_string());
        tracing::info!("Opened drive link {} at {} baud", port_name, baud);
        Ok(Self {
            writer,
            rx,
            buffer: Vec::new(),
            response_timeout,
        })
    }

    /// Move everything the reader task has produced into the local buffer.
    fn drain_channel(&mut self) {
        while let Ok(chunk) = self.rx.try_recv() {
            self.buffer.extend_from_slice(&chunk);
        }
    }
}

fn spawn_reader(
    mut reader: ReadHalf<SerialStream>,
    port_name: String,
) -> mpsc::UnboundedReceiver<Vec<u8>> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut chunk = [0u8; 256];
        loop {
            match reader.read(&mut chunk).await {
                Ok(0) => {
                    tracing::info!("Serial link {} closed by remote", port_name);
                    break;
                }
                Ok(n) => {
                    tracing::trace!("Serial RX {}: {} bytes", port_name, n);
                    if tx.send(chunk[..n].to_vec()).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Serial read error on {}: {}", port_name, e);
                    break;
                }
            }
        }
    });
    rx
}

#[async_trait]
impl FrameTransport for SerialTransport {
    async fn send(&mut self, adu: &Adu) {
        let bytes = adu.to_bytes();
        tracing::debug!("Serial TX: {:02X?}", bytes);
        if let Err(e) = self.writer.write_all(&bytes).await {
            tracing::error!("Serial write error: {}", e);
            return;
        }
        let _ = self.writer.flush().await;
    }

    async fn receive(&mut self) -> Result<Adu, CommError> {
        let deadline = tokio::time::Instant::now() + self.response_timeout;
        loop {
            self.drain_channel();
            if let Some(adu) = extract_frame(FrameKind::Response, &mut self.buffer) {
                tracing::debug!("Serial RX frame: unit={} fc={:#04x}", adu.unit, adu.function);
                return Ok(adu);
            }
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return Err(CommError::Timeout);
            }
            match timeout(remaining, self.rx.recv()).await {
                Ok(Some(chunk)) => self.buffer.extend_from_slice(&chunk),
                Ok(None) => return Err(CommError::Timeout),
                Err(_) => return Err(CommError::Timeout),
            }
        }
    }

    async fn purge(&mut self) {
        self.drain_channel();
        if !self.buffer.is_empty() {
            tracing::trace!("Purging {} stale bytes", self.buffer.len());
            self.buffer.clear();
        }
    }
}
