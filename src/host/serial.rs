// src/host/serial.rs - tokio-serial implementation of HostPort
use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::mpsc;
use tokio_serial::{SerialPortBuilderExt, SerialStream};

use super::buffer::HostBuffer;
use super::HostPort;
use crate::transport::Adu;

/// Host-side serial port. A background task drains inbound bytes into a
/// channel; line and frame extraction happen on demand so ASCII and RTU
/// traffic can share one buffer (see [`HostBuffer`] for the split rules).
pub struct SerialHostPort {
    writer: WriteHalf<SerialStream>,
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
    buffer: HostBuffer,
}

impl SerialHostPort {
    pub fn open(port_name: &str, baud: u32) -> Result<Self, tokio_serial::Error> {
        let port = tokio_serial::new(port_name, baud).open_native_async()?;
        let (reader, writer) = tokio::io::split(port);
        let rx = spawn_reader(reader, port_name.to_string());
        tracing::info!("Opened host link {} at {} baud", port_name, baud);
        Ok(Self {
            writer,
            rx,
            buffer: HostBuffer::default(),
        })
    }

    fn drain_channel(&mut self) {
        while let Ok(chunk) = self.rx.try_recv() {
            self.buffer.extend(&chunk);
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
                    tracing::info!("Host link {} closed", port_name);
                    break;
                }
                Ok(n) => {
                    if tx.send(chunk[..n].to_vec()).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Host read error on {}: {}", port_name, e);
                    break;
                }
            }
        }
    });
    rx
}

#[async_trait]
impl HostPort for SerialHostPort {
    async fn poll_line(&mut self) -> Option<String> {
        self.drain_channel();
        let text = self.buffer.next_line()?;
        tracing::debug!("Host RX line: {}", text);
        Some(text)
    }

    async fn poll_frame(&mut self) -> Option<Adu> {
        self.drain_channel();
        let adu = self.buffer.next_frame()?;
        tracing::debug!("Host RX frame: unit={} fc={:#04x}", adu.unit, adu.function);
        Some(adu)
    }

    async fn write_line(&mut self, line: &str) {
        let mut out = line.as_bytes().to_vec();
        out.push(b'\n');
        if let Err(e) = self.writer.write_all(&out).await {
            tracing::error!("Host write error: {}", e);
            return;
        }
        let _ = self.writer.flush().await;
    }

    async fn send_frame(&mut self, adu: &Adu) {
        let bytes = adu.to_bytes();
        tracing::debug!("Host TX frame: {:02X?}", bytes);
        if let Err(e) = self.writer.write_all(&bytes).await {
            tracing::error!("Host write error: {}", e);
            return;
        }
        let _ = self.writer.flush().await;
    }
}
