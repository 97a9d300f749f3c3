// src/host/buffer.rs - Shared inbound buffer: ASCII lines + RTU frames
use crate::transport::adu::{extract_frame, Adu, FrameKind};

/// Inbound bytes from the host port, carrying both newline-terminated
/// ASCII commands and raw RTU frames.
///
/// A line is only split off when every byte before the newline is
/// printable text: 0x0A is a legal byte inside an RTU frame (a read of
/// register 0xF00A carries one in the request), so a bare newline search
/// would tear such a frame apart. Binary prefixes are left in place for
/// [`next_frame`](HostBuffer::next_frame), whose CRC check makes frame
/// detection reliable.
#[derive(Default)]
pub(crate) struct HostBuffer {
    bytes: Vec<u8>,
}

impl HostBuffer {
    pub fn extend(&mut self, chunk: &[u8]) {
        self.bytes.extend_from_slice(chunk);
    }

    /// Next complete ASCII line, if one is buffered.
    pub fn next_line(&mut self) -> Option<String> {
        let newline = self.bytes.iter().position(|&b| b == b'\n')?;
        let printable = self.bytes[..newline]
            .iter()
            .all(|&b| b == b'\r' || (0x20..=0x7E).contains(&b));
        if !printable {
            return None;
        }
        let line: Vec<u8> = self.bytes.drain(..=newline).collect();
        Some(String::from_utf8_lossy(&line).trim_end().to_string())
    }

    /// Next complete CRC-valid RTU request frame, if one is buffered.
    pub fn next_frame(&mut self) -> Option<Adu> {
        extract_frame(FrameKind::Request, &mut self.bytes)
    }
}
