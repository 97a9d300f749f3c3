// src/motor/channel.rs - Register-level primitives over one drive link
use crate::transport::adu::{FC_READ_HOLDING, FC_WRITE_MULTIPLE, FC_WRITE_SINGLE};
use crate::transport::{Adu, CommError, FrameTransport};

/// One downstream drive: a fixed unit address bound to one serial link.
///
/// Created once at startup and lives for the process lifetime. Every
/// operation is a single blocking request/response exchange; retry policy
/// belongs to the caller.
pub struct MotorChannel {
    unit: u8,
    transport: Box<dyn FrameTransport>,
}

impl MotorChannel {
    pub fn new(unit: u8, transport: Box<dyn FrameTransport>) -> Self {
        Self { unit, transport }
    }

    /// The drive's Modbus unit address on its own link.
    pub fn unit(&self) -> u8 {
        self.unit
    }

    /// Write one 16-bit holding register (function 0x06).
    pub async fn write_register(&mut self, addr: u16, value: u16) -> Result<(), CommError> {
        let request = Adu::new(
            self.unit,
            FC_WRITE_SINGLE,
            encode_words(&[addr, value]),
        );
        self.transport.send(&request).await;
        let response = self.transport.receive().await?;
        check_reply(&request, &response)
    }

    /// Write a 32-bit value across two consecutive registers (function
    /// 0x10), high word at the lower address per the drive's convention.
    pub async fn write_register_u32(&mut self, addr: u16, value: u32) -> Result<(), CommError> {
        let hi = (value >> 16) as u16;
        let lo = (value & 0xFFFF) as u16;
        let mut data = encode_words(&[addr, 2]);
        data.push(4);
        data.extend_from_slice(&encode_words(&[hi, lo]));
        let request = Adu::new(self.unit, FC_WRITE_MULTIPLE, data);
        self.transport.send(&request).await;
        let response = self.transport.receive().await?;
        check_reply(&request, &response)
    }

    /// Read `count` holding registers (function 0x03).
    pub async fn read_registers(&mut self, addr: u16, count: u16) -> Result<Vec<u16>, CommError> {
        let request = Adu::new(self.unit, FC_READ_HOLDING, encode_words(&[addr, count]));
        self.transport.send(&request).await;
        let response = self.transport.receive().await?;
        check_reply(&request, &response)?;
        let payload = &response.data;
        if payload.is_empty() || payload[0] as usize != 2 * count as usize
            || payload.len() != 1 + 2 * count as usize
        {
            return Err(CommError::MalformedResponse);
        }
        Ok(payload[1..]
            .chunks_exact(2)
            .map(|w| (u16::from(w[0]) << 8) | u16::from(w[1]))
            .collect())
    }

    /// Read one 16-bit register.
    pub async fn read_register(&mut self, addr: u16) -> Result<u16, CommError> {
        let words = self.read_registers(addr, 1).await?;
        Ok(words[0])
    }

    /// Read a 32-bit value from two consecutive registers, high word first.
    pub async fn read_register_u32(&mut self, addr: u16) -> Result<u32, CommError> {
        let words = self.read_registers(addr, 2).await?;
        Ok((u32::from(words[0]) << 16) | u32::from(words[1]))
    }

    /// Send an arbitrary frame addressed to this channel's unit and return
    /// the raw response. Used by the gateway bridge and the raw
    /// pass-through commands; the caller owns any unit-id bookkeeping on
    /// the reply.
    pub async fn forward_frame(&mut self, adu: &Adu) -> Result<Adu, CommError> {
        let mut outbound = adu.clone();
        outbound.unit = self.unit;
        self.transport.purge().await;
        self.transport.send(&outbound).await;
        self.transport.receive().await
    }

    /// Drop any stale bytes waiting on the drive link.
    pub async fn purge(&mut self) {
        self.transport.purge().await;
    }
}

fn encode_words(words: &[u16]) -> Vec<u8> {
    let mut out = Vec::with_capacity(words.len() * 2);
    for w in words {
        out.push((w >> 8) as u8);
        out.push((w & 0xFF) as u8);
    }
    out
}

fn check_reply(request: &Adu, response: &Adu) -> Result<(), CommError> {
    if response.unit != request.unit {
        return Err(CommError::MalformedResponse);
    }
    if response.function != request.function {
        // Includes exception responses (function | 0x80).
        return Err(CommError::MalformedResponse);
    }
    Ok(())
}
