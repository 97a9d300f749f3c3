//! Modbus RTU application data unit: encode, decode, CRC.

use super::CommError;

/// Read Holding Registers
pub const FC_READ_HOLDING: u8 = 0x03;
/// Read Discrete Inputs
pub const FC_READ_DISCRETE: u8 = 0x02;
/// Write Single Register
pub const FC_WRITE_SINGLE: u8 = 0x06;
/// Write Multiple Registers
pub const FC_WRITE_MULTIPLE: u8 = 0x10;

/// ILLEGAL FUNCTION exception
pub const EX_ILLEGAL_FUNCTION: u8 = 0x01;
/// ILLEGAL DATA ADDRESS exception
pub const EX_ILLEGAL_DATA_ADDRESS: u8 = 0x02;
/// ILLEGAL DATA VALUE exception
pub const EX_ILLEGAL_DATA_VALUE: u8 = 0x03;
/// GATEWAY PATH UNAVAILABLE exception (Modbus Specification V1.1b3 P.49)
pub const EX_GATEWAY_PATH_UNAVAILABLE: u8 = 0x0A;
/// GATEWAY TARGET DEVICE FAILED TO RESPOND exception (Modbus Specification V1.1b3 P.49)
pub const EX_GATEWAY_TARGET_FAILED: u8 = 0x0B;

/// One complete Modbus RTU message, minus the CRC.
///
/// The CRC is appended by [`Adu::to_bytes`] and checked by [`Adu::parse`];
/// nothing above the transport ever sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adu {
    pub unit: u8,
    pub function: u8,
    pub data: Vec<u8>,
}

impl Adu {
    pub fn new(unit: u8, function: u8, data: Vec<u8>) -> Self {
        Self { unit, function, data }
    }

    /// Build the raw frame from a flat byte list (unit, function, payload...).
    ///
    /// Used by the `##`/`@@` raw pass-through commands, where the host supplies
    /// everything but the CRC.
    pub fn from_raw(bytes: &[u8]) -> Result<Self, CommError> {
        if bytes.len() < 2 {
            return Err(CommError::MalformedResponse);
        }
        Ok(Self {
            unit: bytes[0],
            function: bytes[1],
            data: bytes[2..].to_vec(),
        })
    }

    /// An exception response to this request: function | 0x80, one code byte.
    pub fn exception(&self, code: u8) -> Adu {
        Adu {
            unit: self.unit,
            function: self.function | 0x80,
            data: vec![code],
        }
    }

    pub fn is_exception(&self) -> bool {
        self.function & 0x80 != 0
    }

    /// Serialize with the CRC appended, low byte first.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data.len() + 4);
        out.push(self.unit);
        out.push(self.function);
        out.extend_from_slice(&self.data);
        let crc = crc16(&out);
        out.push((crc & 0xFF) as u8);
        out.push((crc >> 8) as u8);
        out
    }

    /// Parse a complete frame, validating the trailing CRC.
    pub fn parse(bytes: &[u8]) -> Result<Self, CommError> {
        if bytes.len() < 4 {
            return Err(CommError::MalformedResponse);
        }
        let (body, crc_bytes) = bytes.split_at(bytes.len() - 2);
        let expected = crc16(body);
        let received = u16::from(crc_bytes[0]) | (u16::from(crc_bytes[1]) << 8);
        if expected != received {
            return Err(CommError::ChecksumMismatch);
        }
        Ok(Self {
            unit: body[0],
            function: body[1],
            data: body[2..].to_vec(),
        })
    }
}

/// Which side of the exchange a buffered frame belongs to. Request and
/// response frames with the same function code have different lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Request,
    Response,
}

/// Expected on-wire length (CRC included) of the frame starting at `buf[0]`.
///
/// Returns `Ok(None)` when more bytes are needed to decide, and
/// `Err(MalformedResponse)` for a function code we cannot size.
pub fn expected_frame_len(kind: FrameKind, buf: &[u8]) -> Result<Option<usize>, CommError> {
    if buf.len() < 3 {
        return Ok(None);
    }
    let function = buf[1];
    if function & 0x80 != 0 {
        // Exception response: unit, function, code, crc.
        return Ok(Some(5));
    }
    let len = match (kind, function) {
        (FrameKind::Request, FC_READ_HOLDING | FC_READ_DISCRETE | FC_WRITE_SINGLE) => 8,
        (FrameKind::Request, FC_WRITE_MULTIPLE) => {
            if buf.len() < 7 {
                return Ok(None);
            }
            9 + buf[6] as usize
        }
        (FrameKind::Response, FC_READ_HOLDING | FC_READ_DISCRETE) => 5 + buf[2] as usize,
        (FrameKind::Response, FC_WRITE_SINGLE | FC_WRITE_MULTIPLE) => 8,
        _ => return Err(CommError::MalformedResponse),
    };
    Ok(Some(len))
}

/// Try to pull one complete, CRC-valid frame off the front of `buf`.
///
/// Consumes the frame's bytes on success. On a sizing or CRC failure the
/// first byte is dropped so a resynchronization can happen on later polls.
pub fn extract_frame(kind: FrameKind, buf: &mut Vec<u8>) -> Option<Adu> {
    while !buf.is_empty() {
        match expected_frame_len(kind, buf) {
            Ok(None) => return None,
            Ok(Some(len)) => {
                if buf.len() < len {
                    return None;
                }
                match Adu::parse(&buf[..len]) {
                    Ok(adu) => {
                        buf.drain(..len);
                        return Some(adu);
                    }
                    Err(_) => {
                        // A real frame may start inside the presumed one.
                        buf.remove(0);
                    }
                }
            }
            Err(_) => {
                buf.remove(0);
            }
        }
    }
    None
}

/// CRC-16/Modbus (polynomial 0xA001, init 0xFFFF).
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= u16::from(byte);
        for _ in 0..8 {
            if crc & 0x0001 != 0 {
                crc = (crc >> 1) ^ 0xA001;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}
