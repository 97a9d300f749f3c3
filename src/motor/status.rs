// src/motor/status.rs - Unified fault snapshot for one axis
use super::channel::MotorChannel;
use super::registers as reg;
use crate::transport::CommError;

/// Immutable status snapshot, recomputed on every query and never cached.
///
/// The error code is the drive's raw register value; its bit-field meaning
/// is not decoded here, only surfaced to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorStatus {
    pub error_code: u16,
    pub comm_error: Option<CommError>,
}

impl MotorStatus {
    pub fn is_error(&self) -> bool {
        self.comm_error.is_some() || self.error_code != 0
    }
}

impl MotorChannel {
    /// Read the drive's error-code register and classify the outcome.
    ///
    /// A transport failure takes reporting precedence: the snapshot then
    /// carries `comm_error` with `error_code` zeroed, regardless of any
    /// previously seen device fault.
    pub async fn get_status(&mut self) -> MotorStatus {
        match self.read_register(reg::ERROR_CODE).await {
            Ok(code) => MotorStatus {
                error_code: code,
                comm_error: None,
            },
            Err(e) => MotorStatus {
                error_code: 0,
                comm_error: Some(e),
            },
        }
    }
}
