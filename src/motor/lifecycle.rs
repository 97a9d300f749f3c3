// src/motor/lifecycle.rs - Multi-step enable/disable/parameter sequences
//
// The drive's firmware silently drops commands that arrive too close
// together, so every step of every sequence is separated by
// SETTLE_DELAY. That spacing is a correctness requirement, not tuning.
use std::time::Duration;

use tokio::time::sleep;

use super::channel::MotorChannel;
use super::registers as reg;
use crate::transport::CommError;

/// Minimum spacing between consecutive commands to one drive.
pub const SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Result of a flash commit. Never treated as a hard failure: the drive's
/// documentation does not define the storage-status success value, so a
/// suspect read-back is reported but the sequence continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    /// Status register read back zero.
    Verified,
    /// Status register read back non-zero.
    Unverified,
    /// The commit write or the status read-back failed on the wire.
    CommFailed,
}

/// Result of a parameter-set sequence. The motor is re-enabled at the end
/// no matter what happened in between (availability over strictness, as
/// the deployed firmware behaves); a caller that needs strict propagation
/// inspects `write` itself.
#[derive(Debug)]
pub struct SetOutcome {
    /// Result of the parameter register write step.
    pub write: Result<(), CommError>,
    /// Advisory flash-commit outcome.
    pub persisted: PersistOutcome,
}

impl SetOutcome {
    pub fn write_ok(&self) -> bool {
        self.write.is_ok()
    }
}

impl MotorChannel {
    /// Request the disabled/ready state. Single register write, idempotent.
    pub async fn disable(&mut self) -> Result<(), CommError> {
        self.write_register(reg::CONTROL_WORD, reg::CW_DISABLE).await
    }

    async fn clear_error(&mut self) -> Result<(), CommError> {
        self.write_register(reg::CONTROL_WORD, reg::CW_CLEAR_ERROR).await
    }

    async fn send_enable_word(&mut self) -> Result<(), CommError> {
        self.write_register(reg::CONTROL_WORD, reg::CW_ENABLE).await
    }

    /// Bring the power stage up.
    ///
    /// Always four register operations in fixed order: disable,
    /// clear-error, disable again (a cleared fault only takes effect after
    /// a second disable), enable word. Intermediate failures are logged
    /// and the sequence continues; the returned result is the final
    /// enable-word write.
    pub async fn enable(&mut self) -> Result<(), CommError> {
        if let Err(e) = self.disable().await {
            tracing::warn!("enable: initial disable failed: {}", e);
        }
        sleep(SETTLE_DELAY).await;
        if let Err(e) = self.clear_error().await {
            tracing::warn!("enable: clear-error failed: {}", e);
        }
        sleep(SETTLE_DELAY).await;
        if let Err(e) = self.disable().await {
            tracing::warn!("enable: post-clear disable failed: {}", e);
        }
        sleep(SETTLE_DELAY).await;
        self.send_enable_word().await
    }

    /// Commit parameters to the drive's flash and read the storage status
    /// back. Advisory only; see [`PersistOutcome`].
    pub async fn persist_to_flash(&mut self) -> PersistOutcome {
        if let Err(e) = self
            .write_register(reg::FLASH_COMMIT, reg::FLASH_COMMIT_SAVE)
            .await
        {
            tracing::warn!("flash commit write failed: {}", e);
            return PersistOutcome::CommFailed;
        }
        sleep(SETTLE_DELAY).await;
        match self.read_register(reg::FLASH_STATUS).await {
            Ok(0) => PersistOutcome::Verified,
            Ok(status) => {
                tracing::warn!("flash storage status read back {:#06x}", status);
                PersistOutcome::Unverified
            }
            Err(e) => {
                tracing::warn!("flash status read failed: {}", e);
                PersistOutcome::CommFailed
            }
        }
    }

    /// "Inertia" (UNS32), spread across two registers high word first.
    pub async fn set_inertia(&mut self, value: u32) -> SetOutcome {
        self.set_parameter_u32(reg::INERTIA, value).await
    }

    /// "CurrentBandwidth" (UNS32).
    pub async fn set_current_gain(&mut self, value: u32) -> SetOutcome {
        self.set_parameter_u32(reg::CURRENT_GAIN, value).await
    }

    /// "AutoGainTuningEnable".
    pub async fn set_auto_gain(&mut self, enabled: bool) -> SetOutcome {
        self.set_parameter_u16(reg::AUTO_GAIN_ENABLE, u16::from(enabled)).await
    }

    /// Switch command-current filter 1 to "no filtering".
    pub async fn set_filter1_off(&mut self) -> SetOutcome {
        self.set_parameter_u16(reg::FILTER1_TYPE, 0).await
    }

    /// Switch command-current filter 2 to "no filtering".
    pub async fn set_filter2_off(&mut self) -> SetOutcome {
        self.set_parameter_u16(reg::FILTER2_TYPE, 0).await
    }

    /// Fixed setter shape: disable, wait, write, wait, persist, wait,
    /// enable. Runs to the end regardless of step failures.
    async fn set_parameter_u16(&mut self, addr: u16, value: u16) -> SetOutcome {
        if let Err(e) = self.disable().await {
            tracing::warn!("set: disable failed: {}", e);
        }
        sleep(SETTLE_DELAY).await;
        let write_result = self.write_register(addr, value).await;
        if let Err(e) = &write_result {
            tracing::warn!("set: parameter write failed: {}", e);
        }
        self.finish_set_sequence(write_result).await
    }

    /// Same shape as [`set_parameter_u16`], for 32-bit parameters.
    async fn set_parameter_u32(&mut self, addr: u16, value: u32) -> SetOutcome {
        if let Err(e) = self.disable().await {
            tracing::warn!("set: disable failed: {}", e);
        }
        sleep(SETTLE_DELAY).await;
        let write_result = self.write_register_u32(addr, value).await;
        if let Err(e) = &write_result {
            tracing::warn!("set: parameter write failed: {}", e);
        }
        self.finish_set_sequence(write_result).await
    }

    async fn finish_set_sequence(&mut self, write_result: Result<(), CommError>) -> SetOutcome {
        sleep(SETTLE_DELAY).await;
        let persisted = self.persist_to_flash().await;
        sleep(SETTLE_DELAY).await;
        if let Err(e) = self.enable().await {
            tracing::warn!("set: re-enable failed: {}", e);
        }
        SetOutcome {
            write: write_result,
            persisted,
        }
    }

    // Getters: single reads, no enable/disable side effects.

    pub async fn get_inertia(&mut self) -> Result<u32, CommError> {
        self.read_register_u32(reg::INERTIA).await
    }

    pub async fn get_current_gain(&mut self) -> Result<u32, CommError> {
        self.read_register_u32(reg::CURRENT_GAIN).await
    }

    pub async fn get_auto_gain(&mut self) -> Result<bool, CommError> {
        Ok(self.read_register(reg::AUTO_GAIN_ENABLE).await? != 0)
    }

    pub async fn get_mode_of_operation(&mut self) -> Result<i8, CommError> {
        Ok(self.read_register(reg::MODE_OF_OPERATION).await? as u8 as i8)
    }

    pub async fn get_position_actual(&mut self) -> Result<i32, CommError> {
        Ok(self.read_register_u32(reg::POSITION_ACTUAL).await? as i32)
    }
}
