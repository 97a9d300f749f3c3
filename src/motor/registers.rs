//! Register map of the linear-motor drive, as consumed by this controller.
//!
//! Addresses and control-word values come from the drive vendor's Modbus
//! documentation. 32-bit registers occupy two consecutive 16-bit holding
//! registers with the high word at the lower address.

/// "Controlword" register (UNS16, read/write).
pub const CONTROL_WORD: u16 = 0xF002;
/// Controlword value requesting the disabled/ready state.
pub const CW_DISABLE: u16 = 0x0006;
/// Controlword value enabling the power stage.
pub const CW_ENABLE: u16 = 0x000F;
/// Controlword value clearing a latched fault.
pub const CW_CLEAR_ERROR: u16 = 0x0080;

/// "Error_code" register (UNS16, read only).
pub const ERROR_CODE: u16 = 0xF001;

/// "Inertia" register (UNS32, read/write).
pub const INERTIA: u16 = 0x0028;
/// "CurrentBandwidth" register (UNS32, read/write).
pub const CURRENT_GAIN: u16 = 0x0018;
/// "AutoGainTuningEnable" register (UNS8, read/write).
pub const AUTO_GAIN_ENABLE: u16 = 0x0455;
/// "CurrentTargetFilter1Type" register (UNS8, read/write). 0 = no filtering.
pub const FILTER1_TYPE: u16 = 0x0406;
/// "CurrentTargetFilter2Type" register (UNS8, read/write). 0 = no filtering.
pub const FILTER2_TYPE: u16 = 0x040B;

/// "ControlCmd" register (UNS8). Writing 1 commits parameters to flash.
pub const FLASH_COMMIT: u16 = 0x6000;
/// Value written to [`FLASH_COMMIT`] to start a save.
pub const FLASH_COMMIT_SAVE: u16 = 0x0001;
/// "FlashStorageStatus" register (UNS8, read only).
pub const FLASH_STATUS: u16 = 0x018A;

/// "Modes_of_operation_display" register (INTEGER8, read only).
pub const MODE_OF_OPERATION: u16 = 0xF00A;
/// "Position_actual_value" register (INTEGER32, read only).
pub const POSITION_ACTUAL: u16 = 0xF010;
