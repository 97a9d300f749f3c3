// src/gateway/mod.rs - Modbus slave register map + frame forwarding
//
// In gateway mode the controller answers as a Modbus slave on its own
// unit id and forwards frames addressed to the subordinate ids through to
// the matching drive. The register map is a projection of live state,
// rebuilt before every read and re-applied after every write; it is a
// translation surface, never the source of truth.

use crate::io::LedColor;
use crate::router::OperatingMode;
use crate::transport::adu::{
    Adu, EX_ILLEGAL_DATA_ADDRESS, EX_ILLEGAL_DATA_VALUE, EX_ILLEGAL_FUNCTION, FC_READ_DISCRETE,
    FC_READ_HOLDING, FC_WRITE_SINGLE,
};

/// Holding register 0: operating mode (0 = ASCII, 1 = gateway, 2 = mixed).
pub const REG_MODE: u16 = 0;
/// Holding register 1: axis-X LED color (0 = off, 1 = red, 2 = green).
pub const REG_X_LED: u16 = 1;
/// Holding register 2: axis-Y LED color.
pub const REG_Y_LED: u16 = 2;
const HOLDING_COUNT: u16 = 3;

/// Discrete input 0: disable-button debounced state.
pub const INPUT_DISABLE_BUTTON: u16 = 0;
/// Discrete input 1: enable-button debounced state.
pub const INPUT_ENABLE_BUTTON: u16 = 1;
const DISCRETE_COUNT: u16 = 2;

/// Snapshot of the slave-visible registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterMap {
    pub holding: [u16; HOLDING_COUNT as usize],
    pub discrete: [bool; DISCRETE_COUNT as usize],
}

impl RegisterMap {
    /// Rebuild the projection from live controller state.
    pub fn project(
        mode: OperatingMode,
        x_led: LedColor,
        y_led: LedColor,
        disable_pressed: bool,
        enable_pressed: bool,
    ) -> Self {
        Self {
            holding: [
                mode.to_register(),
                x_led.to_register(),
                y_led.to_register(),
            ],
            discrete: [disable_pressed, enable_pressed],
        }
    }

    pub fn mode(&self) -> Option<OperatingMode> {
        OperatingMode::from_register(self.holding[REG_MODE as usize])
    }

    pub fn x_led(&self) -> Option<LedColor> {
        LedColor::from_register(self.holding[REG_X_LED as usize])
    }

    pub fn y_led(&self) -> Option<LedColor> {
        LedColor::from_register(self.holding[REG_Y_LED as usize])
    }
}

/// Answer one frame addressed to the gateway's own unit id.
///
/// Writes mutate `map` in place; the caller re-applies the map to live
/// state afterwards. Anything out of range answers with the standard
/// exception codes instead of an internal error.
pub fn serve(map: &mut RegisterMap, request: &Adu) -> Adu {
    match request.function {
        FC_READ_HOLDING => read_holding(map, request),
        FC_READ_DISCRETE => read_discrete(map, request),
        FC_WRITE_SINGLE => write_single(map, request),
        _ => request.exception(EX_ILLEGAL_FUNCTION),
    }
}

fn request_words(request: &Adu) -> Option<(u16, u16)> {
    if request.data.len() < 4 {
        return None;
    }
    let first = (u16::from(request.data[0]) << 8) | u16::from(request.data[1]);
    let second = (u16::from(request.data[2]) << 8) | u16::from(request.data[3]);
    Some((first, second))
}

fn read_holding(map: &RegisterMap, request: &Adu) -> Adu {
    let Some((addr, count)) = request_words(request) else {
        return request.exception(EX_ILLEGAL_DATA_VALUE);
    };
    if count == 0 || u32::from(addr) + u32::from(count) > u32::from(HOLDING_COUNT) {
        return request.exception(EX_ILLEGAL_DATA_ADDRESS);
    }
    let mut data = vec![(count * 2) as u8];
    for i in addr..addr + count {
        let value = map.holding[i as usize];
        data.push((value >> 8) as u8);
        data.push((value & 0xFF) as u8);
    }
    Adu::new(request.unit, FC_READ_HOLDING, data)
}

fn read_discrete(map: &RegisterMap, request: &Adu) -> Adu {
    let Some((addr, count)) = request_words(request) else {
        return request.exception(EX_ILLEGAL_DATA_VALUE);
    };
    if count == 0 || u32::from(addr) + u32::from(count) > u32::from(DISCRETE_COUNT) {
        return request.exception(EX_ILLEGAL_DATA_ADDRESS);
    }
    let mut bits: u8 = 0;
    for (bit, i) in (addr..addr + count).enumerate() {
        if map.discrete[i as usize] {
            bits |= 1 << bit;
        }
    }
    Adu::new(request.unit, FC_READ_DISCRETE, vec![1, bits])
}

fn write_single(map: &mut RegisterMap, request: &Adu) -> Adu {
    let Some((addr, value)) = request_words(request) else {
        return request.exception(EX_ILLEGAL_DATA_VALUE);
    };
    if addr >= HOLDING_COUNT {
        return request.exception(EX_ILLEGAL_DATA_ADDRESS);
    }
    let valid = match addr {
        REG_MODE => OperatingMode::from_register(value).is_some(),
        _ => LedColor::from_register(value).is_some(),
    };
    if !valid {
        return request.exception(EX_ILLEGAL_DATA_VALUE);
    }
    map.holding[addr as usize] = value;
    // A successful write echoes the request.
    request.clone()
}
