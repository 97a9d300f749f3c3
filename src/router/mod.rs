// src/router/mod.rs - Host command classification
use crate::motor::Axis;

/// Which paths of the per-cycle routing execute. Mutated only by an
/// explicit host command (ASCII keyword or a gateway register write).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OperatingMode {
    /// Newline-terminated ASCII commands only. Initial mode.
    #[default]
    Ascii,
    /// Modbus RTU gateway only.
    RtuGateway,
    /// Both: ASCII routing and the gateway poll run every cycle.
    RtuMixed,
}

impl OperatingMode {
    /// Gateway register-map encoding: 0 = ASCII, 1 = gateway, 2 = mixed.
    pub fn to_register(self) -> u16 {
        match self {
            OperatingMode::Ascii => 0,
            OperatingMode::RtuGateway => 1,
            OperatingMode::RtuMixed => 2,
        }
    }

    pub fn from_register(value: u16) -> Option<Self> {
        match value {
            0 => Some(OperatingMode::Ascii),
            1 => Some(OperatingMode::RtuGateway),
            2 => Some(OperatingMode::RtuMixed),
            _ => None,
        }
    }

    pub fn ascii_active(self) -> bool {
        matches!(self, OperatingMode::Ascii | OperatingMode::RtuMixed)
    }

    pub fn gateway_active(self) -> bool {
        matches!(self, OperatingMode::RtuGateway | OperatingMode::RtuMixed)
    }
}

/// One parsed host request. Constructed fresh per input line, never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ModeSwitch(OperatingMode),
    Enable,
    Disable,
    AutoGainOff,
    FilterOff,
    SetCurrentGain(Axis, u32),
    SetInertia(Axis, u32),
    GetCurrentGain(Axis),
    GetInertia(Axis),
    /// Raw frame body (unit id, function, payload) for one axis's drive.
    Raw(Axis, Vec<u8>),
    Version,
    Unknown,
}

/// Classify one host line. Case-sensitive keyword prefix match, tested in
/// priority order: mode switches, lifecycle keywords, parameter set/get,
/// raw pass-through prefixes, version query, then unknown.
///
/// A malformed numeric suffix parses as zero rather than failing; that
/// mirrors the deployed firmware and keeps the host protocol non-fatal.
pub fn parse(line: &str) -> Command {
    if line.starts_with("RTU_GATEWAY") {
        Command::ModeSwitch(OperatingMode::RtuGateway)
    } else if line.starts_with("RTU_MIXED") {
        Command::ModeSwitch(OperatingMode::RtuMixed)
    } else if line.starts_with("ENABLE") {
        Command::Enable
    } else if line.starts_with("DISABLE") {
        Command::Disable
    } else if line.starts_with("AUTO_GAIN_OFF") {
        Command::AutoGainOff
    } else if line.starts_with("FILTER_OFF") {
        Command::FilterOff
    } else if let Some(rest) = line.strip_prefix("CURRENT_X:") {
        Command::SetCurrentGain(Axis::X, lenient_u32(rest))
    } else if let Some(rest) = line.strip_prefix("CURRENT_Y:") {
        Command::SetCurrentGain(Axis::Y, lenient_u32(rest))
    } else if let Some(rest) = line.strip_prefix("INERDIA_X:") {
        Command::SetInertia(Axis::X, lenient_u32(rest))
    } else if let Some(rest) = line.strip_prefix("INERDIA_Y:") {
        Command::SetInertia(Axis::Y, lenient_u32(rest))
    } else if line.starts_with("GET_CURRENT_X") {
        Command::GetCurrentGain(Axis::X)
    } else if line.starts_with("GET_CURRENT_Y") {
        Command::GetCurrentGain(Axis::Y)
    } else if line.starts_with("GET_INERDIA_X") {
        Command::GetInertia(Axis::X)
    } else if line.starts_with("GET_INERDIA_Y") {
        Command::GetInertia(Axis::Y)
    } else if let Some(rest) = line.strip_prefix("##") {
        Command::Raw(Axis::X, parse_byte_list(rest))
    } else if let Some(rest) = line.strip_prefix("@@") {
        Command::Raw(Axis::Y, parse_byte_list(rest))
    } else if line.starts_with("VERSION") {
        Command::Version
    } else {
        Command::Unknown
    }
}

/// Best-effort unsigned parse: anything malformed is the value zero.
fn lenient_u32(text: &str) -> u32 {
    text.trim().parse().unwrap_or(0)
}

/// Comma-separated decimal bytes forming one raw frame body.
fn parse_byte_list(text: &str) -> Vec<u8> {
    text.trim()
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| part.trim().parse().unwrap_or(0))
        .collect()
}

/// Render response payload bytes the way the firmware always has:
/// `0x01,0x03,0x04`.
pub fn format_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("0x{:02X}", b))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_commands_parse() {
        assert_eq!(parse("ENABLE"), Command::Enable);
        assert_eq!(parse("DISABLE"), Command::Disable);
        assert_eq!(parse("VERSION"), Command::Version);
        assert_eq!(parse("AUTO_GAIN_OFF"), Command::AutoGainOff);
        assert_eq!(parse("FILTER_OFF"), Command::FilterOff);
    }

    #[test]
    fn mode_switches_take_priority() {
        assert_eq!(
            parse("RTU_GATEWAY"),
            Command::ModeSwitch(OperatingMode::RtuGateway)
        );
        assert_eq!(
            parse("RTU_MIXED"),
            Command::ModeSwitch(OperatingMode::RtuMixed)
        );
    }

    #[test]
    fn parameter_setters_parse_values() {
        assert_eq!(parse("CURRENT_X:55"), Command::SetCurrentGain(Axis::X, 55));
        assert_eq!(parse("INERDIA_Y:230"), Command::SetInertia(Axis::Y, 230));
        assert_eq!(parse("GET_CURRENT_Y"), Command::GetCurrentGain(Axis::Y));
        assert_eq!(parse("GET_INERDIA_X"), Command::GetInertia(Axis::X));
    }

    #[test]
    fn malformed_suffix_is_zero() {
        assert_eq!(parse("CURRENT_X:abc"), Command::SetCurrentGain(Axis::X, 0));
        assert_eq!(parse("INERDIA_X:"), Command::SetInertia(Axis::X, 0));
    }

    #[test]
    fn raw_prefixes_select_axis() {
        assert_eq!(
            parse("##1,3,240,16,0,2"),
            Command::Raw(Axis::X, vec![1, 3, 240, 16, 0, 2])
        );
        assert_eq!(
            parse("@@1,6,240,2,0,15"),
            Command::Raw(Axis::Y, vec![1, 6, 240, 2, 0, 15])
        );
    }

    #[test]
    fn raw_body_tolerates_junk_numbers() {
        assert_eq!(parse("##1,zz,3"), Command::Raw(Axis::X, vec![1, 0, 3]));
    }

    #[test]
    fn case_sensitive_and_unknown() {
        assert_eq!(parse("enable"), Command::Unknown);
        assert_eq!(parse("HELLO"), Command::Unknown);
        assert_eq!(parse(""), Command::Unknown);
    }

    #[test]
    fn mode_register_round_trips() {
        for mode in [
            OperatingMode::Ascii,
            OperatingMode::RtuGateway,
            OperatingMode::RtuMixed,
        ] {
            assert_eq!(OperatingMode::from_register(mode.to_register()), Some(mode));
        }
        assert_eq!(OperatingMode::from_register(7), None);
    }

    #[test]
    fn active_paths_per_mode() {
        assert!(OperatingMode::Ascii.ascii_active());
        assert!(!OperatingMode::Ascii.gateway_active());
        assert!(!OperatingMode::RtuGateway.ascii_active());
        assert!(OperatingMode::RtuGateway.gateway_active());
        assert!(OperatingMode::RtuMixed.ascii_active());
        assert!(OperatingMode::RtuMixed.gateway_active());
    }

    #[test]
    fn hex_formatting() {
        assert_eq!(format_hex(&[0x01, 0x03, 0xF0]), "0x01,0x03,0xF0");
        assert_eq!(format_hex(&[]), "");
    }
}
