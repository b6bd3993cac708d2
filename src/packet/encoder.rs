//! # Ring Packet Encoder
//!
//! Encodes commands into 16-byte ring command frames.
//!
//! Two construction paths exist and produce byte-identical frames for the same
//! content:
//! - command code + sub-payload ([`build_command`])
//! - literal hex template ([`command_from_hex`]), used for the raw sensor pair

use std::fmt;

use super::protocol::*;
use crate::error::{RingError, Result};

/// Why a hex template was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HexTemplateError {
    /// Template has an odd number of digits
    OddLength,

    /// Non-hex character at the given offset
    InvalidDigit(usize),

    /// Template decodes to more than 15 bytes
    TooLong(usize),
}

impl fmt::Display for HexTemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HexTemplateError::OddLength => write!(f, "odd number of hex digits"),
            HexTemplateError::InvalidDigit(pos) => write!(f, "invalid hex digit at offset {}", pos),
            HexTemplateError::TooLong(len) => {
                write!(f, "{} bytes exceeds the {}-byte frame body", len, CHECKSUMMED_SIZE)
            }
        }
    }
}

/// Frame that enables the raw sensor (accelerometer) stream
pub const RAW_SENSOR_ENABLE: CommandFrame = template_frame(RAW_SENSOR_ENABLE_TEMPLATE);

/// Frame that disables the raw sensor (accelerometer) stream
pub const RAW_SENSOR_DISABLE: CommandFrame = template_frame(RAW_SENSOR_DISABLE_TEMPLATE);

/// Build a command frame from a command code and sub-payload
///
/// # Arguments
///
/// * `command` - Command code (byte 0)
/// * `sub_payload` - Up to 14 bytes, left aligned after the command code
///
/// # Returns
///
/// * `CommandFrame` - 16 bytes: command + zero-padded sub-payload + checksum
///
/// # Panics
///
/// Panics if `sub_payload` is longer than 14 bytes. Every call site in this
/// crate passes a fixed-size payload; use [`CommandFrame::try_new`] for
/// runtime input.
///
/// # Examples
///
/// ```
/// use colmi_ring::packet::encoder::build_command;
///
/// let frame = build_command(105, &[1, 1]);
/// assert_eq!(frame.as_bytes().len(), 16);
/// assert_eq!(frame.checksum(), 107);
/// ```
pub fn build_command(command: u8, sub_payload: &[u8]) -> CommandFrame {
    match CommandFrame::try_new(command, sub_payload) {
        Ok(frame) => frame,
        Err(e) => panic!("invalid command 0x{:02X}: {}", command, e),
    }
}

/// Start a real-time reading
pub fn start_packet(reading_type: ReadingType) -> CommandFrame {
    build_command(CMD_START_REAL_TIME, &[reading_type.code(), ACTION_START])
}

/// Keep a real-time reading running after the start packet
pub fn continue_packet(reading_type: ReadingType) -> CommandFrame {
    build_command(CMD_START_REAL_TIME, &[reading_type.code(), ACTION_CONTINUE])
}

/// Stop a real-time reading
pub fn stop_packet(reading_type: ReadingType) -> CommandFrame {
    build_command(CMD_STOP_REAL_TIME, &[reading_type.code(), 0, 0])
}

/// Enable the raw sensor stream
pub fn enable_raw_sensor_packet() -> CommandFrame {
    RAW_SENSOR_ENABLE
}

/// Disable the raw sensor stream
pub fn disable_raw_sensor_packet() -> CommandFrame {
    RAW_SENSOR_DISABLE
}

/// Build a command frame from a hex template
///
/// The template is decoded two digits per byte, zero padded to 15 bytes and
/// sealed with the checksum.
///
/// # Errors
///
/// Returns `InvalidHexTemplate` if the template has an odd length, contains a
/// non-hex character or decodes to more than 15 bytes
///
/// # Examples
///
/// ```
/// use colmi_ring::packet::encoder::{build_command, command_from_hex};
///
/// let frame = command_from_hex("a104")?;
/// assert_eq!(frame, build_command(0xA1, &[0x04]));
/// # Ok::<(), colmi_ring::error::RingError>(())
/// ```
pub fn command_from_hex(template: &str) -> Result<CommandFrame> {
    decode_hex_template(template.as_bytes())
        .map(CommandFrame::from_body)
        .map_err(|e| RingError::InvalidHexTemplate {
            template: template.to_string(),
            reason: e.to_string(),
        })
}

/// Build a template frame at compile time
const fn template_frame(template: &str) -> CommandFrame {
    match decode_hex_template(template.as_bytes()) {
        Ok(body) => CommandFrame::from_body(body),
        Err(_) => panic!("raw sensor template is not valid hex"),
    }
}

/// Decode hex digits into a zero-padded frame body
const fn decode_hex_template(
    digits: &[u8],
) -> std::result::Result<[u8; CHECKSUMMED_SIZE], HexTemplateError> {
    if digits.len() % 2 != 0 {
        return Err(HexTemplateError::OddLength);
    }

    let len = digits.len() / 2;
    if len > CHECKSUMMED_SIZE {
        return Err(HexTemplateError::TooLong(len));
    }

    let mut body = [0u8; CHECKSUMMED_SIZE];
    let mut i = 0;

    while i < len {
        let hi = match hex_value(digits[2 * i]) {
            Some(v) => v,
            None => return Err(HexTemplateError::InvalidDigit(2 * i)),
        };
        let lo = match hex_value(digits[2 * i + 1]) {
            Some(v) => v,
            None => return Err(HexTemplateError::InvalidDigit(2 * i + 1)),
        };
        body[i] = (hi << 4) | lo;
        i += 1;
    }

    Ok(body)
}

const fn hex_value(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'a'..=b'f' => Some(digit - b'a' + 10),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        _ => None,
    }
}
