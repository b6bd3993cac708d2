//! # Ring Protocol Constants and Types
//!
//! Core protocol definitions for Colmi ring communication.

use serde::Serialize;
use std::fmt;

use super::checksum::additive_checksum;
use crate::error::{RingError, Result};

/// Command frame size (command + 14-byte sub-payload + checksum)
pub const COMMAND_FRAME_SIZE: usize = 16;

/// Maximum sub-payload size in a command frame
pub const MAX_SUB_PAYLOAD_SIZE: usize = 14;

/// Number of bytes covered by the checksum
pub const CHECKSUMMED_SIZE: usize = COMMAND_FRAME_SIZE - 1;

/// Start (or continue) a real-time reading
pub const CMD_START_REAL_TIME: u8 = 0x69; // 105

/// Stop a real-time reading
pub const CMD_STOP_REAL_TIME: u8 = 0x6A; // 106

/// Real-time action codes (second sub-payload byte)
pub const ACTION_START: u8 = 1;
pub const ACTION_CONTINUE: u8 = 3;

/// Raw sensor stream templates (hex, zero padded to 15 bytes on build)
pub const RAW_SENSOR_ENABLE_TEMPLATE: &str = "a104";
pub const RAW_SENSOR_DISABLE_TEMPLATE: &str = "a102";

/// Raw sensor notification header
pub const RAW_SENSOR_HEADER: u8 = 0xA1;

/// Raw sensor notification subtype carrying accelerometer data
pub const RAW_SENSOR_ACCELEROMETER: u8 = 0x03;

/// Minimum real-time reading notification size
pub const REAL_TIME_FRAME_MIN_SIZE: usize = 4;

/// Minimum accelerometer notification size
pub const ACCELEROMETER_FRAME_MIN_SIZE: usize = 10;

/// Accelerometer axis range (12-bit signed)
pub const ACCELEROMETER_VALUE_MIN: i16 = -2048;
pub const ACCELEROMETER_VALUE_MAX: i16 = 2047;

/// Real-time reading type, sent as the first sub-payload byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ReadingType {
    /// Heart rate in beats per minute
    HeartRate = 1,

    /// Blood oxygen saturation in percent
    Spo2 = 3,
}

impl ReadingType {
    /// Wire code of this reading type
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// A fixed 16-byte outbound command frame
///
/// Byte 0 is the command code, bytes 1..=14 the zero-filled sub-payload and
/// byte 15 the additive checksum of bytes 0..=14. The checksum is computed on
/// construction and the bytes are never mutated afterwards.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandFrame([u8; COMMAND_FRAME_SIZE]);

impl CommandFrame {
    /// Create a new command frame
    ///
    /// # Arguments
    ///
    /// * `command` - Command code (byte 0)
    /// * `sub_payload` - Sub-payload bytes (max 14)
    ///
    /// # Errors
    ///
    /// Returns `SubPayloadTooLong` if `sub_payload` exceeds 14 bytes
    pub fn try_new(command: u8, sub_payload: &[u8]) -> Result<Self> {
        if sub_payload.len() > MAX_SUB_PAYLOAD_SIZE {
            return Err(RingError::SubPayloadTooLong(sub_payload.len()));
        }

        let mut body = [0u8; CHECKSUMMED_SIZE];
        body[0] = command;
        body[1..1 + sub_payload.len()].copy_from_slice(sub_payload);

        Ok(Self::from_body(body))
    }

    /// Seal the first 15 bytes of a frame with its checksum
    pub(crate) const fn from_body(body: [u8; CHECKSUMMED_SIZE]) -> Self {
        let mut bytes = [0u8; COMMAND_FRAME_SIZE];
        let mut i = 0;

        while i < CHECKSUMMED_SIZE {
            bytes[i] = body[i];
            i += 1;
        }

        bytes[CHECKSUMMED_SIZE] = additive_checksum(&body);
        Self(bytes)
    }

    /// Command code (byte 0)
    pub fn command(&self) -> u8 {
        self.0[0]
    }

    /// Sub-payload area (bytes 1..=14), including zero padding
    pub fn sub_payload(&self) -> &[u8] {
        &self.0[1..CHECKSUMMED_SIZE]
    }

    /// Checksum trailer (byte 15)
    pub fn checksum(&self) -> u8 {
        self.0[CHECKSUMMED_SIZE]
    }

    /// Raw frame bytes
    pub fn as_bytes(&self) -> &[u8; COMMAND_FRAME_SIZE] {
        &self.0
    }

    /// Lowercase hex rendering, as logged before each write
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Debug for CommandFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommandFrame({})", self.to_hex())
    }
}

/// A real-time reading reported with status code zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RealTimeReading {
    /// Reading value (bpm for heart rate, percent for SpO2)
    pub value: u8,
}

/// One raw accelerometer sample
///
/// Each axis is a 12-bit signed value in [-2048, 2047].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccelerometerSample {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

/// Result of dispatching one inbound notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    /// Real-time heart rate / SpO2 reading
    RealTime(RealTimeReading),

    /// Raw accelerometer sample
    Accelerometer(AccelerometerSample),

    /// Foreign, malformed or device-rejected frame
    Unrecognized,
}
