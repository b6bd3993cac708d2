//! # Ring Packet Decoder
//!
//! Decodes ring notifications (real-time readings, raw accelerometer samples).
//!
//! Foreign or truncated frames are not errors: the ring multiplexes several
//! notification families on one characteristic, so every decoder answers
//! `None` for frames it does not own.

use tracing::warn;

use super::protocol::*;

/// Sign bit of a packed 12-bit axis value
const AXIS_SIGN_BIT: i16 = 1 << 11;

/// Magnitude bits of a packed 12-bit axis value
const AXIS_MAGNITUDE_MASK: i16 = AXIS_SIGN_BIT - 1;

/// Decode a real-time reading notification
///
/// # Arguments
///
/// * `frame` - Notification bytes: `[0x69, type, status, value, ...]`
///
/// # Returns
///
/// * `Option<RealTimeReading>` - The reading, or `None` if the frame is too
///   short, is not a real-time frame, or carries a non-zero status code
///
/// A non-zero status code is reported by the ring itself and is logged as a
/// warning.
pub fn parse_real_time_reading(frame: &[u8]) -> Option<RealTimeReading> {
    if frame.len() < REAL_TIME_FRAME_MIN_SIZE {
        return None;
    }

    if frame[0] != CMD_START_REAL_TIME {
        return None;
    }

    let status = frame[2];
    if status != 0 {
        warn!("Ring rejected real-time reading - code: {}", status);
        return None;
    }

    Some(RealTimeReading { value: frame[3] })
}

/// Decode a raw accelerometer notification
///
/// # Arguments
///
/// * `frame` - Notification bytes (at least 10, starting `0xA1 0x03`)
///
/// # Returns
///
/// * `Option<AccelerometerSample>` - Decoded sample, or `None` for any other frame
///
/// # Layout
///
/// Each axis is packed into a `(hi, lo)` byte pair as a 12-bit two's
/// complement value, `raw = (hi << 4) | (lo & 0x0F)`:
///
/// ```text
/// Byte 2-3: Y
/// Byte 4-5: Z
/// Byte 6-7: X
/// ```
///
/// The axis order follows the sensor mounting in the ring, not byte order.
pub fn decode_accelerometer(frame: &[u8]) -> Option<AccelerometerSample> {
    if frame.len() < ACCELEROMETER_FRAME_MIN_SIZE {
        return None;
    }

    if frame[0] != RAW_SENSOR_HEADER || frame[1] != RAW_SENSOR_ACCELEROMETER {
        return None;
    }

    Some(AccelerometerSample {
        x: decode_axis(frame[6], frame[7]),
        y: decode_axis(frame[2], frame[3]),
        z: decode_axis(frame[4], frame[5]),
    })
}

/// Dispatch a notification to the first decoder that accepts it
///
/// Decoders are tried in a fixed order: real-time reading, then accelerometer.
pub fn decode_notification(frame: &[u8]) -> Notification {
    if let Some(reading) = parse_real_time_reading(frame) {
        return Notification::RealTime(reading);
    }

    if let Some(sample) = decode_accelerometer(frame) {
        return Notification::Accelerometer(sample);
    }

    Notification::Unrecognized
}

/// Decode one packed 12-bit axis value
///
/// If the sign bit is set the value is `magnitude - 2048`, otherwise the raw
/// value is returned unchanged. The result is always within [-2048, 2047].
pub fn decode_axis(hi: u8, lo: u8) -> i16 {
    let raw = ((hi as i16) << 4) | (lo & 0x0F) as i16;

    if raw & AXIS_SIGN_BIT != 0 {
        (raw & AXIS_MAGNITUDE_MASK) - AXIS_SIGN_BIT
    } else {
        raw
    }
}

/// Pack an axis value into its `(hi, lo)` byte pair
///
/// Inverse of [`decode_axis`]. Values outside [-2048, 2047] are clamped.
pub fn encode_axis(value: i16) -> (u8, u8) {
    let value = value.clamp(ACCELEROMETER_VALUE_MIN, ACCELEROMETER_VALUE_MAX);
    let raw = (value as u16) & 0x0FFF;

    ((raw >> 4) as u8, (raw & 0x0F) as u8)
}
