//! # Ring Packet Module
//!
//! Implementation of the Colmi ring command/notification wire protocol.
//!
//! This module handles:
//! - 16-byte command frame encoding (command + sub-payload + checksum)
//! - Real-time reading notification decoding (heart rate, SpO2)
//! - Raw accelerometer notification decoding (signed 12-bit axes)
//! - Additive mod-256 checksum calculation

pub mod protocol;
pub mod encoder;
pub mod decoder;
pub mod checksum;
