//! # Colmi Ring Library
//!
//! Stream heart rate, SpO2 and raw accelerometer data from a Colmi smart ring
//! over Bluetooth Low Energy.
//!
//! This library provides the ring wire protocol (16-byte command frames,
//! notification decoders) and the measurement session that drives a
//! start -> stream -> stop interaction over any [`transport::RingTransport`].

pub mod config;
pub mod error;
pub mod packet;
pub mod report;
pub mod session;
pub mod transport;
