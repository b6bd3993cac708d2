//! # Transport Module
//!
//! Byte-level link between a measurement session and the ring.
//!
//! This module handles:
//! - The `RingTransport` trait the session drives (send, subscribe, unsubscribe)
//! - A btleplug implementation over the ring's UART-style GATT service
//! - Test doubles recording every frame written

pub mod ble;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::packet::protocol::CommandFrame;

/// Trait for ring I/O operations
///
/// Notifications are delivered in arrival order on the returned channel.
/// The channel closing means the link is gone.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RingTransport: Send {
    /// Write one command frame to the ring
    async fn send(&mut self, frame: CommandFrame) -> Result<()>;

    /// Start receiving notifications
    async fn subscribe(&mut self) -> Result<mpsc::Receiver<Bytes>>;

    /// Stop receiving notifications
    async fn unsubscribe(&mut self) -> Result<()>;
}
