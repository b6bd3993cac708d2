//! # BLE Transport
//!
//! Connects to a Colmi ring by address with btleplug and exposes its
//! UART-style GATT service as a [`RingTransport`].
//!
//! The ring exposes a Nordic-UART-like pair of characteristics:
//! - `6e400002-...` (write) receives 16-byte command frames
//! - `6e400003-...` (notify) carries every reply and measurement frame

use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{
    Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType,
};
use btleplug::platform::{Manager, Peripheral};
use bytes::Bytes;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::RingTransport;
use crate::config::DeviceConfig;
use crate::error::{RingError, Result};
use crate::packet::protocol::CommandFrame;

/// Command (write) characteristic
pub const RXTX_WRITE_CHARACTERISTIC: Uuid =
    Uuid::from_u128(0x6e400002_b5a3_f393_e0a9_e50e24dcca9e);

/// Notification characteristic
pub const RXTX_NOTIFY_CHARACTERISTIC: Uuid =
    Uuid::from_u128(0x6e400003_b5a3_f393_e0a9_e50e24dcca9e);

/// Notification channel depth between the BLE stack and the session
const NOTIFICATION_CHANNEL_SIZE: usize = 64;

/// Poll interval while waiting for the configured ring to be seen
const SCAN_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Hard limit on GATT connect + service discovery
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connected Colmi ring
pub struct BleRing {
    peripheral: Peripheral,
    write_char: Characteristic,
    notify_char: Characteristic,
    forwarder: Option<JoinHandle<()>>,
    label: String,
}

impl std::fmt::Debug for BleRing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BleRing")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl BleRing {
    /// Connect to the ring named in `device`
    ///
    /// Waits up to `scan_timeout_ms` for the configured address to appear on
    /// the first adapter, then connects and resolves the command and
    /// notification characteristics. No retries are attempted.
    ///
    /// # Errors
    ///
    /// - `DeviceNotFound`: no adapter, or the address was not seen in time
    /// - `CharacteristicNotFound`: the device is not a Colmi ring
    /// - `Transport`: any btleplug failure
    pub async fn connect(device: &DeviceConfig) -> Result<Self> {
        let label = device.label();
        info!("Connecting to {}...", label);

        let manager = Manager::new().await?;
        let adapter = manager
            .adapters()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RingError::DeviceNotFound("no Bluetooth adapter available".to_string()))?;

        adapter.start_scan(ScanFilter::default()).await?;
        let found = Self::find_peripheral(&adapter, &device.address, device.scan_timeout()).await;
        if let Err(e) = adapter.stop_scan().await {
            debug!("Failed to stop scan: {}", e);
        }
        let peripheral = found?;

        tokio::time::timeout(CONNECT_TIMEOUT, async {
            peripheral.connect().await?;
            peripheral.discover_services().await
        })
        .await
        .map_err(|_| RingError::Transport(format!("Failed to connect to {}: timed out", label)))??;

        if !peripheral.is_connected().await? {
            return Err(RingError::Transport(format!("Failed to connect to {}", label)));
        }

        let chars = peripheral.characteristics();
        let find_char = |uuid: Uuid| -> Result<Characteristic> {
            chars
                .iter()
                .find(|c| c.uuid == uuid)
                .cloned()
                .ok_or(RingError::CharacteristicNotFound(uuid))
        };
        let write_char = find_char(RXTX_WRITE_CHARACTERISTIC)?;
        let notify_char = find_char(RXTX_NOTIFY_CHARACTERISTIC)?;

        info!("Connected to {}.", label);

        Ok(Self {
            peripheral,
            write_char,
            notify_char,
            forwarder: None,
            label,
        })
    }

    /// Poll the adapter until a peripheral with `address` shows up
    ///
    /// Listing errors are retried until the timeout; the last one is carried
    /// in the `DeviceNotFound` message.
    async fn find_peripheral(
        adapter: &btleplug::platform::Adapter,
        address: &str,
        scan_timeout: Duration,
    ) -> Result<Peripheral> {
        let mut listing_error = None;
        let search = async {
            loop {
                match adapter.peripherals().await {
                    Ok(peripherals) => {
                        let found = select_peripheral(peripherals, address, |p| {
                            (p.address().to_string(), p.id().to_string())
                        });
                        if let Some(p) = found {
                            return p;
                        }
                    }
                    Err(e) => {
                        debug!("Failed to list peripherals: {}", e);
                        listing_error = Some(e.to_string());
                    }
                }
                tokio::time::sleep(SCAN_POLL_INTERVAL).await;
            }
        };

        let result = tokio::time::timeout(scan_timeout, search).await;
        result.map_err(|_| {
            RingError::DeviceNotFound(not_found_reason(
                address,
                scan_timeout,
                listing_error.as_deref(),
            ))
        })
    }

    /// Disconnect from the ring
    pub async fn disconnect(mut self) -> Result<()> {
        if let Some(task) = self.forwarder.take() {
            task.abort();
        }
        self.peripheral.disconnect().await?;
        info!("Disconnected from {}.", self.label);
        Ok(())
    }
}

/// Compare a configured address against a peripheral's MAC or platform id
///
/// macOS hides MAC addresses, so CoreBluetooth UUIDs are accepted too.
fn matches_address(mac: &str, id: &str, wanted: &str) -> bool {
    let wanted = wanted.trim();
    !wanted.is_empty() && (mac.eq_ignore_ascii_case(wanted) || id.eq_ignore_ascii_case(wanted))
}

/// First peripheral whose MAC or platform id matches `wanted`
fn select_peripheral<P>(
    peripherals: Vec<P>,
    wanted: &str,
    ids: impl Fn(&P) -> (String, String),
) -> Option<P> {
    peripherals.into_iter().find(|p| {
        let (mac, id) = ids(p);
        matches_address(&mac, &id, wanted)
    })
}

fn not_found_reason(address: &str, scan_timeout: Duration, listing_error: Option<&str>) -> String {
    match listing_error {
        Some(e) => format!(
            "{} not seen within {} ms (last adapter error: {})",
            address,
            scan_timeout.as_millis(),
            e
        ),
        None => format!("{} not seen within {} ms", address, scan_timeout.as_millis()),
    }
}

#[async_trait]
impl RingTransport for BleRing {
    async fn send(&mut self, frame: CommandFrame) -> Result<()> {
        self.peripheral
            .write(&self.write_char, frame.as_bytes(), WriteType::WithoutResponse)
            .await
            .map_err(|e| RingError::Transport(format!("Failed to write frame: {}", e)))?;

        debug!("Sent frame {}", frame.to_hex());
        Ok(())
    }

    async fn subscribe(&mut self) -> Result<mpsc::Receiver<Bytes>> {
        self.peripheral.subscribe(&self.notify_char).await?;
        let mut notifications = self.peripheral.notifications().await?;

        let (tx, rx) = mpsc::channel(NOTIFICATION_CHANNEL_SIZE);
        let notify_uuid = self.notify_char.uuid;

        self.forwarder = Some(tokio::spawn(async move {
            while let Some(notification) = notifications.next().await {
                if notification.uuid != notify_uuid {
                    continue;
                }
                if tx.send(Bytes::from(notification.value)).await.is_err() {
                    break;
                }
            }
            debug!("Notification stream ended");
        }));

        Ok(rx)
    }

    async fn unsubscribe(&mut self) -> Result<()> {
        if let Some(task) = self.forwarder.take() {
            task.abort();
        }

        if let Err(e) = self.peripheral.unsubscribe(&self.notify_char).await {
            warn!("Failed to unsubscribe from notifications: {}", e);
            return Err(e.into());
        }

        Ok(())
    }
}
