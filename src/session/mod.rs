//! # Measurement Session Module
//!
//! Drives one start -> stream -> stop measurement against a ring transport.
//!
//! ## Lifecycle
//!
//! ```text
//! Idle -> Starting -> Streaming -> Stopping -> Closed
//! ```
//!
//! - **Starting**: start frame and subscription, separated by the settling delay
//! - **Streaming**: notifications decoded and reported
//! - **Stopping**: stop frame sent (always, exactly once)
//! - **Closed**: subscription released, summary produced
//!
//! A session ends streaming when the SpO2 reading limit is reached, when its
//! cancellation token fires, or when the notification stream closes. Transport
//! failures never abort teardown.

pub mod kind;

pub use kind::MeasurementKind;

use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::SessionConfig;
use crate::packet::decoder::decode_notification;
use crate::packet::protocol::{AccelerometerSample, CommandFrame, Notification};
use crate::transport::RingTransport;

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Starting,
    Streaming,
    Stopping,
    Closed,
}

/// Why the streaming phase ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "detail")]
pub enum StreamExit {
    /// Bounded measurement collected all readings
    ThresholdReached,

    /// Cancellation token fired
    Cancelled,

    /// Transport closed the notification stream
    StreamClosed,

    /// A start/continue frame or the subscription failed
    TransportFailed(String),
}

/// Value reported to the caller while a session runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Lifecycle transition
    StateChanged(SessionState),

    /// Accepted heart rate or SpO2 reading
    Reading { kind: MeasurementKind, value: u8 },

    /// Accepted accelerometer sample
    Motion(AccelerometerSample),
}

/// End-of-session report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub kind: MeasurementKind,
    pub exit: StreamExit,

    /// Number of accepted readings or samples
    pub accepted: usize,

    /// Truncated mean of accepted readings; `None` for unsummarized kinds
    pub average: Option<u8>,

    /// Whether the stop frame reached the transport
    pub stop_sent: bool,
}

/// Timing and limits applied to every session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Wait between start and continue frames for real-time readings
    pub settle_delay: Duration,

    /// Wait between subscribing and enabling the raw sensor
    pub raw_motion_settle: Duration,

    /// Readings collected before an SpO2 session stops itself
    pub spo2_max_readings: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&SessionConfig::default())
    }
}

impl From<&SessionConfig> for SessionSettings {
    fn from(config: &SessionConfig) -> Self {
        Self {
            settle_delay: Duration::from_millis(config.settle_delay_ms),
            raw_motion_settle: Duration::from_millis(config.raw_motion_settle_ms),
            spo2_max_readings: config.spo2_max_readings,
        }
    }
}

/// One measurement interaction with the ring
///
/// The session owns its readings; `run` consumes it, so a closed session
/// cannot be restarted.
pub struct MeasurementSession {
    kind: MeasurementKind,
    settings: SessionSettings,
    cancel: CancellationToken,
    events: mpsc::UnboundedSender<SessionEvent>,
    state: SessionState,
    readings: Vec<u8>,
    motion_samples: usize,
    subscribed: bool,
}

impl MeasurementSession {
    /// Create an idle session
    ///
    /// # Arguments
    ///
    /// * `kind` - What to measure
    /// * `settings` - Delays and reading limits
    /// * `cancel` - External stop signal, observed while streaming
    /// * `events` - Receives readings and state transitions
    pub fn new(
        kind: MeasurementKind,
        settings: SessionSettings,
        cancel: CancellationToken,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        Self {
            kind,
            settings,
            cancel,
            events,
            state: SessionState::Idle,
            readings: Vec::new(),
            motion_samples: 0,
            subscribed: false,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Run the session to completion
    ///
    /// Always sends exactly one stop frame, including after a failed start or
    /// a cancellation during the settling delay.
    pub async fn run<T>(mut self, transport: &mut T) -> SessionSummary
    where
        T: RingTransport + ?Sized,
    {
        info!("Starting {} measurement", self.kind);

        let exit = match self.start(transport).await {
            Ok(mut notifications) => self.stream(&mut notifications).await,
            Err(exit) => exit,
        };

        let stop_sent = self.stop(transport).await;
        self.close(transport).await;

        let summary = SessionSummary {
            kind: self.kind,
            exit,
            accepted: self.accepted(),
            average: self.kind.is_summarized().then(|| self.average()),
            stop_sent,
        };
        info!("Measurement ended: {:?}", summary.exit);
        summary
    }

    /// Idle -> Starting -> Streaming
    ///
    /// Real-time kinds send start, settle, send continue, then subscribe.
    /// Raw motion subscribes first and settles before enabling the sensor,
    /// so the first samples after the enable frame are not lost.
    async fn start<T>(&mut self, transport: &mut T) -> Result<mpsc::Receiver<Bytes>, StreamExit>
    where
        T: RingTransport + ?Sized,
    {
        self.transition(SessionState::Starting);

        let notifications = if self.kind.subscribes_before_start() {
            let notifications = self.subscribe(transport).await?;
            self.settle().await?;
            self.send(transport, self.kind.start_frame(), "start").await?;
            notifications
        } else {
            self.send(transport, self.kind.start_frame(), "start").await?;
            self.settle().await?;
            if let Some(frame) = self.kind.continue_frame() {
                self.send(transport, frame, "continue").await?;
            }
            self.subscribe(transport).await?
        };

        self.transition(SessionState::Streaming);
        info!("Waiting for {} data... (Stop with Ctrl + c)", self.kind);
        Ok(notifications)
    }

    async fn subscribe<T>(&mut self, transport: &mut T) -> Result<mpsc::Receiver<Bytes>, StreamExit>
    where
        T: RingTransport + ?Sized,
    {
        let notifications = transport.subscribe().await.map_err(|e| {
            error!("Failed to subscribe to notifications: {}", e);
            StreamExit::TransportFailed(e.to_string())
        })?;
        self.subscribed = true;
        Ok(notifications)
    }

    /// Settling delay; cancellation cuts it short
    async fn settle(&self) -> Result<(), StreamExit> {
        let settle = self.kind.settle_delay(&self.settings);
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(StreamExit::Cancelled),
            _ = tokio::time::sleep(settle) => Ok(()),
        }
    }

    /// Streaming self-loop; the single point observing cancellation
    async fn stream(&mut self, notifications: &mut mpsc::Receiver<Bytes>) -> StreamExit {
        loop {
            let frame = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    info!("Measurement is ended...");
                    return StreamExit::Cancelled;
                }
                frame = notifications.recv() => frame,
            };

            let Some(frame) = frame else {
                warn!("Notification stream closed by transport");
                return StreamExit::StreamClosed;
            };

            self.handle_notification(&frame);

            if self.limit_reached() {
                info!("Collected {} readings", self.readings.len());
                return StreamExit::ThresholdReached;
            }
        }
    }

    /// Route one notification; frames for other kinds are dropped
    fn handle_notification(&mut self, frame: &[u8]) {
        match (decode_notification(frame), self.kind) {
            (Notification::RealTime(reading), MeasurementKind::HeartRate | MeasurementKind::Spo2) => {
                self.readings.push(reading.value);
                self.emit(SessionEvent::Reading { kind: self.kind, value: reading.value });
            }
            (Notification::Accelerometer(sample), MeasurementKind::RawMotion) => {
                self.motion_samples += 1;
                self.emit(SessionEvent::Motion(sample));
            }
            _ => debug!("Invalid data received. Skipping... ({:02X?})", frame),
        }
    }

    /// Streaming -> Stopping; returns whether the stop frame was sent
    async fn stop<T>(&mut self, transport: &mut T) -> bool
    where
        T: RingTransport + ?Sized,
    {
        self.transition(SessionState::Stopping);
        self.send(transport, self.kind.stop_frame(), "stop").await.is_ok()
    }

    /// Stopping -> Closed
    async fn close<T>(&mut self, transport: &mut T)
    where
        T: RingTransport + ?Sized,
    {
        if self.subscribed {
            if let Err(e) = transport.unsubscribe().await {
                warn!("Failed to release notifications: {}", e);
            }
            self.subscribed = false;
        }
        self.transition(SessionState::Closed);
    }

    async fn send<T>(&self, transport: &mut T, frame: CommandFrame, what: &str) -> Result<(), StreamExit>
    where
        T: RingTransport + ?Sized,
    {
        info!("Send {} package: {}", what, frame.to_hex());
        transport.send(frame).await.map_err(|e| {
            warn!("Failed to send {} package: {}", what, e);
            StreamExit::TransportFailed(e.to_string())
        })
    }

    fn limit_reached(&self) -> bool {
        self.kind
            .reading_limit(&self.settings)
            .is_some_and(|limit| self.readings.len() >= limit)
    }

    fn accepted(&self) -> usize {
        match self.kind {
            MeasurementKind::RawMotion => self.motion_samples,
            _ => self.readings.len(),
        }
    }

    /// Truncated arithmetic mean, zero when nothing was accepted
    fn average(&self) -> u8 {
        if self.readings.is_empty() {
            return 0;
        }
        let sum: u32 = self.readings.iter().map(|&v| v as u32).sum();
        (sum / self.readings.len() as u32) as u8
    }

    fn transition(&mut self, next: SessionState) {
        debug!("Session {:?} -> {:?}", self.state, next);
        self.state = next;
        self.emit(SessionEvent::StateChanged(next));
    }

    fn emit(&self, event: SessionEvent) {
        // Receiver gone means nobody is printing; keep measuring regardless
        let _ = self.events.send(event);
    }
}
