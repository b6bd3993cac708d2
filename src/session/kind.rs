//! Measurement kinds and the frames each one uses.

use serde::Serialize;
use std::fmt;
use std::time::Duration;

use super::SessionSettings;
use crate::packet::encoder::{
    continue_packet, disable_raw_sensor_packet, enable_raw_sensor_packet, start_packet,
    stop_packet,
};
use crate::packet::protocol::{CommandFrame, ReadingType};

/// What a session measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MeasurementKind {
    /// Real-time heart rate (bpm), runs until cancelled
    HeartRate,

    /// Real-time blood oxygen saturation (%), stops after a fixed number of readings
    Spo2,

    /// Raw accelerometer stream, runs until cancelled
    RawMotion,
}

impl MeasurementKind {
    /// Reading type code for real-time kinds
    pub fn reading_type(self) -> Option<ReadingType> {
        match self {
            MeasurementKind::HeartRate => Some(ReadingType::HeartRate),
            MeasurementKind::Spo2 => Some(ReadingType::Spo2),
            MeasurementKind::RawMotion => None,
        }
    }

    pub fn start_frame(self) -> CommandFrame {
        match self.reading_type() {
            Some(rt) => start_packet(rt),
            None => enable_raw_sensor_packet(),
        }
    }

    /// Sent once the settling delay has passed; raw motion has none
    pub fn continue_frame(self) -> Option<CommandFrame> {
        self.reading_type().map(continue_packet)
    }

    pub fn stop_frame(self) -> CommandFrame {
        match self.reading_type() {
            Some(rt) => stop_packet(rt),
            None => disable_raw_sensor_packet(),
        }
    }

    /// Whether the notification subscription is opened before the start frame
    ///
    /// The raw sensor streams as soon as it is enabled, so raw motion listens
    /// first and enables afterwards. Real-time kinds subscribe after the
    /// continue frame.
    pub fn subscribes_before_start(self) -> bool {
        self.reading_type().is_none()
    }

    /// Whether accepted readings are averaged into the summary
    pub fn is_summarized(self) -> bool {
        self.reading_type().is_some()
    }

    /// Readings after which the session stops on its own
    pub fn reading_limit(self, settings: &SessionSettings) -> Option<usize> {
        match self {
            MeasurementKind::Spo2 => Some(settings.spo2_max_readings),
            _ => None,
        }
    }

    pub fn settle_delay(self, settings: &SessionSettings) -> Duration {
        match self {
            MeasurementKind::RawMotion => settings.raw_motion_settle,
            _ => settings.settle_delay,
        }
    }

    /// Unit printed after a reading
    pub fn unit(self) -> &'static str {
        match self {
            MeasurementKind::HeartRate => "bpm",
            MeasurementKind::Spo2 => "%",
            MeasurementKind::RawMotion => "",
        }
    }
}

impl fmt::Display for MeasurementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MeasurementKind::HeartRate => "heart rate",
            MeasurementKind::Spo2 => "blood oxygen saturation",
            MeasurementKind::RawMotion => "raw accelerometer",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::protocol::{CMD_START_REAL_TIME, CMD_STOP_REAL_TIME};

    #[test]
    fn test_real_time_frames() {
        let kind = MeasurementKind::Spo2;
        assert_eq!(kind.start_frame(), start_packet(ReadingType::Spo2));
        assert_eq!(kind.continue_frame(), Some(continue_packet(ReadingType::Spo2)));
        assert_eq!(kind.stop_frame().command(), CMD_STOP_REAL_TIME);
        assert_eq!(kind.stop_frame().sub_payload()[0], 3);
    }

    #[test]
    fn test_raw_motion_frames() {
        let kind = MeasurementKind::RawMotion;
        assert_eq!(kind.start_frame().as_bytes()[..2], [0xA1, 0x04]);
        assert_eq!(kind.continue_frame(), None);
        assert_eq!(kind.stop_frame().as_bytes()[..2], [0xA1, 0x02]);
        assert_ne!(kind.start_frame().command(), CMD_START_REAL_TIME);
    }

    #[test]
    fn test_reading_limits() {
        let settings = SessionSettings::default();
        assert_eq!(MeasurementKind::Spo2.reading_limit(&settings), Some(5));
        assert_eq!(MeasurementKind::HeartRate.reading_limit(&settings), None);
        assert_eq!(MeasurementKind::RawMotion.reading_limit(&settings), None);
    }

    #[test]
    fn test_settle_delays() {
        let settings = SessionSettings::default();
        assert_eq!(MeasurementKind::HeartRate.settle_delay(&settings), Duration::from_millis(500));
        assert_eq!(MeasurementKind::RawMotion.settle_delay(&settings), Duration::from_millis(2000));
    }

    #[test]
    fn test_subscription_order() {
        assert!(MeasurementKind::RawMotion.subscribes_before_start());
        assert!(!MeasurementKind::HeartRate.subscribes_before_start());
        assert!(!MeasurementKind::Spo2.subscribes_before_start());
    }

    #[test]
    fn test_summarized_kinds() {
        assert!(MeasurementKind::HeartRate.is_summarized());
        assert!(MeasurementKind::Spo2.is_summarized());
        assert!(!MeasurementKind::RawMotion.is_summarized());
    }
}
