//! # Measurement Report
//!
//! Formats session events and summaries for the console, as plain text or
//! JSON Lines.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::io::Write;

use crate::config::OutputFormat;
use crate::error::Result;
use crate::packet::protocol::AccelerometerSample;
use crate::session::{MeasurementKind, SessionEvent, SessionSummary};

/// One JSON Lines record
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum Record<'a> {
    Reading {
        timestamp: String,
        kind: MeasurementKind,
        value: u8,
    },
    Motion {
        timestamp: String,
        #[serde(flatten)]
        sample: AccelerometerSample,
    },
    Summary {
        timestamp: String,
        #[serde(flatten)]
        summary: &'a SessionSummary,
    },
}

/// Format a session event; state changes produce no output
pub fn format_event(
    event: &SessionEvent,
    format: OutputFormat,
    now: DateTime<Utc>,
) -> Result<Option<String>> {
    let line = match (event, format) {
        (SessionEvent::StateChanged(_), _) => return Ok(None),
        (SessionEvent::Reading { kind, value }, OutputFormat::Text) => {
            format!("{}: {} {}", reading_label(*kind), value, kind.unit())
        }
        (SessionEvent::Motion(s), OutputFormat::Text) => {
            format!("X={}, Y={}, Z={}", s.x, s.y, s.z)
        }
        (SessionEvent::Reading { kind, value }, OutputFormat::Json) => {
            serde_json::to_string(&Record::Reading {
                timestamp: timestamp(now),
                kind: *kind,
                value: *value,
            })?
        }
        (SessionEvent::Motion(sample), OutputFormat::Json) => {
            serde_json::to_string(&Record::Motion {
                timestamp: timestamp(now),
                sample: *sample,
            })?
        }
    };

    Ok(Some(line))
}

/// Format the end-of-session summary
pub fn format_summary(
    summary: &SessionSummary,
    format: OutputFormat,
    now: DateTime<Utc>,
) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(&Record::Summary {
            timestamp: timestamp(now),
            summary,
        })?),
        OutputFormat::Text => Ok(match summary.average {
            Some(average) => format!(
                "Average {}: {} {}",
                reading_label(summary.kind).to_lowercase(),
                average,
                summary.kind.unit()
            ),
            None => format!("Received {} {} samples", summary.accepted, summary.kind),
        }),
    }
}

/// Writes formatted lines to a sink (stdout in the binary)
pub struct Reporter<W: Write> {
    format: OutputFormat,
    out: W,
}

impl<W: Write> Reporter<W> {
    pub fn new(format: OutputFormat, out: W) -> Self {
        Self { format, out }
    }

    pub fn event(&mut self, event: &SessionEvent) -> Result<()> {
        if let Some(line) = format_event(event, self.format, Utc::now())? {
            writeln!(self.out, "{}", line)?;
        }
        Ok(())
    }

    pub fn summary(&mut self, summary: &SessionSummary) -> Result<()> {
        let line = format_summary(summary, self.format, Utc::now())?;
        writeln!(self.out, "{}", line)?;
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

fn reading_label(kind: MeasurementKind) -> &'static str {
    match kind {
        MeasurementKind::HeartRate => "Heart rate",
        MeasurementKind::Spo2 => "Blood oxygen saturation level",
        MeasurementKind::RawMotion => "Acceleration",
    }
}

fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{SessionState, StreamExit};
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
    }

    fn spo2_summary() -> SessionSummary {
        SessionSummary {
            kind: MeasurementKind::Spo2,
            exit: StreamExit::ThresholdReached,
            accepted: 5,
            average: Some(97),
            stop_sent: true,
        }
    }

    #[test]
    fn test_text_readings() {
        let hr = SessionEvent::Reading { kind: MeasurementKind::HeartRate, value: 72 };
        let spo2 = SessionEvent::Reading { kind: MeasurementKind::Spo2, value: 98 };

        assert_eq!(
            format_event(&hr, OutputFormat::Text, fixed_time()).unwrap().as_deref(),
            Some("Heart rate: 72 bpm")
        );
        assert_eq!(
            format_event(&spo2, OutputFormat::Text, fixed_time()).unwrap().as_deref(),
            Some("Blood oxygen saturation level: 98 %")
        );
    }

    #[test]
    fn test_text_motion() {
        let event = SessionEvent::Motion(AccelerometerSample { x: 100, y: -50, z: 2000 });
        assert_eq!(
            format_event(&event, OutputFormat::Text, fixed_time()).unwrap().as_deref(),
            Some("X=100, Y=-50, Z=2000")
        );
    }

    #[test]
    fn test_state_changes_are_silent() {
        let event = SessionEvent::StateChanged(SessionState::Streaming);
        assert_eq!(format_event(&event, OutputFormat::Text, fixed_time()).unwrap(), None);
        assert_eq!(format_event(&event, OutputFormat::Json, fixed_time()).unwrap(), None);
    }

    #[test]
    fn test_json_reading() {
        let event = SessionEvent::Reading { kind: MeasurementKind::HeartRate, value: 72 };
        let line = format_event(&event, OutputFormat::Json, fixed_time()).unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&line).unwrap();

        assert_eq!(json["event"], "reading");
        assert_eq!(json["kind"], "heart-rate");
        assert_eq!(json["value"], 72);
        assert_eq!(json["timestamp"], "2024-05-01T12:30:00.000Z");
    }

    #[test]
    fn test_json_motion() {
        let event = SessionEvent::Motion(AccelerometerSample { x: -1, y: 2, z: -3 });
        let line = format_event(&event, OutputFormat::Json, fixed_time()).unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&line).unwrap();

        assert_eq!(json["event"], "motion");
        assert_eq!(json["x"], -1);
        assert_eq!(json["y"], 2);
        assert_eq!(json["z"], -3);
    }

    #[test]
    fn test_text_summary() {
        let line = format_summary(&spo2_summary(), OutputFormat::Text, fixed_time()).unwrap();
        assert_eq!(line, "Average blood oxygen saturation level: 97 %");

        let raw = SessionSummary {
            kind: MeasurementKind::RawMotion,
            exit: StreamExit::Cancelled,
            accepted: 12,
            average: None,
            stop_sent: true,
        };
        let line = format_summary(&raw, OutputFormat::Text, fixed_time()).unwrap();
        assert_eq!(line, "Received 12 raw accelerometer samples");
    }

    #[test]
    fn test_json_summary() {
        let line = format_summary(&spo2_summary(), OutputFormat::Json, fixed_time()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&line).unwrap();

        assert_eq!(json["event"], "summary");
        assert_eq!(json["kind"], "spo2");
        assert_eq!(json["average"], 97);
        assert_eq!(json["stop_sent"], true);
    }

    #[test]
    fn test_reporter_writes_lines() {
        let mut reporter = Reporter::new(OutputFormat::Text, Vec::new());
        reporter
            .event(&SessionEvent::StateChanged(SessionState::Starting))
            .unwrap();
        reporter
            .event(&SessionEvent::Reading { kind: MeasurementKind::HeartRate, value: 65 })
            .unwrap();
        reporter.summary(&spo2_summary()).unwrap();

        let output = String::from_utf8(reporter.into_inner()).unwrap();
        assert_eq!(
            output,
            "Heart rate: 65 bpm\nAverage blood oxygen saturation level: 97 %\n"
        );
    }
}
