//! Event frame parsing
//!
//! E-frames carry out-of-band events (beeps, adjustments, disarm, mode
//! changes, log end). None of them feed the digest, but each must be consumed
//! byte-exactly so the main frames after it stay aligned.

use crate::parser::stream::BBLDataStream;
use anyhow::{bail, Result};
use tracing::{debug, trace};

pub const EVENT_SYNC_BEEP: u8 = 0;
pub const EVENT_INFLIGHT_ADJUSTMENT: u8 = 13;
pub const EVENT_LOGGING_RESUME: u8 = 14;
pub const EVENT_DISARM: u8 = 15;
pub const EVENT_FLIGHT_MODE: u8 = 30;
pub const EVENT_LOG_END: u8 = 255;

const END_OF_LOG_MESSAGE: &[u8] = b"End of log\0";

#[derive(Debug, Clone, PartialEq)]
pub enum LogEvent {
    SyncBeep { time: u32 },
    InflightAdjustment { function: u8, value: i64 },
    LoggingResume { iteration: u32, time: u32 },
    Disarm { reason: u32 },
    FlightMode { flags: u32, last_flags: u32 },
    LogEnd,
}

/// Result of reading one E-frame through the tolerant entry point
#[derive(Debug)]
pub enum EventOutcome {
    Parsed(LogEvent),
    /// Event could not be decoded; the caller resynchronizes and keeps going
    Skipped(anyhow::Error),
}

/// Parse the event body following an `E` marker
pub fn parse_e_frame(stream: &mut BBLDataStream) -> Result<LogEvent> {
    let event_type = stream.read_byte()?;

    let event = match event_type {
        EVENT_SYNC_BEEP => LogEvent::SyncBeep {
            time: stream.read_unsigned_vb()?,
        },
        EVENT_INFLIGHT_ADJUSTMENT => {
            let function = stream.read_byte()?;
            // High bit marks a raw 32-bit float payload
            let value = if function & 0x80 != 0 {
                stream.read_s32_le()?
            } else {
                stream.read_signed_vb()?
            };
            LogEvent::InflightAdjustment { function, value }
        }
        EVENT_LOGGING_RESUME => LogEvent::LoggingResume {
            iteration: stream.read_unsigned_vb()?,
            time: stream.read_unsigned_vb()?,
        },
        EVENT_DISARM => LogEvent::Disarm {
            reason: stream.read_unsigned_vb()?,
        },
        EVENT_FLIGHT_MODE => LogEvent::FlightMode {
            flags: stream.read_unsigned_vb()?,
            last_flags: stream.read_unsigned_vb()?,
        },
        EVENT_LOG_END => {
            let message = stream.read_bytes(END_OF_LOG_MESSAGE.len())?;
            if message != END_OF_LOG_MESSAGE {
                bail!("log end event without end-of-log message");
            }
            LogEvent::LogEnd
        }
        other => bail!("unknown event type {}", other),
    };

    trace!(?event, "event frame");
    Ok(event)
}

/// Parse an event, turning any decoding failure into [`EventOutcome::Skipped`]
pub fn parse_e_frame_tolerant(stream: &mut BBLDataStream) -> EventOutcome {
    let start = stream.position();
    match parse_e_frame(stream) {
        Ok(event) => EventOutcome::Parsed(event),
        Err(err) => {
            debug!(offset = start, error = %err, "skipping undecodable event");
            EventOutcome::Skipped(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disarm_event() {
        let mut stream = BBLDataStream::new(&[EVENT_DISARM, 0x04]);
        assert_eq!(
            parse_e_frame(&mut stream).unwrap(),
            LogEvent::Disarm { reason: 4 }
        );
        assert!(stream.eof());
    }

    #[test]
    fn test_inflight_adjustment_float_payload() {
        let mut stream = BBLDataStream::new(&[EVENT_INFLIGHT_ADJUSTMENT, 0x81, 1, 0, 0, 0]);
        assert_eq!(
            parse_e_frame(&mut stream).unwrap(),
            LogEvent::InflightAdjustment {
                function: 0x81,
                value: 1
            }
        );
        assert!(stream.eof());
    }

    #[test]
    fn test_log_end() {
        let mut data = vec![EVENT_LOG_END];
        data.extend_from_slice(END_OF_LOG_MESSAGE);
        let mut stream = BBLDataStream::new(&data);
        assert_eq!(parse_e_frame(&mut stream).unwrap(), LogEvent::LogEnd);
    }

    #[test]
    fn test_unknown_event_is_skipped_not_fatal() {
        let mut stream = BBLDataStream::new(&[200, 1, 2]);
        assert!(matches!(
            parse_e_frame_tolerant(&mut stream),
            EventOutcome::Skipped(_)
        ));
    }

    #[test]
    fn test_truncated_event_is_skipped() {
        let mut stream = BBLDataStream::new(&[EVENT_LOGGING_RESUME, 0x80]);
        assert!(matches!(
            parse_e_frame_tolerant(&mut stream),
            EventOutcome::Skipped(_)
        ));
    }
}
