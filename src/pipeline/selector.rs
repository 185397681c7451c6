use crate::error::{DigestError, Result};
use crate::parser::LogDecoder;
use crate::types::{DecodedLog, LogCandidate};
use tracing::{debug, warn};

/// Recordings shorter than this are kept but score zero duration
pub const MIN_SCORED_FRAMES: usize = 10;

/// The recording chosen from a possibly multi-recording file
#[derive(Debug, Clone)]
pub struct SelectedRecording {
    pub log: DecodedLog,
    pub index: usize,
    pub log_count: usize,
    pub duration_s: f64,
}

/// Flight duration used to rank recordings.
///
/// Uses the first and last `time` values when the log carries a time channel,
/// otherwise assumes a 1 kHz loop. Logs with fewer than
/// [`MIN_SCORED_FRAMES`] frames score zero.
pub fn recording_duration(log: &DecodedLog) -> f64 {
    let frame_count = log.frame_count();
    if frame_count < MIN_SCORED_FRAMES {
        return 0.0;
    }

    match log.field_index("time") {
        Some(time_idx) => {
            let first = log.frame(0).map(|f| f[time_idx]).unwrap_or(0);
            let last = log.frame(frame_count - 1).map(|f| f[time_idx]).unwrap_or(0);
            (last - first) as f64 / 1_000_000.0
        }
        None => frame_count as f64 / 1000.0,
    }
}

/// Decode candidates and keep the one to digest.
///
/// With `select_longest` the recording with the greatest duration wins (ties
/// go to the earliest); otherwise the first candidate that decodes is used. A
/// candidate that fails to decode is skipped. Only the current best decoded
/// log is held in memory.
///
/// # Errors
///
/// [`DigestError::NoRecordings`] for an empty candidate list and
/// [`DigestError::Decode`] with the last failure when nothing decodes.
pub fn select_recording<D: LogDecoder + ?Sized>(
    data: &[u8],
    candidates: &[LogCandidate],
    decoder: &D,
    select_longest: bool,
) -> Result<SelectedRecording> {
    if candidates.is_empty() {
        return Err(DigestError::NoRecordings);
    }

    let log_count = candidates.len();
    let mut best: Option<SelectedRecording> = None;
    let mut last_error = None;

    for candidate in candidates {
        let log = match decoder.decode(candidate.bytes(data)) {
            Ok(log) => log,
            Err(err) => {
                warn!(
                    recording = candidate.index,
                    error = %err,
                    "skipping recording that failed to decode"
                );
                last_error = Some(err);
                continue;
            }
        };

        let duration_s = recording_duration(&log);
        debug!(
            recording = candidate.index,
            frames = log.frame_count(),
            duration_s,
            "decoded recording"
        );

        let better = best
            .as_ref()
            .map_or(true, |current| duration_s > current.duration_s);
        if better {
            best = Some(SelectedRecording {
                log,
                index: candidate.index,
                log_count,
                duration_s,
            });
        }

        if !select_longest {
            break;
        }
    }

    best.ok_or_else(|| {
        let message = last_error
            .map(|err| format!("{:#}", err))
            .unwrap_or_else(|| "no decodable recording".to_string());
        DigestError::Decode(message)
    })
}
