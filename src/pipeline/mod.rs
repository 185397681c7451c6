//! Post-decode digest pipeline
//!
//! Segmenter → selector → field extraction → flight segment isolation →
//! statistics and budgeted downsampling. Header classification runs on the
//! selected recording's settings and is merged into the document.

pub mod classify;
pub mod downsample;
pub mod fields;
pub mod segmenter;
pub mod segments;
pub mod selector;
pub mod stats;

pub use classify::build_cli_sections;
pub use downsample::{fit_to_budget, Downsampled, RateChoice};
pub use fields::{extract_columns, sample_timing};
pub use segmenter::{split_recordings, LOG_START_MARKER};
pub use segments::{detect_segments, longest_segment, FlightSegment};
pub use selector::{recording_duration, select_recording, SelectedRecording};
pub use stats::{motor_imbalance, peak_frequency, rms, summarize};

use crate::config::DigestConfig;
use crate::conversion::round_to;
use crate::error::{DigestError, Result};
use crate::export::json_chars;
use crate::parser::{header_end, parse_headers_from_text, LogDecoder};
use crate::types::{HeaderDigest, HeaderMap, HeaderMeta, Meta, OutputDocument};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// A finished digest with its compact serialization
#[derive(Debug, Clone)]
pub struct Digest {
    pub document: OutputDocument,
    /// Compact JSON, the form the character budget applies to
    pub json: String,
    pub input_bytes: usize,
    pub used_fallback: bool,
}

impl Digest {
    pub fn chars(&self) -> usize {
        json_chars(&self.json)
    }

    pub fn within_budget(&self, max_chars: usize) -> bool {
        self.chars() <= max_chars
    }
}

fn identity(headers: &HeaderMap) -> (String, String, String) {
    (
        headers.get_string("Firmware revision"),
        headers.get_string("Board information"),
        headers.get_string("Craft name"),
    )
}

/// Run the whole pipeline over an in-memory log file
///
/// # Errors
///
/// Fails on invalid configuration, when the buffer holds no recording, when
/// no recording decodes, or when the chosen recording has no frames.
pub fn digest_bytes<D: LogDecoder + ?Sized>(
    data: &[u8],
    decoder: &D,
    config: &DigestConfig,
) -> Result<Digest> {
    config.validate()?;

    let candidates = split_recordings(data);
    debug!(bytes = data.len(), recordings = candidates.len(), "split input");
    if candidates.is_empty() {
        return Err(DigestError::NoRecordings);
    }

    let selected = select_recording(data, &candidates, decoder, config.select_longest_log)?;
    let frame_count = selected.log.frame_count();
    if frame_count == 0 {
        return Err(DigestError::EmptyRecording(selected.index));
    }
    debug!(
        recording = selected.index,
        of = selected.log_count,
        frames = frame_count,
        duration_s = selected.duration_s,
        "selected recording"
    );

    let timing = sample_timing(&selected.log.headers, config);
    let columns = extract_columns(&selected.log, &timing);
    let headers = selected.log.headers;
    let cli = build_cli_sections(&headers);
    let (fw, board, craft) = identity(&headers);

    let segments = if config.split_segments {
        detect_segments(
            &columns.time_us,
            config.gap_threshold_us,
            config.min_segment_samples,
        )
    } else {
        vec![FlightSegment {
            start: 0,
            end: columns.len(),
            duration_s: columns
                .time_us
                .last()
                .zip(columns.time_us.first())
                .map(|(last, first)| (last - first) as f64 / 1_000_000.0)
                .unwrap_or(0.0),
        }]
    };
    let (segment_index, segment) =
        longest_segment(&segments).ok_or(DigestError::EmptyRecording(selected.index))?;
    debug!(
        segments = segments.len(),
        chosen = segment_index,
        start = segment.start,
        end = segment.end,
        duration_s = segment.duration_s,
        "isolated flight segment"
    );

    let columns = columns.slice(segment.start..segment.end);
    let stats = summarize(&columns, timing.original_rate_hz);

    let base_meta = Meta {
        fw,
        board,
        craft,
        duration_s: round_to(segment.duration_s, 1),
        total_frames: columns.len(),
        sample_rate_hz: 0.0,
        effective_rate_hz: 0.0,
        points: 0,
        original_rate_hz: timing.original_rate_hz,
        looptime: timing.looptime_us,
        pid_denom: timing.pid_denom,
        log_count: selected.log_count,
        log_index: selected.index,
        segment_count: segments.len(),
        segment_index,
    };

    let downsampled = fit_to_budget(&columns, timing.original_rate_hz, config, |frames, choice| {
        OutputDocument {
            meta: Meta {
                sample_rate_hz: choice.rate_hz,
                effective_rate_hz: round_to(choice.effective_rate_hz(timing.original_rate_hz), 1),
                points: choice.points,
                ..base_meta.clone()
            },
            cli: cli.clone(),
            stats: stats.clone(),
            frames,
        }
    })?;

    info!(
        chars = downsampled.chars(),
        rate_hz = downsampled.choice.rate_hz,
        points = downsampled.choice.points,
        fallback = downsampled.choice.fallback,
        "digest complete"
    );

    Ok(Digest {
        document: downsampled.document,
        json: downsampled.json,
        input_bytes: data.len(),
        used_fallback: downsampled.choice.fallback,
    })
}

/// Read a log file and digest it
pub fn digest_file<D: LogDecoder + ?Sized>(
    path: &Path,
    decoder: &D,
    config: &DigestConfig,
) -> Result<Digest> {
    let data = fs::read(path)?;
    digest_bytes(&data, decoder, config)
}

/// Identity, timing and classified settings of the first recording, without
/// decoding any frames
pub fn digest_header(data: &[u8], config: &DigestConfig) -> Result<HeaderDigest> {
    let candidate = split_recordings(data)
        .into_iter()
        .next()
        .ok_or(DigestError::NoRecordings)?;
    let bytes = candidate.bytes(data);
    let header_text = String::from_utf8_lossy(&bytes[..header_end(bytes)]);
    let (headers, _) =
        parse_headers_from_text(&header_text).map_err(|e| DigestError::Decode(format!("{:#}", e)))?;

    let timing = sample_timing(&headers, config);
    let (fw, board, craft) = identity(&headers);

    Ok(HeaderDigest {
        meta: HeaderMeta {
            fw,
            board,
            craft,
            looptime: timing.looptime_us,
            pid_denom: timing.pid_denom,
            sample_rate_hz: timing.original_rate_hz.round(),
        },
        cli: build_cli_sections(&headers),
    })
}
