//! Blackbox binary decoding
//!
//! The digest pipeline only needs "bytes of one recording in, header map and
//! row-major frame table out"; [`LogDecoder`] is that seam. [`BlackboxDecoder`]
//! is the built-in implementation for Betaflight-family logs.

pub mod codec;
pub mod event;
pub mod frame;
pub mod header;
pub mod stream;

pub use codec::PredictorContext;
pub use event::{EventOutcome, LogEvent};
pub use frame::{parse_frames, FrameIntervals, FrameStats};
pub use header::{header_end, parse_headers_from_text, LogDefinitions};
pub use stream::BBLDataStream;

use crate::types::{DecodedLog, HeaderMap};
use anyhow::{bail, Result};
use tracing::debug;

/// Turns the bytes of a single recording into headers and a frame table
pub trait LogDecoder {
    fn decode(&self, data: &[u8]) -> Result<DecodedLog>;
}

impl<F> LogDecoder for F
where
    F: Fn(&[u8]) -> Result<DecodedLog>,
{
    fn decode(&self, data: &[u8]) -> Result<DecodedLog> {
        self(data)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BlackboxDecoder;

impl LogDecoder for BlackboxDecoder {
    fn decode(&self, data: &[u8]) -> Result<DecodedLog> {
        let split = header_end(data);
        let header_text = String::from_utf8_lossy(&data[..split]);
        let (headers, defs) = parse_headers_from_text(&header_text)?;

        if defs.i_frame.is_empty() {
            bail!("log header has no I-frame field definitions");
        }
        if defs.p_frame.count() > defs.i_frame.count() {
            bail!(
                "P-frame definition has {} fields but I-frame only {}",
                defs.p_frame.count(),
                defs.i_frame.count()
            );
        }

        debug!(
            headers = headers.len(),
            fields = defs.i_frame.count(),
            binary_bytes = data.len() - split,
            "parsed log header"
        );

        let mut log = DecodedLog::new(HeaderMap::new(), defs.i_frame.field_names());
        let stats = parse_frames(&data[split..], &defs, &headers, &mut log);
        log.headers = headers;

        debug!(main_frames = stats.main_frames(), "decoded recording");
        Ok(log)
    }
}
