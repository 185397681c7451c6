use crate::types::HeaderMap;
use std::ops::Range;

/// Byte range of the input presumed to hold one header+frame recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogCandidate {
    /// Zero-based position of the recording within the file
    pub index: usize,
    pub range: Range<usize>,
}

impl LogCandidate {
    pub fn bytes<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        &data[self.range.clone()]
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// One decoded recording: headers, channel names and the main-frame samples.
///
/// Frames are stored row-major in a single buffer; every frame has exactly
/// `field_names.len()` values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedLog {
    pub headers: HeaderMap,
    pub field_names: Vec<String>,
    values: Vec<i64>,
}

impl DecodedLog {
    pub fn new(headers: HeaderMap, field_names: Vec<String>) -> Self {
        Self {
            headers,
            field_names,
            values: Vec::new(),
        }
    }

    /// Append one frame; short frames are zero-padded and long ones truncated
    pub fn push_frame(&mut self, frame: &[i64]) {
        let width = self.width();
        if width == 0 {
            return;
        }
        let take = frame.len().min(width);
        self.values.extend_from_slice(&frame[..take]);
        self.values.extend(std::iter::repeat(0).take(width - take));
    }

    pub fn width(&self) -> usize {
        self.field_names.len()
    }

    pub fn frame_count(&self) -> usize {
        match self.width() {
            0 => 0,
            w => self.values.len() / w,
        }
    }

    pub fn frame(&self, index: usize) -> Option<&[i64]> {
        let w = self.width();
        if index >= self.frame_count() {
            return None;
        }
        Some(&self.values[index * w..(index + 1) * w])
    }

    pub fn frames(&self) -> impl Iterator<Item = &[i64]> {
        // chunks_exact panics on zero; an empty slice yields no frames either way
        self.values.chunks_exact(self.width().max(1))
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.field_names.iter().position(|n| n == name)
    }

    /// All values of one channel, in frame order
    pub fn column(&self, index: usize) -> Vec<i64> {
        if index >= self.width() {
            return Vec::new();
        }
        self.frames().map(|frame| frame[index]).collect()
    }
}
