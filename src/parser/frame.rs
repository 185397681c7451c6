use crate::parser::codec::{decode_frame_fields, PredictorContext};
use crate::parser::event::{parse_e_frame_tolerant, EventOutcome, LogEvent};
use crate::parser::header::LogDefinitions;
use crate::parser::stream::BBLDataStream;
use crate::types::{DecodedLog, FrameHistory, HeaderMap};
use anyhow::Result;
use tracing::{debug, trace};

/// Longest plausible encoded frame; anything longer is treated as corruption
const MAXIMUM_FRAME_LENGTH: usize = 256;
const FRAME_MARKERS: &[u8] = b"IPSGHE";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub i_frames: usize,
    pub p_frames: usize,
    pub s_frames: usize,
    pub g_frames: usize,
    pub h_frames: usize,
    pub e_frames: usize,
    pub skipped_events: usize,
    /// Frames that failed to decode or did not end on a frame boundary
    pub corrupt_frames: usize,
    /// Main frames that decoded but failed the time/iteration sanity check
    pub invalid_frames: usize,
    pub unknown_bytes: usize,
}

impl FrameStats {
    pub fn main_frames(&self) -> usize {
        self.i_frames + self.p_frames
    }
}

/// Logging cadence from the `I interval` / `P interval` headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameIntervals {
    pub i_interval: u32,
    pub p_num: u32,
    pub p_denom: u32,
}

impl Default for FrameIntervals {
    fn default() -> Self {
        Self {
            i_interval: 1,
            p_num: 1,
            p_denom: 1,
        }
    }
}

impl FrameIntervals {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut intervals = Self::default();

        if let Some(i) = headers
            .get_i64("I interval")
            .and_then(|v| u32::try_from(v).ok())
            .filter(|v| *v > 0)
        {
            intervals.i_interval = i;
        }

        let p_interval = headers.get_string("P interval");
        if let Some((num, denom)) = p_interval.split_once('/') {
            if let (Ok(num), Ok(denom)) = (num.trim().parse::<u32>(), denom.trim().parse::<u32>()) {
                if num > 0 && denom > 0 {
                    intervals.p_num = num;
                    intervals.p_denom = denom;
                }
            }
        }

        intervals
    }

    pub fn should_have_frame(&self, frame_index: u32) -> bool {
        let i_interval = self.i_interval.max(1);
        let p_denom = self.p_denom.max(1);
        let sum = frame_index
            .wrapping_rem(i_interval)
            .wrapping_add(self.p_num)
            .wrapping_sub(1);
        sum.wrapping_rem(p_denom) < self.p_num
    }

    /// Iterations the logger deliberately dropped after `last_iteration`
    pub fn skipped_after(&self, last_iteration: Option<u32>) -> i64 {
        const MAX_SKIPPED_FRAMES: i64 = 500;

        let Some(last) = last_iteration else {
            return 0;
        };

        let mut count = 0;
        let mut frame_index = last.wrapping_add(1);
        while count < MAX_SKIPPED_FRAMES && !self.should_have_frame(frame_index) {
            count += 1;
            frame_index = frame_index.wrapping_add(1);
        }
        count
    }
}

enum FrameKind {
    Intra,
    Inter,
    Slow,
    Gps,
    Home,
    Event(LogEvent),
}

struct FrameParser<'a> {
    defs: &'a LogDefinitions,
    ctx: PredictorContext,
    intervals: FrameIntervals,
    history: FrameHistory,
    current: Vec<i64>,
    aux: Vec<i64>,
    gps_history: Vec<i64>,
    last_iteration: Option<u32>,
    time_index: Option<usize>,
    loop_index: Option<usize>,
    stats: FrameStats,
}

impl<'a> FrameParser<'a> {
    fn new(defs: &'a LogDefinitions, headers: &HeaderMap) -> Self {
        let width = defs.i_frame.count();
        Self {
            defs,
            ctx: PredictorContext::from_headers(headers, &defs.i_frame),
            intervals: FrameIntervals::from_headers(headers),
            history: FrameHistory::new(width),
            current: vec![0; width],
            aux: Vec::new(),
            gps_history: vec![0; defs.g_frame.count()],
            last_iteration: None,
            time_index: defs.i_frame.index_of("time"),
            loop_index: defs.i_frame.index_of("loopIteration"),
            stats: FrameStats::default(),
        }
    }

    fn decode(&mut self, stream: &mut BBLDataStream, marker: u8) -> Result<FrameKind> {
        match marker {
            b'I' => {
                self.current.fill(0);
                decode_frame_fields(
                    stream,
                    &self.defs.i_frame,
                    &mut self.current,
                    None,
                    None,
                    0,
                    &self.ctx,
                )?;
                Ok(FrameKind::Intra)
            }
            b'P' => {
                self.current.copy_from_slice(&self.history.previous);
                let skipped = self.intervals.skipped_after(self.last_iteration);
                decode_frame_fields(
                    stream,
                    &self.defs.p_frame,
                    &mut self.current,
                    Some(&self.history.previous),
                    Some(&self.history.previous2),
                    skipped,
                    &self.ctx,
                )?;
                Ok(FrameKind::Inter)
            }
            b'S' => {
                self.decode_aux(stream, |defs| &defs.s_frame, None)?;
                Ok(FrameKind::Slow)
            }
            b'G' => {
                let previous = self.gps_history.clone();
                self.decode_aux(stream, |defs| &defs.g_frame, Some(&previous))?;
                Ok(FrameKind::Gps)
            }
            b'H' => {
                self.decode_aux(stream, |defs| &defs.h_frame, None)?;
                Ok(FrameKind::Home)
            }
            _ => match parse_e_frame_tolerant(stream) {
                EventOutcome::Parsed(event) => Ok(FrameKind::Event(event)),
                EventOutcome::Skipped(err) => Err(err),
            },
        }
    }

    fn decode_aux(
        &mut self,
        stream: &mut BBLDataStream,
        select: fn(&LogDefinitions) -> &crate::types::FrameDefinition,
        previous: Option<&[i64]>,
    ) -> Result<()> {
        let def = select(self.defs);
        self.aux.clear();
        self.aux.resize(def.count(), 0);
        decode_frame_fields(stream, def, &mut self.aux, previous, None, 0, &self.ctx)
    }

    fn is_valid_main_frame(&self) -> bool {
        let Some(time_index) = self.time_index else {
            return true;
        };
        let time = self.current[time_index];
        let iteration = self.loop_index.map(|idx| self.current[idx]).unwrap_or(0);
        time > 0 && (iteration > 0 || time > 1000)
    }

    fn commit_main(&mut self, intra: bool, log: &mut DecodedLog) {
        if !intra && !self.history.valid {
            // No intra frame to predict from since the last corruption
            self.stats.invalid_frames += 1;
            return;
        }

        if !self.is_valid_main_frame() {
            self.stats.invalid_frames += 1;
            self.history.invalidate();
            return;
        }

        if intra {
            self.history.reset(&self.current);
            self.stats.i_frames += 1;
        } else {
            self.history.push(&self.current);
            self.stats.p_frames += 1;
        }

        if let Some(idx) = self.loop_index {
            self.last_iteration = Some(self.current[idx] as u32);
        }
        if let Some(idx) = self.time_index {
            self.ctx.last_main_frame_time = self.current[idx];
        }
        log.push_frame(&self.current);
    }

    fn commit(&mut self, kind: FrameKind, log: &mut DecodedLog) {
        match kind {
            FrameKind::Intra => self.commit_main(true, log),
            FrameKind::Inter => self.commit_main(false, log),
            FrameKind::Slow => self.stats.s_frames += 1,
            FrameKind::Gps => {
                self.gps_history.copy_from_slice(&self.aux);
                self.stats.g_frames += 1;
            }
            FrameKind::Home => {
                if let [lat, lon, ..] = self.aux[..] {
                    self.ctx.home_coord = [lat, lon];
                }
                self.stats.h_frames += 1;
            }
            FrameKind::Event(event) => {
                if let LogEvent::LoggingResume { iteration, time } = event {
                    self.last_iteration = Some(iteration);
                    self.ctx.last_main_frame_time = time as i64;
                }
                self.stats.e_frames += 1;
            }
        }
    }
}

fn frame_ends_cleanly(stream: &BBLDataStream, frame_start: usize) -> bool {
    if stream.position() - frame_start > MAXIMUM_FRAME_LENGTH {
        return false;
    }
    match stream.peek_byte() {
        None => true,
        Some(next) => FRAME_MARKERS.contains(&next),
    }
}

/// Decode the binary frame section of one recording, appending every
/// accepted main frame to `log`.
///
/// Corrupt frames never abort decoding: the stream resynchronizes one byte
/// past the failed frame's marker and continues until the data or a log-end
/// event is reached.
pub fn parse_frames(
    binary_data: &[u8],
    defs: &LogDefinitions,
    headers: &HeaderMap,
    log: &mut DecodedLog,
) -> FrameStats {
    let mut parser = FrameParser::new(defs, headers);
    let mut stream = BBLDataStream::new(binary_data);

    while !stream.eof() {
        let frame_start = stream.position();
        let Ok(marker) = stream.read_byte() else {
            break;
        };

        if !FRAME_MARKERS.contains(&marker) {
            parser.stats.unknown_bytes += 1;
            continue;
        }

        match parser.decode(&mut stream, marker) {
            Ok(FrameKind::Event(LogEvent::LogEnd)) => {
                parser.stats.e_frames += 1;
                trace!(offset = frame_start, "log end event");
                break;
            }
            Ok(kind) if frame_ends_cleanly(&stream, frame_start) => parser.commit(kind, log),
            Ok(_) => {
                parser.stats.corrupt_frames += 1;
                parser.history.invalidate();
                stream.set_position(frame_start + 1);
            }
            Err(err) => {
                if marker == b'E' {
                    parser.stats.skipped_events += 1;
                } else {
                    parser.stats.corrupt_frames += 1;
                    trace!(
                        offset = frame_start,
                        marker = %(marker as char),
                        error = %err,
                        "corrupt frame"
                    );
                    parser.history.invalidate();
                }
                stream.set_position(frame_start + 1);
            }
        }
    }

    let stats = parser.stats;
    debug!(
        i = stats.i_frames,
        p = stats.p_frames,
        s = stats.s_frames,
        g = stats.g_frames,
        h = stats.h_frames,
        e = stats.e_frames,
        skipped_events = stats.skipped_events,
        corrupt = stats.corrupt_frames,
        invalid = stats.invalid_frames,
        "frame section decoded"
    );
    stats
}
