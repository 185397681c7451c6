/// A contiguous run of samples without a timestamp discontinuity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightSegment {
    pub start: usize,
    /// Exclusive
    pub end: usize,
    pub duration_s: f64,
}

impl FlightSegment {
    fn new(time_us: &[i64], start: usize, end: usize) -> Self {
        let duration_s = if end > start {
            (time_us[end - 1] - time_us[start]) as f64 / 1_000_000.0
        } else {
            0.0
        };
        Self {
            start,
            end,
            duration_s,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Split the time column at discontinuities.
///
/// A boundary falls between two samples whose delta exceeds `gap_threshold_us`
/// or goes backwards. Fragments shorter than `min_samples` are dropped. When no
/// fragment survives, or there is no boundary at all, the whole column is one
/// segment.
pub fn detect_segments(
    time_us: &[i64],
    gap_threshold_us: i64,
    min_samples: usize,
) -> Vec<FlightSegment> {
    if time_us.is_empty() {
        return Vec::new();
    }

    let mut segments = Vec::new();
    let mut start = 0;

    for i in 1..time_us.len() {
        let delta = time_us[i] - time_us[i - 1];
        if delta > gap_threshold_us || delta < 0 {
            if i - start >= min_samples {
                segments.push(FlightSegment::new(time_us, start, i));
            }
            start = i;
        }
    }
    if time_us.len() - start >= min_samples {
        segments.push(FlightSegment::new(time_us, start, time_us.len()));
    }

    if segments.is_empty() {
        segments.push(FlightSegment::new(time_us, 0, time_us.len()));
    }
    segments
}

/// Index and value of the segment with the greatest duration; ties go to the earliest
pub fn longest_segment(segments: &[FlightSegment]) -> Option<(usize, FlightSegment)> {
    let mut best: Option<(usize, FlightSegment)> = None;
    for (index, segment) in segments.iter().enumerate() {
        match best {
            Some((_, current)) if segment.duration_s <= current.duration_s => {}
            _ => best = Some((index, *segment)),
        }
    }
    best
}
