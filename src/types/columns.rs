use std::ops::Range;

/// Parallel per-channel columns for one recording.
///
/// Every non-empty column has the same length as `time_us`. A channel the log
/// does not carry is an empty column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelColumns {
    pub time_us: Vec<i64>,
    pub gyro: [Vec<f64>; 3],
    pub rc: [Vec<f64>; 4],
    pub setpoint: [Vec<f64>; 3],
    pub pid_p: [Vec<f64>; 2],
    pub pid_i: [Vec<f64>; 2],
    pub pid_d: [Vec<f64>; 2],
    pub pid_f: [Vec<f64>; 2],
    pub motor: [Vec<f64>; 4],
    pub erpm: [Vec<f64>; 4],
    pub vbat: Vec<f64>,
    pub amperage: Vec<f64>,
}

impl ChannelColumns {
    pub fn len(&self) -> usize {
        self.time_us.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_us.is_empty()
    }

    /// Copy of every column restricted to `range` (clamped to the column length)
    pub fn slice(&self, range: Range<usize>) -> ChannelColumns {
        fn cut(column: &[f64], range: &Range<usize>) -> Vec<f64> {
            if column.is_empty() {
                return Vec::new();
            }
            let end = range.end.min(column.len());
            let start = range.start.min(end);
            column[start..end].to_vec()
        }
        fn cut_all<const N: usize>(columns: &[Vec<f64>; N], range: &Range<usize>) -> [Vec<f64>; N] {
            std::array::from_fn(|i| cut(&columns[i], range))
        }

        let end = range.end.min(self.time_us.len());
        let start = range.start.min(end);

        ChannelColumns {
            time_us: self.time_us[start..end].to_vec(),
            gyro: cut_all(&self.gyro, &range),
            rc: cut_all(&self.rc, &range),
            setpoint: cut_all(&self.setpoint, &range),
            pid_p: cut_all(&self.pid_p, &range),
            pid_i: cut_all(&self.pid_i, &range),
            pid_d: cut_all(&self.pid_d, &range),
            pid_f: cut_all(&self.pid_f, &range),
            motor: cut_all(&self.motor, &range),
            erpm: cut_all(&self.erpm, &range),
            vbat: cut(&self.vbat, &range),
            amperage: cut(&self.amperage, &range),
        }
    }
}

/// Loop timing derived from the header
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleTiming {
    pub looptime_us: i64,
    pub pid_denom: i64,
    pub sample_interval_us: i64,
    pub original_rate_hz: f64,
}
