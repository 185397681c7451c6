//! Adaptive downsampling under a character budget

use crate::config::{DigestConfig, FrameSchema, TimeEncoding};
use crate::conversion::{
    convert_amperage_to_amps, convert_vbat_to_volts, round_to, truncate_to_int, us_to_ms,
};
use crate::error::Result;
use crate::export::{json_chars, to_compact_json};
use crate::types::{ChannelColumns, Frames, OutputDocument, TimeAxis};
use tracing::debug;

/// Parameters of one downsampling attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateChoice {
    pub rate_hz: f64,
    pub stride: usize,
    pub points: usize,
    pub fallback: bool,
}

impl RateChoice {
    pub fn effective_rate_hz(&self, original_rate_hz: f64) -> f64 {
        original_rate_hz / self.stride as f64
    }
}

/// The document that fit, with its compact serialization
#[derive(Debug, Clone)]
pub struct Downsampled {
    pub document: OutputDocument,
    pub json: String,
    pub choice: RateChoice,
}

impl Downsampled {
    /// Serialized length in characters
    pub fn chars(&self) -> usize {
        json_chars(&self.json)
    }
}

pub fn stride(original_rate_hz: f64, target_rate_hz: f64) -> usize {
    if target_rate_hz <= 0.0 || !original_rate_hz.is_finite() {
        return 1;
    }
    ((original_rate_hz / target_rate_hz).floor() as usize).max(1)
}

pub fn sample_indices(len: usize, stride: usize) -> Vec<usize> {
    (0..len).step_by(stride.max(1)).collect()
}

/// Timestamps in ms; the delta form takes `dt` from the first two samples,
/// or `floor(1000 / rate)` when those are not increasing
pub fn time_axis(time_us: &[i64], indices: &[usize], rate_hz: f64, delta: bool) -> TimeAxis {
    if !delta {
        return TimeAxis::Explicit(indices.iter().map(|&i| us_to_ms(time_us[i])).collect());
    }

    let t0 = indices.first().map(|&i| us_to_ms(time_us[i])).unwrap_or(0);
    let t1 = indices.get(1).map(|&i| us_to_ms(time_us[i]));
    let dt = match t1 {
        Some(t1) if t1 > t0 => t1 - t0,
        _ => (1000.0 / rate_hz).floor() as i64,
    };
    TimeAxis::Delta { t0, dt }
}

fn at(column: &[f64], i: usize) -> f64 {
    column.get(i).copied().unwrap_or(0.0)
}

fn rows<T>(lead: &[f64], indices: &[usize], row: impl Fn(usize) -> T) -> Vec<T> {
    if lead.is_empty() {
        return Vec::new();
    }
    indices.iter().map(|&i| row(i)).collect()
}

/// Per-group sample rows at the selected indices
pub fn build_frames(
    columns: &ChannelColumns,
    indices: &[usize],
    schema: FrameSchema,
    t: TimeAxis,
) -> Frames {
    let int = |column: &[f64], i: usize| truncate_to_int(at(column, i));
    let dec1 = |column: &[f64], i: usize| round_to(at(column, i), 1);

    let rc: Vec<Vec<i64>> = match schema {
        FrameSchema::Full => rows(&columns.rc[0], indices, |i| {
            columns.rc.iter().map(|c| int(c, i)).collect()
        }),
        FrameSchema::Trimmed => rows(&columns.rc[3], indices, |i| vec![int(&columns.rc[3], i)]),
    };

    let p: Vec<Vec<i64>> = match schema {
        FrameSchema::Full => rows(&columns.pid_p[0], indices, |i| {
            (0..2)
                .flat_map(|axis| {
                    [
                        int(&columns.pid_p[axis], i),
                        int(&columns.pid_i[axis], i),
                        int(&columns.pid_d[axis], i),
                        int(&columns.pid_f[axis], i),
                    ]
                })
                .collect()
        }),
        FrameSchema::Trimmed => rows(&columns.pid_p[0], indices, |i| {
            vec![
                int(&columns.pid_p[0], i),
                int(&columns.pid_d[0], i),
                int(&columns.pid_p[1], i),
                int(&columns.pid_d[1], i),
            ]
        }),
    };

    Frames {
        t,
        rc,
        sp: rows(&columns.setpoint[0], indices, |i| {
            std::array::from_fn(|axis| dec1(&columns.setpoint[axis], i))
        }),
        g: rows(&columns.gyro[0], indices, |i| {
            std::array::from_fn(|axis| dec1(&columns.gyro[axis], i))
        }),
        p,
        m: rows(&columns.motor[0], indices, |i| {
            std::array::from_fn(|motor| int(&columns.motor[motor], i))
        }),
        rpm: rows(&columns.erpm[0], indices, |i| {
            std::array::from_fn(|motor| int(&columns.erpm[motor], i))
        }),
        v: rows(&columns.vbat, indices, |i| {
            round_to(convert_vbat_to_volts(at(&columns.vbat, i)), 2)
        }),
        a: rows(&columns.amperage, indices, |i| {
            round_to(convert_amperage_to_amps(at(&columns.amperage, i)), 1)
        }),
    }
}

/// Try each configured rate, highest first, until the document fits `max_chars`.
///
/// `assemble` wraps the frames of an attempt into a full document. When no
/// rate fits, the lowest rate is used with delta-encoded time and returned
/// whatever its size.
pub fn fit_to_budget<F>(
    columns: &ChannelColumns,
    original_rate_hz: f64,
    config: &DigestConfig,
    mut assemble: F,
) -> Result<Downsampled>
where
    F: FnMut(Frames, &RateChoice) -> OutputDocument,
{
    let always_delta = config.time_encoding == TimeEncoding::Delta;
    let mut attempt = |rate_hz: f64, delta: bool, fallback: bool| -> Result<Downsampled> {
        let stride = stride(original_rate_hz, rate_hz);
        let indices = sample_indices(columns.len(), stride);
        let choice = RateChoice {
            rate_hz,
            stride,
            points: indices.len(),
            fallback,
        };
        let t = time_axis(&columns.time_us, &indices, rate_hz, delta);
        let frames = build_frames(columns, &indices, config.frame_schema, t);
        let document = assemble(frames, &choice);
        let json = to_compact_json(&document)?;
        Ok(Downsampled {
            document,
            json,
            choice,
        })
    };

    for &rate_hz in &config.target_rates_hz {
        let candidate = attempt(rate_hz, always_delta, false)?;
        let chars = candidate.chars();
        debug!(rate_hz, stride = candidate.choice.stride, chars, "downsample attempt");
        if chars <= config.max_chars {
            return Ok(candidate);
        }
    }

    let fallback = attempt(config.lowest_rate_hz(), true, true)?;
    debug!(
        rate_hz = fallback.choice.rate_hz,
        chars = fallback.chars(),
        max_chars = config.max_chars,
        "no rate fit the budget, using delta-time fallback"
    );
    Ok(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(n: usize, step_us: i64) -> ChannelColumns {
        ChannelColumns {
            time_us: (0..n as i64).map(|i| i * step_us).collect(),
            gyro: [
                (0..n).map(|i| i as f64 * 0.25).collect(),
                vec![1.04; n],
                vec![],
            ],
            rc: [vec![10.9; n], vec![], vec![], vec![1500.0; n]],
            pid_p: [vec![12.0; n], vec![13.0; n]],
            pid_d: [vec![20.0; n], vec![21.0; n]],
            ..Default::default()
        }
    }

    #[test]
    fn test_stride() {
        assert_eq!(stride(8000.0, 100.0), 80);
        assert_eq!(stride(1000.0, 1000.0), 1);
        assert_eq!(stride(50.0, 100.0), 1);
        assert_eq!(stride(1000.0, 30.0), 33);
    }

    #[test]
    fn test_sample_indices() {
        assert_eq!(sample_indices(7, 3), vec![0, 3, 6]);
        assert_eq!(sample_indices(3, 1), vec![0, 1, 2]);
    }

    #[test]
    fn test_time_axis_delta() {
        let time = [1_000_000, 1_010_000, 1_020_000];
        assert_eq!(
            time_axis(&time, &[0, 1, 2], 100.0, true),
            TimeAxis::Delta { t0: 1000, dt: 10 }
        );
        assert_eq!(
            time_axis(&time, &[0], 30.0, true),
            TimeAxis::Delta { t0: 1000, dt: 33 }
        );
        let flat = [5_000, 5_000];
        assert_eq!(
            time_axis(&flat, &[0, 1], 25.0, true),
            TimeAxis::Delta { t0: 5, dt: 40 }
        );
    }

    #[test]
    fn test_full_schema_rows() {
        let cols = columns(4, 1000);
        let t = TimeAxis::Explicit(vec![0, 2]);
        let frames = build_frames(&cols, &[0, 2], FrameSchema::Full, t);
        assert_eq!(frames.rc, vec![vec![10, 0, 0, 1500], vec![10, 0, 0, 1500]]);
        assert_eq!(frames.g, vec![[0.0, 1.0, 0.0], [0.5, 1.0, 0.0]]);
        assert_eq!(frames.p[0], vec![12, 0, 20, 0, 13, 0, 21, 0]);
        assert!(frames.sp.is_empty());
        assert!(frames.rpm.is_empty());
        assert!(frames.m.is_empty());
    }

    #[test]
    fn test_trimmed_schema_rows() {
        let cols = columns(2, 1000);
        let t = TimeAxis::Explicit(vec![0, 1]);
        let frames = build_frames(&cols, &[0, 1], FrameSchema::Trimmed, t);
        assert_eq!(frames.rc, vec![vec![1500], vec![1500]]);
        assert_eq!(frames.p[1], vec![12, 20, 13, 21]);
    }

    #[test]
    fn test_fallback_when_nothing_fits() {
        let cols = columns(500, 1000);
        let config = DigestConfig {
            max_chars: 10,
            target_rates_hz: vec![1000.0, 100.0],
            ..DigestConfig::default()
        };
        let mut attempts = Vec::new();
        let result = fit_to_budget(&cols, 1000.0, &config, |frames, choice| {
            attempts.push(choice.rate_hz);
            crate::pipeline::tests::document_with(frames)
        })
        .unwrap();

        assert_eq!(attempts, vec![1000.0, 100.0, 100.0]);
        assert!(result.choice.fallback);
        assert!(result.document.frames.t.is_delta());
        assert_eq!(result.choice.points, 50);
    }

    #[test]
    fn test_first_fitting_rate_wins() {
        let cols = columns(100, 1000);
        let config = DigestConfig {
            target_rates_hz: vec![1000.0, 100.0],
            ..DigestConfig::default()
        };
        let result = fit_to_budget(&cols, 1000.0, &config, |frames, _| {
            crate::pipeline::tests::document_with(frames)
        })
        .unwrap();
        assert_eq!(result.choice.stride, 1);
        assert_eq!(result.choice.points, 100);
        assert!(!result.choice.fallback);
        assert!(result.chars() <= config.max_chars);
    }
}
