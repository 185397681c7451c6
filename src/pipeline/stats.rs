//! Summary statistics over the selected flight segment
//!
//! Everything here runs once on full-resolution data, before downsampling.

use crate::conversion::{convert_amperage_to_amps, convert_vbat_to_volts, round_to, truncate_to_int};
use crate::types::{AxisTriple, ChannelColumns, SummaryStats};

/// Minimum samples before a frequency estimate is attempted
const MIN_SAMPLES_FOR_FREQUENCY: usize = 10;

/// Root-mean-square of a dataset
///
/// # Returns
/// `sqrt(mean(v²))`, or 0 for an empty slice
pub fn rms(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean_square = values.iter().map(|v| v * v).sum::<f64>() / values.len() as f64;
    mean_square.sqrt()
}

/// Dominant oscillation frequency estimated from sign changes
///
/// Zero counts as non-negative. Each full cycle crosses twice, so the estimate
/// is `crossings / (2 * duration)` with `duration = len / sample_rate_hz`.
///
/// # Arguments
/// * `values` - Evenly sampled signal
/// * `sample_rate_hz` - Sampling rate of `values`
pub fn peak_frequency(values: &[f64], sample_rate_hz: f64) -> f64 {
    if values.len() < MIN_SAMPLES_FOR_FREQUENCY || sample_rate_hz <= 0.0 {
        return 0.0;
    }

    let crossings = values
        .windows(2)
        .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
        .count();

    let duration_s = values.len() as f64 / sample_rate_hz;
    if duration_s > 0.0 {
        crossings as f64 / (2.0 * duration_s)
    } else {
        0.0
    }
}

/// Largest relative deviation of one motor's average from the mean of all averages
pub fn motor_imbalance(averages: &[f64]) -> f64 {
    if averages.is_empty() {
        return 0.0;
    }
    let mean = averages.iter().sum::<f64>() / averages.len() as f64;
    if mean <= 0.0 {
        return 0.0;
    }
    averages
        .iter()
        .map(|avg| (avg - mean).abs() / mean)
        .fold(0.0, f64::max)
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    values.iter().fold(None, |acc, &v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Compute the rounded statistics block for a segment
pub fn summarize(columns: &ChannelColumns, original_rate_hz: f64) -> SummaryStats {
    let gyro_rms = AxisTriple {
        r: round_to(rms(&columns.gyro[0]), 1),
        p: round_to(rms(&columns.gyro[1]), 1),
        y: round_to(rms(&columns.gyro[2]), 1),
    };
    let peak = |axis: usize| peak_frequency(&columns.gyro[axis], original_rate_hz).round() as i64;
    let gyro_peak_hz = AxisTriple {
        r: peak(0),
        p: peak(1),
        y: peak(2),
    };

    let mut motor_avg = [0i64; 4];
    let mut motor_max = [0i64; 4];
    for (i, motor) in columns.motor.iter().enumerate() {
        motor_avg[i] = mean(motor).map(|avg| avg.round() as i64).unwrap_or(0);
        motor_max[i] = min_max(motor).map(|(_, hi)| truncate_to_int(hi)).unwrap_or(0);
    }

    // A motor the log lacks counts as an average of 0
    let averages: Vec<f64> = motor_avg.iter().map(|&avg| avg as f64).collect();
    let motor_imbalance = round_to(motor_imbalance(&averages), 3);

    let vbat = min_max(&columns.vbat)
        .map(|(lo, hi)| {
            [
                round_to(convert_vbat_to_volts(lo), 2),
                round_to(convert_vbat_to_volts(hi), 2),
            ]
        })
        .unwrap_or([0.0, 0.0]);

    let amp = match (mean(&columns.amperage), min_max(&columns.amperage)) {
        (Some(avg), Some((_, hi))) => [
            round_to(convert_amperage_to_amps(avg), 1),
            round_to(convert_amperage_to_amps(hi), 1),
        ],
        _ => [0.0, 0.0],
    };

    SummaryStats {
        gyro_rms,
        gyro_peak_hz,
        motor_avg,
        motor_max,
        motor_imbalance,
        vbat,
        amp,
    }
}
