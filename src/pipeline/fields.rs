//! Channel extraction from a decoded recording

use crate::config::DigestConfig;
use crate::types::{ChannelColumns, DecodedLog, HeaderMap, SampleTiming};

pub const TIME_FIELD: &str = "time";
pub const GYRO_FIELDS: [&str; 3] = ["gyroADC[0]", "gyroADC[1]", "gyroADC[2]"];
pub const RC_FIELDS: [&str; 4] = ["rcCommand[0]", "rcCommand[1]", "rcCommand[2]", "rcCommand[3]"];
pub const SETPOINT_FIELDS: [&str; 3] = ["setpoint[0]", "setpoint[1]", "setpoint[2]"];
pub const AXIS_P_FIELDS: [&str; 2] = ["axisP[0]", "axisP[1]"];
pub const AXIS_I_FIELDS: [&str; 2] = ["axisI[0]", "axisI[1]"];
pub const AXIS_D_FIELDS: [&str; 2] = ["axisD[0]", "axisD[1]"];
pub const AXIS_F_FIELDS: [&str; 2] = ["axisF[0]", "axisF[1]"];
pub const MOTOR_FIELDS: [&str; 4] = ["motor[0]", "motor[1]", "motor[2]", "motor[3]"];
pub const ERPM_FIELDS: [&str; 4] = ["eRPM[0]", "eRPM[1]", "eRPM[2]", "eRPM[3]"];
pub const VBAT_FIELD: &str = "vbatLatest";
pub const AMPERAGE_FIELD: &str = "amperageLatest";

/// Loop timing from `looptime` and `pid_process_denom`.
///
/// Missing or non-numeric values fall back to the configured defaults, as
/// does a product that is non-positive or overflows.
pub fn sample_timing(headers: &HeaderMap, config: &DigestConfig) -> SampleTiming {
    let looptime_us = headers
        .get_i64("looptime")
        .unwrap_or(config.default_looptime_us);
    let pid_denom = headers
        .get_i64("pid_process_denom")
        .unwrap_or(config.default_pid_denom);

    let (looptime_us, pid_denom, sample_interval_us) = match looptime_us
        .checked_mul(pid_denom)
        .filter(|v| *v > 0)
    {
        Some(interval) => (looptime_us, pid_denom, interval),
        None => (
            config.default_looptime_us,
            config.default_pid_denom,
            config
                .default_looptime_us
                .saturating_mul(config.default_pid_denom)
                .max(1),
        ),
    };

    SampleTiming {
        looptime_us,
        pid_denom,
        sample_interval_us,
        original_rate_hz: 1_000_000.0 / sample_interval_us as f64,
    }
}

/// Resolve the channel catalogue against the log and build parallel columns.
///
/// Channels the log lacks stay empty. The time column is always filled, from
/// the `time` field when present or as `frame_index * sample_interval_us`.
pub fn extract_columns(log: &DecodedLog, timing: &SampleTiming) -> ChannelColumns {
    let column = |name: &str| -> Vec<f64> {
        log.field_index(name)
            .map(|idx| log.frames().map(|frame| frame[idx] as f64).collect())
            .unwrap_or_default()
    };
    fn group<const N: usize>(
        names: &[&str; N],
        column: &dyn Fn(&str) -> Vec<f64>,
    ) -> [Vec<f64>; N] {
        std::array::from_fn(|i| column(names[i]))
    }

    let time_us = match log.field_index(TIME_FIELD) {
        Some(idx) => log.column(idx),
        None => (0..log.frame_count() as i64)
            .map(|i| i.saturating_mul(timing.sample_interval_us))
            .collect(),
    };

    ChannelColumns {
        time_us,
        gyro: group(&GYRO_FIELDS, &column),
        rc: group(&RC_FIELDS, &column),
        setpoint: group(&SETPOINT_FIELDS, &column),
        pid_p: group(&AXIS_P_FIELDS, &column),
        pid_i: group(&AXIS_I_FIELDS, &column),
        pid_d: group(&AXIS_D_FIELDS, &column),
        pid_f: group(&AXIS_F_FIELDS, &column),
        motor: group(&MOTOR_FIELDS, &column),
        erpm: group(&ERPM_FIELDS, &column),
        vbat: column(VBAT_FIELD),
        amperage: column(AMPERAGE_FIELD),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HeaderValue;

    #[test]
    fn test_timing_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("looptime", HeaderValue::parse("250"));
        headers.insert("pid_process_denom", HeaderValue::parse("2"));
        let timing = sample_timing(&headers, &DigestConfig::default());
        assert_eq!(timing.sample_interval_us, 500);
        assert_eq!(timing.original_rate_hz, 2000.0);
    }

    #[test]
    fn test_timing_defaults_for_bad_values() {
        let mut headers = HeaderMap::new();
        headers.insert("looptime", HeaderValue::parse("fast"));
        headers.insert("pid_process_denom", HeaderValue::parse("0"));
        let timing = sample_timing(&headers, &DigestConfig::default());
        assert_eq!(timing.looptime_us, 125);
        assert_eq!(timing.pid_denom, 1);
        assert_eq!(timing.original_rate_hz, 8000.0);
    }

    #[test]
    fn test_timing_overflowing_product_uses_defaults() {
        let mut headers = HeaderMap::new();
        headers.insert("looptime", HeaderValue::parse("4000000000"));
        headers.insert("pid_process_denom", HeaderValue::parse("4000000000"));
        let timing = sample_timing(&headers, &DigestConfig::default());
        assert_eq!(timing.looptime_us, 125);
        assert_eq!(timing.pid_denom, 1);
        assert_eq!(timing.sample_interval_us, 125);
    }

    #[test]
    fn test_synthesized_time_saturates() {
        let mut log = DecodedLog::new(HeaderMap::new(), vec!["gyroADC[0]".to_string()]);
        log.push_frame(&[1]);
        log.push_frame(&[2]);
        let timing = SampleTiming {
            looptime_us: i64::MAX,
            pid_denom: 1,
            sample_interval_us: i64::MAX,
            original_rate_hz: 0.0,
        };
        let columns = extract_columns(&log, &timing);
        assert_eq!(columns.time_us, vec![0, i64::MAX]);
    }

    #[test]
    fn test_missing_channels_are_empty_and_time_synthesized() {
        let mut log = DecodedLog::new(
            HeaderMap::new(),
            vec!["gyroADC[0]".to_string(), "motor[0]".to_string()],
        );
        log.push_frame(&[5, 1200]);
        log.push_frame(&[-3, 1300]);
        let timing = sample_timing(&HeaderMap::new(), &DigestConfig::default());

        let columns = extract_columns(&log, &timing);
        assert_eq!(columns.time_us, vec![0, 125]);
        assert_eq!(columns.gyro[0], vec![5.0, -3.0]);
        assert!(columns.gyro[1].is_empty());
        assert_eq!(columns.motor[0], vec![1200.0, 1300.0]);
        assert!(columns.vbat.is_empty());
    }
}
