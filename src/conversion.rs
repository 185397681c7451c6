//! Unit and precision conversions for digest values
//!
//! Blackbox logs store battery voltage and current as integer hundredths.
//! Output precision is chosen per channel to keep the serialized digest small.

/// Convert raw vbatLatest (0.01V units) to volts
pub fn convert_vbat_to_volts(raw_value: f64) -> f64 {
    raw_value / 100.0
}

/// Converts raw amperageLatest value to amps (0.01A units)
pub fn convert_amperage_to_amps(raw_value: f64) -> f64 {
    raw_value / 100.0
}

/// Round to a fixed number of decimal places (half away from zero)
pub fn round_to(value: f64, places: u32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let factor = 10f64.powi(places as i32);
    let rounded = (value * factor).round() / factor;
    // avoid emitting -0.0
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Integer cast used for stick, motor and PID channels (truncates toward zero)
pub fn truncate_to_int(value: f64) -> i64 {
    if value.is_finite() {
        value.trunc() as i64
    } else {
        0
    }
}

/// Microsecond timestamp to whole milliseconds
pub fn us_to_ms(time_us: i64) -> i64 {
    time_us / 1000
}
