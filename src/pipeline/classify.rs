//! Grouping of header settings into `set key = value` blocks

use crate::types::{CliSections, HeaderMap};

/// Identity, loop timing, motor protocol and calibration
pub const A_CORE: &[&str] = &[
    "Firmware revision",
    "Firmware date",
    "Board information",
    "Craft name",
    "looptime",
    "gyro_sync_denom",
    "pid_process_denom",
    "gyro_scale",
    "acc_1G",
    "vbatscale",
    "vbatref",
    "minthrottle",
    "maxthrottle",
    "motorOutput",
    "motor_output_limit",
    "throttle_limit_type",
    "throttle_limit_percent",
    "dshot_idle_value",
    "dshot_bidir",
    "motor_poles",
];

/// PID gains and filter tuning
pub const B_FILTERS: &[&str] = &[
    "rollPID",
    "pitchPID",
    "yawPID",
    "d_max_gain",
    "d_max_advance",
    "dterm_lpf1_dyn_hz",
    "dterm_lpf2_hz",
    "dterm_notch_hz",
    "dterm_notch_cutoff",
    "gyro_lpf1_dyn_hz",
    "gyro_lowpass2_hz",
    "gyro_notch_hz",
    "gyro_notch_cutoff",
    "dyn_notch_count",
    "dyn_notch_min_hz",
    "dyn_notch_max_hz",
    "dyn_notch_q",
    "rpm_filter_fade_range_hz",
    "ff_weight",
];

/// Rates and control feel
pub const C_CONTROLS: &[&str] = &[
    "rc_rates",
    "rc_expo",
    "rates",
    "rate_limits",
    "rates_type",
    "deadband",
    "yaw_deadband",
    "iterm_relax",
    "iterm_relax_type",
    "iterm_relax_cutoff",
    "anti_gravity_gain",
    "anti_gravity_cutoff_hz",
    "anti_gravity_p_gain",
    "abs_control_gain",
    "use_integrated_yaw",
];

pub const D_CONTEXT: &[&str] = &[
    "Log start datetime",
    "mixer_type",
    "acc_lpf_hz",
    "acc_hardware",
    "baro_hardware",
    "gyro_cal_on_first_arm",
    "airmode_activate_throttle",
    "serialrx_provider",
    "motor_pwm_rate",
    "features",
    "fields_disabled_mask",
    "blackbox_high_resolution",
    "vbat_sag_compensation",
    "dyn_idle_p_gain",
    "dyn_idle_i_gain",
    "dyn_idle_d_gain",
    "dyn_idle_max_increase",
    "dyn_idle_start_increase",
    "simplified_pids_mode",
    "simplified_master_multiplier",
    "simplified_i_gain",
    "simplified_d_gain",
    "simplified_pi_gain",
    "simplified_feedforward_gain",
    "simplified_pitch_d_gain",
    "simplified_pitch_pi_gain",
    "simplified_dterm_filter",
    "simplified_dterm_filter_multiplier",
    "simplified_gyro_filter",
    "simplified_gyro_filter_multiplier",
    "throttle_boost",
    "throttle_boost_cutoff",
    "thrust_linear",
];

/// Render header pairs into the four CLI blocks.
///
/// Keys outside every set and keys with empty values are dropped; lines keep
/// header order within each block.
pub fn build_cli_sections(headers: &HeaderMap) -> CliSections {
    let mut core = Vec::new();
    let mut filters = Vec::new();
    let mut controls = Vec::new();
    let mut context = Vec::new();

    for (key, value) in headers.iter() {
        if value.is_empty() {
            continue;
        }
        let target = if A_CORE.contains(&key) {
            &mut core
        } else if B_FILTERS.contains(&key) {
            &mut filters
        } else if C_CONTROLS.contains(&key) {
            &mut controls
        } else if D_CONTEXT.contains(&key) {
            &mut context
        } else {
            continue;
        };
        target.push(format!("set {} = {}", key, value));
    }

    CliSections {
        core: core.join("\n"),
        filters: filters.join("\n"),
        controls: controls.join("\n"),
        context: context.join("\n"),
    }
}
