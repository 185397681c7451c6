//! Digest configuration
//!
//! One pipeline serves every historical output variant; what differs between
//! them (character budget, candidate rates, frame schema, time encoding,
//! multi-log and multi-segment handling) is carried here and injected.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{DigestError, Result};

/// Channel layout of the `frames` block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameSchema {
    /// Four stick channels and P/I/D/F for roll and pitch
    #[default]
    Full,
    /// Throttle only and P/D for roll and pitch
    Trimmed,
}

/// How sample timestamps are written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeEncoding {
    /// Per-sample array; `{t0, dt}` only once every rate has overflowed the budget
    #[default]
    Explicit,
    /// Always `{t0, dt}`
    Delta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigestConfig {
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,

    /// Candidate output rates, highest fidelity first
    #[serde(default = "default_target_rates_hz")]
    pub target_rates_hz: Vec<f64>,

    #[serde(default)]
    pub frame_schema: FrameSchema,

    #[serde(default)]
    pub time_encoding: TimeEncoding,

    /// Pick the longest recording in multi-log files; otherwise the first that decodes
    #[serde(default = "default_true")]
    pub select_longest_log: bool,

    /// Isolate the longest contiguous flight segment inside the recording
    #[serde(default = "default_true")]
    pub split_segments: bool,

    #[serde(default = "default_gap_threshold_us")]
    pub gap_threshold_us: i64,

    #[serde(default = "default_min_segment_samples")]
    pub min_segment_samples: usize,

    #[serde(default = "default_looptime_us")]
    pub default_looptime_us: i64,

    #[serde(default = "default_pid_denom")]
    pub default_pid_denom: i64,
}

fn default_max_chars() -> usize {
    100_000
}

fn default_target_rates_hz() -> Vec<f64> {
    vec![100.0, 80.0, 60.0, 50.0, 40.0, 30.0, 25.0]
}

fn default_true() -> bool {
    true
}

fn default_gap_threshold_us() -> i64 {
    1_000_000
}

fn default_min_segment_samples() -> usize {
    10
}

fn default_looptime_us() -> i64 {
    125
}

fn default_pid_denom() -> i64 {
    1
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
            target_rates_hz: default_target_rates_hz(),
            frame_schema: FrameSchema::default(),
            time_encoding: TimeEncoding::default(),
            select_longest_log: default_true(),
            split_segments: default_true(),
            gap_threshold_us: default_gap_threshold_us(),
            min_segment_samples: default_min_segment_samples(),
            default_looptime_us: default_looptime_us(),
            default_pid_denom: default_pid_denom(),
        }
    }
}

impl DigestConfig {
    /// The earlier single-recording, single-segment behaviour
    pub fn legacy() -> Self {
        Self {
            select_longest_log: false,
            split_segments: false,
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file; absent keys take their defaults
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, the TOML is malformed, or
    /// validation fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: DigestConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.max_chars == 0 {
            return Err(DigestError::InvalidConfig(
                "max_chars must be greater than 0".to_string(),
            ));
        }
        if self.target_rates_hz.is_empty() {
            return Err(DigestError::InvalidConfig(
                "target_rates_hz must not be empty".to_string(),
            ));
        }
        if self.target_rates_hz.iter().any(|r| !r.is_finite() || *r <= 0.0) {
            return Err(DigestError::InvalidConfig(format!(
                "target_rates_hz must be positive, got {:?}",
                self.target_rates_hz
            )));
        }
        if self.target_rates_hz.windows(2).any(|w| w[1] >= w[0]) {
            return Err(DigestError::InvalidConfig(format!(
                "target_rates_hz must be strictly descending, got {:?}",
                self.target_rates_hz
            )));
        }
        if self.gap_threshold_us <= 0 {
            return Err(DigestError::InvalidConfig(
                "gap_threshold_us must be greater than 0".to_string(),
            ));
        }
        if self.min_segment_samples == 0 {
            return Err(DigestError::InvalidConfig(
                "min_segment_samples must be at least 1".to_string(),
            ));
        }
        if self.default_looptime_us <= 0
            || self.default_pid_denom <= 0
            || self.default_looptime_us.checked_mul(self.default_pid_denom).is_none()
        {
            return Err(DigestError::InvalidConfig(
                "default looptime and pid denom must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Lowest candidate rate, used for the fallback encoding
    pub fn lowest_rate_hz(&self) -> f64 {
        self.target_rates_hz.last().copied().unwrap_or(25.0)
    }
}
