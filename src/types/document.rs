use serde::{Deserialize, Serialize};

/// The digest handed to downstream tuning analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputDocument {
    pub meta: Meta,
    pub cli: CliSections,
    pub stats: SummaryStats,
    pub frames: Frames,
}

/// Identification plus the processing decisions that produced the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub fw: String,
    pub board: String,
    pub craft: String,
    pub duration_s: f64,
    pub total_frames: usize,
    pub sample_rate_hz: f64,
    pub effective_rate_hz: f64,
    pub points: usize,
    pub original_rate_hz: f64,
    pub looptime: i64,
    pub pid_denom: i64,
    pub log_count: usize,
    pub log_index: usize,
    pub segment_count: usize,
    pub segment_index: usize,
}

/// Header settings rendered as `set key = value` blocks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CliSections {
    #[serde(rename = "A_core")]
    pub core: String,
    #[serde(rename = "B_filters")]
    pub filters: String,
    #[serde(rename = "C_controls")]
    pub controls: String,
    #[serde(rename = "D_context")]
    pub context: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisTriple<T> {
    pub r: T,
    pub p: T,
    pub y: T,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub gyro_rms: AxisTriple<f64>,
    pub gyro_peak_hz: AxisTriple<i64>,
    pub motor_avg: [i64; 4],
    pub motor_max: [i64; 4],
    pub motor_imbalance: f64,
    /// [min, max] volts
    pub vbat: [f64; 2],
    /// [avg, max] amps
    pub amp: [f64; 2],
}

/// Settings-only summary produced without decoding any frames
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderDigest {
    pub meta: HeaderMeta,
    pub cli: CliSections,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderMeta {
    pub fw: String,
    pub board: String,
    pub craft: String,
    pub looptime: i64,
    pub pid_denom: i64,
    pub sample_rate_hz: f64,
}

/// Sample timestamps in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeAxis {
    Explicit(Vec<i64>),
    Delta { t0: i64, dt: i64 },
}

impl TimeAxis {
    pub fn is_delta(&self) -> bool {
        matches!(self, TimeAxis::Delta { .. })
    }
}

/// Downsampled time series; each row holds one selected sample of a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frames {
    pub t: TimeAxis,
    pub rc: Vec<Vec<i64>>,
    pub sp: Vec<[f64; 3]>,
    pub g: Vec<[f64; 3]>,
    pub p: Vec<Vec<i64>>,
    pub m: Vec<[i64; 4]>,
    pub rpm: Vec<[i64; 4]>,
    pub v: Vec<f64>,
    pub a: Vec<f64>,
}
