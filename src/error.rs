use thiserror::Error;

/// Errors produced while turning a blackbox log into a digest
#[derive(Debug, Error)]
pub enum DigestError {
    /// Every candidate recording failed to decode
    #[error("Failed to decode BBL: {0}")]
    Decode(String),

    /// The input buffer held nothing to decode
    #[error("No blackbox recordings found in input")]
    NoRecordings,

    /// The selected recording decoded to zero frames
    #[error("Selected recording {0} contains no frames")]
    EmptyRecording(usize),

    /// Configuration values that cannot drive the pipeline
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Malformed request payload at the transport boundary
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file parse errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// JSON encode/decode errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Base64 payload errors
    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl DigestError {
    /// Stable machine-readable name, used as the `error` field of failure responses
    pub fn kind(&self) -> &'static str {
        match self {
            DigestError::Decode(_) => "decode_failed",
            DigestError::NoRecordings => "no_recordings",
            DigestError::EmptyRecording(_) => "empty_recording",
            DigestError::InvalidConfig(_) => "invalid_config",
            DigestError::InvalidRequest(_) => "invalid_request",
            DigestError::Io(_) => "io",
            DigestError::Config(_) => "config",
            DigestError::Json(_) => "json",
            DigestError::Base64(_) => "invalid_request",
        }
    }
}

pub type Result<T> = std::result::Result<T, DigestError>;
