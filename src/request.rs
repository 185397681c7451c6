//! Transport-agnostic request boundary
//!
//! Accepts a log as the raw request body, as the file part of a
//! `multipart/form-data` upload, or wrapped in a JSON envelope
//! `{"bbl_base64": "..."}`. Runs the pipeline with the built-in decoder and
//! returns compact JSON or a structured failure.

use crate::config::DigestConfig;
use crate::diagnostics::capture_logs;
use crate::error::{DigestError, Result};
use crate::parser::BlackboxDecoder;
use crate::pipeline::digest_bytes;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use futures::executor::block_on;
use futures::stream;
use multer::Multipart;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    bbl_base64: Option<String>,
}

/// Failure value handed back to the transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodeFailure {
    /// Stable machine-readable kind
    pub error: String,
    pub message: String,
    /// Log lines captured during the request, only in debug mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<Vec<String>>,
}

impl DecodeFailure {
    pub fn from_error(err: &DigestError, logs: Option<Vec<String>>) -> Self {
        Self {
            error: err.kind().to_string(),
            message: err.to_string(),
            logs,
        }
    }
}

/// Pull the log bytes out of a request body.
///
/// `multipart/form-data` takes the first part carrying a file name (or the part
/// named `file`), `application/json` selects the base64 envelope, and anything
/// else is the raw log.
pub fn extract_payload(content_type: &str, body: &[u8]) -> Result<Vec<u8>> {
    let data = if content_type.contains("multipart/form-data") {
        extract_multipart_file(content_type, body)?
    } else if content_type.contains("application/json") {
        let envelope: Envelope = serde_json::from_slice(body)
            .map_err(|e| DigestError::InvalidRequest(format!("Invalid JSON body: {}", e)))?;
        let encoded = envelope
            .bbl_base64
            .filter(|s| !s.is_empty())
            .ok_or_else(|| DigestError::InvalidRequest("Missing bbl_base64 field".to_string()))?;
        STANDARD.decode(encoded.trim())?
    } else {
        body.to_vec()
    };

    if data.is_empty() {
        return Err(DigestError::InvalidRequest("Empty BBL data".to_string()));
    }
    Ok(data)
}

fn extract_multipart_file(content_type: &str, body: &[u8]) -> Result<Vec<u8>> {
    let invalid =
        |e: multer::Error| DigestError::InvalidRequest(format!("Invalid multipart body: {}", e));
    let boundary = multer::parse_boundary(content_type).map_err(invalid)?;
    let body = Bytes::copy_from_slice(body);
    let mut multipart = Multipart::new(
        stream::once(async move { Ok::<Bytes, Infallible>(body) }),
        boundary,
    );

    block_on(async {
        while let Some(field) = multipart.next_field().await.map_err(invalid)? {
            if field.file_name().is_some() || field.name() == Some("file") {
                let data = field.bytes().await.map_err(invalid)?;
                return Ok(data.to_vec());
            }
        }
        Err(DigestError::InvalidRequest("Missing file field".to_string()))
    })
}

/// Handle one decode request end to end.
///
/// With `debug` every log line emitted while handling this request is
/// captured and attached to a failure.
pub fn handle_decode(
    content_type: &str,
    body: &[u8],
    config: &DigestConfig,
    debug: bool,
) -> std::result::Result<String, DecodeFailure> {
    let run = || -> Result<String> {
        let data = extract_payload(content_type, body)?;
        let digest = digest_bytes(&data, &BlackboxDecoder, config)?;
        Ok(digest.json)
    };

    if debug {
        let (result, logs) = capture_logs(run);
        result.map_err(|err| DecodeFailure::from_error(&err, Some(logs)))
    } else {
        run().map_err(|err| DecodeFailure::from_error(&err, None))
    }
}
