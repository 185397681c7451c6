//! BBL Digest Library
//!
//! Condenses Betaflight/EmuFlight/INAV blackbox log files into a single
//! size-bounded JSON document for downstream tuning analysis.
//!
//! # Features
//!
//! - **`cli`** (default): Build the command-line interface binary
//!
//! # Quick Start
//!
//! Digest a log file with the default configuration:
//! ```rust,no_run
//! use bbl_digest::{digest_file, BlackboxDecoder, DigestConfig};
//! use std::path::Path;
//!
//! let config = DigestConfig::default();
//! let digest = digest_file(Path::new("flight.BBL"), &BlackboxDecoder, &config).unwrap();
//! println!("{} chars at {} Hz", digest.chars(), digest.document.meta.sample_rate_hz);
//! ```
//!
//! Handle a request body at a service boundary:
//! ```rust,no_run
//! use bbl_digest::{handle_decode, DigestConfig};
//!
//! let body = br#"{"bbl_base64":"..."}"#;
//! match handle_decode("application/json", body, &DigestConfig::default(), false) {
//!     Ok(json) => println!("{json}"),
//!     Err(failure) => eprintln!("{}: {}", failure.error, failure.message),
//! }
//! ```
//!
//! # Public API
//!
//! ## Pipeline
//! - [`digest_bytes`] - Digest an in-memory log file
//! - [`digest_file`] - Read and digest a log file
//! - [`digest_header`] - Settings-only digest without frame decoding
//! - [`handle_decode`] - Request boundary returning JSON or a [`DecodeFailure`]
//!
//! ## Decoding
//! - [`LogDecoder`] - Seam between the pipeline and a binary decoder
//! - [`BlackboxDecoder`] - Built-in decoder for Betaflight-family logs
//!
//! ## Data Types
//! - [`DigestConfig`] - Budget, rates, schema and selection behaviour
//! - [`OutputDocument`] - The digest: meta, cli, stats, frames
//! - [`DigestError`] - Failure kinds surfaced by the pipeline

pub mod config;
pub mod conversion;
pub mod diagnostics;
pub mod error;
pub mod export;
pub mod parser;
pub mod pipeline;
pub mod request;
pub mod types;

pub use config::{DigestConfig, FrameSchema, TimeEncoding};
pub use diagnostics::{capture_logs, init_logging};
pub use error::{DigestError, Result};
pub use export::{compute_output_path, export_document, to_compact_json, ExportOptions};
pub use parser::{BlackboxDecoder, LogDecoder};
pub use pipeline::{digest_bytes, digest_file, digest_header, Digest};
pub use request::{extract_payload, handle_decode, DecodeFailure};
pub use types::{CliSections, DecodedLog, HeaderDigest, HeaderMap, Meta, OutputDocument};
