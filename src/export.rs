//! Serialization and output files for digests
//!
//! The compact form is what the character budget is measured against; the
//! pretty form is what the CLI writes to disk.

use crate::error::Result;
use crate::types::OutputDocument;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Options for writing digest files
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Directory for output files; defaults to the input file's directory
    pub output_dir: Option<String>,
}

/// Compact JSON, no whitespace between tokens
pub fn to_compact_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Length of serialized JSON as the character budget measures it (chars, not bytes)
pub fn json_chars(json: &str) -> usize {
    json.chars().count()
}

/// `<stem>_decoded.json` next to the input, or inside `output_dir` when set
pub fn compute_output_path(input_path: &Path, export_options: &ExportOptions) -> PathBuf {
    let base_name = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("blackbox");

    let output_dir = match export_options.output_dir {
        Some(ref dir) => PathBuf::from(dir),
        None => input_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };

    output_dir.join(format!("{base_name}_decoded.json"))
}

/// Write the pretty-printed document, creating the output directory if needed
pub fn export_document(
    document: &OutputDocument,
    input_path: &Path,
    export_options: &ExportOptions,
) -> Result<PathBuf> {
    let output_path = compute_output_path(input_path, export_options);
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(&output_path, to_pretty_json(document)?)?;
    Ok(output_path)
}
