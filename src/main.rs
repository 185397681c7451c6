use anyhow::{Context, Result};
use bbl_digest::export::to_pretty_json;
use bbl_digest::{
    digest_bytes, digest_header, export_document, init_logging, BlackboxDecoder, Digest,
    DigestConfig, ExportOptions, FrameSchema,
};
use clap::{Arg, ArgAction, Command};
use glob::glob;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

/// Maximum recursion depth to prevent stack overflow
const MAX_RECURSION_DEPTH: usize = 100;

fn has_log_extension(path: &Path, allow_txt: bool) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext_lower = ext.to_ascii_lowercase();
            ext_lower == "bbl" || ext_lower == "bfl" || (allow_txt && ext_lower == "txt")
        })
        .unwrap_or(false)
}

/// Expand files, directories and glob patterns into a list of log files.
/// Directories are searched recursively for .BBL/.BFL files only.
fn expand_input_paths(
    input_paths: &[String],
    visited: &mut HashSet<PathBuf>,
    depth: usize,
) -> Result<Vec<PathBuf>> {
    if depth > MAX_RECURSION_DEPTH {
        anyhow::bail!("Maximum recursion depth exceeded ({})", MAX_RECURSION_DEPTH);
    }
    let mut log_files = Vec::new();

    for input_path_str in input_paths {
        if input_path_str.contains('*') || input_path_str.contains('?') {
            let paths = glob(input_path_str)
                .with_context(|| format!("Invalid glob pattern '{}'", input_path_str))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .with_context(|| format!("Error expanding glob pattern '{}'", input_path_str))?;
            for path in paths {
                if let Some(path_str) = path.to_str() {
                    log_files.extend(expand_input_paths(
                        &[path_str.to_string()],
                        visited,
                        depth + 1,
                    )?);
                }
            }
            continue;
        }

        let canonical_path = match Path::new(input_path_str).canonicalize() {
            Ok(path) => path,
            Err(e) => {
                warn!("Failed to canonicalize path '{}': {}", input_path_str, e);
                continue;
            }
        };

        if canonical_path.is_file() {
            log_files.push(canonical_path);
        } else if canonical_path.is_dir() {
            if !visited.insert(canonical_path.clone()) {
                continue;
            }
            let mut entries: Vec<PathBuf> = fs::read_dir(&canonical_path)
                .with_context(|| format!("Reading directory {}", canonical_path.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .collect();
            entries.sort();
            for entry in entries {
                if entry.is_dir() {
                    if let Some(path_str) = entry.to_str() {
                        log_files.extend(expand_input_paths(
                            &[path_str.to_string()],
                            visited,
                            depth + 1,
                        )?);
                    }
                } else if has_log_extension(&entry, false) {
                    log_files.push(entry);
                }
            }
        } else {
            warn!("Path not found or not accessible: {}", input_path_str);
        }
    }

    Ok(log_files)
}

fn build_command() -> Command {
    Command::new("BBL Digest")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version())
        .about("Condense blackbox logs into size-bounded JSON digests for tuning analysis.")
        .arg(
            Arg::new("files")
                .help("BBL files or directories to digest. Direct file paths: .BBL, .BFL, .TXT extensions supported. Directories: recursively finds .BBL/.BFL files only. Case-insensitive, supports globbing.")
                .required(false)
                .num_args(1..)
                .index(1),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .help("Enable debug logging of every pipeline stage")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("output-dir")
                .long("output-dir")
                .help("Directory for output files (default: same as input file)")
                .value_name("DIR"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("TOML configuration file (absent keys take their defaults)")
                .value_name("FILE"),
        )
        .arg(
            Arg::new("max-chars")
                .long("max-chars")
                .help("Character budget of the compact JSON digest")
                .value_name("N")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("trimmed")
                .long("trimmed")
                .help("Emit the trimmed frame schema (throttle only, P/D for roll and pitch)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("legacy")
                .long("legacy")
                .help("Use the first recording that decodes and skip flight segment isolation")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("header-only")
                .long("header-only")
                .help("Print identity and settings of the first recording without decoding frames")
                .action(ArgAction::SetTrue),
        )
}

fn long_version() -> String {
    let sha = option_env!("VERGEN_GIT_SHA").unwrap_or("unknown");
    let date = option_env!("VERGEN_GIT_COMMIT_DATE").unwrap_or("unknown");
    format!("{} ({} {})", env!("CARGO_PKG_VERSION"), sha, date)
}

fn print_summary(path: &Path, digest: &Digest, config: &DigestConfig, output: &Path) {
    let meta = &digest.document.meta;
    println!("Processing: {}", path.display());
    println!("  Input size   {} bytes", digest.input_bytes);
    println!("  Recording    {}/{}", meta.log_index + 1, meta.log_count);
    println!("  Segment      {}/{}", meta.segment_index + 1, meta.segment_count);
    println!("  Duration     {:.1} s", meta.duration_s);
    println!(
        "  Rate         {} Hz (effective {} Hz, original {:.0} Hz)",
        meta.sample_rate_hz, meta.effective_rate_hz, meta.original_rate_hz
    );
    println!("  Points       {}", meta.points);
    let status = if digest.within_budget(config.max_chars) {
        "within budget"
    } else {
        "OVER BUDGET"
    };
    println!(
        "  Size         {} / {} chars ({}){}",
        digest.chars(),
        config.max_chars,
        status,
        if digest.used_fallback { " [fallback]" } else { "" }
    );
    println!("  Output       {}", output.display());
}

fn process_file(path: &Path, config: &DigestConfig, export_options: &ExportOptions) -> Result<()> {
    let data = fs::read(path).with_context(|| format!("Reading {}", path.display()))?;
    let digest = digest_bytes(&data, &BlackboxDecoder, config)
        .with_context(|| format!("Digesting {}", path.display()))?;
    let output = export_document(&digest.document, path, export_options)
        .with_context(|| format!("Writing digest for {}", path.display()))?;
    print_summary(path, &digest, config, &output);
    Ok(())
}

fn process_header(path: &Path, config: &DigestConfig) -> Result<()> {
    let data = fs::read(path).with_context(|| format!("Reading {}", path.display()))?;
    let header = digest_header(&data, config)
        .with_context(|| format!("Reading headers of {}", path.display()))?;
    println!("{}", to_pretty_json(&header)?);
    Ok(())
}

fn main() -> Result<()> {
    let matches = build_command().get_matches();

    let debug_enabled = matches.get_flag("debug");
    init_logging(debug_enabled);

    let file_patterns: Vec<String> = match matches.get_many::<String>("files") {
        Some(files) => files.cloned().collect(),
        None => {
            build_command().print_help()?;
            println!();
            return Ok(());
        }
    };

    let mut config = match matches.get_one::<String>("config") {
        Some(path) => DigestConfig::load(path)
            .with_context(|| format!("Loading configuration from {}", path))?,
        None => DigestConfig::default(),
    };
    if matches.get_flag("legacy") {
        config.select_longest_log = false;
        config.split_segments = false;
    }
    if let Some(max_chars) = matches.get_one::<usize>("max-chars") {
        config.max_chars = *max_chars;
    }
    if matches.get_flag("trimmed") {
        config.frame_schema = FrameSchema::Trimmed;
    }
    config.validate().context("Invalid configuration")?;

    let export_options = ExportOptions {
        output_dir: matches.get_one::<String>("output-dir").cloned(),
    };

    debug!(patterns = ?file_patterns, "expanding inputs");
    let mut visited = HashSet::new();
    let input_files = expand_input_paths(&file_patterns, &mut visited, 0)?;

    let valid_paths: Vec<PathBuf> = input_files
        .into_iter()
        .filter(|path| {
            let ok = has_log_extension(path, true);
            if !ok {
                let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("none");
                warn!("Skipping file with unsupported extension '{ext}': {path:?}");
            }
            ok
        })
        .collect();

    if valid_paths.is_empty() {
        eprintln!("Error: No valid files found to process.");
        eprintln!("Supported extensions: .BBL, .BFL, .TXT (case-insensitive)");
        eprintln!("Input patterns were: {file_patterns:?}");
        std::process::exit(1);
    }

    let header_only = matches.get_flag("header-only");
    let mut processed_files = 0;
    for path in &valid_paths {
        let result = if header_only {
            process_header(path, &config)
        } else {
            process_file(path, &config, &export_options)
        };
        match result {
            Ok(()) => processed_files += 1,
            Err(e) => error!("{:#}", e),
        }
    }

    if processed_files == 0 {
        eprintln!("Error: No files were successfully processed.");
        std::process::exit(1);
    }

    if valid_paths.len() > 1 {
        println!("Processed {}/{} files", processed_files, valid_paths.len());
    }
    Ok(())
}
