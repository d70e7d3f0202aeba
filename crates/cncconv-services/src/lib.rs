//! High-level orchestration layer over the converter crates.
//! Intentionally thin: exposes stable functions used by CLI/GUI/test
//! harnesses without making them import the leaf crates.

use std::fs;
use std::path::{Path, PathBuf};

use cncconv_core::{ConvertError, FilenameTransformConfig, RuleTable};
use cncconv_domain::{BatchSummary, FileOutcome};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub use cncconv_names::transform_filename;
pub use cncconv_rewrite::rewrite_lines;
pub use cncconv_rules::load_rule_table;
pub use cncconv_validate::check_residual_commands;

/// Progress/cancellation capability handed in by the caller. Both hooks
/// have no-op defaults; `()` is the "no observer" observer.
///
/// Cancellation is cooperative: it is polled at the checkpoints below,
/// never mid-line.
pub trait ConversionObserver {
    fn report_progress(&mut self, stage: Stage, detail: &str) {
        let _ = (stage, detail);
    }

    fn is_cancelled(&self) -> bool {
        false
    }
}

impl ConversionObserver for () {}

/// Checkpoints at which progress is reported and cancellation polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ReadSource,
    Rewrite,
    WriteOutput,
}

/// Convert one program file and write the result under `target_dir`
/// with its transformed name. Returns the output path.
///
/// The residual-command check runs after the write; its findings are
/// logged and never block success.
pub fn convert_single_file(
    path: &Path,
    target_dir: &Path,
    table: &RuleTable,
    filename: &FilenameTransformConfig,
    observer: &mut dyn ConversionObserver,
) -> Result<PathBuf, ConvertError> {
    let file_name = display_name(path);

    if observer.is_cancelled() {
        return Err(ConvertError::Cancelled);
    }
    observer.report_progress(Stage::ReadSource, &file_name);
    let lines = read_program_lines(path)?;
    if observer.is_cancelled() {
        return Err(ConvertError::Cancelled);
    }

    observer.report_progress(Stage::Rewrite, &file_name);
    let converted = rewrite_lines(&lines, table);
    if observer.is_cancelled() {
        return Err(ConvertError::Cancelled);
    }

    observer.report_progress(Stage::WriteOutput, &file_name);
    let new_name = transform_filename(&file_name, filename);
    fs::create_dir_all(target_dir).map_err(|e| ConvertError::io(target_dir, e))?;
    let out_path = target_dir.join(&new_name);
    fs::write(&out_path, converted.concat()).map_err(|e| ConvertError::io(&out_path, e))?;

    let residual = check_residual_commands(&converted, table);
    if residual.is_empty() {
        debug!("no residual source commands in {}", out_path.display());
    } else {
        for finding in &residual {
            warn!(
                line = finding.line,
                command = %finding.command,
                "residual source command after conversion: {}",
                finding.text
            );
        }
    }
    info!("converted {} -> {}", path.display(), out_path.display());
    Ok(out_path)
}

/// Convert every regular file directly inside `source_dir` (flat, no
/// recursion). One file's failure is recorded and never stops the
/// batch; cancellation stops the loop early, with `total` still set to
/// the number of files discovered.
pub fn batch_convert(
    source_dir: &Path,
    target_dir: &Path,
    table: &RuleTable,
    filename: &FilenameTransformConfig,
    observer: &mut dyn ConversionObserver,
) -> Result<BatchSummary, ConvertError> {
    if !source_dir.is_dir() {
        return Err(ConvertError::NotFound {
            path: source_dir.to_path_buf(),
        });
    }
    fs::create_dir_all(target_dir).map_err(|e| ConvertError::io(target_dir, e))?;

    let files: Vec<PathBuf> = WalkDir::new(source_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();

    if files.is_empty() {
        warn!("no files found in {}", source_dir.display());
        return Ok(BatchSummary::default());
    }

    info!(
        "starting batch conversion: {} files from {} -> {}",
        files.len(),
        source_dir.display(),
        target_dir.display()
    );

    let mut summary = BatchSummary {
        total: files.len(),
        ..Default::default()
    };
    for path in &files {
        if observer.is_cancelled() {
            warn!("batch conversion cancelled");
            break;
        }
        let name = display_name(path);
        match convert_single_file(path, target_dir, table, filename, observer) {
            Ok(out) => {
                summary.succeeded += 1;
                summary.files.push(FileOutcome {
                    file: name,
                    status: "converted".into(),
                    output: Some(out.display().to_string()),
                    error: None,
                });
            }
            Err(ConvertError::Cancelled) => {
                warn!("batch conversion cancelled");
                break;
            }
            Err(err) => {
                warn!("conversion failed for {name}: {err}");
                summary.failed += 1;
                summary.files.push(FileOutcome {
                    file: name,
                    status: "failed".into(),
                    output: None,
                    error: Some(err.to_string()),
                });
            }
        }
    }

    info!(
        "batch finished: {} succeeded, {} failed, {} total",
        summary.succeeded, summary.failed, summary.total
    );
    Ok(summary)
}

/// Read a program file as lines, dropping undecodable bytes instead of
/// failing the whole read.
pub fn read_program_lines(path: &Path) -> Result<Vec<String>, ConvertError> {
    let bytes = fs::read(path).map_err(|e| ConvertError::io(path, e))?;
    let mut content = String::with_capacity(bytes.len());
    let mut rest = bytes.as_slice();
    loop {
        match std::str::from_utf8(rest) {
            Ok(tail) => {
                content.push_str(tail);
                break;
            }
            Err(err) => {
                let valid = err.valid_up_to();
                content.push_str(&String::from_utf8_lossy(&rest[..valid]));
                let skip = err.error_len().unwrap_or(rest.len() - valid);
                rest = &rest[valid + skip..];
            }
        }
    }
    Ok(content.lines().map(str::to_string).collect())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
