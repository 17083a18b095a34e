// OBDSleuth - app/analyze.rs
//
// Entry points for analysing one log file or a whole folder of them.
//
// A folder scan lists the files once, runs pair validation over their stems,
// then analyses the files in parallel against the shared reference. The
// cancel flag is checked before each file is opened; once set, remaining
// files are skipped and the partial report is returned with
// `cancelled = true`. Per-file read failures are recorded as `Unreadable`
// outcomes and never abort the scan.

use crate::app::reference_mgr;
use crate::core::analysis::Analyzer;
use crate::core::model::{AnalysisResult, FileOutcome, FolderReport, LogDocument, ReferenceConfig};
use crate::core::pairing;
use crate::platform::fs;
use crate::util::constants;
use crate::util::error::Result;
use chrono::Utc;
use rayon::prelude::*;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

/// Analyse the file at `path` using the reference document at `reference_path`.
///
/// Reference problems are logged and degrade the analysis; a file that
/// cannot be read is an error.
pub fn analyze_file(path: &Path, reference_path: &Path) -> Result<AnalysisResult> {
    let (reference, _) = reference_mgr::load_reference(reference_path);
    analyze_file_with(path, &reference)
}

/// Analyse the file at `path` against an already-loaded reference.
pub fn analyze_file_with(path: &Path, reference: &ReferenceConfig) -> Result<AnalysisResult> {
    let content = fs::read_log_file(path)?;
    let doc = LogDocument::new(fs::file_name_of(path), content);
    Ok(Analyzer::new(reference).analyze(&doc))
}

/// Scan every log file directly inside `folder`.
pub fn analyze_folder(
    folder: &Path,
    reference_path: &Path,
    cancel: &AtomicBool,
) -> Result<FolderReport> {
    let (reference, _) = reference_mgr::load_reference(reference_path);
    analyze_folder_with(folder, &reference, constants::DEFAULT_LOG_EXTENSION, cancel)
}

/// Scan files with `extension` directly inside `folder` against `reference`.
///
/// Only a missing or unlistable folder is an error.
pub fn analyze_folder_with(
    folder: &Path,
    reference: &ReferenceConfig,
    extension: &str,
    cancel: &AtomicBool,
) -> Result<FolderReport> {
    analyze_folder_checked(folder, reference, extension, || cancel.load(Ordering::Relaxed))
}

/// As `analyze_folder_with`, with cancellation polled through
/// `is_cancelled` once per file before it is opened.
pub fn analyze_folder_checked<F>(
    folder: &Path,
    reference: &ReferenceConfig,
    extension: &str,
    is_cancelled: F,
) -> Result<FolderReport>
where
    F: Fn() -> bool + Sync,
{
    let generated_at = Utc::now();
    let files = fs::list_log_files(folder, extension)?;

    let stems: Vec<String> = files.iter().map(|p| fs::file_stem_of(p)).collect();
    let pairs = pairing::group_file_pairs(&stems);

    tracing::info!(
        folder = %folder.display(),
        files = files.len(),
        duplicates = pairs.duplicates.len(),
        missing = pairs.missing.len(),
        "Folder scan started"
    );

    let analyzer = Analyzer::new(reference);

    // Indexed parallel map keeps listing order; `None` marks a skipped file.
    let outcomes: Vec<Option<FileOutcome>> = files
        .par_iter()
        .map(|path| {
            if is_cancelled() {
                return None;
            }
            let file_name = fs::file_name_of(path);
            let outcome = match fs::read_log_file(path) {
                Ok(content) => FileOutcome::Analyzed {
                    result: analyzer.analyze(&LogDocument::new(file_name.clone(), content)),
                    file_name,
                },
                Err(e) => {
                    tracing::warn!(file = %path.display(), error = %e, "Could not read log file");
                    FileOutcome::Unreadable {
                        file_name,
                        reason: e.to_string(),
                    }
                }
            };
            Some(outcome)
        })
        .collect();

    let cancelled = outcomes.iter().any(Option::is_none);
    let files: Vec<FileOutcome> = outcomes.into_iter().flatten().collect();

    if cancelled {
        tracing::info!(analysed = files.len(), "Folder scan stopped by user");
    } else {
        tracing::info!(analysed = files.len(), "Folder scan complete");
    }

    Ok(FolderReport {
        folder: folder.to_path_buf(),
        generated_at,
        pairs,
        files,
        cancelled,
    })
}
