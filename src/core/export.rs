// OBDSleuth - core/export.rs
//
// CSV and JSON export of folder scan results.
// Core layer: writes to any Write trait object.

use crate::core::model::{FileOutcome, FolderReport};
use crate::util::constants;
use crate::util::error::ExportError;
use std::io::Write;
use std::path::Path;

/// Export one row per file to CSV.
///
/// Columns: file, one ECU count column per recognised mode, warning,
/// keyword_hits, declared_status, inferred_status, status_matches, error.
/// Unreadable files get a row with only `file` and `error` filled.
///
/// Returns the number of data rows written.
pub fn export_csv<W: Write>(
    report: &FolderReport,
    writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    let csv_err = |e: csv::Error| ExportError::Csv {
        path: export_path.to_path_buf(),
        source: e,
    };

    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header: Vec<String> = vec!["file".to_string()];
    header.extend(
        constants::RECOGNISED_MODES
            .iter()
            .map(|m| format!("mode_{m}_ecus")),
    );
    header.extend(
        [
            "warning",
            "keyword_hits",
            "declared_status",
            "inferred_status",
            "status_matches",
            "error",
        ]
        .iter()
        .map(|s| s.to_string()),
    );
    csv_writer.write_record(&header).map_err(csv_err)?;

    let mut count = 0;
    for outcome in &report.files {
        let mut row: Vec<String> = vec![outcome.file_name().to_string()];
        match outcome {
            FileOutcome::Analyzed { result, .. } => {
                row.extend(constants::RECOGNISED_MODES.iter().map(|m| {
                    result
                        .ecu_counts
                        .get(*m)
                        .map(|c| c.to_string())
                        .unwrap_or_default()
                }));
                row.push(result.count_mismatch_warning.clone().unwrap_or_default());
                row.push(result.keyword_hits.len().to_string());
                match &result.status_comparison {
                    Some(s) => {
                        row.push(s.declared.to_string());
                        row.push(s.inferred.to_string());
                        row.push(s.matches.to_string());
                    }
                    None => row.extend(std::iter::repeat(String::new()).take(3)),
                }
                row.push(String::new());
            }
            FileOutcome::Unreadable { reason, .. } => {
                row.extend(
                    std::iter::repeat(String::new()).take(constants::RECOGNISED_MODES.len() + 5),
                );
                row.push(reason.clone());
            }
        }
        csv_writer.write_record(&row).map_err(csv_err)?;
        count += 1;
    }

    csv_writer.flush().map_err(|e| ExportError::Io {
        path: export_path.to_path_buf(),
        source: e,
    })?;

    Ok(count)
}

/// Export the whole folder report as pretty-printed JSON.
pub fn export_json<W: Write>(
    report: &FolderReport,
    writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    serde_json::to_writer_pretty(writer, report).map_err(|e| ExportError::Json {
        path: export_path.to_path_buf(),
        source: e,
    })?;
    Ok(report.files.len())
}
