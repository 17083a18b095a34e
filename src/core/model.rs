// OBDSleuth - core/model.rs
//
// Core data model types. Pure data definitions with no I/O, no UI,
// no platform dependencies.
//
// These types are the shared vocabulary across all layers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

// =============================================================================
// Reference configuration
// =============================================================================

/// Keyword lists and the flattened ECU identifier set.
///
/// Loaded once per run and shared read-only by every analysis call. A failed
/// load yields `ReferenceConfig::default()` (all collections empty), which
/// every consumer must tolerate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceConfig {
    /// Second tokens of every entry in the document's named ECU lists.
    pub ecu_identifiers: HashSet<String>,

    /// Failure keywords, in document order.
    pub fail_keywords: Vec<String>,

    /// Keywords that suppress a line entirely, in document order.
    pub ignore_keywords: Vec<String>,
}

// =============================================================================
// Log document
// =============================================================================

/// Raw text of one scan-tool export plus the name it was read from.
#[derive(Debug, Clone)]
pub struct LogDocument {
    /// File name including extension (e.g. `unit_007_confirmed.txt`).
    pub file_name: String,

    /// Full file content.
    pub content: String,
}

impl LogDocument {
    pub fn new(file_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
        }
    }
}

// =============================================================================
// Mode sections
// =============================================================================

/// Classification of one candidate line inside a mode section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    /// ECU header line; becomes the current ECU context.
    Ecu,
    /// Fault code or fault-status line.
    Fault,
    /// Neither; dropped.
    Discarded,
}

/// A fault line together with the ECU header it was listed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FaultLine {
    /// Trimmed line text.
    pub text: String,

    /// ECU header line that preceded this fault within the section, if any.
    pub ecu: Option<String>,
}

impl FaultLine {
    /// First whitespace-delimited token (the fault code).
    pub fn code(&self) -> &str {
        self.text.split_whitespace().next().unwrap_or("")
    }

    /// Everything after the first whitespace run.
    pub fn description(&self) -> &str {
        let trimmed = self.text.trim_start();
        match trimmed.find(char::is_whitespace) {
            Some(idx) => trimmed[idx..].trim_start(),
            None => "",
        }
    }
}

/// ECU and fault data extracted from one recognised mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModeSection {
    /// Mode label (one of `RECOGNISED_MODES`).
    pub label: String,

    /// ECU header lines in document order (duplicates retained).
    pub ecu_lines: Vec<String>,

    /// Fault lines in document order.
    pub fault_lines: Vec<FaultLine>,

    /// Number of distinct ECU header lines.
    pub ecu_count: usize,
}

impl ModeSection {
    /// Distinct fault codes listed in this section.
    pub fn fault_codes(&self) -> HashSet<&str> {
        self.fault_lines.iter().map(FaultLine::code).collect()
    }
}

// =============================================================================
// Keyword hits
// =============================================================================

/// One line that matched a failure keyword and no ignore keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FaultKeywordHit {
    /// `"Mode {n}"` where n is the delimiter-split section index
    /// (0 = text before the first mode header).
    pub mode_label: String,

    /// Trimmed line text.
    pub line: String,
}

// =============================================================================
// Status reconciliation
// =============================================================================

/// Status inferred from fault codes in modes 3 and 7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileStatus {
    Confirmed,
    Pending,
}

impl FileStatus {
    pub fn label(&self) -> &'static str {
        match self {
            FileStatus::Confirmed => "Confirmed",
            FileStatus::Pending => "Pending",
        }
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Status token taken from the file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DeclaredStatus {
    Confirmed,
    Pending,
    /// Any other token, kept verbatim (lowercased). Never matches.
    Other(String),
}

impl DeclaredStatus {
    /// Map a lowercased status token to a declared status.
    pub fn from_token(token: &str) -> Self {
        match token {
            "confirmed" => DeclaredStatus::Confirmed,
            "pending" => DeclaredStatus::Pending,
            other => DeclaredStatus::Other(other.to_string()),
        }
    }

    pub fn matches(&self, inferred: FileStatus) -> bool {
        matches!(
            (self, inferred),
            (DeclaredStatus::Confirmed, FileStatus::Confirmed)
                | (DeclaredStatus::Pending, FileStatus::Pending)
        )
    }
}

impl std::fmt::Display for DeclaredStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeclaredStatus::Confirmed => f.write_str("Confirmed"),
            DeclaredStatus::Pending => f.write_str("Pending"),
            DeclaredStatus::Other(raw) => {
                // Capitalise the first letter for display, like the known values.
                let mut chars = raw.chars();
                match chars.next() {
                    Some(first) => write!(f, "{}{}", first.to_uppercase(), chars.as_str()),
                    None => Ok(()),
                }
            }
        }
    }
}

/// Declared (file name) versus inferred (content) status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusComparison {
    pub declared: DeclaredStatus,
    pub inferred: FileStatus,
    pub matches: bool,
}

// =============================================================================
// Per-file analysis result
// =============================================================================

/// Everything the engine derives from one log document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisResult {
    /// Distinct ECU count per mode label, including unrecognised labels.
    pub ecu_counts: BTreeMap<String, usize>,

    /// Sections for recognised mode labels only.
    pub mode_sections: BTreeMap<String, ModeSection>,

    /// Set when ECU counts differ between recognised modes.
    pub count_mismatch_warning: Option<String>,

    /// Keyword hits in document order.
    pub keyword_hits: Vec<FaultKeywordHit>,

    /// `None` when the file name has fewer than three `_`-separated tokens.
    pub status_comparison: Option<StatusComparison>,

    /// The ignition cycle counter row from the in-use performance block.
    pub ignition_cycle_counter: Option<String>,
}

impl AnalysisResult {
    /// True when the file belongs in the folder error summary.
    pub fn has_findings(&self) -> bool {
        self.count_mismatch_warning.is_some() || !self.keyword_hits.is_empty()
    }
}

// =============================================================================
// File pairing
// =============================================================================

/// Stems sharing one normalised base name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilePairGroup {
    /// Normalised key (lowercase, status tokens removed).
    pub key: String,

    /// Distinct original stems, first-seen order.
    pub stems: Vec<String>,
}

/// Result of grouping a folder's file stems.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilePairReport {
    /// Groups in first-seen order.
    pub groups: Vec<FilePairGroup>,

    /// Stems seen more than once, one entry per repeat occurrence.
    pub duplicates: Vec<String>,

    /// Stems with no pairing partner.
    pub missing: Vec<String>,
}

// =============================================================================
// Folder report
// =============================================================================

/// Outcome of processing one file during a folder scan.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum FileOutcome {
    /// The file was read and analysed.
    Analyzed {
        file_name: String,
        result: AnalysisResult,
    },

    /// The file could not be read; it is excluded from the analysis.
    Unreadable { file_name: String, reason: String },
}

impl FileOutcome {
    pub fn file_name(&self) -> &str {
        match self {
            FileOutcome::Analyzed { file_name, .. } | FileOutcome::Unreadable { file_name, .. } => {
                file_name
            }
        }
    }
}

/// Aggregate result of a folder scan.
#[derive(Debug, Clone, Serialize)]
pub struct FolderReport {
    /// Scanned folder.
    pub folder: PathBuf,

    /// When the scan started.
    pub generated_at: DateTime<Utc>,

    /// Duplicate and missing-pair detection over all listed files.
    pub pairs: FilePairReport,

    /// Per-file outcomes in listing order. Shorter than the listing when the
    /// scan was cancelled.
    pub files: Vec<FileOutcome>,

    /// True when the scan stopped early on request.
    pub cancelled: bool,
}

// =============================================================================
// Monitor events
// =============================================================================

/// Messages sent from the folder monitor thread to its owner.
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    /// The initial listing was taken; `known` files will not be analysed.
    Started { known: usize },

    /// A newly appeared file was analysed.
    FileAnalyzed {
        path: PathBuf,
        result: Box<AnalysisResult>,
    },

    /// A newly appeared file could not be read.
    FileFailed { path: PathBuf, reason: String },

    /// Listing the folder failed this cycle; the monitor keeps polling.
    Warning { message: String },

    /// The monitor observed its cancel flag and exited.
    Stopped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_line_code_and_description_split_on_first_whitespace_run() {
        let f = FaultLine {
            text: "P0101   Mass Air Flow  Circuit".to_string(),
            ecu: None,
        };
        assert_eq!(f.code(), "P0101");
        assert_eq!(f.description(), "Mass Air Flow  Circuit");
    }

    #[test]
    fn test_fault_line_without_description() {
        let f = FaultLine {
            text: "U0100".to_string(),
            ecu: None,
        };
        assert_eq!(f.code(), "U0100");
        assert_eq!(f.description(), "");
    }

    #[test]
    fn test_declared_status_from_token() {
        assert_eq!(DeclaredStatus::from_token("confirmed"), DeclaredStatus::Confirmed);
        assert_eq!(DeclaredStatus::from_token("pending"), DeclaredStatus::Pending);
        assert_eq!(
            DeclaredStatus::from_token("retest"),
            DeclaredStatus::Other("retest".to_string())
        );
    }

    #[test]
    fn test_other_declared_status_never_matches() {
        let d = DeclaredStatus::Other("confirm".to_string());
        assert!(!d.matches(FileStatus::Confirmed));
        assert!(!d.matches(FileStatus::Pending));
        assert_eq!(d.to_string(), "Confirm");
    }
}
