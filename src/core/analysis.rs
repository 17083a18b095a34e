// OBDSleuth - core/analysis.rs
//
// Per-document analysis: runs the mode parser, keyword scanner and
// consistency checks over one log document and assembles an AnalysisResult.
// Core layer: no I/O. One Analyzer can be shared across threads; every call
// produces a fresh result.

use crate::core::consistency;
use crate::core::keywords::KeywordScanner;
use crate::core::model::{AnalysisResult, LogDocument, ReferenceConfig};
use crate::core::parser;

/// Reference data prepared for repeated analysis.
#[derive(Debug, Clone)]
pub struct Analyzer<'r> {
    reference: &'r ReferenceConfig,
    scanner: KeywordScanner,
}

impl<'r> Analyzer<'r> {
    pub fn new(reference: &'r ReferenceConfig) -> Self {
        Self {
            reference,
            scanner: KeywordScanner::from_reference(reference),
        }
    }

    pub fn analyze(&self, doc: &LogDocument) -> AnalysisResult {
        let parsed = parser::parse_modes(&doc.content, &self.reference.ecu_identifiers);
        let count_mismatch_warning = consistency::check_ecu_counts(&parsed.ecu_counts);
        let keyword_hits = self.scanner.scan(&doc.content);
        let status_comparison = consistency::compare_status(&doc.file_name, &parsed.sections);
        let ignition_cycle_counter = parser::find_ignition_cycle_counter(&doc.content);

        tracing::debug!(
            file = %doc.file_name,
            modes = parsed.sections.len(),
            keyword_hits = keyword_hits.len(),
            warning = count_mismatch_warning.is_some(),
            "Document analysed"
        );

        AnalysisResult {
            ecu_counts: parsed.ecu_counts,
            mode_sections: parsed.sections,
            count_mismatch_warning,
            keyword_hits,
            status_comparison,
            ignition_cycle_counter,
        }
    }
}

/// Analyse a single document against `reference`.
pub fn analyze_document(doc: &LogDocument, reference: &ReferenceConfig) -> AnalysisResult {
    Analyzer::new(reference).analyze(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{DeclaredStatus, FileStatus};

    fn reference() -> ReferenceConfig {
        ReferenceConfig {
            ecu_identifiers: ["7E8", "7E9"].iter().map(|s| s.to_string()).collect(),
            fail_keywords: vec!["no response".to_string(), "fail".to_string()],
            ignore_keywords: vec!["failsafe".to_string()],
        }
    }

    fn full_log(mode3: &str, mode7: &str) -> String {
        let mut out = String::from("Scan report\n");
        for mode in ["1", "2", "3", "6", "7", "9", "A"] {
            out.push_str(&format!("Scan-Tool Mode {mode} - Section\n----\n"));
            out.push_str("#1 7E8 ECM\n#2 7E9 TCM\n");
            if mode == "3" {
                out.push_str(mode3);
            }
            if mode == "7" {
                out.push_str(mode7);
            }
        }
        out
    }

    #[test]
    fn test_healthy_confirmed_log() {
        let doc = LogDocument::new(
            "unit_007_confirmed.txt",
            full_log("P0101 MAF range\n", "P0101 MAF range\n"),
        );
        let result = analyze_document(&doc, &reference());

        assert_eq!(result.count_mismatch_warning, None);
        assert!(result.keyword_hits.is_empty());
        assert!(!result.has_findings());
        assert_eq!(result.ecu_counts.len(), 7);
        assert!(result.ecu_counts.values().all(|&c| c == 2));

        let status = result.status_comparison.expect("status");
        assert_eq!(status.declared, DeclaredStatus::Confirmed);
        assert_eq!(status.inferred, FileStatus::Confirmed);
        assert!(status.matches);
    }

    #[test]
    fn test_truncated_log_warns_and_reports_hits() {
        let mut text = full_log("", "P0200 Injector circuit\n");
        // Drop mode A entirely and add a failing line.
        let cut = text.find("Scan-Tool Mode A").expect("mode A present");
        text.truncate(cut);
        text.push_str("Module 7EA No response\n");

        let doc = LogDocument::new("unit_007_confirmed.txt", text);
        let result = analyze_document(&doc, &reference());

        assert!(result.count_mismatch_warning.is_some());
        assert_eq!(result.keyword_hits.len(), 1);
        assert_eq!(result.keyword_hits[0].mode_label, "Mode 6");
        assert!(result.has_findings());

        let status = result.status_comparison.expect("status");
        assert_eq!(status.inferred, FileStatus::Pending);
        assert!(!status.matches);
    }

    #[test]
    fn test_empty_reference_degrades_gracefully() {
        let doc = LogDocument::new("scan.txt", full_log("P0101 x\n", ""));
        let result = analyze_document(&doc, &ReferenceConfig::default());
        // No ECU identifiers: every mode counts zero, consistently.
        assert!(result.ecu_counts.values().all(|&c| c == 0));
        assert_eq!(result.count_mismatch_warning, None);
        assert!(result.keyword_hits.is_empty());
        assert_eq!(result.status_comparison, None);
    }
}
