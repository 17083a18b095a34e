// OBDSleuth - core/report.rs
//
// Human-readable rendering of per-file results and folder summaries.
// Core layer: returns Strings, the caller decides where they go.
//
// Two renderings share one layout: plain text for terminals and a styled
// HTML document for viewers. All log-derived text is escaped in HTML.

use crate::core::model::{AnalysisResult, FileOutcome, FolderReport, ModeSection};
use crate::util::constants;
use std::collections::HashSet;

/// Output flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    PlainText,
    Html,
}

const HTML_STYLE: &str = "<style>\n\
    body { font-family: Arial, sans-serif; }\n\
    h2 { color: #2E8B57; }\n\
    h3 { color: #4682B4; }\n\
    ul { margin-left: 20px; }\n\
    li { margin-bottom: 5px; }\n\
    .error { color: red; }\n\
    .warning { color: red; }\n\
</style>\n";

/// Accumulates report output in either format.
struct ReportWriter {
    format: ReportFormat,
    out: String,
    in_list: bool,
}

impl ReportWriter {
    fn new(format: ReportFormat) -> Self {
        let mut out = String::new();
        if format == ReportFormat::Html {
            out.push_str(HTML_STYLE);
        }
        Self {
            format,
            out,
            in_list: false,
        }
    }

    fn heading(&mut self, level: u8, text: &str, class: Option<&str>) {
        self.end_list();
        match self.format {
            ReportFormat::PlainText => {
                let rule = if level <= 2 { '=' } else { '-' };
                self.out.push('\n');
                self.out.push_str(text);
                self.out.push('\n');
                self.out
                    .extend(std::iter::repeat(rule).take(text.chars().count()));
                self.out.push('\n');
            }
            ReportFormat::Html => {
                let class_attr = class.map(|c| format!(" class='{c}'")).unwrap_or_default();
                self.out.push_str(&format!(
                    "<h{level}{class_attr}>{}</h{level}>\n",
                    escape_html(text)
                ));
            }
        }
    }

    fn line(&mut self, text: &str, class: Option<&str>) {
        self.end_list();
        match self.format {
            ReportFormat::PlainText => {
                self.out.push_str(text);
                self.out.push('\n');
            }
            ReportFormat::Html => match class {
                Some(c) => self.out.push_str(&format!(
                    "<span class='{c}'>{}</span><br>\n",
                    escape_html(text)
                )),
                None => self.out.push_str(&format!("{}<br>\n", escape_html(text))),
            },
        }
    }

    fn item(&mut self, text: &str, class: Option<&str>) {
        if !self.in_list {
            if self.format == ReportFormat::Html {
                self.out.push_str("<ul>\n");
            }
            self.in_list = true;
        }
        match self.format {
            ReportFormat::PlainText => {
                self.out.push_str("  - ");
                self.out.push_str(text);
                self.out.push('\n');
            }
            ReportFormat::Html => {
                let class_attr = class.map(|c| format!(" class='{c}'")).unwrap_or_default();
                self.out
                    .push_str(&format!("<li{class_attr}>{}</li>\n", escape_html(text)));
            }
        }
    }

    fn end_list(&mut self) {
        if self.in_list {
            if self.format == ReportFormat::Html {
                self.out.push_str("</ul>\n");
            }
            self.in_list = false;
        }
    }

    fn finish(mut self) -> String {
        self.end_list();
        self.out
    }
}

/// Escape text for inclusion in HTML element content or quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

// =============================================================================
// Per-file report
// =============================================================================

/// Render the full report for one analysed file.
pub fn render_file_report(file_name: &str, result: &AnalysisResult, format: ReportFormat) -> String {
    let mut w = ReportWriter::new(format);
    w.heading(2, &format!("Processing file: {file_name}"), None);
    write_file_body(&mut w, result);
    w.finish()
}

fn write_file_body(w: &mut ReportWriter, result: &AnalysisResult) {
    // ECU counts per recognised mode.
    w.heading(3, "ECU counts", None);
    for mode in constants::RECOGNISED_MODES {
        let count = result
            .ecu_counts
            .get(*mode)
            .map(|c| c.to_string())
            .unwrap_or_else(|| "No data available".to_string());
        w.item(&format!("ECUs in mode {mode}: {count}"), None);
    }

    if let Some(warning) = &result.count_mismatch_warning {
        w.line(&format!("Warning: {warning}"), Some("warning"));
    }

    for mode in constants::DETAIL_MODES {
        write_mode_detail(w, mode, result.mode_sections.get(*mode));
    }

    if !result.keyword_hits.is_empty() {
        w.heading(3, "Fail details found", Some("error"));
        for hit in &result.keyword_hits {
            w.item(&format!("{} - {}", hit.mode_label, hit.line), Some("error"));
        }
    }

    if let Some(status) = &result.status_comparison {
        if status.matches {
            w.line(&format!("Status matches: {}", status.inferred), None);
        } else {
            w.line(
                &format!(
                    "Status mismatch! Logfile: {}, Determined: {}",
                    status.declared, status.inferred
                ),
                Some("error"),
            );
        }
    }

    if let Some(counter) = &result.ignition_cycle_counter {
        w.line(&format!("Ignition Cycle Counter: {counter}"), None);
    }
}

/// ECU and fault listing for one detail mode. Every ECU line of the mode is
/// listed, each followed by the faults read beneath it; faults seen before
/// any ECU line come first.
fn write_mode_detail(w: &mut ReportWriter, mode: &str, section: Option<&ModeSection>) {
    let Some(section) = section.filter(|s| !s.ecu_lines.is_empty() || !s.fault_lines.is_empty())
    else {
        w.line(&format!("No Faults Detected in Mode {mode}"), None);
        return;
    };

    w.heading(3, &format!("Faults and Data for Mode {mode}"), None);
    write_faults(w, section, None);

    let mut listed: HashSet<&str> = HashSet::new();
    for ecu in &section.ecu_lines {
        if !listed.insert(ecu.as_str()) {
            continue;
        }
        w.line(ecu, None);
        write_faults(w, section, Some(ecu.as_str()));
    }

    if section.fault_lines.is_empty() {
        w.line(&format!("No Faults Detected in Mode {mode}"), None);
    }
}

fn write_faults(w: &mut ReportWriter, section: &ModeSection, ecu: Option<&str>) {
    for fault in section.fault_lines.iter().filter(|f| f.ecu.as_deref() == ecu) {
        let description = fault.description();
        if description.is_empty() {
            w.item(fault.code(), None);
        } else {
            w.item(&format!("{} {description}", fault.code()), None);
        }
    }
}

// =============================================================================
// Folder report
// =============================================================================

/// Render the folder summary: duplicates, missing pairs, unreadable files,
/// then one block per file that has a warning or keyword hit. Files with
/// neither are omitted.
pub fn render_folder_report(report: &FolderReport, format: ReportFormat) -> String {
    let mut w = ReportWriter::new(format);
    w.heading(
        2,
        &format!("Folder check: {}", report.folder.display()),
        None,
    );
    w.line(
        &format!(
            "Generated {} ({} file(s) processed)",
            report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            report.files.len()
        ),
        None,
    );

    if !report.pairs.duplicates.is_empty() {
        w.heading(2, "Duplicate Files Found:", None);
        for stem in &report.pairs.duplicates {
            w.item(stem, None);
        }
    }

    if !report.pairs.missing.is_empty() {
        w.heading(2, "Files with Missing Pairs:", Some("error"));
        for stem in &report.pairs.missing {
            w.item(stem, None);
        }
    }

    let unreadable: Vec<(&str, &str)> = report
        .files
        .iter()
        .filter_map(|f| match f {
            FileOutcome::Unreadable { file_name, reason } => {
                Some((file_name.as_str(), reason.as_str()))
            }
            FileOutcome::Analyzed { .. } => None,
        })
        .collect();
    if !unreadable.is_empty() {
        w.heading(2, "Unreadable Files:", Some("error"));
        for (name, reason) in unreadable {
            w.item(&format!("{name}: {reason}"), Some("error"));
        }
    }

    let with_findings: Vec<(&str, &AnalysisResult)> = report
        .files
        .iter()
        .filter_map(|f| match f {
            FileOutcome::Analyzed { file_name, result } if result.has_findings() => {
                Some((file_name.as_str(), result))
            }
            _ => None,
        })
        .collect();

    if with_findings.is_empty() {
        w.line("No errors found across all files.", None);
    } else {
        w.heading(2, "Summary of Errors:", None);
        for (name, result) in with_findings {
            w.heading(3, &format!("{name}:"), None);
            if let Some(warning) = &result.count_mismatch_warning {
                w.item(&format!("Warning: {warning}"), Some("warning"));
            }
            for hit in &result.keyword_hits {
                w.item(&format!("{} - {}", hit.mode_label, hit.line), None);
            }
        }
    }

    if report.cancelled {
        w.line("Process was stopped by the user.", None);
    }

    w.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{
        DeclaredStatus, FaultKeywordHit, FaultLine, FilePairReport, FileStatus, StatusComparison,
    };
    use chrono::{TimeZone, Utc};
    use std::path::PathBuf;

    fn result_with_faults() -> AnalysisResult {
        let mut result = AnalysisResult::default();
        result.ecu_counts.insert("1".to_string(), 2);
        result.ecu_counts.insert("3".to_string(), 2);
        result.mode_sections.insert(
            "3".to_string(),
            ModeSection {
                label: "3".to_string(),
                ecu_lines: vec!["#1 7E8 ECM".to_string()],
                fault_lines: vec![FaultLine {
                    text: "P0101  Mass Air Flow".to_string(),
                    ecu: Some("#1 7E8 ECM".to_string()),
                }],
                ecu_count: 1,
            },
        );
        result.status_comparison = Some(StatusComparison {
            declared: DeclaredStatus::Confirmed,
            inferred: FileStatus::Pending,
            matches: false,
        });
        result
    }

    fn folder_report(files: Vec<FileOutcome>) -> FolderReport {
        FolderReport {
            folder: PathBuf::from("logs"),
            generated_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            pairs: FilePairReport::default(),
            files,
            cancelled: false,
        }
    }

    #[test]
    fn test_file_report_lists_counts_with_placeholder() {
        let text = render_file_report("unit_1_confirmed.txt", &result_with_faults(), ReportFormat::PlainText);
        assert!(text.contains("ECUs in mode 1: 2"));
        assert!(text.contains("ECUs in mode 2: No data available"));
        assert!(text.contains("ECUs in mode A: No data available"));
    }

    #[test]
    fn test_file_report_fault_detail_and_status() {
        let text = render_file_report("unit_1_confirmed.txt", &result_with_faults(), ReportFormat::PlainText);
        assert!(text.contains("Faults and Data for Mode 3"));
        assert!(text.contains("#1 7E8 ECM"));
        assert!(text.contains("  - P0101 Mass Air Flow"));
        assert!(text.contains("No Faults Detected in Mode 7"));
        assert!(text.contains("Status mismatch! Logfile: Confirmed, Determined: Pending"));
    }

    #[test]
    fn test_ecus_listed_for_mode_without_faults() {
        let mut result = AnalysisResult::default();
        result.mode_sections.insert(
            "3".to_string(),
            ModeSection {
                label: "3".to_string(),
                ecu_lines: vec!["#1 7E8 ECM".to_string(), "#2 7E9 TCM".to_string()],
                fault_lines: Vec::new(),
                ecu_count: 2,
            },
        );
        let text = render_file_report("unit_1_confirmed.txt", &result, ReportFormat::PlainText);
        let detail = &text[text.find("Faults and Data for Mode 3").expect("mode 3 detail")..];
        assert!(detail.contains("#1 7E8 ECM"));
        assert!(detail.contains("#2 7E9 TCM"));
        assert!(detail.contains("No Faults Detected in Mode 3"));
        assert!(!text.contains("Faults and Data for Mode 7"));
    }

    #[test]
    fn test_faults_grouped_under_their_ecu() {
        let mut result = result_with_faults();
        let section = result.mode_sections.get_mut("3").expect("mode 3");
        section.ecu_lines.push("#2 7E9 TCM".to_string());
        section.fault_lines.push(FaultLine {
            text: "U0100 Lost Communication".to_string(),
            ecu: Some("#2 7E9 TCM".to_string()),
        });
        let text = render_file_report("unit_1_confirmed.txt", &result, ReportFormat::PlainText);
        let ecm = text.find("#1 7E8 ECM").expect("ECM listed");
        let p0101 = text.find("P0101 Mass Air Flow").expect("P0101 listed");
        let tcm = text.find("#2 7E9 TCM").expect("TCM listed");
        let u0100 = text.find("U0100 Lost Communication").expect("U0100 listed");
        assert!(ecm < p0101 && p0101 < tcm && tcm < u0100);
        assert!(!text.contains("No Faults Detected in Mode 3"));
    }

    #[test]
    fn test_html_escapes_log_text() {
        let mut result = AnalysisResult::default();
        result.keyword_hits.push(FaultKeywordHit {
            mode_label: "Mode 1".to_string(),
            line: "<script>fail</script>".to_string(),
        });
        let html = render_file_report("x.txt", &result, ReportFormat::Html);
        assert!(html.starts_with("<style>"));
        assert!(html.contains("&lt;script&gt;fail&lt;/script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_folder_report_omits_clean_files() {
        let mut noisy = AnalysisResult::default();
        noisy.count_mismatch_warning = Some(constants::ECU_COUNT_MISMATCH_WARNING.to_string());
        let report = folder_report(vec![
            FileOutcome::Analyzed {
                file_name: "clean_1_confirmed.txt".to_string(),
                result: AnalysisResult::default(),
            },
            FileOutcome::Analyzed {
                file_name: "noisy_1_confirmed.txt".to_string(),
                result: noisy,
            },
        ]);
        let text = render_folder_report(&report, ReportFormat::PlainText);
        assert!(text.contains("Summary of Errors:"));
        assert!(text.contains("noisy_1_confirmed.txt:"));
        assert!(!text.contains("clean_1_confirmed.txt"));
        assert!(text.contains("Warning: ECU counts are not the same in all modes."));
    }

    #[test]
    fn test_folder_report_no_errors_pairs_and_cancel() {
        let mut report = folder_report(vec![FileOutcome::Unreadable {
            file_name: "bad_1_pending.txt".to_string(),
            reason: "invalid UTF-8".to_string(),
        }]);
        report.pairs.duplicates.push("dup_1_confirmed".to_string());
        report.pairs.missing.push("bad_1_pending".to_string());
        report.cancelled = true;

        let text = render_folder_report(&report, ReportFormat::PlainText);
        assert!(text.contains("Duplicate Files Found:"));
        assert!(text.contains("  - dup_1_confirmed"));
        assert!(text.contains("Files with Missing Pairs:"));
        assert!(text.contains("bad_1_pending.txt: invalid UTF-8"));
        assert!(text.contains("No errors found across all files."));
        assert!(text.trim_end().ends_with("Process was stopped by the user."));
    }

    #[test]
    fn test_html_lists_are_closed() {
        let mut report = folder_report(Vec::new());
        report.pairs.missing.push("a_1_pending".to_string());
        let html = render_folder_report(&report, ReportFormat::Html);
        assert_eq!(html.matches("<ul>").count(), html.matches("</ul>").count());
        assert!(html.contains("<h2 class='error'>Files with Missing Pairs:</h2>"));
    }
}
