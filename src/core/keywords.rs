// OBDSleuth - core/keywords.rs
//
// Failure keyword scanning with an ignore-list override.
// Core layer: pure string processing.
//
// Unlike the mode parser, the text before the first mode delimiter is kept
// as section 0, so hits in the preamble are still reported.

use crate::core::model::{FaultKeywordHit, ReferenceConfig};
use crate::util::constants;

/// Case-insensitive substring matcher over a fail list and an ignore list.
///
/// Keywords are lowercased once at construction; a scanner built from the
/// run's `ReferenceConfig` can be shared read-only across threads.
#[derive(Debug, Clone, Default)]
pub struct KeywordScanner {
    fail_keywords: Vec<String>,
    ignore_keywords: Vec<String>,
}

impl KeywordScanner {
    pub fn new<S: AsRef<str>>(fail_keywords: &[S], ignore_keywords: &[S]) -> Self {
        Self {
            fail_keywords: lowercase_all(fail_keywords),
            ignore_keywords: lowercase_all(ignore_keywords),
        }
    }

    pub fn from_reference(reference: &ReferenceConfig) -> Self {
        Self::new(&reference.fail_keywords, &reference.ignore_keywords)
    }

    /// True when the scanner has no fail keywords and can never produce a hit.
    pub fn is_empty(&self) -> bool {
        self.fail_keywords.is_empty()
    }

    /// Test a single line. Ignore keywords take precedence; otherwise the
    /// first matching fail keyword wins.
    pub fn match_line(&self, line: &str) -> Option<&str> {
        let lower = line.to_lowercase();
        if self.ignore_keywords.iter().any(|k| lower.contains(k.as_str())) {
            return None;
        }
        self.fail_keywords
            .iter()
            .find(|k| lower.contains(k.as_str()))
            .map(String::as_str)
    }

    /// Scan `text`, tagging each hit with its section index.
    pub fn scan(&self, text: &str) -> Vec<FaultKeywordHit> {
        let mut hits = Vec::new();
        if self.is_empty() {
            return hits;
        }

        for (index, section) in text.split(constants::MODE_DELIMITER).enumerate() {
            for line in section.split('\n') {
                if let Some(keyword) = self.match_line(line) {
                    tracing::trace!(
                        section = index,
                        keyword,
                        line = crate::util::logging::preview(line.trim()),
                        "Keyword hit"
                    );
                    hits.push(FaultKeywordHit {
                        mode_label: format!("Mode {index}"),
                        line: line.trim().to_string(),
                    });
                }
            }
        }

        hits
    }
}

fn lowercase_all<S: AsRef<str>>(list: &[S]) -> Vec<String> {
    list.iter().map(|s| s.as_ref().to_lowercase()).collect()
}

/// Convenience wrapper: build a scanner and scan once.
pub fn scan<S: AsRef<str>>(
    text: &str,
    fail_keywords: &[S],
    ignore_keywords: &[S],
) -> Vec<FaultKeywordHit> {
    KeywordScanner::new(fail_keywords, ignore_keywords).scan(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: &[&str] = &[];

    #[test]
    fn test_no_response_hit_tagged_with_section_index() {
        let text = "preamble\nScan-Tool Mode 1 - Data\n---\n\
                    Scan-Tool Mode 3 - DTCs\n---\nPxxxx No response\n";
        let hits = scan(text, &["no response"], NONE);
        assert_eq!(
            hits,
            vec![FaultKeywordHit {
                mode_label: "Mode 2".to_string(),
                line: "Pxxxx No response".to_string(),
            }]
        );
    }

    #[test]
    fn test_preamble_hits_are_section_zero() {
        let hits = scan("Connection FAILED\nScan-Tool Mode 1 - x\n", &["fail"], NONE);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].mode_label, "Mode 0");
    }

    #[test]
    fn test_ignore_keyword_takes_precedence() {
        let hits = scan(
            "Failsafe mode inactive - fail counter 0\n",
            &["fail"],
            &["failsafe"],
        );
        assert!(hits.is_empty());
    }

    #[test]
    fn test_one_hit_per_line() {
        let hits = scan("ECU failed: no response\n", &["fail", "no response"], NONE);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].line, "ECU failed: no response");
    }

    #[test]
    fn test_substring_matching_not_tokenised() {
        let hits = scan("failure\nfailed\nFAIL\nok\n", &["fail"], NONE);
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn test_empty_keyword_list_yields_nothing() {
        assert!(scan("fail everywhere\n", NONE, NONE).is_empty());
    }

    #[test]
    fn test_ignore_keyword_case_insensitive() {
        let hits = scan("KNOWN FAIL\n", &["fail"], &["known fail"]);
        assert!(hits.is_empty());
    }
}
