// OBDSleuth - core/reference.rs
//
// Reference document parsing: failure keywords, ignore keywords and the
// flattened ECU identifier set.
// Core layer: accepts the JSON text, never touches the filesystem.
// I/O is handled by app::reference_mgr which feeds content here.
//
// Keyword loading and ECU loading fail independently: a missing `keywords`
// key still yields the ECU set, and a malformed ECU list still yields the
// keywords.

use crate::core::model::ReferenceConfig;
use crate::util::constants;
use crate::util::error::ReferenceError;
use serde_json::{Map, Value};
use std::path::Path;

/// Parse a reference document into a `ReferenceConfig`.
///
/// `source_path` is used for error messages only (not for I/O).
///
/// Never fails outright: problems are returned alongside whatever could be
/// loaded. A document that is not JSON, or not a JSON object, yields an
/// empty config and a single error.
pub fn parse_reference_json(
    content: &str,
    source_path: &Path,
) -> (ReferenceConfig, Vec<ReferenceError>) {
    let mut errors = Vec::new();

    let value: Value = match serde_json::from_str(content) {
        Ok(v) => v,
        Err(e) => {
            errors.push(ReferenceError::JsonParse {
                path: source_path.to_path_buf(),
                source: e,
            });
            return (ReferenceConfig::default(), errors);
        }
    };

    let Some(doc) = value.as_object() else {
        errors.push(ReferenceError::NotAnObject {
            path: source_path.to_path_buf(),
        });
        return (ReferenceConfig::default(), errors);
    };

    let (fail_keywords, ignore_keywords) = load_keywords(doc, source_path, &mut errors);
    let ecu_identifiers = load_ecu_identifiers(doc, source_path, &mut errors);

    tracing::debug!(
        source = %source_path.display(),
        keywords = fail_keywords.len(),
        ignore_keywords = ignore_keywords.len(),
        ecus = ecu_identifiers.len(),
        errors = errors.len(),
        "Reference document parsed"
    );

    (
        ReferenceConfig {
            ecu_identifiers,
            fail_keywords,
            ignore_keywords,
        },
        errors,
    )
}

/// Load `keywords` (required) and `ignore_keywords` (optional).
///
/// A missing or malformed `keywords` entry empties BOTH lists: an ignore
/// list without fail keywords has nothing to suppress. A malformed
/// `ignore_keywords` entry is reported and treated as empty; the fail
/// keywords still load.
fn load_keywords(
    doc: &Map<String, Value>,
    source_path: &Path,
    errors: &mut Vec<ReferenceError>,
) -> (Vec<String>, Vec<String>) {
    let Some(raw_keywords) = doc.get(constants::KEYWORDS_KEY) else {
        errors.push(ReferenceError::MissingKey {
            path: source_path.to_path_buf(),
            key: constants::KEYWORDS_KEY,
        });
        return (Vec::new(), Vec::new());
    };

    let keywords = match string_list(raw_keywords, constants::KEYWORDS_KEY, source_path) {
        Ok(list) => list,
        Err(e) => {
            errors.push(e);
            return (Vec::new(), Vec::new());
        }
    };

    let ignore = match doc.get(constants::IGNORE_KEYWORDS_KEY) {
        None => Vec::new(),
        Some(raw) => match string_list(raw, constants::IGNORE_KEYWORDS_KEY, source_path) {
            Ok(list) => list,
            Err(e) => {
                errors.push(e);
                Vec::new()
            }
        },
    };

    (drop_blank(keywords), drop_blank(ignore))
}

/// Harvest the second token of every entry in every named list other than
/// the keyword lists.
///
/// Entries that are not strings, or have fewer than two tokens, are reported
/// and skipped; a list that is not an array is reported and skipped whole.
fn load_ecu_identifiers(
    doc: &Map<String, Value>,
    source_path: &Path,
    errors: &mut Vec<ReferenceError>,
) -> std::collections::HashSet<String> {
    let mut identifiers = std::collections::HashSet::new();

    for (key, value) in doc {
        if key == constants::KEYWORDS_KEY || key == constants::IGNORE_KEYWORDS_KEY {
            continue;
        }

        let Some(entries) = value.as_array() else {
            errors.push(ReferenceError::InvalidEntry {
                path: source_path.to_path_buf(),
                key: key.clone(),
                reason: "is not an array of strings".to_string(),
            });
            continue;
        };

        for (idx, entry) in entries.iter().enumerate() {
            let Some(text) = entry.as_str() else {
                errors.push(ReferenceError::InvalidEntry {
                    path: source_path.to_path_buf(),
                    key: format!("{key}[{idx}]"),
                    reason: "is not a string".to_string(),
                });
                continue;
            };

            match text.split_whitespace().nth(1) {
                Some(identifier) => {
                    identifiers.insert(identifier.to_string());
                }
                None => errors.push(ReferenceError::InvalidEntry {
                    path: source_path.to_path_buf(),
                    key: format!("{key}[{idx}]"),
                    reason: format!("'{text}' has no identifier token"),
                }),
            }
        }
    }

    identifiers
}

/// Interpret `value` as an array of strings.
fn string_list(
    value: &Value,
    key: &str,
    source_path: &Path,
) -> Result<Vec<String>, ReferenceError> {
    let invalid = || ReferenceError::InvalidEntry {
        path: source_path.to_path_buf(),
        key: key.to_string(),
        reason: "is not an array of strings".to_string(),
    };

    value
        .as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|v| v.as_str().map(str::to_string).ok_or_else(invalid))
        .collect()
}

/// Remove blank keywords; an empty substring would match every line.
fn drop_blank(list: Vec<String>) -> Vec<String> {
    list.into_iter()
        .filter(|k| {
            let keep = !k.trim().is_empty();
            if !keep {
                tracing::debug!("Skipping blank keyword in reference document");
            }
            keep
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn path() -> PathBuf {
        PathBuf::from("reference_list.json")
    }

    #[test]
    fn test_parse_full_document() {
        let json = r##"{
            "keywords": ["fail", "No response"],
            "ignore_keywords": ["failsafe"],
            "powertrain": ["#1 7E8 ECM", "#2 7E9 TCM"],
            "chassis": ["#3 7EA ABS extra tokens"]
        }"##;
        let (cfg, errors) = parse_reference_json(json, &path());
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        assert_eq!(cfg.fail_keywords, vec!["fail", "No response"]);
        assert_eq!(cfg.ignore_keywords, vec!["failsafe"]);
        assert_eq!(cfg.ecu_identifiers.len(), 3);
        assert!(cfg.ecu_identifiers.contains("7E8"));
        assert!(cfg.ecu_identifiers.contains("7EA"));
    }

    #[test]
    fn test_ignore_keywords_are_optional() {
        let (cfg, errors) = parse_reference_json(r#"{"keywords": ["fail"]}"#, &path());
        assert!(errors.is_empty());
        assert_eq!(cfg.fail_keywords, vec!["fail"]);
        assert!(cfg.ignore_keywords.is_empty());
    }

    #[test]
    fn test_missing_keywords_still_loads_ecus() {
        let json = r##"{"ignore_keywords": ["x"], "ecus": ["#1 7E8 ECM"]}"##;
        let (cfg, errors) = parse_reference_json(json, &path());
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0],
            ReferenceError::MissingKey { key: "keywords", .. }
        ));
        assert!(cfg.fail_keywords.is_empty());
        assert!(cfg.ignore_keywords.is_empty());
        assert!(cfg.ecu_identifiers.contains("7E8"));
    }

    #[test]
    fn test_malformed_ignore_list_keeps_fail_keywords() {
        for ignore in ["null", "\"failsafe\"", "[\"ok\", 7]"] {
            let json = format!(
                r##"{{"keywords": ["no response"], "ignore_keywords": {ignore}, "ecus": ["#1 7E8 ECM"]}}"##
            );
            let (cfg, errors) = parse_reference_json(&json, &path());
            assert_eq!(errors.len(), 1, "ignore_keywords = {ignore}");
            assert_eq!(cfg.fail_keywords, vec!["no response"]);
            assert!(cfg.ignore_keywords.is_empty());
            assert!(cfg.ecu_identifiers.contains("7E8"));
        }
    }

    #[test]
    fn test_malformed_ecu_entry_does_not_block_keywords() {
        let json = r##"{"keywords": ["fail"], "ecus": ["lonely", "#1 7E8 ECM", 42]}"##;
        let (cfg, errors) = parse_reference_json(json, &path());
        assert_eq!(errors.len(), 2);
        assert_eq!(cfg.fail_keywords, vec!["fail"]);
        assert_eq!(cfg.ecu_identifiers.len(), 1);
        assert!(cfg.ecu_identifiers.contains("7E8"));
    }

    #[test]
    fn test_invalid_json_degrades_to_empty_config() {
        let (cfg, errors) = parse_reference_json("{ not json", &path());
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ReferenceError::JsonParse { .. }));
        assert!(cfg.fail_keywords.is_empty());
        assert!(cfg.ecu_identifiers.is_empty());
    }

    #[test]
    fn test_top_level_array_is_rejected() {
        let (cfg, errors) = parse_reference_json(r#"["fail"]"#, &path());
        assert!(matches!(errors[0], ReferenceError::NotAnObject { .. }));
        assert!(cfg.fail_keywords.is_empty());
    }

    #[test]
    fn test_blank_keywords_are_dropped() {
        let (cfg, _) = parse_reference_json(r#"{"keywords": ["fail", "  ", ""]}"#, &path());
        assert_eq!(cfg.fail_keywords, vec!["fail"]);
    }
}
