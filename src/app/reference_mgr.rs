// OBDSleuth - app/reference_mgr.rs
//
// Loads the reference document (ECU lists and fault keywords) from disk.
// Failures are non-fatal: each is logged once and the caller receives
// whatever could be loaded, possibly an empty configuration.

use crate::core::model::ReferenceConfig;
use crate::core::reference;
use crate::util::constants;
use crate::util::error::ReferenceError;
use std::path::Path;

/// Load and parse the reference document at `path`.
///
/// Returns the configuration and every non-fatal error encountered.
pub fn load_reference(path: &Path) -> (ReferenceConfig, Vec<ReferenceError>) {
    let (config, errors) = match read_reference(path) {
        Ok(content) => reference::parse_reference_json(&content, path),
        Err(e) => (ReferenceConfig::default(), vec![e]),
    };

    for e in &errors {
        tracing::warn!(error = %e, "Reference load problem");
    }

    tracing::info!(
        path = %path.display(),
        ecus = config.ecu_identifiers.len(),
        keywords = config.fail_keywords.len(),
        ignore_keywords = config.ignore_keywords.len(),
        errors = errors.len(),
        "Reference loaded"
    );

    (config, errors)
}

fn read_reference(path: &Path) -> Result<String, ReferenceError> {
    let io_err = |e| ReferenceError::Io {
        path: path.to_path_buf(),
        source: e,
    };

    let size = std::fs::metadata(path).map_err(io_err)?.len();
    if size > constants::MAX_REFERENCE_FILE_SIZE {
        return Err(ReferenceError::FileTooLarge {
            path: path.to_path_buf(),
            size,
            max_size: constants::MAX_REFERENCE_FILE_SIZE,
        });
    }

    std::fs::read_to_string(path).map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_from_disk() {
        let dir = TempDir::new().expect("tmpdir");
        let path = dir.path().join("reference_list.json");
        std::fs::write(
            &path,
            r##"{"keywords": ["No response"], "engine": ["#1 7E8 ECM"]}"##,
        )
        .unwrap();

        let (config, errors) = load_reference(&path);
        assert!(errors.is_empty());
        assert!(config.ecu_identifiers.contains("7E8"));
        assert_eq!(config.fail_keywords, vec!["No response".to_string()]);
    }

    #[test]
    fn test_missing_file_degrades_to_empty() {
        let dir = TempDir::new().expect("tmpdir");
        let (config, errors) = load_reference(&dir.path().join("absent.json"));
        assert_eq!(config, ReferenceConfig::default());
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ReferenceError::Io { .. }));
        assert!(errors[0].to_string().contains("was not found"));
    }
}
