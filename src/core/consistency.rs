// OBDSleuth - core/consistency.rs
//
// Cross-mode ECU count check and declared-vs-inferred status reconciliation.
// Core layer: pure functions over parser output.

use crate::core::model::{DeclaredStatus, FileStatus, ModeSection, StatusComparison};
use crate::util::constants;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Compare the ECU count of every recognised mode against the first
/// recognised mode. An absent mode counts as zero.
///
/// Returns the mismatch warning text when any count differs.
pub fn check_ecu_counts(ecu_counts: &BTreeMap<String, usize>) -> Option<String> {
    let count_of = |mode: &str| ecu_counts.get(mode).copied().unwrap_or(0);
    let reference = count_of(constants::RECOGNISED_MODES[0]);

    let mismatched = constants::RECOGNISED_MODES
        .iter()
        .find(|mode| count_of(mode) != reference);

    match mismatched {
        Some(mode) => {
            tracing::debug!(
                reference_mode = constants::RECOGNISED_MODES[0],
                reference_count = reference,
                mode = *mode,
                count = count_of(mode),
                "ECU count mismatch"
            );
            Some(constants::ECU_COUNT_MISMATCH_WARNING.to_string())
        }
        None => None,
    }
}

/// Infer the file status from fault codes: any code listed in mode 7 but not
/// in mode 3 makes the file `Pending`; otherwise it is `Confirmed`.
pub fn infer_status(sections: &BTreeMap<String, ModeSection>) -> FileStatus {
    let confirmed = fault_codes(sections, constants::CONFIRMED_FAULT_MODE);
    let pending = fault_codes(sections, constants::PENDING_FAULT_MODE);

    if pending.iter().any(|code| !confirmed.contains(code)) {
        FileStatus::Pending
    } else {
        FileStatus::Confirmed
    }
}

fn fault_codes<'a>(sections: &'a BTreeMap<String, ModeSection>, mode: &str) -> HashSet<&'a str> {
    sections
        .get(mode)
        .map(ModeSection::fault_codes)
        .unwrap_or_default()
}

/// Extract the declared status token from a file name.
///
/// The extension is removed first; `None` when the stem has fewer than
/// three underscore-separated tokens.
pub fn declared_status(file_name: &str) -> Option<DeclaredStatus> {
    let stem = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    let token = stem.split('_').nth(constants::STATUS_TOKEN_INDEX)?;
    Some(DeclaredStatus::from_token(&token.to_lowercase()))
}

/// Reconcile the status declared in `file_name` with the status inferred
/// from `sections`. `None` when the name does not follow the convention.
pub fn compare_status(
    file_name: &str,
    sections: &BTreeMap<String, ModeSection>,
) -> Option<StatusComparison> {
    let Some(declared) = declared_status(file_name) else {
        tracing::debug!(file = file_name, "File name has no status token; skipping status check");
        return None;
    };
    let inferred = infer_status(sections);
    let matches = declared.matches(inferred);

    if !matches {
        tracing::info!(
            file = file_name,
            declared = %declared,
            inferred = %inferred,
            "Status mismatch"
        );
    }

    Some(StatusComparison {
        declared,
        inferred,
        matches,
    })
}
