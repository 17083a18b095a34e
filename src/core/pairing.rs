// OBDSleuth - core/pairing.rs
//
// Confirmed/pending file pairing: groups file stems by a normalised base
// name to find duplicates and files whose counterpart is missing.
// Core layer: operates on stems, never lists directories itself.

use crate::core::model::{FilePairGroup, FilePairReport};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

/// Matches a status token with an optional leading underscore. Applied to
/// the lowercased stem, so `confirmed`, `confirm` and `confirmation` all match.
fn status_token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"_?(pending|confirm)[a-z]*").expect("status regex is valid"))
}

/// Normalise a file stem to its pairing key.
///
/// Lowercases, removes every status token, then trims trailing `_` and `&`.
/// Idempotent: normalising a key returns it unchanged.
pub fn normalize_stem(stem: &str) -> String {
    let lower = stem.to_lowercase();
    let stripped = status_token_regex().replace_all(&lower, "");
    stripped.trim_end_matches(['_', '&']).to_string()
}

/// Group `stems` by normalised key and detect duplicates and missing pairs.
///
/// - A stem seen again (exact, case-sensitive) is recorded as a duplicate on
///   each repeat occurrence. Repeats are not added to the group again.
/// - A key with exactly one distinct stem is missing its pair.
///
/// Groups and the missing list keep first-seen order.
pub fn group_file_pairs<S: AsRef<str>>(stems: &[S]) -> FilePairReport {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut duplicates = Vec::new();
    let mut groups: Vec<FilePairGroup> = Vec::new();
    let mut index_by_key: HashMap<String, usize> = HashMap::new();

    for stem in stems.iter().map(AsRef::as_ref) {
        if !seen.insert(stem) {
            tracing::debug!(stem, "Duplicate file stem");
            duplicates.push(stem.to_string());
            continue;
        }

        let key = normalize_stem(stem);
        match index_by_key.get(&key) {
            Some(&idx) => groups[idx].stems.push(stem.to_string()),
            None => {
                index_by_key.insert(key.clone(), groups.len());
                groups.push(FilePairGroup {
                    key,
                    stems: vec![stem.to_string()],
                });
            }
        }
    }

    let missing: Vec<String> = groups
        .iter()
        .filter(|g| g.stems.len() == 1)
        .map(|g| g.stems[0].clone())
        .collect();

    tracing::debug!(
        stems = stems.len(),
        groups = groups.len(),
        duplicates = duplicates.len(),
        missing = missing.len(),
        "File pairing complete"
    );

    FilePairReport {
        groups,
        duplicates,
        missing,
    }
}
