// OBDSleuth - core/parser.rs
//
// Mode segmentation and ECU/fault extraction for scan-tool exports.
// Core layer: accepts the file content as a string, never touches the
// filesystem.
//
// Input shape (fixed vendor export, not a grammar):
//
//   <preamble>
//   Scan-Tool Mode 3 - Request Emission-Related DTCs
//   <one line, not classified>
//   #1 7E8 ECM Engine Control Module       <- ECU line (7E8 in reference set)
//   P0101 Mass or Volume Air Flow          <- fault line
//   1 fault code entries                   <- summary, discarded
//   Scan-Tool Mode 7 - ...

use crate::core::model::{FaultLine, LineClass, ModeSection};
use crate::util::constants;
use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::OnceLock;

/// Output of `parse_modes`.
#[derive(Debug, Clone, Default)]
pub struct ParsedModes {
    /// Sections for recognised mode labels, keyed by label.
    pub sections: BTreeMap<String, ModeSection>,

    /// Distinct ECU count for every label found, recognised or not.
    pub ecu_counts: BTreeMap<String, usize>,
}

/// Matches the per-ECU summary row (`"2 fault code entries"`), which is not
/// itself a fault line.
fn summary_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+\s+fault code entries").expect("summary regex is valid"))
}

/// Classify one trimmed candidate line.
///
/// ECU test first: more than one token and the second token is a known ECU
/// identifier. Otherwise a fault line starts with a DTC letter (but is not a
/// `PID` row) or mentions "fault code entries", and is not a
/// `"<n> fault code entries"` summary.
pub fn classify_line(line: &str, ecu_identifiers: &HashSet<String>) -> LineClass {
    if let Some(second) = line.split_whitespace().nth(1) {
        if ecu_identifiers.contains(second) {
            return LineClass::Ecu;
        }
    }

    let looks_like_fault = (line.contains(constants::FAULT_ENTRIES_PHRASE)
        || line.starts_with(constants::FAULT_CODE_PREFIXES))
        && !line.starts_with(constants::PID_PREFIX);

    if looks_like_fault && !summary_line_regex().is_match(line) {
        LineClass::Fault
    } else {
        LineClass::Discarded
    }
}

/// Split `text` into mode chunks, dropping the preamble before the first
/// delimiter. Each item is `(label, candidate_lines)`.
fn mode_chunks(text: &str) -> impl Iterator<Item = (&str, Vec<&str>)> {
    text.split(constants::MODE_DELIMITER).skip(1).map(|chunk| {
        let mut lines = chunk.split('\n');
        let header = lines.next().unwrap_or("");
        let label = header.split('-').next().unwrap_or("").trim();
        let candidates = lines
            .skip(constants::MODE_HEADER_LINES - 1)
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        (label, candidates)
    })
}

/// Segment `text` into mode sections and count ECUs per mode.
///
/// Only labels in `RECOGNISED_MODES` produce a `ModeSection`; every label
/// gets an ECU count. A label appearing in several chunks is merged: its
/// lines are concatenated in document order and its ECU count is taken over
/// the union of all its chunks, not just the last one.
pub fn parse_modes(text: &str, ecu_identifiers: &HashSet<String>) -> ParsedModes {
    let mut sections: BTreeMap<String, ModeSection> = BTreeMap::new();
    let mut distinct_ecus: HashMap<&str, HashSet<&str>> = HashMap::new();

    for (label, candidates) in mode_chunks(text) {
        let seen = distinct_ecus.entry(label).or_default();
        let recognised = constants::RECOGNISED_MODES.contains(&label);

        if !recognised {
            tracing::trace!(mode = label, "Unrecognised mode label; counting ECUs only");
            for line in candidates {
                if classify_line(line, ecu_identifiers) == LineClass::Ecu {
                    seen.insert(line);
                }
            }
            continue;
        }

        let section = sections
            .entry(label.to_string())
            .or_insert_with(|| ModeSection {
                label: label.to_string(),
                ..ModeSection::default()
            });

        let mut current_ecu: Option<&str> = None;
        for line in candidates {
            match classify_line(line, ecu_identifiers) {
                LineClass::Ecu => {
                    current_ecu = Some(line);
                    seen.insert(line);
                    section.ecu_lines.push(line.to_string());
                }
                LineClass::Fault => section.fault_lines.push(FaultLine {
                    text: line.to_string(),
                    ecu: current_ecu.map(str::to_string),
                }),
                LineClass::Discarded => {}
            }
        }
    }

    let ecu_counts: BTreeMap<String, usize> = distinct_ecus
        .into_iter()
        .map(|(label, set)| (label.to_string(), set.len()))
        .collect();

    for section in sections.values_mut() {
        section.ecu_count = ecu_counts.get(&section.label).copied().unwrap_or(0);
    }

    tracing::debug!(
        sections = sections.len(),
        labels = ecu_counts.len(),
        "Mode parsing complete"
    );

    ParsedModes {
        sections,
        ecu_counts,
    }
}

/// Return the ignition cycle counter row from the spark-ignition in-use
/// performance block, if the block and the row are both present.
pub fn find_ignition_cycle_counter(text: &str) -> Option<String> {
    let start = text.find(constants::IGNITION_INFOTYPE_HEADER)?;
    text[start..]
        .split('\n')
        .find(|line| line.contains(constants::IGNITION_CYCLE_COUNTER_LABEL))
        .map(|line| line.trim().to_string())
}
