// OBDSleuth - util/constants.rs
//
// Single source of truth for named constants, limits, and defaults.
// Log-format literals live here too so the parser, scanner and report
// builder agree on them.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "OBDSleuth";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "OBDSleuth";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Scan-tool log format
// =============================================================================

/// Literal that precedes every mode header in a scan-tool export.
pub const MODE_DELIMITER: &str = "Scan-Tool Mode";

/// Mode labels that carry ECU and fault data, in canonical order.
/// The first entry is the reference mode for the cross-mode count check.
pub const RECOGNISED_MODES: &[&str] = &["1", "2", "3", "6", "7", "9", "A"];

/// Mode holding confirmed fault codes.
pub const CONFIRMED_FAULT_MODE: &str = "3";

/// Mode holding pending fault codes.
pub const PENDING_FAULT_MODE: &str = "7";

/// Modes whose fault/ECU detail is listed in the per-file report.
pub const DETAIL_MODES: &[&str] = &[CONFIRMED_FAULT_MODE, PENDING_FAULT_MODE];

/// Number of lines at the top of each mode chunk that are never classified
/// (the header remainder and the line following it).
pub const MODE_HEADER_LINES: usize = 2;

/// Leading characters that mark a diagnostic trouble code line.
pub const FAULT_CODE_PREFIXES: &[char] = &['P', 'U', 'C', 'B'];

/// Line prefix that looks like a powertrain code but is a parameter ID row.
pub const PID_PREFIX: &str = "PID";

/// Phrase that marks a fault-code status line.
pub const FAULT_ENTRIES_PHRASE: &str = "fault code entries";

/// Warning emitted when ECU counts differ between recognised modes.
pub const ECU_COUNT_MISMATCH_WARNING: &str = "ECU counts are not the same in all modes.";

/// Header of the in-use performance tracking block that holds the
/// ignition cycle counter.
pub const IGNITION_INFOTYPE_HEADER: &str =
    "INFOTYPE 08\tIn-use Performance Tracking for Spark Ignition Engines";

/// Label of the ignition cycle counter row.
pub const IGNITION_CYCLE_COUNTER_LABEL: &str = "Ignition Cycle Counter";

/// Index of the status token in an underscore-delimited file stem.
pub const STATUS_TOKEN_INDEX: usize = 2;

// =============================================================================
// Reference document
// =============================================================================

/// Reference-document key holding the failure keyword list.
pub const KEYWORDS_KEY: &str = "keywords";

/// Reference-document key holding the ignore keyword list.
pub const IGNORE_KEYWORDS_KEY: &str = "ignore_keywords";

/// Default reference document name, looked up in the working directory.
pub const DEFAULT_REFERENCE_FILE_NAME: &str = "reference_list.json";

/// Maximum size of the reference document in bytes.
pub const MAX_REFERENCE_FILE_SIZE: u64 = 4 * 1024 * 1024; // 4 MB

// =============================================================================
// Discovery and reading
// =============================================================================

/// Extension (without dot) of scan-tool log files.
pub const DEFAULT_LOG_EXTENSION: &str = "txt";

/// Maximum size of a single log file in bytes. Larger files are reported
/// as unreadable rather than loaded.
pub const MAX_LOG_FILE_SIZE: u64 = 64 * 1024 * 1024; // 64 MB

/// Retries for a transient I/O error, after the first attempt.
pub const MAX_READ_RETRIES: u32 = 3;

/// Backoff between read retries (ms), indexed by attempt.
pub const READ_RETRY_DELAYS_MS: [u64; 3] = [50, 100, 200];

// =============================================================================
// Folder monitor
// =============================================================================

/// How often the folder monitor lists the directory for new files (ms).
pub const MONITOR_POLL_INTERVAL_MS: u64 = 3_000;

/// How often the cancel flag is checked within each monitor poll sleep (ms).
pub const MONITOR_CANCEL_CHECK_INTERVAL_MS: u64 = 100;

/// Minimum user-configurable monitor poll interval (ms).
pub const MIN_MONITOR_POLL_INTERVAL_MS: u64 = 500;

/// Maximum user-configurable monitor poll interval (ms).
pub const MAX_MONITOR_POLL_INTERVAL_MS: u64 = 60_000;

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Maximum length of a log line included in debug output.
pub const DEBUG_MAX_LINE_PREVIEW: usize = 200;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";
