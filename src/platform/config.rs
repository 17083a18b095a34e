// OBDSleuth - platform/config.rs
//
// Platform directory resolution and config.toml loading with validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) locations.

use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Resolved platform paths for OBDSleuth configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory holding config.toml (e.g. ~/.config/obdsleuth/).
    pub config_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to the current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        match ProjectDirs::from("", "", constants::APP_ID) {
            Some(proj_dirs) => {
                let config_dir = proj_dirs.config_dir().to_path_buf();
                tracing::debug!(config = %config_dir.display(), "Platform paths resolved");
                Self { config_dir }
            }
            None => {
                tracing::warn!("Could not determine platform directories, using current directory");
                Self {
                    config_dir: PathBuf::from("."),
                }
            }
        }
    }
}

/// Raw deserialisable shape of config.toml. Unknown keys are ignored.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub scan: ScanSection,
    pub reference: ReferenceSection,
    pub report: ReportSection,
    pub logging: LoggingSection,
}

/// `[scan]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ScanSection {
    /// Log file extension, without the dot.
    pub extension: Option<String>,
    /// Folder monitor polling interval in milliseconds.
    pub poll_interval_ms: Option<u64>,
}

/// `[reference]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ReferenceSection {
    /// Path to the reference JSON file.
    pub path: Option<String>,
}

/// `[report]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ReportSection {
    /// "text" or "html".
    pub format: Option<String>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// "error", "warn", "info", "debug" or "trace".
    pub level: Option<String>,
}

/// Validated application configuration.
///
/// Invalid values are reported and replaced by their defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub extension: String,
    pub poll_interval_ms: u64,
    pub reference_path: Option<PathBuf>,
    /// Render reports as HTML rather than plain text.
    pub html_report: bool,
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            extension: constants::DEFAULT_LOG_EXTENSION.to_string(),
            poll_interval_ms: constants::MONITOR_POLL_INTERVAL_MS,
            reference_path: None,
            html_report: false,
            log_level: None,
        }
    }
}

/// Load and validate `config.toml` from `config_dir`.
///
/// A missing file yields defaults and no errors. An unreadable or
/// unparseable file yields defaults plus the error. Each invalid value is
/// reported and left at its default; the remaining values still apply.
pub fn load_config(config_dir: &Path) -> (AppConfig, Vec<ConfigError>) {
    let config_path = config_dir.join(constants::CONFIG_FILE_NAME);

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
        return (AppConfig::default(), Vec::new());
    }

    let content = match std::fs::read_to_string(&config_path) {
        Ok(c) => c,
        Err(e) => {
            return (
                AppConfig::default(),
                vec![ConfigError::Io {
                    path: config_path,
                    source: e,
                }],
            )
        }
    };

    let (config, errors) = parse_config(&content, &config_path);
    tracing::info!(
        path = %config_path.display(),
        problems = errors.len(),
        "Loaded config.toml"
    );
    (config, errors)
}

/// Validate config.toml content. `config_path` is used only in errors and
/// to resolve a relative reference path.
pub fn parse_config(content: &str, config_path: &Path) -> (AppConfig, Vec<ConfigError>) {
    let raw: RawConfig = match toml::from_str(content) {
        Ok(r) => r,
        Err(e) => {
            return (
                AppConfig::default(),
                vec![ConfigError::TomlParse {
                    path: config_path.to_path_buf(),
                    source: e,
                }],
            )
        }
    };

    let mut config = AppConfig::default();
    let mut errors = Vec::new();

    if let Some(ext) = raw.scan.extension {
        let ext = ext.trim().trim_start_matches('.');
        if !ext.is_empty() && !ext.contains(['/', '\\', '*', '?']) {
            config.extension = ext.to_string();
        } else {
            errors.push(ConfigError::ValueOutOfRange {
                field: "scan.extension".to_string(),
                value: ext.to_string(),
                expected: "a non-empty file extension such as \"txt\"".to_string(),
            });
        }
    }

    if let Some(interval) = raw.scan.poll_interval_ms {
        let range =
            constants::MIN_MONITOR_POLL_INTERVAL_MS..=constants::MAX_MONITOR_POLL_INTERVAL_MS;
        if range.contains(&interval) {
            config.poll_interval_ms = interval;
        } else {
            errors.push(ConfigError::ValueOutOfRange {
                field: "scan.poll_interval_ms".to_string(),
                value: interval.to_string(),
                expected: format!("{}-{}", range.start(), range.end()),
            });
        }
    }

    if let Some(path) = raw.reference.path.filter(|p| !p.trim().is_empty()) {
        let path = PathBuf::from(path);
        config.reference_path = Some(if path.is_relative() {
            config_path.parent().unwrap_or(Path::new(".")).join(path)
        } else {
            path
        });
    }

    if let Some(format) = raw.report.format {
        match format.to_lowercase().as_str() {
            "text" => config.html_report = false,
            "html" => config.html_report = true,
            _ => errors.push(ConfigError::ValueOutOfRange {
                field: "report.format".to_string(),
                value: format,
                expected: "\"text\" or \"html\"".to_string(),
            }),
        }
    }

    if let Some(level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.to_lowercase());
        } else {
            errors.push(ConfigError::ValueOutOfRange {
                field: "logging.level".to_string(),
                value: level,
                expected: valid.join(", "),
            });
        }
    }

    (config, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_yields_config_dir() {
        let paths = PlatformPaths::resolve();
        assert!(!paths.config_dir.as_os_str().is_empty());
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let dir = TempDir::new().expect("tmpdir");
        let (config, errors) = load_config(dir.path());
        assert_eq!(config, AppConfig::default());
        assert!(errors.is_empty());
    }

    #[test]
    fn test_valid_config_applies_all_sections() {
        let dir = TempDir::new().expect("tmpdir");
        std::fs::write(
            dir.path().join("config.toml"),
            r#"
[scan]
extension = ".log"
poll_interval_ms = 1500

[reference]
path = "refs/reference_list.json"

[report]
format = "HTML"

[logging]
level = "Debug"
"#,
        )
        .unwrap();

        let (config, errors) = load_config(dir.path());
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(config.extension, "log");
        assert_eq!(config.poll_interval_ms, 1500);
        assert_eq!(
            config.reference_path,
            Some(dir.path().join("refs/reference_list.json"))
        );
        assert!(config.html_report);
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_invalid_values_fall_back_individually() {
        let path = Path::new("config.toml");
        let (config, errors) = parse_config(
            "[scan]\npoll_interval_ms = 5\nextension = \"txt\"\n[report]\nformat = \"pdf\"\n",
            path,
        );
        assert_eq!(errors.len(), 2);
        assert_eq!(config.poll_interval_ms, constants::MONITOR_POLL_INTERVAL_MS);
        assert!(!config.html_report);
        assert_eq!(config.extension, "txt");
    }

    #[test]
    fn test_malformed_toml_reports_parse_error() {
        let (config, errors) = parse_config("[scan\nextension = ", Path::new("config.toml"));
        assert_eq!(config, AppConfig::default());
        assert!(matches!(errors.as_slice(), [ConfigError::TomlParse { .. }]));
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let (_, errors) = parse_config("[future]\nthing = 1\n", Path::new("config.toml"));
        assert!(errors.is_empty());
    }
}
