// OBDSleuth - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// Every error here is recoverable: the engine folds them into results and
// reports instead of aborting a run. Only main() maps one to an exit code.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all OBDSleuth operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum ObdSleuthError {
    /// Reference/keyword document loading failed.
    Reference(ReferenceError),

    /// Listing the log folder failed.
    Discovery(DiscoveryError),

    /// Reading a log file failed.
    Read(ReadError),

    /// Export operation failed.
    Export(ExportError),

    /// Application configuration loading or validation failed.
    Config(ConfigError),
}

impl fmt::Display for ObdSleuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reference(e) => write!(f, "Reference error: {e}"),
            Self::Discovery(e) => write!(f, "Discovery error: {e}"),
            Self::Read(e) => write!(f, "Read error: {e}"),
            Self::Export(e) => write!(f, "Export error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
        }
    }
}

impl std::error::Error for ObdSleuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Reference(e) => Some(e),
            Self::Discovery(e) => Some(e),
            Self::Read(e) => Some(e),
            Self::Export(e) => Some(e),
            Self::Config(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Reference errors
// ---------------------------------------------------------------------------

/// Errors raised while loading the reference/keyword document.
///
/// None of these stop a run: the loader falls back to empty keyword lists
/// and/or an empty ECU set and carries on.
#[derive(Debug)]
pub enum ReferenceError {
    /// The document could not be read (missing file, permissions).
    Io { path: PathBuf, source: io::Error },

    /// The document exceeds the maximum allowed size.
    FileTooLarge {
        path: PathBuf,
        size: u64,
        max_size: u64,
    },

    /// The document is not valid JSON.
    JsonParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The top-level JSON value is not an object.
    NotAnObject { path: PathBuf },

    /// The required keyword list is absent.
    MissingKey { path: PathBuf, key: &'static str },

    /// A keyword list or ECU list entry has the wrong shape.
    InvalidEntry {
        path: PathBuf,
        key: String,
        reason: String,
    },
}

impl fmt::Display for ReferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } if source.kind() == io::ErrorKind::NotFound => {
                write!(f, "Reference file '{}' was not found", path.display())
            }
            Self::Io { path, source } => {
                write!(f, "Cannot read reference file '{}': {source}", path.display())
            }
            Self::FileTooLarge {
                path,
                size,
                max_size,
            } => write!(
                f,
                "Reference file '{}' is {size} bytes, exceeds maximum of {max_size} bytes",
                path.display()
            ),
            Self::JsonParse { path, source } => write!(
                f,
                "Reference file '{}' is not valid JSON: {source}",
                path.display()
            ),
            Self::NotAnObject { path } => write!(
                f,
                "Reference file '{}' must contain a JSON object at the top level",
                path.display()
            ),
            Self::MissingKey { path, key } => write!(
                f,
                "Reference file '{}': the key '{key}' is missing",
                path.display()
            ),
            Self::InvalidEntry { path, key, reason } => write!(
                f,
                "Reference file '{}': entry '{key}' {reason}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for ReferenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::JsonParse { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ReferenceError> for ObdSleuthError {
    fn from(e: ReferenceError) -> Self {
        Self::Reference(e)
    }
}

// ---------------------------------------------------------------------------
// Discovery errors
// ---------------------------------------------------------------------------

/// Errors related to listing the log folder.
#[derive(Debug)]
pub enum DiscoveryError {
    /// The folder does not exist or is not accessible.
    FolderNotFound { path: PathBuf },

    /// The path exists but is not a directory.
    NotADirectory { path: PathBuf },

    /// Walkdir failed to read the folder itself.
    Traversal {
        path: PathBuf,
        source: walkdir::Error,
    },
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FolderNotFound { path } => {
                write!(f, "Folder '{}' does not exist", path.display())
            }
            Self::NotADirectory { path } => {
                write!(f, "'{}' is not a directory", path.display())
            }
            Self::Traversal { path, source } => {
                write!(f, "Error listing '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for DiscoveryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Traversal { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<DiscoveryError> for ObdSleuthError {
    fn from(e: DiscoveryError) -> Self {
        Self::Discovery(e)
    }
}

// ---------------------------------------------------------------------------
// Read errors
// ---------------------------------------------------------------------------

/// Errors raised while reading a single log file. The affected file is
/// skipped and noted in the report; the rest of the folder is processed.
#[derive(Debug)]
pub enum ReadError {
    /// I/O error (missing file, permission denied, ...).
    Io { path: PathBuf, source: io::Error },

    /// File content is not valid UTF-8.
    InvalidEncoding {
        path: PathBuf,
        source: std::string::FromUtf8Error,
    },

    /// File exceeds the maximum log size.
    FileTooLarge {
        path: PathBuf,
        size: u64,
        max_size: u64,
    },
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "'{}': I/O error: {source}", path.display())
            }
            Self::InvalidEncoding { path, source } => {
                write!(f, "'{}': invalid UTF-8 encoding: {source}", path.display())
            }
            Self::FileTooLarge {
                path,
                size,
                max_size,
            } => write!(
                f,
                "'{}' is {size} bytes, exceeds maximum of {max_size} bytes",
                path.display()
            ),
        }
    }
}

impl std::error::Error for ReadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::InvalidEncoding { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ReadError> for ObdSleuthError {
    fn from(e: ReadError) -> Self {
        Self::Read(e)
    }
}

// ---------------------------------------------------------------------------
// Export errors
// ---------------------------------------------------------------------------

/// Errors related to export operations.
#[derive(Debug)]
pub enum ExportError {
    /// I/O error writing the export file.
    Io { path: PathBuf, source: io::Error },

    /// CSV serialisation error.
    Csv { path: PathBuf, source: csv::Error },

    /// JSON serialisation error.
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "Export I/O error '{}': {source}", path.display())
            }
            Self::Csv { path, source } => {
                write!(f, "CSV export error '{}': {source}", path.display())
            }
            Self::Json { path, source } => {
                write!(f, "JSON export error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
        }
    }
}

impl From<ExportError> for ObdSleuthError {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to `config.toml` loading. All are reported as warnings;
/// the affected value falls back to its default.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A config value is out of the allowed range.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for ObdSleuthError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Convenience type alias for OBDSleuth results.
pub type Result<T> = std::result::Result<T, ObdSleuthError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_missing_reference_file_message() {
        let e = ReferenceError::Io {
            path: PathBuf::from("reference_list.json"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(
            e.to_string(),
            "Reference file 'reference_list.json' was not found"
        );
    }

    #[test]
    fn test_top_level_error_preserves_source_chain() {
        let inner = ReadError::Io {
            path: PathBuf::from("unit_001_confirmed.txt"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        let outer: ObdSleuthError = inner.into();
        assert!(outer.to_string().starts_with("Read error:"));
        let read = outer.source().expect("read error source");
        assert!(read.source().is_some(), "io::Error must stay in the chain");
    }
}
