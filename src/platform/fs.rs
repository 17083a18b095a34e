// OBDSleuth - platform/fs.rs
//
// Filesystem access: non-recursive log file listing and log file reading.
//
// Listing errors on individual entries are non-fatal and skipped; only a
// missing or non-directory folder is an error. Reads retry transient I/O
// errors with capped backoff.

use crate::util::constants;
use crate::util::error::{DiscoveryError, ReadError};
use glob::{MatchOptions, Pattern};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// List the regular files directly inside `folder` whose name matches
/// `*.<extension>` (extension compared case-insensitively), sorted by name.
pub fn list_log_files(folder: &Path, extension: &str) -> Result<Vec<PathBuf>, DiscoveryError> {
    match std::fs::metadata(folder) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            return Err(DiscoveryError::NotADirectory {
                path: folder.to_path_buf(),
            })
        }
        Err(_) => {
            return Err(DiscoveryError::FolderNotFound {
                path: folder.to_path_buf(),
            })
        }
    }

    let Ok(pattern) = Pattern::new(&format!("*.{}", Pattern::escape(extension))) else {
        tracing::warn!(extension, "Unusable log file extension; nothing to list");
        return Ok(Vec::new());
    };
    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };

    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(e) => e,
            Err(e) if e.depth() == 0 => {
                return Err(DiscoveryError::Traversal {
                    path: folder.to_path_buf(),
                    source: e,
                })
            }
            Err(e) => {
                tracing::debug!(error = %e, "Skipping unreadable folder entry");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if pattern.matches_with(&name, options) {
            files.push(entry.into_path());
        }
    }

    tracing::debug!(
        folder = %folder.display(),
        files = files.len(),
        "Log files listed"
    );
    Ok(files)
}

/// Read a log file as UTF-8.
///
/// Files over `MAX_LOG_FILE_SIZE` are refused. Transient I/O errors
/// (WouldBlock, Interrupted, TimedOut) are retried with capped backoff;
/// permanent errors are returned immediately.
pub fn read_log_file(path: &Path) -> Result<String, ReadError> {
    let io_err = |e: io::Error| ReadError::Io {
        path: path.to_path_buf(),
        source: e,
    };

    let size = std::fs::metadata(path).map_err(io_err)?.len();
    if size > constants::MAX_LOG_FILE_SIZE {
        return Err(ReadError::FileTooLarge {
            path: path.to_path_buf(),
            size,
            max_size: constants::MAX_LOG_FILE_SIZE,
        });
    }

    let bytes = read_with_retry(path).map_err(io_err)?;
    String::from_utf8(bytes).map_err(|e| ReadError::InvalidEncoding {
        path: path.to_path_buf(),
        source: e,
    })
}

fn read_with_retry(path: &Path) -> io::Result<Vec<u8>> {
    retry_transient(path, || std::fs::read(path))
}

/// Run `op`, retrying transient errors up to `MAX_READ_RETRIES` times after
/// the first attempt. Sleeps only when another attempt follows.
fn retry_transient<T>(path: &Path, mut op: impl FnMut() -> io::Result<T>) -> io::Result<T> {
    let mut attempt: u32 = 0;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) if is_transient_error(&e) && attempt < constants::MAX_READ_RETRIES => {
                let delay = constants::READ_RETRY_DELAYS_MS[attempt as usize];
                attempt += 1;
                tracing::debug!(
                    file = %path.display(),
                    attempt,
                    delay_ms = delay,
                    error = %e,
                    "Transient I/O error, retrying"
                );
                std::thread::sleep(Duration::from_millis(delay));
            }
            Err(e) => return Err(e),
        }
    }
}

/// Returns true for transient I/O errors that are worth retrying.
fn is_transient_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted | io::ErrorKind::TimedOut
    )
}

/// File name component of `path` as a String (lossy).
pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// File stem of `path` as a String (lossy).
pub fn file_stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_list_filters_by_extension_case_insensitively() {
        let dir = TempDir::new().expect("tmpdir");
        fs::write(dir.path().join("b_1_pending.txt"), "x").unwrap();
        fs::write(dir.path().join("a_1_confirmed.TXT"), "x").unwrap();
        fs::write(dir.path().join("notes.log"), "x").unwrap();
        fs::create_dir(dir.path().join("sub.txt")).unwrap();
        fs::write(dir.path().join("sub.txt").join("nested.txt"), "x").unwrap();

        let files = list_log_files(dir.path(), "txt").unwrap();
        let names: Vec<String> = files.iter().map(|p| file_name_of(p)).collect();
        assert_eq!(names, vec!["a_1_confirmed.TXT", "b_1_pending.txt"]);
    }

    #[test]
    fn test_list_missing_folder() {
        let dir = TempDir::new().expect("tmpdir");
        let result = list_log_files(&dir.path().join("nope"), "txt");
        assert!(matches!(result, Err(DiscoveryError::FolderNotFound { .. })));
    }

    #[test]
    fn test_list_file_instead_of_folder() {
        let dir = TempDir::new().expect("tmpdir");
        let file = dir.path().join("a.txt");
        fs::write(&file, "x").unwrap();
        assert!(matches!(
            list_log_files(&file, "txt"),
            Err(DiscoveryError::NotADirectory { .. })
        ));
    }

    #[test]
    fn test_read_log_file_ok_and_invalid_utf8() {
        let dir = TempDir::new().expect("tmpdir");
        let good = dir.path().join("good.txt");
        let bad = dir.path().join("bad.txt");
        fs::write(&good, "Scan-Tool Mode 1 - x\n").unwrap();
        fs::write(&bad, [0xff, 0xfe, 0x00, 0x41]).unwrap();

        assert_eq!(read_log_file(&good).unwrap(), "Scan-Tool Mode 1 - x\n");
        assert!(matches!(
            read_log_file(&bad),
            Err(ReadError::InvalidEncoding { .. })
        ));
        assert!(matches!(
            read_log_file(&dir.path().join("missing.txt")),
            Err(ReadError::Io { .. })
        ));
    }

    #[test]
    fn test_transient_errors_retried_until_success() {
        let mut calls = 0;
        let result = retry_transient(Path::new("x.txt"), || {
            calls += 1;
            if calls < 3 {
                Err(io::Error::from(io::ErrorKind::Interrupted))
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn test_transient_errors_give_up_after_max_retries() {
        let mut calls = 0u32;
        let result: io::Result<()> = retry_transient(Path::new("x.txt"), || {
            calls += 1;
            Err(io::Error::from(io::ErrorKind::TimedOut))
        });
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::TimedOut);
        assert_eq!(calls, constants::MAX_READ_RETRIES + 1);
    }

    #[test]
    fn test_permanent_error_not_retried() {
        let mut calls = 0;
        let result: io::Result<()> = retry_transient(Path::new("x.txt"), || {
            calls += 1;
            Err(io::Error::from(io::ErrorKind::PermissionDenied))
        });
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::PermissionDenied);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_stem_and_name() {
        let p = Path::new("/logs/unit_007_confirmed.txt");
        assert_eq!(file_name_of(p), "unit_007_confirmed.txt");
        assert_eq!(file_stem_of(p), "unit_007_confirmed");
    }
}
