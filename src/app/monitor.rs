// OBDSleuth - app/monitor.rs
//
// Folder monitor: polls a folder on a background thread and analyses each
// log file that appears after monitoring started.
//
// Architecture:
//   - `FolderMonitor` lives on the caller's thread; `run_monitor` executes on
//     a background thread.
//   - An `Arc<AtomicBool>` cancel flag stops the thread. The poll interval is
//     slept in sub-intervals so cancel is observed within
//     MONITOR_CANCEL_CHECK_INTERVAL_MS; cancel is also checked before each
//     new file is dispatched.
//   - Results are sent as `MonitorEvent`s over an mpsc channel.
//   - `NewFileDetector` remembers file names, so a file is dispatched at most
//     once even if it is later rewritten.

use crate::app::analyze;
use crate::core::model::{MonitorEvent, ReferenceConfig};
use crate::platform::fs;
use crate::util::constants;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

/// Remembers which file names have already been seen in a folder.
#[derive(Debug, Default, Clone)]
pub struct NewFileDetector {
    seen: HashSet<String>,
}

impl NewFileDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark every file in `listing` as seen without reporting it.
    pub fn seed(&mut self, listing: &[PathBuf]) {
        self.seen.extend(listing.iter().map(|p| fs::file_name_of(p)));
    }

    /// Return the files in `listing` whose names have not been seen before,
    /// in listing order, and mark them as seen.
    pub fn detect_new(&mut self, listing: &[PathBuf]) -> Vec<PathBuf> {
        listing
            .iter()
            .filter(|p| self.seen.insert(fs::file_name_of(p)))
            .cloned()
            .collect()
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}

/// Settings for one monitoring session.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Log file extension, without the dot.
    pub extension: String,
    /// Delay between folder listings (ms).
    pub poll_interval_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            extension: constants::DEFAULT_LOG_EXTENSION.to_string(),
            poll_interval_ms: constants::MONITOR_POLL_INTERVAL_MS,
        }
    }
}

/// Handle to a background folder monitor.
pub struct FolderMonitor {
    /// Channel receiver for monitor events.
    pub progress_rx: Option<mpsc::Receiver<MonitorEvent>>,
    /// Cancel flag shared with the background thread.
    cancel_flag: Option<Arc<AtomicBool>>,
}

impl FolderMonitor {
    /// Create an inactive monitor. No thread is started until `start`.
    pub fn new() -> Self {
        Self {
            progress_rx: None,
            cancel_flag: None,
        }
    }

    /// Returns `true` while a monitor thread is running and not cancelled.
    pub fn is_active(&self) -> bool {
        self.cancel_flag
            .as_ref()
            .map(|f| !f.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    /// Start monitoring `folder`. Files present at start are not analysed.
    ///
    /// A monitor that is already running is stopped first.
    pub fn start(&mut self, folder: PathBuf, reference: Arc<ReferenceConfig>, config: MonitorConfig) {
        self.stop();

        let cancel = Arc::new(AtomicBool::new(false));
        self.cancel_flag = Some(Arc::clone(&cancel));

        let (tx, rx) = mpsc::channel();
        self.progress_rx = Some(rx);

        std::thread::spawn(move || {
            run_monitor(&folder, &reference, &config, &tx, &cancel);
        });

        tracing::debug!("Folder monitor started");
    }

    /// Signal the background thread to stop and drop the channel.
    pub fn stop(&mut self) {
        if let Some(flag) = self.cancel_flag.take() {
            flag.store(true, Ordering::Relaxed);
        }
        self.progress_rx = None;
    }

    /// Clone of the cancel flag, for stopping the monitor from another thread.
    pub fn cancel_handle(&self) -> Option<Arc<AtomicBool>> {
        self.cancel_flag.clone()
    }

    /// Block for up to `timeout` waiting for the next event.
    ///
    /// Returns `None` on timeout or once the monitor thread has exited.
    pub fn wait_event(&mut self, timeout: Duration) -> Option<MonitorEvent> {
        let rx = self.progress_rx.as_ref()?;
        match rx.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(mpsc::RecvTimeoutError::Timeout) => None,
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                self.progress_rx = None;
                self.cancel_flag = None;
                None
            }
        }
    }
}

impl Default for FolderMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for FolderMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Background thread body. Returns when cancelled or when the receiver is
/// dropped.
fn run_monitor(
    folder: &Path,
    reference: &ReferenceConfig,
    config: &MonitorConfig,
    tx: &mpsc::Sender<MonitorEvent>,
    cancel: &AtomicBool,
) {
    let cancel_check = Duration::from_millis(constants::MONITOR_CANCEL_CHECK_INTERVAL_MS);
    let sub_iters = (config.poll_interval_ms / constants::MONITOR_CANCEL_CHECK_INTERVAL_MS).max(1);

    let mut detector = NewFileDetector::new();
    match fs::list_log_files(folder, &config.extension) {
        Ok(listing) => detector.seed(&listing),
        Err(e) => {
            if tx.send(MonitorEvent::Warning { message: e.to_string() }).is_err() {
                return;
            }
        }
    }

    tracing::info!(
        folder = %folder.display(),
        known = detector.seen_count(),
        interval_ms = config.poll_interval_ms,
        "Monitoring folder"
    );
    if tx
        .send(MonitorEvent::Started {
            known: detector.seen_count(),
        })
        .is_err()
    {
        return;
    }

    loop {
        for _ in 0..sub_iters {
            if cancel.load(Ordering::Relaxed) {
                stopped(tx);
                return;
            }
            std::thread::sleep(cancel_check);
        }

        let listing = match fs::list_log_files(folder, &config.extension) {
            Ok(l) => l,
            Err(e) => {
                tracing::warn!(error = %e, "Folder listing failed; will retry");
                if tx.send(MonitorEvent::Warning { message: e.to_string() }).is_err() {
                    return;
                }
                continue;
            }
        };

        let new_files = detector.detect_new(&listing);
        match dispatch_new_files(new_files, reference, tx, || cancel.load(Ordering::Relaxed)) {
            Dispatch::Completed => {}
            Dispatch::Cancelled => {
                stopped(tx);
                return;
            }
            Dispatch::Disconnected => {
                tracing::debug!("Folder monitor: receiver dropped, exiting");
                return;
            }
        }
    }
}

/// How a batch of new files was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dispatch {
    Completed,
    Cancelled,
    Disconnected,
}

/// Analyse `paths` one at a time, sending one event per file.
/// `is_cancelled` is checked before each file.
fn dispatch_new_files<F: Fn() -> bool>(
    paths: Vec<PathBuf>,
    reference: &ReferenceConfig,
    tx: &mpsc::Sender<MonitorEvent>,
    is_cancelled: F,
) -> Dispatch {
    for path in paths {
        if is_cancelled() {
            return Dispatch::Cancelled;
        }
        tracing::info!(file = %path.display(), "New file detected");

        let event = match analyze::analyze_file_with(&path, reference) {
            Ok(result) => MonitorEvent::FileAnalyzed {
                path,
                result: Box::new(result),
            },
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "Could not analyse new file");
                MonitorEvent::FileFailed {
                    path,
                    reason: e.to_string(),
                }
            }
        };
        if tx.send(event).is_err() {
            return Dispatch::Disconnected;
        }
    }
    Dispatch::Completed
}

fn stopped(tx: &mpsc::Sender<MonitorEvent>) {
    tracing::info!("Folder monitor stopped");
    let _ = tx.send(MonitorEvent::Stopped);
}
