// OBDSleuth - main.rs
//
// Command-line entry point. Handles:
// 1. CLI argument parsing
// 2. config.toml loading and logging initialisation
// 3. Reference path resolution
// 4. Dispatch to single-file analysis, folder scan, or folder monitoring

use clap::{Parser, Subcommand, ValueEnum};
use obdsleuth::app::{analyze, monitor, reference_mgr};
use obdsleuth::core::export;
use obdsleuth::core::model::MonitorEvent;
use obdsleuth::core::report::{self, ReportFormat};
use obdsleuth::platform::config::{self, AppConfig, PlatformPaths};
use obdsleuth::util::constants;
use obdsleuth::util::error::{ExportError, ObdSleuthError};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

/// OBDSleuth - scan-tool log analyser.
///
/// Checks OBD scan-tool logs for ECU count consistency across modes, fault
/// keywords, declared-vs-inferred status, and missing confirmed/pending pairs.
#[derive(Parser, Debug)]
#[command(name = "obdsleuth", version, about)]
struct Cli {
    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug", global = true)]
    debug: bool,

    /// Reference document with ECU lists and fault keywords.
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,

    /// Report format (overrides config.toml).
    #[arg(short = 'f', long = "format", global = true)]
    format: Option<FormatArg>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyse a single log file.
    File { path: PathBuf },

    /// Analyse every log file in a folder.
    Scan {
        folder: PathBuf,

        /// Write one CSV row per file.
        #[arg(long = "export-csv")]
        export_csv: Option<PathBuf>,

        /// Write the full folder report as JSON.
        #[arg(long = "export-json")]
        export_json: Option<PathBuf>,
    },

    /// Analyse log files as they appear in a folder.
    Watch {
        folder: PathBuf,

        /// Polling interval in milliseconds.
        #[arg(
            long = "interval-ms",
            value_parser = clap::value_parser!(u64).range(
                constants::MIN_MONITOR_POLL_INTERVAL_MS..=constants::MAX_MONITOR_POLL_INTERVAL_MS
            )
        )]
        interval_ms: Option<u64>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Text,
    Html,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let platform_paths = PlatformPaths::resolve();
    let (app_config, config_errors) = config::load_config(&platform_paths.config_dir);

    obdsleuth::util::logging::init(cli.debug, app_config.log_level.as_deref());
    for err in &config_errors {
        tracing::warn!(error = %err, "Config problem; using default");
    }

    tracing::info!(
        version = constants::APP_VERSION,
        debug = cli.debug,
        "OBDSleuth starting"
    );

    let format = match cli.format {
        Some(FormatArg::Text) => ReportFormat::PlainText,
        Some(FormatArg::Html) => ReportFormat::Html,
        None if app_config.html_report => ReportFormat::Html,
        None => ReportFormat::PlainText,
    };
    let reference_path = resolve_reference_path(cli.config.as_deref(), &app_config);

    let result = match cli.command {
        Command::File { path } => run_file(&path, &reference_path, format),
        Command::Scan {
            folder,
            export_csv,
            export_json,
        } => run_scan(
            &folder,
            &reference_path,
            &app_config,
            format,
            export_csv.as_deref(),
            export_json.as_deref(),
        ),
        Command::Watch {
            folder,
            interval_ms,
        } => run_watch(folder, &reference_path, &app_config, format, interval_ms),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// CLI flag > `reference_list.json` in the working directory > config.toml.
fn resolve_reference_path(cli_path: Option<&Path>, app_config: &AppConfig) -> PathBuf {
    if let Some(path) = cli_path {
        return path.to_path_buf();
    }
    let local = PathBuf::from(constants::DEFAULT_REFERENCE_FILE_NAME);
    if local.is_file() {
        return local;
    }
    app_config.reference_path.clone().unwrap_or(local)
}

fn run_file(path: &Path, reference_path: &Path, format: ReportFormat) -> Result<(), ObdSleuthError> {
    let result = analyze::analyze_file(path, reference_path)?;
    let file_name = obdsleuth::platform::fs::file_name_of(path);
    print!("{}", report::render_file_report(&file_name, &result, format));
    Ok(())
}

fn run_scan(
    folder: &Path,
    reference_path: &Path,
    app_config: &AppConfig,
    format: ReportFormat,
    export_csv: Option<&Path>,
    export_json: Option<&Path>,
) -> Result<(), ObdSleuthError> {
    let (reference, _) = reference_mgr::load_reference(reference_path);
    let cancel = AtomicBool::new(false);
    let folder_report =
        analyze::analyze_folder_with(folder, &reference, &app_config.extension, &cancel)?;

    print!("{}", report::render_folder_report(&folder_report, format));

    if let Some(path) = export_csv {
        let rows = export::export_csv(&folder_report, create_export_file(path)?, path)?;
        tracing::info!(path = %path.display(), rows, "CSV export written");
    }
    if let Some(path) = export_json {
        let files = export::export_json(&folder_report, create_export_file(path)?, path)?;
        tracing::info!(path = %path.display(), files, "JSON export written");
    }
    Ok(())
}

fn create_export_file(path: &Path) -> Result<BufWriter<std::fs::File>, ExportError> {
    std::fs::File::create(path)
        .map(BufWriter::new)
        .map_err(|e| ExportError::Io {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Runs until the process is interrupted.
fn run_watch(
    folder: PathBuf,
    reference_path: &Path,
    app_config: &AppConfig,
    format: ReportFormat,
    interval_ms: Option<u64>,
) -> Result<(), ObdSleuthError> {
    let (reference, _) = reference_mgr::load_reference(reference_path);
    let config = monitor::MonitorConfig {
        extension: app_config.extension.clone(),
        poll_interval_ms: interval_ms.unwrap_or(app_config.poll_interval_ms),
    };

    println!("Monitoring folder: {}", folder.display());
    let mut folder_monitor = monitor::FolderMonitor::new();
    folder_monitor.start(folder, Arc::new(reference), config);

    loop {
        let Some(event) = folder_monitor.wait_event(Duration::from_secs(1)) else {
            if folder_monitor.progress_rx.is_none() {
                return Ok(());
            }
            continue;
        };
        match event {
            MonitorEvent::Started { known } => {
                println!("{known} existing file(s) skipped. Waiting for new files...");
            }
            MonitorEvent::FileAnalyzed { path, result } => {
                let name = obdsleuth::platform::fs::file_name_of(&path);
                print!("{}", report::render_file_report(&name, &result, format));
            }
            MonitorEvent::FileFailed { path, reason } => {
                println!("Could not analyse {}: {reason}", path.display());
            }
            MonitorEvent::Warning { message } => println!("Warning: {message}"),
            MonitorEvent::Stopped => return Ok(()),
        }
    }
}
