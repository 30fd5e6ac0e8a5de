// crates/profile-updater-cli/src/main.rs
// ============================================================================
// Module: Profile Updater CLI Entry Point
// Description: Command dispatcher for bulk security profile updates.
// Purpose: Wire config, the CSV source, the Connect backend, and the batch
//          engine into a single run with automation-friendly exit codes.
// Dependencies: clap, profile-updater-{cli,config,connect,core}, thiserror, time
// ============================================================================

//! ## Overview
//! `profile-updater run` reads `(username, security profile)` rows, resolves
//! each username against an Amazon Connect instance, and assigns the profile.
//! Every record is reported; a record failure never stops the run. Exit
//! codes: `0` all records updated, `1` at least one record failed, `2` the
//! run could not start or was aborted by a fatal condition.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use profile_updater_cli::failures::write_failed_file;
use profile_updater_cli::report::ConsoleEventSink;
use profile_updater_cli::report::JsonLinesEventSink;
use profile_updater_cli::report::RunStartedEvent;
use profile_updater_cli::report::TeeEventSink;
use profile_updater_cli::report::log_file_name;
use profile_updater_cli::report::render_summary;
use profile_updater_cli::source::read_records;
use profile_updater_config::ConfigOverrides;
use profile_updater_config::ProfileUpdaterConfig;
use profile_updater_connect::ConnectClientConfig;
use profile_updater_connect::ConnectDirectoryClient;
use profile_updater_core::BatchEventSink;
use profile_updater_core::BatchOptions;
use profile_updater_core::BatchReport;
use profile_updater_core::BatchRunner;
use profile_updater_core::InputRecord;
use profile_updater_core::RateLimitedCaller;
use profile_updater_core::SystemClock;
use profile_updater_core::UpdateOutcome;
use thiserror::Error;
use time::OffsetDateTime;

// ============================================================================
// SECTION: Exit Codes
// ============================================================================

/// Exit code when every record was updated.
const EXIT_SUCCESS: u8 = 0;
/// Exit code when at least one record failed.
const EXIT_RECORD_FAILURES: u8 = 1;
/// Exit code for startup errors and fatal aborts.
const EXIT_FATAL: u8 = 2;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "profile-updater", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Assign security profiles to every user listed in a CSV file.
    Run(RunCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Arguments for the `run` command.
#[derive(Args, Debug)]
struct RunCommand {
    /// Amazon Connect instance id (overrides `remote.instance_id`).
    #[arg(long, value_name = "ID")]
    instance_id: Option<String>,
    /// CSV file of `username,security_profile_id` rows.
    #[arg(long, value_name = "PATH")]
    csv_file: PathBuf,
    /// Optional config file path (defaults to profile-updater.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Number of workers (overrides `batch.concurrency`).
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,
    /// Directory for the run log (overrides `log.directory`).
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,
    /// Write failed and unprocessed records to this CSV file.
    #[arg(long, value_name = "PATH")]
    failed_out: Option<PathBuf>,
    /// Suppress per-record console output.
    #[arg(long, action = ArgAction::SetTrue)]
    quiet: bool,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a Profile Updater configuration file.
    Validate(ConfigValidateCommand),
}

/// Arguments for config validation.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Optional config file path (defaults to profile-updater.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&format!("profile-updater {version}"))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Run(command) => command_run(&command),
        Commands::Config {
            command,
        } => command_config(command),
    }
}

/// Emits the top-level help message for the CLI.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

// ============================================================================
// SECTION: Run Command
// ============================================================================

/// Executes a full batch run.
fn command_run(command: &RunCommand) -> CliResult<ExitCode> {
    let config = load_run_config(command)?;
    let scope = config.scope().map_err(|err| CliError::new(format!("config invalid: {err}")))?;

    let started_at = OffsetDateTime::now_utc();
    let log_path = run_log_path(&config.log.directory, started_at)?;
    let log = JsonLinesEventSink::new(&log_path)
        .map_err(|err| CliError::new(format!("log file {}: {err}", log_path.display())))?;
    let run_started =
        RunStartedEvent::new(started_at, scope.as_str(), &command.csv_file, &log_path);
    log.record_run_started(&run_started);
    write_banner(&run_started.banner_lines())?;

    let records = read_records(&command.csv_file).map_err(|err| CliError::new(err.to_string()))?;
    if records.is_empty() {
        write_stderr_line("WARNING: CSV file contains no records")
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }

    let events = build_event_sink(log, config.log.console);
    let client = ConnectDirectoryClient::new(&ConnectClientConfig {
        region: config.remote.region.clone(),
        endpoint_url: config.remote.endpoint_url.clone(),
        timeout: config.remote.timeout(),
        page_size: config.remote.page_size,
    })
    .map_err(|err| CliError::new(err.to_string()))?;
    let caller = Arc::new(RateLimitedCaller::new(
        config.pacing_policy(),
        Arc::new(SystemClock::new()),
        Arc::clone(&events),
    ));
    let runner = BatchRunner::new(
        Arc::new(client),
        caller,
        events,
        BatchOptions {
            scope,
            concurrency: config.batch.concurrency,
        },
    );

    match runner.run(records) {
        Ok(run) => {
            write_summary(&run.report)?;
            export_failures(command.failed_out.as_deref(), &run.outcomes, &[])?;
            Ok(ExitCode::from(exit_status_for(&run.report)))
        }
        Err(aborted) => {
            write_summary(&aborted.report)?;
            export_failures(command.failed_out.as_deref(), &aborted.outcomes, &aborted.unprocessed)?;
            write_stderr_line(&format!(
                "ERROR: {aborted}; {} record(s) were not processed",
                aborted.unprocessed.len()
            ))
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
            Ok(ExitCode::from(EXIT_FATAL))
        }
    }
}

/// Loads the config file and applies `run` flag overrides.
fn load_run_config(command: &RunCommand) -> CliResult<ProfileUpdaterConfig> {
    let mut config = ProfileUpdaterConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("config load failed: {err}")))?;
    config
        .apply_overrides(&run_overrides(command))
        .map_err(|err| CliError::new(format!("config invalid: {err}")))?;
    Ok(config)
}

/// Collects the config overrides carried by `run` flags.
fn run_overrides(command: &RunCommand) -> ConfigOverrides {
    ConfigOverrides {
        instance_id: command.instance_id.clone(),
        concurrency: command.concurrency,
        log_directory: command.log_dir.clone(),
        quiet: command.quiet,
    }
}

/// Creates the log directory and returns this run's log file path.
fn run_log_path(directory: &Path, started_at: OffsetDateTime) -> CliResult<PathBuf> {
    fs::create_dir_all(directory).map_err(|err| {
        CliError::new(format!("log directory {}: {err}", directory.display()))
    })?;
    let name = log_file_name(started_at)
        .map_err(|err| CliError::new(format!("log file name: {err}")))?;
    Ok(directory.join(name))
}

/// Wraps the run log sink, teed to the console unless quiet.
fn build_event_sink(log: JsonLinesEventSink, console: bool) -> Arc<dyn BatchEventSink> {
    if !console {
        return Arc::new(log);
    }
    let sinks: Vec<Arc<dyn BatchEventSink>> =
        vec![Arc::new(log), Arc::new(ConsoleEventSink::stderr())];
    Arc::new(TeeEventSink::new(sinks))
}

/// Writes the failed subset when `--failed-out` was given.
fn export_failures(
    path: Option<&Path>,
    outcomes: &[UpdateOutcome],
    unprocessed: &[InputRecord],
) -> CliResult<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let written = write_failed_file(path, outcomes, unprocessed)
        .map_err(|err| CliError::new(format!("failed-out {}: {err}", path.display())))?;
    write_stdout_line(&format!("Wrote {written} record(s) to {}", path.display()))
        .map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Maps a finished run onto the process exit status.
const fn exit_status_for(report: &BatchReport) -> u8 {
    if report.is_clean() { EXIT_SUCCESS } else { EXIT_RECORD_FAILURES }
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(&command),
    }
}

/// Executes the config validation command.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let _config = ProfileUpdaterConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("config load failed: {err}")))?;
    write_stdout_line("Config valid.").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes banner lines to stdout.
fn write_banner(lines: &[String]) -> CliResult<()> {
    for line in lines {
        write_stdout_line(line).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }
    Ok(())
}

/// Writes the run summary to stdout.
fn write_summary(report: &BatchReport) -> CliResult<()> {
    write_stdout_line(&render_summary(report))
        .map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns the fatal exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::from(EXIT_FATAL)
}
