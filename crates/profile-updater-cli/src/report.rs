// crates/profile-updater-cli/src/report.rs
// ============================================================================
// Module: Run Reporting
// Description: Event sinks for the run log and console, plus the summary view.
// Purpose: Render batch events as JSON lines and human-readable progress.
// Dependencies: profile-updater-core, serde, serde_json, time
// ============================================================================

//! ## Overview
//! Every run writes one JSON object per event to a timestamped log file.
//! Console output is a separate, human-oriented sink; both are combined with
//! [`TeeEventSink`]. Sinks never fail the batch: write errors are dropped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io;
use std::io::Stderr;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use profile_updater_core::AbortEvent;
use profile_updater_core::BatchEventSink;
use profile_updater_core::BatchReport;
use profile_updater_core::BatchStartEvent;
use profile_updater_core::EventLevel;
use profile_updater_core::OutcomeEvent;
use profile_updater_core::RetryEvent;
use profile_updater_core::SummaryEvent;
use profile_updater_core::UpdateOutcome;
use serde::Serialize;
use time::OffsetDateTime;
use time::macros::format_description;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Divider line used by the banner and summary.
pub const RULE: &str = "============================================================";
/// Log file name prefix.
const LOG_FILE_PREFIX: &str = "profile-update-";

// ============================================================================
// SECTION: Log File
// ============================================================================

/// Returns the run log file name for a start time, e.g.
/// `profile-update-20260131_142501.log`.
///
/// # Errors
///
/// Returns a formatting error when the timestamp cannot be rendered.
pub fn log_file_name(started_at: OffsetDateTime) -> Result<String, time::error::Format> {
    let stamp = started_at.format(format_description!("[year][month][day]_[hour][minute][second]"))?;
    Ok(format!("{LOG_FILE_PREFIX}{stamp}.log"))
}

/// Run identification written as the first entry of every run log.
#[derive(Debug, Clone, Serialize)]
pub struct RunStartedEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Event severity.
    pub level: EventLevel,
    /// Connect instance the run targets.
    pub instance_id: String,
    /// Record source path.
    pub csv_file: PathBuf,
    /// Run log path.
    pub log_file: PathBuf,
}

impl RunStartedEvent {
    /// Creates a run-start event stamped with `started_at`.
    #[must_use]
    pub fn new(
        started_at: OffsetDateTime,
        instance_id: impl Into<String>,
        csv_file: &Path,
        log_file: &Path,
    ) -> Self {
        let millis = started_at.unix_timestamp_nanos() / 1_000_000;
        Self {
            event: "run_started",
            timestamp_ms: u128::try_from(millis).unwrap_or_default(),
            level: EventLevel::Info,
            instance_id: instance_id.into(),
            csv_file: csv_file.to_path_buf(),
            log_file: log_file.to_path_buf(),
        }
    }

    /// Console banner announcing the run.
    #[must_use]
    pub fn banner_lines(&self) -> Vec<String> {
        vec![
            RULE.to_string(),
            "Amazon Connect Security Profile Updater Started".to_string(),
            RULE.to_string(),
            format!("Instance ID: {}", self.instance_id),
            format!("CSV File: {}", self.csv_file.display()),
            format!("Log File: {}", self.log_file.display()),
        ]
    }
}

/// Appends one JSON object per event to a file.
pub struct JsonLinesEventSink {
    /// File handle guarded for concurrent workers.
    file: Mutex<std::fs::File>,
}

impl JsonLinesEventSink {
    /// Opens a log sink that appends to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Appends the run identification entry.
    pub fn record_run_started(&self, event: &RunStartedEvent) {
        self.append(event);
    }

    /// Serializes and appends a single event.
    fn append<T: Serialize>(&self, event: &T) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

impl BatchEventSink for JsonLinesEventSink {
    fn record_outcome(&self, event: &OutcomeEvent) {
        self.append(event);
    }

    fn record_start(&self, event: &BatchStartEvent) {
        self.append(event);
    }

    fn record_retry(&self, event: &RetryEvent) {
        self.append(event);
    }

    fn record_abort(&self, event: &AbortEvent) {
        self.append(event);
    }

    fn record_summary(&self, event: &SummaryEvent) {
        self.append(event);
    }
}

// ============================================================================
// SECTION: Console
// ============================================================================

/// Writes progress lines (`SUCCESS: ...`, `FAILED: ...`) to a stream.
///
/// The summary is not rendered here; the command prints it once the run
/// has finished.
pub struct ConsoleEventSink<W> {
    /// Output stream.
    out: Mutex<W>,
}

impl ConsoleEventSink<Stderr> {
    /// Console sink writing to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write + Send> ConsoleEventSink<W> {
    /// Console sink writing to `out`.
    #[must_use]
    pub const fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Returns the underlying stream.
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Writes one line.
    fn line(&self, message: &str) {
        if let Ok(mut out) = self.out.lock() {
            let _ = writeln!(out, "{message}");
        }
    }
}

impl<W: Write + Send> BatchEventSink for ConsoleEventSink<W> {
    fn record_outcome(&self, event: &OutcomeEvent) {
        self.line(&outcome_line(&event.outcome));
    }

    fn record_start(&self, event: &BatchStartEvent) {
        self.line(&format!(
            "{}: Processing {} records against instance {} ({} worker(s))",
            event.level.label(),
            event.total_records,
            event.scope_id,
            event.concurrency
        ));
    }

    fn record_retry(&self, event: &RetryEvent) {
        let line = event.line_number.map(|line| format!(" (line {line})")).unwrap_or_default();
        self.line(&format!(
            "{}: {} attempt {} failed ({}){line}; retrying in {} ms",
            event.level.label(),
            event.operation,
            event.attempt,
            event.error_kind,
            event.delay_ms
        ));
    }

    fn record_abort(&self, event: &AbortEvent) {
        self.line(&format!(
            "{}: Aborted at line {} ({}); {} record(s) left unprocessed",
            event.level.label(),
            event.record.line_number,
            event.cause,
            event.unprocessed
        ));
    }
}

/// Renders the console line for a final outcome.
#[must_use]
pub fn outcome_line(outcome: &UpdateOutcome) -> String {
    let record = &outcome.record;
    let user = outcome
        .internal_id
        .as_ref()
        .map_or_else(|| record.identity.clone(), |id| format!("{} (ID: {id})", record.identity));
    if outcome.is_success() {
        format!("SUCCESS: Updated user {user} with security profile {}", record.target_attribute_id)
    } else {
        format!(
            "FAILED: User {user}, Security Profile {} (line {}) - {}: {}",
            record.target_attribute_id,
            record.line_number,
            outcome.status,
            outcome.error_detail.as_deref().unwrap_or("no detail")
        )
    }
}

// ============================================================================
// SECTION: Fan-Out
// ============================================================================

/// Forwards every event to each inner sink in order.
#[derive(Default)]
pub struct TeeEventSink {
    /// Receiving sinks.
    sinks: Vec<Arc<dyn BatchEventSink>>,
}

impl TeeEventSink {
    /// Creates a tee over `sinks`.
    #[must_use]
    pub fn new(sinks: Vec<Arc<dyn BatchEventSink>>) -> Self {
        Self {
            sinks,
        }
    }
}

impl BatchEventSink for TeeEventSink {
    fn record_outcome(&self, event: &OutcomeEvent) {
        self.sinks.iter().for_each(|sink| sink.record_outcome(event));
    }

    fn record_start(&self, event: &BatchStartEvent) {
        self.sinks.iter().for_each(|sink| sink.record_start(event));
    }

    fn record_retry(&self, event: &RetryEvent) {
        self.sinks.iter().for_each(|sink| sink.record_retry(event));
    }

    fn record_abort(&self, event: &AbortEvent) {
        self.sinks.iter().for_each(|sink| sink.record_abort(event));
    }

    fn record_summary(&self, event: &SummaryEvent) {
        self.sinks.iter().for_each(|sink| sink.record_summary(event));
    }
}

// ============================================================================
// SECTION: Summary
// ============================================================================

/// Renders the fixed-shape run summary.
#[must_use]
pub fn render_summary(report: &BatchReport) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "{RULE}");
    let _ = writeln!(output, "SUMMARY");
    let _ = writeln!(output, "{RULE}");
    let _ = writeln!(output, "Total processed: {}", report.total_processed);
    let _ = writeln!(output, "Successful updates: {}", report.succeeded);
    let _ = writeln!(output, "Failed updates: {}", report.failed);
    if !report.failures_by_kind.is_empty() {
        let _ = writeln!(output, "Failures by kind:");
        for (status, count) in &report.failures_by_kind {
            let _ = writeln!(output, "  {status}: {count}");
        }
    }
    if report.is_clean() {
        output.push_str("All updates completed successfully!");
    } else {
        let _ = write!(
            output,
            "Process completed with {} errors. Check log for details.",
            report.failed
        );
    }
    output
}
