// crates/profile-updater-core/src/interfaces/reporting.rs
// ============================================================================
// Module: Batch Reporting Events
// Description: Structured events emitted while a batch runs.
// Purpose: Hand per-record and summary events to a pluggable sink.
// Dependencies: crate::core, serde
// ============================================================================

//! ## Overview
//! The batch engine never formats log lines. It builds serializable events
//! and passes them to a [`BatchEventSink`]; sinks decide how and where they
//! are rendered.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::core::BatchReport;
use crate::core::InputRecord;
use crate::core::ScopeId;
use crate::core::UpdateOutcome;
use crate::interfaces::RemoteErrorKind;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Event severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    /// Normal progress.
    Info,
    /// Recoverable condition.
    Warn,
    /// Failure.
    Error,
}

impl EventLevel {
    /// Returns the upper-case label used by line-oriented sinks.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warn => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

/// Emitted once before the first record is processed.
#[derive(Debug, Clone, Serialize)]
pub struct BatchStartEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Event severity.
    pub level: EventLevel,
    /// Scope the batch runs against.
    pub scope_id: ScopeId,
    /// Number of records in the batch.
    pub total_records: usize,
    /// Number of workers.
    pub concurrency: usize,
}

/// Emitted once per record when its outcome is final.
#[derive(Debug, Clone, Serialize)]
pub struct OutcomeEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Event severity.
    pub level: EventLevel,
    /// Final outcome.
    pub outcome: UpdateOutcome,
}

/// Emitted before a remote call is retried.
#[derive(Debug, Clone, Serialize)]
pub struct RetryEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Event severity.
    pub level: EventLevel,
    /// Remote operation label.
    pub operation: &'static str,
    /// Source line of the record the call served, if any.
    pub line_number: Option<u64>,
    /// Attempt number that failed (1-based).
    pub attempt: u32,
    /// Delay before the next attempt, in milliseconds.
    pub delay_ms: u128,
    /// Classification of the failure.
    pub error_kind: RemoteErrorKind,
    /// Underlying failure message.
    pub message: String,
}

/// Emitted when a fatal condition stops the batch.
#[derive(Debug, Clone, Serialize)]
pub struct AbortEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Event severity.
    pub level: EventLevel,
    /// Record that surfaced the fatal condition.
    pub record: InputRecord,
    /// Fatal cause.
    pub cause: String,
    /// Records with a final outcome at abort time.
    pub processed: usize,
    /// Records never attempted.
    pub unprocessed: usize,
}

/// Emitted once after the last record.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Event severity.
    pub level: EventLevel,
    /// Aggregate report.
    pub report: BatchReport,
}

impl BatchStartEvent {
    /// Creates a start event with a consistent timestamp.
    #[must_use]
    pub fn new(scope_id: ScopeId, total_records: usize, concurrency: usize) -> Self {
        Self {
            event: "batch_started",
            timestamp_ms: now_ms(),
            level: EventLevel::Info,
            scope_id,
            total_records,
            concurrency,
        }
    }
}

impl OutcomeEvent {
    /// Creates an outcome event; failures are logged at error level.
    #[must_use]
    pub fn new(outcome: UpdateOutcome) -> Self {
        let level = if outcome.is_success() { EventLevel::Info } else { EventLevel::Error };
        Self {
            event: "record_outcome",
            timestamp_ms: now_ms(),
            level,
            outcome,
        }
    }
}

/// Inputs required to construct a retry event.
pub struct RetryEventParams {
    /// Remote operation label.
    pub operation: &'static str,
    /// Source line of the record the call served, if any.
    pub line_number: Option<u64>,
    /// Attempt number that failed (1-based).
    pub attempt: u32,
    /// Delay before the next attempt, in milliseconds.
    pub delay_ms: u128,
    /// Classification of the failure.
    pub error_kind: RemoteErrorKind,
    /// Underlying failure message.
    pub message: String,
}

impl RetryEvent {
    /// Creates a retry event with a consistent timestamp.
    #[must_use]
    pub fn new(params: RetryEventParams) -> Self {
        Self {
            event: "call_retry",
            timestamp_ms: now_ms(),
            level: EventLevel::Warn,
            operation: params.operation,
            line_number: params.line_number,
            attempt: params.attempt,
            delay_ms: params.delay_ms,
            error_kind: params.error_kind,
            message: params.message,
        }
    }
}

impl AbortEvent {
    /// Creates an abort event with a consistent timestamp.
    #[must_use]
    pub fn new(record: InputRecord, cause: String, processed: usize, unprocessed: usize) -> Self {
        Self {
            event: "batch_aborted",
            timestamp_ms: now_ms(),
            level: EventLevel::Error,
            record,
            cause,
            processed,
            unprocessed,
        }
    }
}

impl SummaryEvent {
    /// Creates a summary event; any failure raises the level to warning.
    #[must_use]
    pub fn new(report: BatchReport) -> Self {
        let level = if report.is_clean() { EventLevel::Info } else { EventLevel::Warn };
        Self {
            event: "batch_summary",
            timestamp_ms: now_ms(),
            level,
            report,
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Sink receiving batch events.
pub trait BatchEventSink: Send + Sync {
    /// Record a final per-record outcome.
    fn record_outcome(&self, event: &OutcomeEvent);

    /// Record the start of a batch.
    fn record_start(&self, _event: &BatchStartEvent) {}

    /// Record a retried remote call.
    fn record_retry(&self, _event: &RetryEvent) {}

    /// Record a fatal abort.
    fn record_abort(&self, _event: &AbortEvent) {}

    /// Record the final summary.
    fn record_summary(&self, _event: &SummaryEvent) {}
}

/// No-op event sink.
pub struct NoopEventSink;

impl BatchEventSink for NoopEventSink {
    fn record_outcome(&self, _event: &OutcomeEvent) {}
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Milliseconds since the Unix epoch (zero if the clock is before it).
fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}
