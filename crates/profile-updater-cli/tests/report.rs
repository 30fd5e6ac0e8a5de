// crates/profile-updater-cli/tests/report.rs
// ============================================================================
// Module: Run Reporting Tests
// Description: JSON-lines log, console lines, tee fan-out, and summary shape.
// Purpose: Ensure every event reaches the run log in a parseable form.
// ============================================================================

//! ## Overview
//! Drives the sinks directly with events built from core constructors.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::fs;
use std::path::Path;
use std::sync::Arc;

use profile_updater_cli::report::ConsoleEventSink;
use profile_updater_cli::report::JsonLinesEventSink;
use profile_updater_cli::report::RULE;
use profile_updater_cli::report::RunStartedEvent;
use profile_updater_cli::report::TeeEventSink;
use profile_updater_cli::report::log_file_name;
use profile_updater_cli::report::outcome_line;
use profile_updater_cli::report::render_summary;
use profile_updater_core::AbortEvent;
use profile_updater_core::BatchEventSink;
use profile_updater_core::BatchReport;
use profile_updater_core::BatchStartEvent;
use profile_updater_core::InputRecord;
use profile_updater_core::InternalId;
use profile_updater_core::OutcomeEvent;
use profile_updater_core::OutcomeStatus;
use profile_updater_core::RemoteErrorKind;
use profile_updater_core::RetryEvent;
use profile_updater_core::RetryEventParams;
use profile_updater_core::ScopeId;
use profile_updater_core::SummaryEvent;
use profile_updater_core::UpdateOutcome;
use serde_json::Value;
use time::macros::datetime;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

fn success() -> UpdateOutcome {
    UpdateOutcome::success(InputRecord::new("alice", "prof-a", 2), InternalId::new("u-1"))
}

fn not_found() -> UpdateOutcome {
    UpdateOutcome::failure(
        InputRecord::new("bob", "prof-b", 3),
        OutcomeStatus::NotFound,
        None,
        "no user matches bob",
    )
}

// ============================================================================
// SECTION: Log File
// ============================================================================

#[test]
fn log_file_name_uses_compact_utc_stamp() {
    let name = log_file_name(datetime!(2026-03-04 05:06:07 UTC)).unwrap();
    assert_eq!(name, "profile-update-20260304_050607.log");
}

#[test]
fn json_lines_sink_writes_one_object_per_event() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.log");
    let sink = JsonLinesEventSink::new(&path).unwrap();

    sink.record_start(&BatchStartEvent::new(ScopeId::new("inst-1"), 2, 1));
    sink.record_outcome(&OutcomeEvent::new(success()));
    sink.record_outcome(&OutcomeEvent::new(not_found()));
    sink.record_summary(&SummaryEvent::new(BatchReport::from_outcomes(&[success(), not_found()])));

    let content = fs::read_to_string(&path).unwrap();
    let events: Vec<Value> =
        content.lines().map(|line| serde_json::from_str(line).unwrap()).collect();
    assert_eq!(events.len(), 4);
    assert_eq!(events[0]["event"], "batch_started");
    assert_eq!(events[0]["scope_id"], "inst-1");
    assert_eq!(events[1]["level"], "info");
    assert_eq!(events[1]["outcome"]["status"], "success");
    assert_eq!(events[2]["level"], "error");
    assert_eq!(events[2]["outcome"]["status"], "not_found");
    assert_eq!(events[2]["outcome"]["record"]["line_number"], 3);
    assert_eq!(events[3]["event"], "batch_summary");
    assert_eq!(events[3]["report"]["failures_by_kind"]["not_found"], 1);
}

/// The log names its instance, input, and own path before any batch event.
#[test]
fn run_log_opens_with_run_identification() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.log");
    let sink = JsonLinesEventSink::new(&path).unwrap();
    let started = RunStartedEvent::new(
        datetime!(2026-03-04 05:06:07 UTC),
        "inst-1",
        Path::new("users.csv"),
        &path,
    );
    sink.record_run_started(&started);
    sink.record_start(&BatchStartEvent::new(ScopeId::new("inst-1"), 0, 1));

    let content = fs::read_to_string(&path).unwrap();
    let events: Vec<Value> =
        content.lines().map(|line| serde_json::from_str(line).unwrap()).collect();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["event"], "run_started");
    assert_eq!(events[0]["timestamp_ms"], 1_772_600_767_000_u64);
    assert_eq!(events[0]["instance_id"], "inst-1");
    assert_eq!(events[0]["csv_file"], "users.csv");
    assert_eq!(events[0]["log_file"], path.to_str().unwrap());
    assert_eq!(events[1]["event"], "batch_started");
}

#[test]
fn banner_lines_match_run_identification() {
    let started = RunStartedEvent::new(
        datetime!(2026-03-04 05:06:07 UTC),
        "inst-1",
        Path::new("users.csv"),
        Path::new("logs/run.log"),
    );
    let lines = started.banner_lines();
    assert_eq!(lines[0], RULE);
    assert_eq!(lines[3], "Instance ID: inst-1");
    assert_eq!(lines[4], "CSV File: users.csv");
    assert_eq!(lines[5], "Log File: logs/run.log");
}

#[test]
fn json_lines_sink_appends_to_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.log");
    fs::write(&path, "{\"event\":\"earlier\"}\n").unwrap();
    let sink = JsonLinesEventSink::new(&path).unwrap();
    sink.record_outcome(&OutcomeEvent::new(success()));
    assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 2);
}

// ============================================================================
// SECTION: Console
// ============================================================================

#[test]
fn outcome_lines_name_user_and_profile() {
    assert_eq!(
        outcome_line(&success()),
        "SUCCESS: Updated user alice (ID: u-1) with security profile prof-a"
    );
    assert_eq!(
        outcome_line(&not_found()),
        "FAILED: User bob, Security Profile prof-b (line 3) - not_found: no user matches bob"
    );
}

#[test]
fn console_sink_writes_progress_but_not_summary() {
    let sink = ConsoleEventSink::new(Vec::new());
    sink.record_outcome(&OutcomeEvent::new(success()));
    sink.record_abort(&AbortEvent::new(
        InputRecord::new("carol", "prof-c", 4),
        "access denied".to_string(),
        1,
        3,
    ));
    sink.record_summary(&SummaryEvent::new(BatchReport::default()));

    let output = String::from_utf8(sink.into_inner()).unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("SUCCESS: "));
    assert_eq!(lines[1], "ERROR: Aborted at line 4 (access denied); 3 record(s) left unprocessed");
}

#[test]
fn retry_lines_name_the_record_line_when_known() {
    let retry = |line_number| {
        RetryEvent::new(RetryEventParams {
            operation: "search_identity",
            line_number,
            attempt: 2,
            delay_ms: 4000,
            error_kind: RemoteErrorKind::Throttled,
            message: "slow down".to_string(),
        })
    };
    let sink = ConsoleEventSink::new(Vec::new());
    sink.record_retry(&retry(Some(7)));
    sink.record_retry(&retry(None));

    let output = String::from_utf8(sink.into_inner()).unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(
        lines,
        vec![
            "WARNING: search_identity attempt 2 failed (throttled) (line 7); retrying in 4000 ms",
            "WARNING: search_identity attempt 2 failed (throttled); retrying in 4000 ms",
        ]
    );
}

#[test]
fn tee_forwards_to_every_sink() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("a.log");
    let second = dir.path().join("b.log");
    let sinks: Vec<Arc<dyn BatchEventSink>> = vec![
        Arc::new(JsonLinesEventSink::new(&first).unwrap()),
        Arc::new(JsonLinesEventSink::new(&second).unwrap()),
    ];
    let tee = TeeEventSink::new(sinks);
    tee.record_outcome(&OutcomeEvent::new(not_found()));
    tee.record_summary(&SummaryEvent::new(BatchReport::default()));
    for path in [first, second] {
        assert_eq!(fs::read_to_string(path).unwrap().lines().count(), 2);
    }
}

// ============================================================================
// SECTION: Summary
// ============================================================================

#[test]
fn summary_lists_counts_and_failures_by_kind() {
    let report = BatchReport::from_outcomes(&[success(), not_found(), not_found()]);
    let summary = render_summary(&report);
    assert!(summary.contains("Total processed: 3\n"));
    assert!(summary.contains("Successful updates: 1\n"));
    assert!(summary.contains("Failed updates: 2\n"));
    assert!(summary.contains("Failures by kind:\n  not_found: 2\n"));
    assert!(summary.ends_with("Process completed with 2 errors. Check log for details."));
}

#[test]
fn clean_summary_has_no_failure_section() {
    let summary = render_summary(&BatchReport::from_outcomes(&[success()]));
    assert!(!summary.contains("Failures by kind"));
    assert!(summary.ends_with("All updates completed successfully!"));
}
