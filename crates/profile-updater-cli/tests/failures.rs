// crates/profile-updater-cli/tests/failures.rs
// ============================================================================
// Module: Failed-Subset Export Tests
// Description: Export content and re-readability through the record source.
// Purpose: Ensure the failed subset is a valid input for a follow-up run.
// ============================================================================

//! ## Overview
//! Exports outcomes and reads the result back with the CSV source.

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

use profile_updater_cli::failures::UNPROCESSED_STATUS;
use profile_updater_cli::failures::write_failed;
use profile_updater_cli::failures::write_failed_file;
use profile_updater_cli::source::parse_records;
use profile_updater_cli::source::read_records;
use profile_updater_core::InputRecord;
use profile_updater_core::InternalId;
use profile_updater_core::OutcomeStatus;
use profile_updater_core::UpdateOutcome;

fn outcomes() -> Vec<UpdateOutcome> {
    vec![
        UpdateOutcome::success(InputRecord::new("alice", "prof-a", 2), InternalId::new("u-1")),
        UpdateOutcome::failure(
            InputRecord::new("bob", "prof-b", 3),
            OutcomeStatus::RateLimitExhausted,
            None,
            "throttled, 6 attempts",
        ),
        UpdateOutcome::failure(
            InputRecord::new("carol", "bad", 4),
            OutcomeStatus::ValidationError,
            Some(InternalId::new("u-3")),
            "unknown profile",
        ),
    ]
}

#[test]
fn exports_only_failures_then_unprocessed() {
    let mut out = Vec::new();
    let unprocessed = vec![InputRecord::new("dave", "prof-d", 5)];
    let written = write_failed(&mut out, &outcomes(), &unprocessed).unwrap();
    assert_eq!(written, 3);

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec![
            "username,security_profile_id,status,detail",
            "bob,prof-b,rate_limit_exhausted,\"throttled, 6 attempts\"",
            "carol,bad,validation_error,unknown profile",
            "dave,prof-d,unprocessed,",
        ]
    );
    assert!(text.contains(UNPROCESSED_STATUS));
}

#[test]
fn empty_export_still_has_header() {
    let mut out = Vec::new();
    let written = write_failed(&mut out, &outcomes()[.. 1], &[]).unwrap();
    assert_eq!(written, 0);
    assert_eq!(String::from_utf8(out).unwrap(), "username,security_profile_id,status,detail\n");
}

/// The export reads back as input: header skipped, first two columns kept.
#[test]
fn export_is_rerunnable_input() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("failed.csv");
    write_failed_file(&path, &outcomes(), &[InputRecord::new("dave", "prof-d", 5)]).unwrap();

    let records = read_records(&path).unwrap();
    let pairs: Vec<(&str, &str)> = records
        .iter()
        .map(|record| (record.identity.as_str(), record.target_attribute_id.as_str()))
        .collect();
    assert_eq!(pairs, vec![("bob", "prof-b"), ("carol", "bad"), ("dave", "prof-d")]);

    let empty = {
        let mut out = Vec::new();
        write_failed(&mut out, &[], &[]).unwrap();
        out
    };
    assert!(parse_records(&empty).unwrap().is_empty());
}
