// crates/profile-updater-core/tests/records.rs
// ============================================================================
// Module: Record and Outcome Tests
// Description: Local record validation and outcome serialization.
// Purpose: Pin the field rules applied before any remote call.
// ============================================================================

//! Record validation and outcome serialization tests.

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

use profile_updater_core::InputRecord;
use profile_updater_core::MAX_RECORD_FIELD_BYTES;
use profile_updater_core::OutcomeStatus;
use profile_updater_core::UpdateOutcome;

#[test]
fn well_formed_record_validates() {
    assert!(InputRecord::new("alice@example.com", "sp-123", 2).validate().is_ok());
}

#[test]
fn blank_fields_are_rejected() {
    let err = InputRecord::new("   ", "sp-123", 2).validate().unwrap_err();
    assert!(err.contains("identity"));
    let err = InputRecord::new("alice", "", 2).validate().unwrap_err();
    assert!(err.contains("target attribute"));
}

#[test]
fn field_length_is_bounded_in_bytes() {
    let at_limit = "a".repeat(MAX_RECORD_FIELD_BYTES);
    assert!(InputRecord::new(at_limit, "sp", 2).validate().is_ok());

    let multibyte = "é".repeat(MAX_RECORD_FIELD_BYTES / 2 + 1);
    assert!(InputRecord::new(multibyte, "sp", 2).validate().is_err());
}

#[test]
fn control_characters_are_rejected() {
    assert!(InputRecord::new("ali\nce", "sp", 2).validate().is_err());
    assert!(InputRecord::new("alice", "sp\u{0}", 2).validate().is_err());
}

#[test]
fn outcome_serializes_with_snake_case_status() {
    let outcome = UpdateOutcome::failure(
        InputRecord::new("bob", "sp-1", 3),
        OutcomeStatus::RateLimitExhausted,
        None,
        "throttled",
    );
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["status"], "rate_limit_exhausted");
    assert_eq!(json["record"]["identity"], "bob");
    assert_eq!(json["record"]["target_attribute_id"], "sp-1");
    assert_eq!(json["error_detail"], "throttled");
}

#[test]
fn status_labels_match_display() {
    for status in [OutcomeStatus::Success, OutcomeStatus::AmbiguousMatch, OutcomeStatus::LookupFailed]
    {
        assert_eq!(status.to_string(), status.as_str());
    }
}
