// crates/profile-updater-cli/tests/source.rs
// ============================================================================
// Module: CSV Record Source Tests
// Description: Header detection, row shapes, line numbers, and size limits.
// Purpose: Ensure every data row becomes exactly one record.
// ============================================================================

//! ## Overview
//! Reads CSV fixtures through the public source API.

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

use std::io::Write;

use profile_updater_cli::source::SourceError;
use profile_updater_cli::source::parse_records;
use profile_updater_cli::source::read_records;
use profile_updater_cli::source::read_records_with_limit;
use profile_updater_core::InputRecord;
use tempfile::NamedTempFile;

// ============================================================================
// SECTION: Parsing
// ============================================================================

#[test]
fn header_row_is_skipped_and_lines_are_kept() {
    let records =
        parse_records(b"username,security_profile_id\nalice,prof-a\nbob,prof-b\n").unwrap();
    assert_eq!(
        records,
        vec![InputRecord::new("alice", "prof-a", 2), InputRecord::new("bob", "prof-b", 3)]
    );
}

#[test]
fn headerless_file_keeps_first_row() {
    let records = parse_records(b"alice@example.com,prof-a\n").unwrap();
    assert_eq!(records, vec![InputRecord::new("alice@example.com", "prof-a", 1)]);
}

#[test]
fn bom_is_stripped_before_header_detection() {
    let mut data = vec![0xEF, 0xBB, 0xBF];
    data.extend_from_slice(b"Email,Security Profile\ncarol,prof-c\n");
    let records = parse_records(&data).unwrap();
    assert_eq!(records, vec![InputRecord::new("carol", "prof-c", 2)]);
}

#[test]
fn fields_are_trimmed_and_extra_columns_ignored() {
    let records = parse_records(b"  alice  , prof-a ,ignored,also ignored\n").unwrap();
    assert_eq!(records, vec![InputRecord::new("alice", "prof-a", 1)]);
}

#[test]
fn blank_rows_are_ignored() {
    let records = parse_records(b"alice,prof-a\n\n , \nbob,prof-b\n").unwrap();
    let identities: Vec<&str> = records.iter().map(|record| record.identity.as_str()).collect();
    assert_eq!(identities, vec!["alice", "bob"]);
}

/// A short row is kept so it surfaces as a validation failure.
#[test]
fn short_rows_become_records_with_empty_target() {
    let records = parse_records(b"alice,prof-a\nbob\n").unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].identity, "bob");
    assert!(records[1].target_attribute_id.as_str().is_empty());
    assert!(records[1].validate().is_err());
}

#[test]
fn duplicate_identities_are_distinct_records() {
    let records = parse_records(b"alice,prof-a\nalice,prof-b\n").unwrap();
    assert_eq!(records.len(), 2);
}

#[test]
fn quoted_fields_keep_embedded_commas() {
    let records = parse_records(b"alice,prof-a\n\"doe, jane\",prof-b\n").unwrap();
    assert_eq!(records[1].identity, "doe, jane");
}

/// A first row that cannot be a username/id pair is treated as a header.
#[test]
fn header_without_known_names_is_skipped() {
    let records = parse_records(b"Agent Login,Profile Name\nalice,prof-a\n").unwrap();
    assert_eq!(records, vec![InputRecord::new("alice", "prof-a", 2)]);
}

#[test]
fn empty_input_yields_no_records() {
    assert!(parse_records(b"").unwrap().is_empty());
    assert!(parse_records(b"username,security_profile_id\n").unwrap().is_empty());
}

#[test]
fn invalid_utf8_is_a_parse_error() {
    let result = parse_records(b"alice,prof-a\n\xFF\xFE,prof-b\n");
    assert!(matches!(result, Err(SourceError::Parse { .. })));
}

// ============================================================================
// SECTION: File Guards
// ============================================================================

#[test]
fn reads_records_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"user,profile_id\nalice,prof-a\n").unwrap();
    let records = read_records(file.path()).unwrap();
    assert_eq!(records, vec![InputRecord::new("alice", "prof-a", 2)]);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = read_records(&dir.path().join("absent.csv"));
    match result {
        Err(SourceError::Io(message)) => assert!(message.contains("absent.csv")),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn oversized_file_is_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"alice,prof-a\nbob,prof-b\n").unwrap();
    match read_records_with_limit(file.path(), 8) {
        Err(SourceError::TooLarge {
            size,
            limit,
        }) => {
            assert_eq!(size, 24);
            assert_eq!(limit, 8);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}
