// crates/profile-updater-cli/src/failures.rs
// ============================================================================
// Module: Failed-Subset Export
// Description: Writes failed and unprocessed records back out as CSV.
// Purpose: Let an operator re-run only the records that did not succeed.
// Dependencies: csv, profile-updater-core, serde
// ============================================================================

//! ## Overview
//! The export's first two columns match the input layout, and its header row
//! is recognized by the record source, so the file can be fed straight back
//! into `profile-updater run`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;

use profile_updater_core::InputRecord;
use profile_updater_core::UpdateOutcome;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Status written for records a fatal abort left untouched.
pub const UNPROCESSED_STATUS: &str = "unprocessed";

// ============================================================================
// SECTION: Types
// ============================================================================

/// One exported row.
#[derive(Debug, Serialize)]
struct FailedRow<'a> {
    /// Identity as read from the source.
    username: &'a str,
    /// Profile the record asked for.
    security_profile_id: &'a str,
    /// Outcome status label.
    status: &'a str,
    /// Failure detail, empty when none.
    detail: &'a str,
}

// ============================================================================
// SECTION: Export
// ============================================================================

/// Writes every failed outcome, then every unprocessed record, to `out`.
///
/// Returns the number of rows written.
///
/// # Errors
///
/// Returns [`csv::Error`] when a row cannot be written.
pub fn write_failed<W: Write>(
    out: W,
    outcomes: &[UpdateOutcome],
    unprocessed: &[InputRecord],
) -> Result<usize, csv::Error> {
    let mut writer = csv::Writer::from_writer(out);
    let mut written = 0;
    for outcome in outcomes.iter().filter(|outcome| !outcome.is_success()) {
        writer.serialize(FailedRow {
            username: &outcome.record.identity,
            security_profile_id: outcome.record.target_attribute_id.as_str(),
            status: outcome.status.as_str(),
            detail: outcome.error_detail.as_deref().unwrap_or_default(),
        })?;
        written += 1;
    }
    for record in unprocessed {
        writer.serialize(FailedRow {
            username: &record.identity,
            security_profile_id: record.target_attribute_id.as_str(),
            status: UNPROCESSED_STATUS,
            detail: "",
        })?;
        written += 1;
    }
    if written == 0 {
        writer.write_record(["username", "security_profile_id", "status", "detail"])?;
    }
    writer.flush()?;
    Ok(written)
}

/// Writes the failed subset to a file, replacing any previous content.
///
/// # Errors
///
/// Returns [`csv::Error`] when the file cannot be created or written.
pub fn write_failed_file(
    path: &Path,
    outcomes: &[UpdateOutcome],
    unprocessed: &[InputRecord],
) -> Result<usize, csv::Error> {
    let file = std::fs::File::create(path)?;
    write_failed(file, outcomes, unprocessed)
}
