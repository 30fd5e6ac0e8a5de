// crates/profile-updater-cli/src/source.rs
// ============================================================================
// Module: CSV Record Source
// Description: Reads `(identity, security profile)` rows from a CSV file.
// Purpose: Produce input records with their source line numbers.
// Dependencies: csv, profile-updater-core, thiserror
// ============================================================================

//! ## Overview
//! The source is deliberately lenient about shape and strict about size.
//! Rows may carry any number of cells; only the first two are used, and a
//! row missing its second cell still becomes a record so that it is reported
//! as a validation failure instead of disappearing. A leading header row is
//! skipped when it names a known column, or when its cells are not shaped
//! like a username and a profile id.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use csv::StringRecord;
use csv::Trim;
use profile_updater_core::InputRecord;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of a record source file.
pub const MAX_SOURCE_BYTES: usize = 64 * 1024 * 1024;
/// UTF-8 byte order mark.
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
/// Column names accepted for the identity column.
const IDENTITY_HEADERS: &[&str] =
    &["username", "user_name", "userid", "user_id", "user", "login", "email", "identity"];
/// Column names accepted for the profile column.
const ATTRIBUTE_HEADERS: &[&str] = &[
    "security_profile_id",
    "security_profile",
    "profile_id",
    "security_profile_ids",
    "target_attribute_id",
];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failures reading a record source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// File could not be read.
    #[error("csv file error: {0}")]
    Io(String),
    /// File exceeds the size limit.
    #[error("csv file exceeds size limit ({size} > {limit} bytes)")]
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Allowed limit in bytes.
        limit: usize,
    },
    /// A row could not be decoded.
    #[error("csv parse error at line {line}: {message}")]
    Parse {
        /// Line the failure was reported on.
        line: u64,
        /// Decoder message.
        message: String,
    },
}

// ============================================================================
// SECTION: Reading
// ============================================================================

/// Reads every record from a CSV file.
///
/// # Errors
///
/// Returns [`SourceError`] when the file is missing, oversized, or not
/// decodable as UTF-8 CSV.
pub fn read_records(path: &Path) -> Result<Vec<InputRecord>, SourceError> {
    read_records_with_limit(path, MAX_SOURCE_BYTES)
}

/// Reads every record from a CSV file no larger than `max_bytes`.
///
/// # Errors
///
/// Returns [`SourceError`] when the file is missing, larger than
/// `max_bytes`, or not decodable as UTF-8 CSV.
pub fn read_records_with_limit(
    path: &Path,
    max_bytes: usize,
) -> Result<Vec<InputRecord>, SourceError> {
    let bytes = read_bytes_with_limit(path, max_bytes)?;
    parse_records(&bytes)
}

/// Parses records from raw CSV bytes.
///
/// Blank rows are ignored. The first non-blank row is skipped when it looks
/// like a header.
///
/// # Errors
///
/// Returns [`SourceError::Parse`] when a row is not valid UTF-8.
pub fn parse_records(data: &[u8]) -> Result<Vec<InputRecord>, SourceError> {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    let mut reader =
        ReaderBuilder::new().has_headers(false).flexible(true).trim(Trim::All).from_reader(data);

    let mut records = Vec::new();
    let mut first_row = true;
    for result in reader.records() {
        let row = result.map_err(|err| SourceError::Parse {
            line: err.position().map_or(0, csv::Position::line),
            message: err.to_string(),
        })?;
        if row.iter().all(str::is_empty) {
            continue;
        }
        if std::mem::replace(&mut first_row, false) && is_header(&row) {
            continue;
        }
        let line = row.position().map_or(0, csv::Position::line);
        let identity = row.get(0).unwrap_or_default();
        let target = row.get(1).unwrap_or_default();
        records.push(InputRecord::new(identity, target, line));
    }
    Ok(records)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns true when a row names a column or cannot be an identity/id pair.
///
/// Empty cells are not judged, so short or partial rows stay data.
fn is_header(row: &StringRecord) -> bool {
    let named = |index: usize, names: &[&str]| {
        row.get(index).is_some_and(|cell| names.contains(&normalize_header(cell).as_str()))
    };
    let misshapen = |index: usize, shaped: fn(char) -> bool| {
        row.get(index).is_some_and(|cell| !cell.is_empty() && !cell.chars().all(shaped))
    };
    named(0, IDENTITY_HEADERS)
        || named(1, ATTRIBUTE_HEADERS)
        || misshapen(0, is_identity_char)
        || misshapen(1, is_id_char)
}

/// Characters a directory username may contain.
fn is_identity_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '@' | '+' | '-')
}

/// Characters a security profile id or ARN may contain.
fn is_id_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | ':' | '/' | '-')
}

/// Lower-cases a header cell and folds spaces and dashes into underscores.
fn normalize_header(cell: &str) -> String {
    cell.trim()
        .chars()
        .map(|ch| if ch == ' ' || ch == '-' { '_' } else { ch.to_ascii_lowercase() })
        .collect()
}

/// Reads a file from disk while enforcing a hard size limit.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, SourceError> {
    let io_error = |err: std::io::Error| SourceError::Io(format!("{}: {err}", path.display()));
    let file = File::open(path).map_err(io_error)?;
    let size = file.metadata().map_err(io_error)?.len();
    let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX);
    if size > limit {
        return Err(SourceError::TooLarge {
            size,
            limit: max_bytes,
        });
    }

    let mut limited = file.take(limit.saturating_add(1));
    let mut bytes = Vec::new();
    limited.read_to_end(&mut bytes).map_err(io_error)?;
    if bytes.len() > max_bytes {
        return Err(SourceError::TooLarge {
            size: u64::try_from(bytes.len()).unwrap_or(u64::MAX),
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
