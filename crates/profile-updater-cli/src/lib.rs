// crates/profile-updater-cli/src/lib.rs
// ============================================================================
// Module: Profile Updater CLI Library
// Description: Shared helpers for the Profile Updater command-line interface.
// Purpose: Provide the record source, run reporting, and failure export.
// Dependencies: csv, profile-updater-core, serde_json, time
// ============================================================================

//! ## Overview
//! This library houses the file-facing pieces of the CLI so the binary entry
//! point (`src/main.rs`) stays a thin dispatcher and the pieces can be tested
//! without a remote directory.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Failed-subset CSV export.
pub mod failures;
/// Run log and console event sinks.
pub mod report;
/// CSV record source.
pub mod source;
