// crates/profile-updater-core/src/core/mod.rs
// ============================================================================
// Module: Profile Updater Core Types
// Description: Records, identifiers, outcomes, and the batch report.
// Purpose: Provide stable, serializable types shared by every crate.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Core types describe what flows through a batch: input records in,
//! resolved users in the middle, one outcome per record out.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod identifiers;
pub mod outcome;
pub mod record;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use identifiers::InternalId;
pub use identifiers::ScopeId;
pub use identifiers::TargetAttributeId;
pub use outcome::BatchReport;
pub use outcome::OutcomeStatus;
pub use outcome::UpdateOutcome;
pub use record::InputRecord;
pub use record::MAX_RECORD_FIELD_BYTES;
pub use record::ResolvedUser;
