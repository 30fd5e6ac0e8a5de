// crates/profile-updater-core/src/core/record.rs
// ============================================================================
// Module: Input Records
// Description: Input rows and resolved users flowing through the batch.
// Purpose: Carry record identity and position from source to outcome.
// Dependencies: crate::core::identifiers, serde
// ============================================================================

//! ## Overview
//! An [`InputRecord`] is immutable once read. Identity uniqueness is not
//! assumed: duplicate identities are distinct records and are processed
//! independently. A [`ResolvedUser`] lives only for the record that produced
//! it; nothing is cached across records.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::InternalId;
use crate::core::identifiers::TargetAttributeId;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum accepted length, in bytes, of an identity or target attribute.
pub const MAX_RECORD_FIELD_BYTES: usize = 256;

// ============================================================================
// SECTION: Types
// ============================================================================

/// One `(identity, target attribute)` row read from the record source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRecord {
    /// User-facing lookup key (username or email).
    pub identity: String,
    /// Attribute value to assign.
    pub target_attribute_id: TargetAttributeId,
    /// Source line the record was read from.
    pub line_number: u64,
}

impl InputRecord {
    /// Creates a new input record.
    #[must_use]
    pub fn new(
        identity: impl Into<String>,
        target_attribute_id: impl Into<TargetAttributeId>,
        line_number: u64,
    ) -> Self {
        Self {
            identity: identity.into(),
            target_attribute_id: target_attribute_id.into(),
            line_number,
        }
    }

    /// Checks the record shape before any remote call is made.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when a field is empty, oversized, or
    /// contains control characters.
    pub fn validate(&self) -> Result<(), String> {
        validate_field("identity", &self.identity)?;
        validate_field("target attribute", self.target_attribute_id.as_str())
    }
}

/// Identity resolved to exactly one internal id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedUser {
    /// Identity as supplied by the input record.
    pub identity: String,
    /// Service-assigned identifier.
    pub internal_id: InternalId,
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Validates a single record field.
fn validate_field(label: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{label} is empty"));
    }
    if value.len() > MAX_RECORD_FIELD_BYTES {
        return Err(format!("{label} exceeds {MAX_RECORD_FIELD_BYTES} bytes"));
    }
    if value.chars().any(char::is_control) {
        return Err(format!("{label} contains control characters"));
    }
    Ok(())
}
