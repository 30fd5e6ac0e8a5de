// crates/profile-updater-core/src/core/outcome.rs
// ============================================================================
// Module: Record Outcomes and Batch Report
// Description: Per-record outcome model and the aggregate batch report.
// Purpose: Keep exactly one outcome per record and derive counts from them.
// Dependencies: crate::core::{identifiers, record}, serde
// ============================================================================

//! ## Overview
//! Every input record ends the run with exactly one [`UpdateOutcome`]. The
//! [`BatchReport`] is never accumulated independently of the outcomes; it is
//! folded from them, so `total_processed == succeeded + failed` holds by
//! construction.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::InternalId;
use crate::core::record::InputRecord;

// ============================================================================
// SECTION: Outcome Status
// ============================================================================

/// Terminal status of a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Attribute assigned.
    Success,
    /// Identity matched no user.
    NotFound,
    /// Identity matched more than one user.
    AmbiguousMatch,
    /// Throttling persisted past the retry cap.
    RateLimitExhausted,
    /// Transient service or network failures exhausted the retry budget.
    TransientError,
    /// Permanent, caller-side problem (malformed input, unknown attribute, denied).
    ValidationError,
    /// The lookup call reported an error or returned an unusable response.
    LookupFailed,
    /// The mutation call reported an error.
    MutationFailed,
}

impl OutcomeStatus {
    /// Returns the stable label used in logs and exports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NotFound => "not_found",
            Self::AmbiguousMatch => "ambiguous_match",
            Self::RateLimitExhausted => "rate_limit_exhausted",
            Self::TransientError => "transient_error",
            Self::ValidationError => "validation_error",
            Self::LookupFailed => "lookup_failed",
            Self::MutationFailed => "mutation_failed",
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Update Outcome
// ============================================================================

/// Result of processing one input record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOutcome {
    /// Record this outcome belongs to.
    pub record: InputRecord,
    /// Terminal status.
    pub status: OutcomeStatus,
    /// Internal id when resolution succeeded.
    pub internal_id: Option<InternalId>,
    /// Underlying error message for failures.
    pub error_detail: Option<String>,
}

impl UpdateOutcome {
    /// Builds a successful outcome.
    #[must_use]
    pub const fn success(record: InputRecord, internal_id: InternalId) -> Self {
        Self {
            record,
            status: OutcomeStatus::Success,
            internal_id: Some(internal_id),
            error_detail: None,
        }
    }

    /// Builds a failed outcome.
    #[must_use]
    pub fn failure(
        record: InputRecord,
        status: OutcomeStatus,
        internal_id: Option<InternalId>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            record,
            status,
            internal_id,
            error_detail: Some(detail.into()),
        }
    }

    /// Returns true when the record was updated.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

// ============================================================================
// SECTION: Batch Report
// ============================================================================

/// Aggregate counts derived from a run's outcomes.
///
/// # Invariants
/// - `total_processed == succeeded + failed`.
/// - `failures_by_kind` values sum to `failed` and never contain `Success`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Number of outcomes folded into the report.
    pub total_processed: usize,
    /// Outcomes with [`OutcomeStatus::Success`].
    pub succeeded: usize,
    /// All other outcomes.
    pub failed: usize,
    /// Failure counts keyed by status.
    pub failures_by_kind: BTreeMap<OutcomeStatus, usize>,
}

impl BatchReport {
    /// Folds outcomes into a report.
    #[must_use]
    pub fn from_outcomes(outcomes: &[UpdateOutcome]) -> Self {
        outcomes.iter().fold(Self::default(), |mut report, outcome| {
            report.total_processed += 1;
            if outcome.is_success() {
                report.succeeded += 1;
            } else {
                report.failed += 1;
                *report.failures_by_kind.entry(outcome.status).or_insert(0) += 1;
            }
            report
        })
    }

    /// Returns true when every processed record succeeded.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.failed == 0
    }
}
