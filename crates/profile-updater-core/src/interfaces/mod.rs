// crates/profile-updater-core/src/interfaces/mod.rs
// ============================================================================
// Module: Profile Updater Interfaces
// Description: Backend-agnostic interfaces for the directory, time, and reporting.
// Purpose: Define the contract surfaces used by the batch runtime.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how the batch engine talks to the remote directory,
//! observes time, and reports events without embedding backend-specific
//! details. Implementations classify their own failures into
//! [`RemoteErrorKind`]; the runtime owns every retry decision.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod reporting;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::InternalId;
use crate::core::ScopeId;
use crate::core::TargetAttributeId;

// ============================================================================
// SECTION: Remote Errors
// ============================================================================

/// Classification of a failed remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteErrorKind {
    /// The service signalled that the caller exceeded its call rate.
    Throttled,
    /// Timeout, connection failure, or server-side fault.
    Transient,
    /// Permanent request problem (malformed id, unknown attribute, bad parameter).
    Rejected,
    /// Authentication or authorization failure.
    Unauthorized,
    /// The scope (instance/tenant) does not exist.
    ScopeNotFound,
    /// Any other service-reported error.
    Service,
}

impl RemoteErrorKind {
    /// Returns the stable label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Throttled => "throttled",
            Self::Transient => "transient",
            Self::Rejected => "rejected",
            Self::Unauthorized => "unauthorized",
            Self::ScopeNotFound => "scope_not_found",
            Self::Service => "service",
        }
    }
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by a single remote call attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct RemoteError {
    /// Failure classification.
    pub kind: RemoteErrorKind,
    /// Underlying service or transport message.
    pub message: String,
}

impl RemoteError {
    /// Creates a new remote error.
    #[must_use]
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

// ============================================================================
// SECTION: Directory Client
// ============================================================================

/// Search candidate returned by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Candidate {
    /// Identity reported by the directory, when present.
    pub identity: Option<String>,
    /// Internal id reported by the directory, when present.
    pub internal_id: Option<String>,
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CandidatePage {
    /// Candidates on this page.
    pub candidates: Vec<Candidate>,
    /// Continuation token for the next page.
    pub next_token: Option<String>,
}

/// Remote directory operations consumed by the batch.
pub trait DirectoryClient: Send + Sync {
    /// Searches the scope for users matching `query`.
    ///
    /// The directory may match fuzzily; callers filter exact matches.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] when the call fails.
    fn search_identity(
        &self,
        scope: &ScopeId,
        query: &str,
        page_token: Option<&str>,
    ) -> Result<CandidatePage, RemoteError>;

    /// Assigns `target` to a single user.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] when the call fails.
    fn mutate_attribute(
        &self,
        scope: &ScopeId,
        internal_id: &InternalId,
        target: &TargetAttributeId,
    ) -> Result<(), RemoteError>;
}

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Monotonic time source used for pacing.
pub trait Clock: Send + Sync {
    /// Returns elapsed time since an arbitrary fixed origin.
    fn now(&self) -> Duration;

    /// Blocks the current thread for `duration`.
    fn sleep(&self, duration: Duration);
}
