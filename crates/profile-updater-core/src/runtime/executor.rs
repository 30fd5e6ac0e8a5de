// crates/profile-updater-core/src/runtime/executor.rs
// ============================================================================
// Module: Attribute Executor
// Description: Issues the single-user attribute mutation.
// Purpose: Route each mutation through the shared rate-limited caller.
// Dependencies: crate::{core, interfaces, runtime::pacing}, thiserror
// ============================================================================

//! ## Overview
//! The remote service mutates one user per call, so the executor makes
//! exactly one paced call sequence per resolved record. No client-side
//! batching is attempted.

use std::sync::Arc;

use thiserror::Error;

use crate::core::InternalId;
use crate::core::ScopeId;
use crate::core::TargetAttributeId;
use crate::interfaces::DirectoryClient;
use crate::runtime::pacing::CallError;
use crate::runtime::pacing::RateLimitedCaller;

/// Operation label for mutation calls.
const MUTATE_OPERATION: &str = "mutate_attribute";

/// Mutation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    /// The mutation call failed.
    #[error(transparent)]
    Call(#[from] CallError),
}

/// Applies target attributes within one scope.
pub struct Executor {
    /// Remote directory.
    client: Arc<dyn DirectoryClient>,
    /// Shared pacing and retry wrapper.
    caller: Arc<RateLimitedCaller>,
    /// Scope mutated.
    scope: ScopeId,
}

impl Executor {
    /// Creates an executor bound to a scope.
    #[must_use]
    pub fn new(
        client: Arc<dyn DirectoryClient>,
        caller: Arc<RateLimitedCaller>,
        scope: ScopeId,
    ) -> Self {
        Self {
            client,
            caller,
            scope,
        }
    }

    /// Assigns `target` to the user with `internal_id`, for the record read
    /// from `line_number` when there is one.
    ///
    /// # Errors
    ///
    /// Returns [`MutationError`] when the paced call sequence fails.
    pub fn update(
        &self,
        internal_id: &InternalId,
        target: &TargetAttributeId,
        line_number: Option<u64>,
    ) -> Result<(), MutationError> {
        self.caller.call_for(MUTATE_OPERATION, line_number, || {
            self.client.mutate_attribute(&self.scope, internal_id, target)
        })?;
        Ok(())
    }
}
