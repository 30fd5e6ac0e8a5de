// crates/profile-updater-core/src/runtime/resolver.rs
// ============================================================================
// Module: Identity Resolver
// Description: Maps a user-facing identity to exactly one internal id.
// Purpose: Never guess between candidates; classify zero/one/many matches.
// Dependencies: crate::{core, interfaces, runtime::pacing}, thiserror
// ============================================================================

//! ## Overview
//! The resolver consumes every search page (each page through the shared
//! [`RateLimitedCaller`]) before filtering, because the directory may match
//! fuzzily. Only candidates whose identity equals the query, ignoring case,
//! count as matches. Results are not cached: each record resolves on its own
//! so renames or removals during a run are observed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use thiserror::Error;

use crate::core::InternalId;
use crate::core::ResolvedUser;
use crate::core::ScopeId;
use crate::interfaces::Candidate;
use crate::interfaces::DirectoryClient;
use crate::runtime::pacing::CallError;
use crate::runtime::pacing::RateLimitedCaller;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum number of search pages consumed for a single identity.
pub const MAX_SEARCH_PAGES: usize = 50;
/// Operation label for search calls.
const SEARCH_OPERATION: &str = "search_identity";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Identity resolution failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// No candidate matched.
    #[error("no user found with identity {identity}")]
    NotFound {
        /// Identity searched for.
        identity: String,
    },
    /// More than one candidate matched.
    #[error("{matches} users match identity {identity}")]
    Ambiguous {
        /// Identity searched for.
        identity: String,
        /// Number of exact matches.
        matches: usize,
    },
    /// The directory answered with something unusable.
    #[error("malformed search response for {identity}: {reason}")]
    Malformed {
        /// Identity searched for.
        identity: String,
        /// What was wrong with the response.
        reason: String,
    },
    /// The search call itself failed.
    #[error(transparent)]
    Call(#[from] CallError),
}

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// Resolves identities against one scope.
pub struct Resolver {
    /// Remote directory.
    client: Arc<dyn DirectoryClient>,
    /// Shared pacing and retry wrapper.
    caller: Arc<RateLimitedCaller>,
    /// Scope searched.
    scope: ScopeId,
}

impl Resolver {
    /// Creates a resolver bound to a scope.
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

    /// Resolves `identity` to a single user.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] for zero or multiple matches, malformed
    /// responses, or failed search calls.
    pub fn resolve(&self, identity: &str) -> Result<ResolvedUser, ResolveError> {
        self.resolve_at(identity, None)
    }

    /// Resolves `identity` read from `line_number` of the record source.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] like [`Self::resolve`].
    pub fn resolve_at(
        &self,
        identity: &str,
        line_number: Option<u64>,
    ) -> Result<ResolvedUser, ResolveError> {
        let candidates = self.collect_candidates(identity, line_number)?;
        let mut matches = candidates.into_iter().filter(|candidate| {
            candidate.identity.as_deref().is_some_and(|found| identity_matches(found, identity))
        });
        let Some(first) = matches.next() else {
            return Err(ResolveError::NotFound {
                identity: identity.to_string(),
            });
        };
        let extra = matches.count();
        if extra > 0 {
            return Err(ResolveError::Ambiguous {
                identity: identity.to_string(),
                matches: extra + 1,
            });
        }
        let internal_id = first
            .internal_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ResolveError::Malformed {
                identity: identity.to_string(),
                reason: "matching user has no id".to_string(),
            })?;
        Ok(ResolvedUser {
            identity: identity.to_string(),
            internal_id: InternalId::new(internal_id),
        })
    }

    /// Reads every search page for `identity`.
    fn collect_candidates(
        &self,
        identity: &str,
        line_number: Option<u64>,
    ) -> Result<Vec<Candidate>, ResolveError> {
        let mut candidates = Vec::new();
        let mut token: Option<String> = None;
        for _ in 0 .. MAX_SEARCH_PAGES {
            let page = self.caller.call_for(SEARCH_OPERATION, line_number, || {
                self.client.search_identity(&self.scope, identity, token.as_deref())
            })?;
            candidates.extend(page.candidates);
            match page.next_token {
                Some(next) if !next.is_empty() => token = Some(next),
                _ => return Ok(candidates),
            }
        }
        Err(ResolveError::Malformed {
            identity: identity.to_string(),
            reason: format!("search exceeded {MAX_SEARCH_PAGES} pages"),
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Exact identity comparison, ignoring case.
fn identity_matches(found: &str, wanted: &str) -> bool {
    found.trim().to_lowercase() == wanted.trim().to_lowercase()
}
