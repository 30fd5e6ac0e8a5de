// crates/profile-updater-core/src/runtime/mod.rs
// ============================================================================
// Module: Profile Updater Runtime
// Description: Rate-limited caller, resolver, executor, and batch runner.
// Purpose: Execute a batch of attribute updates against a remote directory.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules implement the batch engine. The resolver and executor
//! never talk to the directory directly; every call passes through one shared
//! [`RateLimitedCaller`] so pacing observes true inter-call timing.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod batch;
pub mod clock;
pub mod executor;
pub mod pacing;
pub mod resolver;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use batch::BatchAborted;
pub use batch::BatchOptions;
pub use batch::BatchRun;
pub use batch::BatchRunner;
pub use batch::MAX_CONCURRENCY;
pub use batch::RecordDisposition;
pub use clock::SystemClock;
pub use executor::Executor;
pub use executor::MutationError;
pub use pacing::CallError;
pub use pacing::PacingPolicy;
pub use pacing::RateLimitState;
pub use pacing::RateLimitedCaller;
pub use resolver::MAX_SEARCH_PAGES;
pub use resolver::ResolveError;
pub use resolver::Resolver;
