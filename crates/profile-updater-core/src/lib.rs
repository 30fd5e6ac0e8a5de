// crates/profile-updater-core/src/lib.rs
// ============================================================================
// Module: Profile Updater Core Library
// Description: Public API surface for the batch attribute-update engine.
// Purpose: Expose core types, interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Profile Updater core bulk-assigns a per-user attribute (a security
//! profile) on a remote directory that only accepts one user per mutation
//! and throttles aggressively. It resolves each identity to an internal id,
//! issues the mutation through a shared rate-limited caller, and accounts for
//! every record with exactly one outcome. It performs no I/O itself; the
//! directory, clock, and event sink are injected.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::Candidate;
pub use interfaces::CandidatePage;
pub use interfaces::Clock;
pub use interfaces::DirectoryClient;
pub use interfaces::RemoteError;
pub use interfaces::RemoteErrorKind;
pub use interfaces::reporting::AbortEvent;
pub use interfaces::reporting::BatchEventSink;
pub use interfaces::reporting::BatchStartEvent;
pub use interfaces::reporting::EventLevel;
pub use interfaces::reporting::NoopEventSink;
pub use interfaces::reporting::OutcomeEvent;
pub use interfaces::reporting::RetryEvent;
pub use interfaces::reporting::RetryEventParams;
pub use interfaces::reporting::SummaryEvent;
pub use runtime::BatchAborted;
pub use runtime::BatchOptions;
pub use runtime::BatchRun;
pub use runtime::BatchRunner;
pub use runtime::CallError;
pub use runtime::PacingPolicy;
pub use runtime::RateLimitState;
pub use runtime::RateLimitedCaller;
pub use runtime::SystemClock;
