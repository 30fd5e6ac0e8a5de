// crates/profile-updater-core/src/runtime/pacing.rs
// ============================================================================
// Module: Rate-Limited Caller
// Description: Paced, class-aware retry wrapper around single remote calls.
// Purpose: Keep the batch under the remote rate limiter without losing records.
// Dependencies: crate::interfaces, thiserror
// ============================================================================

//! ## Overview
//! [`RateLimitedCaller`] executes one remote operation at a time through a
//! shared pacing gate and retries by error class:
//! - throttled: exponential backoff, capped delay, capped attempts; the
//!   elevated delay is shared state so every worker slows down together.
//! - transient: short linear backoff, small fixed attempt budget.
//! - rejected, denied, service: no retry.
//!
//! The caller knows nothing about users. A call may be tagged with the source
//! line it serves; the tag is copied onto its retry events. Every call
//! sequence ends after at most
//! `throttle_max_attempts + transient_max_attempts - 1` attempts.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::time::Duration;

use thiserror::Error;

use crate::interfaces::Clock;
use crate::interfaces::RemoteError;
use crate::interfaces::RemoteErrorKind;
use crate::interfaces::reporting::BatchEventSink;
use crate::interfaces::reporting::RetryEvent;
use crate::interfaces::reporting::RetryEventParams;

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Pacing and retry limits for a [`RateLimitedCaller`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingPolicy {
    /// Minimum spacing between the starts of consecutive calls.
    pub base_delay: Duration,
    /// Throttled attempts allowed per call before giving up.
    pub throttle_max_attempts: u32,
    /// Backoff after the first throttling signal.
    pub throttle_initial_backoff: Duration,
    /// Upper bound for throttling backoff.
    pub throttle_max_backoff: Duration,
    /// Transient-failure attempts allowed per call before giving up.
    pub transient_max_attempts: u32,
    /// Linear backoff step for transient failures.
    pub transient_backoff: Duration,
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(250),
            throttle_max_attempts: 6,
            throttle_initial_backoff: Duration::from_secs(1),
            throttle_max_backoff: Duration::from_secs(30),
            transient_max_attempts: 3,
            transient_backoff: Duration::from_millis(500),
        }
    }
}

impl PacingPolicy {
    /// Returns the inter-call delay after `consecutive` throttling signals.
    #[must_use]
    pub fn throttle_backoff(&self, consecutive: u32) -> Duration {
        let exponent = consecutive.saturating_sub(1).min(31);
        self.throttle_initial_backoff
            .saturating_mul(1_u32 << exponent)
            .min(self.throttle_max_backoff)
            .max(self.base_delay)
    }

    /// Returns the pause after the `attempt`-th transient failure.
    #[must_use]
    pub const fn transient_delay(&self, attempt: u32) -> Duration {
        self.transient_backoff.saturating_mul(attempt)
    }
}

// ============================================================================
// SECTION: State
// ============================================================================

/// Shared pacing state, one per caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitState {
    /// Spacing currently enforced between call starts.
    pub current_delay: Duration,
    /// Throttling signals received since the last non-throttled response.
    pub consecutive_throttles: u32,
    /// Calls that completed successfully.
    pub successful_calls: u64,
    /// Clock reading at the last call start or throttling signal.
    pub last_call_at: Option<Duration>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Terminal failure of a paced call sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    /// Throttling persisted for every allowed attempt.
    #[error("{operation}: rate limit exhausted after {attempts} attempts: {message}")]
    RateLimitExhausted {
        /// Remote operation label.
        operation: &'static str,
        /// Throttled attempts made.
        attempts: u32,
        /// Last throttling message.
        message: String,
    },
    /// Transient failures persisted for every allowed attempt.
    #[error("{operation}: transient failure after {attempts} attempts: {message}")]
    TransientExhausted {
        /// Remote operation label.
        operation: &'static str,
        /// Transient attempts made.
        attempts: u32,
        /// Last transient message.
        message: String,
    },
    /// The service rejected the request as invalid.
    #[error("{operation}: rejected: {message}")]
    Rejected {
        /// Remote operation label.
        operation: &'static str,
        /// Rejection message.
        message: String,
    },
    /// Credentials or scope were refused.
    #[error("{operation}: {kind}: {message}")]
    Denied {
        /// Remote operation label.
        operation: &'static str,
        /// Either `Unauthorized` or `ScopeNotFound`.
        kind: RemoteErrorKind,
        /// Denial message.
        message: String,
    },
    /// Any other service-reported error.
    #[error("{operation}: service error: {message}")]
    Service {
        /// Remote operation label.
        operation: &'static str,
        /// Service message.
        message: String,
    },
}

// ============================================================================
// SECTION: Caller
// ============================================================================

/// Paced retry wrapper shared by the resolver and the executor.
pub struct RateLimitedCaller {
    /// Retry and pacing limits.
    policy: PacingPolicy,
    /// Time source for pacing and backoff.
    clock: Arc<dyn Clock>,
    /// Sink for retry events.
    events: Arc<dyn BatchEventSink>,
    /// Pacing gate; held while waiting for the next call slot.
    state: Mutex<RateLimitState>,
}

/// Labels copied onto every retry event of one call sequence.
#[derive(Clone, Copy)]
struct RetryTag {
    /// Remote operation label.
    operation: &'static str,
    /// Source line of the record being served, if any.
    line_number: Option<u64>,
}

impl RateLimitedCaller {
    /// Creates a caller starting at baseline pacing.
    #[must_use]
    pub fn new(
        policy: PacingPolicy,
        clock: Arc<dyn Clock>,
        events: Arc<dyn BatchEventSink>,
    ) -> Self {
        let state = RateLimitState {
            current_delay: policy.base_delay,
            consecutive_throttles: 0,
            successful_calls: 0,
            last_call_at: None,
        };
        Self {
            policy,
            clock,
            events,
            state: Mutex::new(state),
        }
    }

    /// Returns the configured policy.
    #[must_use]
    pub const fn policy(&self) -> &PacingPolicy {
        &self.policy
    }

    /// Returns a snapshot of the pacing state.
    #[must_use]
    pub fn state(&self) -> RateLimitState {
        *self.lock_state()
    }

    /// Returns true once any call made through this caller has succeeded.
    #[must_use]
    pub fn has_succeeded(&self) -> bool {
        self.lock_state().successful_calls > 0
    }

    /// Runs `attempt` under pacing and the retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`CallError`] when retries are exhausted or the failure class
    /// is not retryable.
    pub fn call<T, F>(&self, operation: &'static str, attempt: F) -> Result<T, CallError>
    where
        F: FnMut() -> Result<T, RemoteError>,
    {
        self.call_for(operation, None, attempt)
    }

    /// Runs `attempt` like [`Self::call`], tagging retry events with the
    /// source line of the record being served.
    ///
    /// # Errors
    ///
    /// Returns [`CallError`] when retries are exhausted or the failure class
    /// is not retryable.
    pub fn call_for<T, F>(
        &self,
        operation: &'static str,
        line_number: Option<u64>,
        mut attempt: F,
    ) -> Result<T, CallError>
    where
        F: FnMut() -> Result<T, RemoteError>,
    {
        let retry = RetryTag {
            operation,
            line_number,
        };
        let throttle_limit = self.policy.throttle_max_attempts.max(1);
        let transient_limit = self.policy.transient_max_attempts.max(1);
        let mut throttled: u32 = 0;
        let mut transient: u32 = 0;
        loop {
            self.acquire_slot();
            let error = match attempt() {
                Ok(value) => {
                    self.settle(true);
                    return Ok(value);
                }
                Err(error) => error,
            };
            match error.kind {
                RemoteErrorKind::Throttled => {
                    throttled += 1;
                    let delay = self.note_throttle();
                    if throttled >= throttle_limit {
                        return Err(CallError::RateLimitExhausted {
                            operation,
                            attempts: throttled,
                            message: error.message,
                        });
                    }
                    self.emit_retry(retry, throttled + transient, delay, error);
                }
                RemoteErrorKind::Transient => {
                    self.settle(false);
                    transient += 1;
                    if transient >= transient_limit {
                        return Err(CallError::TransientExhausted {
                            operation,
                            attempts: transient,
                            message: error.message,
                        });
                    }
                    let delay = self.policy.transient_delay(transient);
                    self.emit_retry(retry, throttled + transient, delay, error);
                    self.clock.sleep(delay);
                }
                RemoteErrorKind::Rejected => {
                    self.settle(false);
                    return Err(CallError::Rejected {
                        operation,
                        message: error.message,
                    });
                }
                RemoteErrorKind::Unauthorized | RemoteErrorKind::ScopeNotFound => {
                    self.settle(false);
                    return Err(CallError::Denied {
                        operation,
                        kind: error.kind,
                        message: error.message,
                    });
                }
                RemoteErrorKind::Service => {
                    self.settle(false);
                    return Err(CallError::Service {
                        operation,
                        message: error.message,
                    });
                }
            }
        }
    }

    /// Waits until the current delay has elapsed since the last call start.
    fn acquire_slot(&self) {
        let mut state = self.lock_state();
        if let Some(last) = state.last_call_at {
            let ready_at = last.saturating_add(state.current_delay);
            let now = self.clock.now();
            if ready_at > now {
                self.clock.sleep(ready_at - now);
            }
        }
        state.last_call_at = Some(self.clock.now());
    }

    /// Raises the shared delay after a throttling signal and returns it.
    fn note_throttle(&self) -> Duration {
        let mut state = self.lock_state();
        state.consecutive_throttles = state.consecutive_throttles.saturating_add(1);
        state.current_delay = self.policy.throttle_backoff(state.consecutive_throttles);
        state.last_call_at = Some(self.clock.now());
        state.current_delay
    }

    /// Restores baseline pacing after a non-throttled response.
    fn settle(&self, succeeded: bool) {
        let mut state = self.lock_state();
        state.current_delay = self.policy.base_delay;
        state.consecutive_throttles = 0;
        if succeeded {
            state.successful_calls = state.successful_calls.saturating_add(1);
        }
    }

    /// Reports a retry decision.
    fn emit_retry(&self, tag: RetryTag, attempt: u32, delay: Duration, error: RemoteError) {
        self.events.record_retry(&RetryEvent::new(RetryEventParams {
            operation: tag.operation,
            line_number: tag.line_number,
            attempt,
            delay_ms: delay.as_millis(),
            error_kind: error.kind,
            message: error.message,
        }));
    }

    /// Locks pacing state; a poisoned lock still holds valid plain data.
    fn lock_state(&self) -> MutexGuard<'_, RateLimitState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
