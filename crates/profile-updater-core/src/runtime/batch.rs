// crates/profile-updater-core/src/runtime/batch.rs
// ============================================================================
// Module: Batch Runner
// Description: Drives records through resolve and mutate, one outcome each.
// Purpose: Aggregate per-record outcomes in input order and fold the report.
// Dependencies: crate::{core, interfaces, runtime}, thiserror
// ============================================================================

//! ## Overview
//! [`BatchRunner`] is the outcome aggregator. Each record is turned into
//! exactly one [`UpdateOutcome`]:
//! 1. local validation (no remote call on failure),
//! 2. resolution,
//! 3. mutation.
//!
//! Retries belong to the [`RateLimitedCaller`]; the runner never re-attempts
//! a record. Per-record failures never stop the batch. The only exception is
//! a denied call (bad credentials or unknown scope) before any remote call
//! has succeeded, which aborts the run with [`BatchAborted`].
//!
//! With `concurrency > 1` scoped worker threads pull indices from a shared
//! cursor and write outcomes into position-indexed slots, so results come
//! back in input order regardless of completion order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::thread;

use thiserror::Error;

use crate::core::BatchReport;
use crate::core::InputRecord;
use crate::core::InternalId;
use crate::core::OutcomeStatus;
use crate::core::ScopeId;
use crate::core::UpdateOutcome;
use crate::interfaces::DirectoryClient;
use crate::interfaces::reporting::AbortEvent;
use crate::interfaces::reporting::BatchEventSink;
use crate::interfaces::reporting::BatchStartEvent;
use crate::interfaces::reporting::OutcomeEvent;
use crate::interfaces::reporting::SummaryEvent;
use crate::runtime::executor::Executor;
use crate::runtime::executor::MutationError;
use crate::runtime::pacing::CallError;
use crate::runtime::pacing::RateLimitedCaller;
use crate::runtime::resolver::ResolveError;
use crate::runtime::resolver::Resolver;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum number of concurrent workers.
pub const MAX_CONCURRENCY: usize = 16;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Batch-wide options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    /// Scope every call is made against.
    pub scope: ScopeId,
    /// Worker count; 1 processes records strictly sequentially.
    pub concurrency: usize,
}

/// Completed batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRun {
    /// One outcome per input record, in input order.
    pub outcomes: Vec<UpdateOutcome>,
    /// Report folded from `outcomes`.
    pub report: BatchReport,
}

/// Batch stopped by a fatal configuration or authentication failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("batch aborted at line {}: {cause}", record.line_number)]
pub struct BatchAborted {
    /// Denied call that stopped the batch.
    pub cause: CallError,
    /// Record whose call surfaced the failure.
    pub record: InputRecord,
    /// Outcomes of records finished before the abort, in input order.
    pub outcomes: Vec<UpdateOutcome>,
    /// Records without an outcome (including `record`), in input order.
    pub unprocessed: Vec<InputRecord>,
    /// Report folded from `outcomes`.
    pub report: BatchReport,
}

/// Result of processing a single record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordDisposition {
    /// The record has its final outcome.
    Done(UpdateOutcome),
    /// The record hit a batch-wide fatal condition.
    Fatal(CallError),
}

/// Work shared by the workers of one run.
struct DrainState<'a> {
    /// Records in input order.
    records: &'a [InputRecord],
    /// Next record index to claim.
    cursor: AtomicUsize,
    /// Set once a fatal condition is observed.
    stop: AtomicBool,
    /// Outcome slots indexed by input position.
    slots: Mutex<Vec<Option<UpdateOutcome>>>,
    /// First fatal condition and the index that raised it.
    fatal: Mutex<Option<(usize, CallError)>>,
}

// ============================================================================
// SECTION: Runner
// ============================================================================

/// Resolve-and-mutate pipeline over a batch of records.
pub struct BatchRunner {
    /// Identity resolver.
    resolver: Resolver,
    /// Attribute executor.
    executor: Executor,
    /// Shared pacing state, consulted for fatal detection.
    caller: Arc<RateLimitedCaller>,
    /// Event sink.
    events: Arc<dyn BatchEventSink>,
    /// Batch options.
    options: BatchOptions,
}

impl BatchRunner {
    /// Creates a runner; the resolver and executor share `caller`.
    #[must_use]
    pub fn new(
        client: Arc<dyn DirectoryClient>,
        caller: Arc<RateLimitedCaller>,
        events: Arc<dyn BatchEventSink>,
        options: BatchOptions,
    ) -> Self {
        let resolver = Resolver::new(Arc::clone(&client), Arc::clone(&caller), options.scope.clone());
        let executor = Executor::new(client, Arc::clone(&caller), options.scope.clone());
        Self {
            resolver,
            executor,
            caller,
            events,
            options,
        }
    }

    /// Processes every record and returns outcomes in input order.
    ///
    /// # Errors
    ///
    /// Returns [`BatchAborted`] when a fatal condition stops the batch.
    pub fn run<I>(&self, records: I) -> Result<BatchRun, BatchAborted>
    where
        I: IntoIterator<Item = InputRecord>,
    {
        let records: Vec<InputRecord> = records.into_iter().collect();
        let workers = self.options.concurrency.clamp(1, MAX_CONCURRENCY).min(records.len().max(1));
        self.events.record_start(&BatchStartEvent::new(
            self.options.scope.clone(),
            records.len(),
            workers,
        ));

        let state = DrainState {
            records: &records,
            cursor: AtomicUsize::new(0),
            stop: AtomicBool::new(false),
            slots: Mutex::new(vec![None; records.len()]),
            fatal: Mutex::new(None),
        };
        if workers == 1 {
            self.drain(&state);
        } else {
            thread::scope(|scope| {
                for _ in 0 .. workers {
                    scope.spawn(|| self.drain(&state));
                }
            });
        }

        let slots = state.slots.into_inner().unwrap_or_else(PoisonError::into_inner);
        let fatal = state.fatal.into_inner().unwrap_or_else(PoisonError::into_inner);
        let mut outcomes = Vec::with_capacity(records.len());
        let mut unprocessed = Vec::new();
        for (record, slot) in records.iter().zip(slots) {
            match slot {
                Some(outcome) => outcomes.push(outcome),
                None => unprocessed.push(record.clone()),
            }
        }
        let report = BatchReport::from_outcomes(&outcomes);

        if let Some((index, cause)) = fatal {
            let record = records.get(index).cloned().unwrap_or_else(|| {
                InputRecord::new(String::new(), String::new(), 0)
            });
            self.events.record_abort(&AbortEvent::new(
                record.clone(),
                cause.to_string(),
                outcomes.len(),
                unprocessed.len(),
            ));
            self.events.record_summary(&SummaryEvent::new(report.clone()));
            return Err(BatchAborted {
                cause,
                record,
                outcomes,
                unprocessed,
                report,
            });
        }

        self.events.record_summary(&SummaryEvent::new(report.clone()));
        Ok(BatchRun {
            outcomes,
            report,
        })
    }

    /// Turns one record into its final outcome, or a fatal condition.
    #[must_use]
    pub fn process_record(&self, record: &InputRecord) -> RecordDisposition {
        if let Err(reason) = record.validate() {
            return RecordDisposition::Done(UpdateOutcome::failure(
                record.clone(),
                OutcomeStatus::ValidationError,
                None,
                reason,
            ));
        }
        let line = Some(record.line_number);
        let user = match self.resolver.resolve_at(record.identity.trim(), line) {
            Ok(user) => user,
            Err(error) => return self.resolution_failure(record, error),
        };
        match self.executor.update(&user.internal_id, &record.target_attribute_id, line) {
            Ok(()) => {
                RecordDisposition::Done(UpdateOutcome::success(record.clone(), user.internal_id))
            }
            Err(MutationError::Call(error)) => self.call_failure(
                record,
                Some(user.internal_id),
                error,
                OutcomeStatus::MutationFailed,
            ),
        }
    }

    /// Claims and processes records until the input or the batch is exhausted.
    fn drain(&self, state: &DrainState<'_>) {
        while !state.stop.load(Ordering::SeqCst) {
            let index = state.cursor.fetch_add(1, Ordering::SeqCst);
            let Some(record) = state.records.get(index) else {
                break;
            };
            match self.process_record(record) {
                RecordDisposition::Done(outcome) => {
                    self.events.record_outcome(&OutcomeEvent::new(outcome.clone()));
                    if let Some(slot) = lock(&state.slots).get_mut(index) {
                        *slot = Some(outcome);
                    }
                }
                RecordDisposition::Fatal(cause) => {
                    state.stop.store(true, Ordering::SeqCst);
                    let mut fatal = lock(&state.fatal);
                    if fatal.is_none() {
                        *fatal = Some((index, cause));
                    }
                }
            }
        }
    }

    /// Maps a resolution failure onto an outcome.
    fn resolution_failure(&self, record: &InputRecord, error: ResolveError) -> RecordDisposition {
        let status = match &error {
            ResolveError::NotFound {
                ..
            } => OutcomeStatus::NotFound,
            ResolveError::Ambiguous {
                ..
            } => OutcomeStatus::AmbiguousMatch,
            ResolveError::Malformed {
                ..
            } => OutcomeStatus::LookupFailed,
            ResolveError::Call(call) => {
                return self.call_failure(record, None, call.clone(), OutcomeStatus::LookupFailed);
            }
        };
        RecordDisposition::Done(UpdateOutcome::failure(record.clone(), status, None, error.to_string()))
    }

    /// Maps a failed call sequence onto an outcome, or escalates it.
    fn call_failure(
        &self,
        record: &InputRecord,
        internal_id: Option<InternalId>,
        error: CallError,
        service_status: OutcomeStatus,
    ) -> RecordDisposition {
        let status = match &error {
            CallError::RateLimitExhausted {
                ..
            } => OutcomeStatus::RateLimitExhausted,
            CallError::TransientExhausted {
                ..
            } => OutcomeStatus::TransientError,
            CallError::Rejected {
                ..
            } => OutcomeStatus::ValidationError,
            CallError::Service {
                ..
            } => service_status,
            CallError::Denied {
                ..
            } => {
                if !self.caller.has_succeeded() {
                    return RecordDisposition::Fatal(error);
                }
                OutcomeStatus::ValidationError
            }
        };
        RecordDisposition::Done(UpdateOutcome::failure(
            record.clone(),
            status,
            internal_id,
            error.to_string(),
        ))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Locks a mutex; poisoned data is still structurally valid here.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
