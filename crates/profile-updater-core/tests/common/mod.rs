// crates/profile-updater-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Scripted directory, manual clock, and recording sink.
// Purpose: Drive the batch engine deterministically without a network.
// Dependencies: profile-updater-core
// ============================================================================

//! ## Overview
//! [`ScriptedDirectory`] holds an in-memory user list and per-query failure
//! scripts. Its search is deliberately fuzzy (case-insensitive substring) so
//! the resolver's exact-match filtering is exercised. [`ManualClock`] advances
//! only when slept on, so backoff schedules are observable and instant.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only fixtures use panic-based assertions."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use profile_updater_core::AbortEvent;
use profile_updater_core::BatchEventSink;
use profile_updater_core::BatchOptions;
use profile_updater_core::BatchRunner;
use profile_updater_core::BatchStartEvent;
use profile_updater_core::Candidate;
use profile_updater_core::CandidatePage;
use profile_updater_core::Clock;
use profile_updater_core::DirectoryClient;
use profile_updater_core::InputRecord;
use profile_updater_core::InternalId;
use profile_updater_core::OutcomeEvent;
use profile_updater_core::PacingPolicy;
use profile_updater_core::RateLimitedCaller;
use profile_updater_core::RemoteError;
use profile_updater_core::RemoteErrorKind;
use profile_updater_core::RetryEvent;
use profile_updater_core::ScopeId;
use profile_updater_core::SummaryEvent;
use profile_updater_core::TargetAttributeId;

// ============================================================================
// SECTION: Scripted Directory
// ============================================================================

/// In-memory directory with scripted failures.
#[derive(Default)]
pub struct ScriptedDirectory {
    /// Directory contents as `(identity, internal id)`.
    users: Mutex<Vec<(String, String)>>,
    /// Page size for search results (0 means a single page).
    page_size: usize,
    /// Failures returned by the next searches, regardless of query.
    search_failures: Mutex<VecDeque<RemoteError>>,
    /// Failures returned by searches for a specific query.
    query_failures: Mutex<HashMap<String, VecDeque<RemoteError>>>,
    /// Failures returned by the next mutations, regardless of user.
    mutation_failures: Mutex<VecDeque<RemoteError>>,
    /// Failures returned by mutations for a specific internal id.
    user_mutation_failures: Mutex<HashMap<String, VecDeque<RemoteError>>>,
    /// Successful mutations in call order.
    mutations: Mutex<Vec<(String, String)>>,
    /// Current attribute per internal id.
    assigned: Mutex<BTreeMap<String, String>>,
    /// Search call count.
    search_calls: AtomicUsize,
    /// Mutation call count (including failed ones).
    mutation_calls: AtomicUsize,
}

impl ScriptedDirectory {
    /// Creates an empty directory returning all results on one page.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the search page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Adds a user.
    pub fn with_user(self, identity: &str, internal_id: &str) -> Self {
        self.users.lock().unwrap().push((identity.to_string(), internal_id.to_string()));
        self
    }

    /// Queues failures for the next searches of any query.
    pub fn fail_searches(self, errors: impl IntoIterator<Item = RemoteError>) -> Self {
        self.search_failures.lock().unwrap().extend(errors);
        self
    }

    /// Queues failures for searches of `query`.
    pub fn fail_query(self, query: &str, errors: impl IntoIterator<Item = RemoteError>) -> Self {
        self.query_failures.lock().unwrap().entry(query.to_string()).or_default().extend(errors);
        self
    }

    /// Queues failures for the next mutations of any user.
    pub fn fail_mutations(self, errors: impl IntoIterator<Item = RemoteError>) -> Self {
        self.mutation_failures.lock().unwrap().extend(errors);
        self
    }

    /// Queues failures for mutations of `internal_id`.
    pub fn fail_user_mutation(
        self,
        internal_id: &str,
        errors: impl IntoIterator<Item = RemoteError>,
    ) -> Self {
        self.user_mutation_failures
            .lock()
            .unwrap()
            .entry(internal_id.to_string())
            .or_default()
            .extend(errors);
        self
    }

    /// Successful mutations in call order.
    pub fn mutations(&self) -> Vec<(String, String)> {
        self.mutations.lock().unwrap().clone()
    }

    /// Current attribute assignments.
    pub fn assigned(&self) -> BTreeMap<String, String> {
        self.assigned.lock().unwrap().clone()
    }

    /// Number of search calls made.
    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    /// Number of mutation calls made.
    pub fn mutation_calls(&self) -> usize {
        self.mutation_calls.load(Ordering::SeqCst)
    }
}

impl DirectoryClient for ScriptedDirectory {
    fn search_identity(
        &self,
        _scope: &ScopeId,
        query: &str,
        page_token: Option<&str>,
    ) -> Result<CandidatePage, RemoteError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.search_failures.lock().unwrap().pop_front() {
            return Err(error);
        }
        if let Some(error) =
            self.query_failures.lock().unwrap().get_mut(query).and_then(VecDeque::pop_front)
        {
            return Err(error);
        }
        let needle = query.to_lowercase();
        let matches: Vec<Candidate> = self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|(identity, _)| identity.to_lowercase().contains(&needle))
            .map(|(identity, id)| Candidate {
                identity: Some(identity.clone()),
                internal_id: Some(id.clone()),
            })
            .collect();
        if self.page_size == 0 {
            return Ok(CandidatePage {
                candidates: matches,
                next_token: None,
            });
        }
        let offset: usize = page_token.map_or(0, |token| token.parse().unwrap());
        let end = (offset + self.page_size).min(matches.len());
        let next_token = (end < matches.len()).then(|| end.to_string());
        Ok(CandidatePage {
            candidates: matches[offset .. end].to_vec(),
            next_token,
        })
    }

    fn mutate_attribute(
        &self,
        _scope: &ScopeId,
        internal_id: &InternalId,
        target: &TargetAttributeId,
    ) -> Result<(), RemoteError> {
        self.mutation_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.mutation_failures.lock().unwrap().pop_front() {
            return Err(error);
        }
        if let Some(error) = self
            .user_mutation_failures
            .lock()
            .unwrap()
            .get_mut(internal_id.as_str())
            .and_then(VecDeque::pop_front)
        {
            return Err(error);
        }
        self.mutations
            .lock()
            .unwrap()
            .push((internal_id.to_string(), target.to_string()));
        self.assigned.lock().unwrap().insert(internal_id.to_string(), target.to_string());
        Ok(())
    }
}

// ============================================================================
// SECTION: Manual Clock
// ============================================================================

/// Clock that only advances when slept on.
#[derive(Default)]
pub struct ManualClock {
    /// Current reading.
    now: Mutex<Duration>,
    /// Every non-zero sleep, in order.
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    /// Creates a clock at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded sleeps.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }

    /// Advances time without recording a sleep (simulates call latency).
    pub fn advance(&self, duration: Duration) {
        *self.now.lock().unwrap() += duration;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock().unwrap()
    }

    fn sleep(&self, duration: Duration) {
        *self.now.lock().unwrap() += duration;
        self.sleeps.lock().unwrap().push(duration);
    }
}

// ============================================================================
// SECTION: Recording Sink
// ============================================================================

/// Sink that keeps every event it receives.
#[derive(Default)]
pub struct RecordingSink {
    /// Event identifiers in arrival order.
    pub kinds: Mutex<Vec<&'static str>>,
    /// Outcome events.
    pub outcomes: Mutex<Vec<OutcomeEvent>>,
    /// Retry events.
    pub retries: Mutex<Vec<RetryEvent>>,
    /// Abort events.
    pub aborts: Mutex<Vec<AbortEvent>>,
    /// Summary events.
    pub summaries: Mutex<Vec<SummaryEvent>>,
}

impl RecordingSink {
    /// Event identifiers in arrival order.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.kinds.lock().unwrap().clone()
    }

    /// Number of retry events.
    pub fn retry_count(&self) -> usize {
        self.retries.lock().unwrap().len()
    }
}

impl BatchEventSink for RecordingSink {
    fn record_outcome(&self, event: &OutcomeEvent) {
        self.kinds.lock().unwrap().push(event.event);
        self.outcomes.lock().unwrap().push(event.clone());
    }

    fn record_start(&self, event: &BatchStartEvent) {
        self.kinds.lock().unwrap().push(event.event);
    }

    fn record_retry(&self, event: &RetryEvent) {
        self.kinds.lock().unwrap().push(event.event);
        self.retries.lock().unwrap().push(event.clone());
    }

    fn record_abort(&self, event: &AbortEvent) {
        self.kinds.lock().unwrap().push(event.event);
        self.aborts.lock().unwrap().push(event.clone());
    }

    fn record_summary(&self, event: &SummaryEvent) {
        self.kinds.lock().unwrap().push(event.event);
        self.summaries.lock().unwrap().push(event.clone());
    }
}

// ============================================================================
// SECTION: Builders
// ============================================================================

/// Pacing policy with round numbers for schedule assertions.
pub fn test_policy() -> PacingPolicy {
    PacingPolicy {
        base_delay: Duration::from_millis(100),
        throttle_max_attempts: 4,
        throttle_initial_backoff: Duration::from_secs(1),
        throttle_max_backoff: Duration::from_secs(8),
        transient_max_attempts: 3,
        transient_backoff: Duration::from_millis(500),
    }
}

/// Remote error shorthand.
pub fn remote(kind: RemoteErrorKind, message: &str) -> RemoteError {
    RemoteError::new(kind, message)
}

/// `count` copies of a remote error.
pub fn repeated(kind: RemoteErrorKind, count: usize) -> Vec<RemoteError> {
    (0 .. count).map(|n| remote(kind, &format!("{kind} #{n}"))).collect()
}

/// Input record shorthand.
pub fn record(identity: &str, target: &str, line_number: u64) -> InputRecord {
    InputRecord::new(identity, target, line_number)
}

/// Everything a batch test needs to inspect after a run.
pub struct Harness {
    /// Runner under test.
    pub runner: BatchRunner,
    /// Shared caller (for state assertions).
    pub caller: Arc<RateLimitedCaller>,
    /// Directory fake.
    pub directory: Arc<ScriptedDirectory>,
    /// Manual clock.
    pub clock: Arc<ManualClock>,
    /// Recorded events.
    pub sink: Arc<RecordingSink>,
}

/// Builds a runner over `directory` with the test policy.
pub fn harness(directory: ScriptedDirectory, concurrency: usize) -> Harness {
    harness_with_policy(directory, concurrency, test_policy())
}

/// Builds a runner over `directory` with an explicit policy.
pub fn harness_with_policy(
    directory: ScriptedDirectory,
    concurrency: usize,
    policy: PacingPolicy,
) -> Harness {
    let directory = Arc::new(directory);
    let clock = Arc::new(ManualClock::new());
    let sink = Arc::new(RecordingSink::default());
    let caller = Arc::new(RateLimitedCaller::new(policy, clock.clone(), sink.clone()));
    let runner = BatchRunner::new(
        directory.clone(),
        Arc::clone(&caller),
        sink.clone(),
        BatchOptions {
            scope: ScopeId::new("instance-1"),
            concurrency,
        },
    );
    Harness {
        runner,
        caller,
        directory,
        clock,
        sink,
    }
}
