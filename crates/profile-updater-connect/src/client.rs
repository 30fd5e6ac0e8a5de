// crates/profile-updater-connect/src/client.rs
// ============================================================================
// Module: Connect Directory Client
// Description: SearchUsers / UpdateUserSecurityProfiles directory backend.
// Purpose: Implement the synchronous directory interface over the AWS SDK.
// Dependencies: aws-config, aws-sdk-connect, profile-updater-core, tokio
// ============================================================================

//! ## Overview
//! The client owns a Tokio runtime and blocks on each SDK call, so it can be
//! shared by the batch engine's worker threads. Each trait method performs
//! exactly one HTTP operation; retries belong to the caller.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use aws_config::BehaviorVersion;
use aws_config::Region;
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_sdk_connect::Client;
use aws_sdk_connect::types::StringComparisonType;
use aws_sdk_connect::types::StringCondition;
use aws_sdk_connect::types::UserSearchCriteria;
use profile_updater_core::Candidate;
use profile_updater_core::CandidatePage;
use profile_updater_core::DirectoryClient;
use profile_updater_core::InternalId;
use profile_updater_core::RemoteError;
use profile_updater_core::RemoteErrorKind;
use profile_updater_core::ScopeId;
use profile_updater_core::TargetAttributeId;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::runtime::Runtime;
use tokio::runtime::RuntimeFlavor;

use crate::classify::Operation;
use crate::classify::classify_sdk_error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// User field searched for the identity.
const USERNAME_FIELD: &str = "Username";
/// Largest page the search API accepts.
const MAX_PAGE_SIZE: i32 = 100;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failures building the client.
#[derive(Debug, Error)]
pub enum ConnectClientError {
    /// Invalid client settings.
    #[error("connect client invalid: {0}")]
    Invalid(String),
    /// Runtime or bridge failure.
    #[error("connect client io error: {0}")]
    Io(String),
}

/// Error types that can report a failed runtime bridge.
trait BridgeFailure {
    /// Builds the error for a bridge failure.
    fn bridge_failure(message: String) -> Self;
}

impl BridgeFailure for ConnectClientError {
    fn bridge_failure(message: String) -> Self {
        Self::Io(message)
    }
}

impl BridgeFailure for RemoteError {
    fn bridge_failure(message: String) -> Self {
        Self::new(RemoteErrorKind::Transient, message)
    }
}

// ============================================================================
// SECTION: Runtime Helpers
// ============================================================================

/// Blocks on an SDK future using a compatible runtime.
fn block_on_with_runtime<F, T, E>(runtime: &Runtime, future: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: BridgeFailure + Send + 'static,
{
    if let Ok(handle) = Handle::try_current() {
        if matches!(handle.runtime_flavor(), RuntimeFlavor::MultiThread) {
            return tokio::task::block_in_place(|| handle.block_on(future));
        }
        let (tx, rx) = std::sync::mpsc::sync_channel(1);
        std::thread::spawn(move || {
            let result = Runtime::new()
                .map_err(|err| E::bridge_failure(err.to_string()))
                .and_then(|runtime| runtime.block_on(future));
            let _ = tx.send(result);
        });
        return rx
            .recv()
            .unwrap_or_else(|_| Err(E::bridge_failure("connect bridge thread join failed".to_string())));
    }

    runtime.block_on(future)
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Connect client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectClientConfig {
    /// Region override (defaults to the environment).
    pub region: Option<String>,
    /// Endpoint override.
    pub endpoint_url: Option<String>,
    /// Per-operation timeout.
    pub timeout: Duration,
    /// Search page size.
    pub page_size: u32,
}

/// Amazon Connect backed directory client.
pub struct ConnectDirectoryClient {
    /// Underlying SDK client.
    client: Client,
    /// Search page size.
    page_size: i32,
    /// Tokio runtime for blocking SDK operations.
    runtime: Option<Arc<Runtime>>,
}

impl Drop for ConnectDirectoryClient {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            let _ = std::thread::spawn(move || drop(runtime));
        }
    }
}

impl ConnectDirectoryClient {
    /// Builds a client from the ambient AWS configuration plus overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectClientError`] when the settings are invalid or the
    /// runtime cannot be created.
    pub fn new(config: &ConnectClientConfig) -> Result<Self, ConnectClientError> {
        let page_size = i32::try_from(config.page_size)
            .ok()
            .filter(|size| (1 ..= MAX_PAGE_SIZE).contains(size))
            .ok_or_else(|| {
                ConnectClientError::Invalid(format!("page size must be between 1 and {MAX_PAGE_SIZE}"))
            })?;
        if config.timeout.is_zero() {
            return Err(ConnectClientError::Invalid("timeout must be non-zero".to_string()));
        }
        let runtime = Runtime::new().map_err(|err| ConnectClientError::Io(err.to_string()))?;
        let region = config.region.clone();
        let endpoint = config.endpoint_url.clone();
        let timeout = config.timeout;
        let shared_config = block_on_with_runtime(&runtime, async move {
            let mut loader = aws_config::defaults(BehaviorVersion::latest())
                .retry_config(RetryConfig::disabled())
                .timeout_config(TimeoutConfig::builder().operation_timeout(timeout).build());
            if let Some(region) = region {
                loader = loader.region(Region::new(region));
            }
            if let Some(endpoint) = endpoint {
                loader = loader.endpoint_url(endpoint);
            }
            Ok::<_, ConnectClientError>(loader.load().await)
        })?;
        Ok(Self {
            client: Client::new(&shared_config),
            page_size,
            runtime: Some(Arc::new(runtime)),
        })
    }

    /// Returns the runtime or an error if shut down.
    fn runtime(&self) -> Result<&Runtime, RemoteError> {
        self.runtime.as_ref().map(AsRef::as_ref).ok_or_else(|| {
            RemoteError::new(RemoteErrorKind::Transient, "connect runtime closed")
        })
    }
}

impl DirectoryClient for ConnectDirectoryClient {
    fn search_identity(
        &self,
        scope: &ScopeId,
        query: &str,
        page_token: Option<&str>,
    ) -> Result<CandidatePage, RemoteError> {
        let client = self.client.clone();
        let instance_id = scope.to_string();
        let criteria = UserSearchCriteria::builder()
            .string_condition(
                StringCondition::builder()
                    .field_name(USERNAME_FIELD)
                    .value(query)
                    .comparison_type(StringComparisonType::Exact)
                    .build(),
            )
            .build();
        let page_size = self.page_size;
        let token = page_token.map(str::to_string);
        block_on_with_runtime(self.runtime()?, async move {
            let output = client
                .search_users()
                .instance_id(instance_id)
                .max_results(page_size)
                .search_criteria(criteria)
                .set_next_token(token)
                .send()
                .await
                .map_err(|err| classify_sdk_error(Operation::Search, &err))?;
            let candidates = output
                .users()
                .iter()
                .map(|user| Candidate {
                    identity: user.username().map(str::to_string),
                    internal_id: user.id().map(str::to_string),
                })
                .collect();
            Ok(CandidatePage {
                candidates,
                next_token: output.next_token().map(str::to_string),
            })
        })
    }

    fn mutate_attribute(
        &self,
        scope: &ScopeId,
        internal_id: &InternalId,
        target: &TargetAttributeId,
    ) -> Result<(), RemoteError> {
        let client = self.client.clone();
        let instance_id = scope.to_string();
        let user_id = internal_id.to_string();
        let profile_id = target.to_string();
        block_on_with_runtime(self.runtime()?, async move {
            client
                .update_user_security_profiles()
                .instance_id(instance_id)
                .user_id(user_id)
                .security_profile_ids(profile_id)
                .send()
                .await
                .map_err(|err| classify_sdk_error(Operation::Update, &err))?;
            Ok(())
        })
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
