// crates/profile-updater-connect/src/classify.rs
// ============================================================================
// Module: Remote Error Classification
// Description: Maps SDK failures onto the remote error taxonomy.
// Purpose: Decide retry behavior from error codes, statuses, and transport.
// Dependencies: aws-sdk-connect, profile-updater-core
// ============================================================================

//! ## Overview
//! Error codes take precedence over HTTP statuses. A status is only
//! consulted when the code is missing or unrecognized.

// ============================================================================
// SECTION: Imports
// ============================================================================

use aws_sdk_connect::config::http::HttpResponse;
use aws_sdk_connect::error::DisplayErrorContext;
use aws_sdk_connect::error::ProvideErrorMetadata;
use aws_sdk_connect::error::SdkError;
use profile_updater_core::RemoteError;
use profile_updater_core::RemoteErrorKind;

// ============================================================================
// SECTION: Code Tables
// ============================================================================

/// Codes signalling throttling.
const THROTTLE_CODES: &[&str] = &[
    "ThrottlingException",
    "Throttling",
    "TooManyRequestsException",
    "RequestLimitExceeded",
    "ProvisionedThroughputExceededException",
];

/// Codes signalling a temporary service-side failure.
const TRANSIENT_CODES: &[&str] = &[
    "InternalServiceException",
    "InternalFailure",
    "InternalServerError",
    "ServiceUnavailableException",
    "ServiceUnavailable",
    "RequestTimeout",
    "RequestTimeoutException",
];

/// Codes signalling refused credentials or permissions.
const DENIED_CODES: &[&str] = &[
    "AccessDeniedException",
    "UnauthorizedException",
    "UnrecognizedClientException",
    "InvalidClientTokenId",
    "ExpiredToken",
    "ExpiredTokenException",
    "InvalidSignatureException",
    "SignatureDoesNotMatch",
    "MissingAuthenticationToken",
];

/// Codes signalling a request the service will never accept.
const REJECTED_CODES: &[&str] = &[
    "InvalidParameterException",
    "InvalidRequestException",
    "LimitExceededException",
    "ValidationException",
    "DuplicateResourceException",
];

/// Code returned for a missing instance, user, or profile.
const NOT_FOUND_CODE: &str = "ResourceNotFoundException";

// ============================================================================
// SECTION: Classification
// ============================================================================

/// Remote operation being classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// User search within an instance.
    Search,
    /// Security profile assignment.
    Update,
}

/// Classifies a service error from its code and HTTP status.
///
/// A missing resource during search means the instance itself is unknown;
/// during an update it means the user or profile id was not accepted.
#[must_use]
pub fn classify_code(operation: Operation, code: Option<&str>, status: Option<u16>) -> RemoteErrorKind {
    if let Some(code) = code {
        if THROTTLE_CODES.contains(&code) {
            return RemoteErrorKind::Throttled;
        }
        if TRANSIENT_CODES.contains(&code) {
            return RemoteErrorKind::Transient;
        }
        if DENIED_CODES.contains(&code) {
            return RemoteErrorKind::Unauthorized;
        }
        if code == NOT_FOUND_CODE {
            return match operation {
                Operation::Search => RemoteErrorKind::ScopeNotFound,
                Operation::Update => RemoteErrorKind::Rejected,
            };
        }
        if REJECTED_CODES.contains(&code) {
            return RemoteErrorKind::Rejected;
        }
    }
    match status {
        Some(429) => RemoteErrorKind::Throttled,
        Some(401 | 403) => RemoteErrorKind::Unauthorized,
        Some(500 ..= 599) => RemoteErrorKind::Transient,
        _ => RemoteErrorKind::Service,
    }
}

/// Converts an SDK failure into a classified remote error.
pub(crate) fn classify_sdk_error<E>(
    operation: Operation,
    error: &SdkError<E, HttpResponse>,
) -> RemoteError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let message = DisplayErrorContext(error).to_string();
    let kind = match error {
        SdkError::TimeoutError(_) => RemoteErrorKind::Transient,
        SdkError::DispatchFailure(_) => dispatch_failure_kind(&message),
        SdkError::ConstructionFailure(_) => RemoteErrorKind::Rejected,
        SdkError::ResponseError(context) => {
            classify_code(operation, None, Some(context.raw().status().as_u16()))
        }
        SdkError::ServiceError(context) => {
            classify_code(operation, error.code(), Some(context.raw().status().as_u16()))
        }
        _ => RemoteErrorKind::Service,
    };
    RemoteError::new(kind, message)
}

/// Dispatch failures are transport problems unless credentials never resolved.
fn dispatch_failure_kind(message: &str) -> RemoteErrorKind {
    if message.to_ascii_lowercase().contains("credential") {
        RemoteErrorKind::Unauthorized
    } else {
        RemoteErrorKind::Transient
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
