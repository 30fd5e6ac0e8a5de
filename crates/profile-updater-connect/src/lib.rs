// crates/profile-updater-connect/src/lib.rs
// ============================================================================
// Module: Profile Updater Connect Library
// Description: Amazon Connect implementation of the directory client.
// Purpose: Bridge the async AWS SDK to the synchronous batch engine.
// Dependencies: aws-config, aws-sdk-connect, profile-updater-core, tokio
// ============================================================================

//! ## Overview
//! [`ConnectDirectoryClient`] implements
//! [`profile_updater_core::DirectoryClient`] on top of `SearchUsers` and
//! `UpdateUserSecurityProfiles`. SDK-level retries are disabled so the
//! core rate-limited caller is the only retry authority; every SDK failure
//! is classified into a [`profile_updater_core::RemoteErrorKind`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod classify;
pub mod client;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use classify::Operation;
pub use classify::classify_code;
pub use client::ConnectClientConfig;
pub use client::ConnectClientError;
pub use client::ConnectDirectoryClient;
