// crates/profile-updater-config/src/lib.rs
// ============================================================================
// Module: Profile Updater Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for profile-updater.toml semantics.
// Dependencies: profile-updater-core, serde, toml
// ============================================================================

//! ## Overview
//! `profile-updater-config` defines the configuration model for the bulk
//! profile updater. Loading is strict and fail-closed: unknown keys, values
//! out of range, and oversized or non-UTF-8 files are rejected before any
//! remote call is made.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
