//! Fresh Cart Core - Shared types library.
//!
//! This crate provides the domain types used across Fresh Cart components:
//! - `api` - The order REST API and its authentication gate
//! - `cli` - Command-line tools for migrations and credential checks
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, verified identities, quantities and amounts

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
