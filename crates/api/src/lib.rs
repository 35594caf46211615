//! Fresh Cart order API library.
//!
//! The binary in `main.rs` wires these modules to the environment. Everything
//! it serves is built here so it can be tested without a network or database.
//!
//! # Modules
//!
//! - `identity` - Service-credential loading and Firebase ID token verification
//! - `middleware` - Auth gate, CORS, request IDs, security headers
//! - `routes` - Health, auth status and order endpoints
//! - `services` / `db` / `models` - Orders and their persistence

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod identity;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub use app::app;
