//! CLI subcommands.

pub mod credentials;
pub mod migrate;
