//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module handles:
//!
//! - Reading the TOML configuration file from the platform-appropriate directory.
//! - Writing a configuration back to disk (`--write-config`).
//! - Providing defaults when the file does not exist yet (first run).

pub mod config;
