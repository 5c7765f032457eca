//! Network infrastructure for the tau server.
//!
//! # Sub-modules
//!
//! - **`server`** – Accepts renderer TCP connections and runs one
//!   [`tau_core::Session`] per connection, with a writer task that drains the
//!   packets the handler sends.

pub mod server;

pub use server::{run_server, serve, serve_connection, ChannelSink};
