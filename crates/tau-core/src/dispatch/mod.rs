//! Event dispatch: the application's [`EventHandler`] and the per-connection
//! plumbing that feeds it.
//!
//! # How a packet reaches the application (for beginners)
//!
//! ```text
//! socket bytes ──▶ Session::receive ──▶ StreamParser ──▶ decode_inbound
//!                                                            │
//!                         EventHandler::on_* ◀── EventDispatcher::dispatch
//! ```
//!
//! Everything here is synchronous and owned by exactly one connection, so
//! no locking is involved.

pub mod dispatcher;
pub mod handler;
pub mod session;

pub use dispatcher::{DispatchError, EventDispatcher};
pub use handler::{ConnectionInfo, EventHandler};
pub use session::{Session, SessionError};
