//! Infrastructure layer for the tau server.
//!
//! Contains OS-facing adapters: the TCP server and file-system storage.
//!
//! **Dependency rule**: this layer may depend on `application` and `tau_core`,
//! but MUST NOT be imported by the `application` layer.

pub mod network;
pub mod storage;
