//! Service library for the QuickEats order API.
//!
//! Exposes the HTTP server and handler modules so integration tests can
//! drive a real listener; the `quickeats` binary wires these together with
//! configuration and a storage backend.

pub mod apis;
pub mod server;
