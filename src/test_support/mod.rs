//! Shared helpers for unit tests.

pub mod archive;
pub mod socket_guard;
