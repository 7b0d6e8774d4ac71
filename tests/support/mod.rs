//! Helpers shared with the library's unit tests; one copy lives in
//! `src/test_support/`.

#![allow(dead_code)]

#[path = "../../src/test_support/archive.rs"]
pub mod archive;
#[path = "../../src/test_support/socket_guard.rs"]
pub mod socket_guard;
