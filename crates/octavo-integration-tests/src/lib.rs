//! Integration test crate for Octavo.
//!
//! This crate has no library code — it only contains integration tests
//! that exercise end-to-end reading flows across multiple workspace crates.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p octavo-integration-tests
//! ```
