//! Shared test utilities for docpack integration tests.
//!
//! - `TestHarness` for isolated runs with temp directories and a fake converter
//! - `BatchBuilder` for assembling import lists programmatically

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::TestHarness;
