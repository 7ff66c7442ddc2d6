//! # Plan Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Scenario fixtures
//! - Plan replay checker
//! - Determinism test harness
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;
pub mod replay;

/// Re-export proptest for convenience.
pub use proptest;
