//! # Plan Tools
//!
//! Command-line tooling around the economy planner:
//! - Scenario files (RON) and their validation
//! - Plan reports in text, JSON and RON
//! - Parallel batch planning over scenario directories

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod batch;
pub mod report;
pub mod scenario;
