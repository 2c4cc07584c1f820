//! Scenario harness for the classwise drift engine.
//!
//! This crate provides:
//! - Scenario streams: seeded Gaussian class streams with scheduled shifts
//! - Prequential runner: test-then-train evaluation over a stream
//! - Structured logging: JSONL log records, validation and artifact index
//! - Reports: machine-readable JSON and human-readable markdown summaries

#![forbid(unsafe_code)]

pub mod error;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod structured_log;

pub use error::HarnessError;
pub use report::RunReport;
pub use runner::{PrequentialRunner, load_config};
pub use scenario::{ClassShift, GaussianClassStream, ScenarioSpec};
