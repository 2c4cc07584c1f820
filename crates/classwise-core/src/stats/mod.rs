//! Statistical kernels behind the per-class drift test.
//!
//! Each kernel is a pure function or a self-contained summary. None of them
//! know about classes or windows; the drift test wires them together.

pub mod by_correction;
pub mod chi_square;
pub mod ks;
pub mod quantile_sketch;

use serde::Serialize;

/// Why a per-feature test produced no p-value.
///
/// A skipped feature contributes no evidence; it is never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// The reference side has absorbed no observations for this feature.
    EmptyReference,
    /// The window side holds no observations.
    EmptyWindow,
    /// Fewer than two categories survive zero-trimming.
    TooFewCategories { remaining: usize },
    /// A surviving category has a reference count below the validity floor.
    SparseExpected { expected: u64 },
    /// The reference distribution could not be constructed.
    Distribution,
}
