//! # Benjamini–Yekutieli Step-Up Aggregation
//!
//! Turns the per-feature p-values of one drift check into a single
//! drift/no-drift decision while controlling the false discovery rate under
//! arbitrary dependence between features.
//!
//! ## Procedure (Benjamini & Yekutieli, 2001)
//!
//! For m p-values sorted ascending `p_(1) ≤ … ≤ p_(m)`:
//!
//! ```text
//! c(m) = Σ_{i=1..m} 1/i
//! k*   = max { i : p_(i) ≤ (i / m) · α / c(m) }
//! ```
//!
//! All hypotheses of rank ≤ k* are rejected. The class is declared drifted
//! iff k* exists. Equivalently, drift iff
//! `min_i c(m) · (m / i) · p_(i) ≤ α`, so a scan from either end of the sorted
//! list that stops at the first qualifying rank reaches the same verdict.
//!
//! ## Monotonicity
//!
//! For a fixed m, lowering any p-value never removes a rejection. Appending
//! a new p-value raises c(m) and m, which can tighten every threshold; only
//! a new p-value at or below `α / (m' · c(m'))` is guaranteed to keep a
//! drift verdict.

use serde::Serialize;

use crate::error::ConfigError;

/// Verdict and bookkeeping for one aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AggregateDecision {
    pub drift: bool,
    /// Number of p-values aggregated.
    pub tests: usize,
    /// Largest qualifying rank k* (0 when none qualifies).
    pub rejected: usize,
    /// Smallest BY-adjusted p-value, capped at 1.
    pub min_adjusted_p: f64,
}

impl AggregateDecision {
    fn no_evidence() -> Self {
        Self {
            drift: false,
            tests: 0,
            rejected: 0,
            min_adjusted_p: 1.0,
        }
    }
}

/// `H(m) = Σ_{i=1..m} 1/i`.
#[must_use]
pub fn harmonic_number(m: usize) -> f64 {
    (1..=m).map(|i| 1.0 / i as f64).sum()
}

/// BY step-up aggregator at a fixed significance level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BenjaminiYekutieli {
    alpha: f64,
}

impl BenjaminiYekutieli {
    pub fn new(alpha: f64) -> Result<Self, ConfigError> {
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(ConfigError::Alpha(alpha));
        }
        Ok(Self { alpha })
    }

    #[must_use]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Aggregate `p_values`. An empty list is no evidence, not drift.
    #[must_use]
    pub fn decide(&self, p_values: &[f64]) -> AggregateDecision {
        if p_values.is_empty() {
            return AggregateDecision::no_evidence();
        }
        let mut sorted: Vec<f64> = p_values
            .iter()
            .map(|&p| if p.is_nan() { 1.0 } else { p.clamp(0.0, 1.0) })
            .collect();
        sorted.sort_by(f64::total_cmp);

        let m = sorted.len();
        let c = harmonic_number(m);
        let mut rejected = 0;
        let mut min_adjusted_p = 1.0f64;
        for (idx, &p) in sorted.iter().enumerate() {
            let rank = idx + 1;
            if p <= rank as f64 / m as f64 * self.alpha / c {
                rejected = rank;
            }
            min_adjusted_p = min_adjusted_p.min(c * m as f64 / rank as f64 * p);
        }
        AggregateDecision {
            drift: rejected > 0,
            tests: m,
            rejected,
            min_adjusted_p,
        }
    }
}
