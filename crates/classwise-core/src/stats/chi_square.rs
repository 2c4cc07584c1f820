//! # Chi-Square Comparison of Category Counts
//!
//! Compares the category counts of a nominal feature in the recent window
//! (`observed`) against the counts absorbed by the reference summary
//! (`expected`). The two vectors have different totals, so the statistic is
//! the two-sample homogeneity form:
//!
//! ```text
//! w  = sqrt(ΣO / ΣE)
//! X² = Σ_i (O_i / w − E_i · w)² / (O_i + E_i)
//! ```
//!
//! which reduces to `Σ (O_i − E_i)² / (O_i + E_i)` when the totals agree.
//! The p-value is the upper tail of χ² with `categories − 1` degrees of
//! freedom.
//!
//! ## Validity guards
//!
//! 1. Categories where both counts are zero carry no information and are
//!    trimmed before anything else.
//! 2. Fewer than two surviving categories: no test.
//! 3. Any surviving category with an expected count below
//!    [`MIN_EXPECTED_COUNT`]: no test.

use statrs::distribution::{ChiSquared, ContinuousCDF};

use super::SkipReason;

/// Classical floor on expected cell counts for the χ² approximation.
pub const MIN_EXPECTED_COUNT: u64 = 5;

/// Count vectors after dropping categories that are zero on both sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrimmedCounts {
    pub observed: Vec<u64>,
    pub expected: Vec<u64>,
}

impl TrimmedCounts {
    #[must_use]
    pub fn categories(&self) -> usize {
        self.observed.len()
    }

    /// Apply the validity guards.
    pub fn admissible(&self) -> Result<(), SkipReason> {
        if self.categories() < 2 {
            return Err(SkipReason::TooFewCategories {
                remaining: self.categories(),
            });
        }
        if let Some(&expected) = self.expected.iter().find(|&&e| e < MIN_EXPECTED_COUNT) {
            return Err(SkipReason::SparseExpected { expected });
        }
        if self.observed.iter().all(|&o| o == 0) {
            return Err(SkipReason::EmptyWindow);
        }
        Ok(())
    }
}

/// Outcome of one χ² comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChiSquareOutcome {
    pub statistic: f64,
    pub degrees_of_freedom: usize,
    pub p_value: f64,
}

/// Drop categories where both `observed` and `expected` are zero.
///
/// Both slices are read pairwise; a length mismatch truncates to the shorter.
#[must_use]
pub fn trim_unobserved(observed: &[u64], expected: &[u64]) -> TrimmedCounts {
    let (observed, expected) = observed
        .iter()
        .zip(expected)
        .filter(|&(&o, &e)| o != 0 || e != 0)
        .map(|(&o, &e)| (o, e))
        .unzip();
    TrimmedCounts { observed, expected }
}

/// Homogeneity statistic over already-trimmed counts.
#[must_use]
pub fn homogeneity_statistic(counts: &TrimmedCounts) -> f64 {
    let sum_observed: u64 = counts.observed.iter().sum();
    let sum_expected: u64 = counts.expected.iter().sum();
    if sum_observed == 0 || sum_expected == 0 {
        return 0.0;
    }
    let equal_totals = sum_observed == sum_expected;
    let weight = (sum_observed as f64 / sum_expected as f64).sqrt();
    counts
        .observed
        .iter()
        .zip(&counts.expected)
        .map(|(&o, &e)| {
            let (o, e) = (o as f64, e as f64);
            let dev = if equal_totals {
                o - e
            } else {
                o / weight - e * weight
            };
            dev * dev / (o + e)
        })
        .sum()
}

/// Upper-tail χ² probability.
pub fn chi_square_p_value(statistic: f64, degrees_of_freedom: usize) -> Result<f64, SkipReason> {
    let dist = ChiSquared::new(degrees_of_freedom as f64).map_err(|_| SkipReason::Distribution)?;
    Ok(dist.sf(statistic).clamp(0.0, 1.0))
}

/// Trim, guard and test `observed` against `expected`.
pub fn chi_square_test(observed: &[u64], expected: &[u64]) -> Result<ChiSquareOutcome, SkipReason> {
    let trimmed = trim_unobserved(observed, expected);
    trimmed.admissible()?;
    let statistic = homogeneity_statistic(&trimmed);
    let degrees_of_freedom = trimmed.categories() - 1;
    let p_value = chi_square_p_value(statistic, degrees_of_freedom)?;
    Ok(ChiSquareOutcome {
        statistic,
        degrees_of_freedom,
        p_value,
    })
}
