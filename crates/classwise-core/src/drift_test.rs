//! Per-class drift test battery.
//!
//! Compares the class's recent window against its reference summary one
//! feature at a time:
//! - numeric features: KS distance between a sketch of the window values
//!   and the reference sketch (`stats::ks`);
//! - nominal features: χ² homogeneity of window counts against reference
//!   counts (`stats::chi_square`), skipped when the validity guards fail.
//!
//! The surviving p-values are handed to the BY aggregator by the caller.
//!
//! ## Cadence
//!
//! A class is tested only when its window is full, its reference has
//! absorbed at least one window's worth of instances, and its positive
//! count has just reached a multiple of the window size. This bounds the
//! cost to one battery per W positives and guarantees the reference is a
//! meaningfully sized baseline.

use serde::Serialize;

use crate::reference::ReferenceSummary;
use crate::schema::FeatureSchema;
use crate::stats::SkipReason;
use crate::stats::chi_square::chi_square_test;
use crate::stats::ks::ks_test;
use crate::stats::quantile_sketch::QuantileSketch;
use crate::window::SlidingWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TestMethod {
    KolmogorovSmirnov,
    ChiSquare,
}

/// One admissible per-feature test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureTest {
    pub feature: usize,
    pub method: TestMethod,
    pub statistic: f64,
    pub p_value: f64,
}

/// One feature that produced no evidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SkippedFeature {
    pub feature: usize,
    #[serde(flatten)]
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DriftTestReport {
    pub tests: Vec<FeatureTest>,
    pub skipped: Vec<SkippedFeature>,
}

impl DriftTestReport {
    #[must_use]
    pub fn p_values(&self) -> Vec<f64> {
        self.tests.iter().map(|t| t.p_value).collect()
    }

    #[must_use]
    pub fn admissible(&self) -> usize {
        self.tests.len()
    }
}

/// Whether a class with this state is due for a battery.
#[must_use]
pub fn test_due(window: &SlidingWindow, reference: &ReferenceSummary, positive_seen: u64) -> bool {
    let w = window.capacity() as u64;
    window.is_full()
        && reference.absorbed() >= w
        && positive_seen > 0
        && positive_seen % w == 0
}

/// Run every per-feature test for one class.
#[must_use]
pub fn run_battery(
    schema: &FeatureSchema,
    window: &SlidingWindow,
    reference: &ReferenceSummary,
) -> DriftTestReport {
    let mut report = DriftTestReport::default();
    let window_k = window.capacity();

    for (pos, &feature) in schema.numeric_indices().iter().enumerate() {
        let Some(ref_sketch) = reference.sketch(pos) else {
            continue;
        };
        if ref_sketch.is_empty() {
            report.skipped.push(SkippedFeature {
                feature,
                reason: SkipReason::EmptyReference,
            });
            continue;
        }
        let window_sketch =
            QuantileSketch::from_values(window_k, window.iter().filter_map(|i| i.numeric_at(feature)));
        match ks_test(ref_sketch, &window_sketch) {
            Some(out) => report.tests.push(FeatureTest {
                feature,
                method: TestMethod::KolmogorovSmirnov,
                statistic: out.statistic,
                p_value: out.p_value,
            }),
            None => report.skipped.push(SkippedFeature {
                feature,
                reason: SkipReason::EmptyWindow,
            }),
        }
    }

    for (pos, &(feature, cardinality)) in schema.nominal_features().iter().enumerate() {
        let Some(expected) = reference.histogram(pos) else {
            continue;
        };
        let mut observed = vec![0u64; cardinality];
        for category in window.iter().filter_map(|i| i.nominal_at(feature)) {
            if let Some(slot) = observed.get_mut(category) {
                *slot += 1;
            }
        }
        match chi_square_test(&observed, expected) {
            Ok(out) => report.tests.push(FeatureTest {
                feature,
                method: TestMethod::ChiSquare,
                statistic: out.statistic,
                p_value: out.p_value,
            }),
            Err(reason) => report.skipped.push(SkippedFeature { feature, reason }),
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FeatureKind, FeatureValue, Instance};

    fn schema() -> FeatureSchema {
        FeatureSchema::new(vec![
            FeatureKind::Numeric,
            FeatureKind::Nominal { cardinality: 4 },
        ])
        .unwrap()
    }

    fn inst(v: f64, cat: usize) -> Instance {
        Instance::new(vec![FeatureValue::Numeric(v), FeatureValue::Nominal(cat)], 0)
    }

    fn filled(
        s: &FeatureSchema,
        w: usize,
        history: impl Fn(usize) -> Instance,
        recent: impl Fn(usize) -> Instance,
    ) -> (SlidingWindow, ReferenceSummary) {
        let mut window = SlidingWindow::new(w);
        let mut reference = ReferenceSummary::new(s, 64);
        for i in 0..4 * w {
            if let Some(old) = window.push(history(i)) {
                reference.absorb(s, &old);
            }
        }
        for i in 0..w {
            if let Some(old) = window.push(recent(i)) {
                reference.absorb(s, &old);
            }
        }
        (window, reference)
    }

    #[test]
    fn stable_class_yields_large_p_values() {
        let s = schema();
        let (window, reference) = filled(
            &s,
            40,
            |i| inst((i % 40) as f64, i % 4),
            |i| inst((i % 40) as f64, i % 4),
        );
        let report = run_battery(&s, &window, &reference);
        assert_eq!(report.admissible(), 2);
        assert!(report.p_values().iter().all(|&p| p > 0.5), "{report:?}");
    }

    #[test]
    fn shifted_class_yields_small_p_values() {
        let s = schema();
        let (window, reference) = filled(
            &s,
            40,
            |i| inst((i % 40) as f64, i % 4),
            |i| inst(100.0 + (i % 40) as f64, 0),
        );
        let report = run_battery(&s, &window, &reference);
        assert_eq!(report.admissible(), 2);
        assert!(report.p_values().iter().all(|&p| p < 1e-6), "{report:?}");
        assert_eq!(report.tests[0].method, TestMethod::KolmogorovSmirnov);
        assert_eq!(report.tests[1].method, TestMethod::ChiSquare);
    }

    #[test]
    fn sparse_categories_are_skipped_not_failed() {
        let s = schema();
        // Reference sees category 3 only twice.
        let (window, reference) = filled(
            &s,
            20,
            |i| inst(i as f64, if i == 0 || i == 1 { 3 } else { i % 3 }),
            |i| inst(i as f64, i % 3),
        );
        let report = run_battery(&s, &window, &reference);
        assert_eq!(report.admissible(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].feature, 1);
        assert!(matches!(
            report.skipped[0].reason,
            SkipReason::SparseExpected { .. }
        ));
    }

    #[test]
    fn empty_reference_skips_numeric_feature() {
        let s = schema();
        let mut window = SlidingWindow::new(5);
        for i in 0..5 {
            window.push(inst(i as f64, 0));
        }
        let reference = ReferenceSummary::new(&s, 16);
        let report = run_battery(&s, &window, &reference);
        assert_eq!(
            report.skipped[0],
            SkippedFeature {
                feature: 0,
                reason: SkipReason::EmptyReference
            }
        );
        assert_eq!(report.admissible(), 0);
    }

    #[test]
    fn cadence_requires_full_window_baseline_and_multiple() {
        let s = schema();
        let mut window = SlidingWindow::new(4);
        let mut reference = ReferenceSummary::new(&s, 16);
        assert!(!test_due(&window, &reference, 4));
        for i in 0..4 {
            window.push(inst(i as f64, 0));
        }
        assert!(!test_due(&window, &reference, 4), "reference too small");
        for i in 0..4 {
            reference.absorb(&s, &inst(i as f64, 0));
        }
        assert!(test_due(&window, &reference, 8));
        assert!(!test_due(&window, &reference, 9));
        assert!(!test_due(&window, &reference, 0));
    }
}
