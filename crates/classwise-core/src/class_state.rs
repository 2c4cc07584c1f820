//! Everything the ensemble keeps for one class.

use serde::Serialize;

use crate::classifier::BinaryClassifier;
use crate::drift_test::test_due;
use crate::events::CheckOutcome;
use crate::reference::ReferenceSummary;
use crate::schema::{FeatureSchema, FeatureValue, Instance};
use crate::stats::quantile_sketch::QuantileSketch;
use crate::window::SlidingWindow;

/// Per-class model, window, reference and counters.
///
/// Created for every class when the stream header is known. A drift reset
/// replaces the contents, never the state itself.
#[derive(Debug)]
pub struct ClassState {
    class: usize,
    classifier: Box<dyn BinaryClassifier>,
    window: SlidingWindow,
    reference: ReferenceSummary,
    positive_seen: u64,
    negative_seen: u64,
    drifts: u64,
    last_check: Option<CheckOutcome>,
}

/// Read-only snapshot of one class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassSummary {
    pub class: usize,
    pub classifier: &'static str,
    pub positive_seen: u64,
    pub negative_seen: u64,
    pub window_len: usize,
    pub reference_absorbed: u64,
    pub drifts: u64,
    pub last_check: Option<CheckOutcome>,
}

/// Memory held by one class, in items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClassFootprint {
    pub window_len: usize,
    pub window_capacity: usize,
    pub sketch_items: usize,
    pub histogram_bins: usize,
}

impl ClassFootprint {
    /// Whether the footprint stays inside the static bound for this schema.
    #[must_use]
    pub fn within_bound(&self, schema: &FeatureSchema, sketch_k: usize) -> bool {
        self.window_len <= self.window_capacity
            && self.sketch_items
                <= schema
                    .numeric_indices()
                    .len()
                    .saturating_mul(QuantileSketch::retained_bound(sketch_k))
            && self.histogram_bins == schema.total_nominal_bins()
    }
}

impl ClassState {
    #[must_use]
    pub fn new(
        class: usize,
        classifier: Box<dyn BinaryClassifier>,
        schema: &FeatureSchema,
        window_size: usize,
        sketch_k: usize,
    ) -> Self {
        Self {
            class,
            classifier,
            window: SlidingWindow::new(window_size),
            reference: ReferenceSummary::new(schema, sketch_k),
            positive_seen: 0,
            negative_seen: 0,
            drifts: 0,
            last_check: None,
        }
    }

    #[must_use]
    pub fn class(&self) -> usize {
        self.class
    }

    #[must_use]
    pub fn classifier(&self) -> &dyn BinaryClassifier {
        self.classifier.as_ref()
    }

    #[must_use]
    pub fn window(&self) -> &SlidingWindow {
        &self.window
    }

    #[must_use]
    pub fn reference(&self) -> &ReferenceSummary {
        &self.reference
    }

    #[must_use]
    pub fn positive_seen(&self) -> u64 {
        self.positive_seen
    }

    #[must_use]
    pub fn negative_seen(&self) -> u64 {
        self.negative_seen
    }

    #[must_use]
    pub fn drifts(&self) -> u64 {
        self.drifts
    }

    #[must_use]
    pub fn last_check(&self) -> Option<CheckOutcome> {
        self.last_check
    }

    /// Probability of training this class on a negative under the balanced
    /// policy.
    #[must_use]
    pub fn balance_probability(&self) -> f64 {
        let denom = (self.positive_seen + self.negative_seen).max(1);
        self.positive_seen as f64 / denom as f64
    }

    pub fn train_positive(&mut self, features: &[FeatureValue]) {
        self.classifier.train(features, true);
        self.positive_seen += 1;
    }

    pub fn train_negative(&mut self, features: &[FeatureValue]) {
        self.classifier.train(features, false);
        self.negative_seen += 1;
    }

    /// Push a positive instance into the window, folding any eviction into
    /// the reference.
    pub fn observe(&mut self, schema: &FeatureSchema, instance: Instance) {
        if let Some(evicted) = self.window.push(instance) {
            self.reference.absorb(schema, &evicted);
        }
    }

    #[must_use]
    pub fn test_due(&self) -> bool {
        test_due(&self.window, &self.reference, self.positive_seen)
    }

    pub(crate) fn record_check(&mut self, outcome: CheckOutcome) {
        self.last_check = Some(outcome);
    }

    /// Clear the reference and reset the counters to the window length.
    /// Returns the window contents, newest first, leaving the window empty.
    pub(crate) fn begin_reset(&mut self) -> Vec<Instance> {
        self.reference.reset();
        let len = self.window.len() as u64;
        self.positive_seen = len;
        self.negative_seen = len;
        self.window.drain_newest_first().collect()
    }

    pub(crate) fn absorb_into_reference(&mut self, schema: &FeatureSchema, instance: &Instance) {
        self.reference.absorb(schema, instance);
    }

    pub(crate) fn finish_reset(&mut self, classifier: Box<dyn BinaryClassifier>) {
        self.classifier = classifier;
        self.drifts += 1;
    }

    #[must_use]
    pub fn summary(&self) -> ClassSummary {
        ClassSummary {
            class: self.class,
            classifier: self.classifier.name(),
            positive_seen: self.positive_seen,
            negative_seen: self.negative_seen,
            window_len: self.window.len(),
            reference_absorbed: self.reference.absorbed(),
            drifts: self.drifts,
            last_check: self.last_check,
        }
    }

    #[must_use]
    pub fn footprint(&self) -> ClassFootprint {
        let (sketch_items, histogram_bins) = self.reference.footprint();
        ClassFootprint {
            window_len: self.window.len(),
            window_capacity: self.window.capacity(),
            sketch_items,
            histogram_bins,
        }
    }
}
