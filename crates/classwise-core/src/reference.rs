//! Long-running summary of a class's evicted instances.
//!
//! One quantile sketch per numeric feature and one exact histogram per
//! nominal feature, both in schema order. Mass only grows until a drift
//! reset clears it.

use crate::schema::{FeatureSchema, Instance};
use crate::stats::quantile_sketch::QuantileSketch;

#[derive(Debug, Clone)]
pub struct ReferenceSummary {
    sketches: Vec<QuantileSketch>,
    histograms: Vec<Vec<u64>>,
    absorbed: u64,
}

impl ReferenceSummary {
    #[must_use]
    pub fn new(schema: &FeatureSchema, sketch_k: usize) -> Self {
        Self {
            sketches: schema
                .numeric_indices()
                .iter()
                .map(|_| QuantileSketch::new(sketch_k))
                .collect(),
            histograms: schema
                .nominal_features()
                .iter()
                .map(|&(_, cardinality)| vec![0; cardinality])
                .collect(),
            absorbed: 0,
        }
    }

    /// Fold one instance's feature values into the summary.
    ///
    /// The instance must already have been checked against `schema`.
    pub fn absorb(&mut self, schema: &FeatureSchema, instance: &Instance) {
        for (sketch, &idx) in self.sketches.iter_mut().zip(schema.numeric_indices()) {
            if let Some(v) = instance.numeric_at(idx) {
                sketch.update(v);
            }
        }
        for (hist, &(idx, _)) in self.histograms.iter_mut().zip(schema.nominal_features()) {
            if let Some(slot) = instance.nominal_at(idx).and_then(|c| hist.get_mut(c)) {
                *slot += 1;
            }
        }
        self.absorbed += 1;
    }

    /// Clear all mass, keeping shapes.
    pub fn reset(&mut self) {
        for sketch in &mut self.sketches {
            sketch.reset();
        }
        for hist in &mut self.histograms {
            hist.fill(0);
        }
        self.absorbed = 0;
    }

    /// Instances absorbed since creation or the last reset.
    #[must_use]
    pub fn absorbed(&self) -> u64 {
        self.absorbed
    }

    /// Sketch for the `pos`-th numeric feature.
    #[must_use]
    pub fn sketch(&self, pos: usize) -> Option<&QuantileSketch> {
        self.sketches.get(pos)
    }

    /// Histogram for the `pos`-th nominal feature.
    #[must_use]
    pub fn histogram(&self, pos: usize) -> Option<&[u64]> {
        self.histograms.get(pos).map(Vec::as_slice)
    }

    /// `(sketch items retained, histogram bins)`.
    #[must_use]
    pub fn footprint(&self) -> (usize, usize) {
        (
            self.sketches.iter().map(QuantileSketch::retained).sum(),
            self.histograms.iter().map(Vec::len).sum(),
        )
    }
}
