//! # Binary Naive Bayes
//!
//! Two label slots (negative = 0, positive = 1), each holding a count plus
//! per-feature sufficient statistics:
//! - numeric: Welford running mean/variance, scored as a Gaussian;
//! - nominal: category counts, scored with Laplace smoothing
//!   `(count + 1) / (n + cardinality)`.
//!
//! Votes are the softmax of the per-slot log joint. A slot that has never
//! been trained scores probability zero; before any training at all the
//! learner returns an empty vote.

use std::f64::consts::PI;

use crate::schema::{FeatureKind, FeatureSchema, FeatureValue};

use super::BinaryClassifier;

/// Variance floor keeping single-valued features from collapsing the density.
const MIN_VARIANCE: f64 = 1e-6;

#[derive(Debug, Clone, Default)]
struct Welford {
    n: u64,
    mean: f64,
    m2: f64,
}

impl Welford {
    fn update(&mut self, x: f64) {
        self.n += 1;
        let delta = x - self.mean;
        self.mean += delta / self.n as f64;
        self.m2 += delta * (x - self.mean);
    }

    fn variance(&self) -> f64 {
        let raw = if self.n > 1 {
            self.m2 / (self.n - 1) as f64
        } else {
            0.0
        };
        raw.max(MIN_VARIANCE)
    }

    fn log_density(&self, x: f64) -> f64 {
        let var = self.variance();
        let diff = x - self.mean;
        -0.5 * (2.0 * PI * var).ln() - diff * diff / (2.0 * var)
    }
}

#[derive(Debug, Clone)]
enum FeatureStats {
    Numeric(Welford),
    Nominal(Vec<u64>),
}

#[derive(Debug, Clone)]
struct SlotStats {
    count: u64,
    features: Vec<FeatureStats>,
}

impl SlotStats {
    fn new(kinds: &[FeatureKind]) -> Self {
        Self {
            count: 0,
            features: kinds
                .iter()
                .map(|kind| match *kind {
                    FeatureKind::Numeric => FeatureStats::Numeric(Welford::default()),
                    FeatureKind::Nominal { cardinality } => {
                        FeatureStats::Nominal(vec![0; cardinality])
                    }
                })
                .collect(),
        }
    }

    fn update(&mut self, features: &[FeatureValue]) {
        self.count += 1;
        for (stats, value) in self.features.iter_mut().zip(features) {
            match (stats, *value) {
                (FeatureStats::Numeric(w), FeatureValue::Numeric(x)) => w.update(x),
                (FeatureStats::Nominal(counts), FeatureValue::Nominal(c)) => {
                    if let Some(slot) = counts.get_mut(c) {
                        *slot += 1;
                    }
                }
                _ => {}
            }
        }
    }

    fn log_likelihood(&self, features: &[FeatureValue]) -> f64 {
        self.features
            .iter()
            .zip(features)
            .map(|(stats, value)| match (stats, *value) {
                (FeatureStats::Numeric(w), FeatureValue::Numeric(x)) => w.log_density(x),
                (FeatureStats::Nominal(counts), FeatureValue::Nominal(c)) => {
                    let hits = counts.get(c).copied().unwrap_or(0);
                    ((hits + 1) as f64 / (self.count + counts.len() as u64) as f64).ln()
                }
                _ => 0.0,
            })
            .sum()
    }
}

/// Gaussian / multinomial naive Bayes over a fixed schema.
#[derive(Debug, Clone)]
pub struct NaiveBayes {
    kinds: Vec<FeatureKind>,
    slots: [SlotStats; 2],
}

impl NaiveBayes {
    #[must_use]
    pub fn new(schema: &FeatureSchema) -> Self {
        let kinds = schema.kinds().to_vec();
        let slots = [SlotStats::new(&kinds), SlotStats::new(&kinds)];
        Self { kinds, slots }
    }

    #[must_use]
    pub fn trained(&self) -> u64 {
        self.slots[0].count + self.slots[1].count
    }
}

impl BinaryClassifier for NaiveBayes {
    fn train(&mut self, features: &[FeatureValue], positive: bool) {
        self.slots[usize::from(positive)].update(features);
    }

    fn predict(&self, features: &[FeatureValue]) -> Vec<f64> {
        let total = self.trained();
        if total == 0 {
            return Vec::new();
        }
        let log_joint: Vec<f64> = self
            .slots
            .iter()
            .map(|slot| {
                if slot.count == 0 {
                    f64::NEG_INFINITY
                } else {
                    (slot.count as f64 / total as f64).ln() + slot.log_likelihood(features)
                }
            })
            .collect();
        let max = log_joint.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !max.is_finite() {
            return Vec::new();
        }
        let exp: Vec<f64> = log_joint.iter().map(|l| (l - max).exp()).collect();
        let sum: f64 = exp.iter().sum();
        exp.into_iter().map(|e| e / sum).collect()
    }

    fn fresh_copy(&self) -> Box<dyn BinaryClassifier> {
        Box::new(Self {
            kinds: self.kinds.clone(),
            slots: [SlotStats::new(&self.kinds), SlotStats::new(&self.kinds)],
        })
    }

    fn reset(&mut self) {
        self.slots = [SlotStats::new(&self.kinds), SlotStats::new(&self.kinds)];
    }

    fn name(&self) -> &'static str {
        "naive-bayes"
    }
}
