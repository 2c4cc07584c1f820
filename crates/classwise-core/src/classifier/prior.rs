use crate::schema::FeatureValue;

use super::BinaryClassifier;

/// Feature-blind learner voting the observed label frequencies.
#[derive(Debug, Clone, Default)]
pub struct PriorClassifier {
    positive: u64,
    negative: u64,
}

impl PriorClassifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl BinaryClassifier for PriorClassifier {
    fn train(&mut self, _features: &[FeatureValue], positive: bool) {
        if positive {
            self.positive += 1;
        } else {
            self.negative += 1;
        }
    }

    fn predict(&self, _features: &[FeatureValue]) -> Vec<f64> {
        let total = self.positive + self.negative;
        if total == 0 {
            return Vec::new();
        }
        let total = total as f64;
        vec![self.negative as f64 / total, self.positive as f64 / total]
    }

    fn fresh_copy(&self) -> Box<dyn BinaryClassifier> {
        Box::new(Self::new())
    }

    fn reset(&mut self) {
        *self = Self::new();
    }

    fn name(&self) -> &'static str {
        "prior"
    }
}
