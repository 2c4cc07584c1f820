//! Drift-triggered rebuild of one class.
//!
//! ## Procedure
//!
//! 1. Clear the class's reference sketches and histograms.
//! 2. Set its positive and negative counters to the window length.
//! 3. Mint an untrained learner with the same configuration.
//! 4. Drain the window newest to oldest. Each drained instance trains the
//!    new learner as a positive, then one negative class is drawn uniformly
//!    among the other classes; if that class's window is non-empty, a
//!    uniformly chosen instance from it trains the new learner as a
//!    negative. The drained instance is folded into the fresh reference.
//! 5. Install the new learner and bump the class's drift counter.
//!
//! The window is empty afterwards, so the next check waits for W fresh
//! positives.

use rand::Rng;
use serde::Serialize;

use crate::class_state::ClassState;
use crate::schema::FeatureSchema;

/// What one rebuild consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RetrainOutcome {
    pub retrained_on: usize,
    pub negatives_trained: usize,
    /// Draws that landed on a class with an empty window.
    pub negatives_skipped: usize,
}

/// Uniform class in `0..num_classes` other than `source`.
///
/// Callers guarantee `num_classes >= 2` and `source < num_classes`.
pub fn draw_negative_class<R: Rng + ?Sized>(source: usize, num_classes: usize, rng: &mut R) -> usize {
    let r = rng.gen_range(0..num_classes - 1);
    if r >= source { r + 1 } else { r }
}

/// Rebuild class `target` from its window plus resampled negatives.
pub fn retrain_class<R: Rng + ?Sized>(
    states: &mut [ClassState],
    target: usize,
    schema: &FeatureSchema,
    rng: &mut R,
) -> RetrainOutcome {
    let num_classes = states.len();
    let drained = states[target].begin_reset();
    let mut fresh = states[target].classifier().fresh_copy();
    let mut outcome = RetrainOutcome {
        retrained_on: drained.len(),
        negatives_trained: 0,
        negatives_skipped: 0,
    };

    for instance in &drained {
        fresh.train(instance.features(), true);

        let other = draw_negative_class(target, num_classes, rng);
        let window = states[other].window();
        if window.is_empty() {
            outcome.negatives_skipped += 1;
        } else if let Some(negative) = window.get(rng.gen_range(0..window.len())) {
            fresh.train(negative.features(), false);
            outcome.negatives_trained += 1;
        }

        states[target].absorb_into_reference(schema, instance);
    }

    states[target].finish_reset(fresh);
    outcome
}
