//! # One-vs-Rest Ensemble Controller
//!
//! Owns one [`ClassState`] per class and drives the per-instance loop:
//!
//! ```text
//! train(x, d):
//!   validate x against the schema and d against the class count
//!   train class d positive
//!   for d' != d: train d' negative (always, or with probability
//!                pos[d'] / max(pos[d'] + neg[d'], 1) when balanced)
//!   push x into d's window, folding any eviction into d's reference
//!   if d is due: test battery -> BY decision -> on drift, rebuild d
//! ```
//!
//! ## Key Invariants
//!
//! - A rejected instance leaves every counter, window and RNG untouched.
//! - Window length never exceeds W; reference mass only shrinks on reset.
//! - No decision is made on fewer than `min_feature_tests` admissible
//!   tests or with fewer than W absorbed reference observations.
//! - All randomness comes from one seeded ChaCha8 stream, so a run is
//!   reproducible from its configuration and input order.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::class_state::{ClassFootprint, ClassState, ClassSummary};
use crate::config::EnsembleConfig;
use crate::drift_test::{DriftTestReport, run_battery};
use crate::error::EnsembleError;
use crate::events::{CheckOutcome, EngineEvent, EventLog};
use crate::retrain::{RetrainOutcome, retrain_class};
use crate::schema::{FeatureValue, Instance, StreamHeader, StreamSource};
use crate::stats::by_correction::{AggregateDecision, BenjaminiYekutieli};

/// What one `train` call did beyond plain training.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrainOutcome {
    pub step: u64,
    /// Present when the true class was due for a drift check.
    pub check: Option<CheckOutcome>,
    /// Present when the check declared drift and the class was rebuilt.
    pub retrain: Option<RetrainOutcome>,
}

impl TrainOutcome {
    #[must_use]
    pub fn drifted(&self) -> bool {
        self.retrain.is_some()
    }
}

/// Snapshot of the whole ensemble.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnsembleSummary {
    pub steps: u64,
    pub drift_count: u64,
    pub events_dropped: u64,
    pub classes: Vec<ClassSummary>,
}

/// Divide by the sum when it is positive, otherwise spread uniformly.
#[must_use]
pub fn normalize_scores(raw: &[f64]) -> Vec<f64> {
    let sum: f64 = raw.iter().sum();
    if sum > 0.0 {
        raw.iter().map(|s| s / sum).collect()
    } else {
        vec![1.0 / raw.len() as f64; raw.len()]
    }
}

/// Positive-slot score from a raw `[negative, positive]` vote.
fn positive_score(votes: &[f64]) -> f64 {
    if votes.len() < 2 {
        return 0.0;
    }
    let sum = votes[0] + votes[1];
    if sum > 0.0 && sum.is_finite() {
        votes[1] / sum
    } else {
        0.0
    }
}

#[derive(Debug)]
pub struct EnsembleController {
    config: EnsembleConfig,
    header: StreamHeader,
    classes: Vec<ClassState>,
    aggregator: BenjaminiYekutieli,
    rng: ChaCha8Rng,
    events: EventLog,
    steps: u64,
    drift_count: u64,
}

impl EnsembleController {
    /// Validate `config` against `header` and build one untrained class
    /// state per class.
    pub fn new(config: EnsembleConfig, header: StreamHeader) -> Result<Self, EnsembleError> {
        config.validate(header.num_classes)?;
        let aggregator = BenjaminiYekutieli::new(config.alpha)?;
        let classes = (0..header.num_classes)
            .map(|class| {
                ClassState::new(
                    class,
                    config.classifier.build(&header.schema),
                    &header.schema,
                    config.window_size,
                    config.sketch_k,
                )
            })
            .collect();
        Ok(Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            events: EventLog::new(config.event_capacity),
            config,
            header,
            classes,
            aggregator,
            steps: 0,
            drift_count: 0,
        })
    }

    /// Build from the header a source announces.
    pub fn for_source<S: StreamSource + ?Sized>(
        config: EnsembleConfig,
        source: &S,
    ) -> Result<Self, EnsembleError> {
        Self::new(config, source.header())
    }

    #[must_use]
    pub fn config(&self) -> &EnsembleConfig {
        &self.config
    }

    #[must_use]
    pub fn header(&self) -> &StreamHeader {
        &self.header
    }

    #[must_use]
    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    /// Labeled instances accepted so far.
    #[must_use]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    fn check_features(&self, features: &[FeatureValue]) -> Result<(), EnsembleError> {
        self.header.schema.check(features)
    }

    /// Learn from one labeled instance.
    pub fn train(&mut self, instance: &Instance) -> Result<TrainOutcome, EnsembleError> {
        self.check_features(instance.features())?;
        let label = instance.label();
        if label >= self.classes.len() {
            return Err(EnsembleError::Label {
                label,
                num_classes: self.classes.len(),
            });
        }
        self.steps += 1;

        let features = instance.features();
        self.classes[label].train_positive(features);
        for other in 0..self.classes.len() {
            if other == label {
                continue;
            }
            let train = if self.config.balance {
                let p = self.classes[other].balance_probability();
                self.rng.gen_bool(p)
            } else {
                true
            };
            if train {
                self.classes[other].train_negative(features);
            }
        }

        self.classes[label].observe(&self.header.schema, instance.clone());

        let mut outcome = TrainOutcome {
            step: self.steps,
            check: None,
            retrain: None,
        };
        if self.classes[label].test_due() {
            let check = self.check_class(label);
            outcome.check = Some(check);
            if check == CheckOutcome::Drift {
                outcome.retrain = Some(self.reset_class(label));
            }
        }
        Ok(outcome)
    }

    /// Run the test battery for `class` and aggregate it.
    fn check_class(&mut self, class: usize) -> CheckOutcome {
        let state = &self.classes[class];
        let report: DriftTestReport =
            run_battery(&self.header.schema, state.window(), state.reference());
        let decision: AggregateDecision = self.aggregator.decide(&report.p_values());
        let outcome = if report.admissible() < self.config.min_feature_tests {
            CheckOutcome::InsufficientEvidence
        } else if decision.drift {
            CheckOutcome::Drift
        } else {
            CheckOutcome::Stable
        };
        self.events.push(EngineEvent::DriftCheck {
            step: self.steps,
            class,
            positive_seen: state.positive_seen(),
            tests: report.admissible(),
            skipped: report.skipped.len(),
            rejected: decision.rejected,
            min_adjusted_p: decision.min_adjusted_p,
            outcome,
        });
        self.classes[class].record_check(outcome);
        outcome
    }

    fn reset_class(&mut self, class: usize) -> RetrainOutcome {
        let outcome = retrain_class(&mut self.classes, class, &self.header.schema, &mut self.rng);
        self.drift_count += 1;
        self.events.push(EngineEvent::DriftReset {
            step: self.steps,
            class,
            class_drifts: self.classes[class].drifts(),
            total_drifts: self.drift_count,
            retrained_on: outcome.retrained_on,
            negatives_trained: outcome.negatives_trained,
            negatives_skipped: outcome.negatives_skipped,
        });
        outcome
    }

    /// Raw per-class positive scores. Not normalized; an untrained class
    /// scores 0.
    pub fn predict_scores(&self, features: &[FeatureValue]) -> Result<Vec<f64>, EnsembleError> {
        self.check_features(features)?;
        Ok(self
            .classes
            .iter()
            .map(|state| positive_score(&state.classifier().predict(features)))
            .collect())
    }

    /// Per-class scores normalized into a distribution.
    pub fn normalized_scores(&self, features: &[FeatureValue]) -> Result<Vec<f64>, EnsembleError> {
        Ok(normalize_scores(&self.predict_scores(features)?))
    }

    /// Most probable class; ties go to the lowest index.
    pub fn predict_class(&self, features: &[FeatureValue]) -> Result<usize, EnsembleError> {
        let scores = self.normalized_scores(features)?;
        let mut best = 0;
        for (class, &score) in scores.iter().enumerate() {
            if score > scores[best] {
                best = class;
            }
        }
        Ok(best)
    }

    /// Drift resets across all classes since construction.
    #[must_use]
    pub fn drift_count_so_far(&self) -> u64 {
        self.drift_count
    }

    #[must_use]
    pub fn class_drift_count(&self, class: usize) -> Option<u64> {
        self.classes.get(class).map(ClassState::drifts)
    }

    #[must_use]
    pub fn class_state(&self, class: usize) -> Option<&ClassState> {
        self.classes.get(class)
    }

    #[must_use]
    pub fn class_summary(&self, class: usize) -> Option<ClassSummary> {
        self.classes.get(class).map(ClassState::summary)
    }

    #[must_use]
    pub fn footprint(&self, class: usize) -> Option<ClassFootprint> {
        self.classes.get(class).map(ClassState::footprint)
    }

    #[must_use]
    pub fn summary(&self) -> EnsembleSummary {
        EnsembleSummary {
            steps: self.steps,
            drift_count: self.drift_count,
            events_dropped: self.events.dropped(),
            classes: self.classes.iter().map(ClassState::summary).collect(),
        }
    }

    /// Take buffered events, oldest first.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        self.events.drain()
    }
}
