//! Seeded Gaussian class streams with scheduled class-conditional shifts.
//!
//! Each class `c` draws every numeric feature from `N(mean_c · scale_c, σ²)`
//! and every nominal feature from a distribution that favors category
//! `c mod cardinality`. A [`ClassShift`] multiplies one class's mean from a
//! given step onwards, which is exactly the class-conditional drift the
//! engine is built to isolate.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

use classwise_core::{FeatureKind, FeatureSchema, FeatureValue, Instance, StreamHeader, StreamSource};

use crate::error::HarnessError;

/// From `at_step` onwards, class `class` has its mean multiplied by
/// `mean_scale`. Steps count emitted instances; the first instance is step 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassShift {
    pub at_step: u64,
    pub class: usize,
    pub mean_scale: f64,
}

/// Declarative description of a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioSpec {
    pub name: String,
    /// Per-class numeric mean; its length fixes the class count.
    pub class_means: Vec<f64>,
    pub numeric_features: usize,
    #[serde(default)]
    pub nominal_cardinalities: Vec<usize>,
    pub noise_std: f64,
    /// Probability a nominal feature takes its class-favored category.
    #[serde(default = "default_nominal_bias")]
    pub nominal_bias: f64,
    #[serde(default)]
    pub shifts: Vec<ClassShift>,
    pub steps: u64,
    pub seed: u64,
}

fn default_nominal_bias() -> f64 {
    0.6
}

impl ScenarioSpec {
    /// The mean-doubling scenario: two classes, class 1 doubles halfway.
    #[must_use]
    pub fn class_shift() -> Self {
        Self {
            name: "class-shift".to_string(),
            class_means: vec![2.0, 5.0],
            numeric_features: 3,
            nominal_cardinalities: Vec::new(),
            noise_std: 1.0,
            nominal_bias: default_nominal_bias(),
            shifts: vec![ClassShift {
                at_step: 1_001,
                class: 1,
                mean_scale: 2.0,
            }],
            steps: 2_000,
            seed: 11,
        }
    }

    /// Three stationary classes over mixed features.
    #[must_use]
    pub fn stable() -> Self {
        Self {
            name: "stable".to_string(),
            class_means: vec![0.0, 3.0, 6.0],
            numeric_features: 2,
            nominal_cardinalities: vec![4],
            noise_std: 1.0,
            nominal_bias: default_nominal_bias(),
            shifts: Vec::new(),
            steps: 3_000,
            seed: 3,
        }
    }

    #[must_use]
    pub fn presets() -> Vec<Self> {
        vec![Self::class_shift(), Self::stable()]
    }

    #[must_use]
    pub fn preset(name: &str) -> Option<Self> {
        Self::presets().into_iter().find(|p| p.name == name)
    }

    pub fn from_file(path: &std::path::Path) -> Result<Self, HarnessError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    #[must_use]
    pub fn num_classes(&self) -> usize {
        self.class_means.len()
    }

    pub fn validate(&self) -> Result<(), HarnessError> {
        if self.class_means.len() < 2 {
            return Err(HarnessError::Scenario(format!(
                "{}: need at least 2 class means",
                self.name
            )));
        }
        if self.class_means.iter().any(|m| !m.is_finite()) {
            return Err(HarnessError::Scenario(format!("{}: non-finite class mean", self.name)));
        }
        if !(self.noise_std.is_finite() && self.noise_std > 0.0) {
            return Err(HarnessError::Scenario(format!(
                "{}: noise_std must be positive, got {}",
                self.name, self.noise_std
            )));
        }
        if !(0.0..=1.0).contains(&self.nominal_bias) {
            return Err(HarnessError::Scenario(format!(
                "{}: nominal_bias must lie in [0, 1], got {}",
                self.name, self.nominal_bias
            )));
        }
        if let Some(shift) = self.shifts.iter().find(|s| s.class >= self.num_classes()) {
            return Err(HarnessError::Scenario(format!(
                "{}: shift targets class {} of {}",
                self.name,
                shift.class,
                self.num_classes()
            )));
        }
        Ok(())
    }

    pub fn header(&self) -> Result<StreamHeader, HarnessError> {
        let mut kinds = vec![FeatureKind::Numeric; self.numeric_features];
        kinds.extend(
            self.nominal_cardinalities
                .iter()
                .map(|&cardinality| FeatureKind::Nominal { cardinality }),
        );
        Ok(StreamHeader::new(FeatureSchema::new(kinds)?, self.num_classes())?)
    }
}

/// [`StreamSource`] driven by a [`ScenarioSpec`].
#[derive(Debug, Clone)]
pub struct GaussianClassStream {
    spec: ScenarioSpec,
    header: StreamHeader,
    rng: ChaCha8Rng,
    step: u64,
}

impl GaussianClassStream {
    pub fn new(spec: ScenarioSpec) -> Result<Self, HarnessError> {
        spec.validate()?;
        let header = spec.header()?;
        Ok(Self {
            rng: ChaCha8Rng::seed_from_u64(spec.seed),
            spec,
            header,
            step: 0,
        })
    }

    #[must_use]
    pub fn spec(&self) -> &ScenarioSpec {
        &self.spec
    }

    /// Instances emitted so far.
    #[must_use]
    pub fn step(&self) -> u64 {
        self.step
    }

    /// Mean of `class` at `step`, with every shift that has fired applied.
    #[must_use]
    pub fn mean_at(&self, class: usize, step: u64) -> f64 {
        let base = self.spec.class_means.get(class).copied().unwrap_or(0.0);
        self.spec
            .shifts
            .iter()
            .filter(|s| s.class == class && step >= s.at_step)
            .fold(base, |mean, s| mean * s.mean_scale)
    }
}

impl StreamSource for GaussianClassStream {
    fn header(&self) -> StreamHeader {
        self.header.clone()
    }

    fn next_instance(&mut self) -> Instance {
        self.step += 1;
        let label = self.rng.gen_range(0..self.spec.num_classes());
        let mean = self.mean_at(label, self.step);
        let mut values = Vec::with_capacity(self.header.schema.len());
        for _ in 0..self.spec.numeric_features {
            let z: f64 = StandardNormal.sample(&mut self.rng);
            values.push(FeatureValue::Numeric(mean + self.spec.noise_std * z));
        }
        for &cardinality in &self.spec.nominal_cardinalities {
            let category = if self.rng.gen_bool(self.spec.nominal_bias) {
                label % cardinality
            } else {
                self.rng.gen_range(0..cardinality)
            };
            values.push(FeatureValue::Nominal(category));
        }
        Instance::new(values, label)
    }
}
