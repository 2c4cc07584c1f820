//! Binary base learners and the factory registry that builds them.
//!
//! Every class owns one [`BinaryClassifier`] trained one-vs-rest. The
//! ensemble only needs four things from a learner: incremental training on
//! a labeled feature view, a two-slot `[negative, positive]` vote, a way to
//! mint an untrained twin with the same configuration, and a reset.

mod naive_bayes;
mod prior;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::schema::{FeatureSchema, FeatureValue};

pub use naive_bayes::NaiveBayes;
pub use prior::PriorClassifier;

/// Incremental binary learner used as a one-vs-rest member.
pub trait BinaryClassifier: fmt::Debug {
    /// Learn from one feature vector labeled positive or negative.
    fn train(&mut self, features: &[FeatureValue], positive: bool);

    /// `[negative, positive]` votes. Fewer than two slots means the learner
    /// has nothing to say yet.
    fn predict(&self, features: &[FeatureValue]) -> Vec<f64>;

    /// Untrained learner with the same configuration.
    fn fresh_copy(&self) -> Box<dyn BinaryClassifier>;

    /// Forget everything learned.
    fn reset(&mut self);

    fn name(&self) -> &'static str;
}

/// Registry key for the built-in learners.
///
/// Naive Bayes is the default stand-in base learner. An incremental decision
/// tree such as a Hoeffding tree is the usual base learner for this kind of
/// ensemble; it is not built in and would be added as another variant.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClassifierConfig {
    /// Gaussian likelihoods for numeric features, Laplace-smoothed
    /// multinomial likelihoods for nominal ones.
    #[default]
    NaiveBayes,
    /// Votes the observed positive/negative frequencies, ignoring features.
    Prior,
}

impl ClassifierConfig {
    /// Parse from string (case-insensitive).
    #[must_use]
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "naive-bayes" | "naive_bayes" | "naivebayes" | "nb" | "bayes" => Some(Self::NaiveBayes),
            "prior" | "majority" => Some(Self::Prior),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NaiveBayes => "naive-bayes",
            Self::Prior => "prior",
        }
    }

    /// Build an untrained learner for `schema`.
    #[must_use]
    pub fn build(self, schema: &FeatureSchema) -> Box<dyn BinaryClassifier> {
        match self {
            Self::NaiveBayes => Box::new(NaiveBayes::new(schema)),
            Self::Prior => Box::new(PriorClassifier::new()),
        }
    }
}

impl FromStr for ClassifierConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_loose(s).ok_or_else(|| ConfigError::UnknownClassifier(s.to_string()))
    }
}

impl fmt::Display for ClassifierConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_classifier_names() {
        assert_eq!(
            ClassifierConfig::from_str_loose("Naive-Bayes"),
            Some(ClassifierConfig::NaiveBayes)
        );
        assert_eq!(
            ClassifierConfig::from_str_loose("nb"),
            Some(ClassifierConfig::NaiveBayes)
        );
        assert_eq!(
            ClassifierConfig::from_str_loose("majority"),
            Some(ClassifierConfig::Prior)
        );
        assert_eq!(ClassifierConfig::from_str_loose("svm"), None);
        assert_eq!(
            "svm".parse::<ClassifierConfig>(),
            Err(ConfigError::UnknownClassifier("svm".into()))
        );
    }

    #[test]
    fn default_is_naive_bayes() {
        assert_eq!(ClassifierConfig::default(), ClassifierConfig::NaiveBayes);
        assert_eq!(ClassifierConfig::default().to_string(), "naive-bayes");
    }

    #[test]
    fn serde_uses_kebab_names() {
        let json = serde_json::to_string(&ClassifierConfig::NaiveBayes).unwrap();
        assert_eq!(json, "\"naive-bayes\"");
        let back: ClassifierConfig = serde_json::from_str("\"prior\"").unwrap();
        assert_eq!(back, ClassifierConfig::Prior);
    }

    #[test]
    fn built_learners_start_silent() {
        let schema = FeatureSchema::numeric(2).unwrap();
        for config in [ClassifierConfig::NaiveBayes, ClassifierConfig::Prior] {
            let learner = config.build(&schema);
            let features = [FeatureValue::Numeric(0.0), FeatureValue::Numeric(1.0)];
            assert!(learner.predict(&features).len() < 2, "{}", learner.name());
        }
    }

    #[test]
    fn fresh_copy_forgets_training() {
        let schema = FeatureSchema::numeric(1).unwrap();
        for config in [ClassifierConfig::NaiveBayes, ClassifierConfig::Prior] {
            let mut learner = config.build(&schema);
            let x = [FeatureValue::Numeric(1.0)];
            learner.train(&x, true);
            learner.train(&x, false);
            assert_eq!(learner.predict(&x).len(), 2);
            let twin = learner.fresh_copy();
            assert!(twin.predict(&x).len() < 2);
            assert_eq!(twin.name(), learner.name());
            learner.reset();
            assert!(learner.predict(&x).len() < 2);
        }
    }
}
