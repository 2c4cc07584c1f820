//! Error types for configuration and instance validation.
//!
//! Steady-state processing has no failure modes: skipped tests, cold-start
//! predictions and empty negative draws are ordinary outcomes. Errors are
//! reserved for construction-time validation and for instances that do not
//! match the announced schema.

use thiserror::Error;

use crate::config::{MAX_EVENT_CAPACITY, MAX_WINDOW_SIZE};
use crate::stats::quantile_sketch::{MAX_K, MIN_K};

/// Rejected run configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("window size must lie in 1..={max}, got {0}", max = MAX_WINDOW_SIZE)]
    WindowSize(usize),
    #[error("sketch k must lie in {min}..={max}, got {0}", min = MIN_K, max = MAX_K)]
    SketchK(usize),
    #[error("alpha must lie strictly between 0 and 1, got {0}")]
    Alpha(f64),
    #[error("at least 2 classes are required, got {0}")]
    ClassCount(usize),
    #[error("schema must declare at least one feature")]
    EmptySchema,
    #[error("nominal feature {feature} must have cardinality >= 1")]
    NominalCardinality { feature: usize },
    #[error("min feature tests must be at least 1, got {0}")]
    MinFeatureTests(usize),
    #[error("event log capacity must lie in 1..={max}, got {0}", max = MAX_EVENT_CAPACITY)]
    EventCapacity(usize),
    #[error("unknown classifier '{0}', expected naive-bayes|prior")]
    UnknownClassifier(String),
    #[error("environment variable {key} has unparsable value '{value}'")]
    EnvValue { key: &'static str, value: String },
}

/// Rejected call on a constructed ensemble.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnsembleError {
    #[error("instance has {actual} features, schema declares {expected}")]
    Arity { expected: usize, actual: usize },
    #[error("feature {feature} kind does not match the schema")]
    FeatureKind { feature: usize },
    #[error("feature {feature} category {category} is outside cardinality {cardinality}")]
    Category {
        feature: usize,
        category: usize,
        cardinality: usize,
    },
    #[error("numeric feature {feature} is not finite")]
    NonFinite { feature: usize },
    #[error("label {label} is outside the {num_classes} declared classes")]
    Label { label: usize, num_classes: usize },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_value() {
        assert_eq!(
            ConfigError::Alpha(1.5).to_string(),
            "alpha must lie strictly between 0 and 1, got 1.5"
        );
        let err = EnsembleError::Label {
            label: 4,
            num_classes: 3,
        };
        assert!(err.to_string().contains("label 4"));
    }

    #[test]
    fn config_errors_convert() {
        let err: EnsembleError = ConfigError::WindowSize(0).into();
        assert!(matches!(err, EnsembleError::Config(ConfigError::WindowSize(0))));
    }
}
