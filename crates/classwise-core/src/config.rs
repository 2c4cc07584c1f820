//! Run configuration.
//!
//! Defaults can be overridden from the environment:
//! - `CLASSWISE_WINDOW_SIZE`: window capacity W (default 128)
//! - `CLASSWISE_SKETCH_K`: reference sketch accuracy parameter K (default 256)
//! - `CLASSWISE_ALPHA`: BY significance level (default 0.002)
//! - `CLASSWISE_SEED`: RNG seed (default 1)
//! - `CLASSWISE_BALANCE`: `on|off` balanced negative training (default off)
//! - `CLASSWISE_CLASSIFIER`: `naive-bayes|prior` (default naive-bayes)
//! - `CLASSWISE_MIN_FEATURE_TESTS`: admissible tests needed to decide (default 2)

use serde::{Deserialize, Serialize};

use crate::classifier::ClassifierConfig;
use crate::error::ConfigError;
use crate::stats::quantile_sketch::{MAX_K, MIN_K};

pub const DEFAULT_WINDOW_SIZE: usize = 128;
pub const DEFAULT_SKETCH_K: usize = 256;
pub const DEFAULT_ALPHA: f64 = 0.002;
pub const DEFAULT_SEED: u64 = 1;
pub const DEFAULT_MIN_FEATURE_TESTS: usize = 2;
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Upper bounds on the sizing knobs. Each one fixes memory that every class
/// holds for the whole run.
pub const MAX_WINDOW_SIZE: usize = 1 << 20;
pub const MAX_EVENT_CAPACITY: usize = 1 << 20;

/// Options for one ensemble run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnsembleConfig {
    pub window_size: usize,
    pub sketch_k: usize,
    pub alpha: f64,
    pub seed: u64,
    /// Train negatives with probability `pos / (pos + neg)` instead of always.
    pub balance: bool,
    pub classifier: ClassifierConfig,
    pub min_feature_tests: usize,
    pub event_capacity: usize,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            sketch_k: DEFAULT_SKETCH_K,
            alpha: DEFAULT_ALPHA,
            seed: DEFAULT_SEED,
            balance: false,
            classifier: ClassifierConfig::default(),
            min_feature_tests: DEFAULT_MIN_FEATURE_TESTS,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl EnsembleConfig {
    #[must_use]
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    #[must_use]
    pub fn with_sketch_k(mut self, sketch_k: usize) -> Self {
        self.sketch_k = sketch_k;
        self
    }

    #[must_use]
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_balance(mut self, balance: bool) -> Self {
        self.balance = balance;
        self
    }

    #[must_use]
    pub fn with_classifier(mut self, classifier: ClassifierConfig) -> Self {
        self.classifier = classifier;
        self
    }

    #[must_use]
    pub fn with_min_feature_tests(mut self, min_feature_tests: usize) -> Self {
        self.min_feature_tests = min_feature_tests;
        self
    }

    #[must_use]
    pub fn with_event_capacity(mut self, event_capacity: usize) -> Self {
        self.event_capacity = event_capacity;
        self
    }

    /// Check every field, plus the class count the run will use.
    pub fn validate(&self, num_classes: usize) -> Result<(), ConfigError> {
        if !(1..=MAX_WINDOW_SIZE).contains(&self.window_size) {
            return Err(ConfigError::WindowSize(self.window_size));
        }
        if !(MIN_K..=MAX_K).contains(&self.sketch_k) {
            return Err(ConfigError::SketchK(self.sketch_k));
        }
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(ConfigError::Alpha(self.alpha));
        }
        if self.min_feature_tests < 1 {
            return Err(ConfigError::MinFeatureTests(self.min_feature_tests));
        }
        if !(1..=MAX_EVENT_CAPACITY).contains(&self.event_capacity) {
            return Err(ConfigError::EventCapacity(self.event_capacity));
        }
        if num_classes < 2 {
            return Err(ConfigError::ClassCount(num_classes));
        }
        Ok(())
    }

    /// Defaults overlaid with any `CLASSWISE_*` variables that are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().overlay(|key| std::env::var(key).ok())
    }

    /// Overlay values produced by `lookup` on top of `self`.
    ///
    /// `lookup` maps a variable name to its raw value; split out from
    /// [`from_env`](Self::from_env) so tests do not touch the process
    /// environment.
    pub fn overlay(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(raw) = lookup("CLASSWISE_WINDOW_SIZE") {
            self.window_size = parse_env("CLASSWISE_WINDOW_SIZE", &raw)?;
        }
        if let Some(raw) = lookup("CLASSWISE_SKETCH_K") {
            self.sketch_k = parse_env("CLASSWISE_SKETCH_K", &raw)?;
        }
        if let Some(raw) = lookup("CLASSWISE_ALPHA") {
            self.alpha = parse_env("CLASSWISE_ALPHA", &raw)?;
        }
        if let Some(raw) = lookup("CLASSWISE_SEED") {
            self.seed = parse_env("CLASSWISE_SEED", &raw)?;
        }
        if let Some(raw) = lookup("CLASSWISE_BALANCE") {
            self.balance = parse_flag_loose(&raw).ok_or(ConfigError::EnvValue {
                key: "CLASSWISE_BALANCE",
                value: raw.clone(),
            })?;
        }
        if let Some(raw) = lookup("CLASSWISE_CLASSIFIER") {
            self.classifier = raw.parse()?;
        }
        if let Some(raw) = lookup("CLASSWISE_MIN_FEATURE_TESTS") {
            self.min_feature_tests = parse_env("CLASSWISE_MIN_FEATURE_TESTS", &raw)?;
        }
        Ok(self)
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::EnvValue {
        key,
        value: raw.to_string(),
    })
}

/// Parse an on/off flag (case-insensitive).
#[must_use]
pub fn parse_flag_loose(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "on" | "true" | "yes" | "balanced" => Some(true),
        "0" | "off" | "false" | "no" | "unbalanced" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let c = EnsembleConfig::default();
        assert_eq!(c.window_size, 128);
        assert_eq!(c.sketch_k, 256);
        assert_eq!(c.alpha, 0.002);
        assert_eq!(c.seed, 1);
        assert!(!c.balance);
        assert_eq!(c.classifier, ClassifierConfig::NaiveBayes);
        assert_eq!(c.min_feature_tests, 2);
        assert!(c.validate(2).is_ok());
    }

    #[test]
    fn validate_rejects_each_bad_field() {
        let base = EnsembleConfig::default();
        assert_eq!(
            base.clone().with_window_size(0).validate(2),
            Err(ConfigError::WindowSize(0))
        );
        assert_eq!(
            base.clone().with_sketch_k(1).validate(2),
            Err(ConfigError::SketchK(1))
        );
        assert_eq!(
            base.clone().with_alpha(1.0).validate(2),
            Err(ConfigError::Alpha(1.0))
        );
        assert_eq!(
            base.clone().with_min_feature_tests(0).validate(2),
            Err(ConfigError::MinFeatureTests(0))
        );
        assert_eq!(
            base.clone().with_event_capacity(0).validate(2),
            Err(ConfigError::EventCapacity(0))
        );
        assert_eq!(base.validate(1), Err(ConfigError::ClassCount(1)));
    }

    #[test]
    fn validate_rejects_oversized_knobs() {
        let base = EnsembleConfig::default();
        assert_eq!(
            base.clone().with_sketch_k(usize::MAX / 4).validate(2),
            Err(ConfigError::SketchK(usize::MAX / 4))
        );
        assert_eq!(
            base.clone().with_window_size(MAX_WINDOW_SIZE + 1).validate(2),
            Err(ConfigError::WindowSize(MAX_WINDOW_SIZE + 1))
        );
        assert_eq!(
            base.clone().with_event_capacity(MAX_EVENT_CAPACITY + 1).validate(2),
            Err(ConfigError::EventCapacity(MAX_EVENT_CAPACITY + 1))
        );
        assert!(
            base.with_sketch_k(MAX_K)
                .with_window_size(MAX_WINDOW_SIZE)
                .validate(2)
                .is_ok()
        );
    }

    #[test]
    fn overlay_reads_every_key() {
        let c = EnsembleConfig::default()
            .overlay(env(&[
                ("CLASSWISE_WINDOW_SIZE", "50"),
                ("CLASSWISE_SKETCH_K", " 64 "),
                ("CLASSWISE_ALPHA", "0.01"),
                ("CLASSWISE_SEED", "9"),
                ("CLASSWISE_BALANCE", "ON"),
                ("CLASSWISE_CLASSIFIER", "majority"),
                ("CLASSWISE_MIN_FEATURE_TESTS", "1"),
            ]))
            .unwrap();
        assert_eq!(c.window_size, 50);
        assert_eq!(c.sketch_k, 64);
        assert_eq!(c.alpha, 0.01);
        assert_eq!(c.seed, 9);
        assert!(c.balance);
        assert_eq!(c.classifier, ClassifierConfig::Prior);
        assert_eq!(c.min_feature_tests, 1);
    }

    #[test]
    fn overlay_reports_bad_values() {
        let err = EnsembleConfig::default()
            .overlay(env(&[("CLASSWISE_WINDOW_SIZE", "wide")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::EnvValue {
                key: "CLASSWISE_WINDOW_SIZE",
                value: "wide".into()
            }
        );
        let err = EnsembleConfig::default()
            .overlay(env(&[("CLASSWISE_CLASSIFIER", "forest")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::UnknownClassifier("forest".into()));
    }

    #[test]
    fn flags_parse_loosely() {
        assert_eq!(parse_flag_loose("Yes"), Some(true));
        assert_eq!(parse_flag_loose("unbalanced"), Some(false));
        assert_eq!(parse_flag_loose("maybe"), None);
    }

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let c: EnsembleConfig =
            serde_json::from_str(r#"{"window_size": 50, "classifier": "prior"}"#).unwrap();
        assert_eq!(c.window_size, 50);
        assert_eq!(c.classifier, ClassifierConfig::Prior);
        assert_eq!(c.sketch_k, DEFAULT_SKETCH_K);
        assert!(serde_json::from_str::<EnsembleConfig>(r#"{"windw": 3}"#).is_err());
    }
}
