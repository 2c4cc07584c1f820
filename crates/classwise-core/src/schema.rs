//! Feature schema, instances and the upstream stream contract.
//!
//! A run is parameterized by a [`StreamHeader`] announced once by the
//! source before the first instance. The header fixes the feature kinds and
//! the class count for the lifetime of the run.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, EnsembleError};

/// Kind of a single input feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FeatureKind {
    Numeric,
    /// Categorical feature taking values in `0..cardinality`.
    Nominal { cardinality: usize },
}

/// One observed feature value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FeatureValue {
    Numeric(f64),
    Nominal(usize),
}

impl FeatureValue {
    #[must_use]
    pub fn as_numeric(self) -> Option<f64> {
        match self {
            Self::Numeric(v) => Some(v),
            Self::Nominal(_) => None,
        }
    }

    #[must_use]
    pub fn as_nominal(self) -> Option<usize> {
        match self {
            Self::Nominal(c) => Some(c),
            Self::Numeric(_) => None,
        }
    }
}

/// Ordered feature kinds plus the index partitions derived from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FeatureKind>", into = "Vec<FeatureKind>")]
pub struct FeatureSchema {
    kinds: Vec<FeatureKind>,
    numeric: Vec<usize>,
    nominal: Vec<(usize, usize)>,
}

impl FeatureSchema {
    /// Build a schema, rejecting empty feature lists and zero-cardinality
    /// nominal features.
    pub fn new(kinds: Vec<FeatureKind>) -> Result<Self, ConfigError> {
        if kinds.is_empty() {
            return Err(ConfigError::EmptySchema);
        }
        let mut numeric = Vec::new();
        let mut nominal = Vec::new();
        for (idx, kind) in kinds.iter().enumerate() {
            match *kind {
                FeatureKind::Numeric => numeric.push(idx),
                FeatureKind::Nominal { cardinality } => {
                    if cardinality == 0 {
                        return Err(ConfigError::NominalCardinality { feature: idx });
                    }
                    nominal.push((idx, cardinality));
                }
            }
        }
        Ok(Self {
            kinds,
            numeric,
            nominal,
        })
    }

    /// Schema with `n` numeric features.
    pub fn numeric(n: usize) -> Result<Self, ConfigError> {
        Self::new(vec![FeatureKind::Numeric; n])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    #[must_use]
    pub fn kinds(&self) -> &[FeatureKind] {
        &self.kinds
    }

    /// Feature indices of numeric features, in schema order.
    #[must_use]
    pub fn numeric_indices(&self) -> &[usize] {
        &self.numeric
    }

    /// `(feature index, cardinality)` of nominal features, in schema order.
    #[must_use]
    pub fn nominal_features(&self) -> &[(usize, usize)] {
        &self.nominal
    }

    /// Sum of nominal cardinalities (histogram bins per reference summary).
    #[must_use]
    pub fn total_nominal_bins(&self) -> usize {
        self.nominal.iter().map(|&(_, card)| card).sum()
    }

    /// Check that `values` matches this schema.
    pub fn check(&self, values: &[FeatureValue]) -> Result<(), EnsembleError> {
        if values.len() != self.kinds.len() {
            return Err(EnsembleError::Arity {
                expected: self.kinds.len(),
                actual: values.len(),
            });
        }
        for (feature, (kind, value)) in self.kinds.iter().zip(values).enumerate() {
            match (*kind, *value) {
                (FeatureKind::Numeric, FeatureValue::Numeric(v)) => {
                    if !v.is_finite() {
                        return Err(EnsembleError::NonFinite { feature });
                    }
                }
                (FeatureKind::Nominal { cardinality }, FeatureValue::Nominal(category)) => {
                    if category >= cardinality {
                        return Err(EnsembleError::Category {
                            feature,
                            category,
                            cardinality,
                        });
                    }
                }
                _ => return Err(EnsembleError::FeatureKind { feature }),
            }
        }
        Ok(())
    }
}

impl TryFrom<Vec<FeatureKind>> for FeatureSchema {
    type Error = ConfigError;

    fn try_from(kinds: Vec<FeatureKind>) -> Result<Self, Self::Error> {
        Self::new(kinds)
    }
}

impl From<FeatureSchema> for Vec<FeatureKind> {
    fn from(schema: FeatureSchema) -> Self {
        schema.kinds
    }
}

/// Schema plus class count, announced once before the first instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamHeader {
    pub schema: FeatureSchema,
    pub num_classes: usize,
}

impl StreamHeader {
    pub fn new(schema: FeatureSchema, num_classes: usize) -> Result<Self, ConfigError> {
        if num_classes < 2 {
            return Err(ConfigError::ClassCount(num_classes));
        }
        Ok(Self {
            schema,
            num_classes,
        })
    }
}

/// A labeled feature vector. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    values: Vec<FeatureValue>,
    label: usize,
}

impl Instance {
    #[must_use]
    pub fn new(values: Vec<FeatureValue>, label: usize) -> Self {
        Self { values, label }
    }

    /// Convenience constructor for all-numeric instances.
    #[must_use]
    pub fn numeric(values: &[f64], label: usize) -> Self {
        Self::new(values.iter().copied().map(FeatureValue::Numeric).collect(), label)
    }

    /// Label-agnostic feature view.
    #[must_use]
    pub fn features(&self) -> &[FeatureValue] {
        &self.values
    }

    #[must_use]
    pub fn label(&self) -> usize {
        self.label
    }

    /// Numeric value of feature `idx`, if it is numeric.
    #[must_use]
    pub fn numeric_at(&self, idx: usize) -> Option<f64> {
        self.values.get(idx).and_then(|v| v.as_numeric())
    }

    /// Category of feature `idx`, if it is nominal.
    #[must_use]
    pub fn nominal_at(&self, idx: usize) -> Option<usize> {
        self.values.get(idx).and_then(|v| v.as_nominal())
    }
}

/// Upstream supplier of labeled instances.
///
/// `header` is called once before any instance is requested; the stream is
/// conceptually infinite.
pub trait StreamSource {
    fn header(&self) -> StreamHeader;

    fn next_instance(&mut self) -> Instance;
}
