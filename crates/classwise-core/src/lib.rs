//! Per-class drift detection for one-vs-rest stream ensembles.
//!
//! This crate implements an online multi-class classifier built from one
//! binary model per class. Each class keeps a window of its most recent
//! instances and a long-running summary of everything older; when the two
//! stop agreeing, only that class's model is rebuilt.
//!
//! # Architecture
//!
//! The engine consists of:
//! - **Schema** (`schema`): feature kinds, instances, stream headers
//! - **Quantile sketch** (`stats::quantile_sketch`): bounded-memory numeric summaries
//! - **KS test** (`stats::ks`): two-sample Kolmogorov–Smirnov distance and p-value
//! - **Chi-square test** (`stats::chi_square`): nominal count comparison with validity guards
//! - **BY correction** (`stats::by_correction`): Benjamini–Yekutieli step-up decision
//! - **Sliding window** (`window`): class-scoped FIFO of recent instances
//! - **Reference summary** (`reference`): sketches and histograms of evicted instances
//! - **Drift test** (`drift_test`): per-feature test battery for one class
//! - **Retrainer** (`retrain`): window-based rebuild with negative resampling
//! - **Classifiers** (`classifier`): binary base-learner trait and factory registry
//! - **Ensemble** (`ensemble`): training dispatch, scoring, cadence control
//! - **Configuration** (`config`): validated run options with env overrides
//!
//! The crate performs no I/O. Observability goes through [`EngineEvent`]
//! records and summary snapshots that callers drain and log.

#![forbid(unsafe_code)]

pub mod class_state;
pub mod classifier;
pub mod config;
pub mod drift_test;
pub mod ensemble;
pub mod error;
pub mod events;
pub mod reference;
pub mod retrain;
pub mod schema;
pub mod stats;
pub mod window;

pub use class_state::{ClassFootprint, ClassState, ClassSummary};
pub use classifier::{BinaryClassifier, ClassifierConfig};
pub use config::EnsembleConfig;
pub use drift_test::{DriftTestReport, FeatureTest, SkippedFeature, TestMethod};
pub use ensemble::{EnsembleController, EnsembleSummary, TrainOutcome, normalize_scores};
pub use error::{ConfigError, EnsembleError};
pub use events::{CheckOutcome, EngineEvent, EventLog};
pub use reference::ReferenceSummary;
pub use retrain::RetrainOutcome;
pub use schema::{FeatureKind, FeatureSchema, FeatureValue, Instance, StreamHeader, StreamSource};
pub use stats::SkipReason;
pub use stats::by_correction::{AggregateDecision, BenjaminiYekutieli};
pub use stats::quantile_sketch::QuantileSketch;
pub use window::SlidingWindow;
