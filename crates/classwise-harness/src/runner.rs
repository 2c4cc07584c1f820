//! Prequential (test-then-train) evaluation.

use std::path::Path;
use std::time::Instant;

use classwise_core::{EngineEvent, EnsembleConfig, EnsembleController, StreamSource};

use crate::error::HarnessError;
use crate::report::{AccuracyPoint, RunReport};
use crate::structured_log::{LogEmitter, LogEntry, LogLevel};

/// Accuracy is also reported over consecutive blocks of this many steps.
pub const DEFAULT_BLOCK: u64 = 250;

/// Read an [`EnsembleConfig`] from a JSON file; missing fields take their
/// defaults.
pub fn load_config(path: &Path) -> Result<EnsembleConfig, HarnessError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Drives a source through an ensemble for a fixed number of steps.
#[derive(Debug, Clone)]
pub struct PrequentialRunner {
    pub scenario: String,
    pub config: EnsembleConfig,
    pub steps: u64,
    /// Always at least 1; set through [`with_block`](Self::with_block).
    block: u64,
}

impl PrequentialRunner {
    #[must_use]
    pub fn new(scenario: impl Into<String>, config: EnsembleConfig, steps: u64) -> Self {
        Self {
            scenario: scenario.into(),
            config,
            steps,
            block: DEFAULT_BLOCK,
        }
    }

    #[must_use]
    pub fn with_block(mut self, block: u64) -> Self {
        self.block = block.max(1);
        self
    }

    /// Predict each instance before training on it. Drift events go to
    /// `emitter` when one is given.
    pub fn run<S: StreamSource + ?Sized>(
        &self,
        source: &mut S,
        mut emitter: Option<&mut LogEmitter>,
    ) -> Result<RunReport, HarnessError> {
        let started = Instant::now();
        let mut ensemble = EnsembleController::for_source(self.config.clone(), source)?;
        let num_classes = ensemble.num_classes();

        if let Some(em) = emitter.as_deref_mut() {
            em.emit_entry(
                LogEntry::new("", LogLevel::Info, "run_start")
                    .with_scenario(&self.scenario)
                    .with_details(serde_json::to_value(&self.config)?),
            )?;
        }

        let mut correct = 0u64;
        let mut block_correct = 0u64;
        let mut accuracy_curve = Vec::new();
        let mut drift_steps: Vec<Vec<u64>> = vec![Vec::new(); num_classes];
        let mut checks = 0u64;

        for step in 1..=self.steps {
            let instance = source.next_instance();
            let predicted = ensemble.predict_class(instance.features())?;
            if predicted == instance.label() {
                correct += 1;
                block_correct += 1;
            }
            ensemble.train(&instance)?;

            for event in ensemble.drain_events() {
                match &event {
                    EngineEvent::DriftCheck { .. } => checks += 1,
                    EngineEvent::DriftReset {
                        step: at, class, ..
                    } => {
                        if let Some(steps) = drift_steps.get_mut(*class) {
                            steps.push(*at);
                        }
                    }
                }
                if let Some(em) = emitter.as_deref_mut() {
                    em.emit_entry(LogEntry::from_engine_event(&event)?.with_scenario(&self.scenario))?;
                }
            }

            if step % self.block == 0 || step == self.steps {
                let span = step - (step - 1) / self.block * self.block;
                accuracy_curve.push(AccuracyPoint {
                    step,
                    accuracy: block_correct as f64 / span as f64,
                });
                block_correct = 0;
            }
        }

        let report = RunReport {
            scenario: self.scenario.clone(),
            config: self.config.clone(),
            steps: self.steps,
            accuracy: if self.steps == 0 {
                0.0
            } else {
                correct as f64 / self.steps as f64
            },
            accuracy_curve,
            drift_steps,
            checks,
            summary: ensemble.summary(),
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        };

        if let Some(em) = emitter {
            em.emit_entry(
                LogEntry::new("", LogLevel::Info, "run_summary")
                    .with_scenario(&self.scenario)
                    .with_step(self.steps)
                    .with_duration_ms(report.duration_ms)
                    .with_details(serde_json::to_value(&report.summary)?),
            )?;
            em.flush()?;
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{GaussianClassStream, ScenarioSpec};

    #[test]
    fn accuracy_blocks_cover_every_step() {
        let spec = ScenarioSpec::stable();
        let mut stream = GaussianClassStream::new(spec).unwrap();
        let config = EnsembleConfig::default().with_window_size(40);
        let report = PrequentialRunner::new("stable", config, 1_030)
            .with_block(100)
            .run(&mut stream, None)
            .unwrap();
        assert_eq!(report.accuracy_curve.len(), 11);
        assert_eq!(report.accuracy_curve.last().map(|p| p.step), Some(1_030));
        assert_eq!(report.summary.steps, 1_030);
        assert!(report.accuracy > 0.8, "{}", report.accuracy);
    }

    #[test]
    fn zero_block_falls_back_to_single_steps() {
        let mut stream = GaussianClassStream::new(ScenarioSpec::stable()).unwrap();
        let report = PrequentialRunner::new("stable", EnsembleConfig::default(), 5)
            .with_block(0)
            .run(&mut stream, None)
            .unwrap();
        let steps: Vec<u64> = report.accuracy_curve.iter().map(|p| p.step).collect();
        assert_eq!(steps, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn config_file_fills_defaults() {
        let path = std::env::temp_dir().join(format!("classwise-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"window_size": 64, "balance": true}"#).unwrap();
        let config = load_config(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.window_size, 64);
        assert!(config.balance);
        assert_eq!(config.sketch_k, EnsembleConfig::default().sketch_k);
    }
}
