//! Run report generation.

use std::fmt::Write as _;

use serde::Serialize;

use classwise_core::{EnsembleConfig, EnsembleSummary};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AccuracyPoint {
    /// Last step of the block.
    pub step: u64,
    pub accuracy: f64,
}

/// Outcome of one prequential run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub scenario: String,
    pub config: EnsembleConfig,
    pub steps: u64,
    /// Test-then-train accuracy over the whole run.
    pub accuracy: f64,
    pub accuracy_curve: Vec<AccuracyPoint>,
    /// Steps at which each class was reset, indexed by class.
    pub drift_steps: Vec<Vec<u64>>,
    pub checks: u64,
    pub summary: EnsembleSummary,
    pub duration_ms: u64,
}

impl RunReport {
    #[must_use]
    pub fn total_drifts(&self) -> usize {
        self.drift_steps.iter().map(Vec::len).sum()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Render as markdown.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# classwise run: {}\n", self.scenario);
        let _ = writeln!(out, "| Setting | Value |");
        let _ = writeln!(out, "|---------|-------|");
        let _ = writeln!(out, "| Steps | {} |", self.steps);
        let _ = writeln!(out, "| Window | {} |", self.config.window_size);
        let _ = writeln!(out, "| Sketch k | {} |", self.config.sketch_k);
        let _ = writeln!(out, "| Alpha | {} |", self.config.alpha);
        let _ = writeln!(out, "| Balanced | {} |", self.config.balance);
        let _ = writeln!(out, "| Classifier | {} |", self.config.classifier);
        let _ = writeln!(out, "| Accuracy | {:.4} |", self.accuracy);
        let _ = writeln!(out, "| Drift checks | {} |", self.checks);
        let _ = writeln!(out, "| Drift resets | {} |\n", self.total_drifts());

        let _ = writeln!(out, "## Classes\n");
        let _ = writeln!(out, "| Class | Positives | Negatives | Drifts | Last check | Reset steps |");
        let _ = writeln!(out, "|-------|-----------|-----------|--------|------------|-------------|");
        for class in &self.summary.classes {
            let resets = self
                .drift_steps
                .get(class.class)
                .map(|steps| {
                    steps
                        .iter()
                        .map(u64::to_string)
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} | {} | {} |",
                class.class,
                class.positive_seen,
                class.negative_seen,
                class.drifts,
                class.last_check.map_or("-", |c| c.as_str()),
                if resets.is_empty() { "-" } else { resets.as_str() },
            );
        }

        let _ = writeln!(out, "\n## Accuracy by block\n");
        let _ = writeln!(out, "| Through step | Accuracy |");
        let _ = writeln!(out, "|--------------|----------|");
        for point in &self.accuracy_curve {
            let _ = writeln!(out, "| {} | {:.4} |", point.step, point.accuracy);
        }
        out
    }
}
