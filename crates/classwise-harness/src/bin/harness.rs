//! CLI entrypoint for the classwise scenario harness.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use classwise_core::{ClassifierConfig, EnsembleConfig};
use classwise_harness::structured_log::{
    ArtifactIndex, LogEmitter, validate_log_file,
};
use classwise_harness::{GaussianClassStream, PrequentialRunner, ScenarioSpec, load_config};

/// Scenario tooling for classwise.
#[derive(Debug, Parser)]
#[command(name = "classwise-harness")]
#[command(about = "Run drift scenarios through the classwise ensemble")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a scenario prequentially and report accuracy and drift resets.
    Run {
        /// Built-in scenario name (see `presets`).
        #[arg(long, default_value = "class-shift")]
        preset: String,
        /// Scenario JSON file; overrides `--preset`.
        #[arg(long)]
        scenario: Option<PathBuf>,
        /// Number of steps (defaults to the scenario's own).
        #[arg(long)]
        steps: Option<u64>,
        /// Ensemble config JSON file (defaults plus CLASSWISE_* env otherwise).
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        window: Option<usize>,
        #[arg(long)]
        sketch_k: Option<usize>,
        #[arg(long)]
        alpha: Option<f64>,
        #[arg(long)]
        seed: Option<u64>,
        /// Train negatives with probability pos / (pos + neg).
        #[arg(long)]
        balance: bool,
        /// Base learner (`naive-bayes` or `prior`).
        #[arg(long)]
        classifier: Option<String>,
        #[arg(long)]
        min_feature_tests: Option<usize>,
        /// Structured JSONL log output path; `-` writes to stdout instead of
        /// the JSON report.
        #[arg(long)]
        log: Option<PathBuf>,
        /// Report output path; `.md` renders markdown, anything else JSON.
        #[arg(long)]
        report: Option<PathBuf>,
        /// Artifact index output path (requires `--log` or `--report`).
        #[arg(long)]
        artifact_index: Option<PathBuf>,
    },
    /// List the built-in scenarios as JSON.
    Presets,
    /// Validate a structured JSONL log file.
    ValidateLog {
        /// Log file path.
        path: PathBuf,
    },
}

#[allow(clippy::too_many_arguments)]
fn resolve_config(
    config: Option<&Path>,
    window: Option<usize>,
    sketch_k: Option<usize>,
    alpha: Option<f64>,
    seed: Option<u64>,
    balance: bool,
    classifier: Option<&str>,
    min_feature_tests: Option<usize>,
) -> Result<EnsembleConfig, Box<dyn std::error::Error>> {
    let mut resolved = match config {
        Some(path) => load_config(path)?,
        None => EnsembleConfig::from_env()?,
    };
    if let Some(w) = window {
        resolved = resolved.with_window_size(w);
    }
    if let Some(k) = sketch_k {
        resolved = resolved.with_sketch_k(k);
    }
    if let Some(a) = alpha {
        resolved = resolved.with_alpha(a);
    }
    if let Some(s) = seed {
        resolved = resolved.with_seed(s);
    }
    if balance {
        resolved = resolved.with_balance(true);
    }
    if let Some(name) = classifier {
        resolved = resolved.with_classifier(name.parse::<ClassifierConfig>()?);
    }
    if let Some(m) = min_feature_tests {
        resolved = resolved.with_min_feature_tests(m);
    }
    Ok(resolved)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            preset,
            scenario,
            steps,
            config,
            window,
            sketch_k,
            alpha,
            seed,
            balance,
            classifier,
            min_feature_tests,
            log,
            report,
            artifact_index,
        } => {
            let spec = match scenario {
                Some(path) => ScenarioSpec::from_file(&path)?,
                None => ScenarioSpec::preset(&preset)
                    .ok_or_else(|| format!("unknown preset '{preset}'"))?,
            };
            let config = resolve_config(
                config.as_deref(),
                window,
                sketch_k,
                alpha,
                seed,
                balance,
                classifier.as_deref(),
                min_feature_tests,
            )?;
            let steps = steps.unwrap_or(spec.steps);
            let name = spec.name.clone();
            let run_id = format!("{name}-seed{}", config.seed);
            let mut stream = GaussianClassStream::new(spec)?;
            let runner = PrequentialRunner::new(&name, config, steps);

            let log_to_stdout = log.as_deref() == Some(Path::new("-"));
            let mut emitter = match &log {
                Some(_) if log_to_stdout => Some(LogEmitter::to_stdout("cli", &run_id)),
                Some(path) => Some(LogEmitter::to_file(path, "cli", &run_id)?),
                None => None,
            };
            let result = runner.run(&mut stream, emitter.as_mut())?;

            eprintln!(
                "{name}: {steps} steps, accuracy {:.4}, {} drift reset(s)",
                result.accuracy,
                result.total_drifts()
            );
            for (class, resets) in result.drift_steps.iter().enumerate() {
                eprintln!("  class {class}: {resets:?}");
            }

            match &report {
                Some(path) if path.extension().and_then(|e| e.to_str()) == Some("md") => {
                    std::fs::write(path, result.to_markdown())?;
                }
                Some(path) => std::fs::write(path, result.to_json()?)?,
                None if log_to_stdout => {}
                None => println!("{}", result.to_json()?),
            }

            if let Some(index_path) = artifact_index {
                let mut index = ArtifactIndex::new(&run_id);
                if let Some(path) = log.as_ref().filter(|_| !log_to_stdout) {
                    index.add_file(path, "log")?;
                }
                if let Some(path) = &report {
                    index.add_file(path, "report")?;
                }
                std::fs::write(&index_path, index.to_json()?)?;
            }
        }
        Command::Presets => {
            println!("{}", serde_json::to_string_pretty(&ScenarioSpec::presets())?);
        }
        Command::ValidateLog { path } => {
            let (lines, errors) = validate_log_file(&path)?;
            if errors.is_empty() {
                eprintln!("{}: {lines} line(s) valid", path.display());
            } else {
                for err in &errors {
                    eprintln!("{err}");
                }
                return Err(format!(
                    "{}: {} error(s) across {lines} line(s)",
                    path.display(),
                    errors.len()
                )
                .into());
            }
        }
    }

    Ok(())
}
