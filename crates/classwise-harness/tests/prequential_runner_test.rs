use std::path::PathBuf;

use classwise_core::EnsembleConfig;
use classwise_harness::structured_log::{
    ArtifactIndex, LogEmitter, sha256_hex, validate_log_file, validate_log_line,
};
use classwise_harness::{GaussianClassStream, PrequentialRunner, ScenarioSpec};

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("classwise-{}-{name}", std::process::id()))
}

fn shift_config() -> EnsembleConfig {
    EnsembleConfig::default()
        .with_window_size(50)
        .with_alpha(1e-4)
        .with_seed(7)
}

#[test]
fn class_shift_preset_resets_only_the_shifted_class() {
    let spec = ScenarioSpec::class_shift();
    let switch = spec.shifts[0].at_step;
    let steps = spec.steps;
    let mut stream = GaussianClassStream::new(spec).unwrap();
    let report = PrequentialRunner::new("class-shift", shift_config(), steps)
        .run(&mut stream, None)
        .unwrap();

    assert!(report.drift_steps[0].is_empty(), "{:?}", report.drift_steps);
    assert!(
        report.drift_steps[1].iter().any(|&s| s >= switch),
        "{:?}",
        report.drift_steps
    );
    assert_eq!(report.summary.drift_count as usize, report.total_drifts());
    assert!(report.checks > 0);
    assert!(report.accuracy > 0.8, "{}", report.accuracy);
}

#[test]
fn emitted_log_validates_and_records_resets() {
    let log_path = temp_path("run.jsonl");
    let spec = ScenarioSpec::class_shift();
    let steps = spec.steps;
    let mut stream = GaussianClassStream::new(spec).unwrap();
    let mut emitter = LogEmitter::to_file(&log_path, "e2e", "class-shift-seed7").unwrap();
    let report = PrequentialRunner::new("class-shift", shift_config(), steps)
        .run(&mut stream, Some(&mut emitter))
        .unwrap();
    drop(emitter);

    let (lines, errors) = validate_log_file(&log_path).unwrap();
    assert!(errors.is_empty(), "{:?}", errors.iter().map(ToString::to_string).collect::<Vec<_>>());

    let content = std::fs::read_to_string(&log_path).unwrap();
    let entries: Vec<_> = content
        .lines()
        .enumerate()
        .map(|(i, line)| validate_log_line(line, i + 1).unwrap())
        .collect();
    assert_eq!(entries.len(), lines);
    assert_eq!(entries.first().map(|e| e.event.as_str()), Some("run_start"));
    assert_eq!(entries.last().map(|e| e.event.as_str()), Some("run_summary"));
    let resets = entries.iter().filter(|e| e.event == "drift_reset").count();
    assert_eq!(resets, report.total_drifts());
    assert!(entries.iter().all(|e| e.trace_id.starts_with("e2e::class-shift-seed7::")));

    let mut index = ArtifactIndex::new("class-shift-seed7");
    index.add_file(&log_path, "log").unwrap();
    let bytes = std::fs::read(&log_path).unwrap();
    assert_eq!(index.artifacts[0].sha256, sha256_hex(&bytes));
    assert_eq!(index.artifacts[0].size_bytes, Some(bytes.len() as u64));

    std::fs::remove_file(&log_path).unwrap();
}

#[test]
fn stable_preset_stays_quiet() {
    let spec = ScenarioSpec::stable();
    let steps = spec.steps;
    let mut stream = GaussianClassStream::new(spec).unwrap();
    let config = EnsembleConfig::default().with_window_size(60).with_alpha(1e-4);
    let report = PrequentialRunner::new("stable", config, steps)
        .run(&mut stream, None)
        .unwrap();
    assert_eq!(report.total_drifts(), 0, "{:?}", report.drift_steps);
    assert!(report.checks >= 10);
}
