//! Config-to-artifacts pipeline tests.

use rankedsim_runner::{
    load_report, save_artifacts, Histogram, RunConfig, RunManifest, RunReport, DEFAULT_TARGET_BINS,
};

const CONFIG: &str = r#"
[simulation]
win_rate = 0.6
trials = 500
seed = 11

[ladder]
preset = "sprint"
"#;

#[test]
fn config_run_and_save_artifacts() {
    let config = RunConfig::from_toml(CONFIG).unwrap();
    let params = config.build_parameters().unwrap();
    let sample = config
        .trial_runner()
        .run_many(&params, config.simulation.trials)
        .unwrap();
    assert_eq!(sample.len(), 500);

    let manifest = RunManifest::new(
        &params,
        sample.len(),
        config.simulation.seed,
        config.config_hash().unwrap(),
    );
    let width = Histogram::auto_bin_width(&sample, DEFAULT_TARGET_BINS);
    let report = RunReport::new(manifest, &sample, width);

    let dir = tempfile::tempdir().unwrap();
    let run_dir = save_artifacts(&report, &sample, dir.path()).unwrap();
    assert!(run_dir
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("sprint_"));

    for file in ["summary.json", "histogram.csv", "sample.csv", "report.md"] {
        assert!(run_dir.join(file).is_file(), "missing {file}");
    }

    let sample_csv = std::fs::read_to_string(run_dir.join("sample.csv")).unwrap();
    assert_eq!(sample_csv.lines().count(), 501);

    let loaded = load_report(&run_dir).unwrap();
    assert_eq!(loaded.manifest, report.manifest);
    assert_eq!(loaded.summary.trials, 500);
    assert_eq!(loaded.histogram.bin_width, width);
}

#[test]
fn config_file_with_custom_ladder() {
    let dir = tempfile::tempdir().unwrap();
    let ladder_path = dir.path().join("ladder.toml");
    std::fs::write(
        &ladder_path,
        r#"
name = "mini"

[[ranks]]
rank = 3
stars = 2
irrevocable = true

[[ranks]]
rank = 2
stars = 2
free_star = true

[[ranks]]
rank = 1
stars = 1
"#,
    )
    .unwrap();

    let config_path = dir.path().join("run.toml");
    std::fs::write(
        &config_path,
        format!(
            "[simulation]\nwin_rate = 1.0\ntrials = 10\n\n[ladder]\nfile = {:?}\n",
            ladder_path.display().to_string()
        ),
    )
    .unwrap();

    let config = RunConfig::from_file(&config_path).unwrap();
    let params = config.build_parameters().unwrap();
    assert_eq!(params.ladder().name(), "mini");

    // Two wins clear rank 3, the free star leaves one more win at rank 2.
    let sample = config.trial_runner().run_many(&params, 10).unwrap();
    assert!(sample.battles().iter().all(|&b| b == 3));
}

#[test]
fn load_report_missing_dir_fails() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_report(&dir.path().join("nope")).unwrap_err();
    assert!(err.to_string().contains("failed to read"));
}
