//! RankedSim Runner: trial orchestration, run configuration, summaries, export.
//!
//! This crate builds on `rankedsim-core` to provide:
//! - Parallel trial execution with per-trial RNG streams and cancellation
//! - TOML run configuration with a deterministic config hash
//! - Sample statistics and histograms with an abandoned bucket
//! - JSON, CSV and Markdown artifacts

pub mod config;
pub mod export;
pub mod summary;
pub mod trial_runner;

pub use config::{ConfigError, LadderSection, RunConfig, SimulationSection};
pub use export::{
    export_histogram_csv, export_sample_csv, export_summary_json, generate_report,
    import_summary_json, load_report, save_artifacts, RunManifest, RunReport, SCHEMA_VERSION,
};
pub use summary::{
    percentile_sorted, probability_within, BattleStats, Histogram, HistogramBin, SampleSummary,
    DEFAULT_TARGET_BINS,
};
pub use trial_runner::{ResultSample, RunError, TrialRunner, DEFAULT_SEED, DEFAULT_TRIALS};
