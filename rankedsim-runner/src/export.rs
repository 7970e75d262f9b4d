//! Reporting and export: JSON, CSV, and Markdown artifact generation.
//!
//! A run is persisted as a directory holding:
//! - `summary.json`: manifest, summary statistics and histogram
//! - `histogram.csv`: one row per non-empty bin plus the abandoned bucket
//! - `sample.csv`: raw battle count for every trial
//! - `report.md`: human-readable report
//!
//! `summary.json` carries a `schema_version`. Newer versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rankedsim_core::{ParameterSnapshot, SimulationParameters};

use crate::summary::{Histogram, SampleSummary};
use crate::trial_runner::ResultSample;

/// Current artifact schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Provenance for one run: what was simulated, with which seed, and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub schema_version: u32,
    pub config_hash: String,
    pub parameters: ParameterSnapshot,
    pub trials: usize,
    pub seed: u64,
    pub generated_at: DateTime<Utc>,
}

impl RunManifest {
    pub fn new(
        params: &SimulationParameters,
        trials: usize,
        seed: u64,
        config_hash: impl Into<String>,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            config_hash: config_hash.into(),
            parameters: params.snapshot(),
            trials,
            seed,
            generated_at: Utc::now(),
        }
    }
}

/// Everything written to `summary.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub manifest: RunManifest,
    pub summary: SampleSummary,
    pub histogram: Histogram,
}

impl RunReport {
    pub fn new(manifest: RunManifest, sample: &ResultSample, bin_width: u32) -> Self {
        Self {
            manifest,
            summary: SampleSummary::from_sample(sample),
            histogram: Histogram::from_sample(sample, bin_width),
        }
    }
}

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `RunReport` to pretty JSON.
pub fn export_summary_json(report: &RunReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize RunReport to JSON")
}

/// Deserialize a `RunReport`, rejecting unknown schema versions.
pub fn import_summary_json(json: &str) -> Result<RunReport> {
    let report: RunReport =
        serde_json::from_str(json).context("failed to deserialize RunReport from JSON")?;
    if report.manifest.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.manifest.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Histogram as CSV.
///
/// Columns: bucket, lower, upper, count, percent. The abandoned bucket is the
/// last row, with empty bounds.
pub fn export_histogram_csv(histogram: &Histogram) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["bucket", "lower", "upper", "count", "percent"])?;
    for bin in &histogram.bins {
        let label = if bin.lower == bin.upper {
            bin.lower.to_string()
        } else {
            format!("{}-{}", bin.lower, bin.upper)
        };
        wtr.write_record([
            &label,
            &bin.lower.to_string(),
            &bin.upper.to_string(),
            &bin.count.to_string(),
            &format!("{:.4}", bin.percent),
        ])?;
    }
    wtr.write_record([
        "abandoned",
        "",
        "",
        &histogram.abandoned.to_string(),
        &format!("{:.4}", histogram.abandoned_pct),
    ])?;
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Raw sample as CSV with trial, battles and abandoned columns.
pub fn export_sample_csv(sample: &ResultSample) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["trial", "battles", "abandoned"])?;
    for (i, &battles) in sample.battles().iter().enumerate() {
        wtr.write_record([
            &i.to_string(),
            &battles.to_string(),
            &sample.is_abandoned(battles).to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for one run.
///
/// Creates `{ladder}_{timestamp}/` under `output_dir` and returns its path.
pub fn save_artifacts(
    report: &RunReport,
    sample: &ResultSample,
    output_dir: &Path,
) -> Result<PathBuf> {
    let dirname = format!(
        "{}_{}",
        report.manifest.parameters.ladder,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("summary.json"), export_summary_json(report)?)?;
    std::fs::write(
        run_dir.join("histogram.csv"),
        export_histogram_csv(&report.histogram)?,
    )?;
    std::fs::write(run_dir.join("sample.csv"), export_sample_csv(sample)?)?;
    std::fs::write(run_dir.join("report.md"), generate_report(report))?;

    log::info!("artifacts written to {}", run_dir.display());
    Ok(run_dir)
}

/// Load a `RunReport` from an artifact directory's summary.json.
pub fn load_report(dir: &Path) -> Result<RunReport> {
    let path = dir.join("summary.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_summary_json(&json)
}

// ─── Markdown report ────────────────────────────────────────────────

/// Generate a Markdown report for one run.
pub fn generate_report(report: &RunReport) -> String {
    let mut md = String::with_capacity(2048);
    let m = &report.manifest;
    let p = &m.parameters;
    let s = &report.summary;

    md.push_str("# Ranked Ladder Simulation\n\n");

    md.push_str("## Parameters\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Ladder | {} |\n", p.ladder));
    md.push_str(&format!("| Ranks | {} to {} |\n", p.start_rank, p.end_rank));
    md.push_str(&format!("| Win Rate | {:.1}% |\n", p.win_rate * 100.0));
    md.push_str(&format!(
        "| First-Place Rate | {:.1}% |\n",
        p.first_place_rate * 100.0
    ));
    md.push_str(&format!("| Max Battles | {} |\n", p.max_battles));
    md.push_str(&format!("| Trials | {} |\n", m.trials));
    md.push_str(&format!("| Seed | {} |\n", m.seed));
    md.push_str(&format!("| Config Hash | {} |\n", m.config_hash));
    md.push_str(&format!(
        "| Generated | {} |\n",
        m.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    md.push('\n');

    md.push_str("## Battles to Finish\n\n");
    match &s.stats {
        Some(st) => {
            md.push_str("| Statistic | Value |\n");
            md.push_str("| --- | ---: |\n");
            md.push_str(&format!("| Completed | {} |\n", s.completed));
            md.push_str(&format!("| Mean | {:.1} |\n", st.mean));
            md.push_str(&format!("| Std Dev | {:.1} |\n", st.std_dev));
            md.push_str(&format!("| Min | {} |\n", st.min));
            md.push_str(&format!("| P10 | {:.1} |\n", st.p10));
            md.push_str(&format!("| P25 | {:.1} |\n", st.p25));
            md.push_str(&format!("| Median | {:.1} |\n", st.median));
            md.push_str(&format!("| P75 | {:.1} |\n", st.p75));
            md.push_str(&format!("| P90 | {:.1} |\n", st.p90));
            md.push_str(&format!("| Max | {} |\n", st.max));
        }
        None => md.push_str("No trial reached the end rank.\n"),
    }
    md.push('\n');

    if s.abandoned > 0 {
        md.push_str(&format!(
            "**{} trials ({:.2}%) exceeded {} battles and were abandoned.**\n\n",
            s.abandoned, s.abandoned_pct, s.max_battles
        ));
    }

    let h = &report.histogram;
    md.push_str("## Histogram\n\n");
    md.push_str(&format!("Bin width: {}\n\n", h.bin_width));
    md.push_str("| Battles | Trials | % |\n");
    md.push_str("| --- | ---: | ---: |\n");
    for bin in &h.bins {
        let range = if bin.lower == bin.upper {
            bin.lower.to_string()
        } else {
            format!("{}-{}", bin.lower, bin.upper)
        };
        md.push_str(&format!(
            "| {range} | {} | {:.2}% |\n",
            bin.count, bin.percent
        ));
    }
    if h.abandoned > 0 {
        md.push_str(&format!(
            "| abandoned | {} | {:.2}% |\n",
            h.abandoned, h.abandoned_pct
        ));
    }

    md
}
