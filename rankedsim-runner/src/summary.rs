//! Sample summaries: statistics and histograms over battle counts.
//!
//! Statistics cover completed trials only. Abandoned trials are counted
//! separately and get their own histogram bucket, so percentages across the
//! bins plus the abandoned bucket add up to 100%.

use serde::{Deserialize, Serialize};

use crate::trial_runner::ResultSample;

/// Upper bound on bins picked by [`Histogram::auto_bin_width`].
pub const DEFAULT_TARGET_BINS: u32 = 40;

/// Distribution statistics over completed trials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleStats {
    pub min: u32,
    pub max: u32,
    pub mean: f64,
    pub std_dev: f64,
    pub median: f64,
    pub p10: f64,
    pub p25: f64,
    pub p75: f64,
    pub p90: f64,
}

/// Headline numbers for one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleSummary {
    pub trials: usize,
    pub completed: usize,
    pub abandoned: usize,
    /// Abandoned share of all trials, in percent.
    pub abandoned_pct: f64,
    pub max_battles: u32,
    /// `None` when no trial completed.
    pub stats: Option<BattleStats>,
}

impl SampleSummary {
    pub fn from_sample(sample: &ResultSample) -> Self {
        let mut completed: Vec<u32> = sample.completed().collect();
        completed.sort_unstable();

        let trials = sample.len();
        let abandoned = trials - completed.len();

        Self {
            trials,
            completed: completed.len(),
            abandoned,
            abandoned_pct: percent(abandoned, trials),
            max_battles: sample.max_battles(),
            stats: battle_stats(&completed),
        }
    }
}

fn battle_stats(sorted: &[u32]) -> Option<BattleStats> {
    let (&min, &max) = (sorted.first()?, sorted.last()?);
    let values: Vec<f64> = sorted.iter().map(|&b| f64::from(b)).collect();
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = if values.len() > 1 {
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)
    } else {
        0.0
    };

    Some(BattleStats {
        min,
        max,
        mean,
        std_dev: variance.sqrt(),
        median: percentile_sorted(&values, 50.0),
        p10: percentile_sorted(&values, 10.0),
        p25: percentile_sorted(&values, 25.0),
        p75: percentile_sorted(&values, 75.0),
        p90: percentile_sorted(&values, 90.0),
    })
}

/// Percentile of a sorted slice using linear interpolation.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n == 1 {
        return sorted[0];
    }
    let rank = (p / 100.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = rank - lo as f64;
    sorted[lo] * (1.0 - frac) + sorted[hi] * frac
}

fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * count as f64 / total as f64
    }
}

/// Empirical probability that a trial finishes within `battles` battles.
///
/// Abandoned trials count as not finishing.
pub fn probability_within(sample: &ResultSample, battles: u32) -> f64 {
    if sample.is_empty() {
        return 0.0;
    }
    let hits = sample.completed().filter(|&b| b <= battles).count();
    hits as f64 / sample.len() as f64
}

/// One histogram bin covering `lower..=upper` battles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: u32,
    pub upper: u32,
    pub count: usize,
    /// Share of all trials, in percent.
    pub percent: f64,
}

/// Histogram of completed trials plus an abandoned bucket.
///
/// Only non-empty bins are listed, in ascending order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub bin_width: u32,
    pub bins: Vec<HistogramBin>,
    pub abandoned: usize,
    pub abandoned_pct: f64,
    pub total: usize,
}

impl Histogram {
    /// Bin completed trials into `bin_width`-wide buckets aligned to multiples
    /// of the width. A width of 0 is treated as 1.
    pub fn from_sample(sample: &ResultSample, bin_width: u32) -> Self {
        let width = bin_width.max(1);
        let total = sample.len();

        let mut counts: std::collections::BTreeMap<u32, usize> = std::collections::BTreeMap::new();
        for battles in sample.completed() {
            *counts.entry(battles / width).or_insert(0) += 1;
        }

        let bins = counts
            .into_iter()
            .map(|(bucket, count)| {
                let lower = bucket * width;
                HistogramBin {
                    lower,
                    upper: lower + (width - 1),
                    count,
                    percent: percent(count, total),
                }
            })
            .collect();

        let abandoned = sample.abandoned_count();
        Self {
            bin_width: width,
            bins,
            abandoned,
            abandoned_pct: percent(abandoned, total),
            total,
        }
    }

    /// Smallest width giving at most `target_bins` bins over the completed range.
    pub fn auto_bin_width(sample: &ResultSample, target_bins: u32) -> u32 {
        let mut completed = sample.completed();
        let Some(first) = completed.next() else {
            return 1;
        };
        let (min, max) = completed.fold((first, first), |(lo, hi), b| (lo.min(b), hi.max(b)));
        let span = max - min + 1;
        span.div_ceil(target_bins.max(1)).max(1)
    }

    /// Bin holding the most trials. Ties go to the lower bin.
    pub fn mode(&self) -> Option<&HistogramBin> {
        self.bins
            .iter()
            .reduce(|best, bin| if bin.count > best.count { bin } else { best })
    }
}
