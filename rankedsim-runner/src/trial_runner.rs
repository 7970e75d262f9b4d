//! Trial runner: fans independent trials out over a rayon pool.
//!
//! Each trial gets its own generator derived from `(master_seed, trial_index)`,
//! so a given seed yields the same sample whatever the thread count. The only
//! shared mutable state is the optional cancellation flag, checked before
//! each trial starts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use rankedsim_core::rng::RngHierarchy;
use rankedsim_core::simulator::run_trial;
use rankedsim_core::SimulationParameters;

/// Default number of trials per run.
pub const DEFAULT_TRIALS: usize = 5_000;
/// Default master seed.
pub const DEFAULT_SEED: u64 = 42;

/// Errors from the trial runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("number of trials must be at least 1")]
    NoTrials,
    #[error("run cancelled after {completed} of {requested} trials")]
    Cancelled { completed: usize, requested: usize },
    #[error("failed to build trial thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Battle counts from a batch of trials.
///
/// Abandoned trials stay in the sample with a count of `max_battles + 1`;
/// nothing is filtered here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSample {
    battles: Vec<u32>,
    max_battles: u32,
}

impl ResultSample {
    pub fn new(battles: Vec<u32>, max_battles: u32) -> Self {
        Self {
            battles,
            max_battles,
        }
    }

    pub fn battles(&self) -> &[u32] {
        &self.battles
    }

    pub fn max_battles(&self) -> u32 {
        self.max_battles
    }

    pub fn len(&self) -> usize {
        self.battles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.battles.is_empty()
    }

    pub fn is_abandoned(&self, battles: u32) -> bool {
        battles > self.max_battles
    }

    pub fn abandoned_count(&self) -> usize {
        self.battles.iter().filter(|&&b| self.is_abandoned(b)).count()
    }

    /// Battle counts of trials that reached the end rank.
    pub fn completed(&self) -> impl Iterator<Item = u32> + '_ {
        self.battles.iter().copied().filter(move |&b| !self.is_abandoned(b))
    }

    pub fn into_battles(self) -> Vec<u32> {
        self.battles
    }
}

/// Runs batches of independent trials.
#[derive(Debug, Clone)]
pub struct TrialRunner {
    rng: RngHierarchy,
    threads: usize,
    parallel: bool,
}

impl Default for TrialRunner {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl TrialRunner {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: RngHierarchy::new(seed),
            threads: 0,
            parallel: true,
        }
    }

    /// Worker thread count. `0` uses the available hardware parallelism.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn seed(&self) -> u64 {
        self.rng.master_seed()
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Run `num_trials` trials and collect their battle counts.
    pub fn run_many(
        &self,
        params: &SimulationParameters,
        num_trials: usize,
    ) -> Result<ResultSample, RunError> {
        let never = AtomicBool::new(false);
        self.run_many_with_cancel(params, num_trials, &never)
    }

    /// Like [`run_many`](Self::run_many), but stops starting new trials once
    /// `cancel` is set. A cancelled run returns [`RunError::Cancelled`].
    pub fn run_many_with_cancel(
        &self,
        params: &SimulationParameters,
        num_trials: usize,
        cancel: &AtomicBool,
    ) -> Result<ResultSample, RunError> {
        if num_trials == 0 {
            return Err(RunError::NoTrials);
        }

        let start = Instant::now();
        let run_one = |trial: usize| -> Option<u32> {
            if cancel.load(Ordering::Relaxed) {
                return None;
            }
            let mut rng = self.rng.trial_rng(trial as u64);
            Some(run_trial(params, &mut rng))
        };

        let results: Vec<Option<u32>> = if self.parallel {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.threads)
                .thread_name(|i| format!("rankedsim-trial-{i}"))
                .build()?;
            log::debug!(
                "running {num_trials} trials on {} threads",
                pool.current_num_threads()
            );
            pool.install(|| (0..num_trials).into_par_iter().map(&run_one).collect())
        } else {
            log::debug!("running {num_trials} trials sequentially");
            (0..num_trials).map(&run_one).collect()
        };

        let battles: Vec<u32> = results.into_iter().flatten().collect();
        if battles.len() < num_trials {
            log::warn!(
                "cancelled after {} of {num_trials} trials",
                battles.len()
            );
            return Err(RunError::Cancelled {
                completed: battles.len(),
                requested: num_trials,
            });
        }

        let sample = ResultSample::new(battles, params.max_battles());
        let elapsed = start.elapsed().as_secs_f64();
        let throughput = if elapsed > 0.0 {
            num_trials as f64 / elapsed
        } else {
            0.0
        };
        log::info!(
            "ran {num_trials} trials in {elapsed:.2}s ({throughput:.0} trials/s)"
        );

        let abandoned = sample.abandoned_count();
        if abandoned > 0 {
            log::warn!(
                "{abandoned} of {num_trials} trials exceeded {} battles and were abandoned",
                params.max_battles()
            );
        }

        Ok(sample)
    }
}
