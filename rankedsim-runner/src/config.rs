//! Serializable run configuration (TOML).
//!
//! ```toml
//! [simulation]
//! win_rate = 0.5
//! first_place_rate = 0.142857
//! max_battles = 10000
//! trials = 5000
//! seed = 42
//! threads = 0
//!
//! [ladder]
//! preset = "regular"      # or: file = "ladders/custom.toml"
//! end_rank = 17           # optional
//! ```
//!
//! Every field has a default, so an empty file is a valid configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use rankedsim_core::{
    LadderConfiguration, LadderError, LadderPreset, ParamError, Rank, SimulationParameters,
    DEFAULT_FIRST_PLACE_RATE, DEFAULT_MAX_BATTLES, DEFAULT_WIN_RATE,
};

use crate::trial_runner::{TrialRunner, DEFAULT_SEED, DEFAULT_TRIALS};

/// Errors from loading or resolving a run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("ladder error: {0}")]
    Ladder(#[from] LadderError),
    #[error("parameter error: {0}")]
    Params(#[from] ParamError),
    #[error("number of trials must be at least 1")]
    NoTrials,
    #[error("[ladder] sets both preset and file; choose one")]
    AmbiguousLadder,
}

/// Complete configuration for one simulation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunConfig {
    pub simulation: SimulationSection,
    pub ladder: LadderSection,
}

/// Rates, budgets, and execution settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationSection {
    pub win_rate: f64,
    pub first_place_rate: f64,
    pub max_battles: u32,
    pub trials: usize,
    pub seed: u64,
    /// Worker threads; 0 uses all available cores.
    pub threads: usize,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            win_rate: DEFAULT_WIN_RATE,
            first_place_rate: DEFAULT_FIRST_PLACE_RATE,
            max_battles: DEFAULT_MAX_BATTLES,
            trials: DEFAULT_TRIALS,
            seed: DEFAULT_SEED,
            threads: 0,
        }
    }
}

/// Ladder selection and optional rank bounds.
///
/// With neither `preset` nor `file` set, the regular ladder is used.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LadderSection {
    pub preset: Option<LadderPreset>,
    /// Custom ladder TOML. Loaded through [`RunConfig::from_file`], a relative
    /// path is taken relative to the config file's directory.
    pub file: Option<PathBuf>,
    pub start_rank: Option<Rank>,
    pub end_rank: Option<Rank>,
}

impl RunConfig {
    /// Load a configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&content)?;
        if let (Some(file), Some(dir)) = (&config.ladder.file, path.parent()) {
            if file.is_relative() {
                config.ladder.file = Some(dir.join(file));
            }
        }
        Ok(config)
    }

    /// Parse a configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Build the ladder named by the `[ladder]` section, without rank overrides.
    pub fn resolve_ladder(&self) -> Result<LadderConfiguration, ConfigError> {
        let ladder = match (&self.ladder.preset, &self.ladder.file) {
            (Some(_), Some(_)) => return Err(ConfigError::AmbiguousLadder),
            (_, Some(path)) => LadderConfiguration::from_file(path)?,
            (Some(preset), None) => preset.ladder()?,
            (None, None) => LadderPreset::Regular.ladder()?,
        };
        Ok(ladder)
    }

    /// Resolve the ladder and validate everything into simulation parameters.
    ///
    /// Start rank is applied before end rank, so an end override is checked
    /// against the overridden start.
    pub fn build_parameters(&self) -> Result<SimulationParameters, ConfigError> {
        if self.simulation.trials == 0 {
            return Err(ConfigError::NoTrials);
        }

        let mut params = SimulationParameters::new(
            self.resolve_ladder()?,
            self.simulation.win_rate,
            self.simulation.first_place_rate,
            self.simulation.max_battles,
        )?;
        if let Some(start) = self.ladder.start_rank {
            params = params.with_start_rank(start)?;
        }
        if let Some(end) = self.ladder.end_rank {
            params = params.with_end_rank(end)?;
        }
        Ok(params)
    }

    /// Trial runner configured with this run's seed and thread count.
    pub fn trial_runner(&self) -> TrialRunner {
        TrialRunner::new(self.simulation.seed).with_threads(self.simulation.threads)
    }

    /// Deterministic identifier of this configuration (BLAKE3 over canonical JSON).
    ///
    /// Two configs with identical fields hash identically; thread count is
    /// included even though it does not affect the sample.
    pub fn config_hash(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_vec(self)?;
        Ok(blake3::hash(&json).to_hex().to_string())
    }
}
