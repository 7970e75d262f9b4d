//! Simulation parameters shared read-only by every trial.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ladder::{LadderConfiguration, LadderError, Rank};

/// Default chance of winning a battle.
pub const DEFAULT_WIN_RATE: f64 = 0.5;
/// Default chance that a loss keeps its star (placing first on the losing team).
pub const DEFAULT_FIRST_PLACE_RATE: f64 = 1.0 / 7.0;
/// Default battle budget before a trial is abandoned.
pub const DEFAULT_MAX_BATTLES: u32 = 10_000;
/// Largest accepted battle budget. An abandoned trial reports
/// `max_battles + 1`, which must still fit in a `u32`.
pub const MAX_BATTLES_LIMIT: u32 = u32::MAX - 1;

/// Errors from invalid simulation parameters.
#[derive(Debug, Error)]
pub enum ParamError {
    #[error("win rate {0} is outside [0, 1]")]
    WinRate(f64),
    #[error("first-place rate {0} is outside [0, 1]")]
    FirstPlaceRate(f64),
    #[error("max battles must be at least 1")]
    ZeroMaxBattles,
    #[error("max battles {0} exceeds the limit of {limit}", limit = MAX_BATTLES_LIMIT)]
    MaxBattlesTooLarge(u32),
    #[error(transparent)]
    Ladder(#[from] LadderError),
}

/// Everything a trial needs: rates, battle cap, ladder and rank bounds.
///
/// Construction validates every field, so a `SimulationParameters` value is
/// always safe to hand to the simulator.
#[derive(Debug, Clone)]
pub struct SimulationParameters {
    win_rate: f64,
    first_place_rate: f64,
    max_battles: u32,
    ladder: Arc<LadderConfiguration>,
    start_rank: Rank,
    end_rank: Rank,
}

/// Plain-data view of the parameters for manifests and reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSnapshot {
    pub ladder: String,
    pub win_rate: f64,
    pub first_place_rate: f64,
    pub max_battles: u32,
    pub start_rank: Rank,
    pub end_rank: Rank,
}

fn check_rate(rate: f64) -> bool {
    rate.is_finite() && (0.0..=1.0).contains(&rate)
}

impl SimulationParameters {
    /// Start and end ranks default to the ladder's own.
    pub fn new(
        ladder: impl Into<Arc<LadderConfiguration>>,
        win_rate: f64,
        first_place_rate: f64,
        max_battles: u32,
    ) -> Result<Self, ParamError> {
        if !check_rate(win_rate) {
            return Err(ParamError::WinRate(win_rate));
        }
        if !check_rate(first_place_rate) {
            return Err(ParamError::FirstPlaceRate(first_place_rate));
        }
        if max_battles == 0 {
            return Err(ParamError::ZeroMaxBattles);
        }
        if max_battles > MAX_BATTLES_LIMIT {
            return Err(ParamError::MaxBattlesTooLarge(max_battles));
        }
        let ladder = ladder.into();
        Ok(Self {
            win_rate,
            first_place_rate,
            max_battles,
            start_rank: ladder.start_rank(),
            end_rank: ladder.end_rank(),
            ladder,
        })
    }

    pub fn with_start_rank(mut self, rank: Rank) -> Result<Self, ParamError> {
        self.ladder.check_range(rank, self.end_rank)?;
        self.start_rank = rank;
        Ok(self)
    }

    pub fn with_end_rank(mut self, rank: Rank) -> Result<Self, ParamError> {
        self.ladder.check_range(self.start_rank, rank)?;
        self.end_rank = rank;
        Ok(self)
    }

    pub fn win_rate(&self) -> f64 {
        self.win_rate
    }

    pub fn first_place_rate(&self) -> f64 {
        self.first_place_rate
    }

    pub fn max_battles(&self) -> u32 {
        self.max_battles
    }

    pub fn ladder(&self) -> &LadderConfiguration {
        &self.ladder
    }

    pub fn start_rank(&self) -> Rank {
        self.start_rank
    }

    pub fn end_rank(&self) -> Rank {
        self.end_rank
    }

    /// A trial that returned more battles than the cap was abandoned.
    pub fn is_abandoned(&self, battles: u32) -> bool {
        battles > self.max_battles
    }

    /// Fewest battles any trial can take under these bounds.
    pub fn minimum_battles(&self) -> u32 {
        self.ladder.minimum_battles(self.start_rank, self.end_rank)
    }

    pub fn snapshot(&self) -> ParameterSnapshot {
        ParameterSnapshot {
            ladder: self.ladder.name().to_string(),
            win_rate: self.win_rate,
            first_place_rate: self.first_place_rate,
            max_battles: self.max_battles,
            start_rank: self.start_rank,
            end_rank: self.end_rank,
        }
    }
}
