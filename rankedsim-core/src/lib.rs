//! RankedSim Core: rank ladders, simulation parameters, and the battle state machine.
//!
//! This crate contains the heart of the ranked-ladder simulator:
//! - Rank ladder tables with construction-time validation
//! - Built-in regular and sprint ladder presets
//! - Validated simulation parameters shared read-only by all trials
//! - Deterministic per-trial RNG derivation
//! - Single-trial battle simulator (promotion, demotion, irrevocable ranks, free stars)

pub mod ladder;
pub mod params;
pub mod presets;
pub mod rng;
pub mod simulator;

pub use ladder::{LadderConfiguration, LadderError, Rank, RankDefinition};
pub use params::{
    ParamError, ParameterSnapshot, SimulationParameters, DEFAULT_FIRST_PLACE_RATE,
    DEFAULT_MAX_BATTLES, DEFAULT_WIN_RATE, MAX_BATTLES_LIMIT,
};
pub use presets::LadderPreset;
pub use rng::RngHierarchy;
pub use simulator::{
    resolve_battle, run_trial, run_trial_observed, BattleOutcome, BattleStep, TrialState,
    Transition,
};
