//! Battle simulator: the single-trial rank-transition state machine.
//!
//! One battle runs in four steps:
//! 1. Count the battle; past `max_battles` the trial is abandoned.
//! 2. Resolve the outcome: win (+1 star), protected loss, or loss (-1 star).
//! 3. Promotion: stars hitting the rank's threshold exactly move the player
//!    up one rank, onto 0 stars or 1 if the new rank grants a free star.
//! 4. Demotion: negative stars either clamp to 0 (irrevocable rank, or the
//!    ladder's worst rank) or move the player down one rank, one star short
//!    of promoting back.
//!
//! Promotion only follows a win and demotion only follows a loss, so at most
//! one of steps 3 and 4 fires per battle.

use rand::Rng;
use serde::Serialize;

use crate::ladder::{LadderConfiguration, Rank};
use crate::params::SimulationParameters;

/// Result of a single battle before any rank change is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BattleOutcome {
    Win,
    /// Lost, but placed first on the losing team and kept the star.
    ProtectedLoss,
    Loss,
}

/// Rank change triggered by a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Transition {
    None,
    Promoted { from: Rank, to: Rank },
    Demoted { from: Rank, to: Rank },
    /// Stars would have gone negative but the rank held.
    Clamped { rank: Rank },
}

/// Per-battle report passed to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BattleStep {
    pub battle: u32,
    pub outcome: BattleOutcome,
    pub transition: Transition,
    pub rank: Rank,
    pub stars: i64,
}

/// Mutable state of one trial. Owned by a single simulator invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialState {
    pub current_rank: Rank,
    pub current_stars: i64,
    pub battles_played: u32,
}

impl TrialState {
    pub fn new(start_rank: Rank) -> Self {
        Self {
            current_rank: start_rank,
            current_stars: 0,
            battles_played: 0,
        }
    }

    /// Apply a battle outcome and the promotion/demotion rules that follow it.
    pub fn apply(&mut self, outcome: BattleOutcome, ladder: &LadderConfiguration) -> Transition {
        match outcome {
            BattleOutcome::Win => self.current_stars += 1,
            BattleOutcome::Loss => self.current_stars -= 1,
            BattleOutcome::ProtectedLoss => {}
        }

        let rank = self.current_rank;

        if self.current_stars == i64::from(ladder.stars_required(rank)) {
            let to = rank - 1;
            self.current_rank = to;
            self.current_stars = i64::from(ladder.definition(to).arrival_stars());
            return Transition::Promoted { from: rank, to };
        }

        if self.current_stars < 0 {
            if ladder.is_irrevocable(rank) || rank >= ladder.worst_rank() {
                self.current_stars = 0;
                return Transition::Clamped { rank };
            }
            let to = rank + 1;
            self.current_rank = to;
            self.current_stars = i64::from(ladder.stars_required(to)) - 1;
            return Transition::Demoted { from: rank, to };
        }

        Transition::None
    }
}

/// Draw one battle outcome.
///
/// The first draw decides win/loss against `win_rate`; only on a loss, a
/// second independent draw at or above `first_place_rate` costs the star.
pub fn resolve_battle<R: Rng + ?Sized>(
    rng: &mut R,
    win_rate: f64,
    first_place_rate: f64,
) -> BattleOutcome {
    if rng.gen::<f64>() < win_rate {
        BattleOutcome::Win
    } else if rng.gen::<f64>() >= first_place_rate {
        BattleOutcome::Loss
    } else {
        BattleOutcome::ProtectedLoss
    }
}

/// Run one trial and return the number of battles played.
///
/// Returns `max_battles + 1` when the trial is abandoned; see
/// [`SimulationParameters::is_abandoned`].
pub fn run_trial<R: Rng + ?Sized>(params: &SimulationParameters, rng: &mut R) -> u32 {
    run_trial_observed(params, rng, |_| {})
}

/// Run one trial, reporting every battle to `observer`.
pub fn run_trial_observed<R, F>(params: &SimulationParameters, rng: &mut R, mut observer: F) -> u32
where
    R: Rng + ?Sized,
    F: FnMut(&BattleStep),
{
    let ladder = params.ladder();
    let mut state = TrialState::new(params.start_rank());

    while state.current_rank != params.end_rank() {
        state.battles_played += 1;
        if params.is_abandoned(state.battles_played) {
            break;
        }

        let outcome = resolve_battle(rng, params.win_rate(), params.first_place_rate());
        let transition = state.apply(outcome, ladder);

        observer(&BattleStep {
            battle: state.battles_played,
            outcome,
            transition,
            rank: state.current_rank,
            stars: state.current_stars,
        });
    }

    state.battles_played
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ladder::RankDefinition;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ladder() -> LadderConfiguration {
        LadderConfiguration::new(
            "unit",
            vec![
                RankDefinition::new(5, 2, true, false),
                RankDefinition::new(4, 3, false, true),
                RankDefinition::new(3, 2, false, false),
                RankDefinition::new(2, 2, true, true),
                RankDefinition::new(1, 1, true, true),
            ],
        )
        .unwrap()
    }

    fn params(win_rate: f64, first_place_rate: f64, max_battles: u32) -> SimulationParameters {
        SimulationParameters::new(ladder(), win_rate, first_place_rate, max_battles).unwrap()
    }

    /// Every draw is 0.0.
    fn low_rng() -> StepRng {
        StepRng::new(0, 0)
    }

    /// Every draw is just below 1.0.
    fn high_rng() -> StepRng {
        StepRng::new(u64::MAX, 0)
    }

    #[test]
    fn win_adds_star_without_promotion() {
        let ladder = ladder();
        let mut state = TrialState::new(4);
        assert_eq!(state.apply(BattleOutcome::Win, &ladder), Transition::None);
        assert_eq!(state.current_stars, 1);
    }

    #[test]
    fn promotion_into_free_star_rank_starts_on_one() {
        let ladder = ladder();
        let mut state = TrialState::new(5);
        state.current_stars = 1;
        let t = state.apply(BattleOutcome::Win, &ladder);
        assert_eq!(t, Transition::Promoted { from: 5, to: 4 });
        assert_eq!(state.current_rank, 4);
        assert_eq!(state.current_stars, 1);
    }

    #[test]
    fn promotion_into_plain_rank_starts_on_zero() {
        let ladder = ladder();
        let mut state = TrialState::new(4);
        state.current_stars = 2;
        let t = state.apply(BattleOutcome::Win, &ladder);
        assert_eq!(t, Transition::Promoted { from: 4, to: 3 });
        assert_eq!(state.current_stars, 0);
    }

    #[test]
    fn demotion_lands_one_star_short() {
        let ladder = ladder();
        let mut state = TrialState::new(3);
        let t = state.apply(BattleOutcome::Loss, &ladder);
        assert_eq!(t, Transition::Demoted { from: 3, to: 4 });
        assert_eq!(state.current_rank, 4);
        assert_eq!(state.current_stars, 2);
    }

    #[test]
    fn demotion_never_grants_free_star() {
        let ladder = ladder();
        // Rank 4 grants a free star on promotion; arriving by demotion must not.
        let mut state = TrialState::new(3);
        state.apply(BattleOutcome::Loss, &ladder);
        assert_eq!(state.current_stars, i64::from(ladder.stars_required(4)) - 1);
    }

    #[test]
    fn irrevocable_rank_clamps_stars() {
        let ladder = ladder();
        let mut state = TrialState::new(2);
        let t = state.apply(BattleOutcome::Loss, &ladder);
        assert_eq!(t, Transition::Clamped { rank: 2 });
        assert_eq!(state.current_rank, 2);
        assert_eq!(state.current_stars, 0);
    }

    #[test]
    fn worst_rank_is_demotion_floor() {
        let ladder = LadderConfiguration::new(
            "floor",
            vec![
                RankDefinition::new(2, 2, false, false),
                RankDefinition::new(1, 1, false, false),
            ],
        )
        .unwrap();
        let mut state = TrialState::new(2);
        let t = state.apply(BattleOutcome::Loss, &ladder);
        assert_eq!(t, Transition::Clamped { rank: 2 });
        assert_eq!(state.current_stars, 0);
    }

    #[test]
    fn protected_loss_changes_nothing() {
        let ladder = ladder();
        let mut state = TrialState::new(3);
        state.current_stars = 1;
        assert_eq!(state.apply(BattleOutcome::ProtectedLoss, &ladder), Transition::None);
        assert_eq!(state.current_stars, 1);
        assert_eq!(state.current_rank, 3);
    }

    #[test]
    fn resolve_battle_respects_rate_endpoints() {
        assert_eq!(resolve_battle(&mut high_rng(), 1.0, 0.0), BattleOutcome::Win);
        assert_eq!(resolve_battle(&mut low_rng(), 0.0, 0.0), BattleOutcome::Loss);
        assert_eq!(resolve_battle(&mut high_rng(), 0.0, 1.0), BattleOutcome::ProtectedLoss);
        assert_eq!(resolve_battle(&mut low_rng(), 0.5, 0.5), BattleOutcome::Win);
        assert_eq!(resolve_battle(&mut high_rng(), 0.5, 0.5), BattleOutcome::Loss);
    }

    #[test]
    fn always_winning_takes_minimum_battles() {
        let p = params(1.0, 0.0, 1_000);
        let battles = run_trial(&p, &mut StdRng::seed_from_u64(1));
        // 5: 2, 4: 3 - 1 free, 3: 2, 2: 2 - 1 free.
        assert_eq!(battles, 2 + 2 + 2 + 1);
        assert_eq!(battles, p.minimum_battles());
    }

    #[test]
    fn never_winning_is_abandoned() {
        let p = params(0.0, 0.0, 50);
        let battles = run_trial(&p, &mut StdRng::seed_from_u64(1));
        assert_eq!(battles, 51);
        assert!(p.is_abandoned(battles));
    }

    #[test]
    fn start_equal_to_end_plays_nothing() {
        let p = params(0.5, 0.5, 10).with_start_rank(1).unwrap();
        assert_eq!(run_trial(&p, &mut StdRng::seed_from_u64(1)), 0);
    }

    #[test]
    fn observer_sees_every_battle() {
        let p = params(0.6, 0.2, 500);
        let mut steps = Vec::new();
        let battles = run_trial_observed(&p, &mut StdRng::seed_from_u64(9), |s| steps.push(*s));
        assert_eq!(steps.len() as u32, battles.min(p.max_battles()));
        for (i, step) in steps.iter().enumerate() {
            assert_eq!(step.battle, i as u32 + 1);
        }
    }

    #[test]
    fn seeded_trials_are_reproducible() {
        let p = params(0.55, 0.15, 10_000);
        let a = run_trial(&p, &mut StdRng::seed_from_u64(123));
        let b = run_trial(&p, &mut StdRng::seed_from_u64(123));
        assert_eq!(a, b);
    }
}
