//! Rank ladder: the static rank table a trial climbs.
//!
//! A ladder is a contiguous block of ranks keyed by number, where a lower
//! number is a better tier. Each rank declares how many stars promote out of
//! it, whether it is irrevocable (stars clamp at zero instead of demoting),
//! and whether arriving at it by promotion grants a free star.
//!
//! Ladders are validated once at construction and are immutable afterwards,
//! so the simulator can index them without any runtime checks.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rank identifier. Rank 1 is the top of the ladder.
pub type Rank = u32;

/// One row of the rank table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankDefinition {
    pub rank: Rank,
    /// Stars needed at this rank to promote to `rank - 1`.
    #[serde(rename = "stars")]
    pub stars_required: u32,
    /// Losses at this rank never demote; stars clamp at zero.
    #[serde(default)]
    pub irrevocable: bool,
    /// Promotion into this rank starts the player on one star.
    #[serde(default, rename = "free_star")]
    pub grants_free_star: bool,
}

impl RankDefinition {
    pub const fn new(
        rank: Rank,
        stars_required: u32,
        irrevocable: bool,
        grants_free_star: bool,
    ) -> Self {
        Self {
            rank,
            stars_required,
            irrevocable,
            grants_free_star,
        }
    }

    /// Stars held on arrival at this rank by promotion.
    pub fn arrival_stars(&self) -> u32 {
        u32::from(self.grants_free_star)
    }
}

/// Errors raised while building or loading a ladder.
#[derive(Debug, Error)]
pub enum LadderError {
    #[error("ladder has no ranks")]
    Empty,
    #[error("rank 0 is not a valid rank (ranks start at 1)")]
    ZeroRank,
    #[error("rank {0} is defined more than once")]
    DuplicateRank(Rank),
    #[error("rank {rank} requires {stars} stars (must be at least 1)")]
    NonPositiveStars { rank: Rank, stars: u32 },
    #[error("ladder is missing rank {0} (ranks must be contiguous)")]
    MissingRank(Rank),
    #[error(
        "rank {0} grants a free star but only requires one star, so arrival already meets the threshold and promotion would fire on a loss or be skipped by overshoot"
    )]
    FreeStarCompletesRank(Rank),
    #[error("{which} rank {rank} is not in the ladder ({best}..={worst})")]
    RankNotInLadder {
        which: &'static str,
        rank: Rank,
        best: Rank,
        worst: Rank,
    },
    #[error("end rank {end} is worse than start rank {start}")]
    EndWorseThanStart { start: Rank, end: Rank },
    #[error("read ladder file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse ladder TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Validated, immutable rank table plus the default start and end ranks.
///
/// `start_rank` defaults to the worst rank in the table and `end_rank` to the
/// best; both can be narrowed with [`with_start_rank`](Self::with_start_rank)
/// and [`with_end_rank`](Self::with_end_rank).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LadderConfiguration {
    name: String,
    ranks: BTreeMap<Rank, RankDefinition>,
    start_rank: Rank,
    end_rank: Rank,
}

/// On-disk layout of a ladder file.
#[derive(Debug, Deserialize)]
struct LadderFile {
    name: Option<String>,
    start_rank: Option<Rank>,
    end_rank: Option<Rank>,
    ranks: Vec<RankDefinition>,
}

impl LadderConfiguration {
    /// Build a ladder from its rank definitions.
    ///
    /// Rejects empty tables, rank 0, duplicates, gaps, zero-star ranks, and
    /// one-star ranks that grant a free star anywhere below the top of the
    /// table. Arrival there already sits on the threshold, so the equality
    /// check would promote on a protected loss or miss a win's overshoot.
    pub fn new(
        name: impl Into<String>,
        definitions: impl IntoIterator<Item = RankDefinition>,
    ) -> Result<Self, LadderError> {
        let mut ranks = BTreeMap::new();
        for def in definitions {
            if def.rank == 0 {
                return Err(LadderError::ZeroRank);
            }
            if def.stars_required == 0 {
                return Err(LadderError::NonPositiveStars {
                    rank: def.rank,
                    stars: def.stars_required,
                });
            }
            if ranks.insert(def.rank, def).is_some() {
                return Err(LadderError::DuplicateRank(def.rank));
            }
        }

        let (best, worst) = match (ranks.keys().next(), ranks.keys().next_back()) {
            (Some(&best), Some(&worst)) => (best, worst),
            _ => return Err(LadderError::Empty),
        };

        if let Some(missing) = (best..=worst).find(|r| !ranks.contains_key(r)) {
            return Err(LadderError::MissingRank(missing));
        }

        if let Some(def) = ranks
            .values()
            .find(|d| d.rank != best && d.grants_free_star && d.stars_required == 1)
        {
            return Err(LadderError::FreeStarCompletesRank(def.rank));
        }

        Ok(Self {
            name: name.into(),
            ranks,
            start_rank: worst,
            end_rank: best,
        })
    }

    /// Parse a ladder from TOML.
    ///
    /// ```toml
    /// name = "season-16"
    /// end_rank = 17          # optional
    ///
    /// [[ranks]]
    /// rank = 18
    /// stars = 1
    /// irrevocable = true
    /// free_star = false
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, LadderError> {
        let file: LadderFile = toml::from_str(content)?;
        let name = file.name.unwrap_or_else(|| "custom".to_string());
        let mut ladder = Self::new(name, file.ranks)?;
        if let Some(start) = file.start_rank {
            ladder = ladder.with_start_rank(start)?;
        }
        if let Some(end) = file.end_rank {
            ladder = ladder.with_end_rank(end)?;
        }
        Ok(ladder)
    }

    /// Load a ladder from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, LadderError> {
        let content = std::fs::read_to_string(path).map_err(|source| LadderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let ladder = Self::from_toml(&content)?;
        log::debug!(
            "loaded ladder '{}' from {} ({} ranks)",
            ladder.name,
            path.display(),
            ladder.len()
        );
        Ok(ladder)
    }

    /// Override the rank trials start from.
    pub fn with_start_rank(mut self, rank: Rank) -> Result<Self, LadderError> {
        self.check_range(rank, self.end_rank)?;
        self.start_rank = rank;
        Ok(self)
    }

    /// Override the rank at which trials stop.
    pub fn with_end_rank(mut self, rank: Rank) -> Result<Self, LadderError> {
        self.check_range(self.start_rank, rank)?;
        self.end_rank = rank;
        Ok(self)
    }

    /// Both ranks are in the table and `end` is no worse than `start`.
    pub(crate) fn check_range(&self, start: Rank, end: Rank) -> Result<(), LadderError> {
        self.check_bounds("start", start)?;
        self.check_bounds("end", end)?;
        if end > start {
            return Err(LadderError::EndWorseThanStart { start, end });
        }
        Ok(())
    }

    pub(crate) fn check_bounds(&self, which: &'static str, rank: Rank) -> Result<(), LadderError> {
        if self.contains(rank) {
            Ok(())
        } else {
            Err(LadderError::RankNotInLadder {
                which,
                rank,
                best: self.best_rank(),
                worst: self.worst_rank(),
            })
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_rank(&self) -> Rank {
        self.start_rank
    }

    pub fn end_rank(&self) -> Rank {
        self.end_rank
    }

    /// Largest rank number in the table. Demotion never moves past it.
    pub fn worst_rank(&self) -> Rank {
        // Non-empty by construction.
        self.ranks.keys().next_back().copied().unwrap_or(self.start_rank)
    }

    /// Smallest rank number in the table.
    pub fn best_rank(&self) -> Rank {
        self.ranks.keys().next().copied().unwrap_or(self.end_rank)
    }

    pub fn contains(&self, rank: Rank) -> bool {
        self.ranks.contains_key(&rank)
    }

    pub fn get(&self, rank: Rank) -> Option<&RankDefinition> {
        self.ranks.get(&rank)
    }

    /// Definition for a rank known to be in the table.
    ///
    /// # Panics
    /// If `rank` is outside the table. Validation at construction makes every
    /// rank the simulator can reach addressable, so this is a programming error.
    pub fn definition(&self, rank: Rank) -> &RankDefinition {
        match self.ranks.get(&rank) {
            Some(def) => def,
            None => panic!(
                "rank {rank} is not defined in ladder '{}' ({}..={})",
                self.name,
                self.best_rank(),
                self.worst_rank()
            ),
        }
    }

    pub fn stars_required(&self, rank: Rank) -> u32 {
        self.definition(rank).stars_required
    }

    pub fn is_irrevocable(&self, rank: Rank) -> bool {
        self.definition(rank).irrevocable
    }

    pub fn grants_free_star(&self, rank: Rank) -> bool {
        self.definition(rank).grants_free_star
    }

    /// All rank definitions, worst rank first.
    pub fn ranks(&self) -> impl DoubleEndedIterator<Item = &RankDefinition> + '_ {
        self.ranks.values().rev()
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    /// Battles needed to go from `start` to `end` without a single loss.
    ///
    /// Sums the stars each traversed rank asks for, less the free star held
    /// on arrival. The start rank is entered with zero stars.
    pub fn minimum_battles(&self, start: Rank, end: Rank) -> u32 {
        (end + 1..=start)
            .map(|rank| {
                let def = self.definition(rank);
                let arrival = if rank == start { 0 } else { def.arrival_stars() };
                def.stars_required - arrival
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_defs() -> Vec<RankDefinition> {
        vec![
            RankDefinition::new(3, 2, true, false),
            RankDefinition::new(2, 3, false, true),
            RankDefinition::new(1, 1, true, true),
        ]
    }

    #[test]
    fn defaults_span_whole_table() {
        let ladder = LadderConfiguration::new("toy", toy_defs()).unwrap();
        assert_eq!(ladder.start_rank(), 3);
        assert_eq!(ladder.end_rank(), 1);
        assert_eq!(ladder.worst_rank(), 3);
        assert_eq!(ladder.best_rank(), 1);
        assert_eq!(ladder.len(), 3);
    }

    #[test]
    fn lookups_return_table_values() {
        let ladder = LadderConfiguration::new("toy", toy_defs()).unwrap();
        assert_eq!(ladder.stars_required(2), 3);
        assert!(ladder.is_irrevocable(3));
        assert!(!ladder.is_irrevocable(2));
        assert!(ladder.grants_free_star(2));
        assert!(!ladder.grants_free_star(3));
    }

    #[test]
    fn ranks_iterate_worst_first() {
        let ladder = LadderConfiguration::new("toy", toy_defs()).unwrap();
        let order: Vec<Rank> = ladder.ranks().map(|d| d.rank).collect();
        assert_eq!(order, vec![3, 2, 1]);
    }

    #[test]
    fn empty_table_rejected() {
        let err = LadderConfiguration::new("empty", Vec::new()).unwrap_err();
        assert!(matches!(err, LadderError::Empty));
    }

    #[test]
    fn gap_rejected() {
        let defs = vec![
            RankDefinition::new(4, 2, false, false),
            RankDefinition::new(2, 2, false, false),
        ];
        let err = LadderConfiguration::new("gap", defs).unwrap_err();
        assert!(matches!(err, LadderError::MissingRank(3)));
    }

    #[test]
    fn zero_stars_rejected() {
        let defs = vec![
            RankDefinition::new(2, 0, false, false),
            RankDefinition::new(1, 1, false, false),
        ];
        let err = LadderConfiguration::new("zero", defs).unwrap_err();
        assert!(matches!(err, LadderError::NonPositiveStars { rank: 2, stars: 0 }));
    }

    #[test]
    fn zero_rank_and_duplicates_rejected() {
        let err = LadderConfiguration::new("z", vec![RankDefinition::new(0, 1, false, false)])
            .unwrap_err();
        assert!(matches!(err, LadderError::ZeroRank));

        let dup = vec![
            RankDefinition::new(1, 1, false, false),
            RankDefinition::new(1, 2, false, false),
        ];
        let err = LadderConfiguration::new("dup", dup).unwrap_err();
        assert!(matches!(err, LadderError::DuplicateRank(1)));
    }

    #[test]
    fn one_star_free_star_rank_below_top_rejected() {
        let defs = vec![
            RankDefinition::new(3, 2, false, false),
            RankDefinition::new(2, 1, false, true),
            RankDefinition::new(1, 1, true, true),
        ];
        let err = LadderConfiguration::new("stuck", defs).unwrap_err();
        assert!(matches!(err, LadderError::FreeStarCompletesRank(2)));
        assert!(err.to_string().contains("promotion would fire on a loss"));
    }

    #[test]
    fn overrides_validated() {
        let ladder = LadderConfiguration::new("toy", toy_defs()).unwrap();
        let narrowed = ladder.clone().with_end_rank(2).unwrap();
        assert_eq!(narrowed.end_rank(), 2);

        let err = ladder.clone().with_start_rank(9).unwrap_err();
        assert!(matches!(
            err,
            LadderError::RankNotInLadder { which: "start", rank: 9, best: 1, worst: 3 }
        ));

        let err = narrowed.with_start_rank(1).unwrap_err();
        assert!(matches!(err, LadderError::EndWorseThanStart { start: 1, end: 2 }));
    }

    #[test]
    #[should_panic(expected = "rank 7 is not defined")]
    fn out_of_table_lookup_panics() {
        let ladder = LadderConfiguration::new("toy", toy_defs()).unwrap();
        ladder.stars_required(7);
    }

    #[test]
    fn minimum_battles_accounts_for_free_stars() {
        let ladder = LadderConfiguration::new("toy", toy_defs()).unwrap();
        // rank 3: 2 stars from zero; rank 2: 3 stars, arrives with 1.
        assert_eq!(ladder.minimum_battles(3, 1), 2 + 2);
        assert_eq!(ladder.minimum_battles(3, 3), 0);
        // Starting directly at rank 2 there is no free star.
        assert_eq!(ladder.minimum_battles(2, 1), 3);
    }

    #[test]
    fn parses_toml_with_overrides() {
        let content = r#"
name = "mini"
end_rank = 2

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
irrevocable = true
free_star = true
"#;
        let ladder = LadderConfiguration::from_toml(content).unwrap();
        assert_eq!(ladder.name(), "mini");
        assert_eq!(ladder.start_rank(), 3);
        assert_eq!(ladder.end_rank(), 2);
        assert!(ladder.is_irrevocable(3));
        assert!(!ladder.grants_free_star(3));
        assert!(ladder.grants_free_star(2));
    }

    #[test]
    fn parses_toml_start_rank() {
        let content = r#"
start_rank = 2

[[ranks]]
rank = 3
stars = 2

[[ranks]]
rank = 2
stars = 3

[[ranks]]
rank = 1
stars = 1
"#;
        let ladder = LadderConfiguration::from_toml(content).unwrap();
        assert_eq!(ladder.name(), "custom");
        assert_eq!(ladder.start_rank(), 2);
        assert_eq!(ladder.end_rank(), 1);
        assert_eq!(ladder.worst_rank(), 3);
        assert_eq!(ladder.minimum_battles(ladder.start_rank(), ladder.end_rank()), 3);

        let inverted = content.replace("start_rank = 2", "start_rank = 1\nend_rank = 2");
        let err = LadderConfiguration::from_toml(&inverted).unwrap_err();
        assert!(matches!(err, LadderError::EndWorseThanStart { start: 1, end: 2 }));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = LadderConfiguration::from_toml("ranks = 5").unwrap_err();
        assert!(matches!(err, LadderError::Parse(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = LadderConfiguration::from_file(Path::new("/nonexistent/ladder.toml"))
            .unwrap_err();
        assert!(matches!(err, LadderError::Io { .. }));
    }
}
