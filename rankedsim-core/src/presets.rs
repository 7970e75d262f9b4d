//! Built-in ladder tables.
//!
//! - `Regular`: 18-rank season ladder. Ranks 18–11 hand out a free star on
//!   arrival, ranks 18–15 and 12 are irrevocable.
//! - `Sprint`: 10-rank sprint ladder with free stars from rank 9 up.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ladder::{LadderConfiguration, LadderError, RankDefinition};

/// Named ladder variants shipped with the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LadderPreset {
    Regular,
    Sprint,
}

const REGULAR_RANKS: [RankDefinition; 18] = [
    RankDefinition::new(18, 1, true, false),
    RankDefinition::new(17, 2, true, true),
    RankDefinition::new(16, 2, true, true),
    RankDefinition::new(15, 2, true, true),
    RankDefinition::new(14, 2, false, true),
    RankDefinition::new(13, 2, false, true),
    RankDefinition::new(12, 2, true, true),
    RankDefinition::new(11, 2, false, true),
    RankDefinition::new(10, 4, false, false),
    RankDefinition::new(9, 4, false, false),
    RankDefinition::new(8, 4, false, false),
    RankDefinition::new(7, 4, false, false),
    RankDefinition::new(6, 4, false, false),
    RankDefinition::new(5, 5, false, false),
    RankDefinition::new(4, 5, false, false),
    RankDefinition::new(3, 5, false, false),
    RankDefinition::new(2, 5, false, false),
    RankDefinition::new(1, 1, true, true),
];

const SPRINT_RANKS: [RankDefinition; 10] = [
    RankDefinition::new(10, 1, true, false),
    RankDefinition::new(9, 2, true, true),
    RankDefinition::new(8, 2, true, true),
    RankDefinition::new(7, 2, false, true),
    RankDefinition::new(6, 2, false, true),
    RankDefinition::new(5, 3, true, true),
    RankDefinition::new(4, 3, false, true),
    RankDefinition::new(3, 3, true, true),
    RankDefinition::new(2, 3, false, true),
    RankDefinition::new(1, 1, true, true),
];

impl LadderPreset {
    pub const ALL: [LadderPreset; 2] = [LadderPreset::Regular, LadderPreset::Sprint];

    pub fn name(&self) -> &'static str {
        match self {
            LadderPreset::Regular => "regular",
            LadderPreset::Sprint => "sprint",
        }
    }

    pub fn definitions(&self) -> &'static [RankDefinition] {
        match self {
            LadderPreset::Regular => &REGULAR_RANKS,
            LadderPreset::Sprint => &SPRINT_RANKS,
        }
    }

    /// Build the validated ladder for this preset.
    pub fn ladder(&self) -> Result<LadderConfiguration, LadderError> {
        LadderConfiguration::new(self.name(), self.definitions().iter().copied())
    }
}

impl fmt::Display for LadderPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LadderPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "regular" => Ok(LadderPreset::Regular),
            "sprint" => Ok(LadderPreset::Sprint),
            other => Err(format!("unknown ladder '{other}'. Valid: regular, sprint")),
        }
    }
}
