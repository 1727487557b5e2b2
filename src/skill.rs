// This file is part of tournament-bracket.
//
// tournament-bracket is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// tournament-bracket is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Id, error::Invalid, participant::Participant};

/// A self reported skill tier, valued 1 for rookie up to 5 for pro.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Skill {
    Rookie,
    Beginner,
    #[default]
    Amateur,
    SemiPro,
    Pro,
}

/// The tier every wildcard plays at.
pub const WILDCARD_SKILL: Skill = Skill::SemiPro;

impl Skill {
    pub const ALL: [Skill; 5] = [
        Skill::Rookie,
        Skill::Beginner,
        Skill::Amateur,
        Skill::SemiPro,
        Skill::Pro,
    ];

    #[must_use]
    pub fn value(self) -> u32 {
        match self {
            Self::Rookie => 1,
            Self::Beginner => 2,
            Self::Amateur => 3,
            Self::SemiPro => 4,
            Self::Pro => 5,
        }
    }

    #[must_use]
    pub fn from_value(value: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|skill| skill.value() == value)
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rookie => write!(f, "rookie"),
            Self::Beginner => write!(f, "beginner"),
            Self::Amateur => write!(f, "amateur"),
            Self::SemiPro => write!(f, "semi-pro"),
            Self::Pro => write!(f, "pro"),
        }
    }
}

impl FromStr for Skill {
    type Err = Invalid;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        match string.trim().to_lowercase().as_str() {
            "rookie" => Ok(Self::Rookie),
            "beginner" => Ok(Self::Beginner),
            "amateur" => Ok(Self::Amateur),
            "semi-pro" | "semipro" => Ok(Self::SemiPro),
            "pro" => Ok(Self::Pro),
            _ => Err(Invalid::Skill(string.to_string())),
        }
    }
}

/// Re-synchronizes stored numeric ratings with the current label mapping.
///
/// Every participant whose `skill_value` disagrees with `skill.value()` is
/// corrected in place and reported as `(id, new_value)` so the caller can
/// persist the correction.
pub fn sync_skill_values(participants: &mut [Participant]) -> Vec<(Id, u32)> {
    let mut changed = Vec::new();

    for participant in participants {
        let value = participant.skill.value();
        if participant.skill_value != value {
            participant.skill_value = value;
            changed.push((participant.id, value));
        }
    }

    changed
}

/// The upgrade path of a player card.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum CardTier {
    #[default]
    Bronze,
    Silver,
    Gold,
    Special,
    Legend,
}

impl CardTier {
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Bronze => Some(Self::Silver),
            Self::Silver => Some(Self::Gold),
            Self::Gold => Some(Self::Special),
            Self::Special => Some(Self::Legend),
            Self::Legend => None,
        }
    }
}

impl fmt::Display for CardTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bronze => write!(f, "bronze"),
            Self::Silver => write!(f, "silver"),
            Self::Gold => write!(f, "gold"),
            Self::Special => write!(f, "special"),
            Self::Legend => write!(f, "legend"),
        }
    }
}

impl FromStr for CardTier {
    type Err = Invalid;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        match string.trim().to_lowercase().as_str() {
            "bronze" => Ok(Self::Bronze),
            "silver" => Ok(Self::Silver),
            "gold" => Ok(Self::Gold),
            "special" => Ok(Self::Special),
            "legend" => Ok(Self::Legend),
            _ => Err(Invalid::CardTier(string.to_string())),
        }
    }
}
