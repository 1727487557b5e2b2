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

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    Id,
    error::Invalid,
    skill::{CardTier, Skill, WILDCARD_SKILL},
};

pub const NICKNAME_MIN: usize = 2;
pub const NICKNAME_MAX: usize = 20;
pub const WILDCARD_NICKNAME: &str = "🃏 Wildcard (admin)";

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Participant {
    pub id: Id,
    pub tournament_id: Id,
    pub nickname: String,
    pub skill: Skill,
    /// The numeric rating used for balancing.
    pub skill_value: u32,
    #[serde(default)]
    pub card_tier: CardTier,
    #[serde(default)]
    pub is_wildcard: bool,
    pub created_at: DateTime<Utc>,
}

impl Participant {
    #[must_use]
    pub fn from_new(id: Id, tournament_id: Id, new: NewParticipant) -> Self {
        Self {
            id,
            tournament_id,
            nickname: new.nickname,
            skill: new.skill,
            skill_value: new.skill_value,
            card_tier: CardTier::default(),
            is_wildcard: new.is_wildcard,
            created_at: Utc::now(),
        }
    }

    #[cfg(test)]
    pub(crate) fn new_test(id: Id, nickname: &str, skill: Skill) -> Self {
        Self::from_new(id, 1, NewParticipant::new(nickname, skill).unwrap())
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.id, self.nickname, self.skill)
    }
}

/// A participant not yet written to the store.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct NewParticipant {
    pub nickname: String,
    pub skill: Skill,
    pub skill_value: u32,
    pub is_wildcard: bool,
}

impl NewParticipant {
    /// # Errors
    ///
    /// If the nickname fails [`nickname_checked`].
    pub fn new(nickname: &str, skill: Skill) -> Result<Self, Invalid> {
        Ok(Self {
            nickname: nickname_checked(nickname)?,
            skill,
            skill_value: skill.value(),
            is_wildcard: false,
        })
    }

    #[must_use]
    pub fn wildcard() -> Self {
        Self {
            nickname: WILDCARD_NICKNAME.to_string(),
            skill: WILDCARD_SKILL,
            skill_value: WILDCARD_SKILL.value(),
            is_wildcard: true,
        }
    }
}

/// # Errors
///
/// If the trimmed nickname is not 2 to 20 characters long or is the
/// wildcard's nickname in any case.
pub fn nickname_checked(nickname: &str) -> Result<String, Invalid> {
    let nickname = nickname.trim();
    let len = nickname.chars().count();

    if !(NICKNAME_MIN..=NICKNAME_MAX).contains(&len) {
        return Err(Invalid::NicknameLength);
    }
    if nickname.to_lowercase() == WILDCARD_NICKNAME.to_lowercase() {
        return Err(Invalid::NicknameReserved(nickname.to_string()));
    }

    Ok(nickname.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nickname_is_trimmed_and_bounded() {
        assert_eq!(nickname_checked("  ada  "), Ok("ada".to_string()));
        assert_eq!(nickname_checked(" a "), Err(Invalid::NicknameLength));
        assert_eq!(
            nickname_checked(&"x".repeat(21)),
            Err(Invalid::NicknameLength)
        );
        assert!(nickname_checked("한국어닉네임").is_ok());
    }

    #[test]
    fn the_wildcard_nickname_is_reserved() {
        assert_eq!(
            nickname_checked(" 🃏 WILDCARD (Admin) "),
            Err(Invalid::NicknameReserved("🃏 WILDCARD (Admin)".to_string()))
        );
        assert!(nickname_checked("Wildcard").is_ok());
    }

    #[test]
    fn wildcard_plays_at_the_fixed_tier() {
        let wildcard = NewParticipant::wildcard();

        assert!(wildcard.is_wildcard);
        assert_eq!(wildcard.skill_value, WILDCARD_SKILL.value());
    }
}
