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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    Id,
    bracket::Match,
    error::Invalid,
    participant::Participant,
    team::TeamWithMembers,
};

pub const DEFAULT_MAX_PARTICIPANTS: u32 = 16;

/// Teams and matches only exist while a tournament is closed.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum Status {
    #[default]
    Open,
    Closed,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

impl FromStr for Status {
    type Err = anyhow::Error;

    fn from_str(string: &str) -> anyhow::Result<Self> {
        match string {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            _ => Err(anyhow::Error::msg(format!("invalid status: {string}"))),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Tournament {
    pub id: Id,
    pub name: String,
    pub game: String,
    pub max_participants: u32,
    pub deadline: DateTime<Utc>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Status,
    pub created_at: DateTime<Utc>,
}

impl Tournament {
    #[must_use]
    pub fn from_new(id: Id, new: NewTournament) -> Self {
        Self {
            id,
            name: new.name,
            game: new.game,
            max_participants: new.max_participants,
            deadline: new.deadline,
            description: new.description,
            status: Status::Open,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == Status::Open
    }
}

impl fmt::Display for Tournament {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({}) {} max {} deadline {}",
            self.id,
            self.name,
            self.game,
            self.status,
            self.max_participants,
            self.deadline.format("%F")
        )
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct NewTournament {
    pub name: String,
    pub game: String,
    pub max_participants: u32,
    pub deadline: DateTime<Utc>,
    pub description: Option<String>,
}

impl NewTournament {
    #[must_use]
    pub fn new(name: &str, game: &str, deadline: DateTime<Utc>) -> Self {
        Self {
            name: name.to_string(),
            game: game.to_string(),
            max_participants: DEFAULT_MAX_PARTICIPANTS,
            deadline,
            description: None,
        }
    }

    /// Trims the text fields and checks them.
    ///
    /// # Errors
    ///
    /// If the name or game is empty or no participants are allowed.
    pub fn checked(self) -> Result<Self, Invalid> {
        let name = self.name.trim().to_string();
        let game = self.game.trim().to_string();

        if name.is_empty() {
            return Err(Invalid::TournamentName);
        }
        if game.is_empty() {
            return Err(Invalid::TournamentGame);
        }
        if self.max_participants == 0 {
            return Err(Invalid::MaxParticipants);
        }

        Ok(Self {
            name,
            game,
            description: self
                .description
                .map(|description| description.trim().to_string())
                .filter(|description| !description.is_empty()),
            ..self
        })
    }
}

/// The fields of a tournament that may change after creation.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct TournamentUpdate {
    pub name: Option<String>,
    pub game: Option<String>,
    pub max_participants: Option<u32>,
    pub deadline: Option<DateTime<Utc>>,
    pub description: Option<Option<String>>,
}

impl TournamentUpdate {
    /// Applies the update to a copy of `tournament`, checking the result.
    ///
    /// # Errors
    ///
    /// If the updated tournament is not valid.
    pub fn apply(self, tournament: &Tournament) -> Result<Tournament, Invalid> {
        let checked = NewTournament {
            name: self.name.unwrap_or_else(|| tournament.name.clone()),
            game: self.game.unwrap_or_else(|| tournament.game.clone()),
            max_participants: self
                .max_participants
                .unwrap_or(tournament.max_participants),
            deadline: self.deadline.unwrap_or(tournament.deadline),
            description: self
                .description
                .unwrap_or_else(|| tournament.description.clone()),
        }
        .checked()?;

        Ok(Tournament {
            name: checked.name,
            game: checked.game,
            max_participants: checked.max_participants,
            deadline: checked.deadline,
            description: checked.description,
            ..tournament.clone()
        })
    }
}

/// Everything a bracket page shows.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TournamentDetails {
    pub tournament: Tournament,
    pub participants: Vec<Participant>,
    pub teams: Vec<TeamWithMembers>,
    pub bracket: Vec<Match>,
}
