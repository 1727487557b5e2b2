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

use thiserror::Error;

use crate::Id;

/// The crate wide error.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Invalid(#[from] Invalid),
    #[error(transparent)]
    NotFound(#[from] NotFound),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Error {
    #[must_use]
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid(_))
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Malformed input to an operation. Never corrected silently.
#[derive(Error, Clone, Debug, Eq, PartialEq)]
pub enum Invalid {
    #[error("bracket: at least 2 teams are required")]
    TooFewTeams,
    #[error("bracket: the team name '{0}' is used more than once")]
    DuplicateTeamName(String),
    #[error("close: the tournament has no participants")]
    NoParticipants,
    #[error("close: the participants changed while the teams were being built")]
    RosterChanged,
    #[error("join: the tournament is full")]
    Full,
    #[error("join: the nickname '{0}' is already taken")]
    NicknameTaken(String),
    #[error("join: the nickname has to be between 2 and 20 characters")]
    NicknameLength,
    #[error("join: the nickname '{0}' is reserved")]
    NicknameReserved(String),
    #[error("skill: '{0}' is not a skill, use one of: rookie, beginner, amateur, semi-pro, pro")]
    Skill(String),
    #[error("card tier: '{0}' is not a card tier")]
    CardTier(String),
    #[error("team: the name has to be between 1 and 50 characters")]
    TeamNameLength,
    #[error("team: the name may not contain '<' or '>'")]
    TeamNameCharacters,
    #[error("team: the name '{0}' is reserved for the bracket")]
    TeamNameReserved(String),
    #[error("team: the name '{0}' is already used in this tournament")]
    TeamNameTaken(String),
    #[error("tournament: the name may not be empty")]
    TournamentName,
    #[error("tournament: the game may not be empty")]
    TournamentGame,
    #[error("tournament: at least 1 participant has to be allowed")]
    MaxParticipants,
    #[error("tournament: registration is closed")]
    Closed,
    #[error("tournament: registration is still open")]
    Open,
    #[error("winner: the match is already decided")]
    AlreadyDecided,
    #[error("winner: '{0}' is not playing in this match")]
    NotInMatch(String),
    #[error("winner: the match is still waiting on an earlier result")]
    Waiting,
}

/// A referenced record does not exist in the store.
#[derive(Error, Clone, Copy, Debug, Eq, PartialEq)]
pub enum NotFound {
    #[error("tournament not found")]
    Tournament(Id),
    #[error("participant not found")]
    Participant(Id),
    #[error("team not found")]
    Team(Id),
    #[error("match not found")]
    Match(Id),
}

/// The backing persistence failed.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store: {0}")]
    Io(#[from] std::io::Error),
    #[error("store: RON: {0}")]
    Ron(#[from] ron::Error),
    #[error("store: RON: {0}")]
    RonSpanned(#[from] ron::error::SpannedError),
    #[error("store: the lock is poisoned")]
    Poisoned,
}
