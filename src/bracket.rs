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

use std::{cmp::Ordering, fmt};

use serde::{Deserialize, Serialize};

use crate::{Id, error::Invalid, team::Team};

/// A slot waiting on the winner of an earlier match.
pub const TBD: &str = "TBD";
/// A slot that will never be filled.
pub const BYE: &str = "BYE";

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Slot {
    Team1,
    Team2,
}

impl Slot {
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Self::Team1 => Self::Team2,
            Self::Team2 => Self::Team1,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Team1 => write!(f, "team1"),
            Self::Team2 => write!(f, "team2"),
        }
    }
}

/// One match of a single elimination bracket. Teams are referenced by name.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Match {
    pub id: Id,
    pub tournament_id: Id,
    /// Starts at 1 for the first real matchups.
    pub round: u32,
    /// Starts at 1 within each round.
    pub match_order: u32,
    pub team1_name: String,
    pub team2_name: String,
    pub winner_name: Option<String>,
}

impl Match {
    #[must_use]
    pub fn from_new(id: Id, tournament_id: Id, new: NewMatch) -> Self {
        Self {
            id,
            tournament_id,
            round: new.round,
            match_order: new.match_order,
            team1_name: new.team1_name,
            team2_name: new.team2_name,
            winner_name: new.winner_name,
        }
    }

    #[must_use]
    pub fn team(&self, slot: Slot) -> &str {
        match slot {
            Slot::Team1 => &self.team1_name,
            Slot::Team2 => &self.team2_name,
        }
    }

    pub fn team_mut(&mut self, slot: Slot) -> &mut String {
        match slot {
            Slot::Team1 => &mut self.team1_name,
            Slot::Team2 => &mut self.team2_name,
        }
    }

    #[must_use]
    pub fn is_decided(&self) -> bool {
        self.winner_name.is_some()
    }

    /// Whether `name` currently plays in this match. Placeholders never do.
    #[must_use]
    pub fn is_playing(&self, name: &str) -> bool {
        name != TBD && name != BYE && (self.team1_name == name || self.team2_name == name)
    }

    /// Where the winner of this match goes.
    #[must_use]
    pub fn next_position(&self) -> (u32, u32, Slot) {
        next_position(self.round, self.match_order)
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "round {} match {}: {} vs {}",
            self.round, self.match_order, self.team1_name, self.team2_name
        )?;
        if let Some(winner) = &self.winner_name {
            write!(f, ", winner {winner}")?;
        }
        Ok(())
    }
}

/// A match not yet written to the store.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct NewMatch {
    pub round: u32,
    pub match_order: u32,
    pub team1_name: String,
    pub team2_name: String,
    pub winner_name: Option<String>,
}

/// The round, match order and slot the winner of `(round, match_order)`
/// advances into.
#[must_use]
pub fn next_position(round: u32, match_order: u32) -> (u32, u32, Slot) {
    let slot = if match_order % 2 == 1 {
        Slot::Team1
    } else {
        Slot::Team2
    };

    (round + 1, match_order.div_ceil(2), slot)
}

/// The match order feeding the other slot of the same destination.
#[must_use]
pub fn sibling_order(match_order: u32) -> u32 {
    if match_order % 2 == 1 {
        match_order + 1
    } else {
        match_order - 1
    }
}

/// `ceil(log2(team_count))`, the number of rounds needed.
#[must_use]
pub fn total_rounds(team_count: usize) -> u32 {
    if team_count < 2 {
        0
    } else {
        usize::BITS - (team_count - 1).leading_zeros()
    }
}

/// Orders teams by descending average skill, then by name.
#[must_use]
pub fn seed(teams: &[Team]) -> Vec<&Team> {
    let mut seeded: Vec<_> = teams.iter().collect();
    seeded.sort_by(|a, b| match b.avg_skill.total_cmp(&a.avg_skill) {
        Ordering::Equal => a.name.cmp(&b.name),
        ordering => ordering,
    });
    seeded
}

/// Builds every match of a single elimination bracket, ordered by round and
/// match order.
///
/// Round 1 pairs the seeds consecutively; an odd seed out plays a
/// [`BYE`] and is already the winner of that match. Every later match starts
/// with both slots [`TBD`].
///
/// # Errors
///
/// If there are fewer than 2 teams.
pub fn build(teams: &[Team]) -> Result<Vec<NewMatch>, Invalid> {
    if teams.len() < 2 {
        return Err(Invalid::TooFewTeams);
    }

    let seeded = seed(teams);
    let mut matches = Vec::new();

    for (pair, order) in seeded.chunks(2).zip(1..) {
        let mut pair = pair.iter();
        let (Some(team1), team2) = (pair.next(), pair.next()) else {
            continue;
        };
        let new_match = match team2 {
            Some(team2) => NewMatch {
                round: 1,
                match_order: order,
                team1_name: team1.name.clone(),
                team2_name: team2.name.clone(),
                winner_name: None,
            },
            None => NewMatch {
                round: 1,
                match_order: order,
                team1_name: team1.name.clone(),
                team2_name: BYE.to_string(),
                winner_name: Some(team1.name.clone()),
            },
        };
        matches.push(new_match);
    }

    let mut in_round = seeded.len().div_ceil(2);
    for round in 2..=total_rounds(teams.len()) {
        in_round = in_round.div_ceil(2);
        for order in (1..).take(in_round) {
            matches.push(NewMatch {
                round,
                match_order: order,
                team1_name: TBD.to_string(),
                team2_name: TBD.to_string(),
                winner_name: None,
            });
        }
    }

    Ok(matches)
}
