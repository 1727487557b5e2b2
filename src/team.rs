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
    bracket::{BYE, TBD},
    error::Invalid,
    participant::Participant,
};

pub const TEAM_NAME_MAX: usize = 50;

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Team {
    pub id: Id,
    pub tournament_id: Id,
    pub name: String,
    /// The mean of both members' skill values.
    pub avg_skill: f64,
    pub has_wildcard: bool,
    pub members: [Id; 2],
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.1})", self.name, self.avg_skill)?;
        if self.has_wildcard {
            write!(f, " wildcard")?;
        }
        Ok(())
    }
}

/// A member of a team about to be written.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Member {
    Participant(Id),
    /// The synthetic participant created alongside the teams.
    Wildcard,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct NewTeam {
    pub name: String,
    pub avg_skill: f64,
    pub has_wildcard: bool,
    pub members: [Member; 2],
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TeamWithMembers {
    pub team: Team,
    pub members: Vec<Participant>,
}

/// # Errors
///
/// If the trimmed name is empty, longer than 50 characters, contains `<`
/// or `>`, or is one of the bracket placeholders `TBD` and `BYE` in any
/// case.
pub fn team_name_checked(name: &str) -> Result<String, Invalid> {
    let name = name.trim();
    let len = name.chars().count();

    if len == 0 || len > TEAM_NAME_MAX {
        return Err(Invalid::TeamNameLength);
    }
    if name.contains(['<', '>']) {
        return Err(Invalid::TeamNameCharacters);
    }
    if name.eq_ignore_ascii_case(TBD) || name.eq_ignore_ascii_case(BYE) {
        return Err(Invalid::TeamNameReserved(name.to_string()));
    }

    Ok(name.to_string())
}
