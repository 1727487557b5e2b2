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

use std::{fmt, sync::mpsc::Sender};

use serde::{Deserialize, Serialize};

use crate::{Id, bracket::Match};

/// State changes viewers of a tournament want pushed to them.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Event {
    MatchUpdated(Match),
    BracketGenerated { tournament_id: Id, matches: usize },
    TournamentClosed { tournament_id: Id, teams: usize },
    TournamentReopened { tournament_id: Id },
}

impl Event {
    #[must_use]
    pub fn tournament_id(&self) -> Id {
        match self {
            Self::MatchUpdated(updated) => updated.tournament_id,
            Self::BracketGenerated { tournament_id, .. }
            | Self::TournamentClosed { tournament_id, .. }
            | Self::TournamentReopened { tournament_id } => *tournament_id,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MatchUpdated(updated) => write!(f, "match_updated {updated}"),
            Self::BracketGenerated {
                tournament_id,
                matches,
            } => write!(f, "bracket_generated {tournament_id} {matches}"),
            Self::TournamentClosed {
                tournament_id,
                teams,
            } => write!(f, "closed {tournament_id} {teams}"),
            Self::TournamentReopened { tournament_id } => write!(f, "reopened {tournament_id}"),
        }
    }
}

/// Where the lifecycle reports its events. Delivery is best effort.
pub trait EventSink {
    fn emit(&self, event: Event);
}

impl EventSink for Sender<Event> {
    fn emit(&self, event: Event) {
        let _ok = self.send(event);
    }
}

/// Drops every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoEvents;

impl EventSink for NoEvents {
    fn emit(&self, _event: Event) {}
}
