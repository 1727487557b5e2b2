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

//! Tournament lifecycle: registration while open, teams and a bracket once
//! closed.
//!
//! ```text
//! open --close--> closed --generate_bracket--> closed with bracket
//!   ^                                               |
//!   +------------------------reopen-----------------+
//! ```

use log::{info, warn};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::{
    Id,
    balance::{BalanceMode, Balancer},
    bracket::{self, Match},
    error::{Error, Invalid},
    event::{Event, EventSink},
    participant::{NewParticipant, Participant},
    progression,
    skill::{Skill, sync_skill_values},
    store::Store,
    team::{Team, team_name_checked},
    tournament::{NewTournament, Tournament, TournamentDetails, TournamentUpdate},
};

pub use crate::progression::record_winner;

/// The outcome of closing registration.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Closed {
    pub teams: Vec<Team>,
    pub mode: BalanceMode,
    /// The highest minus the lowest team average.
    pub spread: f64,
}

/// # Errors
///
/// If the name or game is empty or no participants are allowed.
pub fn create_tournament<S: Store + ?Sized>(
    store: &S,
    new: NewTournament,
) -> Result<Tournament, Error> {
    let tournament = store.insert_tournament(new.checked()?)?;
    info!("created tournament {tournament}");
    Ok(tournament)
}

/// # Errors
///
/// If the tournament does not exist or the update is invalid.
pub fn update_tournament<S: Store + ?Sized>(
    store: &S,
    id: Id,
    update: TournamentUpdate,
) -> Result<Tournament, Error> {
    let tournament = store.update_tournament(id, update)?;
    info!("updated tournament {tournament}");
    Ok(tournament)
}

/// # Errors
///
/// If the tournament does not exist.
pub fn delete_tournament<S: Store + ?Sized>(store: &S, id: Id) -> Result<(), Error> {
    store.delete_tournament(id)?;
    info!("deleted tournament {id}");
    Ok(())
}

/// # Errors
///
/// If the nickname is invalid or taken, or the tournament is missing, closed
/// or full.
pub fn register<S: Store + ?Sized>(
    store: &S,
    tournament_id: Id,
    nickname: &str,
    skill: Skill,
) -> Result<Participant, Error> {
    let participant = store.insert_participant(tournament_id, NewParticipant::new(nickname, skill)?)?;
    info!("tournament {tournament_id}: {participant} joined");
    Ok(participant)
}

/// # Errors
///
/// If the participant does not exist or the tournament is closed.
pub fn update_participant_skill<S: Store + ?Sized>(
    store: &S,
    id: Id,
    skill: Skill,
) -> Result<Participant, Error> {
    store.set_skill(id, skill)
}

/// # Errors
///
/// If the participant does not exist or the tournament is closed.
pub fn delete_participant<S: Store + ?Sized>(store: &S, id: Id) -> Result<(), Error> {
    store.delete_participant(id)?;
    info!("participant {id} left");
    Ok(())
}

/// Closes registration: re-syncs the skill values, balances the teams and
/// commits them together with the status change.
///
/// # Errors
///
/// If the tournament is missing, closed or has no participants, or the
/// participants change while the teams are built.
pub fn close<S, E>(
    store: &S,
    events: &E,
    balancer: &Balancer,
    tournament_id: Id,
) -> Result<Closed, Error>
where
    S: Store + ?Sized,
    E: EventSink + ?Sized,
{
    if !store.tournament(tournament_id)?.is_open() {
        return Err(Invalid::Closed.into());
    }

    let mut participants: Vec<_> = store
        .participants(tournament_id)?
        .into_iter()
        .filter(|participant| !participant.is_wildcard)
        .collect();
    if participants.is_empty() {
        return Err(Invalid::NoParticipants.into());
    }

    let corrected = sync_skill_values(&mut participants);
    if !corrected.is_empty() {
        warn!(
            "tournament {tournament_id}: corrected {} stale skill values",
            corrected.len()
        );
        store.set_skill_values(&corrected)?;
    }

    let balanced = balancer.balance(&participants);
    let spread = balanced.spread();
    let teams = store.commit_close(tournament_id, &balanced.teams, balanced.wildcard.as_ref())?;

    info!(
        "tournament {tournament_id}: closed with {} teams, {}, spread {spread}",
        teams.len(),
        balanced.mode
    );
    events.emit(Event::TournamentClosed {
        tournament_id,
        teams: teams.len(),
    });

    Ok(Closed {
        teams,
        mode: balanced.mode,
        spread,
    })
}

/// Deletes the teams, the wildcard and the bracket and opens registration
/// again.
///
/// # Errors
///
/// If the tournament does not exist.
pub fn reopen<S, E>(store: &S, events: &E, tournament_id: Id) -> Result<(), Error>
where
    S: Store + ?Sized,
    E: EventSink + ?Sized,
{
    store.commit_reopen(tournament_id)?;
    info!("tournament {tournament_id}: reopened");
    events.emit(Event::TournamentReopened { tournament_id });
    Ok(())
}

/// Builds a fresh bracket from the teams, discarding any earlier one, and
/// moves bye winners into round 2.
///
/// # Errors
///
/// If the tournament is missing or open, has fewer than 2 teams, or two
/// teams share a name.
pub fn generate_bracket<S, E>(store: &S, events: &E, tournament_id: Id) -> Result<Vec<Match>, Error>
where
    S: Store + ?Sized,
    E: EventSink + ?Sized,
{
    if store.tournament(tournament_id)?.is_open() {
        return Err(Invalid::Open.into());
    }

    let teams: Vec<_> = store
        .teams(tournament_id)?
        .into_iter()
        .map(|team| team.team)
        .collect();

    let mut names = FxHashSet::default();
    for team in &teams {
        if !names.insert(team.name.to_lowercase()) {
            return Err(Invalid::DuplicateTeamName(team.name.clone()).into());
        }
    }

    let matches = store.replace_bracket(tournament_id, bracket::build(&teams)?)?;
    info!(
        "tournament {tournament_id}: bracket of {} matches for {} teams",
        matches.len(),
        teams.len()
    );
    events.emit(Event::BracketGenerated {
        tournament_id,
        matches: matches.len(),
    });

    for bye in matches.iter().filter(|bracket_match| bracket_match.is_decided()) {
        progression::advance(store, events, bye)?;
    }

    store.bracket(tournament_id)
}

/// Moves the winner of a decided match on again, in case an earlier
/// advance stopped part way. A match without a winner is left alone.
///
/// # Errors
///
/// If the match does not exist or the store fails.
pub fn replay_advance<S, E>(store: &S, events: &E, match_id: Id) -> Result<Match, Error>
where
    S: Store + ?Sized,
    E: EventSink + ?Sized,
{
    let decided = store.get_match(match_id)?;
    if decided.is_decided() {
        info!("replaying {decided}");
        progression::advance(store, events, &decided)?;
    }

    Ok(decided)
}

/// # Errors
///
/// If the name is invalid or taken, or the team does not exist.
pub fn rename_team<S: Store + ?Sized>(store: &S, team_id: Id, name: &str) -> Result<Team, Error> {
    let team = store.rename_team(team_id, &team_name_checked(name)?)?;
    info!("tournament {}: team {team_id} renamed to {}", team.tournament_id, team.name);
    Ok(team)
}

/// # Errors
///
/// If the tournament does not exist.
pub fn details<S: Store + ?Sized>(store: &S, tournament_id: Id) -> Result<TournamentDetails, Error> {
    Ok(TournamentDetails {
        tournament: store.tournament(tournament_id)?,
        participants: store.participants(tournament_id)?,
        teams: store.teams(tournament_id)?,
        bracket: store.bracket(tournament_id)?,
    })
}

/// The winner of the final, once it is decided.
///
/// # Errors
///
/// If the tournament does not exist.
pub fn champion<S: Store + ?Sized>(store: &S, tournament_id: Id) -> Result<Option<String>, Error> {
    Ok(store
        .bracket(tournament_id)?
        .into_iter()
        .max_by_key(|bracket_match| bracket_match.round)
        .and_then(|final_match| final_match.winner_name))
}
