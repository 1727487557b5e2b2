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

//! Persistence of tournaments, participants, teams and matches.
//!
//! Every [`Store`] method is one transaction: it either applies completely
//! or fails without changing anything.

use std::{
    fs,
    io::ErrorKind,
    path::Path,
    sync::{Mutex, MutexGuard},
};

use chrono::Utc;
use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::{
    Id,
    bracket::{Match, NewMatch, Slot, TBD},
    error::{Error, Invalid, NotFound, StoreError},
    participant::{NewParticipant, Participant},
    skill::Skill,
    team::{Member, NewTeam, Team, TeamWithMembers},
    tournament::{NewTournament, Status, Tournament, TournamentUpdate},
};

pub trait Store {
    /// Newest first.
    ///
    /// # Errors
    ///
    /// If the store fails.
    fn tournaments(&self) -> Result<Vec<Tournament>, Error>;

    /// # Errors
    ///
    /// If the tournament does not exist.
    fn tournament(&self, id: Id) -> Result<Tournament, Error>;

    /// # Errors
    ///
    /// If the store fails.
    fn insert_tournament(&self, new: NewTournament) -> Result<Tournament, Error>;

    /// # Errors
    ///
    /// If the tournament does not exist or the update is invalid.
    fn update_tournament(&self, id: Id, update: TournamentUpdate) -> Result<Tournament, Error>;

    /// Deletes the tournament and everything belonging to it.
    ///
    /// # Errors
    ///
    /// If the tournament does not exist.
    fn delete_tournament(&self, id: Id) -> Result<(), Error>;

    /// In registration order, wildcards included.
    ///
    /// # Errors
    ///
    /// If the tournament does not exist.
    fn participants(&self, tournament_id: Id) -> Result<Vec<Participant>, Error>;

    /// # Errors
    ///
    /// If the participant does not exist.
    fn participant(&self, id: Id) -> Result<Participant, Error>;

    /// Registers a participant if the tournament is open, has room and no
    /// participant with the same nickname, ignoring case.
    ///
    /// # Errors
    ///
    /// If any of the conditions fail.
    fn insert_participant(&self, tournament_id: Id, new: NewParticipant)
    -> Result<Participant, Error>;

    /// Changes the skill of a participant of an open tournament.
    ///
    /// # Errors
    ///
    /// If the participant does not exist or the tournament is closed.
    fn set_skill(&self, id: Id, skill: Skill) -> Result<Participant, Error>;

    /// Overwrites the numeric skill values of participants.
    ///
    /// # Errors
    ///
    /// If any participant does not exist.
    fn set_skill_values(&self, values: &[(Id, u32)]) -> Result<(), Error>;

    /// # Errors
    ///
    /// If the participant does not exist or the tournament is closed.
    fn delete_participant(&self, id: Id) -> Result<(), Error>;

    /// In creation order.
    ///
    /// # Errors
    ///
    /// If the tournament does not exist.
    fn teams(&self, tournament_id: Id) -> Result<Vec<TeamWithMembers>, Error>;

    /// Renames a team, carrying the new name through the bracket.
    ///
    /// # Errors
    ///
    /// If the team does not exist or another team of the tournament already
    /// has that name, ignoring case.
    fn rename_team(&self, id: Id, name: &str) -> Result<Team, Error>;

    /// Writes the teams, the wildcard if a team needs it, and flips the
    /// tournament to closed.
    ///
    /// # Errors
    ///
    /// If the tournament does not exist or is closed, a member does not
    /// belong to it, or the teams don't hold exactly the registered
    /// participants.
    fn commit_close(
        &self,
        tournament_id: Id,
        teams: &[NewTeam],
        wildcard: Option<&NewParticipant>,
    ) -> Result<Vec<Team>, Error>;

    /// Deletes all teams, wildcards and matches and flips the tournament to
    /// open.
    ///
    /// # Errors
    ///
    /// If the tournament does not exist.
    fn commit_reopen(&self, tournament_id: Id) -> Result<(), Error>;

    /// Ordered by round, then match order.
    ///
    /// # Errors
    ///
    /// If the tournament does not exist.
    fn bracket(&self, tournament_id: Id) -> Result<Vec<Match>, Error>;

    /// Discards the bracket of a closed tournament and writes `matches`.
    ///
    /// # Errors
    ///
    /// If the tournament does not exist or is open.
    fn replace_bracket(&self, tournament_id: Id, matches: Vec<NewMatch>)
    -> Result<Vec<Match>, Error>;

    /// # Errors
    ///
    /// If the match does not exist.
    fn get_match(&self, id: Id) -> Result<Match, Error>;

    /// # Errors
    ///
    /// If the store fails.
    fn find_match(&self, tournament_id: Id, round: u32, match_order: u32)
    -> Result<Option<Match>, Error>;

    /// Sets the winner of an undecided match whose slots are both known.
    ///
    /// # Errors
    ///
    /// If the match does not exist, is decided, is waiting on a team or
    /// `winner` does not play in it.
    fn decide_match(&self, id: Id, winner: &str) -> Result<Match, Error>;

    /// Writes one slot of an undecided match and nothing else. Returns the
    /// match as it is afterwards, or `None` when there is no such match.
    ///
    /// # Errors
    ///
    /// If the store fails.
    fn fill_slot(
        &self,
        tournament_id: Id,
        round: u32,
        match_order: u32,
        slot: Slot,
        name: &str,
    ) -> Result<Option<Match>, Error>;
}

/// The whole contents of a store, as saved to disk.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Data {
    #[serde(default)]
    next_id: Id,
    #[serde(default)]
    tournaments: FxHashMap<Id, Tournament>,
    #[serde(default)]
    participants: FxHashMap<Id, Participant>,
    #[serde(default)]
    teams: FxHashMap<Id, Team>,
    #[serde(default)]
    matches: FxHashMap<Id, Match>,
}

impl Data {
    /// A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// If the file can't be read or isn't valid RON.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        match fs::read_to_string(path) {
            Ok(string) => Ok(ron::from_str(&string)?),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(error) => Err(error.into()),
        }
    }

    /// Writes next to `path` first so a failed write keeps the old file.
    ///
    /// # Errors
    ///
    /// If serializing or writing fails.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let string = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        let temporary = path.with_extension("ron.tmp");

        fs::write(&temporary, string)?;
        fs::rename(&temporary, path)?;
        debug!("saved {}", path.display());

        Ok(())
    }

    fn next_id(&mut self) -> Id {
        self.next_id += 1;
        self.next_id
    }

    fn tournament(&self, id: Id) -> Result<&Tournament, NotFound> {
        self.tournaments.get(&id).ok_or(NotFound::Tournament(id))
    }

    fn open_tournament(&self, id: Id) -> Result<&Tournament, Error> {
        let tournament = self.tournament(id)?;
        if tournament.is_open() {
            Ok(tournament)
        } else {
            Err(Invalid::Closed.into())
        }
    }

    fn participants_of(&self, tournament_id: Id) -> Vec<&Participant> {
        let mut participants: Vec<_> = self
            .participants
            .values()
            .filter(|participant| participant.tournament_id == tournament_id)
            .collect();
        participants.sort_unstable_by_key(|participant| participant.id);
        participants
    }

    fn matches_of(&self, tournament_id: Id) -> Vec<&Match> {
        let mut matches: Vec<_> = self
            .matches
            .values()
            .filter(|bracket_match| bracket_match.tournament_id == tournament_id)
            .collect();
        matches.sort_unstable_by_key(|bracket_match| {
            (bracket_match.round, bracket_match.match_order)
        });
        matches
    }

    fn position_mut(&mut self, tournament_id: Id, round: u32, match_order: u32) -> Option<&mut Match> {
        self.matches.values_mut().find(|bracket_match| {
            bracket_match.tournament_id == tournament_id
                && bracket_match.round == round
                && bracket_match.match_order == match_order
        })
    }
}

/// A [`Store`] in memory behind a mutex, one lock per transaction.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<Data>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_data(data: Data) -> Self {
        Self {
            data: Mutex::new(data),
        }
    }

    /// A copy of everything, for saving.
    ///
    /// # Errors
    ///
    /// If the lock is poisoned.
    pub fn snapshot(&self) -> Result<Data, StoreError> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Data>, StoreError> {
        self.data.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl Store for MemoryStore {
    fn tournaments(&self) -> Result<Vec<Tournament>, Error> {
        let data = self.lock()?;
        let mut tournaments: Vec<_> = data.tournaments.values().cloned().collect();
        tournaments.sort_unstable_by_key(|tournament| std::cmp::Reverse(tournament.id));
        Ok(tournaments)
    }

    fn tournament(&self, id: Id) -> Result<Tournament, Error> {
        Ok(self.lock()?.tournament(id)?.clone())
    }

    fn insert_tournament(&self, new: NewTournament) -> Result<Tournament, Error> {
        let mut data = self.lock()?;
        let id = data.next_id();
        let tournament = Tournament::from_new(id, new);
        data.tournaments.insert(id, tournament.clone());
        Ok(tournament)
    }

    fn update_tournament(&self, id: Id, update: TournamentUpdate) -> Result<Tournament, Error> {
        let mut data = self.lock()?;
        let updated = update.apply(data.tournament(id)?)?;
        data.tournaments.insert(id, updated.clone());
        Ok(updated)
    }

    fn delete_tournament(&self, id: Id) -> Result<(), Error> {
        let mut data = self.lock()?;
        data.tournament(id)?;

        data.tournaments.remove(&id);
        data.participants
            .retain(|_, participant| participant.tournament_id != id);
        data.teams.retain(|_, team| team.tournament_id != id);
        data.matches
            .retain(|_, bracket_match| bracket_match.tournament_id != id);
        Ok(())
    }

    fn participants(&self, tournament_id: Id) -> Result<Vec<Participant>, Error> {
        let data = self.lock()?;
        data.tournament(tournament_id)?;
        Ok(data
            .participants_of(tournament_id)
            .into_iter()
            .cloned()
            .collect())
    }

    fn participant(&self, id: Id) -> Result<Participant, Error> {
        let data = self.lock()?;
        let participant = data.participants.get(&id).ok_or(NotFound::Participant(id))?;
        Ok(participant.clone())
    }

    fn insert_participant(
        &self,
        tournament_id: Id,
        new: NewParticipant,
    ) -> Result<Participant, Error> {
        let mut data = self.lock()?;
        let tournament = data.open_tournament(tournament_id)?;
        let registered = data.participants_of(tournament_id);

        if registered.len() >= tournament.max_participants as usize {
            return Err(Invalid::Full.into());
        }
        let nickname = new.nickname.to_lowercase();
        if registered
            .iter()
            .any(|participant| participant.nickname.to_lowercase() == nickname)
        {
            return Err(Invalid::NicknameTaken(new.nickname).into());
        }

        let id = data.next_id();
        let participant = Participant::from_new(id, tournament_id, new);
        data.participants.insert(id, participant.clone());
        Ok(participant)
    }

    fn set_skill(&self, id: Id, skill: Skill) -> Result<Participant, Error> {
        let mut data = self.lock()?;
        let tournament_id = data
            .participants
            .get(&id)
            .ok_or(NotFound::Participant(id))?
            .tournament_id;
        data.open_tournament(tournament_id)?;

        let participant = data
            .participants
            .get_mut(&id)
            .ok_or(NotFound::Participant(id))?;
        participant.skill = skill;
        participant.skill_value = skill.value();
        Ok(participant.clone())
    }

    fn set_skill_values(&self, values: &[(Id, u32)]) -> Result<(), Error> {
        let mut data = self.lock()?;
        if let Some((id, _)) = values
            .iter()
            .find(|(id, _)| !data.participants.contains_key(id))
        {
            return Err(NotFound::Participant(*id).into());
        }

        for (id, value) in values {
            if let Some(participant) = data.participants.get_mut(id) {
                participant.skill_value = *value;
            }
        }
        Ok(())
    }

    fn delete_participant(&self, id: Id) -> Result<(), Error> {
        let mut data = self.lock()?;
        let tournament_id = data
            .participants
            .get(&id)
            .ok_or(NotFound::Participant(id))?
            .tournament_id;
        data.open_tournament(tournament_id)?;

        data.participants.remove(&id);
        Ok(())
    }

    fn teams(&self, tournament_id: Id) -> Result<Vec<TeamWithMembers>, Error> {
        let data = self.lock()?;
        data.tournament(tournament_id)?;

        let mut teams: Vec<_> = data
            .teams
            .values()
            .filter(|team| team.tournament_id == tournament_id)
            .collect();
        teams.sort_unstable_by_key(|team| team.id);

        Ok(teams
            .into_iter()
            .map(|team| TeamWithMembers {
                team: team.clone(),
                members: team
                    .members
                    .iter()
                    .filter_map(|id| data.participants.get(id).cloned())
                    .collect(),
            })
            .collect())
    }

    fn rename_team(&self, id: Id, name: &str) -> Result<Team, Error> {
        let mut data = self.lock()?;
        let team = data.teams.get(&id).ok_or(NotFound::Team(id))?.clone();

        let lowercase = name.to_lowercase();
        if data.teams.values().any(|other| {
            other.id != id
                && other.tournament_id == team.tournament_id
                && other.name.to_lowercase() == lowercase
        }) {
            return Err(Invalid::TeamNameTaken(name.to_string()).into());
        }

        for bracket_match in data
            .matches
            .values_mut()
            .filter(|bracket_match| bracket_match.tournament_id == team.tournament_id)
        {
            for slot in [Slot::Team1, Slot::Team2] {
                if bracket_match.team(slot) == team.name {
                    *bracket_match.team_mut(slot) = name.to_string();
                }
            }
            if bracket_match.winner_name.as_deref() == Some(team.name.as_str()) {
                bracket_match.winner_name = Some(name.to_string());
            }
        }

        let renamed = Team {
            name: name.to_string(),
            ..team
        };
        data.teams.insert(id, renamed.clone());
        Ok(renamed)
    }

    fn commit_close(
        &self,
        tournament_id: Id,
        teams: &[NewTeam],
        wildcard: Option<&NewParticipant>,
    ) -> Result<Vec<Team>, Error> {
        let mut data = self.lock()?;
        data.open_tournament(tournament_id)?;

        for team in teams {
            for member in team.members {
                if let Member::Participant(id) = member
                    && data
                        .participants
                        .get(&id)
                        .is_none_or(|participant| participant.tournament_id != tournament_id)
                {
                    return Err(NotFound::Participant(id).into());
                }
            }
        }

        let placed: FxHashSet<Id> = teams
            .iter()
            .flat_map(|team| team.members)
            .filter_map(|member| match member {
                Member::Participant(id) => Some(id),
                Member::Wildcard => None,
            })
            .collect();
        let registered: FxHashSet<Id> = data
            .participants_of(tournament_id)
            .into_iter()
            .filter(|participant| !participant.is_wildcard)
            .map(|participant| participant.id)
            .collect();
        if placed != registered {
            return Err(Invalid::RosterChanged.into());
        }

        let needs_wildcard = teams
            .iter()
            .any(|team| team.members.contains(&Member::Wildcard));
        let wildcard_id = if needs_wildcard {
            let id = data.next_id();
            let new = wildcard.cloned().unwrap_or_else(NewParticipant::wildcard);
            data.participants
                .insert(id, Participant::from_new(id, tournament_id, new));
            Some(id)
        } else {
            None
        };

        let mut created = Vec::with_capacity(teams.len());
        for team in teams {
            let id = data.next_id();
            let members = team.members.map(|member| match member {
                Member::Participant(id) => id,
                Member::Wildcard => wildcard_id.unwrap_or_default(),
            });
            let team = Team {
                id,
                tournament_id,
                name: team.name.clone(),
                avg_skill: team.avg_skill,
                has_wildcard: team.has_wildcard,
                members,
                created_at: Utc::now(),
            };
            data.teams.insert(id, team.clone());
            created.push(team);
        }

        if let Some(tournament) = data.tournaments.get_mut(&tournament_id) {
            tournament.status = Status::Closed;
        }

        Ok(created)
    }

    fn commit_reopen(&self, tournament_id: Id) -> Result<(), Error> {
        let mut data = self.lock()?;
        data.tournament(tournament_id)?;

        data.teams.retain(|_, team| team.tournament_id != tournament_id);
        data.participants.retain(|_, participant| {
            participant.tournament_id != tournament_id || !participant.is_wildcard
        });
        data.matches
            .retain(|_, bracket_match| bracket_match.tournament_id != tournament_id);

        if let Some(tournament) = data.tournaments.get_mut(&tournament_id) {
            tournament.status = Status::Open;
        }
        Ok(())
    }

    fn bracket(&self, tournament_id: Id) -> Result<Vec<Match>, Error> {
        let data = self.lock()?;
        data.tournament(tournament_id)?;
        Ok(data.matches_of(tournament_id).into_iter().cloned().collect())
    }

    fn replace_bracket(
        &self,
        tournament_id: Id,
        matches: Vec<NewMatch>,
    ) -> Result<Vec<Match>, Error> {
        let mut data = self.lock()?;
        if data.tournament(tournament_id)?.is_open() {
            return Err(Invalid::Open.into());
        }

        data.matches
            .retain(|_, bracket_match| bracket_match.tournament_id != tournament_id);
        for new in matches {
            let id = data.next_id();
            data.matches
                .insert(id, Match::from_new(id, tournament_id, new));
        }

        Ok(data.matches_of(tournament_id).into_iter().cloned().collect())
    }

    fn get_match(&self, id: Id) -> Result<Match, Error> {
        let data = self.lock()?;
        let bracket_match = data.matches.get(&id).ok_or(NotFound::Match(id))?;
        Ok(bracket_match.clone())
    }

    fn find_match(
        &self,
        tournament_id: Id,
        round: u32,
        match_order: u32,
    ) -> Result<Option<Match>, Error> {
        let mut data = self.lock()?;
        Ok(data
            .position_mut(tournament_id, round, match_order)
            .map(|bracket_match| bracket_match.clone()))
    }

    fn decide_match(&self, id: Id, winner: &str) -> Result<Match, Error> {
        let mut data = self.lock()?;
        let bracket_match = data.matches.get_mut(&id).ok_or(NotFound::Match(id))?;

        if bracket_match.is_decided() {
            return Err(Invalid::AlreadyDecided.into());
        }
        if !bracket_match.is_playing(winner) {
            return Err(Invalid::NotInMatch(winner.to_string()).into());
        }
        if bracket_match.team1_name == TBD || bracket_match.team2_name == TBD {
            return Err(Invalid::Waiting.into());
        }

        bracket_match.winner_name = Some(winner.to_string());
        Ok(bracket_match.clone())
    }

    fn fill_slot(
        &self,
        tournament_id: Id,
        round: u32,
        match_order: u32,
        slot: Slot,
        name: &str,
    ) -> Result<Option<Match>, Error> {
        let mut data = self.lock()?;
        let Some(bracket_match) = data.position_mut(tournament_id, round, match_order) else {
            return Ok(None);
        };

        if !bracket_match.is_decided() {
            *bracket_match.team_mut(slot) = name.to_string();
        }
        Ok(Some(bracket_match.clone()))
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use super::*;

    fn open_tournament(store: &MemoryStore, max_participants: u32) -> Tournament {
        store
            .insert_tournament(NewTournament {
                max_participants,
                ..NewTournament::new("Cup", "Chess", Utc::now())
            })
            .unwrap()
    }

    fn join(store: &MemoryStore, tournament_id: Id, nickname: &str) -> Result<Participant, Error> {
        store.insert_participant(
            tournament_id,
            NewParticipant::new(nickname, Skill::Amateur).unwrap(),
        )
    }

    #[test]
    fn registration_rules() {
        let store = MemoryStore::new();
        let tournament = open_tournament(&store, 2);

        join(&store, tournament.id, "Ada").unwrap();
        let taken = join(&store, tournament.id, "ADA").unwrap_err();
        assert!(matches!(taken, Error::Invalid(Invalid::NicknameTaken(_))));

        join(&store, tournament.id, "Bob").unwrap();
        let full = join(&store, tournament.id, "Cy").unwrap_err();
        assert!(matches!(full, Error::Invalid(Invalid::Full)));

        let missing = join(&store, 999, "Dee").unwrap_err();
        assert!(matches!(missing, Error::NotFound(NotFound::Tournament(999))));
    }

    #[test]
    fn failed_close_changes_nothing() {
        let store = MemoryStore::new();
        let tournament = open_tournament(&store, 4);
        let other = open_tournament(&store, 4);
        let ada = join(&store, tournament.id, "Ada").unwrap();
        let stranger = join(&store, other.id, "Stranger").unwrap();

        let teams = [NewTeam {
            name: "Team 1".to_string(),
            avg_skill: 3.0,
            has_wildcard: false,
            members: [Member::Participant(ada.id), Member::Participant(stranger.id)],
        }];
        let error = store.commit_close(tournament.id, &teams, None).unwrap_err();

        assert!(error.is_not_found());
        assert!(store.tournament(tournament.id).unwrap().is_open());
        assert!(store.teams(tournament.id).unwrap().is_empty());
        assert_eq!(store.participants(tournament.id).unwrap().len(), 1);
    }

    #[test]
    fn close_places_every_participant() {
        let store = MemoryStore::new();
        let tournament = open_tournament(&store, 4);
        let ada = join(&store, tournament.id, "Ada").unwrap();
        join(&store, tournament.id, "Late").unwrap();

        let teams = [NewTeam {
            name: "Team 1".to_string(),
            avg_skill: 3.5,
            has_wildcard: true,
            members: [Member::Participant(ada.id), Member::Wildcard],
        }];
        let error = store.commit_close(tournament.id, &teams, None).unwrap_err();

        assert!(matches!(error, Error::Invalid(Invalid::RosterChanged)));
        assert!(store.tournament(tournament.id).unwrap().is_open());
        assert_eq!(store.participants(tournament.id).unwrap().len(), 2);
    }

    #[test]
    fn close_resolves_the_wildcard() {
        let store = MemoryStore::new();
        let tournament = open_tournament(&store, 4);
        let ada = join(&store, tournament.id, "Ada").unwrap();

        let teams = [NewTeam {
            name: "Team 1".to_string(),
            avg_skill: 3.5,
            has_wildcard: true,
            members: [Member::Participant(ada.id), Member::Wildcard],
        }];
        let created = store
            .commit_close(tournament.id, &teams, Some(&NewParticipant::wildcard()))
            .unwrap();

        let participants = store.participants(tournament.id).unwrap();
        let wildcard = participants.iter().find(|p| p.is_wildcard).unwrap();
        assert_eq!(created[0].members, [ada.id, wildcard.id]);
        assert!(!store.tournament(tournament.id).unwrap().is_open());

        let team = &store.teams(tournament.id).unwrap()[0];
        assert_eq!(team.members.len(), 2);
        assert!(team.members[1].is_wildcard);

        // Closed tournaments don't take registrations or skill changes.
        assert!(join(&store, tournament.id, "Late").unwrap_err().is_invalid());
        assert!(store.set_skill(ada.id, Skill::Pro).unwrap_err().is_invalid());
        assert!(store.delete_participant(ada.id).unwrap_err().is_invalid());
    }

    #[test]
    fn sibling_slots_do_not_race() {
        let store = Arc::new(MemoryStore::new());
        let tournament = open_tournament(&store, 4);
        store.commit_close(tournament.id, &[], None).unwrap();
        store
            .replace_bracket(
                tournament.id,
                vec![NewMatch {
                    round: 2,
                    match_order: 1,
                    team1_name: TBD.to_string(),
                    team2_name: TBD.to_string(),
                    winner_name: None,
                }],
            )
            .unwrap();

        let handles: Vec<_> = [(Slot::Team1, "Red"), (Slot::Team2, "Blue")]
            .into_iter()
            .map(|(slot, name)| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..100 {
                        store.fill_slot(tournament.id, 2, 1, slot, name).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let final_match = store.find_match(tournament.id, 2, 1).unwrap().unwrap();
        assert_eq!(final_match.team1_name, "Red");
        assert_eq!(final_match.team2_name, "Blue");
    }

    #[test]
    fn decide_match_preconditions() {
        let store = MemoryStore::new();
        let tournament = open_tournament(&store, 4);
        store.commit_close(tournament.id, &[], None).unwrap();
        let matches = store
            .replace_bracket(
                tournament.id,
                vec![NewMatch {
                    round: 1,
                    match_order: 1,
                    team1_name: "Red".to_string(),
                    team2_name: TBD.to_string(),
                    winner_name: None,
                }],
            )
            .unwrap();
        let id = matches[0].id;

        assert!(matches!(
            store.decide_match(id, TBD).unwrap_err(),
            Error::Invalid(Invalid::NotInMatch(_))
        ));
        assert!(matches!(
            store.decide_match(id, "Red").unwrap_err(),
            Error::Invalid(Invalid::Waiting)
        ));

        store.fill_slot(tournament.id, 1, 1, Slot::Team2, "Blue").unwrap();
        assert_eq!(
            store.decide_match(id, "Blue").unwrap().winner_name.as_deref(),
            Some("Blue")
        );
        assert!(matches!(
            store.decide_match(id, "Red").unwrap_err(),
            Error::Invalid(Invalid::AlreadyDecided)
        ));
        assert!(matches!(
            store.decide_match(id + 100, "Red").unwrap_err(),
            Error::NotFound(NotFound::Match(_))
        ));
    }

    #[test]
    fn saved_data_loads_back() {
        let path = std::env::temp_dir().join(format!(
            "tournament-bracket-{}-{}.ron",
            std::process::id(),
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        let store = MemoryStore::new();
        let tournament = open_tournament(&store, 4);
        join(&store, tournament.id, "Ada").unwrap();

        store.snapshot().unwrap().save(&path).unwrap();
        let loaded = MemoryStore::from_data(Data::load(&path).unwrap());
        fs::remove_file(&path).unwrap();

        assert_eq!(loaded.tournament(tournament.id).unwrap(), tournament);
        assert_eq!(loaded.participants(tournament.id).unwrap().len(), 1);
        // Ids keep counting where they left off.
        let next = open_tournament(&loaded, 4);
        assert!(next.id > tournament.id);
    }

    #[test]
    fn missing_file_is_empty() {
        let data = Data::load(Path::new("/nonexistent/tournaments.ron")).unwrap();
        assert!(MemoryStore::from_data(data).tournaments().unwrap().is_empty());
    }
}
