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

use std::{sync::mpsc, thread};

use chrono::Utc;
use tournament_bracket::{
    Id,
    balance::{BalanceMode, Balancer},
    bracket::{BYE, Match, TBD},
    error::{Error, Invalid},
    event::{Event, NoEvents},
    lifecycle,
    skill::{Skill, WILDCARD_SKILL},
    store::{MemoryStore, Store},
    tournament::{NewTournament, Status},
};

fn tournament_with(store: &MemoryStore, skills: &[Skill]) -> Id {
    let tournament = lifecycle::create_tournament(
        store,
        NewTournament::new("Spring Cup", "FC 26", Utc::now()),
    )
    .unwrap();

    for (index, skill) in skills.iter().enumerate() {
        lifecycle::register(store, tournament.id, &format!("player{index}"), *skill).unwrap();
    }

    tournament.id
}

fn at(bracket: &[Match], round: u32, match_order: u32) -> &Match {
    bracket
        .iter()
        .find(|m| m.round == round && m.match_order == match_order)
        .unwrap()
}

#[test]
fn every_participant_is_on_exactly_one_team() {
    let store = MemoryStore::new();
    let id = tournament_with(
        &store,
        &[
            Skill::Pro,
            Skill::Rookie,
            Skill::Amateur,
            Skill::Beginner,
            Skill::SemiPro,
            Skill::Pro,
        ],
    );

    let closed = lifecycle::close(&store, &NoEvents, &Balancer::default(), id).unwrap();
    assert_eq!(closed.teams.len(), 3);
    assert_eq!(closed.mode, BalanceMode::Exhaustive);

    let mut members: Vec<_> = closed.teams.iter().flat_map(|team| team.members).collect();
    members.sort_unstable();
    let mut registered: Vec<_> = store
        .participants(id)
        .unwrap()
        .iter()
        .map(|participant| participant.id)
        .collect();
    registered.sort_unstable();

    assert_eq!(members, registered);
    assert!(closed.teams.iter().all(|team| !team.has_wildcard));
    assert_eq!(store.tournament(id).unwrap().status, Status::Closed);
}

#[test]
fn odd_pools_get_one_wildcard() {
    let store = MemoryStore::new();
    let id = tournament_with(&store, &[Skill::Pro, Skill::Rookie, Skill::Amateur]);

    let closed = lifecycle::close(&store, &NoEvents, &Balancer::default(), id).unwrap();
    let wildcards: Vec<_> = store
        .participants(id)
        .unwrap()
        .into_iter()
        .filter(|participant| participant.is_wildcard)
        .collect();

    assert_eq!(closed.teams.len(), 2);
    assert_eq!(wildcards.len(), 1);
    assert_eq!(wildcards[0].skill_value, WILDCARD_SKILL.value());
    assert_eq!(
        closed.teams.iter().filter(|team| team.has_wildcard).count(),
        1
    );
}

#[test]
fn a_single_participant_plays_with_the_wildcard() {
    let store = MemoryStore::new();
    let id = tournament_with(&store, &[Skill::Beginner]);

    let closed = lifecycle::close(&store, &NoEvents, &Balancer::default(), id).unwrap();

    assert_eq!(closed.teams.len(), 1);
    assert!(closed.teams[0].has_wildcard);
    assert!((closed.teams[0].avg_skill - 3.0).abs() < f64::EPSILON);
}

#[test]
fn large_pools_are_paired_greedily() {
    let store = MemoryStore::new();
    let id = tournament_with(&store, &[Skill::Pro; 6]);
    let balancer = Balancer {
        exhaustive_limit: 4,
    };

    let closed = lifecycle::close(&store, &NoEvents, &balancer, id).unwrap();

    assert_eq!(closed.mode, BalanceMode::Greedy);
    assert_eq!(closed.teams.len(), 3);
}

#[test]
fn byes_advance_without_a_recorded_winner() {
    let store = MemoryStore::new();
    let id = tournament_with(
        &store,
        &[
            Skill::Rookie,
            Skill::Rookie,
            Skill::Amateur,
            Skill::Amateur,
            Skill::Pro,
            Skill::Pro,
        ],
    );
    lifecycle::close(&store, &NoEvents, &Balancer::default(), id).unwrap();

    let bracket = lifecycle::generate_bracket(&store, &NoEvents, id).unwrap();
    let bye = at(&bracket, 1, 2);

    assert_eq!(bye.team2_name, BYE);
    assert_eq!(bye.winner_name.as_deref(), Some(bye.team1_name.as_str()));
    assert_eq!(at(&bracket, 2, 1).team2_name, bye.team1_name);
    assert_eq!(at(&bracket, 2, 1).team1_name, TBD);
}

#[test]
fn advancing_touches_one_slot() {
    let store = MemoryStore::new();
    let id = tournament_with(&store, &[Skill::Amateur; 8]);
    lifecycle::close(&store, &NoEvents, &Balancer::default(), id).unwrap();
    let bracket = lifecycle::generate_bracket(&store, &NoEvents, id).unwrap();

    let before = at(&bracket, 2, 1).clone();
    let second = at(&bracket, 1, 2);
    lifecycle::record_winner(&store, &NoEvents, second.id, &second.team1_name).unwrap();
    let after = store.find_match(id, 2, 1).unwrap().unwrap();

    assert_eq!(after.team2_name, second.team1_name);
    assert_eq!(
        Match {
            team2_name: before.team2_name.clone(),
            ..after
        },
        before
    );
}

#[test]
fn winners_are_checked() {
    let store = MemoryStore::new();
    let id = tournament_with(&store, &[Skill::Amateur; 4]);
    lifecycle::close(&store, &NoEvents, &Balancer::default(), id).unwrap();
    let bracket = lifecycle::generate_bracket(&store, &NoEvents, id).unwrap();
    let final_match = &bracket[0];

    let error = lifecycle::record_winner(&store, &NoEvents, final_match.id, "Nobody").unwrap_err();
    assert!(matches!(error, Error::Invalid(Invalid::NotInMatch(_))));

    lifecycle::record_winner(&store, &NoEvents, final_match.id, &final_match.team1_name).unwrap();
    let error = lifecycle::record_winner(&store, &NoEvents, final_match.id, &final_match.team2_name)
        .unwrap_err();
    assert!(matches!(error, Error::Invalid(Invalid::AlreadyDecided)));

    let error = lifecycle::record_winner(&store, &NoEvents, 9_999, "Team 1").unwrap_err();
    assert_eq!(error.to_string(), "match not found");
}

#[test]
fn sibling_winners_recorded_at_once() {
    let store = MemoryStore::new();
    let id = tournament_with(&store, &[Skill::Amateur; 16]);
    lifecycle::close(&store, &NoEvents, &Balancer::default(), id).unwrap();
    let bracket = lifecycle::generate_bracket(&store, &NoEvents, id).unwrap();
    let (first, second) = (at(&bracket, 1, 1), at(&bracket, 1, 2));

    thread::scope(|scope| {
        scope.spawn(|| {
            lifecycle::record_winner(&store, &NoEvents, first.id, &first.team2_name).unwrap();
        });
        scope.spawn(|| {
            lifecycle::record_winner(&store, &NoEvents, second.id, &second.team1_name).unwrap();
        });
    });

    let destination = store.find_match(id, 2, 1).unwrap().unwrap();
    assert_eq!(destination.team1_name, first.team2_name);
    assert_eq!(destination.team2_name, second.team1_name);
}

#[test]
fn five_players_from_registration_to_champion() {
    let store = MemoryStore::new();
    let (events, received) = mpsc::channel();
    let id = tournament_with(
        &store,
        &[
            Skill::Rookie,
            Skill::Beginner,
            Skill::Amateur,
            Skill::SemiPro,
            Skill::Pro,
        ],
    );

    let closed = lifecycle::close(&store, &events, &Balancer::default(), id).unwrap();
    assert_eq!(closed.teams.len(), 3);
    assert!((closed.spread - 0.5).abs() < f64::EPSILON);

    let details = lifecycle::details(&store, id).unwrap();
    let wildcard_teams: Vec<_> = details
        .teams
        .iter()
        .filter(|team| team.team.has_wildcard)
        .collect();
    assert_eq!(wildcard_teams.len(), 1);
    assert!(wildcard_teams[0].members.iter().any(|member| member.is_wildcard
        && member.skill_value == Skill::SemiPro.value()));

    // The two lowest values never end up together when a closer pairing exists.
    for team in &details.teams {
        let values: Vec<_> = team.members.iter().map(|member| member.skill_value).collect();
        assert_ne!(values, [1, 2]);
        assert_ne!(values, [2, 1]);
    }

    let bracket = lifecycle::generate_bracket(&store, &events, id).unwrap();
    assert_eq!(bracket.len(), 3);
    assert_eq!(bracket.iter().map(|m| m.round).max(), Some(2));

    let real = at(&bracket, 1, 1);
    let bye = at(&bracket, 1, 2);
    assert_eq!(bye.team2_name, BYE);
    assert!(bye.is_decided());

    lifecycle::record_winner(&store, &events, real.id, &real.team1_name).unwrap();
    let final_match = store.find_match(id, 2, 1).unwrap().unwrap();
    assert_eq!(final_match.team1_name, real.team1_name);
    assert_eq!(final_match.team2_name, bye.team1_name);
    assert_eq!(lifecycle::champion(&store, id).unwrap(), None);

    lifecycle::record_winner(&store, &events, final_match.id, &bye.team1_name).unwrap();
    assert_eq!(
        lifecycle::champion(&store, id).unwrap().as_deref(),
        Some(bye.team1_name.as_str())
    );

    let events: Vec<_> = received.try_iter().collect();
    assert!(matches!(events[0], Event::TournamentClosed { teams: 3, .. }));
    assert!(matches!(events[1], Event::BracketGenerated { matches: 3, .. }));
    assert!(
        events
            .iter()
            .all(|event| event.tournament_id() == id)
    );
}

#[test]
fn reopen_clears_everything_generated() {
    let store = MemoryStore::new();
    let id = tournament_with(&store, &[Skill::Pro, Skill::Rookie, Skill::Amateur]);
    lifecycle::close(&store, &NoEvents, &Balancer::default(), id).unwrap();
    let bracket = lifecycle::generate_bracket(&store, &NoEvents, id).unwrap();
    let first = &bracket[0];
    lifecycle::record_winner(&store, &NoEvents, first.id, &first.team1_name).unwrap();

    lifecycle::reopen(&store, &NoEvents, id).unwrap();

    let details = lifecycle::details(&store, id).unwrap();
    assert!(details.teams.is_empty());
    assert!(details.bracket.is_empty());
    assert_eq!(details.participants.len(), 3);
    assert!(details.participants.iter().all(|p| !p.is_wildcard));
    assert_eq!(details.tournament.status, Status::Open);

    // Registration works again and a second close starts fresh.
    lifecycle::register(&store, id, "latecomer", Skill::Beginner).unwrap();
    let closed = lifecycle::close(&store, &NoEvents, &Balancer::default(), id).unwrap();
    assert_eq!(closed.teams.len(), 2);
    assert!(closed.teams.iter().all(|team| !team.has_wildcard));
}

#[test]
fn regenerating_discards_results() {
    let store = MemoryStore::new();
    let id = tournament_with(&store, &[Skill::Amateur; 8]);
    lifecycle::close(&store, &NoEvents, &Balancer::default(), id).unwrap();
    let bracket = lifecycle::generate_bracket(&store, &NoEvents, id).unwrap();
    let first = &bracket[0];
    lifecycle::record_winner(&store, &NoEvents, first.id, &first.team1_name).unwrap();

    let regenerated = lifecycle::generate_bracket(&store, &NoEvents, id).unwrap();

    assert_eq!(regenerated.len(), bracket.len());
    assert!(regenerated.iter().all(|m| !m.is_decided()));
    assert!(store.get_match(first.id).unwrap_err().is_not_found());
}

#[test]
fn closed_tournaments_refuse_changes() {
    let store = MemoryStore::new();
    let id = tournament_with(&store, &[Skill::Pro, Skill::Rookie]);
    let participant = store.participants(id).unwrap()[0].clone();
    lifecycle::close(&store, &NoEvents, &Balancer::default(), id).unwrap();

    for error in [
        lifecycle::register(&store, id, "latecomer", Skill::Pro).unwrap_err(),
        lifecycle::update_participant_skill(&store, participant.id, Skill::Rookie).unwrap_err(),
        lifecycle::delete_participant(&store, participant.id).unwrap_err(),
    ] {
        assert!(matches!(error, Error::Invalid(Invalid::Closed)));
    }

    lifecycle::delete_tournament(&store, id).unwrap();
    assert!(store.participant(participant.id).unwrap_err().is_not_found());
    assert!(store.tournaments().unwrap().is_empty());
}
