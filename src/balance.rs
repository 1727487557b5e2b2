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

//! Pairs participants into two person teams with as little spread between
//! the team averages as possible.
//!
//! Up to [`EXHAUSTIVE_LIMIT`] players every perfect matching is considered
//! (with pruning), which finds the true minimax pairing. `15!! = 2_027_025`
//! matchings at 16 players is about as far as that stays interactive, so
//! larger pools are paired greedily: repeatedly take the two players whose
//! average is closest to the mean of everyone still unpaired. The greedy
//! result is usually close but not guaranteed optimal, and the chosen
//! [`BalanceMode`] is reported back so callers can surface it.

use std::fmt;

use log::{debug, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    participant::{NewParticipant, Participant},
    skill::WILDCARD_SKILL,
    team::{Member, NewTeam},
};

pub const EXHAUSTIVE_LIMIT: usize = 16;

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum BalanceMode {
    #[default]
    Exhaustive,
    Greedy,
}

impl fmt::Display for BalanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhaustive => write!(f, "exhaustive"),
            Self::Greedy => write!(f, "greedy"),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Balancer {
    /// The largest pool, wildcard included, that is searched exhaustively.
    pub exhaustive_limit: usize,
}

impl Default for Balancer {
    fn default() -> Self {
        Self {
            exhaustive_limit: EXHAUSTIVE_LIMIT,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Balanced {
    pub teams: Vec<NewTeam>,
    /// Present when the pool was odd and a wildcard had to be added.
    pub wildcard: Option<NewParticipant>,
    pub mode: BalanceMode,
}

impl Balanced {
    /// The highest minus the lowest team average.
    #[must_use]
    pub fn spread(&self) -> f64 {
        spread(&self.teams)
    }
}

#[must_use]
pub fn spread(teams: &[NewTeam]) -> f64 {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;

    for team in teams {
        min = min.min(team.avg_skill);
        max = max.max(team.avg_skill);
    }

    if teams.is_empty() { 0.0 } else { max - min }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Entry {
    member: Member,
    value: u32,
    is_wildcard: bool,
}

impl Balancer {
    #[must_use]
    pub fn balance(&self, participants: &[Participant]) -> Balanced {
        if participants.is_empty() {
            return Balanced::default();
        }

        let mut pool: Vec<_> = participants
            .iter()
            .map(|participant| Entry {
                member: Member::Participant(participant.id),
                value: participant.skill_value,
                is_wildcard: participant.is_wildcard,
            })
            .collect();

        let wildcard = if pool.len() % 2 == 1 {
            pool.push(Entry {
                member: Member::Wildcard,
                value: WILDCARD_SKILL.value(),
                is_wildcard: true,
            });
            Some(NewParticipant::wildcard())
        } else {
            None
        };

        // Lowest value first, stable on ties so the input order breaks them.
        pool.sort_by_key(|entry| entry.value);

        let (pairs, mode) = if pool.len() <= self.exhaustive_limit {
            (exhaustive(&pool), BalanceMode::Exhaustive)
        } else {
            warn!(
                "balance: {} players is above the exhaustive limit of {}, pairing greedily",
                pool.len(),
                self.exhaustive_limit
            );
            (greedy(pool), BalanceMode::Greedy)
        };

        let teams: Vec<_> = pairs
            .into_iter()
            .enumerate()
            .map(|(index, (first, second))| NewTeam {
                name: format!("Team {}", index + 1),
                avg_skill: (f64::from(first.value) + f64::from(second.value)) / 2.0,
                has_wildcard: first.is_wildcard || second.is_wildcard,
                members: [first.member, second.member],
            })
            .collect();

        debug!(
            "balance: {} teams, {mode}, spread {}",
            teams.len(),
            spread(&teams)
        );

        Balanced {
            teams,
            wildcard,
            mode,
        }
    }
}

/// Balances with the default exhaustive limit.
#[must_use]
pub fn balance(participants: &[Participant]) -> Balanced {
    Balancer::default().balance(participants)
}

#[derive(Clone, Debug)]
struct Best {
    spread: u64,
    pairs: Vec<(usize, usize)>,
}

/// Backtracking over every perfect matching of `values`.
///
/// Spreads are compared on pair sums, which is the team average times two,
/// so the search stays in integers.
struct Search<'a> {
    values: &'a [u64],
    used: Vec<bool>,
    current: Vec<(usize, usize)>,
    best: Option<Best>,
}

impl Search<'_> {
    fn bound(&self) -> u64 {
        self.best.as_ref().map_or(u64::MAX, |best| best.spread)
    }

    fn run(&mut self, min: u64, max: u64) {
        let Some(first) = self.used.iter().position(|used| !used) else {
            let spread = max - min;
            if spread < self.bound() {
                self.best = Some(Best {
                    spread,
                    pairs: self.current.clone(),
                });
            }
            return;
        };

        self.used[first] = true;
        let mut tried = None;

        for second in first + 1..self.values.len() {
            if self.used[second] {
                continue;
            }
            // Partners of equal value lead to mirrored subtrees.
            if tried == Some(self.values[second]) {
                continue;
            }
            tried = Some(self.values[second]);

            let sum = self.values[first] + self.values[second];
            let (low, high) = (min.min(sum), max.max(sum));
            if high - low >= self.bound() {
                continue;
            }

            self.used[second] = true;
            self.current.push((first, second));
            self.run(low, high);
            self.current.pop();
            self.used[second] = false;
        }

        self.used[first] = false;
    }
}

/// Splits the search on the partner of the lowest valued player and searches the
/// branches in parallel. The first branch reaching the lowest spread wins,
/// which is the same pairing a sequential search would return.
fn exhaustive(pool: &[Entry]) -> Vec<(Entry, Entry)> {
    let values: Vec<u64> = pool.iter().map(|entry| u64::from(entry.value)).collect();

    let mut partners = Vec::new();
    for second in 1..values.len() {
        if partners
            .last()
            .is_none_or(|last: &usize| values[*last] != values[second])
        {
            partners.push(second);
        }
    }

    let best = partners
        .par_iter()
        .map(|&second| {
            let mut used = vec![false; values.len()];
            used[0] = true;
            used[second] = true;

            let sum = values[0] + values[second];
            let mut search = Search {
                values: &values,
                used,
                current: vec![(0, second)],
                best: None,
            };
            search.run(sum, sum);
            search.best
        })
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .min_by_key(|best| best.spread);

    best.map(|best| {
        best.pairs
            .into_iter()
            .map(|(first, second)| (pool[first], pool[second]))
            .collect()
    })
    .unwrap_or_default()
}

fn greedy(mut pool: Vec<Entry>) -> Vec<(Entry, Entry)> {
    let mut pairs = Vec::with_capacity(pool.len() / 2);

    while pool.len() >= 2 {
        let len = u64::try_from(pool.len()).unwrap_or(u64::MAX);
        let total: u64 = pool.iter().map(|entry| u64::from(entry.value)).sum();

        // |(a + b) / 2 - total / len| scaled by 2 * len.
        let mut best = (0, 1);
        let mut best_distance = u64::MAX;
        for first in 0..pool.len() {
            for second in first + 1..pool.len() {
                let sum = u64::from(pool[first].value) + u64::from(pool[second].value);
                let distance = (sum * len).abs_diff(2 * total);
                if distance < best_distance {
                    best_distance = distance;
                    best = (first, second);
                }
            }
        }

        let second = pool.remove(best.1);
        let first = pool.remove(best.0);
        pairs.push((first, second));
    }

    pairs
}
