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

use log::{debug, info};

use crate::{
    Id,
    bracket::{BYE, Match, sibling_order},
    error::Error,
    event::{Event, EventSink},
    store::Store,
};

/// Records the winner of a match and moves them on through the bracket.
///
/// # Errors
///
/// If the match does not exist, is already decided, is waiting on an earlier
/// result or `winner` does not play in it. Nothing changes in that case.
pub fn record_winner<S, E>(store: &S, events: &E, match_id: Id, winner: &str) -> Result<Match, Error>
where
    S: Store + ?Sized,
    E: EventSink + ?Sized,
{
    let decided = store.decide_match(match_id, winner)?;
    info!("{decided}");
    events.emit(Event::MatchUpdated(decided.clone()));

    advance(store, events, &decided)?;
    Ok(decided)
}

/// Writes the winner of a decided match into its slot of the next round.
///
/// Only that one slot is written, so sibling matches may finish at the same
/// time. When the destination has no second feeder the winner gets a bye
/// there too and keeps advancing. Running it again for the same match writes
/// the same name and changes nothing.
///
/// # Errors
///
/// If the store fails.
pub fn advance<S, E>(store: &S, events: &E, decided: &Match) -> Result<(), Error>
where
    S: Store + ?Sized,
    E: EventSink + ?Sized,
{
    let mut current = decided.clone();

    while let Some(winner) = current.winner_name.clone() {
        let (round, match_order, slot) = current.next_position();
        let Some(next) =
            store.fill_slot(current.tournament_id, round, match_order, slot, &winner)?
        else {
            debug!("{winner} won the final of tournament {}", current.tournament_id);
            return Ok(());
        };
        if next.is_decided() {
            return Ok(());
        }
        debug!("{winner} advances to {next}");
        events.emit(Event::MatchUpdated(next.clone()));

        let sibling = store.find_match(
            current.tournament_id,
            current.round,
            sibling_order(current.match_order),
        )?;
        if sibling.is_some() {
            return Ok(());
        }

        store.fill_slot(current.tournament_id, round, match_order, slot.other(), BYE)?;
        current = store.decide_match(next.id, &winner)?;
        debug!("{winner} gets a bye in {current}");
        events.emit(Event::MatchUpdated(current.clone()));
    }

    Ok(())
}
