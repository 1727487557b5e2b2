//! Tournament registration, balanced two person teams and single elimination
//! brackets, with a TCP server in front of them.
//!
//! ## Feature Flags
//!
//! By default the `server` feature flag is enabled.
//!
//! * server - enable the `tournament-server` binary
//!
//! ## Lifecycle
//!
//! Participants register while a tournament is open. Closing it pairs them
//! into teams with [`balance`], then [`lifecycle::generate_bracket`] seeds the
//! teams into a [`bracket`] and [`progression`] moves winners through it.

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

#![deny(clippy::panic)]

pub mod balance;
pub mod bracket;
pub mod error;
pub mod event;
pub mod lifecycle;
pub mod participant;
pub mod progression;
pub mod skill;
pub mod store;
pub mod team;
pub mod tournament;
pub mod utils;

pub type Id = u64;
pub const HOME: &str = "tournament-bracket";
pub const SERVER_PORT: u16 = 49_153;
pub const DATA_FILE: &str = "tournaments.ron";

pub const COPYRIGHT: &str = r".SH COPYRIGHT
Copyright (C) 2026 The tournament-bracket developers

This program is free software: you can redistribute it and/or modify
it under the terms of the GNU Affero General Public License as published by
the Free Software Foundation, either version 3 of the License, or
(at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
GNU Affero General Public License for more details.

You should have received a copy of the GNU Affero General Public License
along with this program.  If not, see <https://www.gnu.org/licenses/>.
";

pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "
Copyright (c) 2026 The tournament-bracket developers
Licensed under the AGPLv3"
);
