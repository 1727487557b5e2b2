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

use std::io::Write as _;

use clap::{CommandFactory, Parser};
use tournament_bracket::{COPYRIGHT, LONG_VERSION, SERVER_PORT, balance::EXHAUSTIVE_LIMIT};

/// Tournament Bracket Server
///
/// This is a TCP server that runs tournaments: registration, balanced teams
/// and single elimination brackets. Clients that watch a tournament get
/// every match update pushed to them.
#[allow(clippy::struct_excessive_bools)]
#[derive(Parser, Debug)]
#[command(long_version = LONG_VERSION, about = "Tournament Bracket Server")]
pub(crate) struct Args {
    /// The address to listen on
    #[arg(default_value = "[::]", long)]
    pub host: String,

    /// The port to listen on
    #[arg(default_value_t = SERVER_PORT, long)]
    pub port: u16,

    /// The most players paired by trying every pairing, larger pools are
    /// paired greedily
    #[arg(default_value_t = EXHAUSTIVE_LIMIT, long)]
    pub exhaustive_limit: usize,

    /// Whether to log on the debug level
    #[arg(long)]
    pub debug: bool,

    /// Whether to skip the data file
    #[arg(long)]
    pub skip_the_data_file: bool,

    /// Whether the application is being run by systemd
    #[arg(long)]
    pub systemd: bool,

    /// Build the manpage
    #[arg(long)]
    pub man: bool,
}

impl Args {
    pub(crate) fn generate_man_page() -> anyhow::Result<()> {
        let mut buffer: Vec<u8> = Vec::default();
        let cmd = Self::command()
            .name("tournament-server")
            .long_version(None);
        let man = clap_mangen::Man::new(cmd).date("2026-10-17");

        man.render(&mut buffer)?;
        write!(buffer, "{COPYRIGHT}")?;

        std::fs::write("tournament-server.1", buffer)?;
        Ok(())
    }
}
