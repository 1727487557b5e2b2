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

#![deny(clippy::expect_used)]
#![deny(clippy::indexing_slicing)]
#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]

mod command_line;

use std::{
    fmt,
    io::{BufRead, BufReader, Write},
    net::{TcpListener, TcpStream},
    path::PathBuf,
    process::exit,
    sync::mpsc::{self, Receiver, Sender},
    thread,
    time::Duration,
};

use chrono::DateTime;
use clap::Parser;
use log::{debug, error, info};
use rustc_hash::{FxHashMap, FxHashSet};
use tournament_bracket::{
    DATA_FILE, Id,
    balance::Balancer,
    event::Event,
    lifecycle,
    skill::Skill,
    store::{Data, MemoryStore, Store},
    tournament::NewTournament,
    utils::{self, create_data_folder, data_file},
};

use crate::command_line::Args;

const HOUR_IN_SECONDS: u64 = 60 * 60;

/// The sender of control messages. Connections are numbered from 1.
const SERVER_INDEX: usize = 0;

type Message = (String, Option<Sender<String>>);

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    utils::init_logger(args.debug, args.systemd);

    if args.man {
        return Args::generate_man_page();
    }

    let (tx, rx) = mpsc::channel();
    let balancer = Balancer {
        exhaustive_limit: args.exhaustive_limit,
    };

    let mut server = if args.skip_the_data_file {
        Server::new(balancer, None)?
    } else {
        create_data_folder()?;
        let server = Server::new(balancer, Some(data_file(DATA_FILE)))?;

        let tx = tx.clone();
        let systemd = args.systemd;
        ctrlc::set_handler(move || {
            if !systemd {
                println!();
            }
            handle_error(tx.send((format!("{SERVER_INDEX} save"), None)));
            handle_error(tx.send((format!("{SERVER_INDEX} exit"), None)));
        })?;

        server
    };

    thread::spawn(move || server.handle_messages(&rx));
    Server::save(tx.clone());

    let address = format!("{}:{}", args.host, args.port);
    let listener = match TcpListener::bind(&address) {
        Ok(listener) => listener,
        Err(error) => {
            error!("TcpListener::bind: {error}");
            TcpListener::bind(format!("0.0.0.0:{}", args.port))?
        }
    };
    info!("listening on {} ...", listener.local_addr()?);

    for (index, stream) in (1..).zip(listener.incoming()) {
        let stream = match stream {
            Ok(stream) => stream,
            Err(error) => {
                error!("stream: {error}");
                continue;
            }
        };

        let tx = tx.clone();
        thread::spawn(move || {
            if let Err(error) = connection(index, stream, &tx) {
                error!("connection: {error}");
            }
        });
    }

    Ok(())
}

fn connection(index: usize, stream: TcpStream, tx: &Sender<Message>) -> anyhow::Result<()> {
    let reader = BufReader::new(stream.try_clone()?);
    let (client_tx, client_rx) = mpsc::channel();

    tx.send((format!("{SERVER_INDEX} connect {index}"), Some(client_tx)))?;
    thread::spawn(move || {
        if let Err(error) = receiving_and_writing(stream, &client_rx) {
            error!("receiving_and_writing: {error}");
        }
    });

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();

        if line.is_empty() || line.chars().any(|ch| ch.is_control() || ch == '\0') {
            break;
        }

        tx.send((format!("{index} {line}"), None))?;
    }

    tx.send((format!("{SERVER_INDEX} disconnect {index}"), None))?;
    Ok(())
}

fn connection_index(the_rest: &[&str]) -> Option<usize> {
    the_rest.first()?.parse().ok()
}

fn receiving_and_writing<T: Send + Write>(
    mut stream: T,
    client_rx: &Receiver<String>,
) -> anyhow::Result<()> {
    for mut message in client_rx {
        message.push('\n');
        if let Err(error) = stream.write_all(message.as_bytes()) {
            return Err(anyhow::Error::msg(format!("{message}: {error}")));
        }
    }

    Ok(())
}

fn handle_error<T, E: fmt::Display>(result: Result<T, E>) -> T {
    match result {
        Ok(value) => value,
        Err(error) => {
            error!("{error}");
            exit(1)
        }
    }
}

struct Server {
    store: MemoryStore,
    balancer: Balancer,
    clients: FxHashMap<usize, Sender<String>>,
    /// Client indexes by the tournament they watch.
    watchers: FxHashMap<Id, FxHashSet<usize>>,
    data_file: Option<PathBuf>,
    events_tx: Sender<Event>,
    events_rx: Receiver<Event>,
}

impl Server {
    fn new(balancer: Balancer, data_file: Option<PathBuf>) -> anyhow::Result<Self> {
        let store = match &data_file {
            Some(path) => match Data::load(path) {
                Ok(data) => MemoryStore::from_data(data),
                Err(error) => {
                    return Err(anyhow::Error::msg(format!("{}: {error}", path.display())));
                }
            },
            None => MemoryStore::new(),
        };
        let (events_tx, events_rx) = mpsc::channel();

        Ok(Self {
            store,
            balancer,
            clients: FxHashMap::default(),
            watchers: FxHashMap::default(),
            data_file,
            events_tx,
            events_rx,
        })
    }

    fn handle_messages(&mut self, rx: &Receiver<Message>) {
        for (message, option_tx) in rx {
            self.handle_message(&message, option_tx);
        }
    }

    fn handle_message(&mut self, message: &str, option_tx: Option<Sender<String>>) {
        if let Some((tx, ok, command)) = self.handle_messages_internal(message, option_tx) {
            if ok {
                let _ok = tx.send(format!("= {command}"));
            } else {
                let _ok = tx.send(format!("? {command}"));
            }
        }

        self.push_events();
    }

    fn handle_messages_internal(
        &mut self,
        message: &str,
        option_tx: Option<Sender<String>>,
    ) -> Option<(Sender<String>, bool, String)> {
        let index_command: Vec<_> = message.split_ascii_whitespace().collect();
        let (Some(index_supplied), Some(command)) = (index_command.first(), index_command.get(1))
        else {
            return None;
        };
        let index_supplied = index_supplied.parse::<usize>().ok()?;
        let the_rest: Vec<_> = index_command.iter().skip(2).copied().collect();

        if *command != "ping" {
            debug!("{index_supplied} {command} {}", the_rest.join(" "));
        }

        let result = match *command {
            "connect" if index_supplied == SERVER_INDEX => {
                if let (Some(index), Some(tx)) = (connection_index(&the_rest), option_tx) {
                    self.clients.insert(index, tx);
                }
                return None;
            }
            "disconnect" if index_supplied == SERVER_INDEX => {
                if let Some(index) = connection_index(&the_rest) {
                    self.clients.remove(&index);
                    for watchers in self.watchers.values_mut() {
                        watchers.remove(&index);
                    }
                }
                return None;
            }
            "save" if index_supplied == SERVER_INDEX => {
                self.save_data();
                return None;
            }
            "exit" if index_supplied == SERVER_INDEX => {
                info!("exiting ...");
                exit(0)
            }
            "advance" => self.advance(&the_rest),
            "bracket" => self.bracket(&the_rest),
            "champion" => self.champion(&the_rest),
            "close" => self.close(&the_rest),
            "create_tournament" => self.create_tournament(&the_rest),
            "delete_tournament" => self.delete_tournament(&the_rest),
            "details" => self.details(&the_rest),
            "generate_bracket" => self.generate_bracket(&the_rest),
            "join" => self.join(&the_rest),
            "leave" => self.leave(&the_rest),
            "ping" => Ok(String::new()),
            "rename_team" => self.rename_team(&the_rest),
            "reopen" => self.reopen(&the_rest),
            "skill" => self.skill(&the_rest),
            "tournaments" => self.tournaments(),
            "unwatch" => self.unwatch(index_supplied, &the_rest),
            "watch" => self.watch(index_supplied, &the_rest),
            "winner" => self.winner(&the_rest),
            _ => Err(anyhow::Error::msg("unknown command")),
        };

        let tx = self.clients.get(&index_supplied)?.clone();
        match result {
            Ok(reply) if reply.is_empty() => Some((tx, true, (*command).to_string())),
            Ok(reply) => Some((tx, true, format!("{command} {reply}"))),
            Err(error) => {
                info!("{index_supplied} {command}: {error}");
                Some((tx, false, format!("{command} {error}")))
            }
        }
    }

    fn push_events(&self) {
        while let Ok(event) = self.events_rx.try_recv() {
            let message = match &event {
                Event::MatchUpdated(updated) => match ron::ser::to_string(updated) {
                    Ok(updated) => format!("= match_updated {updated}"),
                    Err(error) => {
                        error!("match_updated: {error}");
                        continue;
                    }
                },
                event => format!("= {event}"),
            };

            if let Some(watchers) = self.watchers.get(&event.tournament_id()) {
                for index in watchers {
                    if let Some(tx) = self.clients.get(index) {
                        let _ok = tx.send(message.clone());
                    }
                }
            }
        }
    }

    fn save(tx: Sender<Message>) {
        thread::spawn(move || {
            loop {
                thread::sleep(Duration::from_secs(HOUR_IN_SECONDS));
                handle_error(tx.send((format!("{SERVER_INDEX} save"), None)));
            }
        });
    }

    fn save_data(&self) {
        let Some(path) = &self.data_file else {
            return;
        };

        match self.store.snapshot() {
            Ok(data) => {
                if let Err(error) = data.save(path) {
                    error!("save file: {error}");
                }
            }
            Err(error) => error!("save file: {error}"),
        }
    }

    fn advance(&self, the_rest: &[&str]) -> anyhow::Result<String> {
        let replayed =
            lifecycle::replay_advance(&self.store, &self.events_tx, id(the_rest, 0, "match")?)?;
        Ok(replayed.id.to_string())
    }

    fn bracket(&self, the_rest: &[&str]) -> anyhow::Result<String> {
        let bracket = self.store.bracket(id(the_rest, 0, "tournament")?)?;
        Ok(ron::ser::to_string(&bracket)?)
    }

    fn champion(&self, the_rest: &[&str]) -> anyhow::Result<String> {
        let champion = lifecycle::champion(&self.store, id(the_rest, 0, "tournament")?)?;
        Ok(ron::ser::to_string(&champion)?)
    }

    fn close(&self, the_rest: &[&str]) -> anyhow::Result<String> {
        let closed = lifecycle::close(
            &self.store,
            &self.events_tx,
            &self.balancer,
            id(the_rest, 0, "tournament")?,
        )?;
        Ok(format!("{} {} {}", closed.teams.len(), closed.mode, closed.spread))
    }

    fn create_tournament(&self, the_rest: &[&str]) -> anyhow::Result<String> {
        let (Some(max_participants), Some(deadline), Some(game)) =
            (the_rest.first(), the_rest.get(1), the_rest.get(2))
        else {
            return Err(anyhow::Error::msg(
                "expected: MAX_PARTICIPANTS DEADLINE GAME NAME...",
            ));
        };

        let deadline =
            DateTime::parse_from_str(&format!("{deadline} 00:00:00 +0000"), "%Y-%m-%d %H:%M:%S %z")?;
        let name = rest(the_rest, 3);
        let new = NewTournament {
            max_participants: max_participants.parse()?,
            ..NewTournament::new(&name, game, deadline.to_utc())
        };

        let tournament = lifecycle::create_tournament(&self.store, new)?;
        Ok(tournament.id.to_string())
    }

    fn delete_tournament(&mut self, the_rest: &[&str]) -> anyhow::Result<String> {
        let tournament_id = id(the_rest, 0, "tournament")?;
        lifecycle::delete_tournament(&self.store, tournament_id)?;
        self.watchers.remove(&tournament_id);
        Ok(String::new())
    }

    fn details(&self, the_rest: &[&str]) -> anyhow::Result<String> {
        let details = lifecycle::details(&self.store, id(the_rest, 0, "tournament")?)?;
        Ok(ron::ser::to_string(&details)?)
    }

    fn generate_bracket(&self, the_rest: &[&str]) -> anyhow::Result<String> {
        let bracket = lifecycle::generate_bracket(
            &self.store,
            &self.events_tx,
            id(the_rest, 0, "tournament")?,
        )?;
        Ok(bracket.len().to_string())
    }

    fn join(&self, the_rest: &[&str]) -> anyhow::Result<String> {
        let tournament_id = id(the_rest, 0, "tournament")?;
        let Some(skill) = the_rest.get(1) else {
            return Err(anyhow::Error::msg("expected: TOURNAMENT SKILL NICKNAME..."));
        };
        let skill: Skill = skill.parse()?;

        let participant = lifecycle::register(&self.store, tournament_id, &rest(the_rest, 2), skill)?;
        Ok(participant.id.to_string())
    }

    fn leave(&self, the_rest: &[&str]) -> anyhow::Result<String> {
        lifecycle::delete_participant(&self.store, id(the_rest, 0, "participant")?)?;
        Ok(String::new())
    }

    fn rename_team(&self, the_rest: &[&str]) -> anyhow::Result<String> {
        let team = lifecycle::rename_team(&self.store, id(the_rest, 0, "team")?, &rest(the_rest, 1))?;
        Ok(team.name)
    }

    fn reopen(&self, the_rest: &[&str]) -> anyhow::Result<String> {
        lifecycle::reopen(&self.store, &self.events_tx, id(the_rest, 0, "tournament")?)?;
        Ok(String::new())
    }

    fn skill(&self, the_rest: &[&str]) -> anyhow::Result<String> {
        let participant_id = id(the_rest, 0, "participant")?;
        let Some(skill) = the_rest.get(1) else {
            return Err(anyhow::Error::msg("expected: PARTICIPANT SKILL"));
        };

        let participant =
            lifecycle::update_participant_skill(&self.store, participant_id, skill.parse()?)?;
        Ok(participant.skill.to_string())
    }

    fn tournaments(&self) -> anyhow::Result<String> {
        Ok(ron::ser::to_string(&self.store.tournaments()?)?)
    }

    fn unwatch(&mut self, index_supplied: usize, the_rest: &[&str]) -> anyhow::Result<String> {
        let tournament_id = id(the_rest, 0, "tournament")?;
        if let Some(watchers) = self.watchers.get_mut(&tournament_id) {
            watchers.remove(&index_supplied);
        }
        Ok(String::new())
    }

    fn watch(&mut self, index_supplied: usize, the_rest: &[&str]) -> anyhow::Result<String> {
        let tournament_id = id(the_rest, 0, "tournament")?;
        let bracket = self.store.bracket(tournament_id)?;

        self.watchers
            .entry(tournament_id)
            .or_default()
            .insert(index_supplied);
        Ok(ron::ser::to_string(&bracket)?)
    }

    fn winner(&self, the_rest: &[&str]) -> anyhow::Result<String> {
        let decided = lifecycle::record_winner(
            &self.store,
            &self.events_tx,
            id(the_rest, 0, "match")?,
            &rest(the_rest, 1),
        )?;
        Ok(decided.id.to_string())
    }
}

fn id(the_rest: &[&str], index: usize, what: &str) -> anyhow::Result<Id> {
    let Some(id) = the_rest.get(index) else {
        return Err(anyhow::Error::msg(format!("the {what} id is missing")));
    };

    id.parse::<Id>()
        .map_err(|error| anyhow::Error::msg(format!("{what} id: {error}")))
}

fn rest(the_rest: &[&str], from: usize) -> String {
    the_rest.iter().skip(from).copied().collect::<Vec<_>>().join(" ")
}
