//! Typed IRC commands.
//!
//! A closed enum over the verbs the dispatcher consumes, with a
//! [`Command::Response`] arm for numerics and [`Command::Raw`] as the
//! explicit fallback for anything unrecognized. A known verb arriving
//! with too few parameters also falls back to `Raw` — servers are
//! lenient on the wire, so classification must be too.

use std::str::FromStr;

use crate::response::Response;

/// A typed IRC command with its parameter payload.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum Command {
    /// `JOIN <channel>`
    JOIN(String),
    /// `PART <channel> [:reason]`
    PART(String, Option<String>),
    /// `NICK <new nick>`
    NICK(String),
    /// `QUIT [:reason]`
    QUIT(Option<String>),
    /// `KICK <channel> <nick> [:reason]`
    KICK(String, String, Option<String>),
    /// `MODE <target> <modestring> [params...]`
    MODE(String, String, Vec<String>),
    /// `TOPIC <channel> [:topic]`
    TOPIC(String, Option<String>),
    /// `PRIVMSG <target> :<text>`
    PRIVMSG(String, String),
    /// `NOTICE <target> :<text>`
    NOTICE(String, String),
    /// `INVITE <nick> <channel>`
    INVITE(String, String),
    /// `KILL <nick> :<reason>`
    KILL(String, String),
    /// `PING <token>`
    PING(String),
    /// `PONG <token>`
    PONG(String),
    /// `ERROR :<reason>`
    ERROR(String),
    /// A three-digit numeric with its parameters.
    Response(Response, Vec<String>),
    /// Anything not covered above; explicit unknown fallback.
    Raw(String, Vec<String>),
}

impl Command {
    /// Classify a command token plus its parameters.
    pub fn new(cmd: &str, params: Vec<String>) -> Command {
        if Response::is_numeric(cmd) {
            return match Response::from_str(cmd) {
                Ok(resp) => Command::Response(resp, params),
                Err(()) => Command::Raw(cmd.to_string(), params),
            };
        }

        let verb = cmd.to_ascii_uppercase();
        match classify(&verb, &params) {
            Some(command) => command,
            None => Command::Raw(cmd.to_string(), params),
        }
    }
}

/// The typed arm for a known verb with enough parameters, or `None`
/// for the `Raw` fallback.
fn classify(verb: &str, params: &[String]) -> Option<Command> {
    let command = match (verb, params) {
        ("JOIN", [chan, ..]) => Command::JOIN(chan.clone()),
        ("PART", [chan]) => Command::PART(chan.clone(), None),
        ("PART", [chan, reason, ..]) => Command::PART(chan.clone(), Some(reason.clone())),
        ("NICK", [nick, ..]) => Command::NICK(nick.clone()),
        ("QUIT", []) => Command::QUIT(None),
        ("QUIT", [reason, ..]) => Command::QUIT(Some(reason.clone())),
        ("KICK", [chan, nick]) => Command::KICK(chan.clone(), nick.clone(), None),
        ("KICK", [chan, nick, reason, ..]) => {
            Command::KICK(chan.clone(), nick.clone(), Some(reason.clone()))
        }
        ("MODE", [target, modes, rest @ ..]) => {
            Command::MODE(target.clone(), modes.clone(), rest.to_vec())
        }
        ("TOPIC", [chan]) => Command::TOPIC(chan.clone(), None),
        ("TOPIC", [chan, topic, ..]) => Command::TOPIC(chan.clone(), Some(topic.clone())),
        ("PRIVMSG", [target, text, ..]) => Command::PRIVMSG(target.clone(), text.clone()),
        ("NOTICE", [target, text, ..]) => Command::NOTICE(target.clone(), text.clone()),
        ("INVITE", [nick, chan, ..]) => Command::INVITE(nick.clone(), chan.clone()),
        ("KILL", [nick, reason, ..]) => Command::KILL(nick.clone(), reason.clone()),
        ("PING", [token, ..]) => Command::PING(token.clone()),
        ("PONG", [token, ..]) => Command::PONG(token.clone()),
        ("ERROR", [reason, ..]) => Command::ERROR(reason.clone()),
        _ => return None,
    };
    Some(command)
}
