//! Nom-based IRC line parser.
//!
//! One wire line (CRLF already stripped by the codec) becomes a
//! [`Message`]: an optional IRCv3 tag section (accepted and carried,
//! never interpreted), an optional prefix, and a typed [`Command`]
//! built from the first token plus the remaining parameters. The
//! trailing parameter is everything after the first ` :` and may
//! contain spaces.

use nom::{
    bytes::complete::{take_until, take_while1},
    character::complete::{char, space0},
    combinator::opt,
    error::{context, VerboseError},
    sequence::preceded,
    IResult,
};

use crate::command::Command;
use crate::error::MessageParseError;

type ParseResult<I, O> = IResult<I, O, VerboseError<I>>;

/// A parsed IRC line.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    /// Raw IRCv3 tags section (without the leading `@`), if present.
    pub tags: Option<String>,
    /// Sender mask or server name (without the leading `:`), if present.
    pub prefix: Option<String>,
    /// The typed command with its parameters.
    pub command: Command,
}

impl Message {
    /// Parse one wire line into a message.
    ///
    /// Fails on an empty line or a line that reduces to zero tokens
    /// after prefix removal; the caller drops such lines with a
    /// diagnostic instead of stopping the receive loop.
    pub fn parse(line: &str) -> Result<Message, MessageParseError> {
        if line.is_empty() {
            return Err(MessageParseError::EmptyMessage);
        }

        let trimmed = line.trim_end_matches(['\r', '\n']);

        let (tags, prefix, command, params) = match parse_line(trimmed) {
            Ok((_, parts)) => parts,
            Err(_) => return Err(MessageParseError::InvalidMessage(trimmed.to_string())),
        };

        if command.is_empty() {
            return Err(MessageParseError::InvalidCommand);
        }

        Ok(Message {
            tags: tags.map(str::to_string),
            prefix: prefix.map(str::to_string),
            command: Command::new(command, params.into_iter().map(str::to_string).collect()),
        })
    }
}

impl std::str::FromStr for Message {
    type Err = MessageParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Message::parse(s)
    }
}

fn parse_tags(input: &str) -> ParseResult<&str, &str> {
    context("parsing message tags", preceded(char('@'), take_until(" ")))(input)
}

fn parse_prefix(input: &str) -> ParseResult<&str, &str> {
    context(
        "parsing message prefix",
        preceded(char(':'), take_while1(|c| c != ' ')),
    )(input)
}

fn parse_command(input: &str) -> ParseResult<&str, &str> {
    context(
        "parsing command token",
        take_while1(|c: char| c.is_alphanumeric()),
    )(input)
}

#[allow(clippy::type_complexity)]
fn parse_line(input: &str) -> ParseResult<&str, (Option<&str>, Option<&str>, &str, Vec<&str>)> {
    let (input, tags) = opt(parse_tags)(input)?;
    let (input, _) = space0(input)?;

    let (input, prefix) = opt(parse_prefix)(input)?;
    let (input, _) = space0(input)?;

    let (input, command) = parse_command(input)?;

    // Parameters: space-separated tokens until a " :" introduces the
    // trailing parameter, which swallows the rest of the line.
    let mut params: Vec<&str> = Vec::new();
    let mut rest = input;

    while let Some(b' ') = rest.as_bytes().first().copied() {
        rest = &rest[1..];

        if let Some(b':') = rest.as_bytes().first().copied() {
            params.push(&rest[1..]);
            rest = "";
            break;
        }

        let end = rest.find(' ').unwrap_or(rest.len());
        let param = &rest[..end];
        // A run of separator spaces yields empty tokens; skip them.
        if !param.is_empty() {
            params.push(param);
        }
        rest = &rest[end..];
    }

    Ok((rest, (tags, prefix, command, params)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::Response;

    #[test]
    fn test_parse_simple_command() {
        let msg = Message::parse("PING :irc.example.com").unwrap();
        assert!(msg.tags.is_none());
        assert!(msg.prefix.is_none());
        assert_eq!(msg.command, Command::PING("irc.example.com".to_string()));
    }

    #[test]
    fn test_parse_with_prefix_and_trailing() {
        let msg = Message::parse(":nick!user@host PRIVMSG #channel :Hello, world!").unwrap();
        assert_eq!(msg.prefix.as_deref(), Some("nick!user@host"));
        assert_eq!(
            msg.command,
            Command::PRIVMSG("#channel".to_string(), "Hello, world!".to_string())
        );
    }

    #[test]
    fn test_trailing_keeps_spaces() {
        let msg = Message::parse(":n!u@h COMMAND p1 p2 :trailing text here").unwrap();
        match msg.command {
            Command::Raw(cmd, params) => {
                assert_eq!(cmd, "COMMAND");
                assert_eq!(params, vec!["p1", "p2", "trailing text here"]);
            }
            other => panic!("expected Raw, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_numeric() {
        let msg = Message::parse(":server 001 nick :Welcome to the network").unwrap();
        assert_eq!(msg.prefix.as_deref(), Some("server"));
        match msg.command {
            Command::Response(Response::RPL_WELCOME, params) => {
                assert_eq!(params, vec!["nick", "Welcome to the network"]);
            }
            other => panic!("expected RPL_WELCOME, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_tags_carried() {
        let msg = Message::parse("@time=2023-01-01T00:00:00Z :nick!u@h PRIVMSG #ch :Hi").unwrap();
        assert_eq!(msg.tags.as_deref(), Some("time=2023-01-01T00:00:00Z"));
        assert_eq!(msg.prefix.as_deref(), Some("nick!u@h"));
    }

    #[test]
    fn test_parse_no_trailing() {
        let msg = Message::parse(":nick!u@h JOIN #channel").unwrap();
        assert_eq!(msg.command, Command::JOIN("#channel".to_string()));
    }

    #[test]
    fn test_space_runs_between_params() {
        // RFC 1459 allows one or more spaces per separator.
        let msg = Message::parse(":srv MODE #ch  +nt").unwrap();
        assert_eq!(
            msg.command,
            Command::MODE("#ch".to_string(), "+nt".to_string(), vec![])
        );

        let msg = Message::parse("PRIVMSG #ch   :hi  there").unwrap();
        assert_eq!(
            msg.command,
            Command::PRIVMSG("#ch".to_string(), "hi  there".to_string())
        );
    }

    #[test]
    fn test_empty_trailing() {
        let msg = Message::parse("PRIVMSG #channel :").unwrap();
        assert_eq!(
            msg.command,
            Command::PRIVMSG("#channel".to_string(), String::new())
        );
    }

    #[test]
    fn test_empty_line_is_error() {
        assert_eq!(Message::parse(""), Err(MessageParseError::EmptyMessage));
    }

    #[test]
    fn test_garbage_is_error() {
        assert!(Message::parse(":prefix-only").is_err());
    }

    #[test]
    fn test_crlf_stripped() {
        let msg = Message::parse("PING :server\r\n").unwrap();
        assert_eq!(msg.command, Command::PING("server".to_string()));
    }
}
