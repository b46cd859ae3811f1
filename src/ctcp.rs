//! Client-to-Client Protocol sub-framing.
//!
//! A CTCP frame rides inside a PRIVMSG (request) or NOTICE (reply):
//! the text is wrapped in the single control byte 0x01 at both ends,
//! with the verb and an optional free-text argument separated by one
//! space.

/// The CTCP frame delimiter.
pub const CTCP_DELIM: char = '\u{1}';

/// A parsed CTCP frame, borrowing from the message text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ctcp<'a> {
    pub command: &'a str,
    pub arg: &'a str,
}

impl<'a> Ctcp<'a> {
    /// Recognize and unwrap a CTCP frame. Returns `None` for plain
    /// message text.
    pub fn parse(text: &'a str) -> Option<Ctcp<'a>> {
        let inner = text
            .strip_prefix(CTCP_DELIM)?
            .strip_suffix(CTCP_DELIM)?;
        if inner.is_empty() {
            return None;
        }
        let (command, arg) = match inner.split_once(' ') {
            Some((c, a)) => (c, a),
            None => (inner, ""),
        };
        Some(Ctcp { command, arg })
    }
}

/// Build a CTCP frame for sending.
pub fn frame(command: &str, arg: Option<&str>) -> String {
    match arg {
        Some(arg) if !arg.is_empty() => format!("{CTCP_DELIM}{command} {arg}{CTCP_DELIM}"),
        _ => format!("{CTCP_DELIM}{command}{CTCP_DELIM}"),
    }
}

/// Reply strings for the CTCP requests this client answers
/// automatically.
#[derive(Clone, Debug)]
pub struct CtcpReplies {
    pub clientinfo: String,
    pub finger: String,
    pub source: String,
    /// Only sent when non-empty.
    pub userinfo: String,
    pub version: String,
}

impl Default for CtcpReplies {
    fn default() -> Self {
        CtcpReplies {
            clientinfo: "CLIENTINFO FINGER PING SOURCE TIME USERINFO VERSION".to_string(),
            finger: "Don't finger me, pervert!".to_string(),
            source: "https://github.com/sid3xyz/slirc-client".to_string(),
            userinfo: String::new(),
            version: format!("slirc-client v{}", env!("CARGO_PKG_VERSION")),
        }
    }
}
