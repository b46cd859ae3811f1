//! Channel and topic state.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use chrono::{DateTime, Utc};

use crate::user::User;

/// A channel the local user is currently in.
///
/// `members` maps a live nick to the status-prefix characters that nick
/// currently holds in this channel (e.g. `"@"` for an operator, `""`
/// for none). `modes` holds simple no-argument channel modes only;
/// per-target list modes (bans, exceptions) are not tracked.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Channel {
    pub name: String,
    pub topic: Topic,
    pub modes: BTreeSet<char>,
    pub members: HashMap<String, String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Channel {
    pub fn new(name: impl Into<String>) -> Channel {
        Channel {
            name: name.into(),
            ..Channel::default()
        }
    }

    /// Move a membership entry to a new nick, preserving the prefix
    /// string. No-op when the old nick was not a member.
    pub fn rename_member(&mut self, old: &str, new: &str) {
        if let Some(prefix) = self.members.remove(old) {
            self.members.insert(new.to_string(), prefix);
        }
    }

    /// Case-insensitive membership lookup. State keys never case-fold;
    /// this is a convenience for callers only.
    pub fn has_member(&self, nick: &str) -> bool {
        self.members
            .keys()
            .any(|n| n.eq_ignore_ascii_case(nick))
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modes: String = self.modes.iter().collect();
        write!(f, "{} [+{}]", self.name, modes)
    }
}

/// A channel topic: text, setter and set-time move together.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Topic {
    pub text: Option<String>,
    pub set_by: Option<User>,
    pub set_at: Option<DateTime<Utc>>,
}

impl Topic {
    /// Clear all three fields atomically.
    pub fn reset(&mut self) {
        self.text = None;
        self.set_by = None;
        self.set_at = None;
    }
}
