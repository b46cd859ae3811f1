//! Session state tracking.
//!
//! A [`Session`] owns everything the server has narrated about the
//! current connection: the local nick, the channels we are in, every
//! user sharing a channel with us, and the negotiated capability
//! table. Only the receiver duty mutates it (single-writer discipline);
//! the mutation entry points here are pure state transitions with no
//! I/O, driven by the event dispatcher.
//!
//! Invariants:
//! - a user appears in `users` iff it shares at least one channel with
//!   the local user, or is the local user itself;
//! - every nick in a channel's member map is also a key in `users`.

use std::collections::{HashMap, VecDeque};

use tracing::warn;

use crate::chan::Channel;
use crate::isupport::Isupport;
use crate::mode::ModeOp;
use crate::user::User;

/// The local model of an IRC connection.
#[derive(Clone, Debug, Default)]
pub struct Session {
    /// Our current nick; NICK events and 433 retries update it.
    pub nick: String,
    /// Network name, if the server advertised one.
    pub network: Option<String>,
    pub channels: HashMap<String, Channel>,
    pub users: HashMap<String, User>,
    pub isupport: Isupport,
    /// Channels awaiting a WHO reply; only the front entry is in
    /// flight, the rest wait for its end-of-WHO numeric.
    pub(crate) pending_who: VecDeque<String>,
}

impl Session {
    pub fn new(nick: impl Into<String>) -> Session {
        Session {
            nick: nick.into(),
            ..Session::default()
        }
    }

    /// Whether a nick is the local user.
    pub fn is_self(&self, nick: &str) -> bool {
        self.nick == nick
    }

    /// Channels shared between the local user and a nick, computed
    /// lazily at removal time rather than kept as a counter.
    pub fn shared_channels(&self, nick: &str) -> Vec<&str> {
        self.channels
            .values()
            .filter(|chan| chan.members.contains_key(nick))
            .map(|chan| chan.name.as_str())
            .collect()
    }

    /// JOIN bookkeeping: register the user and its (empty-prefix)
    /// membership. The dispatcher creates the channel first when the
    /// joiner is the local user.
    pub fn add_member(&mut self, channel: &str, user: &User) {
        self.users.insert(user.nick.clone(), user.clone());
        if let Some(chan) = self.channels.get_mut(channel) {
            chan.members.insert(user.nick.clone(), String::new());
        } else {
            warn!("JOIN for untracked channel {}", channel);
        }
    }

    /// PART/KICK bookkeeping. The local user leaving discards the
    /// whole channel; anyone else is garbage-collected from `users`
    /// once no shared channel remains.
    pub fn remove_member(&mut self, channel: &str, nick: &str) {
        if self.is_self(nick) {
            self.channels.remove(channel);
            return;
        }
        if let Some(chan) = self.channels.get_mut(channel) {
            chan.members.remove(nick);
        }
        if self.shared_channels(nick).is_empty() {
            self.users.remove(nick);
        }
    }

    /// NICK bookkeeping: move membership entries in every shared
    /// channel preserving prefix strings, re-key `users` mutating the
    /// same user in place, and track our own nick.
    pub fn rename_user(&mut self, old: &str, new: &str) {
        if self.is_self(old) {
            self.nick = new.to_string();
        }

        for chan in self.channels.values_mut() {
            chan.rename_member(old, new);
        }

        if let Some(mut user) = self.users.remove(old) {
            user.nick = new.to_string();
            self.users.insert(new.to_string(), user);
        }
    }

    /// QUIT bookkeeping: strip from every channel, then drop
    /// unconditionally.
    pub fn remove_quit(&mut self, nick: &str) {
        for chan in self.channels.values_mut() {
            chan.members.remove(nick);
        }
        self.users.remove(nick);
    }

    /// Apply one decoded mode op to a channel. Prefix flags edit the
    /// target member's prefix string; other flags edit the channel's
    /// mode set.
    pub fn apply_mode_op(&mut self, channel: &str, op: &ModeOp) {
        let symbol = op
            .target
            .as_ref()
            .and_then(|_| self.isupport.prefix_symbol_for(op.flag));

        let Some(chan) = self.channels.get_mut(channel) else {
            warn!("MODE for untracked channel {}", channel);
            return;
        };

        match (symbol, &op.target) {
            (Some(symbol), Some(target)) => {
                if let Some(prefix) = chan.members.get_mut(target.as_str()) {
                    if op.adding {
                        if !prefix.contains(symbol) {
                            prefix.push(symbol);
                        }
                    } else {
                        prefix.retain(|c| c != symbol);
                    }
                }
            }
            // List-type modes are per-target and not channel state.
            _ if !self.isupport.is_prefix_mode(op.flag)
                && !self.isupport.modes_list.contains(op.flag) =>
            {
                if op.adding {
                    chan.modes.insert(op.flag);
                } else {
                    chan.modes.remove(&op.flag);
                }
            }
            _ => {}
        }
    }

    /// Apply one NAMES reply: each token is an optional run of
    /// status-prefix symbols followed by a nick.
    pub fn apply_names(&mut self, channel: &str, names: &str) {
        for token in names.split_whitespace() {
            let nick: String = token
                .chars()
                .skip_while(|c| self.isupport.is_prefix_symbol(*c))
                .collect();
            let prefix: String = token
                .chars()
                .take_while(|c| self.isupport.is_prefix_symbol(*c))
                .collect();
            if nick.is_empty() {
                continue;
            }

            self.users
                .entry(nick.clone())
                .or_insert_with(|| User::new(nick.clone()));
            if let Some(chan) = self.channels.get_mut(channel) {
                chan.members.insert(nick, prefix);
            }
        }
    }

    /// Queue a WHO request for a target; returns the line to send when
    /// the queue was idle (the caller owns I/O). Duplicates of an
    /// already-pending target are dropped.
    pub(crate) fn enqueue_who(&mut self, target: &str) -> Option<String> {
        if self.pending_who.iter().any(|t| t == target) {
            return None;
        }
        self.pending_who.push_back(target.to_string());
        if self.pending_who.len() == 1 {
            Some(format!("WHO {target}"))
        } else {
            None
        }
    }

    /// End-of-WHO: the oldest request is done; returns the next WHO
    /// line to send, if one is waiting.
    pub(crate) fn finish_who(&mut self) -> Option<String> {
        self.pending_who.pop_front();
        self.pending_who
            .front()
            .map(|target| format!("WHO {target}"))
    }
}
