//! Event dispatch: one wire line in, state mutations and hooks out.
//!
//! The [`Dispatcher`] is the single consumer of parsed messages. For
//! each line it updates the [`Session`] first, then delivers the event
//! to the application's [`EventHandler`] so hooks always observe
//! post-event state. CTCP requests that have an automatic answer
//! (VERSION, PING, TIME, ...) are replied to here without involving
//! the handler.
//!
//! Hook errors are reported and swallowed; only [`Flow::Disconnect`]
//! (server ERROR, or a KILL aimed at us) ends the session.

use chrono::{DateTime, Utc};
use tracing::{debug, error, warn};

use crate::chan::Channel;
use crate::command::Command;
use crate::ctcp::{Ctcp, CtcpReplies};
use crate::error::MessageParseError;
use crate::handler::{Context, EventHandler};
use crate::message::Message;
use crate::mode;
use crate::response::Response;
use crate::state::Session;
use crate::transport::Sender;
use crate::user::User;

/// What the receive loop should do after a line was dispatched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Disconnect,
}

/// Translates parsed lines into session updates and handler calls.
pub struct Dispatcher {
    replies: CtcpReplies,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Dispatcher::new(CtcpReplies::default())
    }
}

impl Dispatcher {
    pub fn new(replies: CtcpReplies) -> Dispatcher {
        Dispatcher { replies }
    }

    /// Dispatch one wire line. Parse failures surface to the caller;
    /// everything downstream of a successful parse is handled here.
    pub fn dispatch(
        &self,
        line: &str,
        session: &mut Session,
        sender: &Sender,
        handler: &mut dyn EventHandler,
    ) -> Result<Flow, MessageParseError> {
        let msg = Message::parse(line)?;
        let origin = msg
            .prefix
            .as_deref()
            .map(|prefix| resolve_origin(session, prefix));

        match msg.command {
            Command::PING(token) => {
                sender.raw_line(format!("PONG :{token}"));
            }
            Command::PONG(token) => {
                debug!("PONG {}", token);
            }
            Command::ERROR(reason) => {
                warn!("server error: {}", reason);
                return Ok(Flow::Disconnect);
            }

            Command::JOIN(channel) => {
                let Some(user) = origin else {
                    return Ok(Flow::Continue);
                };
                if session.is_self(&user.nick) {
                    session
                        .channels
                        .insert(channel.clone(), Channel::new(channel.clone()));
                    // Learn the channel's modes and members right away.
                    sender.raw_line(format!("MODE {channel}"));
                    if let Some(line) = session.enqueue_who(&channel) {
                        sender.raw_line(line);
                    }
                }
                session.add_member(&channel, &user);
                report(
                    "on_join",
                    handler.on_join(&mut Context { session: &mut *session, sender }, &user, &channel),
                );
            }
            Command::PART(channel, reason) => {
                let Some(user) = origin else {
                    return Ok(Flow::Continue);
                };
                session.remove_member(&channel, &user.nick);
                report(
                    "on_part",
                    handler.on_part(
                        &mut Context { session: &mut *session, sender },
                        &user,
                        &channel,
                        reason.as_deref(),
                    ),
                );
            }
            Command::KICK(channel, kicked, reason) => {
                let Some(kicker) = origin else {
                    return Ok(Flow::Continue);
                };
                session.remove_member(&channel, &kicked);
                report(
                    "on_kick",
                    handler.on_kick(
                        &mut Context { session: &mut *session, sender },
                        &kicker,
                        &channel,
                        &kicked,
                        reason.as_deref(),
                    ),
                );
            }
            Command::NICK(new_nick) => {
                let Some(user) = origin else {
                    return Ok(Flow::Continue);
                };
                session.rename_user(&user.nick, &new_nick);
                report(
                    "on_nick_change",
                    handler.on_nick_change(
                        &mut Context { session: &mut *session, sender },
                        &user.nick,
                        &new_nick,
                    ),
                );
            }
            Command::QUIT(reason) => {
                let Some(user) = origin else {
                    return Ok(Flow::Continue);
                };
                session.remove_quit(&user.nick);
                report(
                    "on_quit",
                    handler.on_quit(&mut Context { session: &mut *session, sender }, &user, reason.as_deref()),
                );
            }
            Command::TOPIC(channel, new_topic) => {
                let Some(user) = origin else {
                    return Ok(Flow::Continue);
                };
                if let Some(chan) = session.channels.get_mut(&channel) {
                    match new_topic.as_deref() {
                        Some(text) if !text.is_empty() => {
                            chan.topic.text = Some(text.to_string());
                            chan.topic.set_by = Some(user.clone());
                            chan.topic.set_at = Some(Utc::now());
                        }
                        _ => chan.topic.reset(),
                    }
                }
                report(
                    "on_topic_change",
                    handler.on_topic_change(&mut Context { session: &mut *session, sender }, &channel),
                );
            }
            Command::INVITE(_nick, channel) => {
                let Some(inviter) = origin else {
                    return Ok(Flow::Continue);
                };
                report(
                    "on_invite",
                    handler.on_invite(&mut Context { session: &mut *session, sender }, &inviter, &channel),
                );
            }
            Command::KILL(nick, reason) => {
                report(
                    "on_kill",
                    handler.on_kill(&mut Context { session: &mut *session, sender }, &nick, &reason),
                );
                if session.is_self(&nick) {
                    return Ok(Flow::Disconnect);
                }
            }
            Command::MODE(target, modes, params) => {
                let Some(user) = origin else {
                    return Ok(Flow::Continue);
                };
                if !is_channel(session, &target) {
                    // Own-user mode changes carry nothing we track.
                    debug!("ignoring user mode change on {}", target);
                    return Ok(Flow::Continue);
                }
                let params: Vec<&str> = params.iter().map(String::as_str).collect();
                for op in mode::interpret(&session.isupport, &modes, &params) {
                    session.apply_mode_op(&target, &op);
                    // Wire form: hooks see the whole mask of a ban or
                    // exception, not just its nick field.
                    let arg = op.target.as_ref().map(|t| t.to_string());
                    let arg = arg.as_deref();
                    let result = if op.adding {
                        handler.on_mode_set(
                            &mut Context { session: &mut *session, sender },
                            &user,
                            &target,
                            op.flag,
                            arg,
                        )
                    } else {
                        handler.on_mode_unset(
                            &mut Context { session: &mut *session, sender },
                            &user,
                            &target,
                            op.flag,
                            arg,
                        )
                    };
                    report("mode hook", result);
                }
            }
            Command::PRIVMSG(target, text) => {
                let Some(user) = origin else {
                    return Ok(Flow::Continue);
                };
                match Ctcp::parse(&text) {
                    Some(ctcp) => self.answer_ctcp(&user, &target, ctcp, session, sender, handler),
                    // Anything not addressed to us personally is channel
                    // traffic, including STATUSMSG targets like `@#chan`.
                    None if session.is_self(&target) => report(
                        "on_private_message",
                        handler.on_private_message(&mut Context { session: &mut *session, sender }, &user, &text),
                    ),
                    None => report(
                        "on_channel_message",
                        handler.on_channel_message(
                            &mut Context { session: &mut *session, sender },
                            &user,
                            &target,
                            &text,
                        ),
                    ),
                }
            }
            Command::NOTICE(target, text) => {
                let Some(user) = origin else {
                    return Ok(Flow::Continue);
                };
                match Ctcp::parse(&text) {
                    Some(ctcp) if ctcp.command == "PING" => {
                        if let Ok(sent) = ctcp.arg.parse::<i64>() {
                            let secs = (Utc::now().timestamp() - sent).max(0) as u64;
                            report(
                                "on_ctcp_ping_reply",
                                handler.on_ctcp_ping_reply(
                                    &mut Context { session: &mut *session, sender },
                                    &user,
                                    std::time::Duration::from_secs(secs),
                                ),
                            );
                        } else {
                            debug!("unparsable CTCP PING reply from {}", user.nick);
                        }
                    }
                    Some(ctcp) => {
                        debug!("CTCP {} reply from {}: {}", ctcp.command, user.nick, ctcp.arg);
                    }
                    None => report(
                        "on_notice",
                        handler.on_notice(
                            &mut Context { session: &mut *session, sender },
                            &user,
                            &target,
                            &text,
                        ),
                    ),
                }
            }

            Command::Response(resp, args) => {
                self.dispatch_numeric(resp, &args, session, sender);
            }
            Command::Raw(cmd, params) => {
                if Response::is_numeric(&cmd) {
                    report(
                        "on_unknown_numeric",
                        handler.on_unknown_numeric(&mut Context { session: &mut *session, sender }, &cmd, &params),
                    );
                } else {
                    report(
                        "on_unknown_command",
                        handler.on_unknown_command(
                            &mut Context { session: &mut *session, sender },
                            msg.prefix.as_deref(),
                            &cmd,
                            &params,
                        ),
                    );
                }
            }
        }

        Ok(Flow::Continue)
    }

    /// Handle a known numeric. The first parameter is always the echo
    /// of our own nick and is skipped by the slice patterns below.
    fn dispatch_numeric(
        &self,
        resp: Response,
        args: &[String],
        session: &mut Session,
        sender: &Sender,
    ) {
        match (resp, args) {
            (Response::RPL_WELCOME, [nick, ..]) => {
                // The server has the final word on our nick.
                session.nick = nick.clone();
            }
            (Response::RPL_ISUPPORT, [_, rest @ ..]) if !rest.is_empty() => {
                // Drop the trailing "are supported by this server".
                session.isupport.apply_tokens(&rest[..rest.len() - 1]);
                if let Some(network) = &session.isupport.network {
                    session.network = Some(network.clone());
                }
            }
            (Response::RPL_ENDOFWHO, _) => {
                if let Some(line) = session.finish_who() {
                    sender.raw_line(line);
                }
            }
            (Response::RPL_CHANNELMODEIS, [_, channel, modes, ..]) => {
                if let Some(chan) = session.channels.get_mut(channel.as_str()) {
                    for flag in modes.chars().filter(|c| *c != '+' && *c != '-') {
                        chan.modes.insert(flag);
                    }
                }
            }
            (Response::RPL_CREATIONTIME, [_, channel, timestamp, ..]) => {
                if let Some(chan) = session.channels.get_mut(channel.as_str()) {
                    if let Ok(secs) = timestamp.parse::<i64>() {
                        chan.created_at = DateTime::from_timestamp(secs, 0);
                    }
                }
            }
            (Response::RPL_NOTOPIC, [_, channel, ..]) => {
                if let Some(chan) = session.channels.get_mut(channel.as_str()) {
                    chan.topic.reset();
                }
            }
            (Response::RPL_TOPIC, [_, channel, text, ..]) => {
                if let Some(chan) = session.channels.get_mut(channel.as_str()) {
                    chan.topic.text = Some(text.clone());
                }
            }
            (Response::RPL_TOPICWHOTIME, [_, channel, setter, timestamp, ..]) => {
                if let Some(chan) = session.channels.get_mut(channel.as_str()) {
                    chan.topic.set_by =
                        Some(User::from_mask(setter).unwrap_or_else(|| User::new(setter.clone())));
                    if let Ok(secs) = timestamp.parse::<i64>() {
                        chan.topic.set_at = DateTime::from_timestamp(secs, 0);
                    }
                }
            }
            (
                Response::RPL_WHOREPLY,
                [_, _channel, ident, host, _server, nick, _flags, tail, ..],
            ) => {
                if let Some(user) = session.users.get_mut(nick.as_str()) {
                    user.ident = Some(ident.clone());
                    user.host = Some(host.clone());
                    // Trailing parameter is "<hopcount> <realname>".
                    user.realname = tail.split_once(' ').map(|(_, name)| name.to_string());
                }
            }
            (Response::RPL_NAMREPLY, [_, _symbol, channel, names, ..]) => {
                session.apply_names(channel, names);
            }
            (Response::RPL_ENDOFNAMES, _) => {}
            (Response::ERR_NICKNAMEINUSE, _) => {
                // After registration a failed NICK just leaves the old
                // nick in place.
                warn!("requested nick is already in use");
            }
            (resp, args) => debug!("short numeric {:?}: {:?}", resp, args),
        }
    }

    fn answer_ctcp(
        &self,
        from: &User,
        target: &str,
        ctcp: Ctcp<'_>,
        session: &mut Session,
        sender: &Sender,
        handler: &mut dyn EventHandler,
    ) {
        match ctcp.command {
            "ACTION" => report(
                "on_action",
                handler.on_action(&mut Context { session: &mut *session, sender }, from, target, ctcp.arg),
            ),
            "CLIENTINFO" => {
                sender.ctcp_reply(&from.nick, "CLIENTINFO", Some(&self.replies.clientinfo))
            }
            "FINGER" => sender.ctcp_reply(&from.nick, "FINGER", Some(&self.replies.finger)),
            "PING" => sender.ctcp_reply(&from.nick, "PING", Some(ctcp.arg)),
            "SOURCE" => sender.ctcp_reply(&from.nick, "SOURCE", Some(&self.replies.source)),
            "TIME" => sender.ctcp_reply(&from.nick, "TIME", Some(&Utc::now().to_rfc2822())),
            "USERINFO" if !self.replies.userinfo.is_empty() => {
                sender.ctcp_reply(&from.nick, "USERINFO", Some(&self.replies.userinfo))
            }
            "VERSION" => sender.ctcp_reply(&from.nick, "VERSION", Some(&self.replies.version)),
            other => debug!("unanswered CTCP {} from {}", other, from.nick),
        }
    }
}

/// Resolve a message prefix to a user, preferring what the session
/// already knows over what the mask alone carries.
fn resolve_origin(session: &Session, prefix: &str) -> User {
    match User::from_mask(prefix) {
        Some(mut user) => {
            if let Some(known) = session.users.get(&user.nick) {
                user.realname = known.realname.clone();
            }
            user
        }
        None => session
            .users
            .get(prefix)
            .cloned()
            .unwrap_or_else(|| User::new(prefix)),
    }
}

fn is_channel(session: &Session, target: &str) -> bool {
    target
        .chars()
        .next()
        .map(|c| session.isupport.chantypes.contains(c))
        .unwrap_or(false)
}

fn report(hook: &str, result: anyhow::Result<()>) {
    if let Err(e) = result {
        error!("{} failed: {:#}", hook, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{Control, SenderQueues};

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl EventHandler for Recorder {
        fn on_channel_message(
            &mut self,
            _ctx: &mut Context<'_>,
            sender: &User,
            channel: &str,
            text: &str,
        ) -> anyhow::Result<()> {
            self.events.push(format!("chanmsg {} {} {}", channel, sender.nick, text));
            Ok(())
        }

        fn on_private_message(
            &mut self,
            _ctx: &mut Context<'_>,
            sender: &User,
            text: &str,
        ) -> anyhow::Result<()> {
            self.events.push(format!("privmsg {} {}", sender.nick, text));
            Ok(())
        }

        fn on_action(
            &mut self,
            _ctx: &mut Context<'_>,
            sender: &User,
            target: &str,
            action: &str,
        ) -> anyhow::Result<()> {
            self.events.push(format!("action {} {} {}", target, sender.nick, action));
            Ok(())
        }

        fn on_join(
            &mut self,
            _ctx: &mut Context<'_>,
            user: &User,
            channel: &str,
        ) -> anyhow::Result<()> {
            self.events.push(format!("join {} {}", channel, user.nick));
            Ok(())
        }

        fn on_kick(
            &mut self,
            _ctx: &mut Context<'_>,
            kicker: &User,
            channel: &str,
            kicked_nick: &str,
            _reason: Option<&str>,
        ) -> anyhow::Result<()> {
            self.events
                .push(format!("kick {} {} {}", channel, kicker.nick, kicked_nick));
            Ok(())
        }

        fn on_mode_set(
            &mut self,
            _ctx: &mut Context<'_>,
            _by: &User,
            channel: &str,
            flag: char,
            arg: Option<&str>,
        ) -> anyhow::Result<()> {
            self.events
                .push(format!("+{} {} {}", flag, channel, arg.unwrap_or("-")));
            Ok(())
        }

        fn on_ctcp_ping_reply(
            &mut self,
            _ctx: &mut Context<'_>,
            sender: &User,
            latency: std::time::Duration,
        ) -> anyhow::Result<()> {
            self.events
                .push(format!("pong {} {}", sender.nick, latency.as_secs()));
            Ok(())
        }

        fn on_unknown_numeric(
            &mut self,
            _ctx: &mut Context<'_>,
            numeric: &str,
            _params: &[String],
        ) -> anyhow::Result<()> {
            self.events.push(format!("numeric {}", numeric));
            Ok(())
        }
    }

    fn setup() -> (Dispatcher, Session, Sender, SenderQueues, Recorder) {
        let (sender, queues) = Sender::new();
        (
            Dispatcher::default(),
            Session::new("me"),
            sender,
            queues,
            Recorder::default(),
        )
    }

    fn urgent_lines(queues: &mut SenderQueues) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(ctl) = queues.urgent.try_recv() {
            if let Control::Raw(line) = ctl {
                lines.push(line);
            }
        }
        lines
    }

    fn paced_lines(queues: &mut SenderQueues) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(line) = queues.paced.try_recv() {
            lines.push(line);
        }
        lines
    }

    #[test]
    fn test_ping_answered_without_delay() {
        let (d, mut s, tx, mut q, mut h) = setup();
        let flow = d.dispatch("PING :irc.example.net", &mut s, &tx, &mut h).unwrap();
        assert_eq!(flow, Flow::Continue);
        assert_eq!(urgent_lines(&mut q), vec!["PONG :irc.example.net"]);
    }

    #[test]
    fn test_self_join_queries_mode_and_who() {
        let (d, mut s, tx, mut q, mut h) = setup();
        d.dispatch(":me!u@host JOIN #a", &mut s, &tx, &mut h).unwrap();

        assert!(s.channels.contains_key("#a"));
        assert!(s.channels["#a"].members.contains_key("me"));
        assert_eq!(urgent_lines(&mut q), vec!["MODE #a", "WHO #a"]);
        assert_eq!(h.events, vec!["join #a me"]);
    }

    #[test]
    fn test_peer_join_tracked() {
        let (d, mut s, tx, mut q, mut h) = setup();
        d.dispatch(":me!u@host JOIN #a", &mut s, &tx, &mut h).unwrap();
        urgent_lines(&mut q);

        d.dispatch(":alice!ali@example.net JOIN #a", &mut s, &tx, &mut h)
            .unwrap();
        assert!(s.channels["#a"].members.contains_key("alice"));
        assert_eq!(s.users["alice"].ident.as_deref(), Some("ali"));
        // No MODE/WHO for someone else's join.
        assert!(urgent_lines(&mut q).is_empty());
    }

    #[test]
    fn test_privmsg_routing() {
        let (d, mut s, tx, _q, mut h) = setup();
        d.dispatch(":alice!a@h PRIVMSG #chan :hello all", &mut s, &tx, &mut h)
            .unwrap();
        d.dispatch(":alice!a@h PRIVMSG me :hi you", &mut s, &tx, &mut h)
            .unwrap();
        assert_eq!(
            h.events,
            vec!["chanmsg #chan alice hello all", "privmsg alice hi you"]
        );
    }

    #[test]
    fn test_ctcp_version_auto_reply() {
        let (d, mut s, tx, mut q, mut h) = setup();
        d.dispatch(":alice!a@h PRIVMSG me :\u{1}VERSION\u{1}", &mut s, &tx, &mut h)
            .unwrap();

        let lines = paced_lines(&mut q);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("NOTICE alice :\u{1}VERSION slirc-client v"));
        assert!(h.events.is_empty());
    }

    #[test]
    fn test_ctcp_ping_echoes_token() {
        let (d, mut s, tx, mut q, mut h) = setup();
        d.dispatch(":alice!a@h PRIVMSG me :\u{1}PING 12345\u{1}", &mut s, &tx, &mut h)
            .unwrap();
        assert_eq!(
            paced_lines(&mut q),
            vec!["NOTICE alice :\u{1}PING 12345\u{1}"]
        );
    }

    #[test]
    fn test_ctcp_userinfo_silent_when_unset() {
        let (d, mut s, tx, mut q, mut h) = setup();
        d.dispatch(":alice!a@h PRIVMSG me :\u{1}USERINFO\u{1}", &mut s, &tx, &mut h)
            .unwrap();
        assert!(paced_lines(&mut q).is_empty());
    }

    #[test]
    fn test_action_hook() {
        let (d, mut s, tx, _q, mut h) = setup();
        d.dispatch(
            ":alice!a@h PRIVMSG #a :\u{1}ACTION waves slowly\u{1}",
            &mut s,
            &tx,
            &mut h,
        )
        .unwrap();
        assert_eq!(h.events, vec!["action #a alice waves slowly"]);
    }

    #[test]
    fn test_ctcp_ping_reply_measures_latency() {
        let (d, mut s, tx, _q, mut h) = setup();
        let sent = Utc::now().timestamp();
        let line = format!(":alice!a@h NOTICE me :\u{1}PING {sent}\u{1}");
        d.dispatch(&line, &mut s, &tx, &mut h).unwrap();
        assert_eq!(h.events, vec!["pong alice 0"]);
    }

    #[test]
    fn test_isupport_numeric_merges() {
        let (d, mut s, tx, _q, mut h) = setup();
        d.dispatch(
            ":srv 005 me PREFIX=(qov)~@+ NETWORK=TestNet CHANTYPES=#& :are supported by this server",
            &mut s,
            &tx,
            &mut h,
        )
        .unwrap();

        assert_eq!(s.network.as_deref(), Some("TestNet"));
        assert!(s.isupport.is_prefix_symbol('~'));
        // Trailing free text was not mistaken for a token.
        assert_eq!(s.isupport.chantypes, "#&");
    }

    #[test]
    fn test_names_and_who_fill_users() {
        let (d, mut s, tx, mut q, mut h) = setup();
        d.dispatch(":me!u@h JOIN #a", &mut s, &tx, &mut h).unwrap();
        urgent_lines(&mut q);

        d.dispatch(":srv 353 me = #a :@alice +bob me", &mut s, &tx, &mut h)
            .unwrap();
        assert_eq!(s.channels["#a"].members["alice"], "@");

        d.dispatch(
            ":srv 352 me #a ali example.net srv alice H :0 Alice Liddell",
            &mut s,
            &tx,
            &mut h,
        )
        .unwrap();
        let alice = &s.users["alice"];
        assert_eq!(alice.ident.as_deref(), Some("ali"));
        assert_eq!(alice.host.as_deref(), Some("example.net"));
        assert_eq!(alice.realname.as_deref(), Some("Alice Liddell"));
    }

    #[test]
    fn test_who_queue_advances_on_end() {
        let (d, mut s, tx, mut q, mut h) = setup();
        assert!(s.enqueue_who("#a").is_some());
        assert!(s.enqueue_who("#b").is_none());

        d.dispatch(":srv 315 me #a :End of /WHO list", &mut s, &tx, &mut h)
            .unwrap();
        assert_eq!(urgent_lines(&mut q), vec!["WHO #b"]);
    }

    #[test]
    fn test_mode_change_updates_and_hooks() {
        let (d, mut s, tx, mut q, mut h) = setup();
        d.dispatch(":me!u@h JOIN #a", &mut s, &tx, &mut h).unwrap();
        d.dispatch(":alice!a@h JOIN #a", &mut s, &tx, &mut h).unwrap();
        urgent_lines(&mut q);
        h.events.clear();

        d.dispatch(":op!o@h MODE #a +ot alice", &mut s, &tx, &mut h)
            .unwrap();
        assert_eq!(s.channels["#a"].members["alice"], "@");
        assert!(s.channels["#a"].modes.contains(&'t'));
        assert_eq!(h.events, vec!["+o #a alice", "+t #a -"]);
    }

    #[test]
    fn test_ban_hook_receives_whole_mask() {
        let (d, mut s, tx, _q, mut h) = setup();
        d.dispatch(":me!u@h JOIN #a", &mut s, &tx, &mut h).unwrap();
        h.events.clear();

        d.dispatch(":op!o@h MODE #a +b *!spam@*", &mut s, &tx, &mut h)
            .unwrap();
        assert_eq!(h.events, vec!["+b #a *!spam@*"]);
        // Per-target fact, not channel state.
        assert!(!s.channels["#a"].modes.contains(&'b'));
    }

    #[test]
    fn test_own_user_mode_ignored() {
        let (d, mut s, tx, _q, mut h) = setup();
        let flow = d.dispatch(":me!u@h MODE me +i", &mut s, &tx, &mut h).unwrap();
        assert_eq!(flow, Flow::Continue);
        assert!(h.events.is_empty());
    }

    #[test]
    fn test_kick_self_discards_channel() {
        let (d, mut s, tx, _q, mut h) = setup();
        d.dispatch(":me!u@h JOIN #a", &mut s, &tx, &mut h).unwrap();
        h.events.clear();

        d.dispatch(":op!o@h KICK #a me :begone", &mut s, &tx, &mut h)
            .unwrap();
        assert!(!s.channels.contains_key("#a"));
        assert_eq!(h.events, vec!["kick #a op me"]);
    }

    #[test]
    fn test_kill_of_self_disconnects() {
        let (d, mut s, tx, _q, mut h) = setup();
        let flow = d
            .dispatch(":oper!o@h KILL me :spam", &mut s, &tx, &mut h)
            .unwrap();
        assert_eq!(flow, Flow::Disconnect);

        let flow = d
            .dispatch(":oper!o@h KILL other :spam", &mut s, &tx, &mut h)
            .unwrap();
        assert_eq!(flow, Flow::Continue);
    }

    #[test]
    fn test_server_error_disconnects() {
        let (d, mut s, tx, _q, mut h) = setup();
        let flow = d
            .dispatch("ERROR :Closing Link: flood", &mut s, &tx, &mut h)
            .unwrap();
        assert_eq!(flow, Flow::Disconnect);
    }

    #[test]
    fn test_unknown_numeric_hook() {
        let (d, mut s, tx, _q, mut h) = setup();
        d.dispatch(":srv 372 me :- motd line", &mut s, &tx, &mut h).unwrap();
        assert_eq!(h.events, vec!["numeric 372"]);
    }

    #[test]
    fn test_topic_numerics() {
        let (d, mut s, tx, _q, mut h) = setup();
        d.dispatch(":me!u@h JOIN #a", &mut s, &tx, &mut h).unwrap();

        d.dispatch(":srv 332 me #a :welcome home", &mut s, &tx, &mut h)
            .unwrap();
        d.dispatch(":srv 333 me #a alice!a@h 1700000000", &mut s, &tx, &mut h)
            .unwrap();

        let topic = &s.channels["#a"].topic;
        assert_eq!(topic.text.as_deref(), Some("welcome home"));
        assert_eq!(topic.set_by.as_ref().map(|u| u.nick.as_str()), Some("alice"));
        assert!(topic.set_at.is_some());

        d.dispatch(":srv 331 me #a :No topic is set", &mut s, &tx, &mut h)
            .unwrap();
        assert!(s.channels["#a"].topic.text.is_none());
    }

    #[test]
    fn test_parse_failure_surfaces() {
        let (d, mut s, tx, _q, mut h) = setup();
        assert!(d.dispatch("", &mut s, &tx, &mut h).is_err());
    }
}
