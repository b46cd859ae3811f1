//! Application-facing event hooks.
//!
//! The dispatcher translates wire traffic into calls on an
//! [`EventHandler`]. Every hook has a no-op default, so an application
//! implements only the events it cares about. A hook returning an
//! error is reported and swallowed; application faults never tear the
//! connection down.

use std::time::Duration;

use crate::state::Session;
use crate::transport::Sender;
use crate::user::User;

/// What a hook can see and do: the session state (already updated for
/// the event being delivered) and the outbound sender.
pub struct Context<'a> {
    pub session: &'a mut Session,
    pub sender: &'a Sender,
}

impl Context<'_> {
    /// Request a WHO listing for a channel or nick. Requests are
    /// serialized: at most one is in flight, the rest queue behind it.
    pub fn request_who(&mut self, target: &str) {
        if let Some(line) = self.session.enqueue_who(target) {
            self.sender.raw_line(line);
        }
    }
}

/// Hooks invoked by the event dispatcher, in wire order.
#[allow(unused_variables)]
pub trait EventHandler: Send {
    /// Registration completed; the session is live.
    fn on_connect(&mut self, ctx: &mut Context<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// The connection ended, cleanly or not. Always the last call.
    fn on_disconnect(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// PRIVMSG to a channel we are in.
    fn on_channel_message(
        &mut self,
        ctx: &mut Context<'_>,
        sender: &User,
        channel: &str,
        text: &str,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// PRIVMSG addressed to us directly.
    fn on_private_message(
        &mut self,
        ctx: &mut Context<'_>,
        sender: &User,
        text: &str,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// CTCP ACTION (`/me`) in a channel or query.
    fn on_action(
        &mut self,
        ctx: &mut Context<'_>,
        sender: &User,
        target: &str,
        action: &str,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// NOTICE that was not a recognized CTCP reply.
    fn on_notice(
        &mut self,
        ctx: &mut Context<'_>,
        sender: &User,
        target: &str,
        text: &str,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// Someone (possibly us) joined a channel.
    fn on_join(&mut self, ctx: &mut Context<'_>, user: &User, channel: &str) -> anyhow::Result<()> {
        Ok(())
    }

    /// Someone (possibly us) left a channel.
    fn on_part(
        &mut self,
        ctx: &mut Context<'_>,
        user: &User,
        channel: &str,
        reason: Option<&str>,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// A nick change, already reflected in the session.
    fn on_nick_change(
        &mut self,
        ctx: &mut Context<'_>,
        old_nick: &str,
        new_nick: &str,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// A user quit the network.
    fn on_quit(
        &mut self,
        ctx: &mut Context<'_>,
        user: &User,
        reason: Option<&str>,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// Someone was kicked out of a channel.
    fn on_kick(
        &mut self,
        ctx: &mut Context<'_>,
        kicker: &User,
        channel: &str,
        kicked_nick: &str,
        reason: Option<&str>,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// A channel topic changed, was set, or was cleared.
    fn on_topic_change(&mut self, ctx: &mut Context<'_>, channel: &str) -> anyhow::Result<()> {
        Ok(())
    }

    /// We were invited to a channel.
    fn on_invite(
        &mut self,
        ctx: &mut Context<'_>,
        inviter: &User,
        channel: &str,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// An operator killed a connection. When the nick is ours the
    /// session tears down right after this hook.
    fn on_kill(&mut self, ctx: &mut Context<'_>, nick: &str, reason: &str) -> anyhow::Result<()> {
        Ok(())
    }

    /// One mode flag was set on a channel. Called once per flag of a
    /// compound mode line, in order.
    fn on_mode_set(
        &mut self,
        ctx: &mut Context<'_>,
        by: &User,
        channel: &str,
        flag: char,
        arg: Option<&str>,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// One mode flag was unset on a channel.
    fn on_mode_unset(
        &mut self,
        ctx: &mut Context<'_>,
        by: &User,
        channel: &str,
        flag: char,
        arg: Option<&str>,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// A reply to one of our CTCP PINGs, with the measured round trip.
    fn on_ctcp_ping_reply(
        &mut self,
        ctx: &mut Context<'_>,
        sender: &User,
        latency: Duration,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// A non-numeric command the dispatcher has no arm for.
    fn on_unknown_command(
        &mut self,
        ctx: &mut Context<'_>,
        prefix: Option<&str>,
        command: &str,
        params: &[String],
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// A numeric reply the dispatcher has no arm for.
    fn on_unknown_numeric(
        &mut self,
        ctx: &mut Context<'_>,
        numeric: &str,
        params: &[String],
    ) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Handler that ignores every event; useful for bots that only send.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullHandler;

impl EventHandler for NullHandler {}
