//! Line transport: CRLF framing and the paced sender duty.
//!
//! Two long-lived duties share a connection: the receiver (owned by
//! [`client`]) reads one line at a time and drives dispatch; the sender
//! task here drains an outbound queue at a configurable pace to stay
//! below server flood thresholds. A second, urgent lane bypasses the
//! pacing entirely — registration traffic and PONG replies cannot
//! tolerate flood delay.
//!
//! [`client`]: crate::client

use std::sync::Arc;
use std::time::Duration;

use bytes::{BufMut, BytesMut};
use chrono::Utc;
use futures_util::{Sink, SinkExt};
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, warn};

use crate::ctcp;
use crate::error::ProtocolError;

/// Longest line tolerated without a terminator before the connection
/// is considered broken.
pub const MAX_IRC_LINE_LEN: usize = 8191;

/// Codec for CRLF-terminated IRC lines.
///
/// Decoding never fails on text encoding: lines are decoded as UTF-8,
/// falling back to Latin-1 (the identity byte-to-codepoint mapping) —
/// IRC mandates no line encoding.
#[derive(Clone, Debug, Default)]
pub struct LineCodec;

impl Decoder for LineCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, ProtocolError> {
        match src.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                let mut line = src.split_to(pos + 1);
                line.truncate(pos);
                if line.last() == Some(&b'\r') {
                    line.truncate(line.len() - 1);
                }
                Ok(Some(decode_relaxed(&line)))
            }
            None if src.len() > MAX_IRC_LINE_LEN => {
                Err(ProtocolError::MessageTooLong(src.len()))
            }
            None => Ok(None),
        }
    }
}

impl Encoder<String> for LineCodec {
    type Error = ProtocolError;

    fn encode(&mut self, line: String, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        dst.reserve(line.len() + 2);
        dst.put_slice(line.as_bytes());
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

fn decode_relaxed(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// One-shot shutdown signal shared by the two transport duties.
#[derive(Clone, Debug)]
pub(crate) struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub(crate) fn new() -> Shutdown {
        let (tx, _rx) = watch::channel(false);
        Shutdown { tx: Arc::new(tx) }
    }

    /// Latches even when no receiver is currently subscribed.
    pub(crate) fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

pub(crate) enum Control {
    Raw(String),
    Stop,
}

/// Cloneable handle for sending lines to the server.
///
/// [`send`] enqueues on the paced queue; [`raw_line`] takes the urgent
/// lane. The command builders mirror which path the protocol needs:
/// chat traffic is paced, structural commands and keepalive go raw.
///
/// [`send`]: Sender::send
/// [`raw_line`]: Sender::raw_line
#[derive(Clone, Debug)]
pub struct Sender {
    paced: mpsc::UnboundedSender<String>,
    urgent: mpsc::UnboundedSender<Control>,
}

pub(crate) struct SenderQueues {
    pub(crate) paced: mpsc::UnboundedReceiver<String>,
    pub(crate) urgent: mpsc::UnboundedReceiver<Control>,
}

impl Sender {
    pub(crate) fn new() -> (Sender, SenderQueues) {
        let (paced_tx, paced_rx) = mpsc::unbounded_channel();
        let (urgent_tx, urgent_rx) = mpsc::unbounded_channel();
        (
            Sender {
                paced: paced_tx,
                urgent: urgent_tx,
            },
            SenderQueues {
                paced: paced_rx,
                urgent: urgent_rx,
            },
        )
    }

    /// Enqueue a formatted line on the paced queue.
    pub fn send(&self, line: impl Into<String>) {
        let _ = self.paced.send(line.into());
    }

    /// Write a formatted line ahead of the paced queue, without flood
    /// delay.
    pub fn raw_line(&self, line: impl Into<String>) {
        let _ = self.urgent.send(Control::Raw(line.into()));
    }

    /// Stop the sender duty. Idempotent; safe after the queue drained
    /// or the task already ended.
    pub(crate) fn stop(&self) {
        let _ = self.urgent.send(Control::Stop);
    }

    /// Send a message to a channel or a user.
    pub fn privmsg(&self, target: &str, text: &str) {
        self.send(format!("PRIVMSG {target} :{text}"));
    }

    /// Send a notice to a channel or a user.
    pub fn notice(&self, target: &str, text: &str) {
        self.send(format!("NOTICE {target} :{text}"));
    }

    /// Send a CTCP request inside a PRIVMSG.
    pub fn ctcp_query(&self, target: &str, command: &str, arg: Option<&str>) {
        self.privmsg(target, &ctcp::frame(command, arg));
    }

    /// Send a CTCP reply inside a NOTICE.
    pub fn ctcp_reply(&self, target: &str, command: &str, arg: Option<&str>) {
        self.notice(target, &ctcp::frame(command, arg));
    }

    /// Send a CTCP PING with the current Unix time as its token.
    pub fn ping(&self, target: &str) {
        let ts = Utc::now().timestamp().to_string();
        self.ctcp_query(target, "PING", Some(&ts));
    }

    /// Join a channel with an optional key.
    pub fn join(&self, channel: &str, key: Option<&str>) {
        match key {
            Some(key) => self.raw_line(format!("JOIN {channel} {key}")),
            None => self.raw_line(format!("JOIN {channel}")),
        }
    }

    /// Part from a channel with an optional reason.
    pub fn part(&self, channel: &str, reason: Option<&str>) {
        match reason {
            Some(reason) => self.raw_line(format!("PART {channel} :{reason}")),
            None => self.raw_line(format!("PART {channel}")),
        }
    }

    /// Kick a user out of a channel with an optional reason.
    pub fn kick(&self, channel: &str, nick: &str, reason: Option<&str>) {
        match reason {
            Some(reason) => self.raw_line(format!("KICK {channel} {nick} :{reason}")),
            None => self.raw_line(format!("KICK {channel} {nick}")),
        }
    }

    /// Invite a user to a channel.
    pub fn invite(&self, channel: &str, nick: &str) {
        self.raw_line(format!("INVITE {nick} {channel}"));
    }

    /// Change or query a channel topic.
    pub fn topic(&self, channel: &str, new_topic: Option<&str>) {
        match new_topic {
            Some(text) => self.raw_line(format!("TOPIC {channel} :{text}")),
            None => self.raw_line(format!("TOPIC {channel}")),
        }
    }

    /// Request a nick change. The server may refuse it.
    pub fn nick(&self, new_nick: &str) {
        self.raw_line(format!("NICK {new_nick}"));
    }

    /// Set channel modes with optional arguments.
    pub fn set_mode(&self, channel: &str, modes: &str, args: &[&str]) {
        self.mode_line(channel, '+', modes, args);
    }

    /// Unset channel modes with optional arguments.
    pub fn unset_mode(&self, channel: &str, modes: &str, args: &[&str]) {
        self.mode_line(channel, '-', modes, args);
    }

    fn mode_line(&self, channel: &str, sign: char, modes: &str, args: &[&str]) {
        let mut line = format!("MODE {channel} {sign}{modes}");
        if !args.is_empty() {
            line.push(' ');
            line.push_str(&args.join(" "));
        }
        self.raw_line(line);
    }

    /// Op one or more users in a channel.
    pub fn op(&self, channel: &str, nicks: &[&str]) {
        self.set_mode(channel, &"o".repeat(nicks.len()), nicks);
    }

    /// Voice one or more users in a channel.
    pub fn voice(&self, channel: &str, nicks: &[&str]) {
        self.set_mode(channel, &"v".repeat(nicks.len()), nicks);
    }

    /// Identify to NickServ.
    pub fn identify(&self, password: &str) {
        self.raw_line(format!("NICKSERV IDENTIFY {password}"));
    }

    /// Announce a quit with an optional message.
    pub fn quit(&self, message: Option<&str>) {
        self.raw_line(format!("QUIT :{}", message.unwrap_or("")));
    }
}

/// The sender duty: drain the urgent lane immediately; after each
/// paced line, sleep the configured delay while still serving urgent
/// writes. Suspends on empty queues — each enqueue wakes it exactly
/// once. A write failure tears the session down via the shared
/// shutdown signal.
pub(crate) async fn run_sender<S>(
    mut sink: S,
    mut queues: SenderQueues,
    delay: Duration,
    shutdown: Shutdown,
) where
    S: Sink<String, Error = ProtocolError> + Unpin,
{
    'outer: loop {
        tokio::select! {
            biased;
            ctl = queues.urgent.recv() => match ctl {
                Some(Control::Raw(line)) => {
                    if write_line(&mut sink, line, &shutdown).await.is_err() {
                        break 'outer;
                    }
                }
                Some(Control::Stop) | None => break 'outer,
            },
            line = queues.paced.recv() => match line {
                Some(line) => {
                    if write_line(&mut sink, line, &shutdown).await.is_err() {
                        break 'outer;
                    }
                    if delay.is_zero() {
                        continue;
                    }
                    let deadline = Instant::now() + delay;
                    loop {
                        tokio::select! {
                            _ = tokio::time::sleep_until(deadline) => break,
                            ctl = queues.urgent.recv() => match ctl {
                                Some(Control::Raw(line)) => {
                                    if write_line(&mut sink, line, &shutdown).await.is_err() {
                                        break 'outer;
                                    }
                                }
                                Some(Control::Stop) | None => break 'outer,
                            },
                        }
                    }
                }
                None => break 'outer,
            },
        }
    }
    debug!("sender duty stopped");
}

async fn write_line<S>(sink: &mut S, line: String, shutdown: &Shutdown) -> Result<(), ()>
where
    S: Sink<String, Error = ProtocolError> + Unpin,
{
    debug!(">>> {}", line);
    match sink.send(line).await {
        Ok(()) => Ok(()),
        Err(e) => {
            warn!("write failed, tearing down: {}", e);
            shutdown.trigger();
            Err(())
        }
    }
}
