//! # slirc-client
//!
//! An asynchronous IRC client protocol engine built on Tokio.
//!
//! ## Features
//!
//! - CRLF line framing with UTF-8 decoding and Latin-1 fallback
//! - Flood-safe paced sending with an urgent lane for protocol traffic
//! - Typed commands and numerics with an explicit raw fallback
//! - ISUPPORT-driven mode interpretation and CTCP auto-replies
//! - Session tracking: channels, members, topics, shared users
//! - TLS via rustls with the webpki root store
//!
//! The crate splits the client side of IRC into three layers:
//!
//! - **transport** — CRLF line framing over TCP or TLS, with a paced
//!   outbound queue to stay below server flood limits and an urgent
//!   lane for traffic that must not wait (see [`Sender`]);
//! - **protocol** — the line grammar ([`Message`]), typed commands and
//!   numerics ([`Command`], [`Response`]), CTCP sub-framing, the
//!   ISUPPORT capability table and the mode interpreter driven by it;
//! - **session** — the [`Session`] state the server has narrated
//!   (channels, members, topics, users) plus the [`Dispatcher`] that
//!   keeps it in sync and feeds an application's [`EventHandler`].
//!
//! [`Client`] ties the layers together: dial, register, then run a
//! sender and a receiver task until the session ends.
//!
//! # Example
//!
//! An echo bot:
//!
//! ```no_run
//! use slirc_client::{Client, Config, Context, EventHandler, User};
//!
//! struct Echo;
//!
//! impl EventHandler for Echo {
//!     fn on_connect(&mut self, ctx: &mut Context<'_>) -> anyhow::Result<()> {
//!         ctx.sender.join("#slirc", None);
//!         Ok(())
//!     }
//!
//!     fn on_channel_message(
//!         &mut self,
//!         ctx: &mut Context<'_>,
//!         sender: &User,
//!         channel: &str,
//!         text: &str,
//!     ) -> anyhow::Result<()> {
//!         ctx.sender.privmsg(channel, &format!("{} said: {}", sender.nick, text));
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut client = Client::new(Config::new("irc.libera.chat", "slircbot"));
//!     client.connect(Echo).await?;
//!     client.wait().await;
//!     Ok(())
//! }
//! ```

#![deny(clippy::all)]

pub mod chan;
pub mod client;
pub mod command;
pub mod ctcp;
pub mod error;
pub mod events;
pub mod handler;
pub mod isupport;
pub mod message;
pub mod mode;
pub mod response;
pub mod state;
pub mod transport;
pub mod user;

pub use chan::{Channel, Topic};
pub use client::{Client, Config};
pub use command::Command;
pub use ctcp::{Ctcp, CtcpReplies};
pub use error::{ConnectError, MessageParseError, ProtocolError, Result};
pub use events::{Dispatcher, Flow};
pub use handler::{Context, EventHandler, NullHandler};
pub use isupport::Isupport;
pub use message::Message;
pub use mode::{ModeOp, ModeTarget};
pub use response::Response;
pub use state::Session;
pub use transport::Sender;
pub use user::User;
