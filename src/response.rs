//! IRC numeric response codes consumed by the client.
//!
//! Only the numerics the session tracker actually interprets are
//! enumerated; everything else stays in its wire form and routes to the
//! unknown-numeric fallback.
//!
//! # Reference
//! - RFC 2812: Internet Relay Chat: Client Protocol
//! - Modern IRC documentation: <https://modern.ircdocs.horse/>

#![allow(non_camel_case_types)]

use std::str::FromStr;

/// IRC server response code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
#[non_exhaustive]
pub enum Response {
    /// 001 - Welcome; registration is complete.
    RPL_WELCOME = 1,
    /// 005 - Server supported features (ISUPPORT).
    RPL_ISUPPORT = 5,
    /// 315 - End of WHO list.
    RPL_ENDOFWHO = 315,
    /// 324 - Channel mode reply.
    RPL_CHANNELMODEIS = 324,
    /// 329 - Channel creation time.
    RPL_CREATIONTIME = 329,
    /// 331 - No topic is set.
    RPL_NOTOPIC = 331,
    /// 332 - Topic text.
    RPL_TOPIC = 332,
    /// 333 - Topic setter and set time.
    RPL_TOPICWHOTIME = 333,
    /// 352 - WHO reply, one line per matched user.
    RPL_WHOREPLY = 352,
    /// 353 - NAMES reply.
    RPL_NAMREPLY = 353,
    /// 366 - End of NAMES list.
    RPL_ENDOFNAMES = 366,
    /// 433 - Nickname is already in use.
    ERR_NICKNAMEINUSE = 433,
}

impl Response {
    /// The three-digit wire form of this numeric.
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Whether a command token looks like a numeric (three digits).
    pub fn is_numeric(token: &str) -> bool {
        token.len() == 3 && token.bytes().all(|b| b.is_ascii_digit())
    }
}

impl FromStr for Response {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code: u16 = s.parse().map_err(|_| ())?;
        match code {
            1 => Ok(Response::RPL_WELCOME),
            5 => Ok(Response::RPL_ISUPPORT),
            315 => Ok(Response::RPL_ENDOFWHO),
            324 => Ok(Response::RPL_CHANNELMODEIS),
            329 => Ok(Response::RPL_CREATIONTIME),
            331 => Ok(Response::RPL_NOTOPIC),
            332 => Ok(Response::RPL_TOPIC),
            333 => Ok(Response::RPL_TOPICWHOTIME),
            352 => Ok(Response::RPL_WHOREPLY),
            353 => Ok(Response::RPL_NAMREPLY),
            366 => Ok(Response::RPL_ENDOFNAMES),
            433 => Ok(Response::ERR_NICKNAMEINUSE),
            _ => Err(()),
        }
    }
}
