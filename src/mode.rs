//! Mode-change interpretation.
//!
//! A MODE line carries a mode string (`+o-v`) and a flat parameter
//! list; which flag consumes which parameter depends entirely on the
//! negotiated capability table. Ops come out in left-to-right order —
//! getting the consumption rule wrong desynchronizes parameter
//! alignment for every subsequent flag on the same line.

use std::fmt;

use crate::isupport::Isupport;
use crate::user::User;

/// The target a mode flag applied to, when it consumed a parameter.
#[derive(Clone, Debug, PartialEq)]
pub enum ModeTarget {
    /// A structured peer reference, parsed from a `nick!ident@host`
    /// mask (prefix and list-type flags in mask form).
    User(User),
    /// An opaque value: a bare nick, a channel key, a limit, etc.
    Arg(String),
}

impl ModeTarget {
    /// The nick for member-map lookups, or the raw value. For the full
    /// mask of a `User` target, render via `Display`.
    pub fn as_str(&self) -> &str {
        match self {
            ModeTarget::User(user) => &user.nick,
            ModeTarget::Arg(arg) => arg,
        }
    }
}

/// Renders the wire form: the whole `nick!ident@host` mask for a
/// `User` target, the raw value otherwise.
impl fmt::Display for ModeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModeTarget::User(user) => user.fmt(f),
            ModeTarget::Arg(arg) => f.write_str(arg),
        }
    }
}

/// One decoded flag change.
#[derive(Clone, Debug, PartialEq)]
pub struct ModeOp {
    pub adding: bool,
    pub flag: char,
    pub target: Option<ModeTarget>,
}

/// Walk a mode string against the capability table, consuming
/// parameters per flag category.
///
/// A flag consumes one parameter when it is a status-prefix mode, a
/// list-type (A) mode, an always-param (B) mode, or a set-only-param
/// (C) mode while adding. A flag whose category says it needs a
/// parameter but none remains is dropped (the server truncated the
/// line); dropping keeps later flags from stealing the wrong parameter.
pub fn interpret(table: &Isupport, modes: &str, params: &[&str]) -> Vec<ModeOp> {
    let mut ops = Vec::new();
    let mut params = params.iter();
    let mut adding = true;

    for flag in modes.chars() {
        match flag {
            '+' => adding = true,
            '-' => adding = false,
            _ => {
                let is_prefix = table.is_prefix_mode(flag);
                let is_list = table.modes_list.contains(flag);
                let consumes = is_prefix
                    || is_list
                    || table.modes_always_param.contains(flag)
                    || (table.modes_set_param.contains(flag) && adding);

                let target = if consumes {
                    let param = match params.next() {
                        Some(p) => *p,
                        None => continue,
                    };
                    if is_prefix || is_list {
                        match User::from_mask(param) {
                            Some(user) => Some(ModeTarget::User(user)),
                            None => Some(ModeTarget::Arg(param.to_string())),
                        }
                    } else {
                        Some(ModeTarget::Arg(param.to_string()))
                    }
                } else {
                    None
                };

                ops.push(ModeOp {
                    adding,
                    flag,
                    target,
                });
            }
        }
    }

    ops
}
