//! Peer identity.

use std::fmt;

/// A user observed on IRC.
///
/// The identity key is the nick; a NICK event renames the same user in
/// place rather than constructing a new one. The ident/host/realname
/// fields stay unknown until a mask or a WHO reply fills them in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub nick: String,
    pub ident: Option<String>,
    pub host: Option<String>,
    pub realname: Option<String>,
}

impl User {
    /// A user known only by nick.
    pub fn new(nick: impl Into<String>) -> User {
        User {
            nick: nick.into(),
            ident: None,
            host: None,
            realname: None,
        }
    }

    /// Parse a `nick!ident@host` mask. Returns `None` when the string
    /// is not in mask form.
    pub fn from_mask(mask: &str) -> Option<User> {
        let (nick, rest) = mask.split_once('!')?;
        let (ident, host) = rest.split_once('@')?;
        Some(User {
            nick: nick.to_string(),
            ident: Some(ident.to_string()),
            host: Some(host.to_string()),
            realname: None,
        })
    }

    /// Whether a prefix string is in `nick!ident@host` form.
    pub fn is_mask(s: &str) -> bool {
        match s.find('!') {
            Some(i) => s[i + 1..].contains('@'),
            None => false,
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}!{}@{}",
            self.nick,
            self.ident.as_deref().unwrap_or("*"),
            self.host.as_deref().unwrap_or("*")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_mask() {
        let user = User::from_mask("alice!ali@example.net").unwrap();
        assert_eq!(user.nick, "alice");
        assert_eq!(user.ident.as_deref(), Some("ali"));
        assert_eq!(user.host.as_deref(), Some("example.net"));
        assert!(user.realname.is_none());
    }

    #[test]
    fn test_from_mask_rejects_bare_nick() {
        assert!(User::from_mask("alice").is_none());
        assert!(User::from_mask("irc.example.net").is_none());
    }

    #[test]
    fn test_is_mask() {
        assert!(User::is_mask("alice!ali@example.net"));
        assert!(User::is_mask("*!*@*"));
        assert!(!User::is_mask("alice"));
        assert!(!User::is_mask("irc.example.net"));
        // '@' before '!' is not a mask
        assert!(!User::is_mask("a@b!c"));
    }

    #[test]
    fn test_display() {
        let user = User::from_mask("alice!ali@example.net").unwrap();
        assert_eq!(user.to_string(), "alice!ali@example.net");
        assert_eq!(User::new("bob").to_string(), "bob!*@*");
    }
}
