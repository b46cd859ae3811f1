//! RPL_ISUPPORT (numeric 005) capability table.
//!
//! The server advertises its protocol dialect as a series of `KEY` or
//! `KEY=VALUE` tokens, usually across several 005 lines. The table
//! accumulates: each line merges into what earlier lines established,
//! never resetting a previously learned field. Unrecognized keys are
//! ignored — servers routinely add vendor extensions.
//!
//! Referenced document: <http://www.irc.org/tech_docs/005.html>

/// Decoded capability table, consumed by the mode interpreter and by
/// membership-prefix rendering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Isupport {
    /// Ordered `(mode, prefix symbol)` pairs, most powerful first.
    pub prefixes: Vec<(char, char)>,
    /// Supported channel name prefixes.
    pub chantypes: String,
    /// Type A: list modes (ban-style); always take a parameter.
    pub modes_list: String,
    /// Type B: always take a parameter.
    pub modes_always_param: String,
    /// Type C: take a parameter only when set.
    pub modes_set_param: String,
    /// Type D: never take a parameter.
    pub modes_no_param: String,
    pub casemapping: Option<String>,
    pub statusmsg: Option<String>,
    pub elist: Option<String>,
    pub network: Option<String>,

    pub max_modes: Option<u32>,
    pub max_nick_length: Option<u32>,
    pub max_topic_length: Option<u32>,
    pub max_kick_length: Option<u32>,
    pub max_channel_length: Option<u32>,
    pub max_away_length: Option<u32>,
    pub max_targets: Option<u32>,
    pub max_silence_list: Option<u32>,

    pub supports_excepts: bool,
    pub supports_invex: bool,
    pub wallchops: bool,
    pub wallvoices: bool,
    pub rfc2812: bool,
    pub penalty: bool,
    pub forced_nick_changes: bool,
    pub safelist: bool,
    pub userip: bool,
    pub cprivmsg: bool,
    pub cnotice: bool,
    pub knock: bool,
    pub whox: bool,
    pub callerid: bool,
}

impl Default for Isupport {
    /// RFC 1459 baseline, so mode interpretation stays aligned even
    /// against a server that never sends 005.
    fn default() -> Self {
        Isupport {
            prefixes: vec![('o', '@'), ('v', '+')],
            chantypes: "#&".to_string(),
            modes_list: "b".to_string(),
            modes_always_param: "k".to_string(),
            modes_set_param: "l".to_string(),
            modes_no_param: "imnpst".to_string(),
            casemapping: None,
            statusmsg: None,
            elist: None,
            network: None,
            max_modes: None,
            max_nick_length: None,
            max_topic_length: None,
            max_kick_length: None,
            max_channel_length: None,
            max_away_length: None,
            max_targets: None,
            max_silence_list: None,
            supports_excepts: false,
            supports_invex: false,
            wallchops: false,
            wallvoices: false,
            rfc2812: false,
            penalty: false,
            forced_nick_changes: false,
            safelist: false,
            userip: false,
            cprivmsg: false,
            cnotice: false,
            knock: false,
            whox: false,
            callerid: false,
        }
    }
}

impl Isupport {
    /// Merge one 005 line's tokens into the table. The caller passes
    /// the numeric's parameters minus the trailing free-text parameter.
    pub fn apply_tokens<S: AsRef<str>>(&mut self, tokens: &[S]) {
        for token in tokens {
            let token = token.as_ref();
            if token.is_empty() {
                continue;
            }
            let (key, value) = match token.split_once('=') {
                Some((k, v)) => (k, v),
                None => (token, ""),
            };

            match key {
                "PREFIX" => {
                    if let Some(pairs) = parse_prefix_value(value) {
                        self.prefixes = pairs;
                    }
                }
                "CHANMODES" => {
                    let mut groups = value.splitn(4, ',');
                    if let (Some(a), Some(b), Some(c), Some(d)) =
                        (groups.next(), groups.next(), groups.next(), groups.next())
                    {
                        self.modes_list = a.to_string();
                        self.modes_always_param = b.to_string();
                        self.modes_set_param = c.to_string();
                        self.modes_no_param = d.to_string();
                    }
                }
                "CHANTYPES" => self.chantypes = value.to_string(),
                "CASEMAPPING" => self.casemapping = Some(value.to_string()),
                "STATUSMSG" => self.statusmsg = Some(value.to_string()),
                "ELIST" => self.elist = Some(value.to_string()),
                "NETWORK" => self.network = Some(value.to_string()),
                "MODES" => self.max_modes = value.parse().ok(),
                "NICKLEN" | "MAXNICKLEN" => self.max_nick_length = value.parse().ok(),
                "TOPICLEN" => self.max_topic_length = value.parse().ok(),
                "KICKLEN" => self.max_kick_length = value.parse().ok(),
                "CHANNELLEN" => self.max_channel_length = value.parse().ok(),
                "AWAYLEN" => self.max_away_length = value.parse().ok(),
                "MAXTARGETS" => self.max_targets = value.parse().ok(),
                "SILENCE" => self.max_silence_list = value.parse().ok(),
                "EXCEPTS" => self.supports_excepts = true,
                "INVEX" => self.supports_invex = true,
                "WALLCHOPS" => self.wallchops = true,
                "WALLVOICES" => self.wallvoices = true,
                "RFC2812" => self.rfc2812 = true,
                "PENALTY" => self.penalty = true,
                "FNC" => self.forced_nick_changes = true,
                "SAFELIST" => self.safelist = true,
                "USERIP" => self.userip = true,
                "CPRIVMSG" => self.cprivmsg = true,
                "CNOTICE" => self.cnotice = true,
                "KNOCK" => self.knock = true,
                "WHOX" => self.whox = true,
                "CALLERID" => self.callerid = true,
                _ => {}
            }
        }
    }

    /// The prefix symbol for a status mode letter, if any.
    pub fn prefix_symbol_for(&self, mode: char) -> Option<char> {
        self.prefixes
            .iter()
            .find(|(m, _)| *m == mode)
            .map(|(_, s)| *s)
    }

    /// Whether a mode letter grants a status prefix.
    pub fn is_prefix_mode(&self, c: char) -> bool {
        self.prefixes.iter().any(|(m, _)| *m == c)
    }

    /// Whether a character is a status-prefix symbol (as shown in
    /// NAMES output).
    pub fn is_prefix_symbol(&self, c: char) -> bool {
        self.prefixes.iter().any(|(_, s)| *s == c)
    }
}

/// `(modes)symbols`, matched positionally, most powerful first.
fn parse_prefix_value(value: &str) -> Option<Vec<(char, char)>> {
    let rest = value.strip_prefix('(')?;
    let (modes, symbols) = rest.split_once(')')?;
    if modes.is_empty() || modes.chars().count() != symbols.chars().count() {
        return None;
    }
    Some(modes.chars().zip(symbols.chars()).collect())
}
