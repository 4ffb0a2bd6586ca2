use std::fmt;

/// Opaque pointer to a user, basic group or channel. Carries no name; it has
/// to be resolved against the account before it can be displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeerRef {
    User(i64),
    Chat(i64),
    Channel(i64),
}

impl PeerRef {
    /// Raw platform identifier of whichever kind the peer carries.
    pub fn raw_id(self) -> i64 {
        match self {
            Self::User(id) | Self::Chat(id) | Self::Channel(id) => id,
        }
    }

    pub fn kind_label(self) -> &'static str {
        match self {
            Self::User(_) => "user",
            Self::Chat(_) => "chat",
            Self::Channel(_) => "channel",
        }
    }

    /// Stand-in name for a peer that could not be resolved.
    pub fn placeholder_name(self) -> String {
        format!("Unknown/Inaccessible Entity (ID: {})", self.raw_id())
    }
}

impl fmt::Display for PeerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind_label(), self.raw_id())
    }
}
