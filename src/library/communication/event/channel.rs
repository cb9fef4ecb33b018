use std::fmt::{self, Display, Formatter};

/// Describes a publish/subscribe channel
///
/// Channels are resolved from the configuration at runtime and are thus not bound to a
/// [`Notification`](super::Notification) type. Multiple notification types may travel through
/// the same channel and are told apart by their event name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelDescriptor {
    key: String,
}

impl ChannelDescriptor {
    /// Creates a new instance from raw parts
    pub fn new(key: String) -> Self {
        Self { key }
    }

    /// Value which may be used by transport implementations to identify a channel
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Display for ChannelDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)
    }
}

impl From<&str> for ChannelDescriptor {
    fn from(key: &str) -> Self {
        Self::new(key.to_owned())
    }
}
