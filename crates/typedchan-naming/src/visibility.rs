//! Visibility classes derived from channel kind prefixes.
//!
//! Access control itself is enforced by the transport from the same prefix;
//! this module only classifies names.

/// Prefix of channels that require an authorized subscription.
pub const PRIVATE_PREFIX: &str = "private-";

/// Prefix of private channels with end-to-end encrypted payloads.
pub const ENCRYPTED_PREFIX: &str = "private-encrypted-";

/// Prefix of channels that track their subscribed members.
pub const PRESENCE_PREFIX: &str = "presence-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelVisibility {
    Public,
    Private,
    Encrypted,
    Presence,
}

impl ChannelVisibility {
    /// Classify a channel kind (or wire name) by its prefix.
    pub fn of(kind: &str) -> Self {
        if kind.starts_with(ENCRYPTED_PREFIX) {
            ChannelVisibility::Encrypted
        } else if kind.starts_with(PRIVATE_PREFIX) {
            ChannelVisibility::Private
        } else if kind.starts_with(PRESENCE_PREFIX) {
            ChannelVisibility::Presence
        } else {
            ChannelVisibility::Public
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChannelVisibility::Public => "public",
            ChannelVisibility::Private => "private",
            ChannelVisibility::Encrypted => "encrypted",
            ChannelVisibility::Presence => "presence",
        }
    }
}

/// Returns true if the kind carries the restricted-access prefix.
///
/// Encrypted channels are private channels and count as restricted.
pub fn is_restricted(kind: &str) -> bool {
    kind.starts_with(PRIVATE_PREFIX)
}

/// Returns true if the kind carries the presence-tracking prefix.
pub fn is_presence(kind: &str) -> bool {
    kind.starts_with(PRESENCE_PREFIX)
}
