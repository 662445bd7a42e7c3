//! Channel identity encoding for typed pub/sub channels.
//!
//! A channel instance is addressed by a declared channel kind plus a
//! caller-chosen instance id. Both the subscribing and the publishing side
//! turn that pair into one wire channel name:
//!
//! ```text
//! <kind><separator><instance>
//! ```
//!
//! No escaping is performed. Kind names must not contain the separator;
//! registries check this at construction.

pub mod error;
pub mod identity;
pub mod separator;
pub mod visibility;

pub use error::{NamingError, Result};
pub use identity::{encode, ChannelIdentity, ChannelTargets, InstanceId, WireChannelName};
pub use separator::Separator;
pub use visibility::{
    is_presence, is_restricted, ChannelVisibility, ENCRYPTED_PREFIX, PRESENCE_PREFIX,
    PRIVATE_PREFIX,
};
