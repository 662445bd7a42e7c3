//! Compile-time channel/event declarations.
//!
//! Each declared channel kind, channel event, and user event is a marker type
//! implementing one of these traits. The typed facade methods only accept an
//! event together with the kind it is declared on, and only its payload type.
//! The names must match the entries of the runtime schema registry; a
//! mismatch surfaces as an undeclared-channel or undeclared-event error.
//!
//! ```
//! use serde::{Deserialize, Serialize};
//! use typedchan_pubsub::{ChannelKind, Event};
//!
//! struct Room;
//! impl ChannelKind for Room {
//!     const NAME: &'static str = "room";
//! }
//!
//! #[derive(Serialize, Deserialize)]
//! struct ChatMessage {
//!     id: String,
//!     text: String,
//! }
//!
//! struct Chat;
//! impl Event for Chat {
//!     type Kind = Room;
//!     type Payload = ChatMessage;
//!     const NAME: &'static str = "chat";
//! }
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;

/// A declared channel kind.
pub trait ChannelKind: 'static {
    const NAME: &'static str;
}

/// An event declared on channel kind [`Event::Kind`].
pub trait Event: 'static {
    type Kind: ChannelKind;
    type Payload: Serialize + DeserializeOwned + Send + 'static;
    const NAME: &'static str;
}

/// An event delivered directly to a user, outside any channel.
pub trait UserEvent: 'static {
    type Payload: Serialize + DeserializeOwned + Send + 'static;
    const NAME: &'static str;
}
