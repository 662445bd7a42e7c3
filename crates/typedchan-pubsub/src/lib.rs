//! Typed channel facades over a pub/sub transport.
//!
//! - [`TypedClient`] joins channel instances by (kind, id) and delivers only
//!   payloads that satisfy the declared event schema.
//! - [`TypedServer`] publishes by (kind, id) to one instance, many instances,
//!   or a batch of them, and sends user-targeted events.
//!
//! Both sides share one [`SchemaRegistry`](typedchan_schema::SchemaRegistry)
//! and one [`ChannelOptions`], so a client subscription and a server publish
//! for the same identity always agree on the wire channel name.

pub mod channel;
pub mod client;
mod dispatch;
pub mod error;
pub mod events;
pub mod options;
pub mod server;

pub use channel::{Channel, TypedChannel};
pub use client::{Member, TypedClient};
pub use error::{PubSubError, Result};
pub use events::{ChannelKind, Event, UserEvent};
pub use options::ChannelOptions;
pub use server::{BatchEntry, TypedServer};
