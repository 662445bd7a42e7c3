//! Pub/sub transport abstraction.
//!
//! The typed channel layer never talks to a network itself. It drives two
//! collaborators:
//! - [`SubscribeTransport`]: the client side (subscribe, unsubscribe, bind)
//! - [`PublishTransport`]: the server side (trigger, batch trigger, send to user)
//!
//! [`MemoryTransport`] implements both in-process and loops published events
//! back to local bindings.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{Result, TransportError};
pub use memory::{MemoryTransport, Published};
pub use traits::{
    BatchEvent, BindingId, Callback, ChannelHandle, PublishTransport, SubscribeTransport,
    TriggerResponse,
};
