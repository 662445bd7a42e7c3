//! Typed channel naming and schema-validated event dispatch over pub/sub
//! transports.
//!
//! Channel kinds and their events are declared once in a [`schema::SchemaRegistry`].
//! Subscribers join channel instances by `(kind, id)` and only ever see
//! payloads that satisfy the declared schema; publishers address the same
//! instances without hand-building wire names.
//!
//! # Crate Structure
//!
//! - [`naming`]: wire channel names, separators and visibility prefixes
//! - [`schema`]: schema registry, payload gate and channel introspection
//! - [`transport`]: the subscribe/publish collaborator traits and an in-memory transport
//! - [`pubsub`]: typed subscriber and publisher facades (behind `pubsub` feature)

/// Re-export naming types.
pub mod naming {
    pub use typedchan_naming::*;
}

/// Re-export schema types.
pub mod schema {
    pub use typedchan_schema::*;
}

/// Re-export transport types.
pub mod transport {
    pub use typedchan_transport::*;
}

/// Re-export facade types (requires `pubsub` feature).
#[cfg(feature = "pubsub")]
pub mod pubsub {
    pub use typedchan_pubsub::*;
}
