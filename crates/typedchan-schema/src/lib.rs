//! Channel/event schema registry and payload gate.
//!
//! A registry maps each channel kind to its event names and the JSON Schema
//! every payload of that event must satisfy, plus an optional set of
//! user-targeted events delivered outside any channel. The payload gate runs
//! those schemas on the receive path and drops (never raises on) payloads
//! that fail them.

pub mod config;
pub mod error;
pub mod gate;
pub mod introspect;
pub mod registry;
mod strict;

pub use config::RegistryConfig;
pub use error::{Result, SchemaError};
pub use gate::{validate, DiagnosticSink, DroppedEvent, GateTarget, PayloadGate, TracingSink};
pub use introspect::{
    channel_kinds, describe, presence_channel_kinds, restricted_channel_kinds, ChannelSummary,
};
pub use registry::{EventSchema, SchemaRegistry, SchemaRegistryBuilder};
