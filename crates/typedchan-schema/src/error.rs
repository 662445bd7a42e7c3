use typedchan_naming::Separator;

use crate::gate::GateTarget;

/// Errors that can occur while building or querying a schema registry.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The manifest file could not be loaded.
    #[error("failed to load manifest: {0}")]
    LoadFailed(String),

    /// The manifest does not have the expected shape.
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    /// A schema could not be compiled.
    #[error("failed to compile schema for {target}: {message}")]
    CompileFailed { target: GateTarget, message: String },

    /// A channel kind or event name is not usable.
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// A channel kind contains the configured wire separator.
    #[error("channel kind {kind:?} contains the separator '{separator}'")]
    AmbiguousKind { kind: String, separator: Separator },

    /// The payload failed schema validation.
    #[error("validation failed for {target}: {message}")]
    ValidationFailed { target: GateTarget, message: String },

    /// The payload or schema is not valid JSON.
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// No such channel kind is declared.
    #[error("channel kind {0:?} is not declared")]
    UndeclaredChannel(String),

    /// The channel kind is declared but does not carry this event.
    #[error("event {event:?} is not declared on channel kind {channel:?}")]
    UndeclaredEvent { channel: String, event: String },

    /// No such user event is declared.
    #[error("user event {0:?} is not declared")]
    UndeclaredUserEvent(String),
}

impl SchemaError {
    /// Returns true for lookups of channel kinds or events that are not declared.
    pub fn is_undeclared(&self) -> bool {
        matches!(
            self,
            SchemaError::UndeclaredChannel(_)
                | SchemaError::UndeclaredEvent { .. }
                | SchemaError::UndeclaredUserEvent(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SchemaError>;
