/// Errors that can occur in the typed channel facades.
#[derive(Debug, thiserror::Error)]
pub enum PubSubError {
    /// Transport-level error, passed through unchanged.
    #[error("transport error: {0}")]
    Transport(#[from] typedchan_transport::TransportError),

    /// Undeclared channel/event, registry construction, or outbound validation error.
    #[error("schema error: {0}")]
    Schema(#[from] typedchan_schema::SchemaError),

    /// A typed payload could not be serialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PubSubError {
    /// Returns true if a channel kind, event, or user event is not declared.
    pub fn is_undeclared(&self) -> bool {
        matches!(self, PubSubError::Schema(err) if err.is_undeclared())
    }
}

pub type Result<T> = std::result::Result<T, PubSubError>;
