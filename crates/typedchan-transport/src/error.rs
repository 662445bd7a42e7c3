/// Errors reported by a pub/sub transport.
///
/// The typed layer passes these through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The transport could not subscribe to a channel.
    #[error("failed to subscribe to {channel}: {message}")]
    Subscribe { channel: String, message: String },

    /// The transport could not unsubscribe from a channel.
    #[error("failed to unsubscribe from {channel}: {message}")]
    Unsubscribe { channel: String, message: String },

    /// The backend rejected a publish request.
    #[error("publish rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The backend could not be reached.
    #[error("transport unavailable: {0}")]
    Unavailable(String),

    /// The transport has been shut down.
    #[error("transport shut down")]
    Shutdown,
}

pub type Result<T> = std::result::Result<T, TransportError>;
