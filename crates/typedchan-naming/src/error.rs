/// Errors that can occur while building channel identities.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NamingError {
    /// The separator is not one of the supported punctuation characters.
    #[error("unsupported channel id separator {0:?} (expected one of _ - = @ , . ;)")]
    InvalidSeparator(String),
}

pub type Result<T> = std::result::Result<T, NamingError>;
