use std::fmt;
use std::io;

use typedchan_naming::NamingError;
use typedchan_schema::SchemaError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const NO_INPUT: i32 = 66;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => NO_INPUT,
        io::ErrorKind::InvalidData => DATA_INVALID,
        _ => FAILURE,
    };
    CliError::new(code, format!("{context}: {err}"))
}

/// Any failure while loading a manifest means there is no usable registry.
pub fn manifest_error(context: &str, err: SchemaError) -> CliError {
    CliError::new(NO_INPUT, format!("{context}: {err}"))
}

pub fn schema_error(context: &str, err: SchemaError) -> CliError {
    let code = match &err {
        SchemaError::ValidationFailed { .. } | SchemaError::InvalidJson(_) => DATA_INVALID,
        SchemaError::UndeclaredChannel(_)
        | SchemaError::UndeclaredEvent { .. }
        | SchemaError::UndeclaredUserEvent(_)
        | SchemaError::AmbiguousKind { .. }
        | SchemaError::InvalidName(_) => USAGE,
        SchemaError::LoadFailed(_)
        | SchemaError::InvalidManifest(_)
        | SchemaError::CompileFailed { .. } => NO_INPUT,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn naming_error(context: &str, err: NamingError) -> CliError {
    CliError::new(USAGE, format!("{context}: {err}"))
}

#[cfg(test)]
mod tests {
    use typedchan_schema::GateTarget;

    use super::*;

    #[test]
    fn validation_failure_is_data_invalid() {
        let err = schema_error(
            "validate",
            SchemaError::ValidationFailed {
                target: GateTarget::channel("room", "chat"),
                message: "\"text\" is a required property".into(),
            },
        );
        assert_eq!(err.code, DATA_INVALID);
        assert!(err.message.starts_with("validate: validation failed"));
    }

    #[test]
    fn undeclared_lookup_is_usage() {
        let err = schema_error("validate", SchemaError::UndeclaredChannel("lobby".into()));
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn io_errors_map_by_kind() {
        let missing = io_error("read", io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(missing.code, NO_INPUT);
        let other = io_error("read", io::Error::other("disk on fire"));
        assert_eq!(other.code, FAILURE);
    }

    #[test]
    fn manifest_errors_are_no_input() {
        let err = manifest_error("load", SchemaError::UndeclaredChannel("x".into()));
        assert_eq!(err.code, NO_INPUT);
        let err = schema_error("load", SchemaError::LoadFailed("missing".into()));
        assert_eq!(err.code, NO_INPUT);
    }
}
