use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{NamingError, Result};

/// Character placed between the channel kind and the instance id.
///
/// Only a fixed set of punctuation characters is accepted by the transports
/// this crate targets, so any other value is unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Separator {
    /// `_`
    Underscore,
    /// `-`
    Hyphen,
    /// `=`
    Equals,
    /// `@`
    At,
    /// `,`
    Comma,
    /// `.`
    #[default]
    Dot,
    /// `;`
    Semicolon,
}

impl Separator {
    /// Every supported separator.
    pub const ALL: [Separator; 7] = [
        Separator::Underscore,
        Separator::Hyphen,
        Separator::Equals,
        Separator::At,
        Separator::Comma,
        Separator::Dot,
        Separator::Semicolon,
    ];

    pub const fn as_char(self) -> char {
        match self {
            Separator::Underscore => '_',
            Separator::Hyphen => '-',
            Separator::Equals => '=',
            Separator::At => '@',
            Separator::Comma => ',',
            Separator::Dot => '.',
            Separator::Semicolon => ';',
        }
    }
}

impl TryFrom<char> for Separator {
    type Error = NamingError;

    fn try_from(value: char) -> Result<Self> {
        Separator::ALL
            .into_iter()
            .find(|sep| sep.as_char() == value)
            .ok_or_else(|| NamingError::InvalidSeparator(value.to_string()))
    }
}

impl FromStr for Separator {
    type Err = NamingError;

    fn from_str(s: &str) -> Result<Self> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Separator::try_from(c),
            _ => Err(NamingError::InvalidSeparator(s.to_string())),
        }
    }
}

impl TryFrom<String> for Separator {
    type Error = NamingError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Separator> for String {
    fn from(sep: Separator) -> Self {
        sep.as_char().to_string()
    }
}

impl fmt::Display for Separator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_dot() {
        assert_eq!(Separator::default(), Separator::Dot);
        assert_eq!(Separator::default().as_char(), '.');
    }

    #[test]
    fn parses_every_supported_character() {
        for sep in Separator::ALL {
            assert_eq!(sep.to_string().parse::<Separator>().unwrap(), sep);
            assert_eq!(Separator::try_from(sep.as_char()).unwrap(), sep);
        }
    }

    #[test]
    fn rejects_unsupported_values() {
        assert!(matches!(
            "/".parse::<Separator>(),
            Err(NamingError::InvalidSeparator(_))
        ));
        assert!("..".parse::<Separator>().is_err());
        assert!("".parse::<Separator>().is_err());
        assert!(Separator::try_from(':').is_err());
    }

    #[test]
    fn serde_uses_the_character() {
        let json = serde_json::to_string(&Separator::At).unwrap();
        assert_eq!(json, r#""@""#);
        let sep: Separator = serde_json::from_str(r#"";""#).unwrap();
        assert_eq!(sep, Separator::Semicolon);
        assert!(serde_json::from_str::<Separator>(r#""|""#).is_err());
    }
}
