//! Error types for encoding, decoding and binding.
//!
//! Every fallible operation in the crate returns [`Result`], whose error type is
//! the single [`Error`] enum. Its variants follow the three stages of the codec:
//!
//! - **Parse**: the text is malformed. Always carries the byte offset of the
//!   problem plus a derived line and column.
//! - **Bind**: the text parsed, but the resulting tree does not fit the target
//!   type. Carries the field path (`customer.tags[1]`).
//! - **Encode**: the value cannot be represented (non-finite float, empty map
//!   key, nesting too deep).
//!
//! ## Examples
//!
//! ```rust
//! use toon_codec::{decode, ParseErrorKind};
//!
//! let err = decode(b"name: \"Ann").unwrap_err();
//! assert_eq!(err.parse_kind(), Some(ParseErrorKind::UnterminatedQuote));
//! assert_eq!(err.offset(), Some(6));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors produced by the codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The input text is malformed.
    #[error("parse error at line {line}, column {column} (byte {offset}): {kind}: {message}")]
    Parse {
        kind: ParseErrorKind,
        offset: usize,
        line: usize,
        column: usize,
        message: String,
    },

    /// The decoded tree does not match the shape of the target type.
    #[error("bind error at {}: {reason}", display_path(.path))]
    Bind { path: String, reason: BindReason },

    /// The value cannot be encoded.
    #[error("encode error: {0}")]
    Encode(String),

    /// IO error during reading or writing
    #[error("IO error: {0}")]
    Io(String),
}

/// The category of a [`Error::Parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    InvalidUtf8,
    MalformedToken,
    UnterminatedQuote,
    InvalidEscape,
    UnexpectedIndentation,
    MixedIndentation,
    DedentToUnknownLevel,
    DuplicateKey,
    EmptyKey,
    DepthLimitExceeded,
}

impl ParseErrorKind {
    /// Returns a short, stable name for this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ParseErrorKind::InvalidUtf8 => "invalid UTF-8",
            ParseErrorKind::MalformedToken => "malformed token",
            ParseErrorKind::UnterminatedQuote => "unterminated quote",
            ParseErrorKind::InvalidEscape => "invalid escape",
            ParseErrorKind::UnexpectedIndentation => "unexpected indentation",
            ParseErrorKind::MixedIndentation => "mixed indentation",
            ParseErrorKind::DedentToUnknownLevel => "dedent to unknown level",
            ParseErrorKind::DuplicateKey => "duplicate key",
            ParseErrorKind::EmptyKey => "empty key",
            ParseErrorKind::DepthLimitExceeded => "depth limit exceeded",
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a [`Error::Bind`] happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindReason {
    /// The value at the path has the wrong kind or is out of range.
    TypeMismatch { expected: String, found: String },
    /// A required field is absent from the decoded map.
    MissingField,
    /// Any other message raised by a `Deserialize` implementation.
    Custom(String),
}

impl fmt::Display for BindReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindReason::TypeMismatch { expected, found } => {
                write!(f, "expected {}, found {}", expected, found)
            }
            BindReason::MissingField => f.write_str("missing required field"),
            BindReason::Custom(msg) => f.write_str(msg),
        }
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "<root>"
    } else {
        path
    }
}

impl Error {
    /// Creates a parse error at `offset` within `input`, deriving the 1-based
    /// line and byte column from the offset.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use toon_codec::{Error, ParseErrorKind};
    ///
    /// let err = Error::parse(b"a: 1\nb", 5, ParseErrorKind::MalformedToken, "expected `key: value`");
    /// assert!(err.to_string().contains("line 2, column 1"));
    /// ```
    pub fn parse(input: &[u8], offset: usize, kind: ParseErrorKind, message: &str) -> Self {
        let before = &input[..offset.min(input.len())];
        let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
        let line_start = before
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |pos| pos + 1);
        Error::Parse {
            kind,
            offset,
            line,
            column: offset - line_start + 1,
            message: message.to_string(),
        }
    }

    /// Creates a bind error for a value of the wrong kind.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use toon_codec::Error;
    ///
    /// let err = Error::type_mismatch("integer", "string");
    /// assert!(err.to_string().contains("expected integer, found string"));
    /// ```
    pub fn type_mismatch(expected: &str, found: &str) -> Self {
        Error::Bind {
            path: String::new(),
            reason: BindReason::TypeMismatch {
                expected: expected.to_string(),
                found: found.to_string(),
            },
        }
    }

    /// Creates a bind error for an absent required field.
    pub fn missing_field(field: &str) -> Self {
        Error::Bind {
            path: field.to_string(),
            reason: BindReason::MissingField,
        }
    }

    /// Creates an encode error.
    pub fn encode<T: fmt::Display>(msg: T) -> Self {
        Error::Encode(msg.to_string())
    }

    /// Creates an I/O error for reader/writer failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }

    /// Byte offset of a parse error.
    #[must_use]
    pub fn offset(&self) -> Option<usize> {
        match self {
            Error::Parse { offset, .. } => Some(*offset),
            _ => None,
        }
    }

    /// Kind of a parse error.
    #[must_use]
    pub fn parse_kind(&self) -> Option<ParseErrorKind> {
        match self {
            Error::Parse { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Field path of a bind error; empty for the root value.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Error::Bind { path, .. } => Some(path),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_parse(&self) -> bool {
        matches!(self, Error::Parse { .. })
    }

    #[must_use]
    pub fn is_bind(&self) -> bool {
        matches!(self, Error::Bind { .. })
    }

    #[must_use]
    pub fn is_encode(&self) -> bool {
        matches!(self, Error::Encode(_))
    }

    /// Prefixes the path of a bind error with a map key.
    pub(crate) fn in_field(self, key: &str) -> Self {
        match self {
            Error::Bind { path, reason } => {
                let path = if path.is_empty() {
                    key.to_string()
                } else if path.starts_with('[') {
                    format!("{}{}", key, path)
                } else {
                    format!("{}.{}", key, path)
                };
                Error::Bind { path, reason }
            }
            other => other,
        }
    }

    /// Prefixes the path of a bind error with a sequence index.
    pub(crate) fn in_element(self, index: usize) -> Self {
        match self {
            Error::Bind { path, reason } => {
                let path = if path.is_empty() || path.starts_with('[') {
                    format!("[{}]{}", index, path)
                } else {
                    format!("[{}].{}", index, path)
                };
                Error::Bind { path, reason }
            }
            other => other,
        }
    }
}

fn unexpected_kind(unexp: &serde::de::Unexpected<'_>) -> String {
    use serde::de::Unexpected;

    match unexp {
        Unexpected::Bool(_) => "bool".to_string(),
        Unexpected::Unsigned(_) | Unexpected::Signed(_) => "integer".to_string(),
        Unexpected::Float(_) => "float".to_string(),
        Unexpected::Char(_) | Unexpected::Str(_) => "string".to_string(),
        Unexpected::Unit | Unexpected::Option => "null".to_string(),
        Unexpected::Seq => "sequence".to_string(),
        Unexpected::Map => "map".to_string(),
        other => other.to_string(),
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Encode(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Bind {
            path: String::new(),
            reason: BindReason::Custom(msg.to_string()),
        }
    }

    fn invalid_type(unexp: serde::de::Unexpected<'_>, exp: &dyn serde::de::Expected) -> Self {
        Error::type_mismatch(&exp.to_string(), &unexpected_kind(&unexp))
    }

    fn invalid_value(unexp: serde::de::Unexpected<'_>, exp: &dyn serde::de::Expected) -> Self {
        Error::type_mismatch(&exp.to_string(), &unexp.to_string())
    }

    fn invalid_length(len: usize, exp: &dyn serde::de::Expected) -> Self {
        Error::type_mismatch(&exp.to_string(), &format!("sequence of length {}", len))
    }

    fn missing_field(field: &'static str) -> Self {
        Error::missing_field(field)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde::de::Error as _;

    #[test]
    fn test_parse_error_position() {
        let input = b"a: 1\nb: 2\n  c";
        let err = Error::parse(input, 12, ParseErrorKind::UnexpectedIndentation, "too deep");
        match err {
            Error::Parse {
                line,
                column,
                offset,
                ..
            } => {
                assert_eq!(line, 3);
                assert_eq!(column, 3);
                assert_eq!(offset, 12);
            }
            _ => panic!("Expected parse error"),
        }
    }

    #[test]
    fn test_bind_path_composition() {
        let err = Error::missing_field("name").in_field("customer");
        assert_eq!(err.path(), Some("customer.name"));

        let err = Error::type_mismatch("f64", "string")
            .in_field("price")
            .in_element(1)
            .in_field("items");
        assert_eq!(err.path(), Some("items[1].price"));

        let err = Error::type_mismatch("i64", "string").in_element(0).in_element(2);
        assert_eq!(err.path(), Some("[2][0]"));
    }

    #[test]
    fn test_invalid_type_reports_kinds() {
        let err = Error::invalid_type(serde::de::Unexpected::Str("abc"), &"i64");
        assert_eq!(
            err,
            Error::Bind {
                path: String::new(),
                reason: BindReason::TypeMismatch {
                    expected: "i64".to_string(),
                    found: "string".to_string(),
                },
            }
        );
        assert!(err.to_string().contains("<root>"));
    }

    #[test]
    fn test_path_ignored_for_other_errors() {
        let err = Error::encode("boom").in_field("x");
        assert_eq!(err, Error::Encode("boom".to_string()));
        assert!(err.is_encode());
        assert_eq!(err.path(), None);
    }
}
