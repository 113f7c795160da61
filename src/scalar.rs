//! Scalar tokens: classification, quoting and escaping.
//!
//! A scalar is written as a single token, either bare or quoted. A bare token
//! is classified on decode by trying `null`, the booleans, an integer and a
//! float before falling back to a string. The encoder quotes a string exactly
//! when leaving it bare would change its meaning or break the line structure,
//! so `decode_scalar(encode_scalar(v)) == v` for every scalar.
//!
//! ```rust
//! use toon_codec::scalar::{decode_scalar, encode_scalar, needs_quotes};
//! use toon_codec::Value;
//!
//! assert_eq!(encode_scalar(&Value::Float(2.0)).unwrap(), "2.0");
//! assert_eq!(encode_scalar(&Value::from("42")).unwrap(), "\"42\"");
//! assert_eq!(decode_scalar("42").unwrap(), Value::Integer(42));
//! assert!(!needs_quotes("plain text"));
//! ```

use crate::error::ParseErrorKind;
use crate::{Error, Result, Value};
use chrono::{DateTime, SecondsFormat, Utc};

/// Encodes a scalar value as a token.
///
/// # Errors
///
/// Returns an encode error for non-finite floats and for sequences or maps.
pub fn encode_scalar(value: &Value) -> Result<String> {
    let mut out = Vec::new();
    write_scalar(&mut out, value)?;
    String::from_utf8(out).map_err(Error::encode)
}

/// Appends the token for a scalar value to `out`.
///
/// # Errors
///
/// Returns an encode error for non-finite floats and for sequences or maps.
pub fn write_scalar(out: &mut Vec<u8>, value: &Value) -> Result<()> {
    match value {
        Value::Null => out.extend_from_slice(b"null"),
        Value::Bool(true) => out.extend_from_slice(b"true"),
        Value::Bool(false) => out.extend_from_slice(b"false"),
        Value::Integer(i) => out.extend_from_slice(i.to_string().as_bytes()),
        Value::Float(f) => {
            if !f.is_finite() {
                return Err(Error::encode(format!("cannot encode non-finite float {}", f)));
            }
            // `{:?}` is the shortest round-trip form and always carries `.` or an exponent.
            out.extend_from_slice(format!("{:?}", f).as_bytes());
        }
        Value::String(s) => write_string(out, s),
        Value::Sequence(_) | Value::Map(_) => {
            return Err(Error::encode(format!(
                "{} is not a scalar",
                value.kind().as_str()
            )));
        }
    }
    Ok(())
}

/// Appends a string token, quoting and escaping it when required.
pub fn write_string(out: &mut Vec<u8>, s: &str) {
    if !needs_quotes(s) {
        out.extend_from_slice(s.as_bytes());
        return;
    }

    out.push(b'"');
    let mut utf8 = [0u8; 4];
    for ch in s.chars() {
        match ch {
            '"' => out.extend_from_slice(b"\\\""),
            '\\' => out.extend_from_slice(b"\\\\"),
            '\n' => out.extend_from_slice(b"\\n"),
            '\r' => out.extend_from_slice(b"\\r"),
            '\t' => out.extend_from_slice(b"\\t"),
            '\u{0008}' => out.extend_from_slice(b"\\b"),
            '\u{000C}' => out.extend_from_slice(b"\\f"),
            '\0' => out.extend_from_slice(b"\\0"),
            c if c.is_control() => {
                out.extend_from_slice(format!("\\u{:04x}", u32::from(c)).as_bytes());
            }
            c => out.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes()),
        }
    }
    out.push(b'"');
}

/// Returns `true` if `s` cannot be written as a bare token.
///
/// # Examples
///
/// ```rust
/// use toon_codec::scalar::needs_quotes;
///
/// assert!(needs_quotes(""));
/// assert!(needs_quotes("true"));
/// assert!(needs_quotes("-1.5"));
/// assert!(needs_quotes("a, b"));
/// assert!(needs_quotes("key: value"));
/// assert!(needs_quotes(" padded"));
/// assert!(needs_quotes("- item"));
/// assert!(!needs_quotes("hello world"));
/// assert!(!needs_quotes("-x"));
/// ```
#[must_use]
pub fn needs_quotes(s: &str) -> bool {
    if s.is_empty() {
        return true;
    }

    if s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace) {
        return true;
    }

    // Structural characters and anything that would break the line.
    if s
        .chars()
        .any(|c| matches!(c, ':' | ',' | '"' | '\\') || c.is_control())
    {
        return true;
    }

    if s == "[]" || s == "{}" || s == "-" || s.starts_with("- ") {
        return true;
    }

    bare_literal(s).is_some()
}

/// Decodes a single bare or quoted token.
///
/// # Errors
///
/// Returns a parse error for an unterminated quote, an invalid escape or
/// characters following the closing quote.
pub fn decode_scalar(token: &str) -> Result<Value> {
    decode_token(token, 0, token.as_bytes())
}

/// Decodes `token`, which starts at `offset` within `input`.
pub(crate) fn decode_token(token: &str, offset: usize, input: &[u8]) -> Result<Value> {
    if token.starts_with('"') {
        let (s, end) = parse_quoted(token, 0, offset, input)?;
        if end != token.len() {
            return Err(Error::parse(
                input,
                offset + end,
                ParseErrorKind::MalformedToken,
                "unexpected characters after closing quote",
            ));
        }
        Ok(Value::String(s))
    } else {
        Ok(classify_bare(token))
    }
}

/// Classifies a bare token: `null`, bool, integer, float, then string.
#[must_use]
pub fn classify_bare(token: &str) -> Value {
    bare_literal(token).unwrap_or_else(|| Value::String(token.to_string()))
}

/// Returns the non-string value a bare token denotes, if any.
fn bare_literal(token: &str) -> Option<Value> {
    match token {
        "null" => return Some(Value::Null),
        "true" => return Some(Value::Bool(true)),
        "false" => return Some(Value::Bool(false)),
        _ => {}
    }

    match number_shape(token)? {
        NumberShape::Integer => match token.parse::<i64>() {
            Ok(i) => Some(Value::Integer(i)),
            Err(_) => finite_float(token),
        },
        NumberShape::Float => finite_float(token),
    }
}

fn finite_float(token: &str) -> Option<Value> {
    token
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(Value::Float)
}

enum NumberShape {
    Integer,
    Float,
}

/// Matches `-?digits(.digits)?([eE][+-]?digits)?`.
fn number_shape(token: &str) -> Option<NumberShape> {
    let bytes = token.strip_prefix('-').unwrap_or(token).as_bytes();
    let digits_from = |start: usize| {
        bytes[start.min(bytes.len())..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let mut pos = digits_from(0);
    if pos == 0 {
        return None;
    }

    let mut shape = NumberShape::Integer;
    if bytes.get(pos) == Some(&b'.') {
        let fraction = digits_from(pos + 1);
        if fraction == 0 {
            return None;
        }
        pos += 1 + fraction;
        shape = NumberShape::Float;
    }
    if matches!(bytes.get(pos), Some(b'e' | b'E')) {
        pos += 1;
        if matches!(bytes.get(pos), Some(b'+' | b'-')) {
            pos += 1;
        }
        let exponent = digits_from(pos);
        if exponent == 0 {
            return None;
        }
        pos += exponent;
        shape = NumberShape::Float;
    }

    (pos == bytes.len()).then_some(shape)
}

/// Parses the quoted string starting at `text[start]` (which must be `"`).
///
/// `base` is the byte offset of `text` within `input`, used for error
/// positions. Returns the unescaped string and the index just past the closing
/// quote.
pub(crate) fn parse_quoted(
    text: &str,
    start: usize,
    base: usize,
    input: &[u8],
) -> Result<(String, usize)> {
    let mut out = String::new();
    let mut chars = text[start + 1..].char_indices().map(|(i, c)| (start + 1 + i, c));

    while let Some((idx, ch)) = chars.next() {
        match ch {
            '"' => return Ok((out, idx + 1)),
            '\\' => {
                let Some((_, escaped)) = chars.next() else {
                    break;
                };
                match escaped {
                    '"' => out.push('"'),
                    '\\' => out.push('\\'),
                    '/' => out.push('/'),
                    'n' => out.push('\n'),
                    'r' => out.push('\r'),
                    't' => out.push('\t'),
                    'b' => out.push('\u{0008}'),
                    'f' => out.push('\u{000C}'),
                    '0' => out.push('\0'),
                    'u' => {
                        let hex: String = chars.by_ref().take(4).map(|(_, c)| c).collect();
                        let decoded = (hex.len() == 4)
                            .then(|| u32::from_str_radix(&hex, 16).ok())
                            .flatten()
                            .and_then(char::from_u32);
                        match decoded {
                            Some(c) => out.push(c),
                            None => {
                                return Err(Error::parse(
                                    input,
                                    base + idx,
                                    ParseErrorKind::InvalidEscape,
                                    "invalid unicode escape",
                                ))
                            }
                        }
                    }
                    other => {
                        return Err(Error::parse(
                            input,
                            base + idx,
                            ParseErrorKind::InvalidEscape,
                            &format!("unknown escape sequence `\\{}`", other),
                        ))
                    }
                }
            }
            c => out.push(c),
        }
    }

    Err(Error::parse(
        input,
        base + start,
        ParseErrorKind::UnterminatedQuote,
        "missing closing quote",
    ))
}

/// Converts a timestamp to its RFC 3339 string value.
#[must_use]
pub fn timestamp_to_value(at: &DateTime<Utc>) -> Value {
    Value::String(at.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

/// Parses an RFC 3339 timestamp, normalizing it to UTC.
#[must_use]
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|at| at.with_timezone(&Utc))
}
