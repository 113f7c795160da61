//! # toon_codec
//!
//! A compact, indentation-based text codec with serde bindings.
//!
//! The format spends as few characters as possible on structure: maps are
//! `key: value` lines, nesting is indentation, short scalar lists sit on one
//! line and strings go unquoted unless they would otherwise be ambiguous. That
//! makes it cheap to send structured data through size- or token-metered
//! channels while staying readable.
//!
//! ## Quick Start
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use toon_codec::{from_str, to_string};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct User {
//!     id: u32,
//!     name: String,
//!     active: bool,
//!     tags: Vec<String>,
//! }
//!
//! let user = User {
//!     id: 1,
//!     name: "Ann".to_string(),
//!     active: true,
//!     tags: vec!["a".to_string(), "b".to_string()],
//! };
//!
//! let text = to_string(&user).unwrap();
//! assert_eq!(text, "id: 1\nname: Ann\nactive: true\ntags: a, b\n");
//!
//! let back: User = from_str(&text).unwrap();
//! assert_eq!(user, back);
//! ```
//!
//! ## Layers
//!
//! - [`ser`]: `T: Serialize` to [`Value`], and [`Value`] to text.
//! - [`de`]: text to a [`Document`] holding a [`Value`] tree.
//! - [`bind`]: [`Value`] to `T: DeserializeOwned`, with field paths in errors.
//! - [`pool`]: reusable output buffers so repeated encodes don't allocate.
//! - [`scalar`]: quoting rules and scalar token classification.
//!
//! The [`format`] module describes the text format itself.
//!
//! ## Reusing buffers
//!
//! ```rust
//! use toon_codec::{to_buffer, pool::PooledBuffer};
//!
//! let mut buffer = PooledBuffer::new();
//! for n in 0..3 {
//!     buffer.clear();
//!     to_buffer(&mut buffer, &vec![n, n + 1]).unwrap();
//! }
//! assert_eq!(buffer.as_bytes(), b"2, 3\n");
//! ```
//!
//! ## Dynamic values
//!
//! ```rust
//! use toon_codec::{decode, toon};
//!
//! let value = decode(b"user:\n  name: Ann\n  roles: admin, ops\n").unwrap();
//! assert_eq!(value, toon!({"user": {"name": "Ann", "roles": ["admin", "ops"]}}));
//! ```

pub mod bind;
pub mod de;
pub mod error;
pub mod format;
pub mod macros;
pub mod map;
pub mod options;
pub mod pool;
pub mod scalar;
pub mod ser;
pub mod value;

pub use bind::from_value;
pub use de::{parse_document, Document};
pub use error::{BindReason, Error, ParseErrorKind, Result};
pub use map::Map;
pub use options::ToonOptions;
pub use pool::PooledBuffer;
pub use ser::{Encoder, ValueSerializer};
pub use value::{Kind, Value};

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;
use tracing::debug;

/// Converts any `T: Serialize` into a [`Value`].
///
/// # Errors
///
/// Returns an encode error for integers above `i64::MAX`, non-string map keys
/// and nesting beyond the default depth limit.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_value<T>(value: &T) -> Result<Value>
where
    T: ?Sized + Serialize,
{
    value.serialize(ValueSerializer::new(&ToonOptions::default()))
}

/// Encodes a [`Value`] into `buffer`, returning the number of bytes written.
///
/// The buffer is appended to, not cleared. On error nothing is appended.
///
/// # Errors
///
/// Returns an encode error for non-finite floats, empty map keys and nesting
/// beyond the default depth limit.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn encode_value(value: &Value, buffer: &mut PooledBuffer) -> Result<usize> {
    Encoder::new(&ToonOptions::default()).encode(value, buffer)
}

/// Serializes `value` into `buffer`, returning the number of bytes written.
///
/// # Examples
///
/// ```rust
/// use toon_codec::{to_buffer, pool::PooledBuffer};
///
/// let mut buffer = PooledBuffer::new();
/// let written = to_buffer(&mut buffer, &("x", 1)).unwrap();
/// assert_eq!(buffer.as_bytes(), b"x, 1\n");
/// assert_eq!(written, 5);
/// ```
///
/// # Errors
///
/// Returns an encode error if the value cannot be represented; the buffer is
/// left as it was.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_buffer<T>(buffer: &mut PooledBuffer, value: &T) -> Result<usize>
where
    T: ?Sized + Serialize,
{
    to_buffer_with_options(buffer, value, &ToonOptions::default())
}

/// Serializes `value` into `buffer` with custom options.
///
/// # Errors
///
/// Same as [`to_buffer`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_buffer_with_options<T>(buffer: &mut PooledBuffer, value: &T, options: &ToonOptions) -> Result<usize>
where
    T: ?Sized + Serialize,
{
    let value = value.serialize(ValueSerializer::new(options))?;
    Encoder::new(options).encode(&value, buffer)
}

/// Serializes `value` to a byte vector.
///
/// Encoding goes through a buffer leased from the process-wide pool; the
/// result is an exact-size copy.
///
/// # Errors
///
/// Returns an encode error if the value cannot be represented.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_vec<T>(value: &T) -> Result<Vec<u8>>
where
    T: ?Sized + Serialize,
{
    to_vec_with_options(value, &ToonOptions::default())
}

/// Serializes `value` to a byte vector with custom options.
///
/// # Errors
///
/// Returns an encode error if the value cannot be represented.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_vec_with_options<T>(value: &T, options: &ToonOptions) -> Result<Vec<u8>>
where
    T: ?Sized + Serialize,
{
    let mut buffer = PooledBuffer::new();
    to_buffer_with_options(&mut buffer, value, options)?;
    let bytes = buffer.to_vec();
    buffer.release();
    Ok(bytes)
}

/// Serializes `value` to a string.
///
/// # Examples
///
/// ```rust
/// use toon_codec::to_string;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32 }
///
/// assert_eq!(to_string(&Point { x: 1, y: 2 }).unwrap(), "x: 1\ny: 2\n");
/// ```
///
/// # Errors
///
/// Returns an encode error if the value cannot be represented.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string<T>(value: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    to_string_with_options(value, &ToonOptions::default())
}

/// Serializes `value` to a string with custom options.
///
/// # Errors
///
/// Returns an encode error if the value cannot be represented.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_with_options<T>(value: &T, options: &ToonOptions) -> Result<String>
where
    T: ?Sized + Serialize,
{
    let bytes = to_vec_with_options(value, options)?;
    String::from_utf8(bytes).map_err(Error::encode)
}

/// Serializes `value` into an I/O stream.
///
/// # Errors
///
/// Returns an error if encoding fails or writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W, T>(writer: W, value: &T) -> Result<()>
where
    W: io::Write,
    T: ?Sized + Serialize,
{
    to_writer_with_options(writer, value, &ToonOptions::default())
}

/// Serializes `value` into an I/O stream with custom options.
///
/// # Errors
///
/// Returns an error if encoding fails or writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer_with_options<W, T>(mut writer: W, value: &T, options: &ToonOptions) -> Result<()>
where
    W: io::Write,
    T: ?Sized + Serialize,
{
    let mut buffer = PooledBuffer::new();
    to_buffer_with_options(&mut buffer, value, options)?;
    writer
        .write_all(buffer.as_bytes())
        .map_err(|e| Error::io(&e.to_string()))
}

/// Decodes text into a [`Value`] tree.
///
/// # Errors
///
/// Returns a parse error with the byte offset of the first problem.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn decode(bytes: &[u8]) -> Result<Value> {
    parse_document(bytes, &ToonOptions::default()).map(Document::into_value)
}

/// Decodes bytes and binds them to `T`.
///
/// # Examples
///
/// ```rust
/// use toon_codec::from_slice;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, PartialEq, Debug)]
/// struct Point { x: i32, y: i32 }
///
/// let point: Point = from_slice(b"x: 1\ny: 2\n").unwrap();
/// assert_eq!(point, Point { x: 1, y: 2 });
/// ```
///
/// # Errors
///
/// Returns a parse error if the text is malformed, or a bind error naming the
/// field path if the decoded tree does not fit `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice<T>(bytes: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    from_slice_with_options(bytes, &ToonOptions::default())
}

/// Decodes bytes with custom options and binds them to `T`.
///
/// # Errors
///
/// Same as [`from_slice`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice_with_options<T>(bytes: &[u8], options: &ToonOptions) -> Result<T>
where
    T: DeserializeOwned,
{
    let result = parse_document(bytes, options).and_then(|doc| from_value(doc.into_value()));
    if let Err(err) = &result {
        debug!(error = %err, input_len = bytes.len(), "decode failed");
    }
    result
}

/// Decodes a string and binds it to `T`.
///
/// # Errors
///
/// Same as [`from_slice`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str<T>(s: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    from_slice(s.as_bytes())
}

/// Reads an I/O stream to the end, then decodes and binds it to `T`.
///
/// # Examples
///
/// ```rust
/// use toon_codec::from_reader;
/// use serde::Deserialize;
/// use std::io::Cursor;
///
/// #[derive(Deserialize, PartialEq, Debug)]
/// struct Point { x: i32, y: i32 }
///
/// let point: Point = from_reader(Cursor::new(b"x: 1\ny: 2\n")).unwrap();
/// assert_eq!(point, Point { x: 1, y: 2 });
/// ```
///
/// # Errors
///
/// Returns an I/O error if reading fails, otherwise the same as [`from_slice`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R, T>(mut reader: R) -> Result<T>
where
    R: io::Read,
    T: DeserializeOwned,
{
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| Error::io(&e.to_string()))?;
    from_slice(&bytes)
}

/// Decodes bytes into an untyped [`Map`].
///
/// # Errors
///
/// Returns a parse error if the text is malformed, or a bind error if the root
/// is not a map.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice_to_map(bytes: &[u8]) -> Result<Map> {
    decode(bytes).and_then(bind::into_root_map)
}
