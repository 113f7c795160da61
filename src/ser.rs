//! Encoding.
//!
//! Serialization is two steps: any `T: Serialize` is first turned into a
//! [`Value`] by [`ValueSerializer`], then [`Encoder`] walks the tree and writes
//! the text form into a byte buffer. Only the encoder knows the layout rules:
//!
//! - maps are `key: value` lines; nested blocks are indented one level;
//! - scalar sequences of two or more elements go on one line as `a, b, c`;
//! - other sequences put each element on its own `- ` line, and a map element
//!   starts on the marker line (`- key: value`);
//! - empty containers are written `[]` and `{}`.
//!
//! ```rust
//! use toon_codec::to_string;
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Item { sku: String, qty: u32 }
//!
//! #[derive(Serialize)]
//! struct Order { id: u32, tags: Vec<&'static str>, items: Vec<Item> }
//!
//! let order = Order {
//!     id: 7,
//!     tags: vec!["rush", "gift"],
//!     items: vec![
//!         Item { sku: "A1".into(), qty: 2 },
//!         Item { sku: "B2".into(), qty: 1 },
//!     ],
//! };
//!
//! assert_eq!(
//!     to_string(&order).unwrap(),
//!     "id: 7\ntags: rush, gift\nitems:\n  - sku: A1\n    qty: 2\n  - sku: B2\n    qty: 1\n"
//! );
//! ```

use crate::pool::PooledBuffer;
use crate::scalar::{write_scalar, write_string};
use crate::{Error, Map, Result, ToonOptions, Value};
use serde::{ser, Serialize};
use tracing::debug;

/// Writes [`Value`] trees in the text format.
pub struct Encoder<'o> {
    options: &'o ToonOptions,
}

impl<'o> Encoder<'o> {
    pub fn new(options: &'o ToonOptions) -> Self {
        Encoder { options }
    }

    /// Appends the encoding of `value` to `buffer`, returning the bytes written.
    ///
    /// # Errors
    ///
    /// Returns an encode error for non-finite floats, empty map keys and
    /// nesting beyond `max_depth`. On error the buffer is left unchanged.
    pub fn encode(&self, value: &Value, buffer: &mut PooledBuffer) -> Result<usize> {
        self.encode_into(value, buffer.vec_mut())
    }

    /// Appends the encoding of `value` to `out`, returning the bytes written.
    ///
    /// # Errors
    ///
    /// Same as [`Encoder::encode`]; on error `out` is truncated back to its
    /// original length.
    pub fn encode_into(&self, value: &Value, out: &mut Vec<u8>) -> Result<usize> {
        let start = out.len();
        match self.write_root(value, out) {
            Ok(()) => Ok(out.len() - start),
            Err(err) => {
                out.truncate(start);
                debug!(error = %err, "encode failed");
                Err(err)
            }
        }
    }

    fn write_root(&self, value: &Value, out: &mut Vec<u8>) -> Result<()> {
        if self.is_inline(value) {
            self.write_inline(value, 1, out)?;
            out.push(b'\n');
            Ok(())
        } else {
            self.write_block(value, 0, 1, out)
        }
    }

    /// Fails when a container sits deeper than `max_depth`; the root is depth 1.
    fn check_depth(&self, depth: usize) -> Result<()> {
        if depth > self.options.max_depth {
            return Err(Error::encode(format!(
                "nesting depth exceeds the limit of {}",
                self.options.max_depth
            )));
        }
        Ok(())
    }

    /// Values written on the same line as their key or list marker.
    fn is_inline(&self, value: &Value) -> bool {
        match value {
            Value::Sequence(items) => items.is_empty() || self.is_compact(items),
            Value::Map(map) => map.is_empty(),
            _ => true,
        }
    }

    fn is_compact(&self, items: &[Value]) -> bool {
        self.options.compact_lists && items.len() >= 2 && items.iter().all(Value::is_scalar)
    }

    fn write_inline(&self, value: &Value, depth: usize, out: &mut Vec<u8>) -> Result<()> {
        match value {
            Value::Sequence(items) => {
                self.check_depth(depth)?;
                if items.is_empty() {
                    out.extend_from_slice(b"[]");
                }
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.extend_from_slice(b", ");
                    }
                    write_scalar(out, item)?;
                }
            }
            Value::Map(_) => {
                self.check_depth(depth)?;
                out.extend_from_slice(b"{}");
            }
            scalar => write_scalar(out, scalar)?,
        }
        Ok(())
    }

    fn write_block(&self, value: &Value, column: usize, depth: usize, out: &mut Vec<u8>) -> Result<()> {
        match value {
            Value::Map(map) if !map.is_empty() => {
                self.check_depth(depth)?;
                self.write_map(map, column, false, depth, out)
            }
            Value::Sequence(items) if !self.is_inline(value) => {
                self.check_depth(depth)?;
                self.write_sequence(items, column, depth, out)
            }
            inline => {
                write_indent(out, column);
                self.write_inline(inline, depth, out)?;
                out.push(b'\n');
                Ok(())
            }
        }
    }

    /// Writes map entries at `column`. With `continues_line` the first entry
    /// follows a list marker already written on the current line.
    fn write_map(
        &self,
        map: &Map,
        column: usize,
        continues_line: bool,
        depth: usize,
        out: &mut Vec<u8>,
    ) -> Result<()> {
        for (i, (key, value)) in map.iter().enumerate() {
            if i > 0 || !continues_line {
                write_indent(out, column);
            }
            if key.is_empty() {
                return Err(Error::encode("map keys must be non-empty strings"));
            }
            write_string(out, key);
            out.push(b':');

            if self.is_inline(value) {
                out.push(b' ');
                self.write_inline(value, depth + 1, out)?;
                out.push(b'\n');
            } else {
                out.push(b'\n');
                self.write_block(value, column + self.options.indent_width(), depth + 1, out)?;
            }
        }
        Ok(())
    }

    fn write_sequence(&self, items: &[Value], column: usize, depth: usize, out: &mut Vec<u8>) -> Result<()> {
        for item in items {
            write_indent(out, column);
            out.push(b'-');
            match item {
                Value::Map(map) if !map.is_empty() => {
                    self.check_depth(depth + 1)?;
                    out.push(b' ');
                    self.write_map(map, column + 2, true, depth + 1, out)?;
                }
                inline if self.is_inline(inline) => {
                    out.push(b' ');
                    self.write_inline(inline, depth + 1, out)?;
                    out.push(b'\n');
                }
                nested => {
                    out.push(b'\n');
                    self.write_block(nested, column + self.options.indent_width(), depth + 1, out)?;
                }
            }
        }
        Ok(())
    }
}

fn write_indent(out: &mut Vec<u8>, column: usize) {
    out.resize(out.len() + column, b' ');
}

/// Converts any `T: Serialize` into a [`Value`].
///
/// Enum variants carrying data become single-entry maps keyed by the variant
/// name; unit variants become strings.
pub struct ValueSerializer {
    depth: usize,
    max_depth: usize,
}

impl ValueSerializer {
    pub fn new(options: &ToonOptions) -> Self {
        ValueSerializer {
            depth: 0,
            max_depth: options.max_depth,
        }
    }

    /// Serializer for a value nested one container deeper.
    fn nested(&self) -> Result<ValueSerializer> {
        if self.depth >= self.max_depth {
            return Err(Error::encode(format!(
                "nesting depth exceeds the limit of {} (self-referential value?)",
                self.max_depth
            )));
        }
        Ok(ValueSerializer {
            depth: self.depth + 1,
            max_depth: self.max_depth,
        })
    }
}

pub struct SerializeVec {
    vec: Vec<Value>,
    inner: ValueSerializer,
    variant: Option<&'static str>,
}

pub struct SerializeMap {
    map: Map,
    current_key: Option<String>,
    inner: ValueSerializer,
    variant: Option<&'static str>,
}

fn wrap_variant(variant: Option<&'static str>, value: Value) -> Value {
    match variant {
        Some(name) => {
            let mut map = Map::with_capacity(1);
            map.insert(name.to_string(), value);
            Value::Map(map)
        }
        None => value,
    }
}

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = Error;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeVec;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeMap;
    type SerializeStructVariant = SerializeMap;

    fn serialize_bool(self, v: bool) -> Result<Value> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value> {
        Ok(Value::Integer(i64::from(v)))
    }

    fn serialize_i16(self, v: i16) -> Result<Value> {
        Ok(Value::Integer(i64::from(v)))
    }

    fn serialize_i32(self, v: i32) -> Result<Value> {
        Ok(Value::Integer(i64::from(v)))
    }

    fn serialize_i64(self, v: i64) -> Result<Value> {
        Ok(Value::Integer(v))
    }

    fn serialize_u8(self, v: u8) -> Result<Value> {
        Ok(Value::Integer(i64::from(v)))
    }

    fn serialize_u16(self, v: u16) -> Result<Value> {
        Ok(Value::Integer(i64::from(v)))
    }

    fn serialize_u32(self, v: u32) -> Result<Value> {
        Ok(Value::Integer(i64::from(v)))
    }

    fn serialize_u64(self, v: u64) -> Result<Value> {
        i64::try_from(v)
            .map(Value::Integer)
            .map_err(|_| Error::encode(format!("integer {} is out of range for i64", v)))
    }

    fn serialize_f32(self, v: f32) -> Result<Value> {
        Ok(Value::Float(f64::from(v)))
    }

    fn serialize_f64(self, v: f64) -> Result<Value> {
        Ok(Value::Float(v))
    }

    fn serialize_char(self, v: char) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value> {
        Ok(Value::Sequence(
            v.iter().map(|&b| Value::Integer(i64::from(b))).collect(),
        ))
    }

    fn serialize_none(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value> {
        Ok(Value::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        let inner = value.serialize(self.nested()?)?;
        Ok(wrap_variant(Some(variant), inner))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec> {
        Ok(SerializeVec {
            vec: Vec::with_capacity(len.unwrap_or(0)),
            inner: self.nested()?,
            variant: None,
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeVec> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeVec> {
        let mut seq = self.nested()?.serialize_seq(Some(len))?;
        seq.variant = Some(variant);
        Ok(seq)
    }

    fn serialize_map(self, len: Option<usize>) -> Result<SerializeMap> {
        Ok(SerializeMap {
            map: Map::with_capacity(len.unwrap_or(0)),
            current_key: None,
            inner: self.nested()?,
            variant: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<SerializeMap> {
        self.serialize_map(Some(len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeMap> {
        let mut map = self.nested()?.serialize_map(Some(len))?;
        map.variant = Some(variant);
        Ok(map)
    }
}

impl SerializeVec {
    fn push<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        let inner = ValueSerializer {
            depth: self.inner.depth,
            max_depth: self.inner.max_depth,
        };
        self.vec.push(value.serialize(inner)?);
        Ok(())
    }

    fn finish(self) -> Value {
        wrap_variant(self.variant, Value::Sequence(self.vec))
    }
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleVariant for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl SerializeMap {
    fn value_of<T: ?Sized + Serialize>(&self, value: &T) -> Result<Value> {
        value.serialize(ValueSerializer {
            depth: self.inner.depth,
            max_depth: self.inner.max_depth,
        })
    }

    fn finish(self) -> Value {
        wrap_variant(self.variant, Value::Map(self.map))
    }
}

impl ser::SerializeMap for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        match self.value_of(key)? {
            Value::String(s) => {
                self.current_key = Some(s);
                Ok(())
            }
            Value::Integer(i) => {
                self.current_key = Some(i.to_string());
                Ok(())
            }
            other => Err(Error::encode(format!(
                "map keys must be strings, found {}",
                other.kind()
            ))),
        }
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .current_key
            .take()
            .ok_or_else(|| Error::encode("serialize_value called without serialize_key"))?;
        let value = self.value_of(value)?;
        self.map.insert(key, value);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeStruct for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let value = self.value_of(value)?;
        self.map.insert(key.to_string(), value);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeStructVariant for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let value = self.value_of(value)?;
        self.map.insert(key.to_string(), value);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}
