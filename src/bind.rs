//! Binding decoded trees to typed values.
//!
//! Decoding produces a [`Value`]; binding walks that tree with a serde
//! [`Deserializer`](serde::Deserializer) so any `T: DeserializeOwned` can be
//! built from it. The type's own `Deserialize` impl is its shape description:
//! declared fields, optional fields (`Option<T>` or `#[serde(default)]`) and
//! nested types all come from serde derive.
//!
//! Binding rules:
//!
//! - map entries without a matching field are ignored unless the type opts into
//!   `#[serde(deny_unknown_fields)]`;
//! - an integer binds to a float field, never the reverse;
//! - `null` binds to `Option` fields and unit;
//! - strings holding RFC 3339 timestamps bind to `chrono::DateTime`.
//!
//! Errors carry the path to the offending value:
//!
//! ```rust
//! use serde::Deserialize;
//! use toon_codec::from_str;
//!
//! #[derive(Debug, Deserialize)]
//! struct Line { sku: String, qty: u32 }
//!
//! #[derive(Debug, Deserialize)]
//! struct Order { lines: Vec<Line> }
//!
//! let err = from_str::<Order>("lines:\n  - sku: A\n    qty: 1\n  - sku: B\n    qty: many\n")
//!     .unwrap_err();
//! assert_eq!(err.path(), Some("lines[1].qty"));
//! ```

use crate::{Error, Map, Result, Value};
use serde::de::value::StrDeserializer;
use serde::de::{self, DeserializeOwned, IntoDeserializer, Unexpected};
use serde::forward_to_deserialize_any;

/// Binds an owned [`Value`] to `T`.
///
/// # Errors
///
/// Returns a bind error naming the path of the first value that does not fit.
pub fn from_value<T>(value: Value) -> Result<T>
where
    T: DeserializeOwned,
{
    T::deserialize(ValueDeserializer::new(value))
}

/// Returns `value` as a map, or a bind error if the root is anything else.
pub(crate) fn into_root_map(value: Value) -> Result<Map> {
    match value {
        Value::Map(map) => Ok(map),
        other => Err(Error::type_mismatch("map", other.kind().as_str())),
    }
}

fn unexpected(value: &Value) -> Unexpected<'_> {
    match value {
        Value::Null => Unexpected::Unit,
        Value::Bool(b) => Unexpected::Bool(*b),
        Value::Integer(i) => Unexpected::Signed(*i),
        Value::Float(f) => Unexpected::Float(*f),
        Value::String(s) => Unexpected::Str(s),
        Value::Sequence(_) => Unexpected::Seq,
        Value::Map(_) => Unexpected::Map,
    }
}

/// A serde deserializer over an owned [`Value`].
pub struct ValueDeserializer {
    value: Value,
}

impl ValueDeserializer {
    pub fn new(value: Value) -> Self {
        ValueDeserializer { value }
    }
}

impl<'de> de::Deserializer<'de> for ValueDeserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(b),
            Value::Integer(i) => visitor.visit_i64(i),
            Value::Float(f) => visitor.visit_f64(f),
            Value::String(s) => visitor.visit_string(s),
            Value::Sequence(items) => visit_sequence(items, visitor),
            Value::Map(map) => visitor.visit_map(MapDeserializer::new(map)),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Null => visitor.visit_none(),
            value => visitor.visit_some(ValueDeserializer::new(value)),
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Map(map) => visitor.visit_map(MapDeserializer::new(map)),
            other => Err(de::Error::invalid_type(unexpected(&other), &visitor)),
        }
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::String(variant) => visitor.visit_enum(EnumDeserializer {
                variant,
                value: None,
            }),
            Value::Map(map) if map.len() == 1 => {
                let mut entries = map.into_iter();
                match entries.next() {
                    Some((variant, value)) => visitor.visit_enum(EnumDeserializer {
                        variant,
                        value: Some(value),
                    }),
                    None => Err(Error::type_mismatch("enum variant", "map")),
                }
            }
            other => Err(Error::type_mismatch(
                "string or single-entry map",
                other.kind().as_str(),
            )),
        }
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_unit()
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple tuple_struct map identifier
    }
}

fn visit_sequence<'de, V>(items: Vec<Value>, visitor: V) -> Result<V::Value>
where
    V: de::Visitor<'de>,
{
    let len = items.len();
    let mut seq = SeqDeserializer::new(items);
    let value = visitor.visit_seq(&mut seq)?;
    if seq.iter.len() == 0 {
        Ok(value)
    } else {
        Err(de::Error::invalid_length(len, &"fewer elements in sequence"))
    }
}

struct SeqDeserializer {
    iter: std::vec::IntoIter<Value>,
    index: usize,
}

impl SeqDeserializer {
    fn new(items: Vec<Value>) -> Self {
        SeqDeserializer {
            iter: items.into_iter(),
            index: 0,
        }
    }
}

impl<'de> de::SeqAccess<'de> for SeqDeserializer {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        let Some(value) = self.iter.next() else {
            return Ok(None);
        };
        let index = self.index;
        self.index += 1;
        seed.deserialize(ValueDeserializer::new(value))
            .map(Some)
            .map_err(|err| err.in_element(index))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct MapDeserializer {
    iter: indexmap::map::IntoIter<String, Value>,
    entry: Option<(String, Value)>,
}

impl MapDeserializer {
    fn new(map: Map) -> Self {
        MapDeserializer {
            iter: map.into_iter(),
            entry: None,
        }
    }
}

impl<'de> de::MapAccess<'de> for MapDeserializer {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        let Some((key, value)) = self.iter.next() else {
            return Ok(None);
        };
        let field = seed
            .deserialize(KeyDeserializer { key: &key })
            .map_err(|err| err.in_field(&key))?;
        self.entry = Some((key, value));
        Ok(Some(field))
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.entry.take() {
            Some((key, value)) => seed
                .deserialize(ValueDeserializer::new(value))
                .map_err(|err| err.in_field(&key)),
            None => Err(de::Error::custom("value requested before key")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

/// Deserializes a map key. Keys are always strings in the text; integer
/// targets parse them, so `BTreeMap<u32, _>` survives a round trip.
struct KeyDeserializer<'a> {
    key: &'a str,
}

macro_rules! deserialize_integer_key {
    ($($method:ident => $visit:ident($ty:ty)),* $(,)?) => {
        $(
            fn $method<V>(self, visitor: V) -> Result<V::Value>
            where
                V: de::Visitor<'de>,
            {
                match self.key.parse::<$ty>() {
                    Ok(n) => visitor.$visit(n),
                    Err(_) => Err(de::Error::invalid_type(Unexpected::Str(self.key), &visitor)),
                }
            }
        )*
    };
}

impl<'de, 'a> de::Deserializer<'de> for KeyDeserializer<'a> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_str(self.key)
    }

    deserialize_integer_key! {
        deserialize_i8 => visit_i8(i8),
        deserialize_i16 => visit_i16(i16),
        deserialize_i32 => visit_i32(i32),
        deserialize_i64 => visit_i64(i64),
        deserialize_u8 => visit_u8(u8),
        deserialize_u16 => visit_u16(u16),
        deserialize_u32 => visit_u32(u32),
        deserialize_u64 => visit_u64(u64),
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let variant: StrDeserializer<'_, Error> = self.key.into_deserializer();
        visitor.visit_enum(variant)
    }

    forward_to_deserialize_any! {
        bool i128 u128 f32 f64 char str string bytes byte_buf option unit
        unit_struct seq tuple tuple_struct map struct identifier ignored_any
    }
}

struct EnumDeserializer {
    variant: String,
    value: Option<Value>,
}

impl<'de> de::EnumAccess<'de> for EnumDeserializer {
    type Error = Error;
    type Variant = VariantDeserializer;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let variant_de: StrDeserializer<'_, Error> = self.variant.as_str().into_deserializer();
        let variant = seed.deserialize(variant_de)?;
        Ok((
            variant,
            VariantDeserializer {
                name: self.variant,
                value: self.value,
            },
        ))
    }
}

struct VariantDeserializer {
    name: String,
    value: Option<Value>,
}

impl<'de> de::VariantAccess<'de> for VariantDeserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            None | Some(Value::Null) => Ok(()),
            Some(other) => Err(Error::type_mismatch("unit variant", other.kind().as_str())),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.value {
            Some(value) => seed
                .deserialize(ValueDeserializer::new(value))
                .map_err(|err| err.in_field(&self.name)),
            None => Err(Error::type_mismatch("newtype variant", "string")),
        }
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(Value::Sequence(items)) => {
                visit_sequence(items, visitor).map_err(|err| err.in_field(&self.name))
            }
            Some(other) => Err(Error::type_mismatch("tuple variant", other.kind().as_str())),
            None => Err(Error::type_mismatch("tuple variant", "string")),
        }
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(Value::Map(map)) => visitor
                .visit_map(MapDeserializer::new(map))
                .map_err(|err| err.in_field(&self.name)),
            Some(other) => Err(Error::type_mismatch("struct variant", other.kind().as_str())),
            None => Err(Error::type_mismatch("struct variant", "string")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{toon, BindReason};
    use serde::Deserialize;
    use std::collections::BTreeMap;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Address {
        city: String,
        zip: Option<String>,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Customer {
        name: String,
        score: f64,
        address: Address,
        #[serde(default)]
        tags: Vec<String>,
    }

    #[test]
    fn test_struct_binding() {
        let value = toon!({
            "name": "Ann",
            "score": 7,
            "address": {"city": "Oslo"},
            "extra": [1, 2]
        });
        let customer: Customer = from_value(value).unwrap();
        assert_eq!(
            customer,
            Customer {
                name: "Ann".to_string(),
                score: 7.0,
                address: Address {
                    city: "Oslo".to_string(),
                    zip: None,
                },
                tags: vec![],
            }
        );
    }

    #[test]
    fn test_missing_nested_field_path() {
        let value = toon!({"name": "Ann", "score": 1.5, "address": {"zip": "0150"}});
        let err = from_value::<Customer>(value).unwrap_err();
        assert_eq!(err.path(), Some("address.city"));
        assert!(matches!(
            err,
            Error::Bind {
                reason: BindReason::MissingField,
                ..
            }
        ));
    }

    #[test]
    fn test_type_mismatch_path() {
        let value = toon!({"name": "Ann", "score": 1.5, "address": {"city": "Oslo"}, "tags": ["a", 2]});
        let err = from_value::<Customer>(value).unwrap_err();
        assert_eq!(err.path(), Some("tags[1]"));
    }

    #[test]
    fn test_float_does_not_bind_to_integer() {
        let err = from_value::<i32>(Value::Float(1.5)).unwrap_err();
        assert!(err.is_bind());
        assert_eq!(from_value::<f32>(Value::Integer(3)).unwrap(), 3.0);
    }

    #[test]
    fn test_integer_range() {
        assert!(from_value::<u8>(Value::Integer(300)).is_err());
        assert!(from_value::<u8>(Value::Integer(-1)).is_err());
        assert_eq!(from_value::<u8>(Value::Integer(255)).unwrap(), 255);
    }

    #[test]
    fn test_struct_from_non_map() {
        let err = from_value::<Address>(toon!([1, 2])).unwrap_err();
        assert!(matches!(
            err,
            Error::Bind {
                reason: BindReason::TypeMismatch { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_enums() {
        #[derive(Debug, Deserialize, PartialEq)]
        enum Event {
            Ping,
            Move(i32, i32),
            Rename { to: String },
            Score(u32),
        }

        assert_eq!(from_value::<Event>(Value::from("Ping")).unwrap(), Event::Ping);
        assert_eq!(from_value::<Event>(toon!({"Move": [1, 2]})).unwrap(), Event::Move(1, 2));
        assert_eq!(
            from_value::<Event>(toon!({"Rename": {"to": "b"}})).unwrap(),
            Event::Rename { to: "b".to_string() }
        );
        let err = from_value::<Event>(toon!({"Score": "high"})).unwrap_err();
        assert_eq!(err.path(), Some("Score"));
    }

    #[test]
    fn test_tuple_length_checked() {
        assert_eq!(from_value::<(i32, i32)>(toon!([1, 2])).unwrap(), (1, 2));
        assert!(from_value::<(i32, i32)>(toon!([1, 2, 3])).is_err());
    }

    #[test]
    fn test_deny_unknown_fields() {
        #[derive(Debug, Deserialize)]
        #[serde(deny_unknown_fields)]
        #[allow(dead_code)]
        struct Strict {
            a: i32,
        }

        assert!(from_value::<Strict>(toon!({"a": 1, "b": 2})).is_err());
    }

    #[test]
    fn test_into_generic_map() {
        let map: BTreeMap<String, i64> = from_value(toon!({"b": 2, "a": 1})).unwrap();
        assert_eq!(map.into_iter().collect::<Vec<_>>(), vec![("a".to_string(), 1), ("b".to_string(), 2)]);
    }

    #[test]
    fn test_integer_and_enum_keys() {
        #[derive(Debug, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
        enum Slot {
            Early,
            Late,
        }

        let ids: BTreeMap<u32, String> = from_value(toon!({"2": "b", "10": "a"})).unwrap();
        assert_eq!(ids.keys().copied().collect::<Vec<_>>(), vec![2, 10]);

        let signed: BTreeMap<i64, bool> = from_value(toon!({"-4": true})).unwrap();
        assert_eq!(signed.get(&-4), Some(&true));

        let slots: BTreeMap<Slot, i32> = from_value(toon!({"Late": 1, "Early": 2})).unwrap();
        assert_eq!(slots.keys().collect::<Vec<_>>(), vec![&Slot::Early, &Slot::Late]);
    }

    #[test]
    fn test_bad_key_path() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Holder {
            m: BTreeMap<u8, i32>,
        }

        let err = from_value::<Holder>(toon!({"m": {"1": 1, "x": 2}})).unwrap_err();
        assert_eq!(err.path(), Some("m.x"));

        let err = from_value::<BTreeMap<u8, i32>>(toon!({"300": 1})).unwrap_err();
        assert_eq!(err.path(), Some("300"));
        assert!(matches!(
            err,
            Error::Bind {
                reason: BindReason::TypeMismatch { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_root_map_required() {
        let err = into_root_map(toon!([1, 2])).unwrap_err();
        assert_eq!(err, Error::type_mismatch("map", "sequence"));
        assert_eq!(into_root_map(toon!({"a": 1})).unwrap().len(), 1);
    }
}
