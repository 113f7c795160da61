/// Builds a [`Value`](crate::Value) from a JSON-like literal.
///
/// Map keys must be string literals. Scalars go through `Value::from`, so any
/// type with a `From` impl for `Value` works as a leaf. Negative numbers need
/// parentheses inside sequences and maps: `toon!([1, (-2)])`.
///
/// ```rust
/// use toon_codec::{toon, Value};
///
/// let value = toon!({"name": "Ann", "tags": ["a", "b"], "manager": null});
/// assert_eq!(value.as_map().map(|m| m.len()), Some(3));
/// assert_eq!(toon!([]), Value::Sequence(vec![]));
/// ```
#[macro_export]
macro_rules! toon {
    (null) => {
        $crate::Value::Null
    };

    (true) => {
        $crate::Value::Bool(true)
    };

    (false) => {
        $crate::Value::Bool(false)
    };

    ([]) => {
        $crate::Value::Sequence(vec![])
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::Sequence(vec![$($crate::toon!($elem)),*])
    };

    ({}) => {
        $crate::Value::Map($crate::Map::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut map = $crate::Map::new();
        $(
            map.insert($key.to_string(), $crate::toon!($value));
        )*
        $crate::Value::Map(map)
    }};

    ($other:expr) => {
        $crate::Value::from($other)
    };
}
