use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use toon_codec::{
    decode, from_reader, from_slice, from_slice_to_map, from_str, to_string, to_value, to_vec,
    to_writer, toon, BindReason, Error, Value,
};

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct User {
    id: u32,
    name: String,
    active: bool,
    tags: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Product {
    sku: String,
    price: f64,
    quantity: u32,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Order {
    order_id: u32,
    customer: User,
    items: Vec<Product>,
    total: f64,
    note: Option<String>,
}

fn alice() -> User {
    User {
        id: 123,
        name: "Alice".to_string(),
        active: true,
        tags: vec!["admin".to_string(), "developer".to_string()],
    }
}

fn order() -> Order {
    Order {
        order_id: 12345,
        customer: User {
            tags: vec!["vip".to_string()],
            ..alice()
        },
        items: vec![
            Product {
                sku: "WIDGET-001".to_string(),
                price: 29.99,
                quantity: 2,
            },
            Product {
                sku: "GADGET-002".to_string(),
                price: 49.99,
                quantity: 1,
            },
        ],
        total: 109.97,
        note: None,
    }
}

#[test]
fn test_simple_struct_text() {
    let user = User {
        id: 1,
        name: "Ann".to_string(),
        active: true,
        tags: vec!["a".to_string(), "b".to_string()],
    };
    assert_eq!(
        to_string(&user).unwrap(),
        "id: 1\nname: Ann\nactive: true\ntags: a, b\n"
    );
}

#[test]
fn test_nested_struct_round_trip() {
    let text = to_string(&order()).unwrap();
    assert_eq!(
        text,
        "order_id: 12345\n\
         customer:\n  id: 123\n  name: Alice\n  active: true\n  tags:\n    - vip\n\
         items:\n  - sku: WIDGET-001\n    price: 29.99\n    quantity: 2\n\
         \x20 - sku: GADGET-002\n    price: 49.99\n    quantity: 1\n\
         total: 109.97\n\
         note: null\n"
    );
    assert_eq!(from_str::<Order>(&text).unwrap(), order());
}

#[test]
fn test_strings_needing_quotes_round_trip() {
    let tags = vec![
        String::new(),
        "true".to_string(),
        "42".to_string(),
        "a, b".to_string(),
        "key: value".to_string(),
        " padded ".to_string(),
        "- item".to_string(),
        "line\nbreak".to_string(),
        "say \"hi\"".to_string(),
        "[]".to_string(),
        "héllo wörld".to_string(),
    ];
    let user = User {
        tags,
        ..alice()
    };
    let text = to_string(&user).unwrap();
    assert_eq!(from_str::<User>(&text).unwrap(), user);
}

#[test]
fn test_missing_field_path() {
    let err = from_str::<User>("id: 1\nactive: true\ntags: []\n").unwrap_err();
    assert_eq!(err.path(), Some("name"));
    assert!(matches!(
        err,
        Error::Bind {
            reason: BindReason::MissingField,
            ..
        }
    ));
}

#[test]
fn test_nested_error_paths() {
    let text = to_string(&order())
        .unwrap()
        .replace("quantity: 1", "quantity: lots");
    let err = from_str::<Order>(&text).unwrap_err();
    assert_eq!(err.path(), Some("items[1].quantity"));

    let text = to_string(&order()).unwrap().replace("  name: Alice\n", "");
    let err = from_str::<Order>(&text).unwrap_err();
    assert_eq!(err.path(), Some("customer.name"));
}

#[test]
fn test_unknown_fields_ignored() {
    let text = "id: 5\nname: Bo\nactive: false\ntags: x, y\nextra:\n  deep: 1\n";
    let user: User = from_str(text).unwrap();
    assert_eq!(user.id, 5);
    assert_eq!(user.tags, vec!["x", "y"]);
}

#[test]
fn test_optional_fields() {
    #[derive(Deserialize, Debug, PartialEq)]
    struct Settings {
        name: String,
        limit: Option<u32>,
        #[serde(default)]
        verbose: bool,
    }

    let settings: Settings = from_str("name: fast\n").unwrap();
    assert_eq!(
        settings,
        Settings {
            name: "fast".to_string(),
            limit: None,
            verbose: false
        }
    );

    let settings: Settings = from_str("name: fast\nlimit: 10\nverbose: true\n").unwrap();
    assert_eq!(settings.limit, Some(10));
    assert!(settings.verbose);
}

#[test]
fn test_integer_widens_to_float_field() {
    #[derive(Deserialize)]
    struct Price {
        amount: f64,
    }
    let price: Price = from_str("amount: 3\n").unwrap();
    assert_eq!(price.amount, 3.0);

    #[derive(Deserialize, Debug)]
    #[allow(dead_code)]
    struct Count {
        n: u32,
    }
    assert!(from_str::<Count>("n: 3.5\n").unwrap_err().is_bind());
}

#[test]
fn test_timestamp_field() {
    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Event {
        name: String,
        at: DateTime<Utc>,
    }

    let event = Event {
        name: "deploy".to_string(),
        at: Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap(),
    };
    let text = to_string(&event).unwrap();
    assert_eq!(text, "name: deploy\nat: \"2024-01-15T10:30:00Z\"\n");
    assert_eq!(from_str::<Event>(&text).unwrap(), event);

    let value = decode(text.as_bytes()).unwrap();
    let at = value.as_map().and_then(|m| m.get("at")).and_then(Value::as_timestamp);
    assert_eq!(at, Some(event.at));
}

#[test]
fn test_enums() {
    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    enum Status {
        Active,
        Suspended { reason: String },
        Scored(u32),
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Account {
        statuses: Vec<Status>,
    }

    let account = Account {
        statuses: vec![
            Status::Active,
            Status::Suspended {
                reason: "fraud".to_string(),
            },
            Status::Scored(9),
        ],
    };
    let text = to_string(&account).unwrap();
    assert_eq!(
        text,
        "statuses:\n  - Active\n  - Suspended:\n      reason: fraud\n  - Scored: 9\n"
    );
    assert_eq!(from_str::<Account>(&text).unwrap(), account);
}

#[test]
fn test_untyped_map() {
    let map = from_slice_to_map(b"zeta: 1\nalpha:\n  - x\n  - y: 2\n").unwrap();
    let keys: Vec<_> = map.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["zeta", "alpha"]);
    assert_eq!(map.get("alpha"), Some(&toon!(["x", {"y": 2}])));

    let err = from_slice_to_map(b"just text\n").unwrap_err();
    assert!(err.is_bind());
}

#[test]
fn test_generic_collections() {
    let mut scores = BTreeMap::new();
    scores.insert("ann".to_string(), 3);
    scores.insert("bo".to_string(), 5);
    let text = to_string(&scores).unwrap();
    assert_eq!(text, "ann: 3\nbo: 5\n");
    assert_eq!(from_str::<BTreeMap<String, i32>>(&text).unwrap(), scores);

    let nested = vec![vec![1, 2], vec![], vec![3]];
    let text = to_string(&nested).unwrap();
    assert_eq!(text, "- 1, 2\n- []\n-\n  - 3\n");
    assert_eq!(from_str::<Vec<Vec<i32>>>(&text).unwrap(), nested);
}

#[test]
fn test_integer_keyed_maps_round_trip() {
    let mut names = BTreeMap::new();
    names.insert(1u32, "a".to_string());
    names.insert(2u32, "b".to_string());
    let text = to_string(&names).unwrap();
    assert_eq!(text, "\"1\": a\n\"2\": b\n");
    assert_eq!(from_str::<BTreeMap<u32, String>>(&text).unwrap(), names);

    let mut offsets = std::collections::HashMap::new();
    offsets.insert(-7i64, 0.5);
    let text = to_string(&offsets).unwrap();
    assert_eq!(from_str::<std::collections::HashMap<i64, f64>>(&text).unwrap(), offsets);

    let err = from_str::<BTreeMap<u32, String>>("one: a\n").unwrap_err();
    assert_eq!(err.path(), Some("one"));
}

#[test]
fn test_io_entry_points() {
    let mut out = Vec::new();
    to_writer(&mut out, &alice()).unwrap();
    assert_eq!(out, to_vec(&alice()).unwrap());

    let user: User = from_reader(std::io::Cursor::new(out)).unwrap();
    assert_eq!(user, alice());

    let user: User = from_slice(to_vec(&alice()).unwrap().as_slice()).unwrap();
    assert_eq!(user, alice());
}

#[test]
fn test_to_value_matches_decode() {
    let text = to_string(&order()).unwrap();
    assert_eq!(to_value(&order()).unwrap(), decode(text.as_bytes()).unwrap());
}

#[test]
fn test_encode_errors() {
    assert!(to_string(&f64::NAN).unwrap_err().is_encode());
    assert!(to_string(&u64::MAX).unwrap_err().is_encode());

    let mut map = BTreeMap::new();
    map.insert(String::new(), 1);
    assert!(to_string(&map).unwrap_err().is_encode());
}

#[test]
fn test_smaller_than_json() {
    let toon = to_vec(&order()).unwrap();
    let json = serde_json::to_vec(&order()).unwrap();
    assert!(toon.len() < json.len());
}
