//! Exact text shapes and decoder error reporting.

use toon_codec::{
    decode, parse_document, to_string, to_string_with_options, toon, Map, ParseErrorKind,
    ToonOptions, Value,
};

fn encode(value: &Value) -> String {
    to_string(value).unwrap()
}

fn error_at(text: &str) -> (ParseErrorKind, usize) {
    let err = decode(text.as_bytes()).unwrap_err();
    (err.parse_kind().unwrap(), err.offset().unwrap())
}

#[test]
fn test_scalar_tokens() {
    assert_eq!(encode(&Value::Null), "null\n");
    assert_eq!(encode(&Value::Bool(false)), "false\n");
    assert_eq!(encode(&Value::Integer(-42)), "-42\n");
    assert_eq!(encode(&Value::Float(2.5)), "2.5\n");
    assert_eq!(encode(&Value::Float(1.0)), "1.0\n");
    assert_eq!(encode(&Value::from("plain text")), "plain text\n");
}

#[test]
fn test_ambiguous_strings_are_quoted() {
    let cases = [
        ("", "\"\""),
        ("null", "\"null\""),
        ("false", "\"false\""),
        ("12", "\"12\""),
        ("-0.5", "\"-0.5\""),
        ("1e3", "\"1e3\""),
        ("a,b", "\"a,b\""),
        ("a:b", "\"a:b\""),
        (" x", "\" x\""),
        ("-", "\"-\""),
        ("- x", "\"- x\""),
        ("{}", "\"{}\""),
        ("tab\there", "\"tab\\there\""),
        ("back\\slash", "\"back\\\\slash\""),
    ];
    for (raw, quoted) in cases {
        assert_eq!(encode(&Value::from(raw)), format!("{}\n", quoted), "for {:?}", raw);
        assert_eq!(decode(quoted.as_bytes()).unwrap(), Value::from(raw), "for {:?}", raw);
    }
}

#[test]
fn test_bare_strings_stay_bare() {
    for raw in ["-x", "x-1", "1.2.3", "12abc", "née", "a b c", "http//x"] {
        assert_eq!(encode(&Value::from(raw)), format!("{}\n", raw));
        assert_eq!(decode(raw.as_bytes()).unwrap(), Value::from(raw));
    }
}

#[test]
fn test_container_layouts() {
    assert_eq!(encode(&toon!({"a": [], "b": {}})), "a: []\nb: {}\n");
    assert_eq!(encode(&toon!({"solo": [1]})), "solo:\n  - 1\n");
    assert_eq!(encode(&toon!({"pair": [1, "x"]})), "pair: 1, x\n");
    assert_eq!(
        encode(&toon!({"mixed": [1, [2, 3], {"k": "v"}]})),
        "mixed:\n  - 1\n  - 2, 3\n  - k: v\n"
    );
    assert_eq!(
        encode(&toon!([{"a": {}, "b": [[1]]}])),
        "- a: {}\n  b:\n    -\n      - 1\n"
    );
}

#[test]
fn test_key_quoting() {
    let mut map = Map::new();
    map.insert("plain".to_string(), Value::from(1));
    map.insert("with space".to_string(), Value::from(2));
    map.insert("a: b".to_string(), Value::from(3));
    map.insert("true".to_string(), Value::from(4));
    map.insert("- dash".to_string(), Value::from(5));
    let value = Value::Map(map);

    let text = encode(&value);
    assert_eq!(
        text,
        "plain: 1\nwith space: 2\n\"a: b\": 3\n\"true\": 4\n\"- dash\": 5\n"
    );
    assert_eq!(decode(text.as_bytes()).unwrap(), value);
}

#[test]
fn test_expanded_lists() {
    let options = ToonOptions::expanded();
    let text = to_string_with_options(&toon!({"tags": ["a", "b"]}), &options).unwrap();
    assert_eq!(text, "tags:\n  - a\n  - b\n");
    assert_eq!(decode(text.as_bytes()).unwrap(), toon!({"tags": ["a", "b"]}));
}

#[test]
fn test_key_order_preserved() {
    let text = "zulu: 1\nalpha: 2\nmike: 3\n";
    let value = decode(text.as_bytes()).unwrap();
    assert_eq!(encode(&value), text);
}

#[test]
fn test_empty_document() {
    assert_eq!(decode(b"").unwrap(), Value::Null);
    let doc = parse_document(b"\n\n", &ToonOptions::default()).unwrap();
    assert_eq!(doc.root(), &Value::Null);
    assert!(doc.span().is_empty());
}

#[test]
fn test_lenient_input() {
    assert_eq!(decode(b"a:   1\nb:\t2  \n").unwrap(), toon!({"a": 1, "b": 2}));
    assert_eq!(decode(b"list: 1 ,2,  3\n").unwrap(), toon!({"list": [1, 2, 3]}));
    assert_eq!(decode(b"big: 99999999999999999999\n").unwrap(), toon!({"big": 1e20}));
}

#[test]
fn test_unterminated_quote_offset() {
    assert_eq!(error_at("name: \"Ann"), (ParseErrorKind::UnterminatedQuote, 6));
}

#[test]
fn test_invalid_escape_offset() {
    assert_eq!(error_at("a: \"x\\yz\"\n"), (ParseErrorKind::InvalidEscape, 5));
    assert_eq!(error_at("a: \"\\u12\"\n").0, ParseErrorKind::InvalidEscape);
}

#[test]
fn test_duplicate_key() {
    assert_eq!(error_at("a:\n  x: 1\n  x: 2\n"), (ParseErrorKind::DuplicateKey, 12));
}

#[test]
fn test_indentation_errors() {
    assert_eq!(
        error_at("a:\n    b: 1\n  c: 2\n").0,
        ParseErrorKind::DedentToUnknownLevel
    );
    assert_eq!(error_at("a: 1\n   b: 2\n").0, ParseErrorKind::UnexpectedIndentation);
    assert_eq!(error_at("a:\n\tb:\n\t  c: 1\n").0, ParseErrorKind::MixedIndentation);
    assert_eq!(error_at("a:\n  b: 1\n\tc: 1\n"), (ParseErrorKind::MixedIndentation, 10));
}

#[test]
fn test_malformed_tokens() {
    assert_eq!(error_at("a: x\"y\n").0, ParseErrorKind::MalformedToken);
    assert_eq!(error_at("a: 1, \n").0, ParseErrorKind::MalformedToken);
    assert_eq!(error_at("a: 1\n- 2\n").0, ParseErrorKind::MalformedToken);
    assert_eq!(error_at("- 1\n-\n").0, ParseErrorKind::MalformedToken);
}

#[test]
fn test_error_line_and_column() {
    let err = decode(b"a: 1\nb:\n  c: \"open\n").unwrap_err();
    let message = err.to_string();
    assert!(message.contains("line 3, column 6"), "{}", message);
}

#[test]
fn test_depth_limit_on_decode() {
    let mut text = String::new();
    for level in 0..130 {
        text.push_str(&"  ".repeat(level));
        text.push_str("k:\n");
    }
    let err = decode(text.as_bytes()).unwrap_err();
    assert_eq!(err.parse_kind(), Some(ParseErrorKind::DepthLimitExceeded));

    let options = ToonOptions::new().with_max_depth(200);
    assert!(parse_document(text.as_bytes(), &options).is_ok());
}

#[test]
fn test_depth_limit_on_encode() {
    let mut value = Value::from(0);
    for _ in 0..129 {
        let mut map = Map::new();
        map.insert("k".to_string(), value);
        value = Value::Map(map);
    }
    assert!(to_string(&value).unwrap_err().is_encode());
}
