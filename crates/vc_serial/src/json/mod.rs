//! The JSON format.
//!
//! Standard JSON with two additions:
//!
//! - An object whose type is not known from context carries a leading
//!   `"__type": "<path>"` member, see [`TYPE_KEY`].
//! - Date-time strings are accepted in several layouts, including the
//!   legacy `"\/Date(<ms>)\/"` form.
//!
//! There is no reference mechanism: shared instances are written in full at
//! every occurrence, and [`Settings::depth_limit`] bounds the output.
//!
//! Parse failures are reported as [`ParseError`](crate::ParseError) with the
//! line, column, the acceptable [`TokenSet`] and the [`TokenKind`] found.

mod date;
mod escape;
mod number;
mod reader;
mod token;
mod tokenizer;
mod writer;

pub use reader::JsonReader;
pub use token::{TokenKind, TokenSet};
pub use writer::JsonWriter;

use alloc::string::String;
use alloc::vec::Vec;

use crate::info::Typed;
use crate::registry::TypeResolver;
use crate::{MalformedError, Reflect, Result, Settings};

/// Name of the member that carries the run-time type of an object.
pub const TYPE_KEY: &str = "__type";

/// Writes `value` as compact JSON text.
///
/// ```
/// use vc_serial::Settings;
/// use vc_serial::json::to_string;
///
/// let text = to_string(&vec![Some(1_u8), None], &Settings::new()).unwrap();
/// assert_eq!(text, "[1,null]");
/// ```
pub fn to_string(value: &dyn Reflect, settings: &Settings) -> Result<String> {
    finish(JsonWriter::new(Vec::new(), settings.clone()), value)
}

/// Writes `value` as indented JSON text.
pub fn to_string_pretty(value: &dyn Reflect, settings: &Settings) -> Result<String> {
    finish(JsonWriter::new(Vec::new(), settings.clone()).pretty(), value)
}

fn finish(mut writer: JsonWriter<Vec<u8>>, value: &dyn Reflect) -> Result<String> {
    writer.write(value)?;
    String::from_utf8(writer.into_inner()).map_err(|_| MalformedError::InvalidUtf8.into())
}

/// Reads one value of type `T` from `text`.
pub fn from_str<T: Typed>(text: &str, settings: &Settings, resolver: &dyn TypeResolver) -> Result<T> {
    JsonReader::new(text, settings.clone(), resolver).read()
}

#[cfg(test)]
mod tests {
    use alloc::collections::{BTreeMap, VecDeque};
    use alloc::string::String;
    use alloc::sync::Arc;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::net::SocketAddr;
    use std::collections::{HashMap, HashSet};

    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use super::{JsonReader, JsonWriter, TokenKind, TokenSet, from_str, to_string, to_string_pretty};
    use crate::derive::Reflect;
    use crate::registry::TypeRegistry;
    use crate::{Dynamic, Error, MalformedError, ParseError, RepeatedObjectPolicy, Settings};

    #[derive(Reflect, Default, Debug, Clone, PartialEq)]
    #[reflect(type_path = "tests::json::Node", default)]
    struct Node {
        #[reflect(rename = "Name")]
        name: String,
        #[reflect(rename = "Children")]
        children: Vec<Node>,
    }

    #[derive(Reflect, Default, Debug, Clone, PartialEq)]
    #[reflect(type_path = "tests::json::Address", default)]
    struct Address {
        street: String,
        number: u32,
    }

    #[derive(Reflect, Default, Debug, Clone, PartialEq)]
    #[reflect(type_path = "tests::json::Person", default)]
    struct Person {
        name: String,
        age: i32,
        height: f64,
        nickname: Option<String>,
        home: Option<Address>,
        tags: Vec<String>,
        scores: BTreeMap<String, i64>,
    }

    #[derive(Reflect, Default, Debug, PartialEq)]
    #[reflect(type_path = "tests::json::Scalars", default)]
    struct Scalars {
        unit: (),
        flag: bool,
        small: i8,
        byte: u8,
        short: i16,
        ushort: u16,
        int: i32,
        uint: u32,
        long: i64,
        ulong: u64,
        single: f32,
        double: f64,
        decimal: Decimal,
        letter: char,
        bytes: Vec<u8>,
        chars: Vec<char>,
        when: chrono::NaiveDateTime,
        id: Uuid,
        array: [u16; 3],
        queue: VecDeque<i8>,
        set: HashSet<u32>,
        map: HashMap<String, bool>,
    }

    #[derive(Reflect, Default, Debug)]
    #[reflect(type_path = "tests::json::Shared", default)]
    struct Shared {
        first: Option<Arc<Address>>,
        second: Option<Arc<Address>>,
        required: Arc<Address>,
    }

    #[derive(Reflect, Default, Debug)]
    #[reflect(type_path = "tests::json::Holder", default)]
    struct Holder {
        value: Dynamic,
    }

    fn person() -> Person {
        Person {
            name: "Ada".into(),
            age: -36,
            height: 1.65,
            nickname: None,
            home: Some(Address {
                street: "Main".into(),
                number: 12,
            }),
            tags: vec!["math".into(), "engines".into()],
            scores: BTreeMap::from([("chess".into(), 1200), ("go".into(), -3)]),
        }
    }

    fn scalars() -> Scalars {
        Scalars {
            unit: (),
            flag: true,
            small: i8::MIN,
            byte: u8::MAX,
            short: i16::MIN,
            ushort: u16::MAX,
            int: i32::MIN,
            uint: u32::MAX,
            long: i64::MIN,
            ulong: u64::MAX,
            single: -0.5,
            double: f64::MAX,
            decimal: Decimal::new(-123_450, 3),
            letter: 'Ж',
            bytes: vec![0, 1, 254, 255],
            chars: vec!['a', 'é', '😀'],
            when: NaiveDate::from_ymd_opt(2024, 2, 29)
                .unwrap()
                .and_hms_micro_opt(13, 14, 15, 123_456)
                .unwrap(),
            id: Uuid::from_u128(0x0123_4567_89ab_cdef_0123_4567_89ab_cdef),
            array: [1, 2, 3],
            queue: VecDeque::from([-1, 0, 1]),
            set: HashSet::from([3, 5, 8]),
            map: HashMap::from([("yes".into(), true), ("no".into(), false)]),
        }
    }

    fn all_settings() -> Vec<Settings> {
        (0..16_u8)
            .map(|bits| {
                Settings::new()
                    .with_varint(bits & 1 != 0)
                    .with_omit_type_tag(bits & 2 != 0)
                    .with_omit_member_names(bits & 4 != 0)
                    .with_required(bits & 8 != 0)
            })
            .collect()
    }

    fn parse_error(err: &Error) -> &ParseError {
        match err.root_cause() {
            Error::Parse(err) => err,
            other => panic!("not a parse error: {other}"),
        }
    }

    // -------------------------------------------------------------------------
    // Writing

    #[test]
    fn name_and_children_scenario() {
        let registry = TypeRegistry::new();
        let settings = Settings::new().with_omit_type_tag(true);
        let tree = Node {
            name: "A".into(),
            children: vec![Node {
                name: "B".into(),
                children: Vec::new(),
            }],
        };

        let text = to_string(&tree, &settings).unwrap();
        assert_eq!(text, r#"{"Name":"A","Children":[{"Name":"B","Children":[]}]}"#);

        let back: Node = from_str(&text, &settings, &registry).unwrap();
        assert_eq!(back.name, "A");
        assert_eq!(back.children.len(), 1);
        assert_eq!(back.children[0].name, "B");
        assert_eq!(back, tree);
    }

    #[test]
    fn static_composites_are_tagged_unless_omitted() {
        let address = Address {
            street: "Main".into(),
            number: 12,
        };
        assert_eq!(
            to_string(&address, &Settings::new()).unwrap(),
            r#"{"__type":"tests::json::Address","street":"Main","number":12}"#,
        );
        assert_eq!(
            to_string(&address, &Settings::new().with_omit_type_tag(true)).unwrap(),
            r#"{"street":"Main","number":12}"#,
        );
    }

    #[test]
    fn dynamic_composites_are_always_tagged() {
        let holder = Holder {
            value: Dynamic::new(Address {
                street: "Elm".into(),
                number: 3,
            }),
        };
        let settings = Settings::new().with_omit_type_tag(true);
        assert_eq!(
            to_string(&holder, &settings).unwrap(),
            r#"{"value":{"__type":"tests::json::Address","street":"Elm","number":3}}"#,
        );
    }

    #[test]
    fn value_encodings() {
        let settings = Settings::new();
        assert_eq!(to_string(&(), &settings).unwrap(), "null");
        assert_eq!(to_string(&'x', &settings).unwrap(), r#""x""#);
        assert_eq!(to_string(&vec![0_u8, 255], &settings).unwrap(), r#""AP8=""#);
        assert_eq!(to_string(&vec!['h', 'i'], &settings).unwrap(), r#""hi""#);
        assert_eq!(to_string(&Decimal::new(1_500, 3), &settings).unwrap(), "1.500");
        assert_eq!(to_string(&1.0_f64, &settings).unwrap(), "1.0");
        assert_eq!(
            to_string(&vec![f64::NAN, f64::INFINITY, f64::NEG_INFINITY], &settings).unwrap(),
            r#"["NaN","Infinity","-Infinity"]"#,
        );
        let addr: SocketAddr = "[::1]:8080".parse().unwrap();
        assert_eq!(to_string(&addr, &settings).unwrap(), r#""[::1]:8080""#);
        assert_eq!(
            to_string(&Uuid::from_u128(1), &settings).unwrap(),
            r#""00000000-0000-0000-0000-000000000001""#,
        );
        let when = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_milli_opt(13, 14, 15, 123)
            .unwrap();
        assert_eq!(to_string(&when, &settings).unwrap(), r#""2024-02-29T13:14:15.123Z""#);
    }

    #[test]
    fn maps_with_other_keys_are_pairs() {
        let registry = TypeRegistry::new();
        let settings = Settings::new();
        let map = BTreeMap::from([(1_u32, String::from("a")), (2, String::from("b"))]);

        let text = to_string(&map, &settings).unwrap();
        assert_eq!(text, r#"[[1,"a"],[2,"b"]]"#);
        assert_eq!(from_str::<BTreeMap<u32, String>>(&text, &settings, &registry).unwrap(), map);
    }

    #[test]
    fn pretty_output_is_indented() {
        let settings = Settings::new().with_omit_type_tag(true);
        let address = Address {
            street: "Main".into(),
            number: 12,
        };
        assert_eq!(
            to_string_pretty(&address, &settings).unwrap(),
            "{\n  \"street\": \"Main\",\n  \"number\": 12\n}",
        );
        assert_eq!(to_string_pretty(&Vec::<u8>::new(), &settings).unwrap(), r#""""#);
        assert_eq!(to_string_pretty(&Vec::<u16>::new(), &settings).unwrap(), "[]");
        assert_eq!(
            to_string_pretty(&BTreeMap::from([(1_u8, 2_u8)]), &settings).unwrap(),
            "[\n  [1, 2]\n]",
        );
    }

    #[test]
    fn shared_instances_are_duplicated() {
        let registry = TypeRegistry::new();
        let settings = Settings::new().with_omit_type_tag(true);
        let address = Arc::new(Address {
            street: "Pine".into(),
            number: 1,
        });
        let shared = Shared {
            first: Some(address.clone()),
            second: Some(address.clone()),
            required: address,
        };

        let text = to_string(&shared, &settings).unwrap();
        assert_eq!(text.matches("Pine").count(), 3);

        let back: Shared = from_str(&text, &settings, &registry).unwrap();
        let (Some(first), Some(second)) = (&back.first, &back.second) else {
            panic!("options lost: {back:?}");
        };
        assert_eq!(**first, *back.required);
        assert!(!Arc::ptr_eq(first, second));
    }

    // -------------------------------------------------------------------------
    // Round trips

    #[test]
    fn round_trips_under_every_setting() {
        let registry = TypeRegistry::new();
        for settings in all_settings() {
            let text = to_string(&person(), &settings).unwrap();
            assert_eq!(from_str::<Person>(&text, &settings, &registry).unwrap(), person(), "{text}");

            let text = to_string(&scalars(), &settings).unwrap();
            assert_eq!(from_str::<Scalars>(&text, &settings, &registry).unwrap(), scalars(), "{text}");
        }
    }

    #[test]
    fn output_is_standard_json() {
        let text = to_string(&person(), &Settings::new()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["__type"], "tests::json::Person");
        assert_eq!(value["name"], "Ada");
        assert_eq!(value["nickname"], serde_json::Value::Null);
        assert_eq!(value["home"]["number"], 12);
        assert_eq!(value["scores"]["go"], -3);

        let text = to_string_pretty(&scalars(), &Settings::new()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["ulong"], u64::MAX);
        assert_eq!(value["bytes"], "AAH+/w==");
    }

    #[test]
    fn string_escaping_round_trips() {
        let registry = TypeRegistry::new();
        let mut text: String = (0_u8..0x20).map(char::from).collect();
        text.push_str("\"\\/ é ß 漢 😀");

        for encode_unicode in [false, true] {
            let settings = Settings::new().with_encode_unicode(encode_unicode);
            let json = to_string(&text, &settings).unwrap();
            assert_eq!(json.is_ascii(), encode_unicode, "{json}");
            assert!(!json[1..json.len() - 1].chars().any(|c| (c as u32) < 0x20));

            assert_eq!(from_str::<String>(&json, &settings, &registry).unwrap(), text);
            assert_eq!(serde_json::from_str::<String>(&json).unwrap(), text);
        }
    }

    #[test]
    fn non_finite_floats_round_trip() {
        let registry = TypeRegistry::new();
        let settings = Settings::new();
        let text = to_string(&vec![f32::NAN, f32::INFINITY, f32::NEG_INFINITY, 0.25], &settings).unwrap();
        let back: Vec<f32> = from_str(&text, &settings, &registry).unwrap();
        assert!(back[0].is_nan());
        assert_eq!(back[1..], [f32::INFINITY, f32::NEG_INFINITY, 0.25]);
    }

    // -------------------------------------------------------------------------
    // Depth guard

    #[test]
    fn depth_limit_skips_deep_content() {
        let deep = vec![vec![vec![vec![vec![1_u16]]]]];
        let settings = Settings::new().with_depth_limit(2);
        assert_eq!(to_string(&deep, &settings).unwrap(), "[[[]]]");

        let address = Some(Address::default());
        let nested = vec![vec![address]];
        assert_eq!(to_string(&nested, &settings).unwrap(), "[[{}]]");
    }

    #[test]
    fn depth_limit_can_fail() {
        let registry = TypeRegistry::new();
        let settings = Settings::new()
            .with_depth_limit(2)
            .with_repeated_object_policy(RepeatedObjectPolicy::Fail);

        let err = to_string(&vec![vec![vec![1_u16]]], &settings).unwrap_err();
        assert!(matches!(err, Error::DepthExceeded { limit: 2 }));

        let err = from_str::<Vec<Vec<Vec<u16>>>>("[[[1]]]", &settings, &registry).unwrap_err();
        assert!(matches!(err, Error::DepthExceeded { limit: 2 }));
    }

    #[test]
    fn skipped_content_is_consumed_on_read() {
        let registry = TypeRegistry::new();
        let settings = Settings::new().with_depth_limit(2);

        let back: Vec<Vec<Vec<u16>>> = from_str("[[[1, [2]], [3]], []]", &settings, &registry).unwrap();
        assert_eq!(back, vec![Vec::<Vec<u16>>::new(), Vec::new()]);

        let text = r#"{"street":"Oak","number":9}"#;
        let back: Vec<Address> = from_str(&format!("[{text}]"), &settings, &registry).unwrap();
        assert_eq!(back[0].street, "Oak");

        let back: Vec<Vec<Address>> = from_str(&format!("[[{text}], []]"), &settings, &registry).unwrap();
        assert_eq!(back, vec![Vec::new(), Vec::new()]);
    }

    // -------------------------------------------------------------------------
    // Reading

    #[test]
    fn unknown_members_are_ignored() {
        let registry = TypeRegistry::new();
        let text = r#"{
            "street": "Oak",
            "extra": {"deep": [1, 2, {"x": null}], "more": "text"},
            "number": 9,
            "tail": [[]]
        }"#;
        let back: Address = from_str(text, &Settings::new(), &registry).unwrap();
        assert_eq!(
            back,
            Address {
                street: "Oak".into(),
                number: 9
            }
        );
    }

    #[test]
    fn members_may_come_in_any_order_or_be_missing() {
        let registry = TypeRegistry::new();
        let back: Person = from_str(r#"{"age": 7, "name": "Bo"}"#, &Settings::new(), &registry).unwrap();
        assert_eq!(back.name, "Bo");
        assert_eq!(back.age, 7);
        assert!(back.tags.is_empty());
    }

    #[test]
    fn type_member_is_verified() {
        let registry = TypeRegistry::new();
        let text = r#"{"__type": "tests::json::Person", "street": "Oak"}"#;
        let err = from_str::<Address>(text, &Settings::new(), &registry).unwrap_err();
        assert!(matches!(
            err.root_cause(),
            Error::Malformed(MalformedError::TypeTagMismatch { found, .. }) if found == "tests::json::Person"
        ));
    }

    #[test]
    fn parse_errors_carry_position() {
        let registry = TypeRegistry::new();
        let text = "{\"street\": \"Oak\",\n  \"number\" 9}";
        let err = from_str::<Address>(text, &Settings::new(), &registry).unwrap_err();
        let err = parse_error(&err);
        assert_eq!((err.line, err.column), (2, 12));
        assert_eq!(err.expected, TokenSet::COLON);
        assert_eq!(err.found, TokenKind::Number);

        let err = from_str::<Vec<u16>>("[1 2]", &Settings::new(), &registry).unwrap_err();
        let err = parse_error(&err);
        assert_eq!((err.line, err.column), (1, 4));
        assert_eq!(err.expected, TokenSet::COMMA | TokenSet::BRACKET_CLOSE);

        let err = from_str::<Vec<u16>>("[1,]", &Settings::new(), &registry).unwrap_err();
        assert_eq!(parse_error(&err).found, TokenKind::BracketClose);

        let err = from_str::<u16>("7 8", &Settings::new(), &registry).unwrap_err();
        assert_eq!(parse_error(&err).expected, TokenSet::END);
    }

    #[test]
    fn member_errors_name_the_member() {
        let registry = TypeRegistry::new();
        let text = r#"{"street": "Oak", "number": "nine"}"#;
        let err = from_str::<Address>(text, &Settings::new(), &registry).unwrap_err();
        assert_eq!(err.member_path(), ["number"]);
        assert_eq!(parse_error(&err).found, TokenKind::String);
    }

    #[test]
    fn dynamic_values_are_detected() {
        let mut registry = TypeRegistry::new();
        registry.register::<Address>();
        let text = r#"{
            "small": 1,
            "wide": 5000000000,
            "fraction": 1.5,
            "huge": 1e300,
            "flag": true,
            "nothing": null,
            "text": "hi",
            "list": [1, "x"],
            "empty": {},
            "object": {"a": 70000},
            "typed": {"__type": "tests::json::Address", "street": "Elm", "number": 3}
        }"#;

        let value: Dynamic = from_str(text, &Settings::new(), &registry).unwrap();
        let map = value.downcast_ref::<HashMap<String, Dynamic>>().unwrap();

        assert_eq!(map["small"].downcast_ref::<i16>(), Some(&1));
        assert_eq!(map["wide"].downcast_ref::<i64>(), Some(&5_000_000_000));
        assert_eq!(map["fraction"].downcast_ref::<f32>(), Some(&1.5));
        assert_eq!(map["huge"].downcast_ref::<f64>(), Some(&1e300));
        assert_eq!(map["flag"].downcast_ref::<bool>(), Some(&true));
        assert_eq!(map["nothing"].downcast_ref::<()>(), Some(&()));
        assert_eq!(map["text"].downcast_ref::<String>().map(String::as_str), Some("hi"));

        let list = map["list"].downcast_ref::<Vec<Dynamic>>().unwrap();
        assert_eq!(list[0].downcast_ref::<i16>(), Some(&1));
        assert_eq!(list[1].downcast_ref::<String>().map(String::as_str), Some("x"));

        let empty = map["empty"].downcast_ref::<HashMap<String, Dynamic>>().unwrap();
        assert!(empty.is_empty());
        let object = map["object"].downcast_ref::<HashMap<String, Dynamic>>().unwrap();
        assert_eq!(object["a"].downcast_ref::<i32>(), Some(&70_000));

        assert_eq!(
            map["typed"].downcast_ref::<Address>(),
            Some(&Address {
                street: "Elm".into(),
                number: 3
            }),
        );
    }

    #[test]
    fn dynamic_composites_round_trip() {
        let mut registry = TypeRegistry::new();
        registry.register::<Address>();
        let settings = Settings::new().with_omit_type_tag(true);
        let holder = Holder {
            value: Dynamic::new(Address {
                street: "Elm".into(),
                number: 3,
            }),
        };

        let text = to_string(&holder, &settings).unwrap();
        let back: Holder = from_str(&text, &settings, &registry).unwrap();
        assert_eq!(back.value.downcast_ref::<Address>().map(|a| a.number), Some(3));

        let err = from_str::<Holder>(&text, &settings, &TypeRegistry::new()).unwrap_err();
        assert!(matches!(err.root_cause(), Error::UnknownType(path) if path == "tests::json::Address"));
        assert_eq!(err.member_path(), ["value"]);
    }

    #[test]
    fn dynamic_maps_keep_their_type() {
        let mut registry = TypeRegistry::new();
        registry.register::<HashMap<String, u32>>();
        let settings = Settings::new().with_omit_type_tag(true);
        let holder = Holder {
            value: Dynamic::new(HashMap::from([(String::from("a"), 7_u32)])),
        };

        let text = to_string(&holder, &settings).unwrap();
        assert_eq!(
            text,
            r#"{"value":{"__type":"std::collections::HashMap<alloc::string::String, u32>","a":7}}"#,
        );
        let back: Holder = from_str(&text, &settings, &registry).unwrap();
        let map = back.value.downcast_ref::<HashMap<String, u32>>().unwrap();
        assert_eq!(map.get("a"), Some(&7));

        // Untyped objects stay untagged.
        let untyped = Holder {
            value: Dynamic::new(HashMap::from([(String::from("b"), Dynamic::new(true))])),
        };
        let text = to_string(&untyped, &settings).unwrap();
        assert_eq!(text, r#"{"value":{"b":true}}"#);
        let back: Holder = from_str(&text, &settings, &registry).unwrap();
        let map = back.value.downcast_ref::<HashMap<String, Dynamic>>().unwrap();
        assert_eq!(map["b"].downcast_ref::<bool>(), Some(&true));
    }

    #[test]
    fn date_forms_are_accepted() {
        let registry = TypeRegistry::new();
        let settings = Settings::new();
        let expected = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_milli_opt(13, 14, 15, 123)
            .unwrap();

        for text in [
            r#""2024-02-29T13:14:15.123Z""#,
            r#""2024-02-29T13:14:15.123""#,
            r#""\/Date(1709212455123)\/""#,
        ] {
            let back: chrono::NaiveDateTime = from_str(text, &settings, &registry).unwrap();
            assert_eq!(back, expected, "{text}");
        }

        let err = from_str::<chrono::NaiveDateTime>(r#""soon""#, &settings, &registry).unwrap_err();
        assert!(matches!(err, Error::Malformed(MalformedError::InvalidDateTime(_))));
    }

    #[test]
    fn readers_and_writers_wrap_io() {
        let registry = TypeRegistry::new();
        let mut writer = JsonWriter::new(Vec::new(), Settings::new());
        writer.write(&vec![1_u32, 2]).unwrap();
        let bytes = writer.into_inner();

        let mut reader = JsonReader::from_reader(bytes.as_slice(), Settings::new(), &registry).unwrap();
        assert_eq!(reader.read::<Vec<u32>>().unwrap(), [1, 2]);
    }

    #[test]
    fn construction_failure_is_not_handled() {
        #[derive(Reflect, Debug)]
        #[reflect(type_path = "tests::json::NoDefault")]
        struct NoDefault {
            value: u8,
        }

        let registry = TypeRegistry::new();
        let mut reader = JsonReader::new(r#"{"value": 1}"#, Settings::new(), &registry);
        let read = reader.try_read(<NoDefault as crate::info::Typed>::type_descriptor()).unwrap();
        assert!(read.is_none());
    }
}
