//! The compact binary format.
//!
//! Every value is written positionally; what precedes it depends on
//! [`Settings`]:
//!
//! ```text
//! [presence]? [reference index]? [type tag + metadata]? { [member name]? value }*
//! ```
//!
//! - Lengths, counts and reference indices are always base-128 varints.
//! - 16/32/64-bit integers are varints or fixed-width, see
//!   [`Settings::encode_integers_as_varint`]; 8-bit integers are one byte.
//! - Shared values (`Arc<T>`) carry a 1-based reference index; a repeated
//!   instance is written as its index only.
//! - Dynamic slots always carry type metadata; static composites carry it
//!   unless [`Settings::omit_type_tag`].
//! - Member names are matched positionally. A name that does not match
//!   its slot marks that member absent.
//!
//! Exceeding the depth limit is always an error here: positional content
//! cannot be omitted.

mod reader;
mod references;
mod type_tag;
mod varint;
mod writer;

pub use reader::BinaryReader;
pub use writer::BinaryWriter;

use alloc::vec::Vec;

use rust_decimal::Decimal;

use crate::info::Typed;
use crate::registry::TypeResolver;
use crate::{MalformedError, Reflect, Result, Settings};

/// Writes `value` into a new buffer.
///
/// ```
/// use vc_serial::Settings;
/// use vc_serial::binary::to_bytes;
///
/// let bytes = to_bytes(&Some(7_u8), &Settings::new()).unwrap();
/// assert_eq!(bytes, [1, 7]);
/// ```
pub fn to_bytes(value: &dyn Reflect, settings: &Settings) -> Result<Vec<u8>> {
    let mut writer = BinaryWriter::new(Vec::new(), settings.clone());
    writer.write(value)?;
    Ok(writer.into_inner())
}

/// Reads one value of type `T` from `bytes`.
pub fn from_bytes<T: Typed>(bytes: &[u8], settings: &Settings, resolver: &dyn TypeResolver) -> Result<T> {
    BinaryReader::new(bytes, settings.clone(), resolver).read()
}

// -----------------------------------------------------------------------------
// Decimal words

const DECIMAL_SIGN: u32 = 1 << 31;
const DECIMAL_SCALE_MASK: u32 = 0x00FF_0000;
const DECIMAL_MAX_SCALE: u32 = 28;

/// Splits a decimal into `lo, mid, hi, flags`.
///
/// `flags` holds the scale in bits 16..23 and the sign in bit 31.
fn decimal_words(value: Decimal) -> [u32; 4] {
    let mantissa = value.mantissa().unsigned_abs();
    let mut flags = value.scale() << 16;
    if value.is_sign_negative() {
        flags |= DECIMAL_SIGN;
    }
    [
        mantissa as u32,
        (mantissa >> 32) as u32,
        (mantissa >> 64) as u32,
        flags,
    ]
}

fn decimal_from_words([lo, mid, hi, flags]: [u32; 4]) -> Result<Decimal> {
    let scale = (flags & DECIMAL_SCALE_MASK) >> 16;
    if flags & !(DECIMAL_SIGN | DECIMAL_SCALE_MASK) != 0 || scale > DECIMAL_MAX_SCALE {
        return Err(MalformedError::InvalidDecimal(alloc::format!("flags {flags:#010x}")).into());
    }
    Ok(Decimal::from_parts(lo, mid, hi, flags & DECIMAL_SIGN != 0, scale))
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
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use super::{BinaryReader, BinaryWriter, decimal_from_words, decimal_words, from_bytes, to_bytes};
    use crate::derive::Reflect;
    use crate::impls::TypeRef;
    use crate::info::{MemberDescriptor, TypeDescriptor, Typed};
    use crate::registry::{TypeRegistry, TypeResolver};
    use crate::{Dynamic, Error, MalformedError, ReadAction, Reflect, SerialHooks, Settings, WriteAction};

    #[derive(Reflect, Default, Debug, Clone, PartialEq)]
    #[reflect(type_path = "tests::binary::Address", default)]
    struct Address {
        street: String,
        number: u32,
    }

    #[derive(Reflect, Default, Debug, Clone, PartialEq)]
    #[reflect(type_path = "tests::binary::Person", default)]
    struct Person {
        name: String,
        age: i32,
        height: f64,
        nickname: Option<String>,
        home: Option<Address>,
        tags: Vec<String>,
        scores: BTreeMap<String, i64>,
    }

    #[derive(Reflect, Default, Debug)]
    #[reflect(type_path = "tests::binary::Shared", default)]
    struct Shared {
        first: Option<Arc<Address>>,
        second: Option<Arc<Address>>,
        required: Arc<Address>,
    }

    #[derive(Reflect, Default, Debug)]
    #[reflect(type_path = "tests::binary::Holder", default)]
    struct Holder {
        value: Dynamic,
        items: Vec<Dynamic>,
    }

    #[derive(Reflect, Default, Debug, PartialEq)]
    #[reflect(type_path = "tests::binary::Page", default)]
    struct Page<T> {
        items: Vec<T>,
        total: u32,
    }

    #[derive(Reflect, Default, Debug, PartialEq)]
    #[reflect(nested_in = Address, default)]
    struct Unit {
        code: u8,
    }

    #[derive(Reflect, Debug, PartialEq)]
    #[reflect(type_path = "tests::binary::Values", default)]
    struct Values {
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
        addr: SocketAddr,
        array: [u16; 3],
        queue: VecDeque<i8>,
        set: HashSet<u32>,
        map: HashMap<String, bool>,
    }

    impl Default for Values {
        fn default() -> Self {
            Self {
                unit: (),
                flag: false,
                small: 0,
                byte: 0,
                short: 0,
                ushort: 0,
                int: 0,
                uint: 0,
                long: 0,
                ulong: 0,
                single: 0.0,
                double: 0.0,
                decimal: Decimal::ZERO,
                letter: '\0',
                bytes: Vec::new(),
                chars: Vec::new(),
                when: chrono::NaiveDateTime::default(),
                id: Uuid::nil(),
                addr: SocketAddr::from(([0, 0, 0, 0], 0)),
                array: [0; 3],
                queue: VecDeque::new(),
                set: HashSet::new(),
                map: HashMap::new(),
            }
        }
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

    fn known_person() -> Person {
        Person {
            nickname: Some("Countess".into()),
            ..person()
        }
    }

    fn values() -> Values {
        Values {
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
            decimal: Decimal::new(-123_456, 3),
            letter: 'Ж',
            bytes: vec![0, 1, 254, 255],
            chars: vec!['a', 'é', '😀'],
            when: NaiveDate::from_ymd_opt(2024, 2, 29)
                .unwrap()
                .and_hms_micro_opt(13, 14, 15, 123_456)
                .unwrap(),
            id: Uuid::from_u128(0x0123_4567_89ab_cdef_0123_4567_89ab_cdef),
            addr: "[::1]:8080".parse().unwrap(),
            array: [1, 2, 3],
            queue: VecDeque::from([-1, 0, 1]),
            set: HashSet::from([3, 5, 8]),
            map: HashMap::from([("yes".into(), true), ("no".into(), false)]),
        }
    }

    fn all_settings() -> Vec<Settings> {
        let mut all = Vec::new();
        for bits in 0..32_u8 {
            all.push(
                Settings::new()
                    .with_varint(bits & 1 != 0)
                    .with_omit_type_tag(bits & 2 != 0)
                    .with_omit_member_names(bits & 4 != 0)
                    .with_little_endian(bits & 8 != 0)
                    .with_required(bits & 16 != 0),
            );
        }
        all
    }

    #[test]
    fn round_trips_under_every_setting() {
        let registry = TypeRegistry::new();
        for settings in all_settings() {
            let bytes = to_bytes(&known_person(), &settings).unwrap();
            let back: Person = from_bytes(&bytes, &settings, &registry).unwrap();
            assert_eq!(back, known_person(), "{settings:?}");

            if !settings.required {
                let bytes = to_bytes(&person(), &settings).unwrap();
                let back: Person = from_bytes(&bytes, &settings, &registry).unwrap();
                assert_eq!(back, person(), "{settings:?}");
            }

            let bytes = to_bytes(&values(), &settings).unwrap();
            let back: Values = from_bytes(&bytes, &settings, &registry).unwrap();
            assert_eq!(back, values(), "{settings:?}");
        }
    }

    #[test]
    fn required_options_omit_presence() {
        let registry = TypeRegistry::new();
        let settings = Settings::new().with_required(true);

        let bytes = to_bytes(&Some(7_u8), &settings).unwrap();
        assert_eq!(bytes, [7]);
        assert_eq!(from_bytes::<Option<u8>>(&bytes, &settings, &registry).unwrap(), Some(7));

        let err = to_bytes(&None::<u8>, &settings).unwrap_err();
        assert!(matches!(err, Error::MissingRequired(_)));
    }

    #[test]
    fn required_rejects_absent_members() {
        let settings = Settings::new().with_required(true);

        let err = to_bytes(&person(), &settings).unwrap_err();
        assert_eq!(err.member_path(), ["nickname"]);
        assert!(matches!(err.root_cause(), Error::MissingRequired(path) if path == "alloc::string::String"));

        let homeless = Person {
            home: None,
            ..known_person()
        };
        let err = to_bytes(&homeless, &settings).unwrap_err();
        assert_eq!(err.member_path(), ["home"]);
        assert!(matches!(err.root_cause(), Error::MissingRequired(_)));
    }

    #[test]
    fn varint_scenario_bytes() {
        let settings = Settings::new().with_varint(true);
        assert_eq!(to_bytes(&300_i32, &settings).unwrap(), [0xAC, 0x02]);
        assert_eq!(to_bytes(&-1_i16, &settings).unwrap(), [0xFF, 0xFF, 0x03]);

        let fixed = Settings::new().with_little_endian(false);
        assert_eq!(to_bytes(&300_i32, &fixed).unwrap(), [0, 0, 1, 44]);
    }

    #[test]
    fn truncated_varint_is_malformed() {
        let registry = TypeRegistry::new();
        let settings = Settings::new().with_varint(true);
        let err = from_bytes::<i16>(&[0x80, 0x80, 0x80], &settings, &registry).unwrap_err();
        assert!(matches!(err, Error::Malformed(MalformedError::TruncatedVarint { bits: 16 })));
    }

    #[test]
    fn shared_instances_keep_identity() {
        let registry = TypeRegistry::new();
        let settings = Settings::new();
        let address = Arc::new(Address {
            street: "Elm".into(),
            number: 4,
        });
        let value = Shared {
            first: Some(Arc::clone(&address)),
            second: Some(Arc::clone(&address)),
            required: Arc::clone(&address),
        };

        let bytes = to_bytes(&value, &settings).unwrap();
        let back: Shared = from_bytes(&bytes, &settings, &registry).unwrap();

        let first = back.first.unwrap();
        assert_eq!(*first, *address);
        assert!(Arc::ptr_eq(&first, back.second.as_ref().unwrap()));
        assert!(Arc::ptr_eq(&first, &back.required));
    }

    #[test]
    fn absent_shared_option_is_reference_zero() {
        let settings = Settings::new().with_omit_member_names(true).with_omit_type_tag(true);
        let value = Shared {
            first: None,
            second: None,
            required: Arc::new(Address::default()),
        };
        let bytes = to_bytes(&value, &settings).unwrap();
        // first, second, then reference 1 followed by the address
        assert_eq!(&bytes[..3], [0, 0, 1]);
    }

    #[test]
    fn invalid_references_are_malformed() {
        let registry = TypeRegistry::new();
        let settings = Settings::new().with_omit_member_names(true).with_omit_type_tag(true);

        // `required` refers to index 3 while the table is empty
        let err = from_bytes::<Shared>(&[0, 0, 3], &settings, &registry).unwrap_err();
        assert!(matches!(
            err.root_cause(),
            Error::Malformed(MalformedError::InvalidReference { index: 3, len: 0 })
        ));
        assert_eq!(err.member_path(), ["required"]);

        // `required` is null
        let err = from_bytes::<Shared>(&[0, 0, 0], &settings, &registry).unwrap_err();
        assert!(matches!(
            err.root_cause(),
            Error::Malformed(MalformedError::NullReference)
        ));
    }

    #[test]
    fn dynamic_slots_carry_type_tags() {
        let mut registry = TypeRegistry::new();
        registry.register::<Address>();
        let settings = Settings::new().with_omit_type_tag(true);
        let value = Holder {
            value: Dynamic::new(Address {
                street: "Oak".into(),
                number: 9,
            }),
            items: vec![Dynamic::new(1_u8), Dynamic::new(String::from("two"))],
        };

        let bytes = to_bytes(&value, &settings).unwrap();
        let back: Holder = from_bytes(&bytes, &settings, &registry).unwrap();

        assert_eq!(
            back.value.downcast_ref::<Address>().map(|a| a.number),
            Some(9)
        );
        assert_eq!(back.items[0].downcast_ref::<u8>(), Some(&1));
        assert_eq!(back.items[1].downcast_ref::<String>().map(String::as_str), Some("two"));
    }

    #[test]
    fn uniform_dynamic_elements_are_tagged_once() {
        let registry = TypeRegistry::new();
        let settings = Settings::new();
        let items = vec![Dynamic::new(1_u8), Dynamic::new(2_u8)];

        let bytes = to_bytes(&items, &settings).unwrap();
        // count, element tag `u8`, then raw bytes
        assert_eq!(bytes, [2, 0, 2, b'u', b'8', 1, 2]);

        let back: Vec<Dynamic> = from_bytes(&bytes, &settings, &registry).unwrap();
        assert_eq!(back[1].downcast_ref::<u8>(), Some(&2));
    }

    #[test]
    fn unknown_dynamic_type_is_reported() {
        let registry = TypeRegistry::new();
        let settings = Settings::new();
        let value = Holder {
            value: Dynamic::new(Address::default()),
            items: Vec::new(),
        };
        let bytes = to_bytes(&value, &settings).unwrap();

        let err = from_bytes::<Holder>(&bytes, &settings, &registry).unwrap_err();
        match err.root_cause() {
            Error::UnknownType(path) => assert_eq!(path, "tests::binary::Address"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn static_type_tag_is_verified() {
        let registry = TypeRegistry::new();
        let settings = Settings::new();
        let bytes = to_bytes(&Address::default(), &settings).unwrap();

        let err = from_bytes::<Person>(&bytes, &settings, &registry).unwrap_err();
        assert!(matches!(err, Error::Malformed(MalformedError::TypeTagMismatch { .. })));

        let mut corrupt = bytes.clone();
        corrupt[0] = 9;
        let err = from_bytes::<Address>(&corrupt, &settings, &registry).unwrap_err();
        assert!(matches!(err, Error::Malformed(MalformedError::InvalidTypeTag(9))));
    }

    #[test]
    fn type_refs_resolve_through_the_registry() {
        let mut registry = TypeRegistry::new();
        registry.register::<Vec<Address>>();
        let settings = Settings::new();

        let bytes = to_bytes(&TypeRef::of::<Vec<Address>>(), &settings).unwrap();
        let back: TypeRef = from_bytes(&bytes, &settings, &registry).unwrap();
        assert!(back.get().is::<Vec<Address>>());
    }

    #[test]
    fn generic_tags_use_registered_arity() {
        let mut registry = TypeRegistry::new();
        registry.register::<HashMap<String, Vec<u32>>>();
        let settings = Settings::new();
        let value = Dynamic::new(HashMap::from([(String::from("k"), vec![1_u32, 2])]));

        let bytes = to_bytes(&value, &settings).unwrap();
        let back: Dynamic = from_bytes(&bytes, &settings, &registry).unwrap();
        let map = back.downcast_ref::<HashMap<String, Vec<u32>>>().unwrap();
        assert_eq!(map["k"], [1, 2]);
    }

    #[test]
    fn derived_generic_and_nested_types_round_trip() {
        let mut registry = TypeRegistry::new();
        registry.register::<Page<Address>>();
        registry.register::<Unit>();
        let settings = Settings::new();

        assert_eq!(
            <Page<Address>>::type_descriptor().path(),
            "tests::binary::Page<tests::binary::Address>"
        );
        assert_eq!(Unit::type_descriptor().path(), "tests::binary::Address::Unit");

        let value = Holder {
            value: Dynamic::new(Page {
                items: vec![Address::default()],
                total: 1,
            }),
            items: vec![Dynamic::new(Unit { code: 7 })],
        };
        let bytes = to_bytes(&value, &settings).unwrap();
        let back: Holder = from_bytes(&bytes, &settings, &registry).unwrap();

        assert_eq!(back.value.downcast_ref::<Page<Address>>().map(|page| page.total), Some(1));
        assert_eq!(back.items[0].downcast_ref::<Unit>(), Some(&Unit { code: 7 }));
    }

    #[test]
    fn depth_overflow_is_fatal() {
        let settings = Settings::new().with_depth_limit(2);
        let nested = vec![vec![vec![1_u16]]];
        let err = to_bytes(&nested, &settings).unwrap_err();
        assert!(matches!(err, Error::DepthExceeded { limit: 2 }));
    }

    #[test]
    fn absent_trailing_member_keeps_default() {
        struct SkipNumber;
        impl SerialHooks for SkipNumber {
            fn before_write(
                &self,
                _owner: &'static TypeDescriptor,
                member: &MemberDescriptor,
                _value: &dyn Reflect,
            ) -> WriteAction {
                match member.name() {
                    "number" => WriteAction::Skip,
                    _ => WriteAction::Process,
                }
            }
        }

        let registry = TypeRegistry::new();
        let settings = Settings::new();
        let value = Address {
            street: "Pine".into(),
            number: 77,
        };
        let mut writer = BinaryWriter::new(Vec::new(), settings.clone());
        writer.write_with(&value, &SkipNumber).unwrap();
        let bytes = writer.into_inner();

        let back: Address = from_bytes(&bytes, &settings, &registry).unwrap();
        assert_eq!(back.street, "Pine");
        assert_eq!(back.number, 0);
    }

    #[test]
    fn read_hooks_skip_and_substitute() {
        struct Hooks;
        impl SerialHooks for Hooks {
            fn before_read(&self, _owner: &'static TypeDescriptor, member: &MemberDescriptor) -> ReadAction {
                match member.name() {
                    "street" => ReadAction::Skip,
                    _ => ReadAction::Process,
                }
            }

            fn after_read(
                &self,
                _owner: &'static TypeDescriptor,
                _member: &MemberDescriptor,
                value: Box<dyn Reflect>,
            ) -> Box<dyn Reflect> {
                match value.downcast_ref::<u32>() {
                    Some(number) => Box::new(number * 2),
                    None => value,
                }
            }
        }

        let registry = TypeRegistry::new();
        let settings = Settings::new();
        let bytes = to_bytes(
            &Address {
                street: "Birch".into(),
                number: 21,
            },
            &settings,
        )
        .unwrap();

        let mut reader = BinaryReader::new(bytes.as_slice(), settings, &registry);
        let back: Address = reader.read_with(&Hooks).unwrap();
        assert_eq!(back.street, "");
        assert_eq!(back.number, 42);
    }

    #[test]
    fn construction_failure_can_be_substituted() {
        #[derive(Reflect, Debug)]
        #[reflect(type_path = "tests::binary::NoDefault")]
        struct NoDefault {
            value: u8,
        }

        struct Fallback;
        impl SerialHooks for Fallback {
            fn construction_failed(&self, ty: &'static TypeDescriptor, _error: &Error) -> Option<Box<dyn Reflect>> {
                ty.is::<NoDefault>().then(|| Box::new(NoDefault { value: 0 }) as Box<dyn Reflect>)
            }
        }

        let registry = TypeRegistry::new();
        let settings = Settings::new();
        let bytes = to_bytes(&NoDefault { value: 5 }, &settings).unwrap();

        let mut reader = BinaryReader::new(bytes.as_slice(), settings.clone(), &registry);
        assert!(reader.try_read(NoDefault::type_descriptor()).unwrap().is_none());

        let mut reader = BinaryReader::new(bytes.as_slice(), settings, &registry);
        let back: NoDefault = reader.read_with(&Fallback).unwrap();
        assert_eq!(back.value, 5);
    }

    #[test]
    fn bad_primitives_are_malformed() {
        let registry = TypeRegistry::new();
        let settings = Settings::new();

        let err = from_bytes::<bool>(&[2], &settings, &registry).unwrap_err();
        assert!(matches!(err, Error::Malformed(MalformedError::InvalidBool(2))));

        let err = from_bytes::<char>(&[0xFF], &settings, &registry).unwrap_err();
        assert!(matches!(err, Error::Malformed(MalformedError::InvalidCharLead(0xFF))));

        let err = from_bytes::<String>(&[0xFF, 0xFF, 0xFF, 0xFF, 0x0F], &settings, &registry).unwrap_err();
        assert!(matches!(err, Error::Malformed(MalformedError::InvalidCount(_))));

        let err = from_bytes::<[u8; 2]>(&[3, 1, 2, 3], &settings, &registry).unwrap_err();
        assert!(matches!(
            err,
            Error::Malformed(MalformedError::ArrayLength { expected: 2, found: 3 })
        ));
    }

    #[test]
    fn decimal_words_keep_scale_and_sign() {
        for value in [Decimal::ZERO, Decimal::MAX, Decimal::MIN, Decimal::new(-5, 28)] {
            assert_eq!(decimal_from_words(decimal_words(value)).unwrap(), value);
        }
        assert!(decimal_from_words([0, 0, 0, 29 << 16]).is_err());
        assert!(decimal_from_words([0, 0, 0, 1]).is_err());
    }

    #[test]
    fn resolver_is_a_trait_object() {
        fn read_with(resolver: &dyn TypeResolver) -> u16 {
            from_bytes(&[9, 0], &Settings::new(), resolver).unwrap()
        }
        assert_eq!(read_with(&TypeRegistry::new()), 9);
    }

    proptest! {
        #[test]
        fn integers_round_trip(a: i16, b: i32, c: i64, d: u64, varint: bool, little: bool) {
            let registry = TypeRegistry::new();
            let settings = Settings::new().with_varint(varint).with_little_endian(little);

            let bytes = to_bytes(&a, &settings).unwrap();
            prop_assert_eq!(from_bytes::<i16>(&bytes, &settings, &registry).unwrap(), a);
            let bytes = to_bytes(&b, &settings).unwrap();
            prop_assert_eq!(from_bytes::<i32>(&bytes, &settings, &registry).unwrap(), b);
            let bytes = to_bytes(&c, &settings).unwrap();
            prop_assert_eq!(from_bytes::<i64>(&bytes, &settings, &registry).unwrap(), c);
            let bytes = to_bytes(&d, &settings).unwrap();
            prop_assert_eq!(from_bytes::<u64>(&bytes, &settings, &registry).unwrap(), d);
        }
    }
}
