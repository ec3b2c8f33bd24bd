//! The format-agnostic dispatcher.
//!
//! A concrete format implements [`FormatWrite`] and [`FormatRead`]; the
//! functions here walk the object graph through the descriptors and call
//! into the format for every primitive and structural marker.
//!
//! Dispatch order for a slot is fixed: value kinds, extended kinds,
//! sequences and maps, optional and shared wrappers, dynamic slots, and
//! finally composites.
//!
//! Entry points:
//! - [`write_object`] / [`try_read_object`]: any value.
//! - [`write_enumerable`] / [`try_read_enumerable`]: sequences and maps only.
//! - [`try_write_value`] / [`try_read_value`]: primitive values only.
//! - [`try_write_extended`] / [`try_read_extended`]: extended values only.

mod collection;
mod format;
mod read;
mod value;
mod write;

pub use format::{FormatRead, FormatWrite, MemberCursor, SequenceCursor, SharedRead, SharedWrite};
pub use value::{try_read_extended, try_read_value, try_write_extended, try_write_value};

use alloc::borrow::Cow;
use alloc::boxed::Box;

use crate::info::{TypeDescriptor, TypeKind, Typed};
use crate::registry::InstanceFactory;
use crate::{Error, Reflect, Result, SerialHooks};

use read::ObjectReader;
use write::ObjectWriter;

// -----------------------------------------------------------------------------
// Write

/// Writes `value` and everything reachable from it as one session.
///
/// The run-time type of `value` is its static type; composites are tagged
/// according to [`Settings::omit_type_tag`](crate::Settings::omit_type_tag).
pub fn write_object(format: &mut dyn FormatWrite, value: &dyn Reflect, hooks: &dyn SerialHooks) -> Result<()> {
    format.reset_session();
    ObjectWriter::new(format, hooks).write_slot(value.descriptor(), value)?;
    format.finish_session()
}

/// Writes a sequence or map as one session.
///
/// Fails with [`Error::Unsupported`] for any other kind.
pub fn write_enumerable(
    format: &mut dyn FormatWrite,
    value: &dyn Reflect,
    hooks: &dyn SerialHooks,
) -> Result<()> {
    let ty = value.descriptor();
    if !is_enumerable(ty) {
        return Err(not_enumerable(ty));
    }
    write_object(format, value, hooks)
}

// -----------------------------------------------------------------------------
// Read

/// Reads one value of type `ty` as one session.
///
/// Returns `Ok(None)` if the input holds a shape the engine cannot handle,
/// such as a composite without a default constructor.
pub fn try_read_object(
    format: &mut dyn FormatRead,
    ty: &'static TypeDescriptor,
    hooks: &dyn SerialHooks,
    factory: &dyn InstanceFactory,
) -> Result<Option<Box<dyn Reflect>>> {
    format.reset_session();
    let value = ObjectReader::new(format, hooks, factory).read_root(ty);
    match value {
        Ok(value) => {
            format.finish_session()?;
            Ok(Some(value))
        }
        Err(err) if err.is_unsupported() => {
            log::debug!("cannot read `{}`: {}", ty.path(), err.root_cause());
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Reads one value of type `T` as one session.
///
/// Unlike [`try_read_object`], an unsupported shape is an error.
pub fn read_object<T: Typed>(
    format: &mut dyn FormatRead,
    hooks: &dyn SerialHooks,
    factory: &dyn InstanceFactory,
) -> Result<T> {
    let ty = T::type_descriptor();
    let value = try_read_object(format, ty, hooks, factory)?
        .ok_or_else(|| Error::Unsupported(Cow::Owned(alloc::format!("cannot read `{}`", ty.path()))))?;
    value.take::<T>().map_err(|value| Error::TypeMismatch {
        expected: Cow::Borrowed(ty.path()),
        found: Cow::Borrowed(value.descriptor().path()),
    })
}

/// Reads a sequence or map of type `ty` as one session.
///
/// Returns `Ok(None)` if `ty` is not a sequence or map kind.
pub fn try_read_enumerable(
    format: &mut dyn FormatRead,
    ty: &'static TypeDescriptor,
    hooks: &dyn SerialHooks,
    factory: &dyn InstanceFactory,
) -> Result<Option<Box<dyn Reflect>>> {
    if !is_enumerable(ty) {
        return Ok(None);
    }
    try_read_object(format, ty, hooks, factory)
}

#[inline]
fn is_enumerable(ty: &TypeDescriptor) -> bool {
    matches!(ty.kind(), TypeKind::Sequence(_) | TypeKind::Map(_))
}

#[cold]
fn not_enumerable(ty: &TypeDescriptor) -> Error {
    Error::Unsupported(Cow::Owned(alloc::format!("`{}` is not a sequence or map", ty.path())))
}

#[cfg(test)]
mod tests {
    use alloc::collections::BTreeMap;
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;

    use uuid::Uuid;

    use super::{
        read_object, try_read_enumerable, try_read_extended, try_read_value, try_write_extended, try_write_value,
        write_enumerable,
    };
    use crate::binary::{BinaryReader, BinaryWriter, to_bytes};
    use crate::derive::Reflect;
    use crate::info::Typed;
    use crate::registry::{DefaultFactory, TypeRegistry};
    use crate::{Error, Settings};

    #[derive(Reflect, Default, Debug, PartialEq)]
    #[reflect(type_path = "tests::codec::Point", default)]
    struct Point {
        x: i32,
        y: i32,
    }

    fn writer() -> BinaryWriter<Vec<u8>> {
        BinaryWriter::new(Vec::new(), Settings::new())
    }

    #[test]
    fn values_are_written_only_for_value_kinds() {
        let mut format = writer();
        assert!(try_write_value(&mut format, &300_u32).unwrap());
        assert!(!try_write_value(&mut format, &Uuid::nil()).unwrap());
        assert!(!try_write_value(&mut format, &Point::default()).unwrap());
        assert_eq!(format.into_inner(), to_bytes(&300_u32, &Settings::new()).unwrap());
    }

    #[test]
    fn extended_are_written_only_for_extended_kinds() {
        let id = Uuid::from_u128(0x0123_4567_89ab_cdef_0123_4567_89ab_cdef);
        let mut format = writer();
        assert!(try_write_extended(&mut format, &id).unwrap());
        assert!(!try_write_extended(&mut format, &7_u8).unwrap());
        assert!(!try_write_extended(&mut format, &Point::default()).unwrap());
        assert_eq!(format.into_inner(), to_bytes(&id, &Settings::new()).unwrap());
    }

    #[test]
    fn values_and_extended_read_only_their_kinds() {
        let registry = TypeRegistry::new();
        let id = Uuid::from_u128(42);
        let mut bytes = to_bytes(&300_u32, &Settings::new()).unwrap();
        bytes.extend(to_bytes(&id, &Settings::new()).unwrap());

        let mut format = BinaryReader::new(bytes.as_slice(), Settings::new(), &registry);
        assert!(try_read_value(&mut format, Uuid::type_descriptor()).unwrap().is_none());
        assert!(try_read_value(&mut format, Point::type_descriptor()).unwrap().is_none());
        let value = try_read_value(&mut format, u32::type_descriptor()).unwrap().unwrap();
        assert_eq!(value.downcast_ref::<u32>(), Some(&300));

        assert!(try_read_extended(&mut format, u32::type_descriptor()).unwrap().is_none());
        let value = try_read_extended(&mut format, Uuid::type_descriptor()).unwrap().unwrap();
        assert_eq!(value.downcast_ref::<Uuid>(), Some(&id));
    }

    #[test]
    fn enumerables_round_trip() {
        let registry = TypeRegistry::new();
        let items = vec![1_u16, 2, 3];
        let scores = BTreeMap::from([(String::from("a"), 1_u8), (String::from("b"), 2)]);

        let mut format = writer();
        write_enumerable(&mut format, &items, &()).unwrap();
        let bytes = format.into_inner();
        assert_eq!(bytes, to_bytes(&items, &Settings::new()).unwrap());

        let mut format = BinaryReader::new(bytes.as_slice(), Settings::new(), &registry);
        let back = try_read_enumerable(&mut format, <Vec<u16>>::type_descriptor(), &(), &DefaultFactory)
            .unwrap()
            .unwrap();
        assert_eq!(back.downcast_ref::<Vec<u16>>(), Some(&items));

        let mut format = writer();
        write_enumerable(&mut format, &scores, &()).unwrap();
        let bytes = format.into_inner();
        let mut format = BinaryReader::new(bytes.as_slice(), Settings::new(), &registry);
        let back = try_read_enumerable(
            &mut format,
            <BTreeMap<String, u8>>::type_descriptor(),
            &(),
            &DefaultFactory,
        )
        .unwrap()
        .unwrap();
        assert_eq!(back.downcast_ref::<BTreeMap<String, u8>>(), Some(&scores));
    }

    #[test]
    fn enumerables_reject_other_kinds() {
        let registry = TypeRegistry::new();

        let mut format = writer();
        let err = write_enumerable(&mut format, &Point::default(), &()).unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
        assert!(matches!(write_enumerable(&mut format, &5_u8, &()), Err(Error::Unsupported(_))));
        assert!(format.into_inner().is_empty());

        let bytes = to_bytes(&Point::default(), &Settings::new()).unwrap();
        let mut format = BinaryReader::new(bytes.as_slice(), Settings::new(), &registry);
        let value = try_read_enumerable(&mut format, Point::type_descriptor(), &(), &DefaultFactory).unwrap();
        assert!(value.is_none());
        // Nothing was consumed.
        let point = read_object::<Point>(&mut format, &(), &DefaultFactory).unwrap();
        assert_eq!(point, Point::default());
    }
}
