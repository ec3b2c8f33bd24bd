use alloc::boxed::Box;
use alloc::collections::{BTreeMap, BTreeSet, VecDeque};
use alloc::vec::Vec;
use core::any::TypeId;
use core::hash::Hash;
use std::collections::{HashMap, HashSet};

use crate::impls::boxed_default;
use crate::info::{
    CollectionBuildStrategy, GenericDescriptorCell, MapEntry, MapInfo, SequenceInfo,
    TypeDescriptor, TypeKind, Typed, ValueKind, owner_ref, take_value,
};
use crate::{MalformedError, Reflect, Result};

// -----------------------------------------------------------------------------
// Shared accessors

fn sequence_items<C, T>(value: &dyn Reflect) -> Result<Vec<&dyn Reflect>>
where
    C: Typed,
    T: Typed,
    for<'a> &'a C: IntoIterator<Item = &'a T>,
{
    let collection = owner_ref::<C>(value)?;
    Ok(collection
        .into_iter()
        .map(|item| item as &dyn Reflect)
        .collect())
}

fn map_entries<M, K, V>(value: &dyn Reflect) -> Result<Vec<(&dyn Reflect, &dyn Reflect)>>
where
    M: Typed,
    K: Typed,
    V: Typed,
    for<'a> &'a M: IntoIterator<Item = (&'a K, &'a V)>,
{
    let map = owner_ref::<M>(value)?;
    Ok(map
        .into_iter()
        .map(|(key, value)| (key as &dyn Reflect, value as &dyn Reflect))
        .collect())
}

fn collect_elements<C, T>(elements: Vec<Box<dyn Reflect>>) -> Result<Box<dyn Reflect>>
where
    C: Typed + FromIterator<T>,
    T: Typed,
{
    let collection = elements
        .into_iter()
        .map(take_value::<T>)
        .collect::<Result<C>>()?;
    Ok(Box::new(collection))
}

fn collect_entries<M, K, V>(entries: Vec<MapEntry>) -> Result<Box<dyn Reflect>>
where
    M: Typed + FromIterator<(K, V)>,
    K: Typed,
    V: Typed,
{
    let map = entries
        .into_iter()
        .map(|(key, value)| Ok((take_value::<K>(key)?, take_value::<V>(value)?)))
        .collect::<Result<M>>()?;
    Ok(Box::new(map))
}

fn append_element<C, T>(target: &mut dyn Reflect, element: Box<dyn Reflect>) -> Result<()>
where
    C: Typed + Extend<T>,
    T: Typed,
{
    let element = take_value::<T>(element)?;
    let found = target.descriptor();
    match target.downcast_mut::<C>() {
        Some(collection) => {
            collection.extend(core::iter::once(element));
            Ok(())
        }
        None => Err(crate::Error::TypeMismatch {
            expected: C::type_descriptor().path().into(),
            found: found.path().into(),
        }),
    }
}

fn append_entry<M, K, V>(target: &mut dyn Reflect, (key, value): MapEntry) -> Result<()>
where
    M: Typed + Extend<(K, V)>,
    K: Typed,
    V: Typed,
{
    let entry = (take_value::<K>(key)?, take_value::<V>(value)?);
    let found = target.descriptor();
    match target.downcast_mut::<M>() {
        Some(map) => {
            map.extend(core::iter::once(entry));
            Ok(())
        }
        None => Err(crate::Error::TypeMismatch {
            expected: M::type_descriptor().path().into(),
            found: found.path().into(),
        }),
    }
}

fn collect_array<T: Typed, const N: usize>(elements: Vec<Box<dyn Reflect>>) -> Result<Box<dyn Reflect>> {
    let found = elements.len();
    let items = elements
        .into_iter()
        .map(take_value::<T>)
        .collect::<Result<Vec<T>>>()?;
    match <[T; N]>::try_from(items) {
        Ok(array) => Ok(Box::new(array)),
        Err(_) => Err(MalformedError::ArrayLength { expected: N, found }.into()),
    }
}

// -----------------------------------------------------------------------------
// Sequences

impl<T: Typed> Typed for Vec<T> {
    fn type_descriptor() -> &'static TypeDescriptor {
        static CELL: GenericDescriptorCell = GenericDescriptorCell::new();
        CELL.get_or_insert::<Self>(|| {
            let kind = if TypeId::of::<T>() == TypeId::of::<u8>() {
                TypeKind::Value(ValueKind::Bytes)
            } else if TypeId::of::<T>() == TypeId::of::<char>() {
                TypeKind::Value(ValueKind::Chars)
            } else {
                TypeKind::Sequence(SequenceInfo::new(
                    T::type_descriptor,
                    sequence_items::<Self, T>,
                    CollectionBuildStrategy::FromElements(collect_elements::<Self, T>),
                ))
            };
            TypeDescriptor::generic::<Self>("alloc::vec::Vec", &[T::type_descriptor], kind)
                .with_default::<Self>()
        })
    }
}

impl<T: Typed> Typed for VecDeque<T> {
    fn type_descriptor() -> &'static TypeDescriptor {
        static CELL: GenericDescriptorCell = GenericDescriptorCell::new();
        CELL.get_or_insert::<Self>(|| {
            let info = SequenceInfo::new(
                T::type_descriptor,
                sequence_items::<Self, T>,
                CollectionBuildStrategy::FromElements(collect_elements::<Self, T>),
            );
            TypeDescriptor::generic::<Self>(
                "alloc::collections::VecDeque",
                &[T::type_descriptor],
                TypeKind::Sequence(info),
            )
            .with_default::<Self>()
        })
    }
}

impl<T: Typed, const N: usize> Typed for [T; N] {
    fn type_descriptor() -> &'static TypeDescriptor {
        static CELL: GenericDescriptorCell = GenericDescriptorCell::new();
        CELL.get_or_insert::<Self>(|| {
            let info = SequenceInfo::new(
                T::type_descriptor,
                sequence_items::<Self, T>,
                CollectionBuildStrategy::FromElements(collect_array::<T, N>),
            )
            .with_fixed_len(N);
            TypeDescriptor::array::<Self>(T::type_descriptor, N, TypeKind::Sequence(info))
        })
    }
}

impl<T: Typed + Eq + Hash> Typed for HashSet<T> {
    fn type_descriptor() -> &'static TypeDescriptor {
        static CELL: GenericDescriptorCell = GenericDescriptorCell::new();
        CELL.get_or_insert::<Self>(|| {
            let info = SequenceInfo::new(
                T::type_descriptor,
                sequence_items::<Self, T>,
                CollectionBuildStrategy::Append {
                    create: boxed_default::<Self>,
                    add: append_element::<Self, T>,
                },
            );
            TypeDescriptor::generic::<Self>(
                "std::collections::HashSet",
                &[T::type_descriptor],
                TypeKind::Sequence(info),
            )
            .with_default::<Self>()
        })
    }
}

impl<T: Typed + Ord> Typed for BTreeSet<T> {
    fn type_descriptor() -> &'static TypeDescriptor {
        static CELL: GenericDescriptorCell = GenericDescriptorCell::new();
        CELL.get_or_insert::<Self>(|| {
            let info = SequenceInfo::new(
                T::type_descriptor,
                sequence_items::<Self, T>,
                CollectionBuildStrategy::FromElements(collect_elements::<Self, T>),
            );
            TypeDescriptor::generic::<Self>(
                "alloc::collections::BTreeSet",
                &[T::type_descriptor],
                TypeKind::Sequence(info),
            )
            .with_default::<Self>()
        })
    }
}

// -----------------------------------------------------------------------------
// Maps

impl<K: Typed + Eq + Hash, V: Typed> Typed for HashMap<K, V> {
    fn type_descriptor() -> &'static TypeDescriptor {
        static CELL: GenericDescriptorCell = GenericDescriptorCell::new();
        CELL.get_or_insert::<Self>(|| {
            let info = MapInfo::new(
                K::type_descriptor,
                V::type_descriptor,
                map_entries::<Self, K, V>,
                CollectionBuildStrategy::Append {
                    create: boxed_default::<Self>,
                    add: append_entry::<Self, K, V>,
                },
            );
            TypeDescriptor::generic::<Self>(
                "std::collections::HashMap",
                &[K::type_descriptor, V::type_descriptor],
                TypeKind::Map(info),
            )
            .with_default::<Self>()
        })
    }
}

impl<K: Typed + Ord, V: Typed> Typed for BTreeMap<K, V> {
    fn type_descriptor() -> &'static TypeDescriptor {
        static CELL: GenericDescriptorCell = GenericDescriptorCell::new();
        CELL.get_or_insert::<Self>(|| {
            let info = MapInfo::new(
                K::type_descriptor,
                V::type_descriptor,
                map_entries::<Self, K, V>,
                CollectionBuildStrategy::FromElements(collect_entries::<Self, K, V>),
            );
            TypeDescriptor::generic::<Self>(
                "alloc::collections::BTreeMap",
                &[K::type_descriptor, V::type_descriptor],
                TypeKind::Map(info),
            )
            .with_default::<Self>()
        })
    }
}
