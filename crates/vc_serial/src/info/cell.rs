//! Containers for static storage of type descriptors.
//!
//! This is usually used to implement [`Typed`](crate::info::Typed).
//!
//! - [`NonGenericDescriptorCell`]: an [`OnceLock`], for non-generic types.
//! - [`GenericDescriptorCell`]: a [`TypeId`] map behind a [`RwLock`].
//!
//! If the type is generic, the `static CELL` inside the function is shared by
//! every instantiation, so the generic cell keys its entries by [`TypeId`].

use alloc::boxed::Box;
use core::any::{Any, TypeId};
use std::sync::{OnceLock, PoisonError, RwLock};

use crate::info::TypeDescriptor;
use crate::hash::{FIXED_HASHER, TypeIdMap};

// -----------------------------------------------------------------------------
// NonGenericDescriptorCell

/// Container for static storage of a non-generic type descriptor.
pub struct NonGenericDescriptorCell(OnceLock<TypeDescriptor>);

impl NonGenericDescriptorCell {
    #[inline]
    pub const fn new() -> Self {
        Self(OnceLock::new())
    }

    /// Returns the stored descriptor, building it with `f` on first use.
    #[inline]
    pub fn get_or_init(&self, f: impl FnOnce() -> TypeDescriptor) -> &TypeDescriptor {
        self.0.get_or_init(f)
    }
}

// -----------------------------------------------------------------------------
// GenericDescriptorCell

/// Container for static storage of descriptors of a generic type.
///
/// Each instantiation gets its own leaked descriptor. Building happens
/// without holding the lock, so descriptors of type arguments may be
/// requested from inside `f`; when two threads race, the first insert wins
/// and the other result is dropped.
///
/// ```
/// use vc_serial::info::{
///     CompositeInfo, GenericDescriptorCell, MemberDescriptor,
///     TypeDescriptor, TypeKind, Typed,
/// };
///
/// struct Wrapper<T>(T);
///
/// impl<T: Typed> Typed for Wrapper<T> {
///     fn type_descriptor() -> &'static TypeDescriptor {
///         static CELL: GenericDescriptorCell = GenericDescriptorCell::new();
///         CELL.get_or_insert::<Self>(|| {
///             TypeDescriptor::generic::<Self>(
///                 "demo::Wrapper",
///                 &[T::type_descriptor],
///                 TypeKind::Composite(CompositeInfo::new(vec![
///                     MemberDescriptor::field::<Self, T>("inner", |w| &w.0, |w| &mut w.0),
///                 ])),
///             )
///         })
///     }
/// }
///
/// assert_eq!(<Wrapper<u8>>::type_descriptor().path(), "demo::Wrapper<u8>");
/// assert_eq!(<Wrapper<bool>>::type_descriptor().path(), "demo::Wrapper<bool>");
/// ```
pub struct GenericDescriptorCell(RwLock<TypeIdMap<&'static TypeDescriptor>>);

impl GenericDescriptorCell {
    #[inline]
    pub const fn new() -> Self {
        Self(RwLock::new(TypeIdMap::with_hasher(FIXED_HASHER)))
    }

    /// Returns the descriptor stored for `G`, building it with `f` on first use.
    #[inline(always)]
    pub fn get_or_insert<G: Any>(&self, f: impl FnOnce() -> TypeDescriptor) -> &'static TypeDescriptor {
        // Separate to reduce code compilation times
        self.get_or_insert_by_type_id(TypeId::of::<G>(), f)
    }

    #[inline(never)]
    fn get_or_insert_by_type_id(
        &self,
        type_id: TypeId,
        f: impl FnOnce() -> TypeDescriptor,
    ) -> &'static TypeDescriptor {
        if let Some(info) = self.get_by_type_id(type_id) {
            return info;
        }
        let built: &'static TypeDescriptor = Box::leak(Box::new(f()));
        let mut map = self.0.write().unwrap_or_else(PoisonError::into_inner);
        *map.entry(type_id).or_insert(built)
    }

    fn get_by_type_id(&self, type_id: TypeId) -> Option<&'static TypeDescriptor> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
            .copied()
    }
}
