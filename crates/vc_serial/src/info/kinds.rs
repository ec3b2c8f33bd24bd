use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use crate::info::{MemberDescriptor, TypeDescriptor};
use crate::{Reflect, Result};

// -----------------------------------------------------------------------------
// Leaf kinds

/// Primitive kinds handled by the value codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Unit,
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    /// `rust_decimal::Decimal`
    Decimal,
    Char,
    String,
    /// `Vec<u8>`
    Bytes,
    /// `Vec<char>`
    Chars,
    /// `chrono::NaiveDateTime`
    DateTime,
}

/// Well-known non-primitive kinds handled by the extended codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtendedKind {
    /// `uuid::Uuid`
    Uuid,
    /// `core::net::SocketAddr`
    SocketAddr,
    /// [`TypeRef`](crate::impls::TypeRef)
    TypeRef,
}

// -----------------------------------------------------------------------------
// CollectionBuildStrategy

/// How a collection is rebuilt from decoded elements.
///
/// Chosen once when the descriptor is built.
pub enum CollectionBuildStrategy<E> {
    /// Construct directly from all elements.
    FromElements(fn(Vec<E>) -> Result<Box<dyn Reflect>>),
    /// Default-construct, then add elements one at a time.
    Append {
        create: fn() -> Box<dyn Reflect>,
        add: fn(&mut dyn Reflect, E) -> Result<()>,
    },
}

impl<E> CollectionBuildStrategy<E> {
    pub fn build(&self, elements: Vec<E>) -> Result<Box<dyn Reflect>> {
        match self {
            Self::FromElements(from) => from(elements),
            Self::Append { create, add } => {
                let mut target = create();
                for element in elements {
                    add(&mut *target, element)?;
                }
                Ok(target)
            }
        }
    }
}

impl<E> fmt::Debug for CollectionBuildStrategy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FromElements(_) => f.write_str("FromElements"),
            Self::Append { .. } => f.write_str("Append"),
        }
    }
}

/// A decoded map entry.
pub type MapEntry = (Box<dyn Reflect>, Box<dyn Reflect>);

// -----------------------------------------------------------------------------
// SequenceInfo

/// Arrays, lists, queues and sets.
#[derive(Debug)]
pub struct SequenceInfo {
    element: fn() -> &'static TypeDescriptor,
    items: for<'a> fn(&'a dyn Reflect) -> Result<Vec<&'a dyn Reflect>>,
    build: CollectionBuildStrategy<Box<dyn Reflect>>,
    fixed_len: Option<usize>,
}

impl SequenceInfo {
    pub fn new(
        element: fn() -> &'static TypeDescriptor,
        items: for<'a> fn(&'a dyn Reflect) -> Result<Vec<&'a dyn Reflect>>,
        build: CollectionBuildStrategy<Box<dyn Reflect>>,
    ) -> Self {
        Self {
            element,
            items,
            build,
            fixed_len: None,
        }
    }

    /// Marks the sequence as a fixed-size array.
    #[inline]
    pub fn with_fixed_len(mut self, len: usize) -> Self {
        self.fixed_len = Some(len);
        self
    }

    #[inline]
    pub fn element(&self) -> &'static TypeDescriptor {
        (self.element)()
    }

    /// Buffers the elements of `value` once, in iteration order.
    #[inline]
    pub fn items<'a>(&self, value: &'a dyn Reflect) -> Result<Vec<&'a dyn Reflect>> {
        (self.items)(value)
    }

    #[inline]
    pub fn build(&self) -> &CollectionBuildStrategy<Box<dyn Reflect>> {
        &self.build
    }

    #[inline]
    pub fn fixed_len(&self) -> Option<usize> {
        self.fixed_len
    }

    pub(crate) fn element_fn(&self) -> fn() -> &'static TypeDescriptor {
        self.element
    }
}

// -----------------------------------------------------------------------------
// MapInfo

/// Key/value maps.
#[derive(Debug)]
pub struct MapInfo {
    key: fn() -> &'static TypeDescriptor,
    value: fn() -> &'static TypeDescriptor,
    entries: for<'a> fn(&'a dyn Reflect) -> Result<Vec<(&'a dyn Reflect, &'a dyn Reflect)>>,
    build: CollectionBuildStrategy<MapEntry>,
}

impl MapInfo {
    pub fn new(
        key: fn() -> &'static TypeDescriptor,
        value: fn() -> &'static TypeDescriptor,
        entries: for<'a> fn(&'a dyn Reflect) -> Result<Vec<(&'a dyn Reflect, &'a dyn Reflect)>>,
        build: CollectionBuildStrategy<MapEntry>,
    ) -> Self {
        Self {
            key,
            value,
            entries,
            build,
        }
    }

    #[inline]
    pub fn key(&self) -> &'static TypeDescriptor {
        (self.key)()
    }

    #[inline]
    pub fn value(&self) -> &'static TypeDescriptor {
        (self.value)()
    }

    #[inline]
    pub fn entries<'a>(&self, map: &'a dyn Reflect) -> Result<Vec<(&'a dyn Reflect, &'a dyn Reflect)>> {
        (self.entries)(map)
    }

    #[inline]
    pub fn build(&self) -> &CollectionBuildStrategy<MapEntry> {
        &self.build
    }

    pub(crate) fn key_fn(&self) -> fn() -> &'static TypeDescriptor {
        self.key
    }

    pub(crate) fn value_fn(&self) -> fn() -> &'static TypeDescriptor {
        self.value
    }
}

// -----------------------------------------------------------------------------
// OptionalInfo

/// A nullable slot, `Option<T>`.
#[derive(Debug)]
pub struct OptionalInfo {
    inner: fn() -> &'static TypeDescriptor,
    get: for<'a> fn(&'a dyn Reflect) -> Result<Option<&'a dyn Reflect>>,
    some: fn(Box<dyn Reflect>) -> Result<Box<dyn Reflect>>,
    none: fn() -> Box<dyn Reflect>,
}

impl OptionalInfo {
    pub fn new(
        inner: fn() -> &'static TypeDescriptor,
        get: for<'a> fn(&'a dyn Reflect) -> Result<Option<&'a dyn Reflect>>,
        some: fn(Box<dyn Reflect>) -> Result<Box<dyn Reflect>>,
        none: fn() -> Box<dyn Reflect>,
    ) -> Self {
        Self {
            inner,
            get,
            some,
            none,
        }
    }

    #[inline]
    pub fn inner(&self) -> &'static TypeDescriptor {
        (self.inner)()
    }

    #[inline]
    pub fn get<'a>(&self, value: &'a dyn Reflect) -> Result<Option<&'a dyn Reflect>> {
        (self.get)(value)
    }

    /// Wraps a decoded inner value.
    #[inline]
    pub fn some(&self, inner: Box<dyn Reflect>) -> Result<Box<dyn Reflect>> {
        (self.some)(inner)
    }

    #[inline]
    pub fn none(&self) -> Box<dyn Reflect> {
        (self.none)()
    }

    pub(crate) fn inner_fn(&self) -> fn() -> &'static TypeDescriptor {
        self.inner
    }
}

// -----------------------------------------------------------------------------
// SharedInfo

/// An identity-bearing shared reference, `Arc<T>`.
#[derive(Debug)]
pub struct SharedInfo {
    pointee: fn() -> &'static TypeDescriptor,
    get: for<'a> fn(&'a dyn Reflect) -> Result<(&'a dyn Reflect, usize)>,
    wrap: fn(Box<dyn Reflect>) -> Result<Box<dyn Reflect>>,
    share: fn(&dyn Reflect) -> Result<Box<dyn Reflect>>,
}

impl SharedInfo {
    pub fn new(
        pointee: fn() -> &'static TypeDescriptor,
        get: for<'a> fn(&'a dyn Reflect) -> Result<(&'a dyn Reflect, usize)>,
        wrap: fn(Box<dyn Reflect>) -> Result<Box<dyn Reflect>>,
        share: fn(&dyn Reflect) -> Result<Box<dyn Reflect>>,
    ) -> Self {
        Self {
            pointee,
            get,
            wrap,
            share,
        }
    }

    #[inline]
    pub fn pointee(&self) -> &'static TypeDescriptor {
        (self.pointee)()
    }

    /// Returns the pointee and the address identifying the shared instance.
    #[inline]
    pub fn get<'a>(&self, value: &'a dyn Reflect) -> Result<(&'a dyn Reflect, usize)> {
        (self.get)(value)
    }

    /// Moves a decoded pointee into a new shared instance.
    #[inline]
    pub fn wrap(&self, pointee: Box<dyn Reflect>) -> Result<Box<dyn Reflect>> {
        (self.wrap)(pointee)
    }

    /// Clones the handle of an already shared instance.
    #[inline]
    pub fn share(&self, shared: &dyn Reflect) -> Result<Box<dyn Reflect>> {
        (self.share)(shared)
    }

    pub(crate) fn pointee_fn(&self) -> fn() -> &'static TypeDescriptor {
        self.pointee
    }
}

// -----------------------------------------------------------------------------
// CompositeInfo

/// A record with ordered members.
#[derive(Debug)]
pub struct CompositeInfo {
    members: Box<[MemberDescriptor]>,
}

impl CompositeInfo {
    pub fn new(members: Vec<MemberDescriptor>) -> Self {
        Self {
            members: members.into_boxed_slice(),
        }
    }

    /// Returns every declared member, including non-serializable ones.
    #[inline]
    pub fn members(&self) -> &[MemberDescriptor] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&MemberDescriptor> {
        self.members.iter().find(|member| member.name() == name)
    }
}

// -----------------------------------------------------------------------------
// TypeKind

/// Classification of a type, computed once when its descriptor is built.
///
/// The dispatcher tries the variants in declaration order: value, extended,
/// then aggregate kinds, then composite.
#[derive(Debug)]
pub enum TypeKind {
    Value(ValueKind),
    Extended(ExtendedKind),
    Sequence(SequenceInfo),
    Map(MapInfo),
    Optional(OptionalInfo),
    Shared(SharedInfo),
    /// The [`Dynamic`](crate::Dynamic) slot.
    Dynamic,
    Composite(CompositeInfo),
}
