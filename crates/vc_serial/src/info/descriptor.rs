use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::{TypeId, type_name};
use core::fmt;

use crate::Reflect;
use crate::impls::boxed_default;
use crate::info::type_path::{array_path, generic_path, ident_of, leak, nested_path};
use crate::info::{
    CompositeInfo, MapInfo, OptionalInfo, SequenceInfo, SharedInfo, TypeKind, Typed,
};

// -----------------------------------------------------------------------------
// TypeShape

/// How the path of a type is composed.
///
/// The binary codec encodes type metadata from the shape, so that a type
/// is rebuilt from its parts instead of one opaque string.
#[derive(Debug)]
pub enum TypeShape {
    /// A type identified by its path alone.
    Plain,
    /// `[element; len]`.
    Array {
        element: fn() -> &'static TypeDescriptor,
        len: usize,
    },
    /// A type declared inside another type's namespace.
    Nested {
        declaring: fn() -> &'static TypeDescriptor,
    },
    /// A closed instantiation of a generic definition.
    Generic {
        definition: &'static str,
        arguments: Box<[fn() -> &'static TypeDescriptor]>,
    },
}

// -----------------------------------------------------------------------------
// TypeDescriptor

/// Identity and classification of a run-time type.
///
/// Created once per type, see [`Typed`], and never mutated or freed.
pub struct TypeDescriptor {
    type_id: TypeId,
    type_name: &'static str,
    path: &'static str,
    ident: &'static str,
    shape: TypeShape,
    kind: TypeKind,
    default: Option<fn() -> Box<dyn Reflect>>,
}

impl TypeDescriptor {
    /// Creates the descriptor of a type identified by `path`.
    pub fn new<T: Typed>(path: &'static str, kind: TypeKind) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            path,
            ident: ident_of(path),
            shape: TypeShape::Plain,
            kind,
            default: None,
        }
    }

    /// Creates the descriptor of a generic instantiation.
    ///
    /// The path is `definition<A, B, ..>` built from the argument paths.
    pub fn generic<T: Typed>(
        definition: &'static str,
        arguments: &[fn() -> &'static TypeDescriptor],
        kind: TypeKind,
    ) -> Self {
        let path = generic_path(definition, arguments.iter().map(|argument| argument().path()));
        Self {
            ident: ident_of(definition),
            shape: TypeShape::Generic {
                definition,
                arguments: Box::from(arguments),
            },
            ..Self::new::<T>(leak(path), kind)
        }
    }

    /// Creates the descriptor of a fixed-size array.
    pub fn array<T: Typed>(
        element: fn() -> &'static TypeDescriptor,
        len: usize,
        kind: TypeKind,
    ) -> Self {
        let path = leak(array_path(element().path(), len));
        Self {
            ident: path,
            shape: TypeShape::Array { element, len },
            ..Self::new::<T>(path, kind)
        }
    }

    /// Creates the descriptor of a type nested in `declaring`.
    pub fn nested<T: Typed>(
        declaring: fn() -> &'static TypeDescriptor,
        ident: &'static str,
        kind: TypeKind,
    ) -> Self {
        let path = leak(nested_path(declaring().path(), ident));
        Self {
            ident,
            shape: TypeShape::Nested { declaring },
            ..Self::new::<T>(path, kind)
        }
    }

    /// Sets the default constructor to [`Default::default`].
    #[inline]
    pub fn with_default<T: Default + Typed>(mut self) -> Self {
        self.default = Some(boxed_default::<T>);
        self
    }

    /// Sets a custom default constructor.
    #[inline]
    pub fn with_constructor(mut self, constructor: fn() -> Box<dyn Reflect>) -> Self {
        self.default = Some(constructor);
        self
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the compiler's name of the type, for diagnostics only.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the full type path, the identity used in encoded data.
    #[inline]
    pub fn path(&self) -> &'static str {
        self.path
    }

    #[inline]
    pub fn ident(&self) -> &'static str {
        self.ident
    }

    #[inline]
    pub fn shape(&self) -> &TypeShape {
        &self.shape
    }

    #[inline]
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    #[inline]
    pub fn is<T: Typed>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    #[inline]
    pub fn is_dynamic(&self) -> bool {
        matches!(self.kind, TypeKind::Dynamic)
    }

    #[inline]
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Creates a default instance, if the type has a default constructor.
    #[inline]
    pub fn construct(&self) -> Option<Box<dyn Reflect>> {
        self.default.map(|constructor| constructor())
    }

    pub fn as_composite(&self) -> Option<&CompositeInfo> {
        match &self.kind {
            TypeKind::Composite(info) => Some(info),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&SequenceInfo> {
        match &self.kind {
            TypeKind::Sequence(info) => Some(info),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MapInfo> {
        match &self.kind {
            TypeKind::Map(info) => Some(info),
            _ => None,
        }
    }

    pub fn as_optional(&self) -> Option<&OptionalInfo> {
        match &self.kind {
            TypeKind::Optional(info) => Some(info),
            _ => None,
        }
    }

    pub fn as_shared(&self) -> Option<&SharedInfo> {
        match &self.kind {
            TypeKind::Shared(info) => Some(info),
            _ => None,
        }
    }

    /// Returns the descriptors this type refers to.
    ///
    /// Covers shape parts, element/key/value/inner types and every declared
    /// member, serializable or not.
    pub fn dependencies(&self) -> Vec<fn() -> &'static TypeDescriptor> {
        let mut deps = Vec::new();
        match &self.shape {
            TypeShape::Plain => {}
            TypeShape::Array { element, .. } => deps.push(*element),
            TypeShape::Nested { declaring } => deps.push(*declaring),
            TypeShape::Generic { arguments, .. } => deps.extend(arguments.iter().copied()),
        }
        match &self.kind {
            TypeKind::Sequence(info) => deps.push(info.element_fn()),
            TypeKind::Map(info) => {
                deps.push(info.key_fn());
                deps.push(info.value_fn());
            }
            TypeKind::Optional(info) => deps.push(info.inner_fn()),
            TypeKind::Shared(info) => deps.push(info.pointee_fn()),
            TypeKind::Composite(info) => {
                deps.extend(info.members().iter().map(|member| member.declared_fn()));
            }
            TypeKind::Value(_) | TypeKind::Extended(_) | TypeKind::Dynamic => {}
        }
        deps
    }
}

impl PartialEq for TypeDescriptor {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for TypeDescriptor {}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("path", &self.path)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for TypeDescriptor {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path)
    }
}
