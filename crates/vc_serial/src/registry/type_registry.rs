use alloc::string::String;
use alloc::vec::Vec;
use core::any::TypeId;
use core::net::SocketAddr;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::Dynamic;
use crate::hash::{FIXED_HASHER, FixedHashMap, TypeIdMap};
use crate::impls::TypeRef;
use crate::info::{TypeDescriptor, TypeShape, Typed};
use crate::registry::TypeResolver;

// -----------------------------------------------------------------------------
// TypeRegistry

/// A registry of serializable types, indexed by type path.
///
/// Readers resolve type tags and `__type` discriminators through it, so every
/// type that may appear in a [`Dynamic`] slot or in a [`TypeRef`] must be
/// registered. Registering a type also registers everything it refers to.
///
/// # Example
///
/// ```
/// use vc_serial::registry::{TypeRegistry, TypeResolver};
///
/// let mut registry = TypeRegistry::new();
/// registry.register::<Vec<Option<u32>>>();
///
/// let ty = registry.resolve("alloc::vec::Vec<core::option::Option<u32>>").unwrap();
/// assert_eq!(ty.ident(), "Vec");
/// assert_eq!(registry.generic_arity("core::option::Option"), Some(1));
/// ```
pub struct TypeRegistry {
    types: TypeIdMap<&'static TypeDescriptor>,
    paths: FixedHashMap<&'static str, &'static TypeDescriptor>,
    arities: FixedHashMap<&'static str, usize>,
    auto_registered: bool,
}

impl Default for TypeRegistry {
    /// See [`TypeRegistry::new`].
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Creates an empty registry.
    #[inline]
    pub const fn empty() -> Self {
        Self {
            types: TypeIdMap::with_hasher(FIXED_HASHER),
            paths: FixedHashMap::with_hasher(FIXED_HASHER),
            arities: FixedHashMap::with_hasher(FIXED_HASHER),
            auto_registered: false,
        }
    }

    /// Creates a registry with every value and extended kind and [`Dynamic`].
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register::<()>();
        registry.register::<bool>();
        registry.register::<i8>();
        registry.register::<i16>();
        registry.register::<i32>();
        registry.register::<i64>();
        registry.register::<u8>();
        registry.register::<u16>();
        registry.register::<u32>();
        registry.register::<u64>();
        registry.register::<f32>();
        registry.register::<f64>();
        registry.register::<char>();
        registry.register::<String>();
        registry.register::<Decimal>();
        registry.register::<NaiveDateTime>();
        registry.register::<Vec<u8>>();
        registry.register::<Vec<char>>();
        registry.register::<Uuid>();
        registry.register::<SocketAddr>();
        registry.register::<TypeRef>();
        registry.register::<Dynamic>();
        // Shapes produced by dynamic JSON detection.
        registry.register::<Vec<Dynamic>>();
        registry.register::<std::collections::HashMap<String, Dynamic>>();
        registry
    }

    /// Registers `T` and, recursively, the types it refers to.
    ///
    /// Returns `false` if `T` was already registered.
    #[inline]
    pub fn register<T: Typed>(&mut self) -> bool {
        self.register_descriptor(T::type_descriptor())
    }

    /// Registers a descriptor and, recursively, the types it refers to.
    pub fn register_descriptor(&mut self, ty: &'static TypeDescriptor) -> bool {
        if !self.insert(ty) {
            return false;
        }
        // Iterative, recursive types would otherwise never terminate the stack.
        let mut pending: Vec<fn() -> &'static TypeDescriptor> = ty.dependencies();
        while let Some(next) = pending.pop() {
            let dependency = next();
            if self.insert(dependency) {
                pending.extend(dependency.dependencies());
            }
        }
        true
    }

    fn insert(&mut self, ty: &'static TypeDescriptor) -> bool {
        if self.types.contains_key(&ty.type_id()) {
            return false;
        }
        self.types.insert(ty.type_id(), ty);
        if let Some(previous) = self.paths.insert(ty.path(), ty) {
            log::warn!(
                "type path `{}` is shared by `{}` and `{}`",
                ty.path(),
                previous.type_name(),
                ty.type_name(),
            );
        }
        if let TypeShape::Generic {
            definition,
            arguments,
        } = ty.shape()
        {
            self.arities.insert(definition, arguments.len());
        }
        true
    }

    #[inline]
    pub fn contains(&self, type_id: TypeId) -> bool {
        self.types.contains_key(&type_id)
    }

    #[inline]
    pub fn get(&self, type_id: TypeId) -> Option<&'static TypeDescriptor> {
        self.types.get(&type_id).copied()
    }

    #[inline]
    pub fn get_with_path(&self, path: &str) -> Option<&'static TypeDescriptor> {
        self.paths.get(path).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static TypeDescriptor> + '_ {
        self.types.values().copied()
    }

    /// Registers every non-generic type annotated with `#[reflect(auto_register)]`.
    ///
    /// Repeated calls are cheap. Returns `true` if static registration works on
    /// the current platform.
    ///
    /// This method requires the `auto_register` feature; without it, it does
    /// nothing and returns `false`.
    ///
    /// ```no_run
    /// use std::any::TypeId;
    /// use vc_serial::{derive::Reflect, registry::TypeRegistry};
    ///
    /// #[derive(Reflect, Default)]
    /// #[reflect(default, auto_register)]
    /// struct Foo {
    ///     name: Option<String>,
    /// }
    ///
    /// let mut registry = TypeRegistry::empty();
    /// assert!(registry.auto_register());
    /// assert!(registry.contains(TypeId::of::<Foo>()));
    /// assert!(registry.contains(TypeId::of::<Option<String>>()));
    /// ```
    pub fn auto_register(&mut self) -> bool {
        #[cfg(feature = "auto_register")]
        {
            if !self.auto_registered {
                crate::__macro_exports::auto_register::register_types(self);
            }
            self.auto_registered
        }
        #[cfg(not(feature = "auto_register"))]
        {
            false
        }
    }

    #[cfg(feature = "auto_register")]
    pub(crate) fn mark_auto_registered(&mut self) {
        self.auto_registered = true;
    }
}

impl TypeResolver for TypeRegistry {
    #[inline]
    fn resolve(&self, path: &str) -> Option<&'static TypeDescriptor> {
        self.get_with_path(path)
    }

    #[inline]
    fn generic_arity(&self, definition: &str) -> Option<usize> {
        self.arities.get(definition).copied()
    }
}
